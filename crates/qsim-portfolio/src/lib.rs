//! Portfolio and position accounting.
//!
//! Weighted-average-cost positions, a cash balance with a non-negativity
//! invariant, and the allocation strategies that turn a symbol universe into
//! target weights and whole-share order sizes.

mod error;
mod types;

pub mod allocator;

pub use allocator::{AllocationConfig, AllocationError, PortfolioAllocator};
pub use error::PortfolioError;
pub use types::{Portfolio, Position};
