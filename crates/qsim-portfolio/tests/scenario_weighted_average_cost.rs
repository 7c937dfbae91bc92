//! Scenarios covering the weighted-average-cost position model:
//! - repeated buys at different prices blend into one average cost
//! - a sell always closes the position in full, never partially
//! - cash can never go negative regardless of order sequence

use qsim_portfolio::Portfolio;

#[test]
fn repeated_buys_blend_into_single_average_cost() {
    let mut portfolio = Portfolio::new(100_000.0);
    portfolio.buy("AAPL", 100, 100.0).unwrap();
    portfolio.buy("AAPL", 100, 120.0).unwrap();

    let position = portfolio.position("AAPL").unwrap();
    assert_eq!(position.shares, 200);
    assert_eq!(position.average_cost, 110.0);
}

#[test]
fn sell_always_exits_the_full_position() {
    let mut portfolio = Portfolio::new(100_000.0);
    portfolio.buy("AAPL", 100, 100.0).unwrap();
    portfolio.sell("AAPL", 110.0).unwrap();

    assert_eq!(portfolio.shares_of("AAPL"), 0);
    assert!(portfolio.position("AAPL").unwrap().average_cost == 0.0);
}

#[test]
fn selling_a_symbol_never_held_fails() {
    let mut portfolio = Portfolio::new(100_000.0);
    assert!(portfolio.sell("AAPL", 110.0).is_err());
}

#[test]
fn buy_beyond_available_cash_is_rejected_and_cash_is_unchanged() {
    let mut portfolio = Portfolio::new(500.0);
    let starting_cash = portfolio.cash();

    let result = portfolio.buy("AAPL", 10, 100.0);

    assert!(result.is_err());
    assert_eq!(portfolio.cash(), starting_cash);
}
