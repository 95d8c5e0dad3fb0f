pub mod dcf;
pub mod liquidation;
pub mod multiples;
pub mod profitability;
