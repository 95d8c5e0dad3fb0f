//! Deterministic equity valuation engine.
//!
//! Turns a company's financial-statement snapshot and share price into price
//! multiples, multi-scenario DCF values, a liquidation check and a rating.
//! No I/O, no clock, no shared state: every call is independent.

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod normalize;
pub mod rating;
pub mod report;
pub mod types;
pub mod valuation;

pub use config::EngineConfig;
pub use engine::{evaluate, evaluate_value};
pub use error::ValuationError;
pub use input::{parse_document, SharesUnit, ValuationInput};
pub use report::ValuationResult;
pub use types::*;

/// Standard result type for all engine operations
pub type EngineResult<T> = Result<T, ValuationError>;
