pub mod error;
pub mod types;

pub mod aging;
pub mod balance;
pub mod flows;
pub mod ledger;
pub mod period;
pub mod reports;
pub mod season;
pub mod valuation;

pub use error::EngineError;
pub use types::*;

/// Standard result type for all engine operations
pub type EngineResult<T> = Result<T, EngineError>;
