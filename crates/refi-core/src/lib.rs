pub mod error;
pub mod loan;
pub mod property;
pub mod time_value;
pub mod types;

#[cfg(feature = "pmi")]
pub mod pmi;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "invest")]
pub mod invest;

#[cfg(feature = "factors")]
pub mod factors;

#[cfg(feature = "compare")]
pub mod compare;

#[cfg(feature = "goals")]
pub mod goals;

pub use error::RefiError;
pub use types::*;

/// Standard result type for all refinance operations
pub type RefiResult<T> = Result<T, RefiError>;
