pub mod error;
pub mod fields;
pub mod profile;
pub mod types;
pub mod valuation;

pub use error::ValuationError;
pub use types::*;

/// Standard result type for fallible workbench operations.
///
/// Note that the valuation engine itself is infallible: numeric degeneracy
/// (WACC equal to terminal growth, zero shares outstanding) surfaces as
/// non-finite values in its output, never as an `Err`. This alias covers the
/// surrounding concerns: profile parsing, serialization, input validation.
pub type WorkbenchResult<T> = Result<T, ValuationError>;
