pub mod error;
pub mod types;

#[cfg(feature = "financing")]
pub mod financing;

pub use error::DevFinError;
pub use types::*;

/// Standard result type for all development financing operations
pub type DevFinResult<T> = Result<T, DevFinError>;
