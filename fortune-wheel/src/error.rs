use thiserror::Error;

/// Errors raised when a spin cannot resolve a winner or a landing angle.
///
/// These are integration errors: the catalog or configuration handed to the
/// engine cannot produce a winner. They are never replaced by a silent
/// fallback winner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpinError {
    #[error("no prize is keyed \"{key}\"")]
    NotFound { key: String },
    #[error("weighted selection needs at least one prize with a positive probability")]
    NoEligibleSegment,
    #[error("the prize catalog is empty")]
    EmptyCatalog,
    #[error("winning index {index} is outside a wheel of {count} segments")]
    IndexOutOfRange { index: usize, count: usize },
}
