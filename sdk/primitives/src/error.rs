//! Error type shared by the field, curve and hash primitives.

use thiserror::Error;

/// Errors raised by the arithmetic and hashing primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Byte encoding is not a canonical element of the base field, or the
    /// operation is undefined for the value (e.g. inverting zero)
    #[error("invalid field element")]
    InvalidFieldElement,

    /// Byte encoding is not reduced modulo the subgroup order
    #[error("invalid scalar: not reduced modulo the subgroup order")]
    InvalidScalar,

    /// Coordinates do not describe a point of the prime-order subgroup
    #[error("invalid point: {0}")]
    InvalidPoint(&'static str),

    /// The Poseidon parameters have not been generated yet
    #[error("domain hash is not initialized")]
    NotInitialized,

    /// Parameter generation failed (the blocking worker panicked or was cancelled)
    #[error("domain hash setup failed: {0}")]
    HashSetup(String),
}

/// Result type for primitive operations
pub type Result<T> = std::result::Result<T, CryptoError>;
