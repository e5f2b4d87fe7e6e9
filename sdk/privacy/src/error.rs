//! Errors for note handling.

use thiserror::Error;
use umbra_primitives::CryptoError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Tag mismatch: wrong key, tampered ciphertext, or not addressed to us
    #[error("note authentication failed")]
    AuthenticationFailed,

    #[error("malformed encrypted note: {0}")]
    MalformedCiphertext(&'static str),

    /// Decrypted payload is not a valid 104-byte note
    #[error("invalid note plaintext")]
    InvalidPlaintext,

    #[error("note encryption failed")]
    EncryptionFailed,
}

pub type Result<T> = std::result::Result<T, NoteError>;
