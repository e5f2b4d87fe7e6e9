//! Note Commitments
//!
//! ```text
//! Commitment = H(COMMITMENT, stealth_pub_x, token_id, amount, randomness)
//! ```
//!
//! Published on-chain as a Merkle leaf. Hides the note contents while binding
//! them for the spend proof.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use umbra_primitives::{
    CryptoError, DomainHash, DomainTag, FIELD_BYTES, FieldElement, field_from_bytes, field_to_bytes,
};

use crate::error::Result;
use crate::note::Note;

/// A note commitment (32 bytes, canonical big-endian field element)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[u8; FIELD_BYTES]", into = "[u8; FIELD_BYTES]")]
pub struct Commitment(pub(crate) [u8; FIELD_BYTES]);

impl Commitment {
    pub fn from_field(f: FieldElement) -> Self {
        Self(field_to_bytes(&f))
    }

    /// Bytes received from outside. Rejects encodings >= P, so every
    /// commitment has exactly one byte form.
    pub fn from_bytes(bytes: [u8; FIELD_BYTES]) -> Result<Self> {
        Ok(Self::try_from(bytes)?)
    }

    pub fn to_field(&self) -> Result<FieldElement> {
        Ok(field_from_bytes(&self.0)?)
    }

    pub fn as_bytes(&self) -> &[u8; FIELD_BYTES] {
        &self.0
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<[u8; FIELD_BYTES]> for Commitment {
    type Error = CryptoError;

    fn try_from(bytes: [u8; FIELD_BYTES]) -> std::result::Result<Self, CryptoError> {
        field_from_bytes(&bytes)?;
        Ok(Self(bytes))
    }
}

impl From<Commitment> for [u8; FIELD_BYTES] {
    fn from(commitment: Commitment) -> Self {
        commitment.0
    }
}

/// Commitment scheme bound to a shared hash handle
#[derive(Debug, Clone)]
pub struct CommitmentScheme {
    hasher: Arc<DomainHash>,
}

impl CommitmentScheme {
    pub fn new(hasher: Arc<DomainHash>) -> Self {
        Self { hasher }
    }

    pub fn commit(&self, note: &Note) -> Result<Commitment> {
        compute_commitment(&self.hasher, note)
    }

    pub fn verify(&self, commitment: &Commitment, note: &Note) -> Result<bool> {
        verify_commitment(&self.hasher, commitment, note)
    }
}

pub fn compute_commitment(hasher: &DomainHash, note: &Note) -> Result<Commitment> {
    let digest = hasher.hash_tagged(
        DomainTag::Commitment,
        &[
            note.stealth_pub_x,
            note.token_field(),
            note.amount.to_field(),
            note.randomness,
        ],
    )?;
    Ok(Commitment::from_field(digest))
}

/// Recompute and compare. Any change to any note field yields `false`.
pub fn verify_commitment(hasher: &DomainHash, commitment: &Commitment, note: &Note) -> Result<bool> {
    Ok(compute_commitment(hasher, note)? == *commitment)
}
