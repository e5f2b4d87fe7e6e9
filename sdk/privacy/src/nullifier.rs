//! Nullifiers and Derived Keys
//!
//! ```text
//! nk               = H(NULLIFIER_KEY, spending_key, 0)
//! ivk              = H(IVK, spending_key)
//! spend nullifier  = H(SPEND_NULLIFIER, nk, commitment, leaf_index)
//! action nullifier = H(ACTION_NULLIFIER, nk, commitment, action_domain)
//! ```
//!
//! Once a spend nullifier is published, the note cannot be spent again. The
//! leaf index makes two notes with identical contents nullify differently.
//! Action nullifiers mark one-time use of a note within a domain (e.g. one
//! vote per proposal) without spending it.

use serde::{Deserialize, Serialize};
use umbra_primitives::{
    CryptoError, DomainHash, DomainTag, FIELD_BYTES, FieldElement, field_from_bytes,
    field_from_bytes_mod_order, field_to_bytes,
};

use crate::commitment::Commitment;
use crate::error::Result;

/// A nullifier (32 bytes, canonical big-endian field element)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "[u8; FIELD_BYTES]", into = "[u8; FIELD_BYTES]")]
pub struct Nullifier([u8; FIELD_BYTES]);

impl Nullifier {
    pub fn from_field(f: FieldElement) -> Self {
        Self(field_to_bytes(&f))
    }

    pub fn to_field(&self) -> Result<FieldElement> {
        Ok(field_from_bytes(&self.0)?)
    }

    pub fn as_bytes(&self) -> &[u8; FIELD_BYTES] {
        &self.0
    }

    /// Rejects encodings >= P
    pub fn from_bytes(bytes: [u8; FIELD_BYTES]) -> Result<Self> {
        Ok(Self::try_from(bytes)?)
    }
}

impl TryFrom<[u8; FIELD_BYTES]> for Nullifier {
    type Error = CryptoError;

    fn try_from(bytes: [u8; FIELD_BYTES]) -> std::result::Result<Self, CryptoError> {
        field_from_bytes(&bytes)?;
        Ok(Self(bytes))
    }
}

impl From<Nullifier> for [u8; FIELD_BYTES] {
    fn from(nullifier: Nullifier) -> Self {
        nullifier.0
    }
}

impl AsRef<[u8]> for Nullifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Nullifier derivation key.
///
/// Derived once per spending key and cached by the wallet. Knowledge of it is
/// required to derive valid nullifiers, so treat it as secret.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NullifierKey(FieldElement);

impl NullifierKey {
    pub fn from_field(key: FieldElement) -> Self {
        Self(key)
    }

    pub fn to_field(&self) -> FieldElement {
        self.0
    }

    pub fn spending_nullifier(
        &self,
        hasher: &DomainHash,
        commitment: &Commitment,
        leaf_index: u64,
    ) -> Result<Nullifier> {
        derive_spending_nullifier(hasher, self, commitment, leaf_index)
    }

    pub fn action_nullifier(
        &self,
        hasher: &DomainHash,
        commitment: &Commitment,
        action_domain: FieldElement,
    ) -> Result<Nullifier> {
        derive_action_nullifier(hasher, self, commitment, action_domain)
    }
}

impl std::fmt::Debug for NullifierKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NullifierKey(..)")
    }
}

/// Incoming viewing key: lets a holder recognise notes without spending them
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct IncomingViewingKey(FieldElement);

impl IncomingViewingKey {
    pub fn to_field(&self) -> FieldElement {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; FIELD_BYTES] {
        field_to_bytes(&self.0)
    }
}

impl std::fmt::Debug for IncomingViewingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IncomingViewingKey(..)")
    }
}

pub fn derive_nullifier_key(hasher: &DomainHash, spending_key: &[u8; 32]) -> Result<NullifierKey> {
    let sk = field_from_bytes_mod_order(spending_key);
    let nk = hasher.hash_tagged(DomainTag::NullifierKey, &[sk, FieldElement::from(0u64)])?;
    Ok(NullifierKey(nk))
}

pub fn derive_incoming_viewing_key(
    hasher: &DomainHash,
    spending_key: &[u8; 32],
) -> Result<IncomingViewingKey> {
    let sk = field_from_bytes_mod_order(spending_key);
    Ok(IncomingViewingKey(hasher.hash_tagged(DomainTag::Ivk, &[sk])?))
}

pub fn derive_spending_nullifier(
    hasher: &DomainHash,
    nk: &NullifierKey,
    commitment: &Commitment,
    leaf_index: u64,
) -> Result<Nullifier> {
    let digest = hasher.hash_tagged(
        DomainTag::SpendNullifier,
        &[nk.0, commitment.to_field()?, FieldElement::from(leaf_index)],
    )?;
    Ok(Nullifier::from_field(digest))
}

/// One-time-use marker of `commitment` within `action_domain`.
/// Independent of the note's tree position.
pub fn derive_action_nullifier(
    hasher: &DomainHash,
    nk: &NullifierKey,
    commitment: &Commitment,
    action_domain: FieldElement,
) -> Result<Nullifier> {
    let digest = hasher.hash_tagged(
        DomainTag::ActionNullifier,
        &[nk.0, commitment.to_field()?, action_domain],
    )?;
    Ok(Nullifier::from_field(digest))
}

/// Lift an arbitrary action identifier (proposal id, round id) into the field
pub fn action_domain_from_bytes(id: &[u8]) -> FieldElement {
    field_from_bytes_mod_order(id)
}
