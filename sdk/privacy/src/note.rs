//! Shielded Notes
//!
//! A Note is value held privately by whoever controls the stealth key whose
//! x-coordinate it carries.
//!
//! ```text
//! Note = {
//!     stealth_pub_x: FieldElement,  // one-time owner key (x only)
//!     token_id:      [u8; 32],      // asset identifier
//!     amount:        u64,           // smallest unit
//!     randomness:    FieldElement,  // blinding factor, fresh per note
//! }
//!
//! plaintext (104 bytes) = stealth_pub_x[32 BE] ‖ token_id[32] ‖ amount[8 LE] ‖ randomness[32 BE]
//! ```

use ark_std::rand::{CryptoRng, Rng};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use umbra_primitives::{
    DomainHash, FIELD_BYTES, FieldElement, Keypair, field_from_bytes, field_to_bytes,
    random_field_element, scalar_from_bytes_mod_order,
};

use crate::commitment::{Commitment, compute_commitment};
use crate::error::{NoteError, Result};
use crate::nullifier::{
    IncomingViewingKey, Nullifier, NullifierKey, derive_incoming_viewing_key, derive_nullifier_key,
};

/// Serialized note plaintext size
pub const NOTE_PLAINTEXT_SIZE: usize = 104;

const TOKEN_OFFSET: usize = FIELD_BYTES;
const AMOUNT_OFFSET: usize = TOKEN_OFFSET + 32;
const RANDOMNESS_OFFSET: usize = AMOUNT_OFFSET + 8;

/// A shielded note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub stealth_pub_x: FieldElement,
    pub token_id: [u8; 32],
    pub amount: NoteValue,
    pub randomness: FieldElement,
}

/// Note value with overflow protection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteValue(pub u64);

impl NoteValue {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn to_field(self) -> FieldElement {
        FieldElement::from(self.0)
    }
}

impl From<u64> for NoteValue {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Note {
    /// Create a note with fresh randomness from the OS RNG
    pub fn random(stealth_pub_x: FieldElement, token_id: [u8; 32], amount: u64) -> Self {
        Self::new(stealth_pub_x, token_id, amount, &mut OsRng)
    }

    pub fn new<R: Rng + CryptoRng>(
        stealth_pub_x: FieldElement,
        token_id: [u8; 32],
        amount: u64,
        rng: &mut R,
    ) -> Self {
        Self::with_randomness(stealth_pub_x, token_id, amount, random_field_element(rng))
    }

    /// Create a note with explicit randomness (recovery, tests)
    pub fn with_randomness(
        stealth_pub_x: FieldElement,
        token_id: [u8; 32],
        amount: u64,
        randomness: FieldElement,
    ) -> Self {
        Self {
            stealth_pub_x,
            token_id,
            amount: NoteValue(amount),
            randomness,
        }
    }

    /// Token id lifted into the field, big-endian mod P
    pub fn token_field(&self) -> FieldElement {
        umbra_primitives::field_from_bytes_mod_order(&self.token_id)
    }

    pub fn to_bytes(&self) -> [u8; NOTE_PLAINTEXT_SIZE] {
        let mut out = [0u8; NOTE_PLAINTEXT_SIZE];
        out[..TOKEN_OFFSET].copy_from_slice(&field_to_bytes(&self.stealth_pub_x));
        out[TOKEN_OFFSET..AMOUNT_OFFSET].copy_from_slice(&self.token_id);
        out[AMOUNT_OFFSET..RANDOMNESS_OFFSET].copy_from_slice(&self.amount.0.to_le_bytes());
        out[RANDOMNESS_OFFSET..].copy_from_slice(&field_to_bytes(&self.randomness));
        out
    }

    /// Parse a plaintext. Field elements must be canonical.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NOTE_PLAINTEXT_SIZE {
            return Err(NoteError::InvalidPlaintext);
        }
        let stealth_pub_x = field_from_bytes(&array_at(bytes, 0))?;
        let token_id = array_at(bytes, TOKEN_OFFSET);
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&bytes[AMOUNT_OFFSET..RANDOMNESS_OFFSET]);
        let randomness = field_from_bytes(&array_at(bytes, RANDOMNESS_OFFSET))?;

        Ok(Self {
            stealth_pub_x,
            token_id,
            amount: NoteValue(u64::from_le_bytes(amount)),
            randomness,
        })
    }

    pub fn commitment(&self, hasher: &DomainHash) -> Result<Commitment> {
        compute_commitment(hasher, self)
    }

    /// Spending nullifier for this note at `leaf_index`
    pub fn nullifier(
        &self,
        hasher: &DomainHash,
        nk: &NullifierKey,
        leaf_index: u64,
    ) -> Result<Nullifier> {
        nk.spending_nullifier(hasher, &self.commitment(hasher)?, leaf_index)
    }
}

fn array_at(bytes: &[u8], offset: usize) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes[offset..offset + 32]);
    out
}

/// Spending key - the root secret of a shielded account.
///
/// Its bytes double as the curve secret for stealth and note decryption
/// (reduced mod N), and as the preimage of the nullifier and viewing keys
/// (reduced mod P). Loss = loss of funds. Compromise = theft of funds.
#[derive(Clone, PartialEq, Eq)]
pub struct SpendingKey {
    key: [u8; 32],
}

impl SpendingKey {
    pub fn random<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        let mut key = [0u8; 32];
        rng.fill_bytes(&mut key);
        Self { key }
    }

    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    pub fn nullifier_key(&self, hasher: &DomainHash) -> Result<NullifierKey> {
        derive_nullifier_key(hasher, &self.key)
    }

    pub fn viewing_key(&self, hasher: &DomainHash) -> Result<IncomingViewingKey> {
        derive_incoming_viewing_key(hasher, &self.key)
    }

    /// Curve keypair: receives stealth payments and decrypts notes
    pub fn keypair(&self) -> Keypair {
        Keypair::from_secret(scalar_from_bytes_mod_order(&self.key))
    }
}

impl std::fmt::Debug for SpendingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SpendingKey(..)")
    }
}

/// Every key a wallet derives from one spending key
#[derive(Debug, Clone)]
pub struct ShieldedKeyBundle {
    pub spending_key: SpendingKey,
    pub nullifier_key: NullifierKey,
    pub viewing_key: IncomingViewingKey,
    pub keypair: Keypair,
}

impl ShieldedKeyBundle {
    pub fn random<R: Rng + CryptoRng>(hasher: &DomainHash, rng: &mut R) -> Result<Self> {
        Self::from_spending_key(hasher, SpendingKey::random(rng))
    }

    pub fn from_spending_key(hasher: &DomainHash, spending_key: SpendingKey) -> Result<Self> {
        Ok(Self {
            nullifier_key: spending_key.nullifier_key(hasher)?,
            viewing_key: spending_key.viewing_key(hasher)?,
            keypair: spending_key.keypair(),
            spending_key,
        })
    }
}
