//! Stealth Addresses
//!
//! One-time receiving keys derived by Diffie-Hellman on Baby Jubjub:
//!
//! ```text
//! sender:    e random,  E = e·G,  shared = e·V,  f = H(STEALTH, shared.x) mod N
//!            stealth = S + f·G
//! recipient: shared = v·E,  stealth private key = s + f
//! ```
//!
//! With a single key pair, S = V = recipient public key. The dual-key form
//! lets a viewing-key holder detect payments (`is_addressed_to`) without
//! being able to spend them.

use ark_std::rand::{CryptoRng, Rng};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use umbra_primitives::{
    CryptoError, DomainHash, DomainTag, Keypair, Point, Scalar, mul_generator, random_scalar,
    scalar_from_field,
};

use crate::error::Result;

/// A one-time address and the ephemeral key needed to recognise it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthAddress {
    pub stealth_pubkey: Point,
    pub ephemeral_pubkey: Point,
}

/// Published receiving identity in dual-key form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthMetaAddress {
    pub spending_pubkey: Point,
    pub viewing_pubkey: Point,
}

impl StealthMetaAddress {
    pub fn new(spending_pubkey: Point, viewing_pubkey: Point) -> Self {
        Self {
            spending_pubkey,
            viewing_pubkey,
        }
    }

    /// One key for both roles
    pub fn single(pubkey: Point) -> Self {
        Self::new(pubkey, pubkey)
    }
}

fn stealth_factor(hasher: &DomainHash, shared: &Point) -> Result<Scalar> {
    let digest = hasher.hash_tagged(DomainTag::Stealth, &[shared.x()])?;
    Ok(scalar_from_field(&digest))
}

/// Fresh stealth address for `recipient_pubkey`. Also returns the ephemeral
/// secret so the sender can reuse it (e.g. for note encryption).
pub fn generate(hasher: &DomainHash, recipient_pubkey: &Point) -> Result<(StealthAddress, Scalar)> {
    generate_for_meta(hasher, &StealthMetaAddress::single(*recipient_pubkey))
}

pub fn generate_for_meta(
    hasher: &DomainHash,
    meta: &StealthMetaAddress,
) -> Result<(StealthAddress, Scalar)> {
    generate_with_rng(hasher, meta, &mut OsRng)
}

pub fn generate_with_rng<R: Rng + CryptoRng>(
    hasher: &DomainHash,
    meta: &StealthMetaAddress,
    rng: &mut R,
) -> Result<(StealthAddress, Scalar)> {
    // identity keys would make the shared secret public
    if meta.viewing_pubkey.is_identity() || meta.spending_pubkey.is_identity() {
        return Err(CryptoError::InvalidPoint("identity is not a valid recipient key").into());
    }
    let ephemeral = random_scalar(rng);
    let ephemeral_pubkey = mul_generator(&ephemeral);
    let shared = meta.viewing_pubkey.mul(&ephemeral);
    let factor = stealth_factor(hasher, &shared)?;
    let stealth_pubkey = meta.spending_pubkey.add(&mul_generator(&factor));

    Ok((
        StealthAddress {
            stealth_pubkey,
            ephemeral_pubkey,
        },
        ephemeral,
    ))
}

/// Private key of the stealth address that `ephemeral_pubkey` announced
pub fn derive_private_key(
    hasher: &DomainHash,
    recipient_private_key: &Scalar,
    ephemeral_pubkey: &Point,
) -> Result<Scalar> {
    derive_private_key_dual(hasher, recipient_private_key, recipient_private_key, ephemeral_pubkey)
}

pub fn derive_private_key_dual(
    hasher: &DomainHash,
    spending_private_key: &Scalar,
    viewing_private_key: &Scalar,
    ephemeral_pubkey: &Point,
) -> Result<Scalar> {
    let shared = ephemeral_pubkey.mul(viewing_private_key);
    Ok(*spending_private_key + stealth_factor(hasher, &shared)?)
}

/// Whether `keypair` can spend `stealth_pubkey`
pub fn check_ownership(
    hasher: &DomainHash,
    stealth_pubkey: &Point,
    ephemeral_pubkey: &Point,
    keypair: &Keypair,
) -> Result<bool> {
    let private_key = derive_private_key(hasher, keypair.secret(), ephemeral_pubkey)?;
    Ok(mul_generator(&private_key) == *stealth_pubkey)
}

/// Viewing-key detection: no spending secret required
pub fn is_addressed_to(
    hasher: &DomainHash,
    address: &StealthAddress,
    viewing_private_key: &Scalar,
    spending_pubkey: &Point,
) -> Result<bool> {
    let shared = address.ephemeral_pubkey.mul(viewing_private_key);
    let expected = spending_pubkey.add(&mul_generator(&stealth_factor(hasher, &shared)?));
    Ok(expected == address.stealth_pubkey)
}
