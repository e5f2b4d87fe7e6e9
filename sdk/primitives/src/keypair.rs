//! Curve keypairs.
//!
//! Used for note encryption, stealth addressing and committee transport keys.

use ark_std::rand::{CryptoRng, Rng};
use rand::rngs::OsRng;

use crate::curve::{Point, mul_generator};
use crate::field::{FIELD_BYTES, Scalar, random_scalar, scalar_from_bytes, scalar_to_bytes};
use crate::error::Result;

/// A secret scalar with its public point.
/// NEVER log or serialize the secret half.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    secret: Scalar,
    public: Point,
}

impl Keypair {
    /// Generates a fresh keypair from the OS CSPRNG.
    pub fn new_random() -> Self {
        Self::random(&mut OsRng)
    }

    pub fn random<R: Rng + CryptoRng>(rng: &mut R) -> Self {
        Self::from_secret(random_scalar(rng))
    }

    pub fn from_secret(secret: Scalar) -> Self {
        Self {
            secret,
            public: mul_generator(&secret),
        }
    }

    /// Restore from a canonical 32-byte big-endian scalar
    pub fn from_secret_bytes(bytes: &[u8; FIELD_BYTES]) -> Result<Self> {
        Ok(Self::from_secret(scalar_from_bytes(bytes)?))
    }

    pub fn secret(&self) -> &Scalar {
        &self.secret
    }

    pub fn secret_bytes(&self) -> [u8; FIELD_BYTES] {
        scalar_to_bytes(&self.secret)
    }

    pub fn public(&self) -> &Point {
        &self.public
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
