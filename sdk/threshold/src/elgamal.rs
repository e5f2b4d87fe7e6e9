//! Lifted ElGamal on Baby Jubjub
//!
//! ```text
//! Enc(m; r) = (c1, c2) = (r·G, m·G + r·PK)
//! Enc(a) + Enc(b) = Enc(a + b)           component-wise point addition
//! ```
//!
//! The message sits in the exponent, so decryption yields m·G. Recovering m
//! from it is a small discrete log left to the caller (vote counts are small).
//!
//! Decryption is threshold: member i publishes D_i = s_i·c1 and any t of them
//! combine to m·G = c2 - Σ λ_i·D_i.

use ark_std::rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use umbra_primitives::{POINT_BYTES, Point, Scalar, mul_generator, random_scalar};

use crate::shares::{Result, ShareIndex, ThresholdError, lagrange_coefficient, validate_indices};

pub const CIPHERTEXT_BYTES: usize = 2 * POINT_BYTES;

/// An encrypted vote (or encrypted tally)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCiphertext {
    pub c1: Point,
    pub c2: Point,
}

impl VoteCiphertext {
    /// Encryption of zero with zero randomness; the neutral element of `add`
    pub fn zero() -> Self {
        Self {
            c1: Point::identity(),
            c2: Point::identity(),
        }
    }

    /// Homomorphic addition
    pub fn add(&self, other: &VoteCiphertext) -> VoteCiphertext {
        VoteCiphertext {
            c1: self.c1.add(&other.c1),
            c2: self.c2.add(&other.c2),
        }
    }

    pub fn to_bytes(&self) -> [u8; CIPHERTEXT_BYTES] {
        let mut out = [0u8; CIPHERTEXT_BYTES];
        out[..POINT_BYTES].copy_from_slice(&self.c1.to_bytes());
        out[POINT_BYTES..].copy_from_slice(&self.c2.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; CIPHERTEXT_BYTES]) -> Result<Self> {
        let mut c1 = [0u8; POINT_BYTES];
        let mut c2 = [0u8; POINT_BYTES];
        c1.copy_from_slice(&bytes[..POINT_BYTES]);
        c2.copy_from_slice(&bytes[POINT_BYTES..]);
        Ok(Self {
            c1: Point::from_bytes(&c1)?,
            c2: Point::from_bytes(&c2)?,
        })
    }
}

/// Enc(message; randomness) under `pubkey`
pub fn elgamal_encrypt(message: &Scalar, pubkey: &Point, randomness: &Scalar) -> VoteCiphertext {
    VoteCiphertext {
        c1: mul_generator(randomness),
        c2: mul_generator(message).add(&pubkey.mul(randomness)),
    }
}

/// One-hot ballot: an encryption of 1 at `choice`, of 0 everywhere else
pub fn encrypt_ballot<R: Rng + CryptoRng>(
    choice: usize,
    num_choices: usize,
    pubkey: &Point,
    rng: &mut R,
) -> Result<Vec<VoteCiphertext>> {
    if choice >= num_choices {
        return Err(ThresholdError::InvalidChoice {
            choice,
            num_choices,
        });
    }
    Ok((0..num_choices)
        .map(|i| {
            let message = Scalar::from((i == choice) as u64);
            elgamal_encrypt(&message, pubkey, &random_scalar(rng))
        })
        .collect())
}

/// Per-choice sum of all ballots
pub fn tally(ballots: &[Vec<VoteCiphertext>]) -> Result<Vec<VoteCiphertext>> {
    let Some(first) = ballots.first() else {
        return Ok(Vec::new());
    };
    let mut totals = vec![VoteCiphertext::zero(); first.len()];

    for ballot in ballots {
        if ballot.len() != totals.len() {
            return Err(ThresholdError::BallotShapeMismatch {
                got: ballot.len(),
                expected: totals.len(),
            });
        }
        for (total, ct) in totals.iter_mut().zip(ballot) {
            *total = total.add(ct);
        }
    }
    Ok(totals)
}

/// D_i = s_i·c1
pub fn compute_decryption_share(ciphertext: &VoteCiphertext, secret_share: &Scalar) -> Point {
    ciphertext.c1.mul(secret_share)
}

/// Combine `(index, D_i)` pairs into m·G.
///
/// Fails on fewer than `threshold` shares, index 0, or a repeated index.
/// Shares are assumed valid; verify their proofs first.
pub fn combine_shares(
    ciphertext: &VoteCiphertext,
    shares: &[(ShareIndex, Point)],
    threshold: usize,
) -> Result<Point> {
    let indices: Vec<ShareIndex> = shares.iter().map(|(index, _)| *index).collect();
    validate_indices(&indices, threshold)?;

    let mut blinding = Point::identity();
    for (i, (_, share)) in shares.iter().enumerate() {
        let lambda = lagrange_coefficient(&indices, i)?;
        blinding = blinding.add(&share.mul(&lambda));
    }
    debug!(shares = shares.len(), threshold, "combined decryption shares");

    Ok(ciphertext.c2.add(&blinding.neg()))
}

/// Single-key decryption to m·G
pub fn decrypt_with_secret(ciphertext: &VoteCiphertext, secret: &Scalar) -> Point {
    ciphertext.c2.sub(&ciphertext.c1.mul(secret))
}
