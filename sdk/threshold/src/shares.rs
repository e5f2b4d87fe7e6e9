//! Shamir Secret Sharing over the Curve Scalar Field
//!
//! The committee master secret s is the constant term of a random polynomial
//! of degree t-1 modulo N. Member i holds f(i). Any t members can rebuild
//! anything linear in s (here: s·c1) with Lagrange coefficients at x = 0:
//!
//! ```text
//! λ_i(0) = Π_{j≠i} x_j / (x_j - x_i)
//! ```

use std::collections::HashSet;

use ark_ff::Field;
use ark_std::rand::{CryptoRng, Rng};
use ark_std::{One, Zero};
use thiserror::Error;
use umbra_primitives::{CryptoError, Scalar, random_scalar};

/// A share identifier (1-indexed; 0 would be the secret itself)
pub type ShareIndex = u32;

/// A member's share of the master secret
#[derive(Clone, PartialEq, Eq)]
pub struct SecretShare {
    pub index: ShareIndex,
    pub value: Scalar,
}

impl SecretShare {
    pub fn new(index: ShareIndex, value: Scalar) -> Self {
        Self { index, value }
    }
}

impl std::fmt::Debug for SecretShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretShare")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Threshold scheme errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThresholdError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("insufficient shares: got {got}, need {need}")]
    InsufficientShares { got: usize, need: usize },

    #[error("invalid threshold: k={k}, n={n}")]
    InvalidThreshold { k: usize, n: usize },

    #[error("duplicate share index {0}")]
    DuplicateIndex(ShareIndex),

    /// Index 0, or a member the committee does not know
    #[error("invalid share index {0}")]
    InvalidIndex(ShareIndex),

    #[error("decryption share from member {0} failed verification")]
    InvalidShareProof(ShareIndex),

    #[error("choice {choice} out of range for {num_choices} choices")]
    InvalidChoice { choice: usize, num_choices: usize },

    #[error("ballot has {got} entries, expected {expected}")]
    BallotShapeMismatch { got: usize, expected: usize },

    #[error("share decryption failed")]
    DecryptionFailed,

    #[error("share encryption failed")]
    EncryptionFailed,
}

pub type Result<T> = std::result::Result<T, ThresholdError>;

/// Valid `k`-of-`n` parameters
pub fn check_threshold(k: usize, n: usize) -> Result<()> {
    if k == 0 || k > n || n > ShareIndex::MAX as usize {
        return Err(ThresholdError::InvalidThreshold { k, n });
    }
    Ok(())
}

/// Split `secret` into `total` shares, any `threshold` of which recover it
pub fn split_secret<R: Rng + CryptoRng>(
    secret: &Scalar,
    threshold: usize,
    total: usize,
    rng: &mut R,
) -> Result<Vec<SecretShare>> {
    check_threshold(threshold, total)?;

    // f(x) = secret + a_1*x + ... + a_{t-1}*x^{t-1}
    let mut coefficients = vec![*secret];
    for _ in 1..threshold {
        coefficients.push(random_scalar(rng));
    }

    Ok((1..=total as ShareIndex)
        .map(|index| SecretShare::new(index, evaluate_polynomial(&coefficients, index)))
        .collect())
}

/// Rebuild the secret from at least `threshold` shares
pub fn reconstruct_secret(shares: &[SecretShare], threshold: usize) -> Result<Scalar> {
    let indices: Vec<ShareIndex> = shares.iter().map(|s| s.index).collect();
    validate_indices(&indices, threshold)?;

    let mut secret = Scalar::zero();
    for (i, share) in shares.iter().enumerate() {
        secret += share.value * lagrange_coefficient(&indices, i)?;
    }
    Ok(secret)
}

/// Enough shares, no zero index, no repeats
pub fn validate_indices(indices: &[ShareIndex], threshold: usize) -> Result<()> {
    if indices.len() < threshold {
        return Err(ThresholdError::InsufficientShares {
            got: indices.len(),
            need: threshold,
        });
    }
    let mut seen = HashSet::with_capacity(indices.len());
    for &index in indices {
        if index == 0 {
            return Err(ThresholdError::InvalidIndex(index));
        }
        if !seen.insert(index) {
            return Err(ThresholdError::DuplicateIndex(index));
        }
    }
    Ok(())
}

/// λ_i(0) over `indices`, modulo N. `i` is a position in `indices`.
pub fn lagrange_coefficient(indices: &[ShareIndex], i: usize) -> Result<Scalar> {
    let Some(&index_i) = indices.get(i) else {
        return Err(ThresholdError::InvalidIndex(
            ShareIndex::try_from(i).unwrap_or(ShareIndex::MAX),
        ));
    };
    let x_i = Scalar::from(index_i);
    let mut numerator = Scalar::one();
    let mut denominator = Scalar::one();

    for (j, &index) in indices.iter().enumerate() {
        if i != j {
            let x_j = Scalar::from(index);
            numerator *= x_j;
            denominator *= x_j - x_i;
        }
    }

    let inverse = denominator
        .inverse()
        .ok_or(ThresholdError::DuplicateIndex(index_i))?;
    Ok(numerator * inverse)
}

fn evaluate_polynomial(coefficients: &[Scalar], index: ShareIndex) -> Scalar {
    let x = Scalar::from(index);
    coefficients
        .iter()
        .rev()
        .fold(Scalar::zero(), |acc, coeff| acc * x + coeff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{SeedableRng, rngs::StdRng};

    /// Same deterministic StdRng as `ark_std::test_rng`, but with a concrete
    /// type so it satisfies the `CryptoRng` bound on `split_secret`.
    fn test_rng() -> StdRng {
        let seed = [
            1, 0, 0, 0, 23, 0, 0, 0, 200, 1, 0, 0, 210, 30, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
        ];
        StdRng::from_seed(seed)
    }

    #[test]
    fn test_split_and_reconstruct() {
        let mut rng = test_rng();
        let secret = Scalar::from(12345u64);
        let shares = split_secret(&secret, 3, 5, &mut rng).unwrap();
        assert_eq!(shares.len(), 5);

        assert_eq!(reconstruct_secret(&shares[0..3], 3).unwrap(), secret);

        let alt = vec![shares[0].clone(), shares[2].clone(), shares[4].clone()];
        assert_eq!(reconstruct_secret(&alt, 3).unwrap(), secret);

        assert_eq!(reconstruct_secret(&shares, 3).unwrap(), secret);
    }

    #[test]
    fn test_below_threshold_fails() {
        let mut rng = test_rng();
        let shares = split_secret(&Scalar::from(1u64), 3, 5, &mut rng).unwrap();
        assert_eq!(
            reconstruct_secret(&shares[0..2], 3),
            Err(ThresholdError::InsufficientShares { got: 2, need: 3 })
        );
    }

    #[test]
    fn test_lagrange_position_out_of_range() {
        let indices = [1, 2, 3];
        assert_eq!(
            lagrange_coefficient(&indices, 3),
            Err(ThresholdError::InvalidIndex(3))
        );
        assert_eq!(
            lagrange_coefficient(&[], 0),
            Err(ThresholdError::InvalidIndex(0))
        );
    }

    #[test]
    fn test_lagrange_coefficients_sum_to_one() {
        let indices = [1, 2, 3];
        let sum: Scalar = (0..3)
            .map(|i| lagrange_coefficient(&indices, i).unwrap())
            .sum();
        assert_eq!(sum, Scalar::one());
    }

    #[test]
    fn test_index_validation() {
        assert_eq!(
            validate_indices(&[1, 0, 3], 2),
            Err(ThresholdError::InvalidIndex(0))
        );
        assert_eq!(
            validate_indices(&[1, 2, 2], 2),
            Err(ThresholdError::DuplicateIndex(2))
        );
        assert!(validate_indices(&[4, 1], 2).is_ok());
    }

    #[test]
    fn test_invalid_threshold() {
        let mut rng = test_rng();
        let secret = Scalar::from(5u64);
        assert_eq!(
            split_secret(&secret, 0, 3, &mut rng),
            Err(ThresholdError::InvalidThreshold { k: 0, n: 3 })
        );
        assert_eq!(
            split_secret(&secret, 4, 3, &mut rng),
            Err(ThresholdError::InvalidThreshold { k: 4, n: 3 })
        );
    }

    #[test]
    fn test_threshold_one_shares_equal_secret() {
        let mut rng = test_rng();
        let secret = Scalar::from(99u64);
        for share in split_secret(&secret, 1, 4, &mut rng).unwrap() {
            assert_eq!(share.value, secret);
        }
    }
}
