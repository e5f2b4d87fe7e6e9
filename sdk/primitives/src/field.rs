//! Field Arithmetic
//!
//! Two prime fields are in play:
//!
//! ```text
//! FieldElement  mod P = 21888242871839275222246405745257275088548364400416034343698204186575808495617
//!               (BN254 scalar field, the field the curve is defined over)
//! Scalar        mod N = 2736030358979909402780800718157159386076813972158567259200215660948447373041
//!               (order of the Baby Jubjub prime-order subgroup)
//! ```
//!
//! Both encode as 32 bytes, big-endian. Strict decoders reject anything that is
//! not already reduced; `*_mod_order` variants reduce (used for hash outputs and
//! raw byte identifiers).

use ark_ff::{BigInteger, Field, PrimeField, UniformRand};
use ark_std::rand::{CryptoRng, Rng};

use crate::error::{CryptoError, Result};

/// Element of the BN254 scalar field
pub type FieldElement = ark_bn254::Fr;

/// Element of the curve's scalar field (private keys, blinding factors)
pub type Scalar = ark_ed_on_bn254::Fr;

/// Size of a field element or scalar encoding
pub const FIELD_BYTES: usize = 32;

pub fn add(a: &FieldElement, b: &FieldElement) -> FieldElement {
    *a + *b
}

pub fn mul(a: &FieldElement, b: &FieldElement) -> FieldElement {
    *a * *b
}

/// Multiplicative inverse. Zero has none.
pub fn invert(a: &FieldElement) -> Result<FieldElement> {
    a.inverse().ok_or(CryptoError::InvalidFieldElement)
}

/// Decode a canonical 32-byte big-endian field element
pub fn field_from_bytes(bytes: &[u8; FIELD_BYTES]) -> Result<FieldElement> {
    let fe = FieldElement::from_be_bytes_mod_order(bytes);
    if field_to_bytes(&fe) != *bytes {
        return Err(CryptoError::InvalidFieldElement);
    }
    Ok(fe)
}

/// Lift arbitrary bytes to a field element (big-endian, reduced mod P)
pub fn field_from_bytes_mod_order(bytes: &[u8]) -> FieldElement {
    FieldElement::from_be_bytes_mod_order(bytes)
}

pub fn field_to_bytes(fe: &FieldElement) -> [u8; FIELD_BYTES] {
    left_pad(&fe.into_bigint().to_bytes_be())
}

/// Decode a canonical 32-byte big-endian scalar
pub fn scalar_from_bytes(bytes: &[u8; FIELD_BYTES]) -> Result<Scalar> {
    let s = Scalar::from_be_bytes_mod_order(bytes);
    if scalar_to_bytes(&s) != *bytes {
        return Err(CryptoError::InvalidScalar);
    }
    Ok(s)
}

pub fn scalar_from_bytes_mod_order(bytes: &[u8]) -> Scalar {
    Scalar::from_be_bytes_mod_order(bytes)
}

pub fn scalar_to_bytes(s: &Scalar) -> [u8; FIELD_BYTES] {
    left_pad(&s.into_bigint().to_bytes_be())
}

/// Reduce a base-field element modulo the subgroup order
pub fn scalar_from_field(fe: &FieldElement) -> Scalar {
    Scalar::from_be_bytes_mod_order(&field_to_bytes(fe))
}

/// Embed a scalar in the base field (N < P, so this never wraps)
pub fn field_from_scalar(s: &Scalar) -> FieldElement {
    FieldElement::from_be_bytes_mod_order(&scalar_to_bytes(s))
}

pub fn random_scalar<R: Rng + CryptoRng>(rng: &mut R) -> Scalar {
    Scalar::rand(rng)
}

pub fn random_field_element<R: Rng + CryptoRng>(rng: &mut R) -> FieldElement {
    FieldElement::rand(rng)
}

fn left_pad(bytes: &[u8]) -> [u8; FIELD_BYTES] {
    let mut out = [0u8; FIELD_BYTES];
    let len = bytes.len().min(FIELD_BYTES);
    out[FIELD_BYTES - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::{One, Zero};
    use rand::rngs::OsRng;

    // P - 1, big-endian
    const P_MINUS_ONE: &str = "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000000";
    const P: &str = "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001";

    fn bytes32(hex_str: &str) -> [u8; 32] {
        hex::decode(hex_str).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_field_encoding_is_canonical() {
        let max = field_from_bytes(&bytes32(P_MINUS_ONE)).unwrap();
        assert_eq!(max + FieldElement::one(), FieldElement::zero());

        assert_eq!(
            field_from_bytes(&bytes32(P)),
            Err(CryptoError::InvalidFieldElement)
        );
        assert_eq!(
            field_from_bytes(&[0xff; 32]),
            Err(CryptoError::InvalidFieldElement)
        );
    }

    #[test]
    fn test_mod_order_lift_wraps() {
        assert_eq!(field_from_bytes_mod_order(&bytes32(P)), FieldElement::zero());
        assert_eq!(
            field_from_bytes_mod_order(&[0, 0, 1]),
            FieldElement::from(1u64)
        );
    }

    #[test]
    fn test_invert() {
        let a = FieldElement::from(12345u64);
        let inv = invert(&a).unwrap();
        assert_eq!(mul(&a, &inv), FieldElement::one());
        assert_eq!(
            invert(&FieldElement::zero()),
            Err(CryptoError::InvalidFieldElement)
        );
    }

    #[test]
    fn test_add_wraps_mod_p() {
        let max = field_from_bytes(&bytes32(P_MINUS_ONE)).unwrap();
        assert_eq!(add(&max, &FieldElement::from(2u64)), FieldElement::one());
    }

    #[test]
    fn test_scalar_encoding() {
        let s = random_scalar(&mut OsRng);
        assert_eq!(scalar_from_bytes(&scalar_to_bytes(&s)).unwrap(), s);

        // Any base-field element >= N is rejected by the strict scalar decoder
        let big = field_to_bytes(&-FieldElement::one());
        assert_eq!(scalar_from_bytes(&big), Err(CryptoError::InvalidScalar));
        assert_eq!(scalar_from_field(&-FieldElement::one()), scalar_from_bytes_mod_order(&big));
    }

    #[test]
    fn test_scalar_field_embedding() {
        let s = random_scalar(&mut OsRng);
        let fe = field_from_scalar(&s);
        assert_eq!(scalar_from_field(&fe), s);
    }
}
