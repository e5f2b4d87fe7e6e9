//! Chaum-Pedersen Proof of Correct Decryption
//!
//! Proves log_G(PK_i) = log_{c1}(D_i) without revealing s_i:
//!
//! ```text
//! prover:   k random,  A1 = k·G,  A2 = k·c1
//!           c = H(DLEQ_CHALLENGE, G, PK_i, c1, D_i, A1, A2) mod N
//!           z = k + c·s_i mod N
//! verifier: z·G  == A1 + c·PK_i
//!           z·c1 == A2 + c·D_i
//! ```

use ark_std::rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use tracing::trace;
use umbra_primitives::{
    DomainHash, DomainTag, FIELD_BYTES, POINT_BYTES, Point, Scalar, mul_generator, random_scalar,
    scalar_from_bytes, scalar_from_field, scalar_to_bytes,
};

use crate::shares::Result;

pub const PROOF_BYTES: usize = 2 * POINT_BYTES + FIELD_BYTES;

/// Non-interactive DLEQ proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DleqProof {
    /// A1 = k·G
    pub commitment_g: Point,
    /// A2 = k·c1
    pub commitment_c1: Point,
    #[serde(with = "scalar_bytes")]
    pub response: Scalar,
}

impl DleqProof {
    pub fn to_bytes(&self) -> [u8; PROOF_BYTES] {
        let mut out = [0u8; PROOF_BYTES];
        out[..POINT_BYTES].copy_from_slice(&self.commitment_g.to_bytes());
        out[POINT_BYTES..2 * POINT_BYTES].copy_from_slice(&self.commitment_c1.to_bytes());
        out[2 * POINT_BYTES..].copy_from_slice(&scalar_to_bytes(&self.response));
        out
    }

    pub fn from_bytes(bytes: &[u8; PROOF_BYTES]) -> Result<Self> {
        let mut a1 = [0u8; POINT_BYTES];
        let mut a2 = [0u8; POINT_BYTES];
        let mut z = [0u8; FIELD_BYTES];
        a1.copy_from_slice(&bytes[..POINT_BYTES]);
        a2.copy_from_slice(&bytes[POINT_BYTES..2 * POINT_BYTES]);
        z.copy_from_slice(&bytes[2 * POINT_BYTES..]);

        Ok(Self {
            commitment_g: Point::from_bytes(&a1)?,
            commitment_c1: Point::from_bytes(&a2)?,
            response: scalar_from_bytes(&z)?,
        })
    }
}

fn challenge(
    hasher: &DomainHash,
    pubkey: &Point,
    c1: &Point,
    share: &Point,
    a1: &Point,
    a2: &Point,
) -> Result<Scalar> {
    let g = Point::generator();
    let inputs: Vec<_> = [&g, pubkey, c1, share, a1, a2]
        .iter()
        .flat_map(|p| [p.x(), p.y()])
        .collect();
    let digest = hasher.hash_tagged(DomainTag::DleqChallenge, &inputs)?;
    Ok(scalar_from_field(&digest))
}

/// Prove that `secret·c1` was computed with the secret behind `secret·G`
pub fn generate_dleq_proof<R: Rng + CryptoRng>(
    hasher: &DomainHash,
    secret: &Scalar,
    c1: &Point,
    rng: &mut R,
) -> Result<DleqProof> {
    let pubkey = mul_generator(secret);
    let share = c1.mul(secret);

    let k = random_scalar(rng);
    let a1 = mul_generator(&k);
    let a2 = c1.mul(&k);

    let c = challenge(hasher, &pubkey, c1, &share, &a1, &a2)?;

    Ok(DleqProof {
        commitment_g: a1,
        commitment_c1: a2,
        response: k + c * secret,
    })
}

/// `Ok(false)` for any proof that does not check out; errors only when the
/// hash is unavailable
pub fn verify_dleq_proof(
    hasher: &DomainHash,
    pubkey: &Point,
    c1: &Point,
    share: &Point,
    proof: &DleqProof,
) -> Result<bool> {
    let c = challenge(
        hasher,
        pubkey,
        c1,
        share,
        &proof.commitment_g,
        &proof.commitment_c1,
    )?;

    let lhs_g = mul_generator(&proof.response);
    let rhs_g = proof.commitment_g.add(&pubkey.mul(&c));
    if lhs_g != rhs_g {
        trace!("dleq check against G failed");
        return Ok(false);
    }

    let lhs_c1 = c1.mul(&proof.response);
    let rhs_c1 = proof.commitment_c1.add(&share.mul(&c));
    if lhs_c1 != rhs_c1 {
        trace!("dleq check against c1 failed");
        return Ok(false);
    }

    Ok(true)
}

mod scalar_bytes {
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
    use umbra_primitives::{FIELD_BYTES, Scalar, scalar_from_bytes, scalar_to_bytes};

    pub fn serialize<S: Serializer>(scalar: &Scalar, serializer: S) -> Result<S::Ok, S::Error> {
        scalar_to_bytes(scalar).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Scalar, D::Error> {
        let bytes = <[u8; FIELD_BYTES]>::deserialize(deserializer)?;
        scalar_from_bytes(&bytes).map_err(de::Error::custom)
    }
}
