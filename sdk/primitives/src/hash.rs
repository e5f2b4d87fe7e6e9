//! Domain-Separated Poseidon Hash
//!
//! Every protocol hash is a Poseidon sponge over the BN254 scalar field with a
//! numeric domain tag absorbed ahead of the inputs:
//!
//! ```text
//! H(tag, x_1, ..., x_n) = Poseidon(tag || x_1 || ... || x_n)
//! ```
//!
//! The tag is the only thing separating, say, a commitment from a nullifier
//! over identical raw inputs, so every purpose owns exactly one [`DomainTag`].
//!
//! Generating the round constants and MDS matrix is slow, so it happens once,
//! on a blocking worker. Concurrent [`DomainHash::initialize`] and
//! [`DomainHash::initialize_blocking`] calls share a single in-flight
//! generation; neither returns before the parameters are in place.
//! [`DomainHash::hash`] never waits: before initialization it fails with
//! [`CryptoError::NotInitialized`].

use std::sync::{Arc, OnceLock};

use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use tracing::{debug, info};

use crate::error::{CryptoError, Result};
use crate::field::{FIELD_BYTES, FieldElement, field_from_bytes_mod_order, field_to_bytes};

/// Protocol-wide domain tags. Never reuse a value for a second purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum DomainTag {
    Commitment = 1,
    SpendNullifier = 2,
    ActionNullifier = 3,
    NullifierKey = 4,
    Stealth = 5,
    Merkle = 6,
    EmptyLeaf = 7,
    /// Incoming viewing key
    Ivk = 8,
    /// Fiat-Shamir challenge of the decryption share proof
    DleqChallenge = 9,
}

impl DomainTag {
    pub const fn value(self) -> u64 {
        self as u64
    }

    pub fn to_field(self) -> FieldElement {
        FieldElement::from(self.value())
    }
}

static GLOBAL_HASH: OnceLock<Arc<DomainHash>> = OnceLock::new();

/// Handle to the Poseidon permutation with init-once parameter state.
///
/// Share it behind an `Arc`; all hashing goes through `&self`.
#[derive(Debug, Default)]
pub struct DomainHash {
    config: Arc<OnceLock<PoseidonConfig<FieldElement>>>,
}

impl DomainHash {
    /// Create an uninitialized handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and initialize a handle in one step
    pub async fn ready() -> Result<Arc<Self>> {
        let hasher = Arc::new(Self::new());
        hasher.initialize().await?;
        Ok(hasher)
    }

    /// The process-wide handle. Still has to be initialized before use.
    pub fn global() -> Arc<DomainHash> {
        GLOBAL_HASH
            .get_or_init(|| Arc::new(DomainHash::new()))
            .clone()
    }

    /// Generate the permutation parameters. Idempotent; concurrent callers
    /// wait on the same generation. Must run inside a Tokio runtime.
    pub async fn initialize(&self) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }
        let config = Arc::clone(&self.config);
        tokio::task::spawn_blocking(move || {
            config.get_or_init(generate_config);
        })
        .await
        .map_err(|e| CryptoError::HashSetup(e.to_string()))
    }

    /// Synchronous initialization for callers outside a runtime. Blocks until
    /// the parameters exist, joining any generation already in flight.
    pub fn initialize_blocking(&self) {
        self.config.get_or_init(generate_config);
    }

    pub fn is_initialized(&self) -> bool {
        self.config.get().is_some()
    }

    /// Hash `inputs`, prefixed with `tag` when present
    pub fn hash(&self, tag: Option<DomainTag>, inputs: &[FieldElement]) -> Result<FieldElement> {
        let config = self.config.get().ok_or(CryptoError::NotInitialized)?;
        let mut sponge = PoseidonSponge::new(config);

        if let Some(tag) = tag {
            sponge.absorb(&tag.to_field());
        }
        for input in inputs {
            sponge.absorb(input);
        }

        let result: FieldElement = sponge.squeeze_field_elements(1)[0];
        Ok(result)
    }

    /// Shorthand for the tagged form, which is what every protocol hash uses
    pub fn hash_tagged(&self, tag: DomainTag, inputs: &[FieldElement]) -> Result<FieldElement> {
        self.hash(Some(tag), inputs)
    }

    /// Byte-oriented variant: inputs are lifted big-endian mod P, output is
    /// the 32-byte big-endian encoding
    pub fn hash_bytes(&self, tag: Option<DomainTag>, inputs: &[&[u8]]) -> Result<[u8; FIELD_BYTES]> {
        let elements: Vec<FieldElement> = inputs
            .iter()
            .map(|bytes| field_from_bytes_mod_order(bytes))
            .collect();
        Ok(field_to_bytes(&self.hash(tag, &elements)?))
    }
}

fn generate_config() -> PoseidonConfig<FieldElement> {
    debug!("generating poseidon parameters");
    let config = poseidon_config();
    info!(
        full_rounds = config.full_rounds,
        partial_rounds = config.partial_rounds,
        "domain hash initialized"
    );
    config
}

/// Poseidon configuration for Umbra
///
/// Field: BN254 Fr (254 bits)
/// Rate: 2, Capacity: 1
/// Security: 128 bits
fn poseidon_config() -> PoseidonConfig<FieldElement> {
    let prime_bits: u64 = 254;
    let rate: usize = 2;
    let capacity: usize = 1;
    let full_rounds: u64 = 8;
    let partial_rounds: u64 = 57;
    let alpha: u64 = 5;
    let skip_matrices: u64 = 0;

    let (ark, mds) = find_poseidon_ark_and_mds::<FieldElement>(
        prime_bits,
        rate,
        full_rounds,
        partial_rounds,
        skip_matrices,
    );

    PoseidonConfig::new(
        full_rounds as usize,
        partial_rounds as usize,
        alpha,
        mds,
        ark,
        rate,
        capacity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_before_init_fails() {
        let hasher = DomainHash::new();
        assert!(!hasher.is_initialized());
        assert_eq!(
            hasher.hash_tagged(DomainTag::Commitment, &[FieldElement::from(1u64)]),
            Err(CryptoError::NotInitialized)
        );
    }

    #[tokio::test]
    async fn test_hash_deterministic() {
        let hasher = DomainHash::ready().await.unwrap();
        let inputs = [FieldElement::from(1u64), FieldElement::from(2u64)];

        let h1 = hasher.hash_tagged(DomainTag::Commitment, &inputs).unwrap();
        let h2 = hasher.hash_tagged(DomainTag::Commitment, &inputs).unwrap();
        assert_eq!(h1, h2);
    }

    #[tokio::test]
    async fn test_domain_tags_separate_outputs() {
        let hasher = DomainHash::ready().await.unwrap();
        let inputs = [FieldElement::from(7u64), FieldElement::from(9u64)];

        let commitment = hasher.hash_tagged(DomainTag::Commitment, &inputs).unwrap();
        let nullifier = hasher.hash_tagged(DomainTag::SpendNullifier, &inputs).unwrap();
        let untagged = hasher.hash(None, &inputs).unwrap();

        assert_ne!(commitment, nullifier);
        assert_ne!(commitment, untagged);
    }

    #[tokio::test]
    async fn test_tag_is_prepended() {
        let hasher = DomainHash::ready().await.unwrap();
        let x = FieldElement::from(42u64);

        let tagged = hasher.hash_tagged(DomainTag::Stealth, &[x]).unwrap();
        let manual = hasher.hash(None, &[DomainTag::Stealth.to_field(), x]).unwrap();
        assert_eq!(tagged, manual);
    }

    #[tokio::test]
    async fn test_input_order_matters() {
        let hasher = DomainHash::ready().await.unwrap();
        let a = FieldElement::from(1u64);
        let b = FieldElement::from(2u64);
        assert_ne!(
            hasher.hash_tagged(DomainTag::Merkle, &[a, b]).unwrap(),
            hasher.hash_tagged(DomainTag::Merkle, &[b, a]).unwrap()
        );
    }

    #[tokio::test]
    async fn test_hash_bytes_matches_field_form() {
        let hasher = DomainHash::ready().await.unwrap();
        let raw = [3u8; 32];

        let from_bytes = hasher.hash_bytes(Some(DomainTag::Ivk), &[&raw]).unwrap();
        let from_field = hasher
            .hash_tagged(DomainTag::Ivk, &[field_from_bytes_mod_order(&raw)])
            .unwrap();
        assert_eq!(from_bytes, field_to_bytes(&from_field));
    }

    #[test]
    fn test_blocking_init() {
        let hasher = DomainHash::new();
        hasher.initialize_blocking();
        hasher.initialize_blocking();
        assert!(hasher.hash(None, &[FieldElement::from(1u64)]).is_ok());
    }
}
