//! Witness Assembly and Collaborator Boundaries
//!
//! The core never proves anything itself. It hands named field values to a
//! [`RemoteProver`] and gets opaque proof bytes back. Tree paths and spent-set
//! lookups come from outside as well.
//!
//! ```text
//!   Note + keys + MerklePath ──▶ SpendWitness ──▶ WitnessInputs ──▶ RemoteProver ──▶ ProofBytes
//!                 ▲
//!        MerklePathProvider              MembershipOracle (nullifier set)
//! ```

use std::collections::BTreeMap;
use std::future::Future;

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use umbra_primitives::{DomainHash, FieldElement};

use crate::commitment::Commitment;
use crate::error::{NoteError, Result};
use crate::merkle::MerklePath;
use crate::note::Note;
use crate::nullifier::{Nullifier, NullifierKey};

/// Circuit identifier for note spends
pub const SPEND_CIRCUIT: &str = "spend";

/// One named circuit input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WitnessValue {
    Field(FieldElement),
    Array(Vec<FieldElement>),
}

/// Named circuit inputs, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessInputs {
    values: BTreeMap<String, WitnessValue>,
}

impl WitnessInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: FieldElement) -> &mut Self {
        self.values.insert(name.into(), WitnessValue::Field(value));
        self
    }

    pub fn insert_array(&mut self, name: impl Into<String>, values: Vec<FieldElement>) -> &mut Self {
        self.values.insert(name.into(), WitnessValue::Array(values));
        self
    }

    pub fn get(&self, name: &str) -> Option<&WitnessValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WitnessValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Decimal strings, the form circuit tooling consumes
    pub fn to_decimal_map(&self) -> BTreeMap<String, Vec<String>> {
        self.values
            .iter()
            .map(|(name, value)| {
                let rendered = match value {
                    WitnessValue::Field(f) => vec![decimal(f)],
                    WitnessValue::Array(fs) => fs.iter().map(decimal).collect(),
                };
                (name.clone(), rendered)
            })
            .collect()
    }
}

fn decimal(f: &FieldElement) -> String {
    f.into_bigint().to_string()
}

/// Opaque proof returned by a prover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofBytes(pub Vec<u8>);

/// Proof generation service
pub trait RemoteProver {
    type Error;

    fn prove(
        &self,
        circuit: &str,
        inputs: &WitnessInputs,
    ) -> impl Future<Output = std::result::Result<ProofBytes, Self::Error>> + Send;
}

/// Set-membership lookup, e.g. the published nullifier set
pub trait MembershipOracle {
    type Error;

    fn exists(
        &self,
        key: &[u8; 32],
    ) -> impl Future<Output = std::result::Result<bool, Self::Error>> + Send;
}

/// Source of inclusion paths for published commitments
pub trait MerklePathProvider {
    type Error;

    fn path(
        &self,
        leaf: &Commitment,
    ) -> impl Future<Output = std::result::Result<MerklePath, Self::Error>> + Send;
}

/// Everything the spend circuit needs for one input note
#[derive(Debug, Clone)]
pub struct SpendWitness {
    pub note: Note,
    pub nullifier_key: NullifierKey,
    pub commitment: Commitment,
    pub nullifier: Nullifier,
    pub path: MerklePath,
}

impl SpendWitness {
    /// Assemble and self-check a spend witness. Returns `Ok(None)` when the
    /// path does not prove the note's commitment.
    pub fn build(
        hasher: &DomainHash,
        note: &Note,
        nullifier_key: &NullifierKey,
        path: MerklePath,
    ) -> Result<Option<Self>> {
        let commitment = note.commitment(hasher)?;
        if !path.verify(hasher, &commitment)? {
            debug!(leaf_index = path.leaf_index, "merkle path does not match note");
            return Ok(None);
        }
        let nullifier = nullifier_key.spending_nullifier(hasher, &commitment, path.leaf_index)?;

        Ok(Some(Self {
            note: *note,
            nullifier_key: *nullifier_key,
            commitment,
            nullifier,
            path,
        }))
    }

    pub fn to_inputs(&self) -> Result<WitnessInputs> {
        let mut inputs = WitnessInputs::new();
        inputs
            .insert_field("stealth_pub_x", self.note.stealth_pub_x)
            .insert_field("token_id", self.note.token_field())
            .insert_field("amount", self.note.amount.to_field())
            .insert_field("randomness", self.note.randomness)
            .insert_field("nullifier_key", self.nullifier_key.to_field())
            .insert_field("leaf_index", FieldElement::from(self.path.leaf_index))
            .insert_array("path_elements", self.path.sibling_fields()?)
            .insert_array(
                "path_indices",
                self.path
                    .path_indices
                    .iter()
                    .map(|bit| FieldElement::from(*bit))
                    .collect(),
            )
            .insert_field("merkle_root", self.path.root_field()?)
            .insert_field("commitment", self.commitment.to_field()?)
            .insert_field("nullifier", self.nullifier.to_field()?);
        Ok(inputs)
    }
}

/// Fetch the path, assemble the witness, and prove it
pub async fn prove_spend<P, M>(
    hasher: &DomainHash,
    note: &Note,
    nullifier_key: &NullifierKey,
    paths: &M,
    prover: &P,
) -> std::result::Result<Option<(Nullifier, ProofBytes)>, SpendError<M::Error, P::Error>>
where
    P: RemoteProver,
    M: MerklePathProvider,
{
    let commitment = note.commitment(hasher)?;
    let path = paths.path(&commitment).await.map_err(SpendError::Path)?;

    let Some(witness) = SpendWitness::build(hasher, note, nullifier_key, path)? else {
        return Ok(None);
    };

    let proof = prover
        .prove(SPEND_CIRCUIT, &witness.to_inputs()?)
        .await
        .map_err(SpendError::Prover)?;
    Ok(Some((witness.nullifier, proof)))
}

/// Failure of one of the stages in [`prove_spend`]
#[derive(Error, Debug)]
pub enum SpendError<PathErr, ProverErr> {
    #[error(transparent)]
    Note(#[from] NoteError),

    #[error("merkle path provider failed: {0}")]
    Path(PathErr),

    #[error("remote prover failed: {0}")]
    Prover(ProverErr),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::MerkleHasher;
    use umbra_primitives::field_to_bytes;

    #[test]
    fn test_inputs_render_decimal() {
        let mut inputs = WitnessInputs::new();
        inputs
            .insert_field("a", FieldElement::from(42u64))
            .insert_array("b", vec![FieldElement::from(0u64), FieldElement::from(7u64)]);

        let rendered = inputs.to_decimal_map();
        assert_eq!(rendered["a"], vec!["42".to_string()]);
        assert_eq!(rendered["b"], vec!["0".to_string(), "7".to_string()]);
        assert_eq!(inputs.len(), 2);
    }

    #[tokio::test]
    async fn test_spend_witness_rejects_wrong_path() {
        let hasher = DomainHash::ready().await.unwrap();
        let nk = crate::nullifier::derive_nullifier_key(&hasher, &[1; 32]).unwrap();
        let note = Note::random(FieldElement::from(5u64), [0; 32], 10);

        let merkle = MerkleHasher::new(&hasher);
        let sibling = merkle.empty_leaf().unwrap();
        let commitment = note.commitment(&hasher).unwrap();
        let root = merkle
            .hash_pair(&commitment.to_field().unwrap(), &sibling)
            .unwrap();

        let good = MerklePath {
            root: field_to_bytes(&root),
            siblings: vec![field_to_bytes(&sibling)],
            path_indices: vec![false],
            leaf_index: 0,
        };
        let witness = SpendWitness::build(&hasher, &note, &nk, good.clone())
            .unwrap()
            .unwrap();
        let inputs = witness.to_inputs().unwrap();
        assert_eq!(
            inputs.get("nullifier"),
            Some(&WitnessValue::Field(witness.nullifier.to_field().unwrap()))
        );
        assert_eq!(inputs.get("merkle_root"), Some(&WitnessValue::Field(root)));

        let mut bad = good;
        bad.root = [0u8; 32];
        assert!(SpendWitness::build(&hasher, &note, &nk, bad).unwrap().is_none());
    }
}
