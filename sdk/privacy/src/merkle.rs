//! Merkle Path Verification
//!
//! Commitments are leaves of a binary Poseidon tree maintained elsewhere. This
//! module only recomputes roots from authentication paths.
//!
//! ```text
//!                    Root
//!                   /    \
//!                 H01    H23          H(MERKLE, left, right)
//!                /  \   /   \
//!               C0  C1 C2   C3        empty leaf = H(EMPTY_LEAF, 0)
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use umbra_primitives::{
    DomainHash, DomainTag, FIELD_BYTES, FieldElement, field_from_bytes, field_to_bytes,
};

use crate::commitment::Commitment;
use crate::error::Result;

/// Tree depth (supports 2^32 notes)
pub const TREE_DEPTH: usize = 32;

/// Inclusion path for one leaf, as returned by a path provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    /// Root the provider claims the path leads to
    pub root: [u8; FIELD_BYTES],
    /// Sibling hashes from leaf to root
    pub siblings: Vec<[u8; FIELD_BYTES]>,
    /// Position bits (false = current node is left, true = right)
    pub path_indices: Vec<bool>,
    pub leaf_index: u64,
}

impl MerklePath {
    /// Root obtained by hashing `leaf` up the path. Siblings must be
    /// canonical encodings.
    pub fn compute_root(&self, hasher: &DomainHash, leaf: &Commitment) -> Result<[u8; FIELD_BYTES]> {
        let merkle = MerkleHasher::new(hasher);
        let root = merkle.compute_root_from_path(
            &leaf.to_field()?,
            &self.sibling_fields()?,
            &self.path_indices,
        )?;
        Ok(field_to_bytes(&root))
    }

    /// `leaf` is included under `self.root`. Path bits must agree with the
    /// leaf index, since the index feeds the spend nullifier. A non-canonical
    /// root or sibling is an error, not a mismatch.
    pub fn verify(&self, hasher: &DomainHash, leaf: &Commitment) -> Result<bool> {
        self.root_field()?;
        if !self.is_consistent() {
            return Ok(false);
        }
        Ok(self.compute_root(hasher, leaf)? == self.root)
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    pub fn root_field(&self) -> Result<FieldElement> {
        Ok(field_from_bytes(&self.root)?)
    }

    /// Siblings as field elements (for witness assembly)
    pub fn sibling_fields(&self) -> Result<Vec<FieldElement>> {
        self.siblings
            .iter()
            .map(|s| Ok(field_from_bytes(s)?))
            .collect()
    }

    fn is_consistent(&self) -> bool {
        if self.siblings.len() != self.path_indices.len() || self.depth() > 64 {
            return false;
        }
        if self.depth() < 64 && self.leaf_index >> self.depth() != 0 {
            return false;
        }
        self.path_indices
            .iter()
            .enumerate()
            .all(|(level, bit)| ((self.leaf_index >> level) & 1 == 1) == *bit)
    }
}

/// Node hashing over a borrowed hash handle
#[derive(Debug, Clone, Copy)]
pub struct MerkleHasher<'a> {
    hasher: &'a DomainHash,
}

impl<'a> MerkleHasher<'a> {
    pub fn new(hasher: &'a DomainHash) -> Self {
        Self { hasher }
    }

    /// Hash two children to get parent
    pub fn hash_pair(&self, left: &FieldElement, right: &FieldElement) -> Result<FieldElement> {
        Ok(self.hasher.hash_tagged(DomainTag::Merkle, &[*left, *right])?)
    }

    pub fn empty_leaf(&self) -> Result<FieldElement> {
        Ok(self
            .hasher
            .hash_tagged(DomainTag::EmptyLeaf, &[FieldElement::from(0u64)])?)
    }

    /// Roots of all-empty subtrees, index = height (0 is the empty leaf)
    pub fn empty_roots(&self, depth: usize) -> Result<Vec<FieldElement>> {
        let mut roots = Vec::with_capacity(depth + 1);
        let mut current = self.empty_leaf()?;
        roots.push(current);
        for _ in 0..depth {
            current = self.hash_pair(&current, &current)?;
            roots.push(current);
        }
        Ok(roots)
    }

    pub fn compute_root_from_path(
        &self,
        leaf: &FieldElement,
        siblings: &[FieldElement],
        path_indices: &[bool],
    ) -> Result<FieldElement> {
        let mut current = *leaf;

        for (sibling, is_right) in siblings.iter().zip(path_indices.iter()) {
            current = if *is_right {
                self.hash_pair(sibling, &current)?
            } else {
                self.hash_pair(&current, sibling)?
            };
        }

        Ok(current)
    }
}

/// H(EMPTY_LEAF, 0)
pub fn empty_leaf(hasher: &DomainHash) -> Result<FieldElement> {
    MerkleHasher::new(hasher).empty_leaf()
}

/// Verifier bound to a shared handle, for long-lived services
#[derive(Debug, Clone)]
pub struct PathVerifier {
    hasher: Arc<DomainHash>,
}

impl PathVerifier {
    pub fn new(hasher: Arc<DomainHash>) -> Self {
        Self { hasher }
    }

    pub fn verify(&self, path: &MerklePath, leaf: &Commitment) -> Result<bool> {
        path.verify(&self.hasher, leaf)
    }
}
