//! Note Scanning
//!
//! Trial-decrypts published notes with the wallet's key and keeps the ones
//! whose commitment matches. Found notes carry their spend nullifier so the
//! wallet can ask a [`MembershipOracle`] whether they were already spent.

use std::sync::Arc;

use tracing::{debug, info, trace};
use umbra_config::UmbraConfig;
use umbra_primitives::{DomainHash, Scalar};

use crate::commitment::{Commitment, verify_commitment};
use crate::encryption::{EncryptedNote, NoteCipher};
use crate::error::Result;
use crate::note::{Note, ShieldedKeyBundle};
use crate::nullifier::{Nullifier, NullifierKey};
use crate::witness::MembershipOracle;

/// A published output as seen by the scanner
#[derive(Debug, Clone)]
pub struct ScanCandidate {
    pub encrypted: EncryptedNote,
    pub commitment: Commitment,
    pub leaf_index: u64,
}

/// A note the wallet controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedNote {
    pub note: Note,
    pub commitment: Commitment,
    pub leaf_index: u64,
    pub nullifier: Nullifier,
}

pub struct NoteScanner {
    hasher: Arc<DomainHash>,
    cipher: NoteCipher,
    decryption_key: Scalar,
    nullifier_key: NullifierKey,
    verify_commitment: bool,
}

impl NoteScanner {
    pub fn new(hasher: Arc<DomainHash>, cipher: NoteCipher, keys: &ShieldedKeyBundle) -> Self {
        Self {
            hasher,
            cipher,
            decryption_key: *keys.keypair.secret(),
            nullifier_key: keys.nullifier_key,
            verify_commitment: true,
        }
    }

    pub fn from_config(hasher: Arc<DomainHash>, keys: &ShieldedKeyBundle, config: &UmbraConfig) -> Self {
        Self::new(hasher, NoteCipher::new(config.cipher.suite.into()), keys)
            .with_commitment_check(config.scan.verify_commitment)
    }

    /// Skipping the check trusts the sender's plaintext for the commitment
    pub fn with_commitment_check(mut self, enabled: bool) -> Self {
        self.verify_commitment = enabled;
        self
    }

    /// `Ok(None)` when the candidate is not ours. Errors only when the hash
    /// is unavailable.
    pub fn scan_one(&self, candidate: &ScanCandidate) -> Result<Option<OwnedNote>> {
        let Some(note) = self.cipher.try_decrypt(&candidate.encrypted, &self.decryption_key) else {
            trace!(leaf_index = candidate.leaf_index, "not addressed to us");
            return Ok(None);
        };

        if self.verify_commitment
            && !verify_commitment(&self.hasher, &candidate.commitment, &note)?
        {
            debug!(
                leaf_index = candidate.leaf_index,
                "decrypted note does not match its commitment"
            );
            return Ok(None);
        }

        let nullifier =
            self.nullifier_key
                .spending_nullifier(&self.hasher, &candidate.commitment, candidate.leaf_index)?;

        Ok(Some(OwnedNote {
            note,
            commitment: candidate.commitment,
            leaf_index: candidate.leaf_index,
            nullifier,
        }))
    }

    pub fn scan(&self, candidates: &[ScanCandidate]) -> Result<Vec<OwnedNote>> {
        let mut found = Vec::new();
        for candidate in candidates {
            if let Some(owned) = self.scan_one(candidate)? {
                found.push(owned);
            }
        }
        info!(scanned = candidates.len(), found = found.len(), "note scan complete");
        Ok(found)
    }

    /// Drop notes whose nullifier is already published
    pub async fn unspent<O: MembershipOracle>(
        &self,
        notes: Vec<OwnedNote>,
        oracle: &O,
    ) -> std::result::Result<Vec<OwnedNote>, O::Error> {
        let mut unspent = Vec::with_capacity(notes.len());
        for owned in notes {
            if oracle.exists(owned.nullifier.as_bytes()).await? {
                debug!(leaf_index = owned.leaf_index, "note already spent");
                continue;
            }
            unspent.push(owned);
        }
        Ok(unspent)
    }
}
