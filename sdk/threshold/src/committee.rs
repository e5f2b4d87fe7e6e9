//! Committee Management
//!
//! The decryption committee holds Shamir shares of the tally key. Each member
//! publishes s_i·G at setup; at tally time each member posts s_i·c1 with a
//! DLEQ proof against that public share, and anyone can verify and combine.
//!
//! Shares travel from the dealer to members encrypted under the members'
//! transport keys (Baby Jubjub ECDH + ChaCha20-Poly1305).

use std::sync::Arc;

use ark_std::rand::{CryptoRng, Rng};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use umbra_config::CommitteeTomlConfig;
use umbra_primitives::{
    CryptoError, DomainHash, FIELD_BYTES, Keypair, Point, Scalar, field_to_bytes, mul_generator,
    random_scalar, scalar_from_bytes, scalar_to_bytes,
};

use crate::dleq::{DleqProof, generate_dleq_proof, verify_dleq_proof};
use crate::elgamal::{VoteCiphertext, combine_shares, compute_decryption_share};
use crate::shares::{
    Result, SecretShare, ShareIndex, ThresholdError, check_threshold, split_secret,
};

const SHARE_KEY_CONTEXT: &str = "umbra-threshold-share-v1";

/// Committee configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeConfig {
    /// Threshold K: minimum members needed to decrypt
    pub threshold: usize,
    /// Total members N
    pub total_members: usize,
    /// Epoch number (for key rotation)
    pub epoch: u64,
}

impl CommitteeConfig {
    pub fn new(threshold: usize, total_members: usize) -> Self {
        Self {
            threshold,
            total_members,
            epoch: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        check_threshold(self.threshold, self.total_members).is_ok()
    }
}

impl From<&CommitteeTomlConfig> for CommitteeConfig {
    fn from(toml: &CommitteeTomlConfig) -> Self {
        Self {
            threshold: toml.threshold_k,
            total_members: toml.threshold_n,
            epoch: toml.epoch,
        }
    }
}

/// Public view of a committee member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    /// Member index (1-indexed, equals the Shamir x-coordinate)
    pub index: ShareIndex,
    /// s_i·G, checked against every decryption share
    pub public_share: Point,
    /// Key that share deliveries are encrypted to
    pub transport_key: Point,
    /// Optional endpoint URL for decryption requests
    pub endpoint: Option<String>,
}

impl CommitteeMember {
    pub fn new(index: ShareIndex, public_share: Point, transport_key: Point) -> Self {
        Self {
            index,
            public_share,
            transport_key,
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self
    }
}

/// A member's contribution to decrypting one ciphertext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionShare {
    pub index: ShareIndex,
    /// s_i·c1
    pub share: Point,
    pub proof: DleqProof,
}

/// The decryption committee
#[derive(Debug, Clone)]
pub struct Committee {
    pub config: CommitteeConfig,
    pub members: Vec<CommitteeMember>,
    /// Tally public key s·G that voters encrypt to
    pub public_key: Point,
    hasher: Arc<DomainHash>,
}

impl Committee {
    pub fn new(
        hasher: Arc<DomainHash>,
        config: CommitteeConfig,
        members: Vec<CommitteeMember>,
        public_key: Point,
    ) -> Result<Self> {
        check_threshold(config.threshold, config.total_members)?;
        if members.len() != config.total_members {
            return Err(ThresholdError::InvalidThreshold {
                k: config.threshold,
                n: members.len(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for member in &members {
            if member.index == 0 {
                return Err(ThresholdError::InvalidIndex(0));
            }
            if !seen.insert(member.index) {
                return Err(ThresholdError::DuplicateIndex(member.index));
            }
        }

        Ok(Self {
            config,
            members,
            public_key,
            hasher,
        })
    }

    pub fn member(&self, index: ShareIndex) -> Option<&CommitteeMember> {
        self.members.iter().find(|m| m.index == index)
    }

    pub fn public_shares(&self) -> Vec<Point> {
        self.members.iter().map(|m| m.public_share).collect()
    }

    pub fn can_decrypt(&self, shares: &[DecryptionShare]) -> bool {
        shares.len() >= self.config.threshold
    }

    /// Check one share's DLEQ proof against the member's public share
    pub fn verify_share(&self, ciphertext: &VoteCiphertext, share: &DecryptionShare) -> Result<bool> {
        let member = self
            .member(share.index)
            .ok_or(ThresholdError::InvalidIndex(share.index))?;
        verify_dleq_proof(
            &self.hasher,
            &member.public_share,
            &ciphertext.c1,
            &share.share,
            &share.proof,
        )
    }

    /// Verify every share, then combine into m·G
    pub fn combine(&self, ciphertext: &VoteCiphertext, shares: &[DecryptionShare]) -> Result<Point> {
        for share in shares {
            if !self.verify_share(ciphertext, share)? {
                warn!(index = share.index, "rejecting decryption share with bad proof");
                return Err(ThresholdError::InvalidShareProof(share.index));
            }
        }
        let pairs: Vec<(ShareIndex, Point)> = shares.iter().map(|s| (s.index, s.share)).collect();
        combine_shares(ciphertext, &pairs, self.config.threshold)
    }
}

/// Committee member with its secret share (for a local member)
#[derive(Clone)]
pub struct LocalCommitteeMember {
    pub index: ShareIndex,
    secret_share: Option<Scalar>,
    transport: Keypair,
}

impl LocalCommitteeMember {
    /// Fresh member with a random transport key and no share yet
    pub fn generate(index: ShareIndex) -> Self {
        Self {
            index,
            secret_share: None,
            transport: Keypair::new_random(),
        }
    }

    pub fn from_share(share: SecretShare, transport: Keypair) -> Self {
        Self {
            index: share.index,
            secret_share: Some(share.value),
            transport,
        }
    }

    pub fn transport_key(&self) -> &Point {
        self.transport.public()
    }

    pub fn has_share(&self) -> bool {
        self.secret_share.is_some()
    }

    /// s_i·G, once the share is known
    pub fn public_share(&self) -> Option<Point> {
        self.secret_share.as_ref().map(mul_generator)
    }

    pub fn to_member(&self) -> Option<CommitteeMember> {
        Some(CommitteeMember::new(
            self.index,
            self.public_share()?,
            *self.transport.public(),
        ))
    }

    /// Decrypt and keep a share delivered by the dealer
    pub fn receive_share(&mut self, encrypted: &EncryptedShare) -> Result<()> {
        let share = self.decrypt_share(encrypted)?;
        self.secret_share = Some(share.value);
        Ok(())
    }

    pub fn decrypt_share(&self, encrypted: &EncryptedShare) -> Result<SecretShare> {
        if encrypted.member_index != self.index {
            return Err(ThresholdError::InvalidIndex(encrypted.member_index));
        }
        let shared = encrypted.ephemeral_pubkey.mul(self.transport.secret());
        let key = derive_share_key(&shared, &encrypted.ephemeral_pubkey);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&encrypted.nonce), encrypted.ciphertext.as_slice())
            .map_err(|_| ThresholdError::DecryptionFailed)?;

        let bytes: [u8; FIELD_BYTES] = plaintext
            .as_slice()
            .try_into()
            .map_err(|_| ThresholdError::DecryptionFailed)?;
        Ok(SecretShare::new(self.index, scalar_from_bytes(&bytes)?))
    }

    /// s_i·c1 with its proof
    pub fn decryption_share(
        &self,
        hasher: &DomainHash,
        ciphertext: &VoteCiphertext,
    ) -> Result<DecryptionShare> {
        self.decryption_share_with_rng(hasher, ciphertext, &mut OsRng)
    }

    pub fn decryption_share_with_rng<R: Rng + CryptoRng>(
        &self,
        hasher: &DomainHash,
        ciphertext: &VoteCiphertext,
        rng: &mut R,
    ) -> Result<DecryptionShare> {
        let secret = self
            .secret_share
            .ok_or(ThresholdError::InvalidIndex(self.index))?;
        Ok(DecryptionShare {
            index: self.index,
            share: compute_decryption_share(ciphertext, &secret),
            proof: generate_dleq_proof(hasher, &secret, &ciphertext.c1, rng)?,
        })
    }
}

impl std::fmt::Debug for LocalCommitteeMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCommitteeMember")
            .field("index", &self.index)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// An encrypted share for a committee member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedShare {
    pub member_index: ShareIndex,
    pub ephemeral_pubkey: Point,
    pub nonce: [u8; 12],
    /// Encrypted share value + tag
    pub ciphertext: Vec<u8>,
}

impl EncryptedShare {
    /// Encrypt a share for a specific member
    pub fn encrypt<R: Rng + CryptoRng>(
        share: &SecretShare,
        transport_key: &Point,
        rng: &mut R,
    ) -> Result<Self> {
        if transport_key.is_identity() {
            return Err(CryptoError::InvalidPoint("identity is not a valid transport key").into());
        }
        let ephemeral = random_scalar(rng);
        let ephemeral_pubkey = mul_generator(&ephemeral);
        let shared = transport_key.mul(&ephemeral);
        let key = derive_share_key(&shared, &ephemeral_pubkey);

        let mut nonce = [0u8; 12];
        rng.fill_bytes(&mut nonce);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), scalar_to_bytes(&share.value).as_slice())
            .map_err(|_| ThresholdError::EncryptionFailed)?;

        Ok(Self {
            member_index: share.index,
            ephemeral_pubkey,
            nonce,
            ciphertext,
        })
    }
}

/// Trusted-dealer setup: split `master_secret`, publish the committee, and
/// encrypt each share to the member with the same (1-based) position in
/// `transport_keys`.
pub fn deal<R: Rng + CryptoRng>(
    hasher: Arc<DomainHash>,
    config: CommitteeConfig,
    master_secret: &Scalar,
    transport_keys: &[Point],
    rng: &mut R,
) -> Result<(Committee, Vec<EncryptedShare>)> {
    if transport_keys.len() != config.total_members {
        return Err(ThresholdError::InvalidThreshold {
            k: config.threshold,
            n: transport_keys.len(),
        });
    }
    let shares = split_secret(master_secret, config.threshold, config.total_members, rng)?;

    let mut members = Vec::with_capacity(shares.len());
    let mut deliveries = Vec::with_capacity(shares.len());
    for (share, transport_key) in shares.iter().zip(transport_keys) {
        members.push(CommitteeMember::new(
            share.index,
            mul_generator(&share.value),
            *transport_key,
        ));
        deliveries.push(EncryptedShare::encrypt(share, transport_key, rng)?);
    }
    debug!(
        threshold = config.threshold,
        members = members.len(),
        epoch = config.epoch,
        "dealt committee shares"
    );

    let committee = Committee::new(hasher, config, members, mul_generator(master_secret))?;
    Ok((committee, deliveries))
}

/// Derive encryption key for share transport
fn derive_share_key(shared: &Point, ephemeral_pubkey: &Point) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(SHARE_KEY_CONTEXT);
    hasher.update(&field_to_bytes(&shared.x()));
    hasher.update(&ephemeral_pubkey.to_bytes());
    *hasher.finalize().as_bytes()
}
