//! Umbra Threshold Tally
//!
//! Encrypted voting with a K-of-N decryption committee.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Encrypted Tally Flow                       │
//! │                                                                  │
//! │  1. Voter                  2. Aggregator          3. Committee   │
//! │  ┌──────────┐             ┌──────────────┐       ┌────────────┐ │
//! │  │ ElGamal  │──ballots───▶│ Homomorphic  │──────▶│ s_i·c1 +   │ │
//! │  │ to s·G   │             │ sum per slot │ tally │ DLEQ proof │ │
//! │  └──────────┘             └──────────────┘       └────────────┘ │
//! │                                                        │        │
//! │                      4. Anyone: verify K proofs, Lagrange-      │
//! │                         combine, c2 - s·c1 = m·G                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages are scalars embedded as m·G. Decryption stops at the lifted point;
//! turning it back into a count is up to the caller.

pub mod committee;
pub mod dleq;
pub mod elgamal;
pub mod shares;

pub use committee::{
    Committee, CommitteeConfig, CommitteeMember, DecryptionShare, EncryptedShare,
    LocalCommitteeMember, deal,
};
pub use dleq::{DleqProof, PROOF_BYTES, generate_dleq_proof, verify_dleq_proof};
pub use elgamal::{
    CIPHERTEXT_BYTES, VoteCiphertext, combine_shares, compute_decryption_share,
    decrypt_with_secret, elgamal_encrypt, encrypt_ballot, tally,
};
pub use shares::{
    Result, SecretShare, ShareIndex, ThresholdError, check_threshold, lagrange_coefficient,
    reconstruct_secret, split_secret, validate_indices,
};
