//! Umbra Privacy SDK
//!
//! Note-based privacy primitives for shielded transfers and private voting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Shielded Output                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │   Stealth    │  │  Commitment  │  │    Encrypted Note     │  │
//! │  │   address    │  │  (leaf)      │  │    (for recipient)    │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                  │                      │
//!          ▼                  ▼                      ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Shielded Spend                           │
//! │   nullifier = H(nk, commitment, leaf_index)   Merkle path       │
//! │   witness ──▶ remote prover ──▶ proof bytes                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every hash goes through a shared [`umbra_primitives::DomainHash`], which
//! must be initialized before any function here is called.

pub mod commitment;
pub mod encryption;
pub mod error;
pub mod merkle;
pub mod note;
pub mod nullifier;
pub mod scan;
pub mod stealth;
pub mod witness;

pub use commitment::{Commitment, CommitmentScheme, compute_commitment, verify_commitment};
pub use encryption::{
    CipherSuite, EncryptedNote, NoteCipher, decrypt_note, encrypt_note, try_decrypt_note,
};
pub use error::{NoteError, Result};
pub use merkle::{MerkleHasher, MerklePath, PathVerifier, TREE_DEPTH, empty_leaf};
pub use note::{NOTE_PLAINTEXT_SIZE, Note, NoteValue, ShieldedKeyBundle, SpendingKey};
pub use nullifier::{
    IncomingViewingKey, Nullifier, NullifierKey, action_domain_from_bytes,
    derive_action_nullifier, derive_incoming_viewing_key, derive_nullifier_key,
    derive_spending_nullifier,
};
pub use scan::{NoteScanner, OwnedNote, ScanCandidate};
pub use stealth::{StealthAddress, StealthMetaAddress};
pub use witness::{
    MembershipOracle, MerklePathProvider, ProofBytes, RemoteProver, SpendError, SpendWitness,
    WitnessInputs, WitnessValue, prove_spend,
};
