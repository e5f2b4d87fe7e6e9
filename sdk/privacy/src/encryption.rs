//! Note Encryption
//!
//! ECIES-style encryption of a note plaintext to a recipient's Baby Jubjub key.
//!
//! ```text
//! Flow:
//! 1. Sender samples an ephemeral scalar e, epk = e·G
//! 2. Shared secret = e·recipient_pk (recipient: sk·epk)
//! 3. Symmetric key derived from shared.x
//! 4. body, tag = suite(key, nonce, plaintext)
//! 5. Output = (epk, nonce ‖ body, tag)
//!
//! Wire form:
//!   epk.x[32] ‖ epk.y[32] ‖ ct_len[4 LE] ‖ nonce[12] ‖ body ‖ tag[16]
//! ```
//!
//! Suites:
//! - `ChaCha20Poly1305`: key = BLAKE3 derive_key("umbra-note-v1", shared.x ‖ epk),
//!   epk bound as associated data.
//! - `HashKeystream`: SHA-256 counter keystream with a truncated SHA-256 tag.
//!   Kept to read ciphertexts produced by older deployments.

use std::str::FromStr;

use ark_std::rand::{CryptoRng, Rng};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use umbra_config::CipherSuiteToml;
use umbra_primitives::{
    CryptoError, FIELD_BYTES, POINT_BYTES, Point, Scalar, field_to_bytes, mul_generator,
    random_scalar,
};

use crate::error::{NoteError, Result};
use crate::note::{NOTE_PLAINTEXT_SIZE, Note};

pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

const LENGTH_PREFIX_SIZE: usize = 4;
const HEADER_SIZE: usize = POINT_BYTES + LENGTH_PREFIX_SIZE;

const CHACHA_KEY_CONTEXT: &str = "umbra-note-v1";
const KEYSTREAM_KEY_LABEL: &[u8] = b"umbra-note-keystream-v1";

/// Symmetric construction used under the ECDH key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherSuite {
    #[default]
    ChaCha20Poly1305,
    HashKeystream,
}

impl From<CipherSuiteToml> for CipherSuite {
    fn from(suite: CipherSuiteToml) -> Self {
        match suite {
            CipherSuiteToml::ChaCha20Poly1305 => CipherSuite::ChaCha20Poly1305,
            CipherSuiteToml::HashKeystream => CipherSuite::HashKeystream,
        }
    }
}

impl FromStr for CipherSuite {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<CipherSuiteToml>().map(Into::into)
    }
}

/// An encrypted note as published alongside its commitment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedNote {
    pub ephemeral_pubkey: Point,
    /// nonce ‖ body
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
}

impl EncryptedNote {
    /// Bytes on the wire besides the body
    pub const OVERHEAD: usize = HEADER_SIZE + NONCE_SIZE + TAG_SIZE;

    pub fn nonce(&self) -> Result<[u8; NONCE_SIZE]> {
        let nonce = self
            .ciphertext
            .get(..NONCE_SIZE)
            .ok_or(NoteError::MalformedCiphertext("ciphertext shorter than nonce"))?;
        let mut out = [0u8; NONCE_SIZE];
        out.copy_from_slice(nonce);
        Ok(out)
    }

    pub fn body(&self) -> &[u8] {
        self.ciphertext.get(NONCE_SIZE..).unwrap_or_default()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.ciphertext.len() + TAG_SIZE);
        out.extend_from_slice(&self.ephemeral_pubkey.to_bytes());
        out.extend_from_slice(&(self.ciphertext.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Parse the wire form. The ephemeral key must be a subgroup point and the
    /// length prefix must account for every remaining byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::OVERHEAD {
            return Err(NoteError::MalformedCiphertext("truncated"));
        }
        let mut epk = [0u8; POINT_BYTES];
        epk.copy_from_slice(&bytes[..POINT_BYTES]);
        let ephemeral_pubkey = Point::from_bytes(&epk)?;

        let mut len = [0u8; LENGTH_PREFIX_SIZE];
        len.copy_from_slice(&bytes[POINT_BYTES..HEADER_SIZE]);
        let ct_len = u32::from_le_bytes(len) as usize;

        if ct_len < NONCE_SIZE {
            return Err(NoteError::MalformedCiphertext("ciphertext shorter than nonce"));
        }
        if bytes.len() - HEADER_SIZE - TAG_SIZE != ct_len {
            return Err(NoteError::MalformedCiphertext("length prefix mismatch"));
        }

        let ct_end = HEADER_SIZE + ct_len;
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&bytes[ct_end..]);

        Ok(Self {
            ephemeral_pubkey,
            ciphertext: bytes[HEADER_SIZE..ct_end].to_vec(),
            tag,
        })
    }
}

/// Note encryption under a fixed suite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoteCipher {
    suite: CipherSuite,
}

impl NoteCipher {
    pub fn new(suite: CipherSuite) -> Self {
        Self { suite }
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    pub fn encrypt(&self, note: &Note, recipient_pubkey: &Point) -> Result<EncryptedNote> {
        self.encrypt_with_rng(note, recipient_pubkey, &mut OsRng)
    }

    pub fn encrypt_with_rng<R: Rng + CryptoRng>(
        &self,
        note: &Note,
        recipient_pubkey: &Point,
        rng: &mut R,
    ) -> Result<EncryptedNote> {
        if recipient_pubkey.is_identity() {
            return Err(CryptoError::InvalidPoint("identity is not a valid recipient key").into());
        }
        let ephemeral = random_scalar(rng);
        let ephemeral_pubkey = mul_generator(&ephemeral);
        let shared = recipient_pubkey.mul(&ephemeral);

        let mut nonce = [0u8; NONCE_SIZE];
        rng.fill_bytes(&mut nonce);

        let mut body = note.to_bytes().to_vec();
        let tag = match self.suite {
            CipherSuite::ChaCha20Poly1305 => {
                let key = chacha_key(&shared, &ephemeral_pubkey);
                let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
                let tag = cipher
                    .encrypt_in_place_detached(
                        Nonce::from_slice(&nonce),
                        &ephemeral_pubkey.to_bytes(),
                        &mut body,
                    )
                    .map_err(|_| NoteError::EncryptionFailed)?;
                let mut out = [0u8; TAG_SIZE];
                out.copy_from_slice(tag.as_slice());
                out
            }
            CipherSuite::HashKeystream => {
                let key = keystream_key(&shared);
                apply_keystream(&key, &nonce, &mut body);
                keystream_tag(&key, &nonce, &body)
            }
        };

        let mut ciphertext = Vec::with_capacity(NONCE_SIZE + body.len());
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&body);

        Ok(EncryptedNote {
            ephemeral_pubkey,
            ciphertext,
            tag,
        })
    }

    /// Authenticate, then decrypt and parse. Fails on any tag mismatch.
    pub fn decrypt(&self, encrypted: &EncryptedNote, recipient_private_key: &Scalar) -> Result<Note> {
        if encrypted.ephemeral_pubkey.is_identity() {
            return Err(NoteError::MalformedCiphertext("identity ephemeral key"));
        }
        let nonce = encrypted.nonce()?;
        let shared = encrypted.ephemeral_pubkey.mul(recipient_private_key);
        let mut body = encrypted.body().to_vec();

        match self.suite {
            CipherSuite::ChaCha20Poly1305 => {
                let key = chacha_key(&shared, &encrypted.ephemeral_pubkey);
                let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
                cipher
                    .decrypt_in_place_detached(
                        Nonce::from_slice(&nonce),
                        &encrypted.ephemeral_pubkey.to_bytes(),
                        &mut body,
                        Tag::from_slice(&encrypted.tag),
                    )
                    .map_err(|_| NoteError::AuthenticationFailed)?;
            }
            CipherSuite::HashKeystream => {
                let key = keystream_key(&shared);
                let expected = keystream_tag(&key, &nonce, &body);
                if !bool::from(expected[..].ct_eq(&encrypted.tag[..])) {
                    return Err(NoteError::AuthenticationFailed);
                }
                apply_keystream(&key, &nonce, &mut body);
            }
        }

        if body.len() != NOTE_PLAINTEXT_SIZE {
            return Err(NoteError::InvalidPlaintext);
        }
        Note::from_bytes(&body)
    }

    /// Scan-mode decryption: any failure means "not ours"
    pub fn try_decrypt(&self, encrypted: &EncryptedNote, recipient_private_key: &Scalar) -> Option<Note> {
        self.decrypt(encrypted, recipient_private_key).ok()
    }
}

/// Encrypt with the default suite
pub fn encrypt_note(note: &Note, recipient_pubkey: &Point) -> Result<EncryptedNote> {
    NoteCipher::default().encrypt(note, recipient_pubkey)
}

pub fn decrypt_note(encrypted: &EncryptedNote, recipient_private_key: &Scalar) -> Result<Note> {
    NoteCipher::default().decrypt(encrypted, recipient_private_key)
}

pub fn try_decrypt_note(encrypted: &EncryptedNote, recipient_private_key: &Scalar) -> Option<Note> {
    NoteCipher::default().try_decrypt(encrypted, recipient_private_key)
}

fn chacha_key(shared: &Point, ephemeral_pubkey: &Point) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(CHACHA_KEY_CONTEXT);
    hasher.update(&field_to_bytes(&shared.x()));
    hasher.update(&ephemeral_pubkey.to_bytes());
    *hasher.finalize().as_bytes()
}

fn keystream_key(shared: &Point) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(KEYSTREAM_KEY_LABEL);
    hasher.update(field_to_bytes(&shared.x()));
    hasher.finalize().into()
}

// block 0 = SHA256(key ‖ nonce), block i = SHA256(key ‖ nonce ‖ u16_be(i))
fn apply_keystream(key: &[u8; 32], nonce: &[u8; NONCE_SIZE], data: &mut [u8]) {
    for (i, chunk) in data.chunks_mut(FIELD_BYTES).enumerate() {
        let mut hasher = Sha256::new();
        hasher.update(key);
        hasher.update(nonce);
        if i > 0 {
            hasher.update((i as u16).to_be_bytes());
        }
        let block = hasher.finalize();
        for (byte, k) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= k;
        }
    }
}

fn keystream_tag(key: &[u8; 32], nonce: &[u8; NONCE_SIZE], body: &[u8]) -> [u8; TAG_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(nonce);
    hasher.update(body);
    let digest = hasher.finalize();
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&digest[..TAG_SIZE]);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_primitives::{FieldElement, Keypair};

    const SUITES: [CipherSuite; 2] = [CipherSuite::ChaCha20Poly1305, CipherSuite::HashKeystream];

    fn sample_note() -> Note {
        Note::random(FieldElement::from(1234u64), [3u8; 32], 1_000_000)
    }

    #[test]
    fn test_roundtrip_both_suites() {
        let recipient = Keypair::new_random();
        let note = sample_note();

        for suite in SUITES {
            let cipher = NoteCipher::new(suite);
            let encrypted = cipher.encrypt(&note, recipient.public()).unwrap();
            assert_eq!(encrypted.body().len(), NOTE_PLAINTEXT_SIZE);
            assert_eq!(cipher.decrypt(&encrypted, recipient.secret()).unwrap(), note);
        }
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let recipient = Keypair::new_random();
        let stranger = Keypair::new_random();
        let note = sample_note();

        for suite in SUITES {
            let cipher = NoteCipher::new(suite);
            let encrypted = cipher.encrypt(&note, recipient.public()).unwrap();
            assert_eq!(
                cipher.decrypt(&encrypted, stranger.secret()),
                Err(NoteError::AuthenticationFailed)
            );
            assert!(cipher.try_decrypt(&encrypted, stranger.secret()).is_none());
        }
    }

    #[test]
    fn test_tampering_detected() {
        let recipient = Keypair::new_random();
        let note = sample_note();

        for suite in SUITES {
            let cipher = NoteCipher::new(suite);
            let encrypted = cipher.encrypt(&note, recipient.public()).unwrap();

            let mut body_flip = encrypted.clone();
            body_flip.ciphertext[NONCE_SIZE + 5] ^= 0x01;
            assert_eq!(
                cipher.decrypt(&body_flip, recipient.secret()),
                Err(NoteError::AuthenticationFailed)
            );

            let mut nonce_flip = encrypted.clone();
            nonce_flip.ciphertext[0] ^= 0x80;
            assert!(cipher.try_decrypt(&nonce_flip, recipient.secret()).is_none());

            let mut tag_flip = encrypted.clone();
            tag_flip.tag[15] ^= 0x01;
            assert!(cipher.try_decrypt(&tag_flip, recipient.secret()).is_none());
        }
    }

    #[test]
    fn test_identity_keys_rejected() {
        let note = sample_note();
        for suite in SUITES {
            let cipher = NoteCipher::new(suite);
            assert_eq!(
                cipher.encrypt(&note, &Point::identity()),
                Err(NoteError::Crypto(CryptoError::InvalidPoint(
                    "identity is not a valid recipient key"
                )))
            );

            let recipient = Keypair::new_random();
            let mut encrypted = cipher.encrypt(&note, recipient.public()).unwrap();
            encrypted.ephemeral_pubkey = Point::identity();
            assert_eq!(
                cipher.decrypt(&encrypted, recipient.secret()),
                Err(NoteError::MalformedCiphertext("identity ephemeral key"))
            );
        }
    }

    #[test]
    fn test_suites_are_not_interchangeable() {
        let recipient = Keypair::new_random();
        let encrypted = NoteCipher::new(CipherSuite::ChaCha20Poly1305)
            .encrypt(&sample_note(), recipient.public())
            .unwrap();
        assert!(
            NoteCipher::new(CipherSuite::HashKeystream)
                .try_decrypt(&encrypted, recipient.secret())
                .is_none()
        );
    }

    #[test]
    fn test_wire_layout() {
        let recipient = Keypair::new_random();
        let encrypted = encrypt_note(&sample_note(), recipient.public()).unwrap();
        let wire = encrypted.to_bytes();

        assert_eq!(wire.len(), EncryptedNote::OVERHEAD + NOTE_PLAINTEXT_SIZE);
        assert_eq!(&wire[..POINT_BYTES], &encrypted.ephemeral_pubkey.to_bytes());
        assert_eq!(
            &wire[POINT_BYTES..HEADER_SIZE],
            &((NONCE_SIZE + NOTE_PLAINTEXT_SIZE) as u32).to_le_bytes()
        );
        assert_eq!(&wire[wire.len() - TAG_SIZE..], &encrypted.tag);
        assert_eq!(EncryptedNote::from_bytes(&wire).unwrap(), encrypted);
    }

    #[test]
    fn test_from_bytes_rejects_malformed() {
        let recipient = Keypair::new_random();
        let wire = encrypt_note(&sample_note(), recipient.public()).unwrap().to_bytes();

        assert_eq!(
            EncryptedNote::from_bytes(&wire[..EncryptedNote::OVERHEAD - 1]),
            Err(NoteError::MalformedCiphertext("truncated"))
        );
        assert_eq!(
            EncryptedNote::from_bytes(&wire[..wire.len() - 1]),
            Err(NoteError::MalformedCiphertext("length prefix mismatch"))
        );

        let mut bad_point = wire.clone();
        bad_point[..POINT_BYTES].copy_from_slice(&[0u8; POINT_BYTES]);
        assert!(matches!(
            EncryptedNote::from_bytes(&bad_point),
            Err(NoteError::Crypto(_))
        ));
    }

    #[test]
    fn test_keystream_blocks_are_distinct() {
        let key = [1u8; 32];
        let nonce = [2u8; NONCE_SIZE];
        let mut zeros = [0u8; 64];
        apply_keystream(&key, &nonce, &mut zeros);
        assert_ne!(zeros[..32], zeros[32..]);

        let block0: [u8; 32] = Sha256::new().chain_update(key).chain_update(nonce).finalize().into();
        assert_eq!(zeros[..32], block0);
    }

    #[test]
    fn test_keystream_suite_byte_layout() {
        use rand::{SeedableRng, rngs::StdRng};

        let recipient = Keypair::from_secret(Scalar::from(0x5eedu64));
        let note = Note::with_randomness(
            FieldElement::from(1234u64),
            [3u8; 32],
            1_000_000,
            FieldElement::from(99u64),
        );
        let cipher = NoteCipher::new(CipherSuite::HashKeystream);

        let encrypted = cipher
            .encrypt_with_rng(&note, recipient.public(), &mut StdRng::seed_from_u64(7))
            .unwrap();
        let again = cipher
            .encrypt_with_rng(&note, recipient.public(), &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(encrypted, again);

        // Rebuild key, every keystream block and the tag from their definitions
        let shared = encrypted.ephemeral_pubkey.mul(recipient.secret());
        let key: [u8; 32] = Sha256::new()
            .chain_update(b"umbra-note-keystream-v1")
            .chain_update(field_to_bytes(&shared.x()))
            .finalize()
            .into();
        let nonce = encrypted.nonce().unwrap();

        let mut expected_body = Vec::with_capacity(NOTE_PLAINTEXT_SIZE);
        for (i, chunk) in note.to_bytes().chunks(32).enumerate() {
            let mut hasher = Sha256::new().chain_update(key).chain_update(nonce);
            if i > 0 {
                hasher.update((i as u16).to_be_bytes());
            }
            let block = hasher.finalize();
            expected_body.extend(chunk.iter().zip(block.iter()).map(|(p, k)| p ^ k));
        }
        // 104 bytes span blocks 0 through 3
        assert_eq!(expected_body.len(), NOTE_PLAINTEXT_SIZE);
        assert_eq!(encrypted.body(), &expected_body[..]);

        let digest = Sha256::new()
            .chain_update(key)
            .chain_update(nonce)
            .chain_update(&expected_body)
            .finalize();
        assert_eq!(encrypted.tag[..], digest[..TAG_SIZE]);
        assert_eq!(cipher.decrypt(&encrypted, recipient.secret()).unwrap(), note);
    }

    #[test]
    fn test_suite_from_str() {
        assert_eq!("chacha20poly1305".parse::<CipherSuite>(), Ok(CipherSuite::ChaCha20Poly1305));
        assert_eq!("hash-keystream".parse::<CipherSuite>(), Ok(CipherSuite::HashKeystream));
        assert!("aes".parse::<CipherSuite>().is_err());
    }
}
