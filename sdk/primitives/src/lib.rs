//! Umbra Primitives
//!
//! Arithmetic and hashing shared by every other Umbra crate.
//!
//! ```text
//!   FieldElement (mod P) ──┬──▶ DomainHash  (Poseidon, domain-tagged)
//!                          └──▶ Point       (Baby Jubjub, order-N subgroup)
//!   Scalar (mod N) ─────────────▶ k·P, private keys, blinding factors
//! ```

pub mod curve;
pub mod error;
pub mod field;
pub mod hash;
pub mod keypair;

pub use curve::{POINT_BYTES, Point, mul_generator};
pub use error::{CryptoError, Result};
pub use field::{
    FIELD_BYTES, FieldElement, Scalar, field_from_bytes, field_from_bytes_mod_order,
    field_from_scalar, field_to_bytes, random_field_element, random_scalar, scalar_from_bytes,
    scalar_from_bytes_mod_order, scalar_from_field, scalar_to_bytes,
};
pub use hash::{DomainHash, DomainTag};
pub use keypair::Keypair;
