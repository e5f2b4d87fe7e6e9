//! Baby Jubjub
//!
//! Twisted Edwards curve defined over the BN254 scalar field:
//!
//! ```text
//! a·x² + y² = 1 + d·x²·y²      a = 168700, d = 168696
//! ```
//!
//! Only points of the prime-order subgroup (order N, see [`crate::field`]) are
//! representable: every public constructor checks both the curve equation and
//! N·P = O. The identity is (0, 1).
//!
//! Addition uses the complete twisted Edwards formulas (a is a square and d is
//! not), so there is no special-casing of doubling or the identity.

use ark_ff::{BigInteger, Field, MontFp, PrimeField};
use ark_std::{One, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{CryptoError, Result};
use crate::field::{FIELD_BYTES, FieldElement, Scalar, field_from_bytes, field_to_bytes, scalar_from_field};

/// Curve coefficient a
pub const COEFF_A: FieldElement = MontFp!("168700");

/// Curve coefficient d
pub const COEFF_D: FieldElement = MontFp!("168696");

/// Generator of the prime-order subgroup (circomlib `Base8`)
const GENERATOR_X: FieldElement =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
const GENERATOR_Y: FieldElement =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

/// Size of an uncompressed point encoding (x ‖ y)
pub const POINT_BYTES: usize = 2 * FIELD_BYTES;

/// Affine point of the prime-order subgroup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    x: FieldElement,
    y: FieldElement,
}

impl Point {
    /// The neutral element (0, 1)
    pub fn identity() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::one(),
        }
    }

    /// The subgroup generator G
    pub fn generator() -> Self {
        Self {
            x: GENERATOR_X,
            y: GENERATOR_Y,
        }
    }

    /// Build a point from coordinates, rejecting anything outside the subgroup
    pub fn new(x: FieldElement, y: FieldElement) -> Result<Self> {
        if !is_on_curve(&x, &y) {
            return Err(CryptoError::InvalidPoint("not on curve"));
        }
        let point = Self { x, y };
        if !point.is_in_subgroup() {
            return Err(CryptoError::InvalidPoint("not in prime-order subgroup"));
        }
        Ok(point)
    }

    /// Decode `x ‖ y`, each a canonical big-endian field element
    pub fn from_bytes(bytes: &[u8; POINT_BYTES]) -> Result<Self> {
        let (x_bytes, y_bytes) = bytes.split_at(FIELD_BYTES);
        let x = field_from_bytes(x_bytes.try_into().map_err(|_| CryptoError::InvalidFieldElement)?)?;
        let y = field_from_bytes(y_bytes.try_into().map_err(|_| CryptoError::InvalidFieldElement)?)?;
        Self::new(x, y)
    }

    pub fn to_bytes(&self) -> [u8; POINT_BYTES] {
        let mut out = [0u8; POINT_BYTES];
        out[..FIELD_BYTES].copy_from_slice(&field_to_bytes(&self.x));
        out[FIELD_BYTES..].copy_from_slice(&field_to_bytes(&self.y));
        out
    }

    pub fn x(&self) -> FieldElement {
        self.x
    }

    pub fn y(&self) -> FieldElement {
        self.y
    }

    pub fn is_identity(&self) -> bool {
        self.x.is_zero() && self.y.is_one()
    }

    pub fn is_on_curve(&self) -> bool {
        is_on_curve(&self.x, &self.y)
    }

    /// N·P == O
    pub fn is_in_subgroup(&self) -> bool {
        mul_bits(self, Scalar::MODULUS.to_bits_be().into_iter()).is_identity()
    }

    /// Complete twisted Edwards addition
    pub fn add(&self, other: &Point) -> Point {
        let x1x2 = self.x * other.x;
        let y1y2 = self.y * other.y;
        let dxy = COEFF_D * x1x2 * y1y2;

        let x_num = self.x * other.y + self.y * other.x;
        let y_num = y1y2 - COEFF_A * x1x2;

        // 1 ± d·x1x2y1y2 never vanishes on this curve since d is a non-square
        let x_den = (FieldElement::one() + dxy)
            .inverse()
            .expect("complete addition denominator is non-zero");
        let y_den = (FieldElement::one() - dxy)
            .inverse()
            .expect("complete addition denominator is non-zero");

        Point {
            x: x_num * x_den,
            y: y_num * y_den,
        }
    }

    pub fn double(&self) -> Point {
        self.add(self)
    }

    pub fn neg(&self) -> Point {
        Point {
            x: -self.x,
            y: self.y,
        }
    }

    pub fn sub(&self, other: &Point) -> Point {
        self.add(&other.neg())
    }

    /// Scalar multiplication. The scalar is already reduced mod N by type.
    pub fn mul(&self, scalar: &Scalar) -> Point {
        mul_bits(self, scalar.into_bigint().to_bits_be().into_iter())
    }

    /// Scalar multiplication by a base-field element, reduced mod N first
    pub fn mul_field(&self, k: &FieldElement) -> Point {
        self.mul(&scalar_from_field(k))
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::identity()
    }
}

// Serialized as the (x, y) pair of big-endian coordinates; decoding re-validates
impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        (field_to_bytes(&self.x), field_to_bytes(&self.y)).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let (x, y) = <([u8; FIELD_BYTES], [u8; FIELD_BYTES])>::deserialize(deserializer)?;
        let x = field_from_bytes(&x).map_err(de::Error::custom)?;
        let y = field_from_bytes(&y).map_err(de::Error::custom)?;
        Point::new(x, y).map_err(de::Error::custom)
    }
}

/// Check the curve equation for raw coordinates
pub fn is_on_curve(x: &FieldElement, y: &FieldElement) -> bool {
    let x2 = x.square();
    let y2 = y.square();
    COEFF_A * x2 + y2 == FieldElement::one() + COEFF_D * x2 * y2
}

/// k·G
pub fn mul_generator(scalar: &Scalar) -> Point {
    Point::generator().mul(scalar)
}

/// Projective (X : Y : Z) form used inside scalar multiplication so that the
/// ladder performs a single inversion at the end.
#[derive(Clone, Copy)]
struct Projective {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl Projective {
    fn identity() -> Self {
        Self {
            x: FieldElement::zero(),
            y: FieldElement::one(),
            z: FieldElement::one(),
        }
    }

    fn from_affine(p: &Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: FieldElement::one(),
        }
    }

    // add-2008-bbjlp, complete for this curve
    fn add(&self, other: &Projective) -> Projective {
        let a = self.z * other.z;
        let b = a.square();
        let c = self.x * other.x;
        let d = self.y * other.y;
        let e = COEFF_D * c * d;
        let f = b - e;
        let g = b + e;
        let x3 = a * f * ((self.x + self.y) * (other.x + other.y) - c - d);
        let y3 = a * g * (d - COEFF_A * c);
        let z3 = f * g;
        Projective {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// `if bit { other } else { self }` without branching on the bit
    fn select(&self, other: &Projective, bit: bool) -> Projective {
        let b = FieldElement::from(bit as u64);
        Projective {
            x: self.x + b * (other.x - self.x),
            y: self.y + b * (other.y - self.y),
            z: self.z + b * (other.z - self.z),
        }
    }

    fn to_affine(&self) -> Point {
        let z_inv = self
            .z
            .inverse()
            .expect("projective Z is non-zero under complete addition");
        Point {
            x: self.x * z_inv,
            y: self.y * z_inv,
        }
    }
}

/// Double-and-add over big-endian bits, performing the addition on every bit
fn mul_bits(base: &Point, bits: impl Iterator<Item = bool>) -> Point {
    let base = Projective::from_affine(base);
    let mut acc = Projective::identity();
    for bit in bits {
        acc = acc.add(&acc);
        let sum = acc.add(&base);
        acc = acc.select(&sum, bit);
    }
    acc.to_affine()
}
