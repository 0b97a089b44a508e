//! Fixed-point math utilities for deterministic simulation.
//!
//! All game simulation uses fixed-point arithmetic to ensure
//! deterministic behavior across platforms. Floating-point values only
//! appear at the host boundary (frame timestamps, data records, the
//! render view) and are converted here.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for optional fixed-point numbers.
pub mod option_fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an optional fixed-point number.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_some(&v.to_bits()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<i64>::deserialize(deserializer)?;
        Ok(opt.map(Fixed::from_bits))
    }
}

/// Convert a host-side `f64` into simulation fixed-point, saturating at the
/// representable range. NaN maps to zero.
#[must_use]
pub fn fixed_from_f64(value: f64) -> Fixed {
    if value.is_nan() {
        return Fixed::ZERO;
    }
    Fixed::saturating_from_num(value)
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Build a vector from host-side floating point coordinates.
    #[must_use]
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(fixed_from_f64(x), fixed_from_f64(y))
    }

    /// Build a vector from integer coordinates.
    #[must_use]
    pub fn from_int(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Lossy conversion for presentation layers.
    #[must_use]
    pub fn to_f32(self) -> (f32, f32) {
        (self.x.to_num(), self.y.to_num())
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    ///
    /// Saturates instead of overflowing for very distant points.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance between two points.
    ///
    /// Computed on the raw bit representation with an exact integer square
    /// root, so the result is the floor of the true distance at full
    /// fixed-point precision (a 3-4-5 triangle yields exactly 5).
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        let dx = (i128::from(self.x.to_bits()) - i128::from(other.x.to_bits())).unsigned_abs();
        let dy = (i128::from(self.y.to_bits()) - i128::from(other.y.to_bits())).unsigned_abs();
        let sum = dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy));
        let root = isqrt_u128(sum);
        Fixed::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        self.distance(Self::ZERO)
    }

    /// Scale both components by a scalar, saturating.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }

    /// Normalize vector using fixed-point math.
    ///
    /// Returns the zero vector for zero-length input.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Heading of this vector in radians, `atan2(y, x)`.
    ///
    /// Presentation helper; never feeds back into the simulation.
    #[must_use]
    pub fn angle_radians(self) -> f32 {
        let (x, y) = self.to_f32();
        y.atan2(x)
    }
}

/// Square root of a non-negative fixed-point number.
///
/// Exact to the last fractional bit (floor of the true root).
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let bits = value.to_bits().unsigned_abs() as u128;
    let root = isqrt_u128(bits << 32);
    Fixed::from_bits(i64::try_from(root).unwrap_or(i64::MAX))
}

/// Integer square root (floor) using Newton's method.
fn isqrt_u128(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    // Initial guess is a power of two at or above the true root.
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << ((bits + 1) / 2);

    loop {
        let y = (x + n / x) >> 1;
        if y >= x {
            return x;
        }
        x = y;
    }
}

// Vector arithmetic saturates at the edge of the representable plane.
impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_int(3, 0);
        let b = Vec2Fixed::from_int(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_distance_is_exact_for_pythagorean_triples() {
        let a = Vec2Fixed::from_int(0, 0);
        assert_eq!(a.distance(Vec2Fixed::from_int(3, 4)), Fixed::from_num(5));
        assert_eq!(a.distance(Vec2Fixed::from_int(300, 0)), Fixed::from_num(300));
        assert_eq!(
            Vec2Fixed::from_int(-5, -12).distance(Vec2Fixed::ZERO),
            Fixed::from_num(13)
        );
    }

    #[test]
    fn test_distance_saturates_far_apart() {
        let a = Vec2Fixed::new(Fixed::MIN, Fixed::MIN);
        let b = Vec2Fixed::new(Fixed::MAX, Fixed::MAX);
        assert!(a.distance(b) > Fixed::from_num(1_000_000));
    }

    #[test]
    fn test_fixed_sqrt() {
        assert_eq!(fixed_sqrt(Fixed::from_num(90_000)), Fixed::from_num(300));
        assert_eq!(fixed_sqrt(Fixed::from_num(0.25)), Fixed::from_num(0.5));
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_vec2_arithmetic_saturates_at_the_edge() {
        let edge = Vec2Fixed::from_f64(2_147_483_600.0, -2_147_483_600.0);
        let offset = Vec2Fixed::from_int(100, 100);

        let sum = edge + offset;
        assert_eq!(sum.x, Fixed::MAX);
        assert_eq!(sum.y, Fixed::from_num(-2_147_483_500));

        let diff = edge - Vec2Fixed::from_int(-100, 100);
        assert_eq!(diff.x, Fixed::MAX);
        assert_eq!(diff.y, Fixed::MIN);

        assert_eq!(edge.scale(Fixed::from_num(2)).x, Fixed::MAX);
    }

    #[test]
    fn test_option_fixed_serde_keeps_bits() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Holder {
            #[serde(with = "option_fixed_serde", default)]
            value: Option<Fixed>,
        }

        for value in [None, Some(Fixed::from_num(1.25))] {
            let text = ron::to_string(&Holder { value }).unwrap();
            assert_eq!(ron::from_str::<Holder>(&text).unwrap(), Holder { value });
        }
    }

    #[test]
    fn test_vec2_normalize() {
        let norm = Vec2Fixed::from_int(300, 0).normalize();
        assert_eq!(norm, Vec2Fixed::from_int(1, 0));

        let norm = Vec2Fixed::from_int(3, 4).normalize();
        let one = Fixed::from_num(1);
        let epsilon = one / Fixed::from_num(10000);
        assert!((norm.length() - one).abs() < epsilon);

        assert_eq!(Vec2Fixed::ZERO.normalize(), Vec2Fixed::ZERO);
    }

    #[test]
    fn test_fixed_from_f64_saturates() {
        assert_eq!(fixed_from_f64(1e300), Fixed::MAX);
        assert_eq!(fixed_from_f64(f64::NAN), Fixed::ZERO);
        assert_eq!(fixed_from_f64(2.5), Fixed::from_num(2.5));
    }

    #[test]
    fn test_angle_radians() {
        let up = Vec2Fixed::from_int(0, 1);
        assert!((up.angle_radians() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
