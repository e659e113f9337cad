//! Fixed-arity coordinate vectors.
//!
//! [`Coordinates`] is the single numeric vector type used for node and port
//! positions, layout offsets and frame corners. It is immutable: every
//! operation returns a new value and arity is preserved by the type.

use std::{
    fmt,
    ops::{Add, Div, Index, Mul, Neg, Sub},
};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, SeqAccess, Visitor},
    ser::SerializeTuple,
};

/// An immutable `N`-dimensional vector, two-dimensional by default.
///
/// # Examples
///
/// ```
/// use plotlines_core::geometry::Coordinates;
///
/// let a = Coordinates::new(1.0, 3.0);
/// let b = Coordinates::new(4.0, 7.0);
/// assert_eq!((b - a).magnitude(), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates<const N: usize = 2>([f64; N]);

impl Coordinates<2> {
    /// Creates a two-dimensional vector.
    pub fn new(x: f64, y: f64) -> Self {
        Self([x, y])
    }

    /// Returns the first component.
    pub fn x(self) -> f64 {
        self.0[0]
    }

    /// Returns the second component.
    pub fn y(self) -> f64 {
        self.0[1]
    }
}

impl<const N: usize> Default for Coordinates<N> {
    fn default() -> Self {
        Self([0.0; N])
    }
}

impl<const N: usize> Coordinates<N> {
    /// Creates a vector from an array of components.
    pub const fn from_array(values: [f64; N]) -> Self {
        Self(values)
    }

    /// Returns the components as an array.
    pub fn to_array(self) -> [f64; N] {
        self.0
    }

    /// Iterates over the components in order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self(self.0.map(f))
    }

    fn zip_with(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let mut values = self.0;
        for (value, rhs) in values.iter_mut().zip(other.0) {
            *value = f(*value, rhs);
        }
        Self(values)
    }

    /// Euclidean length of the vector.
    pub fn magnitude(self) -> f64 {
        self.0.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Returns true when every component is zero.
    pub fn is_zero(self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    /// Unit vector in the same direction.
    ///
    /// A zero-magnitude vector is returned unchanged.
    pub fn unity(self) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return self;
        }
        self / magnitude
    }

    /// Dot product of two vectors.
    pub fn dot(self, other: Self) -> f64 {
        self.0.iter().zip(other.0).map(|(a, b)| a * b).sum()
    }

    /// Component-wise floor division by a scalar.
    pub fn floor_div(self, divisor: f64) -> Self {
        if divisor == 0.0 {
            return self;
        }
        self.map(|v| (v / divisor).floor())
    }

    /// Finds the normal intercept from `point` to the line through `origin`
    /// and `transit`.
    ///
    /// When `origin` and `transit` coincide the line has no direction and
    /// `origin` is returned. A point at either end of the line is its own
    /// intercept.
    ///
    /// # Examples
    ///
    /// ```
    /// use plotlines_core::geometry::Coordinates;
    ///
    /// let foot = Coordinates::intercept(
    ///     Coordinates::new(0.0, 0.0),
    ///     Coordinates::new(10.0, 0.0),
    ///     Coordinates::new(4.0, 3.0),
    /// );
    /// assert_eq!(foot, Coordinates::new(4.0, 0.0));
    /// ```
    pub fn intercept(origin: Self, transit: Self, point: Self) -> Self {
        let line = transit - origin;
        if line.is_zero() {
            return origin;
        }
        let t = (point - origin).dot(line) / line.dot(line);
        if t == 1.0 {
            return transit;
        }
        origin + line * t
    }
}

impl<const N: usize> Index<usize> for Coordinates<N> {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl<const N: usize> Add for Coordinates<N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<const N: usize> Sub for Coordinates<N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<const N: usize> Neg for Coordinates<N> {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|v| -v)
    }
}

impl<const N: usize> Mul<f64> for Coordinates<N> {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.map(|v| v * rhs)
    }
}

impl<const N: usize> Mul<Coordinates<N>> for f64 {
    type Output = Coordinates<N>;

    fn mul(self, rhs: Coordinates<N>) -> Coordinates<N> {
        rhs * self
    }
}

impl<const N: usize> Div<f64> for Coordinates<N> {
    type Output = Self;

    /// Division by zero leaves the vector unchanged.
    fn div(self, rhs: f64) -> Self {
        if rhs == 0.0 {
            return self;
        }
        self.map(|v| v / rhs)
    }
}

impl<const N: usize> From<[f64; N]> for Coordinates<N> {
    fn from(values: [f64; N]) -> Self {
        Self(values)
    }
}

impl From<(f64, f64)> for Coordinates<2> {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl<const N: usize> fmt::Display for Coordinates<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "< ")?;
        for (n, value) in self.0.iter().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, " >")
    }
}

impl<const N: usize> Serialize for Coordinates<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(N)?;
        for value in &self.0 {
            tuple.serialize_element(value)?;
        }
        tuple.end()
    }
}

impl<'de, const N: usize> Deserialize<'de> for Coordinates<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoordinatesVisitor<const N: usize>;

        impl<'de, const N: usize> Visitor<'de> for CoordinatesVisitor<N> {
            type Value = Coordinates<N>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a sequence of {N} numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = [0.0; N];
                for (n, value) in values.iter_mut().enumerate() {
                    *value = seq
                        .next_element::<f64>()?
                        .ok_or_else(|| de::Error::invalid_length(n, &self))?;
                }
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(N + 1, &self));
                }
                Ok(Coordinates(values))
            }
        }

        deserializer.deserialize_tuple(N, CoordinatesVisitor::<N>)
    }
}

/// Width and height of a rendered footprint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f64,
    height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f64 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f64 {
        self.height
    }

    /// The larger of the two dimensions.
    pub fn max_side(self) -> f64 {
        self.width.max(self.height)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_arithmetic_preserves_arity() {
        let a = Coordinates::from_array([1.0, 2.0, 3.0]);
        let b = Coordinates::from_array([3.0, 2.0, 1.0]);
        assert_eq!((a + b).to_array(), [4.0, 4.0, 4.0]);
        assert_eq!((a - b).to_array(), [-2.0, 0.0, 2.0]);
        assert_eq!((a * 2.0).to_array(), [2.0, 4.0, 6.0]);
        assert_eq!((2.0 * a).to_array(), [2.0, 4.0, 6.0]);
        assert_eq!((a / 2.0).to_array(), [0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_floor_div() {
        let a = Coordinates::new(7.0, -7.0);
        assert_eq!(a.floor_div(2.0), Coordinates::new(3.0, -4.0));
        assert_eq!(a.floor_div(0.0), a);
    }

    #[test]
    fn test_magnitude() {
        assert_eq!(Coordinates::new(3.0, 4.0).magnitude(), 5.0);
        assert_eq!(Coordinates::<2>::default().magnitude(), 0.0);
    }

    #[test]
    fn test_unity() {
        let unit = Coordinates::new(3.0, 4.0).unity();
        assert_approx_eq!(f64, unit.x(), 0.6);
        assert_approx_eq!(f64, unit.y(), 0.8);
        assert_approx_eq!(f64, unit.magnitude(), 1.0);
    }

    #[test]
    fn test_unity_of_zero_is_unchanged() {
        let zero = Coordinates::new(0.0, 0.0);
        assert_eq!(zero.unity(), zero);
        assert_eq!(zero / 0.0, zero);
    }

    #[test]
    fn test_dot() {
        let a = Coordinates::new(1.0, 2.0);
        let b = Coordinates::new(3.0, 4.0);
        assert_eq!(a.dot(b), 11.0);
    }

    #[test]
    fn test_intercept_on_diagonal() {
        let origin = Coordinates::new(1.0, 3.0);
        let transit = Coordinates::new(19.0, 12.0);
        let point = Coordinates::new(13.0, 4.0);
        let foot = Coordinates::intercept(origin, transit, point);

        // The foot lies on the line and the offset is perpendicular to it.
        let along = (foot - origin).unity().dot((transit - origin).unity());
        assert_approx_eq!(f64, along, 1.0, epsilon = 1e-9);
        assert_approx_eq!(f64, (point - foot).dot(transit - origin), 0.0, epsilon = 1e-9);
        assert_approx_eq!(f64, (point - foot).magnitude(), 4.472136, epsilon = 1e-6);
    }

    #[test]
    fn test_intercept_of_line_ends_is_exact() {
        let origin = Coordinates::new(1.0, 0.0);
        let transit = Coordinates::new(29.0, 68.7);
        assert_eq!(Coordinates::intercept(origin, transit, transit), transit);
        assert_eq!(Coordinates::intercept(origin, transit, origin), origin);
        assert_eq!(
            (Coordinates::intercept(origin, transit, transit) - transit).magnitude(),
            0.0
        );
    }

    #[test]
    fn test_intercept_degenerate_line() {
        let origin = Coordinates::new(2.0, 2.0);
        let point = Coordinates::new(5.0, 6.0);
        assert_eq!(Coordinates::intercept(origin, origin, point), origin);
    }

    #[test]
    fn test_display() {
        assert_eq!(Coordinates::new(1.5, 2.0).to_string(), "< 1.5, 2 >");
    }

    #[test]
    fn test_serde_as_array() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            pos: Coordinates,
        }

        let text = toml::to_string(&Holder {
            pos: Coordinates::new(1.5, 2.0),
        })
        .unwrap();
        assert_eq!(text.trim(), "pos = [1.5, 2.0]");

        let holder: Holder = toml::from_str("pos = [3, 4.25]").unwrap();
        assert_eq!(holder.pos, Coordinates::new(3.0, 4.25));

        assert!(toml::from_str::<Holder>("pos = [1.0]").is_err());
    }
}
