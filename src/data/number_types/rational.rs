//! # An arbitrary precision rational type
//!
//! Wrapping the `num::BigRational` type, following the newtype pattern. This is needed because
//! some of the impl's in this module are not provided by `num`. Methods on this type can be
//! modified and specialized as needed.
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use num::{BigInt, BigRational};
use num_traits::{One, Signed, Zero};

/// An arbitrary precision rational that relies on the methods of `num::BigRational`.
#[derive(
    Clone,
    Ord, PartialOrd, Eq, PartialEq,
    Debug,
)]
pub struct Rational(BigRational);

impl Rational {
    /// Create a new instance by converting the two provided numbers into arbitrary size ints.
    ///
    /// The denominator should not be zero.
    pub fn new(numer: i64, denom: i64) -> Self {
        debug_assert_ne!(denom, 0);

        Self(BigRational::new(numer.into(), denom.into()))
    }

    /// Wrap an integer.
    pub fn from_integer(value: i64) -> Self {
        Self(BigRational::from_integer(value.into()))
    }

    /// Largest integer smaller than or equal to this value.
    pub fn floor(&self) -> Self {
        Self(self.0.floor())
    }

    /// Smallest integer larger than or equal to this value.
    pub fn ceil(&self) -> Self {
        Self(self.0.ceil())
    }

    /// Whether the denominator of the reduced form is one.
    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    /// Sign of this value as an integer in `{-1, 0, 1}`.
    pub fn signum(&self) -> i8 {
        if self.0.is_zero() {
            0
        } else if self.0.is_negative() {
            -1
        } else {
            1
        }
    }

    /// Whether this value is strictly smaller than zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Whether this value is strictly larger than zero.
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Bring the fraction into lowest terms.
    ///
    /// Values built through arithmetic on this type are always reduced; this method exists for
    /// values assembled from raw parts and is idempotent.
    pub fn reduce(&mut self) {
        let (numer, denom): (BigInt, BigInt) = std::mem::replace(&mut self.0, BigRational::zero()).into();
        self.0 = BigRational::new(numer, denom);
    }
}

/// Errors when a token could not be interpreted as a rational number.
///
/// The token is carried along for error messages.
#[derive(Debug, Eq, PartialEq)]
pub struct ParseRationalError {
    token: String,
}

impl fmt::Display for ParseRationalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "could not parse \"{}\" as a rational number", self.token)
    }
}

impl FromStr for Rational {
    type Err = ParseRationalError;

    /// Read a value from a string slice.
    ///
    /// Accepted forms are integer literals and `a/b` fractions with a nonzero denominator. The
    /// resulting value is in lowest terms.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let error = || ParseRationalError { token: input.to_string() };

        match input.split_once('/') {
            None => {
                let numer = BigInt::from_str(input).map_err(|_| error())?;
                Ok(Self(BigRational::from_integer(numer)))
            }
            Some((numer, denom)) => {
                let numer = BigInt::from_str(numer).map_err(|_| error())?;
                let denom = BigInt::from_str(denom).map_err(|_| error())?;
                if denom.is_zero() {
                    return Err(error());
                }
                Ok(Self(BigRational::new(numer, denom)))
            }
        }
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Self(BigRational::zero())
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Rational {
    fn one() -> Self {
        Self(BigRational::one())
    }
}

impl Neg for Rational {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Self::Output {
        Rational(-&self.0)
    }
}

impl Add for Rational {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Add<&Rational> for Rational {
    type Output = Self;

    fn add(self, rhs: &Rational) -> Self::Output {
        Self(self.0 + &rhs.0)
    }
}

impl Add for &Rational {
    type Output = Rational;

    fn add(self, rhs: Self) -> Self::Output {
        Rational(&self.0 + &rhs.0)
    }
}

impl AddAssign for Rational {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl AddAssign<&Rational> for Rational {
    fn add_assign(&mut self, rhs: &Rational) {
        self.0 += &rhs.0;
    }
}

impl Sub for Rational {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sub<&Rational> for Rational {
    type Output = Self;

    fn sub(self, rhs: &Rational) -> Self::Output {
        Self(self.0 - &rhs.0)
    }
}

impl Sub for &Rational {
    type Output = Rational;

    fn sub(self, rhs: Self) -> Self::Output {
        Rational(&self.0 - &rhs.0)
    }
}

impl SubAssign for Rational {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl SubAssign<&Rational> for Rational {
    fn sub_assign(&mut self, rhs: &Rational) {
        self.0 -= &rhs.0;
    }
}

impl Mul for Rational {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl Mul<&Rational> for Rational {
    type Output = Self;

    fn mul(self, rhs: &Rational) -> Self::Output {
        Self(self.0 * &rhs.0)
    }
}

impl Mul for &Rational {
    type Output = Rational;

    fn mul(self, rhs: Self) -> Self::Output {
        Rational(&self.0 * &rhs.0)
    }
}

impl MulAssign<&Rational> for Rational {
    fn mul_assign(&mut self, rhs: &Rational) {
        self.0 *= &rhs.0;
    }
}

impl Div for Rational {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        debug_assert!(!rhs.0.is_zero());

        Self(self.0 / rhs.0)
    }
}

impl Div<&Rational> for Rational {
    type Output = Self;

    fn div(self, rhs: &Rational) -> Self::Output {
        debug_assert!(!rhs.0.is_zero());

        Self(self.0 / &rhs.0)
    }
}

impl Div for &Rational {
    type Output = Rational;

    fn div(self, rhs: Self) -> Self::Output {
        debug_assert!(!rhs.0.is_zero());

        Rational(&self.0 / &rhs.0)
    }
}

/// Shorthand for creating a rational number in tests.
#[macro_export]
macro_rules! R {
    ($value:expr) => {
        $crate::data::number_types::Rational::from_integer($value)
    };
    ($numer:expr, $denom:expr) => {
        $crate::data::number_types::Rational::new($numer, $denom)
    };
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use num_traits::Zero;

    use crate::data::number_types::Rational;

    #[test]
    fn field_identities() {
        assert_eq!(R!(0) + R!(0), R!(0));
        assert_eq!(R!(2, 4), R!(1, 2));
        assert_eq!(R!(1, 2) + R!(1, 3), R!(5, 6));
        assert_eq!(R!(1, 2) * R!(2, 3), R!(1, 3));
        assert_eq!(R!(3, 2) - R!(1, 2), R!(1));
        assert_eq!(R!(1, 2) / R!(1, 4), R!(2));
        assert_eq!(-R!(1, -2), R!(1, 2));
    }

    #[test]
    fn rounding() {
        assert_eq!(R!(5, 2).floor(), R!(2));
        assert_eq!(R!(5, 2).ceil(), R!(3));
        assert_eq!(R!(-5, 2).floor(), R!(-3));
        assert_eq!(R!(-5, 2).ceil(), R!(-2));
        assert_eq!(R!(4).floor(), R!(4));
        assert_eq!(R!(4).ceil(), R!(4));
    }

    #[test]
    fn integrality_and_sign() {
        assert!(R!(4).is_integer());
        assert!(!R!(1, 2).is_integer());
        assert_eq!(R!(-7).signum(), -1);
        assert_eq!(R!(0).signum(), 0);
        assert_eq!(R!(3, 5).signum(), 1);
    }

    #[test]
    fn parsing() {
        assert_eq!(Rational::from_str("3"), Ok(R!(3)));
        assert_eq!(Rational::from_str("-3/6"), Ok(R!(-1, 2)));
        assert_eq!(Rational::from_str("22/7"), Ok(R!(22, 7)));
        assert!(Rational::from_str("1/0").is_err());
        assert!(Rational::from_str("one").is_err());
        assert!(Rational::from_str("1.5").is_err());
    }

    #[test]
    fn display() {
        assert_eq!(R!(3).to_string(), "3");
        assert_eq!(R!(-4, 6).to_string(), "-2/3");
        assert_eq!(Rational::zero().to_string(), "0");
    }

    #[test]
    fn reduction_is_idempotent() {
        let mut value = R!(3, 9);
        value.reduce();
        assert_eq!(value, R!(1, 3));
        value.reduce();
        assert_eq!(value, R!(1, 3));
    }
}
