use std::{fmt::Display, num::ParseIntError, str::FromStr};

use rand::Rng;
use thiserror::Error;

use crate::utils;

use super::{ArithmeticError, Field, Ring};

/// The field of rational numbers.
pub const Q: RationalField = RationalField;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct RationalField;

impl RationalField {
    pub fn new() -> RationalField {
        RationalField
    }
}

/// An exact fraction with 64-bit numerator and denominator.
///
/// Every value is normalized on construction: the denominator is strictly
/// positive, numerator and denominator are coprime, and zero is `0/1`.
/// Since the representation is unique, structural equality is numeric equality.
///
/// Intermediate products are formed in 128 bits. A result that does not
/// fit back into 64 bits is an [`ArithmeticError::ArithmeticOverflow`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Rational {
    num: i64,
    den: i64,
}

impl Rational {
    /// Create the normalized fraction `num/den`.
    pub fn new(num: i64, den: i64) -> Result<Rational, ArithmeticError> {
        Self::normalize(num as i128, den as i128)
    }

    /// Reduce `num/den` to lowest terms with a positive denominator.
    fn normalize(mut num: i128, mut den: i128) -> Result<Rational, ArithmeticError> {
        if den == 0 {
            return Err(ArithmeticError::DivideByZero);
        }
        if num == 0 {
            return Ok(Rational::zero());
        }

        let g = match utils::gcd_signed_i128(num, den) {
            0 => 1,
            g => i128::try_from(g).map_err(|_| ArithmeticError::ArithmeticOverflow)?,
        };
        num /= g;
        den /= g;

        if den < 0 {
            num = num
                .checked_neg()
                .ok_or(ArithmeticError::ArithmeticOverflow)?;
            den = den
                .checked_neg()
                .ok_or(ArithmeticError::ArithmeticOverflow)?;
        }

        Ok(Rational {
            num: i64::try_from(num).map_err(|_| ArithmeticError::ArithmeticOverflow)?,
            den: i64::try_from(den).map_err(|_| ArithmeticError::ArithmeticOverflow)?,
        })
    }

    pub const fn zero() -> Rational {
        Rational { num: 0, den: 1 }
    }

    pub const fn one() -> Rational {
        Rational { num: 1, den: 1 }
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> i64 {
        self.den
    }

    pub fn is_zero(&self) -> bool {
        self.num == 0
    }

    pub fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }

    pub fn is_negative(&self) -> bool {
        self.num < 0
    }

    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    pub fn abs(&self) -> Result<Rational, ArithmeticError> {
        if self.is_negative() {
            self.neg()
        } else {
            Ok(*self)
        }
    }

    pub fn add(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        // each product is bounded by 2^126, only the sum can leave i128
        let num = (self.num as i128 * other.den as i128)
            .checked_add(other.num as i128 * self.den as i128)
            .ok_or(ArithmeticError::ArithmeticOverflow)?;
        Self::normalize(num, self.den as i128 * other.den as i128)
    }

    pub fn sub(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        let num = (self.num as i128 * other.den as i128)
            .checked_sub(other.num as i128 * self.den as i128)
            .ok_or(ArithmeticError::ArithmeticOverflow)?;
        Self::normalize(num, self.den as i128 * other.den as i128)
    }

    pub fn mul(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        Self::normalize(
            self.num as i128 * other.num as i128,
            self.den as i128 * other.den as i128,
        )
    }

    /// Divide by `other`, failing with [`ArithmeticError::DivideByZero`] when it is zero.
    pub fn div(&self, other: &Rational) -> Result<Rational, ArithmeticError> {
        if other.is_zero() {
            return Err(ArithmeticError::DivideByZero);
        }
        Self::normalize(
            self.num as i128 * other.den as i128,
            self.den as i128 * other.num as i128,
        )
    }

    /// The additive inverse. Only the numerator changes sign.
    pub fn neg(&self) -> Result<Rational, ArithmeticError> {
        Ok(Rational {
            num: self
                .num
                .checked_neg()
                .ok_or(ArithmeticError::ArithmeticOverflow)?,
            den: self.den,
        })
    }

    pub fn inv(&self) -> Result<Rational, ArithmeticError> {
        if self.is_zero() {
            return Err(ArithmeticError::DivideByZero);
        }
        Self::normalize(self.den as i128, self.num as i128)
    }

    /// Sample a rational with numerator in `range` (inclusive) and a
    /// denominator between 1 and `max(range.1, 1)`.
    ///
    /// Panics when `range.0 > range.1`.
    pub fn sample(rng: &mut impl rand::RngCore, range: (i64, i64)) -> Rational {
        let num = rng.gen_range(range.0..=range.1);
        let den = rng.gen_range(1..=range.1.max(1));

        // 1 <= g <= den, so both quotients fit and the sign is already right
        let g = utils::gcd_signed_i128(num as i128, den as i128) as i64;
        Rational {
            num: num / g,
            den: den / g,
        }
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Rational { num: value, den: 1 }
    }
}

impl TryFrom<(i64, i64)> for Rational {
    type Error = ArithmeticError;

    fn try_from((num, den): (i64, i64)) -> Result<Self, Self::Error> {
        Rational::new(num, den)
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            f.write_fmt(format_args!("{}", self.num))
        } else {
            f.write_fmt(format_args!("{}/{}", self.num, self.den))
        }
    }
}

/// Error from parsing a rational literal of the form `a` or `a/b`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRationalError {
    #[error("empty rational literal")]
    Empty,
    #[error("invalid numerator in `{text}`: {source}")]
    InvalidNumerator { text: String, source: ParseIntError },
    #[error("invalid denominator in `{text}`: {source}")]
    InvalidDenominator { text: String, source: ParseIntError },
    #[error("zero denominator in `{0}`")]
    ZeroDenominator(String),
    #[error("`{text}` is out of range: {source}")]
    OutOfRange {
        text: String,
        source: ArithmeticError,
    },
}

impl FromStr for Rational {
    type Err = ParseRationalError;

    /// Parse `a` or `a/b`, splitting at the first `/`. Both sides must be
    /// complete signed integers; trailing garbage is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseRationalError::Empty);
        }

        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n, Some(d)),
            None => (s, None),
        };

        let num: i64 = num
            .parse()
            .map_err(|source| ParseRationalError::InvalidNumerator {
                text: s.to_owned(),
                source,
            })?;

        let Some(den) = den else {
            return Ok(Rational::from(num));
        };

        let den: i64 = den
            .parse()
            .map_err(|source| ParseRationalError::InvalidDenominator {
                text: s.to_owned(),
                source,
            })?;

        if den == 0 {
            return Err(ParseRationalError::ZeroDenominator(s.to_owned()));
        }

        Rational::new(num, den).map_err(|source| ParseRationalError::OutOfRange {
            text: s.to_owned(),
            source,
        })
    }
}

impl Display for RationalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Q")
    }
}

impl Ring for RationalField {
    type Element = Rational;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError> {
        a.add(b)
    }

    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError> {
        a.sub(b)
    }

    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError> {
        a.mul(b)
    }

    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) -> Result<(), ArithmeticError> {
        *a = a.add(b)?;
        Ok(())
    }

    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) -> Result<(), ArithmeticError> {
        *a = a.mul(b)?;
        Ok(())
    }

    fn sub_mul_assign(
        &self,
        a: &mut Self::Element,
        b: &Self::Element,
        c: &Self::Element,
    ) -> Result<(), ArithmeticError> {
        *a = a.sub(&b.mul(c)?)?;
        Ok(())
    }

    fn neg(&self, a: &Self::Element) -> Result<Self::Element, ArithmeticError> {
        a.neg()
    }

    fn zero(&self) -> Self::Element {
        Rational::zero()
    }

    fn one(&self) -> Self::Element {
        Rational::one()
    }

    fn is_zero(a: &Self::Element) -> bool {
        a.is_zero()
    }

    fn is_one(&self, a: &Self::Element) -> bool {
        a.is_one()
    }

    fn sample(&self, rng: &mut impl rand::RngCore, range: (i64, i64)) -> Self::Element {
        Rational::sample(rng, range)
    }
}

impl Field for RationalField {
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError> {
        a.div(b)
    }

    fn div_assign(&self, a: &mut Self::Element, b: &Self::Element) -> Result<(), ArithmeticError> {
        *a = a.div(b)?;
        Ok(())
    }

    fn inv(&self, a: &Self::Element) -> Result<Self::Element, ArithmeticError> {
        a.inv()
    }
}
