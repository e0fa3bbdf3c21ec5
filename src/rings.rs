pub mod linear_system;
pub mod rational;

use std::fmt::{Debug, Display};

use thiserror::Error;

/// A fatal failure of exact arithmetic. Neither condition is retryable:
/// repeating the computation reproduces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArithmeticError {
    #[error("division by zero")]
    DivideByZero,
    #[error("arithmetic overflow: the result does not fit in 64-bit numerator and denominator")]
    ArithmeticOverflow,
}

/// A ring whose operations may fail instead of wrapping or panicking.
pub trait Ring: Clone + Copy + PartialEq + Debug + Display {
    type Element: Clone + PartialEq + Eq + Debug + Display;

    fn add(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError>;
    fn sub(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError>;
    fn mul(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError>;
    fn add_assign(&self, a: &mut Self::Element, b: &Self::Element) -> Result<(), ArithmeticError>;
    fn mul_assign(&self, a: &mut Self::Element, b: &Self::Element) -> Result<(), ArithmeticError>;
    /// Compute `a -= b * c`.
    fn sub_mul_assign(
        &self,
        a: &mut Self::Element,
        b: &Self::Element,
        c: &Self::Element,
    ) -> Result<(), ArithmeticError>;
    fn neg(&self, a: &Self::Element) -> Result<Self::Element, ArithmeticError>;
    fn zero(&self) -> Self::Element;
    fn one(&self) -> Self::Element;
    fn is_zero(a: &Self::Element) -> bool;
    fn is_one(&self, a: &Self::Element) -> bool;

    fn sample(&self, rng: &mut impl rand::RngCore, range: (i64, i64)) -> Self::Element;
}

pub trait Field: Ring {
    fn div(&self, a: &Self::Element, b: &Self::Element) -> Result<Self::Element, ArithmeticError>;
    fn div_assign(&self, a: &mut Self::Element, b: &Self::Element) -> Result<(), ArithmeticError>;
    fn inv(&self, a: &Self::Element) -> Result<Self::Element, ArithmeticError>;
}
