//! Exact solving of linear systems over the rationals.
//!
//! An augmented matrix `(A | b)` is brought into reduced row-echelon form by
//! Gauss-Jordan elimination on exact fractions, after which the system is
//! classified as having no solution, exactly one, or infinitely many
//! parametrized by its free variables.
//!
//! For example:
//!
//! ```
//! use exact_rref::{parser, solve::{solve, Solution}, rings::rational::Rational};
//!
//! let matrix = parser::parse_matrix("2\n1 1 3\n1 -1 1\n").unwrap();
//! let reduction = solve(matrix).unwrap();
//!
//! assert_eq!(
//!     reduction.solution,
//!     Solution::Unique(vec![Rational::from(2), Rational::from(1)])
//! );
//! ```
//!
//! No arithmetic ever wraps: overflow of the 64-bit fractions and division
//! by zero are reported as [`ArithmeticError`](rings::ArithmeticError).

pub mod config;
pub mod parser;
pub mod printer;
pub mod rings;
pub mod solve;
pub mod utils;

mod proptests;
