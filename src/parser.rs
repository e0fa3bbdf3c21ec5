//! Reading linear systems from text.
//!
//! Two formats are understood. The matrix format is a row count followed by
//! that many lines of whitespace-separated rationals, the last column being
//! the right-hand side:
//!
//! ```text
//! 2
//! 1 1 3
//! 1 -1 1
//! ```
//!
//! The equation format is a row count followed by linear equations in
//! named variables:
//!
//! ```text
//! 2
//! x + y = 3
//! x - y = 1
//! ```

use std::io::Read;

use ahash::HashMap;
use smallvec::SmallVec;
use smartstring::{LazyCompact, SmartString};
use thiserror::Error;
use tracing::{debug, warn};

use crate::rings::{
    linear_system::{Matrix, MatrixError},
    rational::{ParseRationalError, Rational, RationalField, Q},
    ArithmeticError,
};

/// Errors from reading a linear system. Rows and columns are 1-based.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing row count")]
    MissingRowCount,
    #[error("invalid row count `{0}`: expected a positive integer")]
    InvalidRowCount(String),
    #[error("expected {expected} rows, found {found}")]
    MissingRow { expected: usize, found: usize },
    #[error("row {row} is empty")]
    EmptyRow { row: usize },
    #[error("row {row} has {found} columns, expected {expected}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("row {row}, column {column}: {source}")]
    InvalidToken {
        row: usize,
        column: usize,
        source: ParseRationalError,
    },
    #[error("equation {row}: {reason}")]
    InvalidEquation { row: usize, reason: String },
    #[error("equation {row}: {source}")]
    InvalidCoefficient {
        row: usize,
        source: ParseRationalError,
    },
    #[error("equation {row}: {source}")]
    Arithmetic {
        row: usize,
        source: ArithmeticError,
    },
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// An augmented matrix together with the names of its variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearSystem {
    pub matrix: Matrix<RationalField>,
    pub variables: Vec<SmartString<LazyCompact>>,
}

/// Read an augmented matrix in the matrix format.
pub fn read_matrix(mut reader: impl Read) -> Result<Matrix<RationalField>, InputError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    parse_matrix(&input)
}

/// Read a system in the equation format.
pub fn read_equations(mut reader: impl Read) -> Result<LinearSystem, InputError> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    parse_equations(&input)
}

/// Read the row count `m` and return the `m` lines that follow it.
fn split_rows(input: &str) -> Result<Vec<&str>, InputError> {
    let mut lines = input.lines();

    let count = lines
        .by_ref()
        .find(|l| !l.trim().is_empty())
        .ok_or(InputError::MissingRowCount)?
        .trim();
    let m = match count.parse::<usize>() {
        Ok(m) if m > 0 => m,
        _ => return Err(InputError::InvalidRowCount(count.to_owned())),
    };

    let rows: Vec<&str> = lines.by_ref().take(m).collect();
    if rows.len() < m {
        return Err(InputError::MissingRow {
            expected: m,
            found: rows.len(),
        });
    }

    if lines.any(|l| !l.trim().is_empty()) {
        warn!(rows = m, "ignoring input after the last row");
    }

    Ok(rows)
}

/// Parse an augmented matrix in the matrix format.
///
/// The column count is taken from the first row and every other row must
/// match it. Tokens must be complete rationals `a` or `a/b`.
pub fn parse_matrix(input: &str) -> Result<Matrix<RationalField>, InputError> {
    let lines = split_rows(input)?;

    let mut cols = 0;
    let mut rows = Vec::with_capacity(lines.len());
    for (i, line) in lines.into_iter().enumerate() {
        let row = i + 1;
        let tokens: SmallVec<[&str; 16]> = line.split_whitespace().collect();

        if tokens.is_empty() {
            return Err(InputError::EmptyRow { row });
        }
        if row == 1 {
            cols = tokens.len();
        } else if tokens.len() != cols {
            return Err(InputError::MalformedRow {
                row,
                expected: cols,
                found: tokens.len(),
            });
        }

        let values = tokens
            .iter()
            .enumerate()
            .map(|(c, t)| {
                t.parse::<Rational>()
                    .map_err(|source| InputError::InvalidToken {
                        row,
                        column: c + 1,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    debug!(rows = rows.len(), cols, "parsed matrix");
    Ok(Matrix::from_nested_vec(rows, Q)?)
}

/// Parse a system in the equation format.
///
/// Each side of an equation is a sum of terms `[coefficient][*]name` or
/// constants, e.g. `2x + 3/2*y - 1 = z`. Variables are numbered in order of
/// first appearance and a variable may occur more than once.
pub fn parse_equations(input: &str) -> Result<LinearSystem, InputError> {
    let lines = split_rows(input)?;

    let mut vars = VariableMap::default();
    let mut equations = Vec::with_capacity(lines.len());
    for (i, line) in lines.into_iter().enumerate() {
        let row = i + 1;
        if line.trim().is_empty() {
            return Err(InputError::EmptyRow { row });
        }
        equations.push(parse_equation(line, row, &mut vars)?);
    }

    let nvars = vars.names.len();
    let mut rows = Vec::with_capacity(equations.len());
    for (coefficients, rhs) in equations {
        let mut r = vec![Rational::zero(); nvars + 1];
        for (v, c) in coefficients {
            r[v] = c;
        }
        r[nvars] = rhs;
        rows.push(r);
    }

    debug!(equations = rows.len(), variables = nvars, "parsed equations");
    Ok(LinearSystem {
        matrix: Matrix::from_nested_vec(rows, Q)?,
        variables: vars.names,
    })
}

#[derive(Default)]
struct VariableMap {
    names: Vec<SmartString<LazyCompact>>,
    index: HashMap<SmartString<LazyCompact>, usize>,
}

impl VariableMap {
    fn get_or_insert(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.into());
        self.index.insert(name.into(), i);
        i
    }
}

/// A linear combination of variables plus a constant.
#[derive(Default)]
struct LinearForm {
    coefficients: Vec<(usize, Rational)>,
    constant: Rational,
}

impl LinearForm {
    fn add_term(&mut self, var: usize, c: &Rational) -> Result<(), ArithmeticError> {
        match self.coefficients.iter_mut().find(|(v, _)| *v == var) {
            Some((_, e)) => *e = e.add(c)?,
            None => self.coefficients.push((var, *c)),
        }
        Ok(())
    }
}

/// Parse one equation into its coefficients on the left and the constant on the right.
fn parse_equation(
    line: &str,
    row: usize,
    vars: &mut VariableMap,
) -> Result<(Vec<(usize, Rational)>, Rational), InputError> {
    let invalid = |reason: String| InputError::InvalidEquation { row, reason };
    let arithmetic = |source: ArithmeticError| InputError::Arithmetic { row, source };

    let Some((lhs, rhs)) = line.split_once('=') else {
        return Err(invalid("missing `=`".into()));
    };
    if rhs.contains('=') {
        return Err(invalid("more than one `=`".into()));
    }

    let lhs = parse_linear_form(lhs, row, vars)?;
    let rhs = parse_linear_form(rhs, row, vars)?;

    // move everything in a variable to the left and every constant to the right
    let mut form = lhs;
    for (v, c) in &rhs.coefficients {
        form.add_term(*v, &c.neg().map_err(arithmetic)?)
            .map_err(arithmetic)?;
    }
    let constant = rhs.constant.sub(&form.constant).map_err(arithmetic)?;

    Ok((form.coefficients, constant))
}

fn parse_linear_form(
    text: &str,
    row: usize,
    vars: &mut VariableMap,
) -> Result<LinearForm, InputError> {
    let invalid = |reason: String| InputError::InvalidEquation { row, reason };
    let arithmetic = |source: ArithmeticError| InputError::Arithmetic { row, source };

    let chars: Vec<char> = text.chars().collect();
    let skip_whitespace = |pos: &mut usize| {
        while *pos < chars.len() && chars[*pos].is_whitespace() {
            *pos += 1;
        }
    };

    let mut form = LinearForm::default();
    let mut pos = 0;
    skip_whitespace(&mut pos);
    if pos == chars.len() {
        return Err(invalid("one side of the equation is empty".into()));
    }

    let mut first = true;
    while pos < chars.len() {
        let negative = match chars[pos] {
            '+' => {
                pos += 1;
                false
            }
            '-' => {
                pos += 1;
                true
            }
            _ if first => false,
            c => return Err(invalid(format!("expected `+` or `-` before `{}`", c))),
        };
        first = false;
        skip_whitespace(&mut pos);

        // a coefficient is a single token, `1 2` is not `12`
        let start = pos;
        while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '/') {
            pos += 1;
        }
        let coefficient = if pos > start {
            let s: String = chars[start..pos].iter().collect();
            Some(
                s.parse::<Rational>()
                    .map_err(|source| InputError::InvalidCoefficient { row, source })?,
            )
        } else {
            None
        };
        skip_whitespace(&mut pos);

        let star = pos < chars.len() && chars[pos] == '*';
        if star {
            pos += 1;
            skip_whitespace(&mut pos);
        }

        let start = pos;
        if pos < chars.len() && (chars[pos].is_alphabetic() || chars[pos] == '_') {
            pos += 1;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
        }
        let name = (pos > start).then(|| chars[start..pos].iter().collect::<String>());
        skip_whitespace(&mut pos);

        let value = match (&coefficient, &name) {
            (None, None) => {
                return Err(invalid(match chars.get(pos) {
                    Some(c) => format!("unexpected `{}`", c),
                    None => "expected a term after the sign".into(),
                }))
            }
            (_, None) if star => return Err(invalid("expected a variable after `*`".into())),
            (None, Some(_)) if star => {
                return Err(invalid("expected a coefficient before `*`".into()))
            }
            (Some(c), _) => *c,
            (None, Some(_)) => Rational::one(),
        };
        let value = if negative {
            value.neg().map_err(arithmetic)?
        } else {
            value
        };

        match name {
            Some(name) => {
                let v = vars.get_or_insert(&name);
                form.add_term(v, &value).map_err(arithmetic)?;
            }
            None => form.constant = form.constant.add(&value).map_err(arithmetic)?,
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64) -> Rational {
        Rational::from(n)
    }

    fn q(num: i64, den: i64) -> Rational {
        Rational::new(num, den).unwrap()
    }

    fn names(sys: &LinearSystem) -> Vec<&str> {
        sys.variables.iter().map(|v| v.as_str()).collect()
    }

    #[test]
    fn matrix() {
        let m = parse_matrix("2\n1 1 3\n1 -1 1\n").unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 3));
        assert_eq!(m.row(1), &[r(1), r(-1), r(1)]);

        let m = parse_matrix("\n1\n 2\t1/2 \n").unwrap();
        assert_eq!(m.row(0), &[r(2), q(1, 2)]);

        let m = read_matrix("1\n4/6 -2/4".as_bytes()).unwrap();
        assert_eq!(m.row(0), &[q(2, 3), q(-1, 2)]);
    }

    #[test]
    fn matrix_errors() {
        assert!(matches!(parse_matrix(""), Err(InputError::MissingRowCount)));
        assert!(matches!(
            parse_matrix("0\n"),
            Err(InputError::InvalidRowCount(s)) if s == "0"
        ));
        assert!(matches!(
            parse_matrix("two\n1 2"),
            Err(InputError::InvalidRowCount(_))
        ));
        assert!(matches!(
            parse_matrix("3\n1 2\n3 4\n"),
            Err(InputError::MissingRow {
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            parse_matrix("2\n1 2 3\n4 5\n"),
            Err(InputError::MalformedRow {
                row: 2,
                expected: 3,
                found: 2
            })
        ));
        assert!(matches!(
            parse_matrix("2\n\n1 2\n"),
            Err(InputError::EmptyRow { row: 1 })
        ));
        assert!(matches!(
            parse_matrix("1\n1 2x 3\n"),
            Err(InputError::InvalidToken {
                row: 1,
                column: 2,
                source: ParseRationalError::InvalidNumerator { .. }
            })
        ));
        assert!(matches!(
            parse_matrix("1\n1 1/0\n"),
            Err(InputError::InvalidToken {
                column: 2,
                source: ParseRationalError::ZeroDenominator(_),
                ..
            })
        ));
    }

    #[test]
    fn equations() {
        let sys = parse_equations("2\nx + y = 3\nx - y = 1\n").unwrap();
        assert_eq!(names(&sys), ["x", "y"]);
        assert_eq!(sys.matrix.row(0), &[r(1), r(1), r(3)]);
        assert_eq!(sys.matrix.row(1), &[r(1), r(-1), r(1)]);
    }

    #[test]
    fn equation_terms() {
        let sys = parse_equations("2\n2a + 3/2*b - 1 = a + 4\n-b_2 + 7 = 2*a - b\n").unwrap();
        assert_eq!(names(&sys), ["a", "b", "b_2"]);

        // a + 3/2 b = 5
        assert_eq!(sys.matrix.row(0), &[r(1), q(3, 2), r(0), r(5)]);
        // -2a + b - b_2 = -7
        assert_eq!(sys.matrix.row(1), &[r(-2), r(1), r(-1), r(-7)]);
    }

    #[test]
    fn whitespace_separates_tokens() {
        let sys = parse_equations("1\n  2 * x -  y - 3/2 z_1 = 3 \n").unwrap();
        assert_eq!(names(&sys), ["x", "y", "z_1"]);
        assert_eq!(sys.matrix.row(0), &[r(2), r(-1), q(-3, 2), r(3)]);

        let sys = parse_equations("1\n\t- x\t=\t2 y\n").unwrap();
        assert_eq!(sys.matrix.row(0), &[r(-1), r(-2), r(0)]);
    }

    #[test]
    fn equations_without_variables() {
        let sys = read_equations("1\n3 = 1 + 2".as_bytes()).unwrap();
        assert!(sys.variables.is_empty());
        assert_eq!(sys.matrix.row(0), &[r(0)]);
    }

    #[test]
    fn equation_errors() {
        let err = |s: &str| parse_equations(s).unwrap_err();

        assert!(matches!(
            err("1\nx + y\n"),
            InputError::InvalidEquation { row: 1, .. }
        ));
        assert!(matches!(
            err("1\nx = y = 1\n"),
            InputError::InvalidEquation { row: 1, .. }
        ));
        assert!(matches!(
            err("1\n = 1\n"),
            InputError::InvalidEquation { .. }
        ));
        assert!(matches!(
            err("1\nx y = 1\n"),
            InputError::InvalidEquation { .. }
        ));
        assert!(matches!(
            err("1\n1 2 x = 3\n"),
            InputError::InvalidEquation { row: 1, .. }
        ));
        assert!(matches!(
            err("1\nx = 1 2\n"),
            InputError::InvalidEquation { row: 1, .. }
        ));
        assert!(matches!(
            err("1\n2* = 1\n"),
            InputError::InvalidEquation { .. }
        ));
        assert!(matches!(
            err("1\nx + = 1\n"),
            InputError::InvalidEquation { .. }
        ));
        assert!(matches!(
            err("1\nx + 1/0y = 1\n"),
            InputError::InvalidCoefficient {
                row: 1,
                source: ParseRationalError::ZeroDenominator(_)
            }
        ));
        assert!(matches!(
            err("2\nx = 1\n\n"),
            InputError::EmptyRow { row: 2 }
        ));
    }
}
