use tracing::debug;

use crate::rings::{
    linear_system::{Matrix, MatrixError, PivotMap},
    ArithmeticError, Field,
};

/// A variable of a parametrized solution: `constant + Σ coefficient * t_k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression<F: Field> {
    pub constant: F::Element,
    /// `(k, coefficient)` pairs, where `k` indexes the free parameters.
    /// Zero coefficients are never stored.
    pub terms: Vec<(usize, F::Element)>,
}

impl<F: Field> Expression<F> {
    fn evaluate(&self, field: &F, params: &[F::Element]) -> Result<F::Element, ArithmeticError> {
        let mut res = self.constant.clone();
        for (k, c) in &self.terms {
            let p = field.mul(c, &params[*k])?;
            field.add_assign(&mut res, &p)?;
        }
        Ok(res)
    }
}

/// The solution set of a linear system `A x = b`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Solution<F: Field> {
    /// No `x` satisfies the system.
    Inconsistent,
    /// Exactly one value per variable.
    Unique(Vec<F::Element>),
    /// One expression per variable in the free parameters. The `k`-th
    /// parameter belongs to the `k`-th entry of `free_columns`.
    Infinite {
        free_columns: Vec<u32>,
        expressions: Vec<Expression<F>>,
    },
}

impl<F: Field> Solution<F> {
    pub fn is_consistent(&self) -> bool {
        !matches!(self, Solution::Inconsistent)
    }

    /// The variables that are unconstrained, in column order.
    pub fn free_variables(&self) -> &[u32] {
        match self {
            Solution::Infinite { free_columns, .. } => free_columns,
            _ => &[],
        }
    }

    /// Evaluate the solution for concrete values of the free parameters.
    /// Returns `None` for an inconsistent system.
    pub fn instantiate(
        &self,
        field: &F,
        params: &[F::Element],
    ) -> Result<Option<Vec<F::Element>>, MatrixError> {
        if params.len() != self.free_variables().len() {
            return Err(MatrixError::LengthMismatch {
                expected: self.free_variables().len(),
                found: params.len(),
            });
        }

        match self {
            Solution::Inconsistent => Ok(None),
            Solution::Unique(values) => Ok(Some(values.clone())),
            Solution::Infinite { expressions, .. } => Ok(Some(
                expressions
                    .iter()
                    .map(|e| e.evaluate(field, params))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }
}

impl<F: Field> Matrix<F> {
    /// Interpret a row-reduced matrix as an augmented system, where the last
    /// column is the right-hand side, and determine its solution set.
    ///
    /// `pivots` must be the map [`Matrix::row_reduce`] returned for this matrix.
    pub(crate) fn classify(&self, pivots: &PivotMap) -> Result<Solution<F>, ArithmeticError> {
        let (nrows, ncols) = self.shape;
        debug_assert!(pivots.fits(nrows, ncols));
        let Some(vars) = ncols.checked_sub(1) else {
            return Ok(Solution::Unique(vec![]));
        };

        for r in 0..nrows {
            if (0..vars).all(|c| F::is_zero(&self[(r, c)])) && !F::is_zero(&self[(r, vars)]) {
                debug!(row = r, "inconsistent row");
                return Ok(Solution::Inconsistent);
            }
        }

        let rank = pivots.rank(vars);
        if rank == vars as usize {
            debug!(rank, "unique solution");
            let values = (0..vars)
                .map(|j| match pivots.row_of_pivot(j) {
                    Some(i) => self[(i, vars)].clone(),
                    None => self.field.zero(),
                })
                .collect();
            return Ok(Solution::Unique(values));
        }

        let free_columns = pivots.free_columns(vars);
        debug!(rank, free = free_columns.len(), "infinite solutions");

        let mut expressions = Vec::with_capacity(vars as usize);
        for j in 0..vars {
            let e = match pivots.row_of_pivot(j) {
                Some(i) => {
                    let mut terms = vec![];
                    for (k, &c) in free_columns.iter().enumerate() {
                        let a = &self[(i, c)];
                        if !F::is_zero(a) {
                            // moved to the right-hand side
                            terms.push((k, self.field.neg(a)?));
                        }
                    }
                    Expression {
                        constant: self[(i, vars)].clone(),
                        terms,
                    }
                }
                None => {
                    let k = free_columns
                        .iter()
                        .position(|&c| c == j)
                        .unwrap_or_default();
                    Expression {
                        constant: self.field.zero(),
                        terms: vec![(k, self.field.one())],
                    }
                }
            };
            expressions.push(e);
        }

        Ok(Solution::Infinite {
            free_columns,
            expressions,
        })
    }
}

/// The outcome of a complete reduce-then-classify pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reduction<F: Field> {
    pub matrix: Matrix<F>,
    pub pivots: PivotMap,
    pub solution: Solution<F>,
}

/// Row-reduce the augmented matrix `(A | b)` and determine the solution set of `A x = b`.
///
/// The matrix is consumed and handed back, reduced, in the [`Reduction`].
pub fn solve<F: Field>(matrix: Matrix<F>) -> Result<Reduction<F>, ArithmeticError> {
    let (matrix, pivots) = matrix.into_row_reduced()?;
    let solution = matrix.classify(&pivots)?;
    Ok(Reduction {
        matrix,
        pivots,
        solution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rings::rational::{Rational, RationalField, Q};

    fn r(n: i64) -> Rational {
        Rational::from(n)
    }

    fn q(num: i64, den: i64) -> Rational {
        Rational::new(num, den).unwrap()
    }

    fn system(rows: &[&[Rational]]) -> Matrix<RationalField> {
        Matrix::from_nested_vec(rows.iter().map(|r| r.to_vec()).collect(), Q).unwrap()
    }

    #[test]
    fn unique() {
        let res = solve(system(&[&[r(1), r(1), r(3)], &[r(1), r(-1), r(1)]])).unwrap();

        assert_eq!(res.matrix, system(&[&[r(1), r(0), r(2)], &[r(0), r(1), r(1)]]));
        assert_eq!(res.solution, Solution::Unique(vec![r(2), r(1)]));
    }

    #[test]
    fn inconsistent() {
        let res = solve(system(&[&[r(1), r(1), r(1)], &[r(1), r(1), r(2)]])).unwrap();

        assert_eq!(res.solution, Solution::Inconsistent);
        assert!(!res.solution.is_consistent());
        assert_eq!(res.solution.instantiate(&Q, &[]).unwrap(), None);
    }

    #[test]
    fn infinite() {
        let res = solve(system(&[&[r(1), r(1), r(1)]])).unwrap();

        assert_eq!(
            res.solution,
            Solution::Infinite {
                free_columns: vec![1],
                expressions: vec![
                    Expression {
                        constant: r(1),
                        terms: vec![(0, r(-1))]
                    },
                    Expression {
                        constant: r(0),
                        terms: vec![(0, r(1))]
                    },
                ]
            }
        );

        let x = res.solution.instantiate(&Q, &[r(5)]).unwrap().unwrap();
        assert_eq!(x, vec![r(-4), r(5)]);
    }

    #[test]
    fn fraction_input() {
        let res = solve(system(&[&[r(2), q(1, 2)]])).unwrap();
        assert_eq!(res.solution, Solution::Unique(vec![q(1, 4)]));
    }

    #[test]
    fn overdetermined_consistent() {
        // three equations in two unknowns, one of them redundant
        let res = solve(system(&[
            &[r(1), r(2), r(5)],
            &[r(2), r(4), r(10)],
            &[r(3), r(-1), r(1)],
        ]))
        .unwrap();

        assert_eq!(res.solution, Solution::Unique(vec![r(1), r(2)]));
        assert_eq!(res.pivots.pivot_of_row(2), None);
    }

    #[test]
    fn free_column_in_the_middle() {
        // x1 + 2 x2 - x3 = 4, x3 = 1
        let res = solve(system(&[
            &[r(1), r(2), r(-1), r(4)],
            &[r(0), r(0), r(1), r(1)],
        ]))
        .unwrap();

        let Solution::Infinite {
            free_columns,
            expressions,
        } = &res.solution
        else {
            panic!("expected infinite solutions, got {:?}", res.solution);
        };

        assert_eq!(free_columns, &[1]);
        assert_eq!(expressions[0].constant, r(5));
        assert_eq!(expressions[0].terms, vec![(0, r(-2))]);
        assert_eq!(expressions[2].constant, r(1));
        assert!(expressions[2].terms.is_empty());
    }

    #[test]
    fn zero_system() {
        let res = solve(system(&[&[r(0), r(0), r(0)], &[r(0), r(0), r(0)]])).unwrap();
        assert_eq!(res.solution.free_variables(), &[0, 1]);

        let x = res.solution.instantiate(&Q, &[r(3), q(-1, 2)]).unwrap().unwrap();
        assert_eq!(x, vec![r(3), q(-1, 2)]);
    }

    #[test]
    fn only_augmented_column() {
        assert_eq!(
            solve(system(&[&[r(0)]])).unwrap().solution,
            Solution::Unique(vec![])
        );
        assert_eq!(
            solve(system(&[&[r(3)]])).unwrap().solution,
            Solution::Inconsistent
        );
    }

    #[test]
    fn instantiate_checks_parameter_count() {
        let res = solve(system(&[&[r(1), r(1), r(1)]])).unwrap();
        assert_eq!(
            res.solution.instantiate(&Q, &[]),
            Err(MatrixError::LengthMismatch {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn classify_with_the_reduced_pivots() {
        let (reduced, pivots) = system(&[&[r(2), r(4), r(6)], &[r(1), r(1), r(1)]])
            .into_row_reduced()
            .unwrap();
        assert!(pivots.fits(2, 3));
        assert!(!pivots.fits(3, 3));

        assert_eq!(
            reduced.classify(&pivots).unwrap(),
            Solution::Unique(vec![r(-1), r(2)])
        );
    }

    #[test]
    fn overflow_is_an_error() {
        let big = Rational::from(i64::MAX);
        let res = solve(system(&[&[r(1), big, r(0)], &[big, r(1), r(0)]]));
        assert_eq!(res, Err(ArithmeticError::ArithmeticOverflow));
    }
}
