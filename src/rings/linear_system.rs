use smallvec::SmallVec;
use std::{
    fmt::{Display, Write},
    ops::{Index, IndexMut},
    slice::Chunks,
};
use thiserror::Error;
use tracing::{debug, trace};

use super::{ArithmeticError, Field};

/// A dense row-major matrix with entries in the field `F`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Matrix<F: Field> {
    pub(crate) shape: (u32, u32),
    pub(crate) data: SmallVec<[F::Element; 25]>,
    pub(crate) field: F,
}

/// Errors from constructing or combining matrices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("the matrix has no rows")]
    Empty,
    #[error("row {row} has {found} entries, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("data length {len} does not match matrix dimensions ({rows},{cols})")]
    DimensionMismatch { len: usize, rows: u32, cols: u32 },
    #[error("the matrix is not square: ({rows},{cols})")]
    NotSquare { rows: u32, cols: u32 },
    #[error("a ({rows},{cols}) matrix exceeds the supported size")]
    TooLarge { rows: usize, cols: usize },
    #[error("vector has length {found}, expected {expected}")]
    LengthMismatch { expected: usize, found: usize },
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// Convert a shape to `u32` dimensions whose product also fits in a `u32`.
fn checked_shape(rows: usize, cols: usize) -> Result<(u32, u32), MatrixError> {
    let too_large = || MatrixError::TooLarge { rows, cols };
    let r = u32::try_from(rows).map_err(|_| too_large())?;
    let c = u32::try_from(cols).map_err(|_| too_large())?;
    r.checked_mul(c).ok_or_else(too_large)?;
    Ok((r, c))
}

impl<F: Field> Matrix<F> {
    /// Create a new zeroed matrix with `rows` rows and `cols` columns.
    pub fn new(rows: u32, cols: u32, field: F) -> Matrix<F> {
        Matrix {
            shape: (rows, cols),
            data: (0..rows as usize * cols as usize)
                .map(|_| field.zero())
                .collect(),
            field,
        }
    }

    /// Create a square matrix with ones on the main diagonal.
    pub fn identity(rows: u32, field: F) -> Matrix<F> {
        let mut m = Matrix::new(rows, rows, field);
        for i in 0..rows {
            m[(i, i)] = field.one();
        }
        m
    }

    /// Convert a row-major linear representation into a matrix.
    pub fn from_linear(
        data: Vec<F::Element>,
        rows: u32,
        cols: u32,
        field: F,
    ) -> Result<Matrix<F>, MatrixError> {
        checked_shape(rows as usize, cols as usize)?;
        if data.len() != rows as usize * cols as usize {
            return Err(MatrixError::DimensionMismatch {
                len: data.len(),
                rows,
                cols,
            });
        }

        Ok(Matrix {
            shape: (rows, cols),
            data: data.into(),
            field,
        })
    }

    /// Create a matrix from a list of rows, which must all have the length of the first row.
    pub fn from_nested_vec(
        matrix: Vec<Vec<F::Element>>,
        field: F,
    ) -> Result<Matrix<F>, MatrixError> {
        let cols = matrix.first().map(|r| r.len()).ok_or(MatrixError::Empty)?;
        let rows = matrix.len();
        let shape = checked_shape(rows, cols)?;

        let mut data = SmallVec::with_capacity(rows * cols);
        for (i, r) in matrix.into_iter().enumerate() {
            if r.len() != cols {
                return Err(MatrixError::NotRectangular {
                    row: i + 1,
                    expected: cols,
                    found: r.len(),
                });
            }
            data.extend(r);
        }

        Ok(Matrix {
            shape,
            data,
            field,
        })
    }

    /// Create the augmented matrix `(A | b)`.
    pub fn augment(a: &Matrix<F>, b: &[F::Element]) -> Result<Matrix<F>, MatrixError> {
        if b.len() != a.rows() {
            return Err(MatrixError::LengthMismatch {
                expected: a.rows(),
                found: b.len(),
            });
        }

        let (rows, cols) = a.shape;
        let mut m = Matrix::new(rows, cols + 1, a.field);
        for r in 0..rows {
            for c in 0..cols {
                m[(r, c)] = a[(r, c)].clone();
            }
            m[(r, cols)] = b[r as usize].clone();
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.shape.0 as usize
    }

    pub fn cols(&self) -> usize {
        self.shape.1 as usize
    }

    pub fn field(&self) -> &F {
        &self.field
    }

    /// The entries in row-major order.
    pub fn data(&self) -> &[F::Element] {
        &self.data
    }

    pub fn row(&self, row: u32) -> &[F::Element] {
        let start = row as usize * self.shape.1 as usize;
        &self.data[start..start + self.shape.1 as usize]
    }

    pub fn row_iter(&self) -> Chunks<'_, F::Element> {
        // chunks(0) panics
        self.data.chunks(self.shape.1.max(1) as usize)
    }

    pub fn swap_rows(&mut self, r1: u32, r2: u32) {
        if r1 == r2 {
            return;
        }
        for c in 0..self.shape.1 {
            self.data.swap(
                r1 as usize * self.shape.1 as usize + c as usize,
                r2 as usize * self.shape.1 as usize + c as usize,
            );
        }
    }

    /// Compute the product of the matrix with the column vector `x`.
    pub fn mul_vec(&self, x: &[F::Element]) -> Result<Vec<F::Element>, MatrixError> {
        if x.len() != self.cols() {
            return Err(MatrixError::LengthMismatch {
                expected: self.cols(),
                found: x.len(),
            });
        }

        let mut res = Vec::with_capacity(self.rows());
        for r in 0..self.shape.0 {
            let mut acc = self.field.zero();
            for (a, b) in self.row(r).iter().zip(x) {
                let p = self.field.mul(a, b)?;
                self.field.add_assign(&mut acc, &p)?;
            }
            res.push(acc);
        }
        Ok(res)
    }
}

impl<F: Field> Index<(u32, u32)> for Matrix<F> {
    type Output = F::Element;

    fn index(&self, index: (u32, u32)) -> &Self::Output {
        &self.data[index.0 as usize * self.shape.1 as usize + index.1 as usize]
    }
}

impl<F: Field> IndexMut<(u32, u32)> for Matrix<F> {
    fn index_mut(&mut self, index: (u32, u32)) -> &mut F::Element {
        &mut self.data[index.0 as usize * self.shape.1 as usize + index.1 as usize]
    }
}

impl<F: Field> Display for Matrix<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char('{')?;
        for ri in 0..self.rows() {
            f.write_char('{')?;
            for (ci, c) in self.row(ri as u32).iter().enumerate() {
                Display::fmt(c, f)?;
                if ci + 1 < self.cols() {
                    f.write_char(',')?;
                }
            }
            f.write_char('}')?;
            if ri + 1 < self.rows() {
                f.write_char(',')?;
            }
        }
        f.write_char('}')
    }
}

/// The pivot structure of a row-reduced matrix.
///
/// Pivot columns strictly increase with the row index, and every row has
/// at most one pivot. A row without a pivot is entirely zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PivotMap {
    row_pivots: SmallVec<[Option<u32>; 8]>,
    pivot_columns: SmallVec<[bool; 16]>,
}

impl PivotMap {
    fn new(rows: u32, cols: u32) -> PivotMap {
        PivotMap {
            row_pivots: (0..rows).map(|_| None).collect(),
            pivot_columns: (0..cols).map(|_| false).collect(),
        }
    }

    fn record(&mut self, row: u32, col: u32) {
        self.row_pivots[row as usize] = Some(col);
        self.pivot_columns[col as usize] = true;
    }

    /// Whether this map describes a matrix with `rows` rows and `cols` columns.
    pub(crate) fn fits(&self, rows: u32, cols: u32) -> bool {
        self.row_pivots.len() == rows as usize && self.pivot_columns.len() == cols as usize
    }

    /// The column holding the leading 1 of `row`, or `None` for a zero row.
    pub fn pivot_of_row(&self, row: u32) -> Option<u32> {
        self.row_pivots.get(row as usize).copied().flatten()
    }

    pub fn is_pivot_column(&self, col: u32) -> bool {
        self.pivot_columns
            .get(col as usize)
            .copied()
            .unwrap_or(false)
    }

    /// The row that owns the pivot in column `col`.
    pub fn row_of_pivot(&self, col: u32) -> Option<u32> {
        self.row_pivots
            .iter()
            .position(|p| *p == Some(col))
            .map(|r| r as u32)
    }

    /// All `(row, column)` pivot positions, in increasing row order.
    pub fn pivots(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.row_pivots
            .iter()
            .enumerate()
            .filter_map(|(r, c)| c.map(|c| (r as u32, c)))
    }

    /// The number of pivot columns among the first `max_col` columns.
    pub fn rank(&self, max_col: u32) -> usize {
        self.pivot_columns
            .iter()
            .take(max_col as usize)
            .filter(|p| **p)
            .count()
    }

    /// The non-pivot columns among the first `max_col` columns, in column order.
    pub fn free_columns(&self, max_col: u32) -> Vec<u32> {
        (0..max_col.min(self.pivot_columns.len() as u32))
            .filter(|c| !self.pivot_columns[*c as usize])
            .collect()
    }
}

impl<F: Field> Matrix<F> {
    /// Transform the matrix in place into reduced row-echelon form using
    /// Gauss-Jordan elimination and return its pivot structure.
    ///
    /// The pivot of each column is the first nonzero entry at or below the
    /// current row. Since arithmetic is exact, any nonzero pivot is as good as
    /// any other and no magnitude comparison is made.
    ///
    /// On error the matrix is left partially reduced.
    pub fn row_reduce(&mut self) -> Result<PivotMap, ArithmeticError> {
        let (nrows, ncols) = self.shape;
        let field = self.field;
        let mut pivots = PivotMap::new(nrows, ncols);

        let mut r = 0;
        let mut lead = 0;
        while r < nrows && lead < ncols {
            let Some(i) = (r..nrows).find(|&i| !F::is_zero(&self[(i, lead)])) else {
                // no pivot in this column, try the next one with the same row
                lead += 1;
                continue;
            };

            if i != r {
                trace!(from = i, to = r, "swap rows");
                self.swap_rows(r, i);
            }

            // entries left of `lead` in row `r` are already zero
            let pivot = self[(r, lead)].clone();
            debug!(row = r, column = lead, %pivot, "selected pivot");
            if !field.is_one(&pivot) {
                for c in lead..ncols {
                    field.div_assign(&mut self[(r, c)], &pivot)?;
                }
            }

            for rr in 0..nrows {
                if rr == r {
                    continue;
                }

                let factor = self[(rr, lead)].clone();
                if F::is_zero(&factor) {
                    continue;
                }

                trace!(row = rr, %factor, "eliminate");
                for c in lead..ncols {
                    let e = self[(r, c)].clone();
                    field.sub_mul_assign(&mut self[(rr, c)], &factor, &e)?;
                }
            }

            pivots.record(r, lead);
            r += 1;
            lead += 1;
        }

        Ok(pivots)
    }

    /// Take ownership of the matrix, row-reduce it, and hand it back with its pivots.
    pub fn into_row_reduced(mut self) -> Result<(Matrix<F>, PivotMap), ArithmeticError> {
        let pivots = self.row_reduce()?;
        Ok((self, pivots))
    }

    /// Get the rank of the matrix.
    pub fn rank(&self) -> Result<usize, ArithmeticError> {
        let pivots = self.clone().row_reduce()?;
        Ok(pivots.rank(self.shape.1))
    }

    /// Check if the matrix is in reduced row-echelon form.
    pub fn is_row_reduced(&self) -> bool {
        let mut last_lead: Option<u32> = None;
        let mut seen_zero_row = false;

        for r in 0..self.shape.0 {
            let Some(lead) = (0..self.shape.1).find(|&c| !F::is_zero(&self[(r, c)])) else {
                seen_zero_row = true;
                continue;
            };

            if seen_zero_row
                || last_lead.is_some_and(|l| lead <= l)
                || !self.field.is_one(&self[(r, lead)])
                || (0..self.shape.0).any(|rr| rr != r && !F::is_zero(&self[(rr, lead)]))
            {
                return false;
            }

            last_lead = Some(lead);
        }

        true
    }

    /// Compute the determinant of a square matrix.
    pub fn det(&self) -> Result<F::Element, MatrixError> {
        if self.shape.0 != self.shape.1 {
            return Err(MatrixError::NotSquare {
                rows: self.shape.0,
                cols: self.shape.1,
            });
        }

        let n = self.shape.0;
        let field = self.field;
        let mut m = self.clone();
        let mut det = field.one();

        for j in 0..n {
            let Some(k) = (j..n).find(|&k| !F::is_zero(&m[(k, j)])) else {
                return Ok(field.zero());
            };

            if k != j {
                m.swap_rows(j, k);
                det = field.neg(&det)?;
            }

            let pivot = m[(j, j)].clone();
            field.mul_assign(&mut det, &pivot)?;

            let inv_pivot = field.inv(&pivot)?;
            for k in j + 1..n {
                if F::is_zero(&m[(k, j)]) {
                    continue;
                }

                let s = field.mul(&m[(k, j)], &inv_pivot)?;
                for l in j..n {
                    let e = m[(j, l)].clone();
                    field.sub_mul_assign(&mut m[(k, l)], &s, &e)?;
                }
            }
        }

        Ok(det)
    }
}
