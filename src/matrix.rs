//! Dense matrices over GF(2^8)
//!
//! Row-major storage of [`Gf8`] elements with the operations Reed-Solomon
//! coding needs: multiply, augment, submatrix, elementary row operations and
//! Gauss-Jordan inversion. All fallible operations return [`MatrixError`]
//! values; nothing in here panics on bad shapes or indices.

use crate::galois::Gf8;
use thiserror::Error;

/// Which dimension an out-of-range index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Errors from matrix construction and manipulation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// An index exceeds the matrix dimensions
    #[error("no such {axis}: index {index}, bound {bound}")]
    OutOfRange {
        axis: Axis,
        index: usize,
        bound: usize,
    },

    /// Operand shapes are incompatible
    #[error("shape mismatch in {op}: {left_rows}x{left_cols} against {right_rows}x{right_cols}")]
    ShapeMismatch {
        op: &'static str,
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    /// Gauss-Jordan elimination found no usable pivot
    #[error("matrix is singular")]
    Singular,
}

/// Dense row-major matrix of GF(2^8) elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    data: Vec<Gf8>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a zero matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![Gf8::ZERO; rows * cols],
            rows,
            cols,
        }
    }

    /// Create an identity matrix of the given size.
    pub fn identity(size: usize) -> Self {
        let mut m = Self::new(size, size);
        for i in 0..size {
            m.data[i * size + i] = Gf8::ONE;
        }
        m
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn at(&self, r: usize, c: usize) -> Gf8 {
        self.data[r * self.cols + c]
    }

    #[inline]
    fn at_mut(&mut self, r: usize, c: usize) -> &mut Gf8 {
        &mut self.data[r * self.cols + c]
    }

    fn check_row(&self, r: usize) -> Result<(), MatrixError> {
        if r >= self.rows {
            return Err(MatrixError::OutOfRange {
                axis: Axis::Row,
                index: r,
                bound: self.rows,
            });
        }
        Ok(())
    }

    fn check_col(&self, c: usize) -> Result<(), MatrixError> {
        if c >= self.cols {
            return Err(MatrixError::OutOfRange {
                axis: Axis::Column,
                index: c,
                bound: self.cols,
            });
        }
        Ok(())
    }

    /// Get the element at (row, col).
    pub fn get(&self, r: usize, c: usize) -> Result<Gf8, MatrixError> {
        self.check_row(r)?;
        self.check_col(c)?;
        Ok(self.at(r, c))
    }

    /// Set the element at (row, col).
    pub fn set(&mut self, r: usize, c: usize, value: Gf8) -> Result<(), MatrixError> {
        self.check_row(r)?;
        self.check_col(c)?;
        *self.at_mut(r, c) = value;
        Ok(())
    }

    /// Borrow one row as a slice of field elements.
    pub fn row(&self, r: usize) -> Result<&[Gf8], MatrixError> {
        self.check_row(r)?;
        Ok(&self.data[r * self.cols..(r + 1) * self.cols])
    }

    /// Borrow one row mutably.
    pub fn row_mut(&mut self, r: usize) -> Result<&mut [Gf8], MatrixError> {
        self.check_row(r)?;
        Ok(&mut self.data[r * self.cols..(r + 1) * self.cols])
    }

    /// Borrow one row as raw coefficient bytes for the coding kernel.
    pub fn row_bytes(&self, r: usize) -> Result<&[u8], MatrixError> {
        Ok(bytemuck::cast_slice(self.row(r)?))
    }

    /// Standard matrix multiply with `+` = XOR and `*` = field multiply.
    pub fn times(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::ShapeMismatch {
                op: "times",
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: rhs.rows,
                right_cols: rhs.cols,
            });
        }
        let mut result = Matrix::new(self.rows, rhs.cols);
        for r in 0..self.rows {
            for c in 0..rhs.cols {
                let mut value = Gf8::ZERO;
                for i in 0..self.cols {
                    value += self.at(r, i) * rhs.at(i, c);
                }
                *result.at_mut(r, c) = value;
            }
        }
        Ok(result)
    }

    /// Horizontal concatenation `[self | rhs]`.
    pub fn augment(&self, rhs: &Matrix) -> Result<Matrix, MatrixError> {
        if self.rows != rhs.rows {
            return Err(MatrixError::ShapeMismatch {
                op: "augment",
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: rhs.rows,
                right_cols: rhs.cols,
            });
        }
        let mut result = Matrix::new(self.rows, self.cols + rhs.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                *result.at_mut(r, c) = self.at(r, c);
            }
            for c in 0..rhs.cols {
                *result.at_mut(r, self.cols + c) = rhs.at(r, c);
            }
        }
        Ok(result)
    }

    /// Half-open row/column slice `[rmin, rmax) x [cmin, cmax)`, freshly allocated.
    pub fn submatrix(
        &self,
        rmin: usize,
        cmin: usize,
        rmax: usize,
        cmax: usize,
    ) -> Result<Matrix, MatrixError> {
        if rmax > self.rows || rmin > rmax {
            return Err(MatrixError::OutOfRange {
                axis: Axis::Row,
                index: rmax,
                bound: self.rows,
            });
        }
        if cmax > self.cols || cmin > cmax {
            return Err(MatrixError::OutOfRange {
                axis: Axis::Column,
                index: cmax,
                bound: self.cols,
            });
        }
        let mut result = Matrix::new(rmax - rmin, cmax - cmin);
        for r in rmin..rmax {
            for c in cmin..cmax {
                *result.at_mut(r - rmin, c - cmin) = self.at(r, c);
            }
        }
        Ok(result)
    }

    /// Swap two rows in place.
    pub fn swap_rows(&mut self, r1: usize, r2: usize) -> Result<(), MatrixError> {
        self.check_row(r1)?;
        self.check_row(r2)?;
        if r1 == r2 {
            return Ok(());
        }
        for c in 0..self.cols {
            self.data.swap(r1 * self.cols + c, r2 * self.cols + c);
        }
        Ok(())
    }

    /// Scale one row by a field element.
    pub fn multiply_row(&mut self, r: usize, scalar: Gf8) -> Result<(), MatrixError> {
        self.check_row(r)?;
        for c in 0..self.cols {
            let v = self.at(r, c);
            *self.at_mut(r, c) = v * scalar;
        }
        Ok(())
    }

    /// Row operation `dst <- dst + src * scale` (elementwise, `+` = XOR).
    pub fn row_linear_combination(
        &mut self,
        dst: usize,
        src: usize,
        scale: Gf8,
    ) -> Result<(), MatrixError> {
        self.check_row(dst)?;
        self.check_row(src)?;
        for c in 0..self.cols {
            let s = self.at(src, c);
            *self.at_mut(dst, c) += s * scale;
        }
        Ok(())
    }

    /// Invert a square matrix via Gauss-Jordan elimination on `[self | I]`.
    ///
    /// The pivot search takes the first non-zero row below the diagonal:
    /// arithmetic in GF(2^8) is exact, so there is no numeric reason to
    /// prefer a larger pivot.
    pub fn invert(&self) -> Result<Matrix, MatrixError> {
        if self.rows != self.cols {
            return Err(MatrixError::ShapeMismatch {
                op: "invert",
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: self.cols,
                right_cols: self.cols,
            });
        }
        let mut work = self.augment(&Matrix::identity(self.rows))?;
        work.gauss_jordan()?;
        // work is now [I | self^-1]
        work.submatrix(0, self.rows, self.rows, self.rows * 2)
    }

    fn gauss_jordan(&mut self) -> Result<(), MatrixError> {
        for pivot in 0..self.rows {
            if self.at(pivot, pivot).is_zero() {
                let below = (pivot + 1..self.rows).find(|&r| !self.at(r, pivot).is_zero());
                match below {
                    Some(r) => self.swap_rows(pivot, r)?,
                    None => return Err(MatrixError::Singular),
                }
            }
            let diag = self.at(pivot, pivot);
            if diag != Gf8::ONE {
                let scale = Gf8::ONE.checked_div(diag).ok_or(MatrixError::Singular)?;
                self.multiply_row(pivot, scale)?;
            }
            for d in 0..self.rows {
                if d == pivot {
                    continue;
                }
                let factor = self.at(d, pivot);
                if !factor.is_zero() {
                    self.row_linear_combination(d, pivot, factor)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_rows(rows: &[&[u8]]) -> Matrix {
        let mut m = Matrix::new(rows.len(), rows[0].len());
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                m.set(r, c, Gf8::new(v)).unwrap();
            }
        }
        m
    }

    #[test]
    fn identity_has_ones_on_diagonal() {
        let id = Matrix::identity(4);
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { Gf8::ONE } else { Gf8::ZERO };
                assert_eq!(id.get(r, c).unwrap(), expected);
            }
        }
    }

    #[test]
    fn get_set_roundtrip() {
        let mut m = Matrix::new(2, 3);
        m.set(1, 2, Gf8::new(99)).unwrap();
        assert_eq!(m.get(1, 2).unwrap(), Gf8::new(99));
        assert_eq!(m.get(0, 0).unwrap(), Gf8::ZERO);
    }

    #[test]
    fn indexing_reports_out_of_range() {
        let mut m = Matrix::new(2, 3);
        assert_eq!(
            m.get(2, 0),
            Err(MatrixError::OutOfRange {
                axis: Axis::Row,
                index: 2,
                bound: 2
            })
        );
        assert_eq!(
            m.set(0, 3, Gf8::ONE),
            Err(MatrixError::OutOfRange {
                axis: Axis::Column,
                index: 3,
                bound: 3
            })
        );
        assert!(m.row(5).is_err());
        assert!(m.swap_rows(0, 2).is_err());
    }

    #[test]
    fn times_identity_is_noop() {
        let m = from_rows(&[&[1, 2, 3], &[4, 5, 6]]);
        assert_eq!(m.times(&Matrix::identity(3)).unwrap(), m);
    }

    #[test]
    fn times_rejects_mismatched_shapes() {
        let a = Matrix::new(2, 3);
        let b = Matrix::new(2, 3);
        assert!(matches!(
            a.times(&b),
            Err(MatrixError::ShapeMismatch { op: "times", .. })
        ));
    }

    #[test]
    fn times_small_example() {
        // [1 2] [5 6]   [1*5+2*7  1*6+2*8]
        // [3 4] [7 8] = [3*5+4*7  3*6+4*8]   with GF(2^8) arithmetic
        let a = from_rows(&[&[1, 2], &[3, 4]]);
        let b = from_rows(&[&[5, 6], &[7, 8]]);
        let product = a.times(&b).unwrap();
        let g = Gf8::new;
        assert_eq!(product.get(0, 0).unwrap(), g(1) * g(5) + g(2) * g(7));
        assert_eq!(product.get(0, 1).unwrap(), g(1) * g(6) + g(2) * g(8));
        assert_eq!(product.get(1, 0).unwrap(), g(3) * g(5) + g(4) * g(7));
        assert_eq!(product.get(1, 1).unwrap(), g(3) * g(6) + g(4) * g(8));
    }

    #[test]
    fn augment_and_submatrix() {
        let a = from_rows(&[&[1, 2], &[3, 4]]);
        let b = from_rows(&[&[5], &[6]]);
        let wide = a.augment(&b).unwrap();
        assert_eq!(wide.cols(), 3);
        assert_eq!(wide.get(0, 2).unwrap(), Gf8::new(5));
        assert_eq!(wide.submatrix(0, 0, 2, 2).unwrap(), a);
        assert_eq!(wide.submatrix(0, 2, 2, 3).unwrap(), b);
        assert!(wide.submatrix(0, 0, 3, 2).is_err());
        assert!(a.augment(&Matrix::new(3, 1)).is_err());
    }

    #[test]
    fn row_operations() {
        let mut m = from_rows(&[&[1, 2], &[3, 4]]);
        m.swap_rows(0, 1).unwrap();
        assert_eq!(m.row(0).unwrap(), &[Gf8::new(3), Gf8::new(4)]);

        m.multiply_row(0, Gf8::new(2)).unwrap();
        assert_eq!(m.get(0, 0).unwrap(), Gf8::new(3) * Gf8::new(2));

        let before = m.get(1, 0).unwrap();
        let src = m.get(0, 0).unwrap();
        m.row_linear_combination(1, 0, Gf8::new(7)).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), before + src * Gf8::new(7));
    }

    #[test]
    fn row_bytes_exposes_coefficients() {
        let m = from_rows(&[&[9, 0, 255]]);
        assert_eq!(m.row_bytes(0).unwrap(), &[9, 0, 255]);
    }

    #[test]
    fn invert_roundtrip() {
        let m = from_rows(&[&[56, 23, 98], &[3, 100, 200], &[45, 201, 123]]);
        let inverse = m.invert().unwrap();
        assert_eq!(m.times(&inverse).unwrap(), Matrix::identity(3));
        assert_eq!(inverse.times(&m).unwrap(), Matrix::identity(3));
    }

    #[test]
    fn invert_identity_is_identity() {
        let id = Matrix::identity(5);
        assert_eq!(id.invert().unwrap(), id);
    }

    #[test]
    fn invert_needs_row_swap() {
        // Zero on the first diagonal position forces a pivot swap.
        let m = from_rows(&[&[0, 1], &[1, 0]]);
        let inverse = m.invert().unwrap();
        assert_eq!(m.times(&inverse).unwrap(), Matrix::identity(2));
    }

    #[test]
    fn invert_detects_singular() {
        let zero = Matrix::new(3, 3);
        assert_eq!(zero.invert(), Err(MatrixError::Singular));

        // Two identical rows are linearly dependent.
        let dependent = from_rows(&[&[1, 2], &[1, 2]]);
        assert_eq!(dependent.invert(), Err(MatrixError::Singular));
    }

    #[test]
    fn invert_rejects_non_square() {
        let m = Matrix::new(2, 3);
        assert!(matches!(
            m.invert(),
            Err(MatrixError::ShapeMismatch { op: "invert", .. })
        ));
    }
}
