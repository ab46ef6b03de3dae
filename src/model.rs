#![allow(non_snake_case)]

//! Problem data for the conic form
//!
//!     minimize    c·x
//!     subject to  A x = b
//!                 h - G x = s,  s ∈ K
//!
//! with K an ordered product of cones over contiguous index ranges of the
//! conic constraint rows.

use crate::algebra::*;
use crate::cones::{Cone, SupportedCone};
use std::ops::Range;
use thiserror::Error;

/// Constraint matrices may be given dense or in CSC form.
pub enum ConstraintMatrix<T> {
    Dense(Matrix<T>),
    Sparse(CscMatrix<T>),
}

impl<T> ConstraintMatrix<T>
where
    T: FloatT,
{
    pub fn nrows(&self) -> usize {
        match self {
            ConstraintMatrix::Dense(M) => M.nrows(),
            ConstraintMatrix::Sparse(M) => M.m,
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            ConstraintMatrix::Dense(M) => M.ncols(),
            ConstraintMatrix::Sparse(M) => M.n,
        }
    }

    /// y = α op(self) x + β y
    pub fn gemv(&self, shape: MatrixShape, y: &mut [T], x: &[T], α: T, β: T) {
        match self {
            ConstraintMatrix::Dense(M) => M.gemv(shape, y, x, α, β),
            ConstraintMatrix::Sparse(M) => M.gemv(shape, y, x, α, β),
        }
    }

    pub fn to_dense(&self) -> Matrix<T> {
        match self {
            ConstraintMatrix::Dense(M) => M.clone(),
            ConstraintMatrix::Sparse(M) => M.to_dense(),
        }
    }

    pub fn to_csc(&self) -> CscMatrix<T> {
        match self {
            ConstraintMatrix::Dense(M) => CscMatrix::from_dense(M),
            ConstraintMatrix::Sparse(M) => M.clone(),
        }
    }

    pub fn select_columns(&self, keep: &[usize]) -> Self {
        match self {
            ConstraintMatrix::Dense(M) => {
                let mut out = Matrix::zeros((M.nrows(), keep.len()));
                for (jnew, &j) in keep.iter().enumerate() {
                    out.col_slice_mut(jnew).copy_from(M.col_slice(j));
                }
                ConstraintMatrix::Dense(out)
            }
            ConstraintMatrix::Sparse(M) => ConstraintMatrix::Sparse(M.select_columns(keep)),
        }
    }

    pub fn select_rows(&self, keep: &[usize]) -> Self {
        match self {
            ConstraintMatrix::Dense(M) => {
                let mut out = Matrix::zeros((keep.len(), M.ncols()));
                for (inew, &i) in keep.iter().enumerate() {
                    for j in 0..M.ncols() {
                        out[(inew, j)] = M[(i, j)];
                    }
                }
                ConstraintMatrix::Dense(out)
            }
            ConstraintMatrix::Sparse(M) => ConstraintMatrix::Sparse(M.select_rows(keep)),
        }
    }
}

impl<T: FloatT> From<Matrix<T>> for ConstraintMatrix<T> {
    fn from(M: Matrix<T>) -> Self {
        ConstraintMatrix::Dense(M)
    }
}

impl<T: FloatT> From<CscMatrix<T>> for ConstraintMatrix<T> {
    fn from(M: CscMatrix<T>) -> Self {
        ConstraintMatrix::Sparse(M)
    }
}

/// Errors raised while validating problem data.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("cone dimensions must cover the conic rows exactly")]
    ConeDimensionMismatch,
}

/// Numeric coefficient data, kept apart from the cones so that the
/// solver can mutate cone state while reading the coefficients.
pub struct ProblemData<T: FloatT> {
    pub c: Vec<T>,
    pub A: ConstraintMatrix<T>,
    pub b: Vec<T>,
    pub G: ConstraintMatrix<T>,
    pub h: Vec<T>,
    pub obj_offset: T,
}

impl<T> ProblemData<T>
where
    T: FloatT,
{
    pub fn n(&self) -> usize {
        self.c.len()
    }
    pub fn p(&self) -> usize {
        self.b.len()
    }
    pub fn q(&self) -> usize {
        self.h.len()
    }
}

/// Immutable coefficient data plus the ordered cone list.
pub struct Model<T: FloatT> {
    pub data: ProblemData<T>,
    pub cones: Vec<SupportedCone<T>>,
    pub cone_idxs: Vec<Range<usize>>,
}

impl<T> Model<T>
where
    T: FloatT,
{
    pub fn new(
        c: Vec<T>,
        A: impl Into<ConstraintMatrix<T>>,
        b: Vec<T>,
        G: impl Into<ConstraintMatrix<T>>,
        h: Vec<T>,
        cones: Vec<SupportedCone<T>>,
        obj_offset: T,
    ) -> Result<Self, ModelError> {
        let A = A.into();
        let G = G.into();
        let n = c.len();
        let p = b.len();
        let q = h.len();

        if A.nrows() != p || (A.ncols() != n && p > 0) {
            return Err(ModelError::DimensionMismatch(format!(
                "A is {}x{}, expected {}x{}",
                A.nrows(),
                A.ncols(),
                p,
                n
            )));
        }
        if G.nrows() != q || G.ncols() != n {
            return Err(ModelError::DimensionMismatch(format!(
                "G is {}x{}, expected {}x{}",
                G.nrows(),
                G.ncols(),
                q,
                n
            )));
        }

        let mut cone_idxs = Vec::with_capacity(cones.len());
        let mut start = 0;
        for cone in &cones {
            let stop = start + cone.dim();
            cone_idxs.push(start..stop);
            start = stop;
        }
        if start != q {
            return Err(ModelError::ConeDimensionMismatch);
        }

        Ok(Self {
            data: ProblemData {
                c,
                A,
                b,
                G,
                h,
                obj_offset,
            },
            cones,
            cone_idxs,
        })
    }

    pub fn n(&self) -> usize {
        self.data.n()
    }
    pub fn p(&self) -> usize {
        self.data.p()
    }
    pub fn q(&self) -> usize {
        self.data.q()
    }

    /// Total barrier parameter ν = Σ ν(K_k).
    pub fn nu(&self) -> T {
        self.cones.iter().fold(T::zero(), |acc, k| acc + k.nu())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cones::NonnegativeCone;

    #[test]
    fn test_model_validation() {
        let A = Matrix::<f64>::zeros((0, 2));
        let G = Matrix::from(&[[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]]);
        let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(3).into()];
        let model = Model::new(
            vec![-1.0, -1.0],
            A,
            vec![],
            G,
            vec![1.0, 1.0, -1.5],
            cones,
            0.0,
        )
        .unwrap();
        assert_eq!(model.n(), 2);
        assert_eq!(model.q(), 3);
        assert_eq!(model.cone_idxs, vec![0..3]);
        assert_eq!(model.nu(), 3.0);
    }

    #[test]
    fn test_model_rejects_bad_cone_dims() {
        let A = Matrix::<f64>::zeros((0, 2));
        let G = Matrix::from(&[[1.0, 0.0], [0.0, 1.0]]);
        let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(3).into()];
        assert!(matches!(
            Model::new(vec![0.0, 0.0], A, vec![], G, vec![0.0, 0.0], cones, 0.0),
            Err(ModelError::ConeDimensionMismatch)
        ));
    }
}
