//! Linear algebra layer for the solver.
//!
//! All numerical kernels used by the cone library and the system solvers
//! live here: vector math on slices, a column-major dense matrix type with
//! BLAS-backed products, a compressed sparse column type, the svec/smat
//! scaled vectorization of symmetric matrices, and factorization engines
//! (Cholesky, symmetric eigen, SVD, LU, pivoted QR, sparse LDLᵀ).

mod blas;
mod cholesky;
mod csc;
mod dense;
mod eigen;
mod floats;
mod lu;
mod qr;
mod scalarmath;
mod sparseldl;
mod svd;
mod svec;
mod vecmath;

pub use blas::*;
pub use cholesky::*;
pub use csc::*;
pub use dense::*;
pub use eigen::*;
pub use floats::*;
pub use lu::*;
pub use qr::*;
pub use scalarmath::*;
pub use sparseldl::*;
pub use svd::*;
pub use svec::*;
pub use vecmath::*;

use thiserror::Error;

/// Apply a matrix as-is or transposed.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub enum MatrixShape {
    N,
    T,
}

impl MatrixShape {
    pub fn as_blas_char(&self) -> u8 {
        match self {
            MatrixShape::N => b'N',
            MatrixShape::T => b'T',
        }
    }
}

/// Reference an upper or lower triangle.
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub enum MatrixTriangle {
    Triu,
    Tril,
}

impl MatrixTriangle {
    pub fn as_blas_char(&self) -> u8 {
        match self {
            MatrixTriangle::Triu => b'U',
            MatrixTriangle::Tril => b'L',
        }
    }
}

/// Errors from dense factorization engines.
#[derive(Error, Debug)]
pub enum DenseFactorizationError {
    #[error("Matrix dimensions are incompatible")]
    IncompatibleDimension,
    #[error("Matrix is not positive definite (potrf info = {0})")]
    Cholesky(i32),
    #[error("Eigendecomposition failed (syevr info = {0})")]
    Eigen(i32),
    #[error("SVD failed (gesdd info = {0})")]
    SVD(i32),
    #[error("LU factorization is singular (getrf info = {0})")]
    LU(i32),
    #[error("QR factorization failed (geqp3 info = {0})")]
    QR(i32),
}
