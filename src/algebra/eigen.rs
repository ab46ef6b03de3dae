#![allow(non_snake_case)]

use super::*;

/// Symmetric eigendecomposition engine over LAPACK ?syevr.
pub struct EigEngine<T> {
    /// computed eigenvalues in ascending order
    pub λ: Vec<T>,

    /// computed eigenvectors (columns), populated by [`EigEngine::eigen`]
    pub V: Matrix<T>,

    n: usize,
    A: Matrix<T>,
    isuppz: Vec<i32>,
    work: Vec<T>,
    iwork: Vec<i32>,
}

impl<T> EigEngine<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            λ: vec![T::zero(); n],
            V: Matrix::zeros((n, n)),
            n,
            A: Matrix::zeros((n, n)),
            isuppz: vec![0; 2 * n.max(1)],
            work: vec![T::zero(); 1],
            iwork: vec![0; 1],
        }
    }

    /// Eigenvalues only.
    pub fn eigvals(&mut self, A: &Matrix<T>) -> Result<(), DenseFactorizationError> {
        self.syevr(A, b'N')
    }

    /// Eigenvalues and eigenvectors.
    pub fn eigen(&mut self, A: &Matrix<T>) -> Result<(), DenseFactorizationError> {
        self.syevr(A, b'V')
    }

    fn syevr(&mut self, A: &Matrix<T>, jobz: u8) -> Result<(), DenseFactorizationError> {
        if !A.is_square() || A.nrows() != self.n {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        let n = self.n;
        if n == 0 {
            return Ok(());
        }

        // syevr overwrites its input
        self.A.data_mut().copy_from(A.data());

        let An = n as i32;
        let range = b'A';
        let uplo = MatrixTriangle::Triu.as_blas_char();
        let (vl, vu) = (T::zero(), T::zero());
        let (il, iu) = (0_i32, 0_i32);
        let abstol = -T::one(); // default tolerance
        let m = &mut 0_i32;
        let info = &mut 0_i32;

        // workspace query, then resize and compute
        for pass in 0..2 {
            let lwork = if pass == 0 { -1 } else { self.work[0].to_i32().unwrap() };
            let liwork = if pass == 0 { -1 } else { self.iwork[0] };
            if pass == 1 {
                self.work.resize(lwork as usize, T::zero());
                self.iwork.resize(liwork as usize, 0);
            }
            T::xsyevr(
                jobz,
                range,
                uplo,
                An,
                self.A.data_mut(),
                An,
                vl,
                vu,
                il,
                iu,
                abstol,
                m,
                &mut self.λ,
                &mut self.V.data,
                An,
                &mut self.isuppz,
                &mut self.work,
                lwork,
                &mut self.iwork,
                liwork,
                info,
            );
            if *info != 0 {
                return Err(DenseFactorizationError::Eigen(*info));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_eigen() {
        let mut A = Matrix::from(&[[3.0, 1.0], [0.0, 3.0]]);
        A.symmetrize_from_triu();
        let mut eng = EigEngine::<f64>::new(2);
        assert!(eng.eigen(&A).is_ok());
        assert!((eng.λ[0] - 2.0).abs() < 1e-12);
        assert!((eng.λ[1] - 4.0).abs() < 1e-12);

        // V diag(λ) Vᵀ reconstructs A
        let mut VL = Matrix::<f64>::zeros((2, 2));
        for j in 0..2 {
            for i in 0..2 {
                VL[(i, j)] = eng.V[(i, j)] * eng.λ[j];
            }
        }
        let mut R = Matrix::<f64>::zeros((2, 2));
        R.gemm(MatrixShape::N, MatrixShape::T, &VL, &eng.V, 1.0, 0.0);
        assert!(R.data().norm_inf_diff(A.data()) < 1e-12);
    }
}
