#![allow(non_snake_case)]

use super::*;

/// Dense Cholesky factorization engine over LAPACK ?potrf/?potrs.
pub struct CholeskyEngine<T> {
    /// lower triangular factor (stored as square dense)
    pub L: Matrix<T>,
}

impl<T> CholeskyEngine<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            L: Matrix::zeros((n, n)),
        }
    }

    pub fn n(&self) -> usize {
        self.L.nrows()
    }

    pub fn resize(&mut self, n: usize) {
        self.L.resize((n, n));
    }

    /// Factor a symmetric positive definite matrix.  Only the upper
    /// triangle of `A` is referenced; `A` itself is not modified.
    pub fn factor(&mut self, A: &Matrix<T>) -> Result<(), DenseFactorizationError> {
        if !A.is_square() || A.nrows() != self.n() {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        let n = self.n();
        if n == 0 {
            return Ok(());
        }

        // LAPACK factors tril inputs to LL^T, so copy the triu part
        // of A into tril of L before factoring
        for j in 0..n {
            for i in j..n {
                self.L[(i, j)] = A[(j, i)];
            }
        }

        let An = n as i32;
        let info = &mut 0_i32;
        T::xpotrf(
            MatrixTriangle::Tril.as_blas_char(),
            An,
            self.L.data_mut(),
            An,
            info,
        );

        if *info != 0 {
            return Err(DenseFactorizationError::Cholesky(*info));
        }
        Ok(())
    }

    /// Solve in place for a single right-hand side.
    pub fn solve(&self, b: &mut [T]) {
        assert_eq!(b.len(), self.n());
        if b.is_empty() {
            return;
        }
        let n = self.n() as i32;
        let info = &mut 0_i32;
        T::xpotrs(
            MatrixTriangle::Tril.as_blas_char(),
            n,
            1,
            &self.L.data,
            n,
            b,
            n,
            info,
        );
        debug_assert_eq!(*info, 0);
    }

    /// Solve in place for a dense block of right-hand sides.
    pub fn solve_mat(&self, B: &mut Matrix<T>) {
        assert_eq!(B.nrows(), self.n());
        if B.nrows() == 0 || B.ncols() == 0 {
            return;
        }
        let n = self.n() as i32;
        let info = &mut 0_i32;
        T::xpotrs(
            MatrixTriangle::Tril.as_blas_char(),
            n,
            B.ncols() as i32,
            &self.L.data,
            n,
            B.data_mut(),
            n,
            info,
        );
        debug_assert_eq!(*info, 0);
    }

    /// Overwrite `Ainv` with the inverse of the factored matrix.
    pub fn inverse_into(&self, Ainv: &mut Matrix<T>) {
        Ainv.set_identity();
        self.solve_mat(Ainv);
    }

    pub fn logdet(&self) -> T {
        let mut ld = T::zero();
        for i in 0..self.n() {
            ld += T::ln(self.L[(i, i)]);
        }
        ld + ld
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[rustfmt::skip]
    fn test_data() -> (Matrix<f64>, Vec<f64>, Vec<f64>) {
        let S = Matrix::from(&[
            [ 8.0, -2.0, 4.0],
            [-2.0, 12.0, 2.0],
            [ 4.0,  2.0, 6.0],
        ]);
        let x = vec![1.0, 3.0, 5.0];
        let b = vec![22.0, 44.0, 40.0];
        (S, x, b)
    }

    #[test]
    fn test_cholesky_solve_and_logdet() {
        let (S, x, mut b) = test_data();
        let mut eng = CholeskyEngine::<f64>::new(3);
        assert!(eng.factor(&S).is_ok());
        eng.solve(&mut b);
        assert!(b.norm_inf_diff(&x) < 1e-12);
        assert!((eng.logdet() - 5.69035945432406).abs() < 1e-10);
    }

    #[test]
    fn test_cholesky_not_pd() {
        let S = Matrix::from(&[[1.0, 2.0], [2.0, 1.0]]);
        let mut eng = CholeskyEngine::<f64>::new(2);
        assert!(matches!(
            eng.factor(&S),
            Err(DenseFactorizationError::Cholesky(_))
        ));
    }
}
