#![allow(non_snake_case)]

use super::*;

/// Dense LU factorization engine over LAPACK ?getrf/?getrs.
pub struct LUEngine<T> {
    n: usize,
    LU: Matrix<T>,
    ipiv: Vec<i32>,
}

impl<T> LUEngine<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            n,
            LU: Matrix::zeros((n, n)),
            ipiv: vec![0; n],
        }
    }

    pub fn factor(&mut self, A: &Matrix<T>) -> Result<(), DenseFactorizationError> {
        if !A.is_square() || A.nrows() != self.n {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        if self.n == 0 {
            return Ok(());
        }
        self.LU.data_mut().copy_from(A.data());

        let n = self.n as i32;
        let info = &mut 0_i32;
        T::xgetrf(n, n, self.LU.data_mut(), n, &mut self.ipiv, info);

        if *info != 0 {
            return Err(DenseFactorizationError::LU(*info));
        }
        Ok(())
    }

    /// Solve in place for a single right-hand side.
    pub fn solve(&self, b: &mut [T]) {
        assert_eq!(b.len(), self.n);
        if b.is_empty() {
            return;
        }
        let n = self.n as i32;
        let info = &mut 0_i32;
        T::xgetrs(
            MatrixShape::N.as_blas_char(),
            n,
            1,
            &self.LU.data,
            n,
            &self.ipiv,
            b,
            n,
            info,
        );
        debug_assert_eq!(*info, 0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lu_solve() {
        let A = Matrix::from(&[[0.0, 2.0, 1.0], [1.0, 0.0, -1.0], [3.0, 1.0, 0.0]]);
        let x = [1.0, -2.0, 3.0];
        let mut b = [0.0; 3];
        A.gemv(MatrixShape::N, &mut b, &x, 1.0, 0.0);

        let mut eng = LUEngine::<f64>::new(3);
        assert!(eng.factor(&A).is_ok());
        eng.solve(&mut b);
        assert!(b.norm_inf_diff(&x) < 1e-12);
    }

    #[test]
    fn test_lu_singular() {
        let A = Matrix::from(&[[1.0, 2.0], [2.0, 4.0]]);
        let mut eng = LUEngine::<f64>::new(2);
        assert!(matches!(eng.factor(&A), Err(DenseFactorizationError::LU(_))));
    }
}
