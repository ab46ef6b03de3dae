#![allow(non_snake_case)]

use super::*;

/// SVD engine over LAPACK ?gesdd (economy form).
pub struct SVDEngine<T> {
    /// singular values, descending
    pub s: Vec<T>,
    /// left singular vectors (m × min(m,n))
    pub U: Matrix<T>,
    /// right singular vectors, transposed (min(m,n) × n)
    pub Vt: Matrix<T>,

    m: usize,
    n: usize,
    A: Matrix<T>,
    work: Vec<T>,
    iwork: Vec<i32>,
}

impl<T> SVDEngine<T>
where
    T: FloatT,
{
    pub fn new(size: (usize, usize)) -> Self {
        let (m, n) = size;
        let k = m.min(n);
        Self {
            s: vec![T::zero(); k],
            U: Matrix::zeros((m, k)),
            Vt: Matrix::zeros((k, n)),
            m,
            n,
            A: Matrix::zeros((m, n)),
            work: vec![T::zero(); 1],
            iwork: vec![0; 8 * k.max(1)],
        }
    }

    pub fn factor(&mut self, A: &Matrix<T>) -> Result<(), DenseFactorizationError> {
        if A.nrows() != self.m || A.ncols() != self.n {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        let (m, n) = (self.m, self.n);
        if m == 0 || n == 0 {
            return Ok(());
        }
        self.A.data_mut().copy_from(A.data());

        let (am, an) = (m as i32, n as i32);
        let k = m.min(n) as i32;
        let info = &mut 0_i32;

        for pass in 0..2 {
            let lwork = if pass == 0 { -1 } else { self.work[0].to_i32().unwrap() };
            if pass == 1 {
                self.work.resize(lwork as usize, T::zero());
            }
            T::xgesdd(
                b'S',
                am,
                an,
                self.A.data_mut(),
                am,
                &mut self.s,
                &mut self.U.data,
                am,
                &mut self.Vt.data,
                k,
                &mut self.work,
                lwork,
                &mut self.iwork,
                info,
            );
            if *info != 0 {
                return Err(DenseFactorizationError::SVD(*info));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_svd() {
        let A = Matrix::from(&[[1.0, 0.0], [0.0, -2.0], [0.0, 0.0]]);
        let mut eng = SVDEngine::<f64>::new((3, 2));
        assert!(eng.factor(&A).is_ok());
        assert!((eng.s[0] - 2.0).abs() < 1e-12);
        assert!((eng.s[1] - 1.0).abs() < 1e-12);
    }
}
