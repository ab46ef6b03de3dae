#![allow(non_snake_case)]

use super::*;

/// Column-pivoted QR factorization engine over LAPACK ?geqp3.
///
/// Factors A·P = Q·R and supports the rank-revealing uses the solver
/// needs: rank estimation from the diagonal of R, least-squares solves
/// for tall systems, minimum-norm solves for wide systems (factor the
/// transpose), and materialization of Q columns for null-space bases.
pub struct PivotedQREngine<T> {
    m: usize,
    n: usize,
    QR: Matrix<T>,
    τ: Vec<T>,
    /// 0-based pivot map: column j of the factored A·P is column
    /// `jpvt[j]` of A
    pub jpvt: Vec<usize>,
    work: Vec<T>,
}

impl<T> PivotedQREngine<T>
where
    T: FloatT,
{
    pub fn new(size: (usize, usize)) -> Self {
        let (m, n) = size;
        Self {
            m,
            n,
            QR: Matrix::zeros((m, n)),
            τ: vec![T::zero(); m.min(n)],
            jpvt: vec![0; n],
            work: vec![T::zero(); 1],
        }
    }

    pub fn nrows(&self) -> usize {
        self.m
    }
    pub fn ncols(&self) -> usize {
        self.n
    }

    pub fn factor(&mut self, A: &Matrix<T>) -> Result<(), DenseFactorizationError> {
        if A.nrows() != self.m || A.ncols() != self.n {
            return Err(DenseFactorizationError::IncompatibleDimension);
        }
        let (m, n) = (self.m, self.n);
        if m == 0 || n == 0 {
            return Ok(());
        }
        self.QR.data_mut().copy_from(A.data());

        let (am, an) = (m as i32, n as i32);
        let mut jpvt_i32 = vec![0_i32; n]; // 0 = free pivoting for all columns
        let info = &mut 0_i32;

        for pass in 0..2 {
            let lwork = if pass == 0 { -1 } else { self.work[0].to_i32().unwrap() };
            if pass == 1 {
                self.work.resize(lwork as usize, T::zero());
            }
            T::xgeqp3(
                am,
                an,
                self.QR.data_mut(),
                am,
                &mut jpvt_i32,
                &mut self.τ,
                &mut self.work,
                lwork,
                info,
            );
            if *info != 0 {
                return Err(DenseFactorizationError::QR(*info));
            }
        }

        for (j, &p) in jpvt_i32.iter().enumerate() {
            self.jpvt[j] = (p - 1) as usize; // LAPACK pivots are 1-based
        }
        Ok(())
    }

    /// Estimated rank: the number of diagonal entries of R with magnitude
    /// above `tol * max(1, |R₀₀|)`.
    pub fn rank(&self, tol: T) -> usize {
        let k = self.m.min(self.n);
        if k == 0 {
            return 0;
        }
        let thresh = tol * T::max(T::one(), T::abs(self.QR[(0, 0)]));
        (0..k)
            .take_while(|&i| T::abs(self.QR[(i, i)]) > thresh)
            .count()
    }

    /// Apply Qᵀ (trans) or Q to `b` in place; `b` has length m.
    fn apply_q(&mut self, b: &mut [T], shape: MatrixShape) {
        assert_eq!(b.len(), self.m);
        let k = self.m.min(self.n);
        if k == 0 {
            return;
        }
        let am = self.m as i32;
        let info = &mut 0_i32;
        for pass in 0..2 {
            let lwork = if pass == 0 { -1 } else { self.work[0].to_i32().unwrap() };
            if pass == 1 && (lwork as usize) > self.work.len() {
                self.work.resize(lwork as usize, T::zero());
            }
            T::xormqr(
                b'L',
                shape.as_blas_char(),
                am,
                1,
                k as i32,
                &self.QR.data,
                am,
                &self.τ,
                b,
                am,
                &mut self.work,
                lwork,
                info,
            );
            debug_assert_eq!(*info, 0);
        }
    }

    /// Least-squares solution of A x = b using the leading `rank` pivots;
    /// requires m ≥ rank.  `x` (length n) is written in the original
    /// (unpivoted) column order, with dropped pivots set to zero.
    pub fn solve_ls(&mut self, b: &[T], x: &mut [T], rank: usize, work: &mut Vec<T>) {
        assert!(b.len() == self.m && x.len() == self.n && rank <= self.m.min(self.n));
        work.resize(self.m, T::zero());
        work.copy_from_slice(b);

        // w = (Qᵀ b)[0..rank], then back-solve R[0..rank, 0..rank]
        self.apply_q(work, MatrixShape::T);
        if rank > 0 {
            let info = &mut 0_i32;
            T::xtrtrs(
                MatrixTriangle::Triu.as_blas_char(),
                MatrixShape::N.as_blas_char(),
                b'N',
                rank as i32,
                1,
                &self.QR.data,
                self.m as i32,
                &mut work[0..rank],
                rank as i32,
                info,
            );
            debug_assert_eq!(*info, 0);
        }

        x.set(T::zero());
        for j in 0..rank {
            x[self.jpvt[j]] = work[j];
        }
    }

    /// Minimum-norm solution of W x = b where this engine holds the QR of
    /// Wᵀ (so W is wide and the factored matrix is tall).  `b` has the row
    /// dimension of W (= self.n) and `x` its column dimension (= self.m).
    pub fn solve_min_norm(&mut self, b: &[T], x: &mut [T], rank: usize, work: &mut Vec<T>) {
        assert!(b.len() == self.n && x.len() == self.m && rank <= self.m.min(self.n));

        // Wᵀ·P = Q·R  ⇒  W = P·Rᵀ·Qᵀ, so solve Rᵀ w = Pᵀ b and set x = Q [w; 0]
        work.resize(self.m, T::zero());
        work.set(T::zero());
        for j in 0..rank {
            work[j] = b[self.jpvt[j]];
        }
        if rank > 0 {
            let info = &mut 0_i32;
            T::xtrtrs(
                MatrixTriangle::Triu.as_blas_char(),
                MatrixShape::T.as_blas_char(),
                b'N',
                rank as i32,
                1,
                &self.QR.data,
                self.m as i32,
                &mut work[0..rank],
                rank as i32,
                info,
            );
            debug_assert_eq!(*info, 0);
        }
        self.apply_q(work, MatrixShape::N);
        x.copy_from(work);
    }

    /// Materialize the full m × m orthogonal factor Q.
    pub fn q_full(&self) -> Matrix<T> {
        let m = self.m;
        let k = self.m.min(self.n);
        let mut Q = Matrix::<T>::zeros((m, m));
        if m == 0 {
            return Q;
        }
        if k == 0 {
            Q.set_identity();
            return Q;
        }
        // copy the reflectors into the leading columns, then orgqr
        for j in 0..k {
            Q.col_slice_mut(j).copy_from(self.QR.col_slice(j));
        }
        let am = m as i32;
        let info = &mut 0_i32;
        let mut work = vec![T::zero(); 1];
        for pass in 0..2 {
            let lwork = if pass == 0 { -1 } else { work[0].to_i32().unwrap() };
            if pass == 1 {
                work.resize(lwork as usize, T::zero());
            }
            T::xorgqr(
                am,
                am,
                k as i32,
                Q.data_mut(),
                am,
                &self.τ,
                &mut work,
                lwork,
                info,
            );
            debug_assert_eq!(*info, 0);
        }
        Q
    }

    /// R entry (i, j) of the factored matrix, i ≤ j < min(m,n).
    pub fn r_entry(&self, i: usize, j: usize) -> T {
        debug_assert!(i <= j);
        self.QR[(i, j)]
    }

    /// Solve R[0..rank, 0..rank] (or its transpose) against `b` in place.
    pub fn solve_r(&self, b: &mut [T], rank: usize, shape: MatrixShape) {
        assert!(b.len() >= rank);
        if rank == 0 {
            return;
        }
        let info = &mut 0_i32;
        T::xtrtrs(
            MatrixTriangle::Triu.as_blas_char(),
            shape.as_blas_char(),
            b'N',
            rank as i32,
            1,
            &self.QR.data,
            self.m as i32,
            &mut b[0..rank],
            rank as i32,
            info,
        );
        debug_assert_eq!(*info, 0);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_qr_least_squares() {
        // overdetermined consistent system
        let A = Matrix::from(&[[1.0, 0.0], [1.0, 1.0], [0.0, 2.0]]);
        let xtrue = [2.0, -1.0];
        let mut b = [0.0; 3];
        A.gemv(MatrixShape::N, &mut b, &xtrue, 1.0, 0.0);

        let mut eng = PivotedQREngine::<f64>::new((3, 2));
        assert!(eng.factor(&A).is_ok());
        assert_eq!(eng.rank(1e-12), 2);

        let mut x = [0.0; 2];
        let mut work = Vec::new();
        eng.solve_ls(&b, &mut x, 2, &mut work);
        assert!(x.norm_inf_diff(&xtrue) < 1e-12);
    }

    #[test]
    fn test_qr_rank_deficient() {
        // second column is a multiple of the first
        let A = Matrix::from(&[[1.0, 2.0], [1.0, 2.0], [1.0, 2.0]]);
        let mut eng = PivotedQREngine::<f64>::new((3, 2));
        assert!(eng.factor(&A).is_ok());
        assert_eq!(eng.rank(1e-10), 1);
    }

    #[test]
    fn test_qr_min_norm() {
        // wide system W x = b, factor Wᵀ
        let W = Matrix::from(&[[1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]);
        let mut Wt = Matrix::<f64>::zeros((3, 2));
        for i in 0..2 {
            for j in 0..3 {
                Wt[(j, i)] = W[(i, j)];
            }
        }
        let b = [1.0, 2.0];

        let mut eng = PivotedQREngine::<f64>::new((3, 2));
        assert!(eng.factor(&Wt).is_ok());

        let mut x = [0.0; 3];
        let mut work = Vec::new();
        eng.solve_min_norm(&b, &mut x, 2, &mut work);

        // solution must satisfy W x = b
        let mut r = [0.0; 2];
        W.gemv(MatrixShape::N, &mut r, &x, 1.0, 0.0);
        assert!(r.norm_inf_diff(&b) < 1e-12);

        // and be orthogonal to null(W) = span (1, 1, -1)
        assert!((x[0] + x[1] - x[2]).abs() < 1e-12);
    }

    #[test]
    fn test_q_full_orthogonal() {
        let A = Matrix::from(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let mut eng = PivotedQREngine::<f64>::new((3, 2));
        assert!(eng.factor(&A).is_ok());
        let Q = eng.q_full();
        let mut QtQ = Matrix::<f64>::zeros((3, 3));
        QtQ.gemm(MatrixShape::T, MatrixShape::N, &Q, &Q, 1.0, 0.0);
        let I = Matrix::<f64>::identity(3);
        assert!(QtQ.data().norm_inf_diff(I.data()) < 1e-12);
    }
}
