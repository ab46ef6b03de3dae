#![allow(non_snake_case)]

use super::*;

/// QR-Cholesky system solver; requires preprocessing.
///
/// With the retained factorization `Aᵀ = Q R`, `Q = [Q₁ Q₂]`, directions
/// split as `dx = Q₁a + Q₂b` with `a` fixed by the equality rows.  The
/// remaining system over `b` is `(GQ₂)ᵀ Λ⁻¹ (GQ₂) b = rhs`, which is
/// symmetric positive definite and factored with dense Cholesky once per
/// iteration.  `GQ₁` and `GQ₂` are formed once per solve.
pub struct QRCholSolver<T: FloatT> {
    n: usize,
    p: usize,
    q: usize,
    n2: usize,

    Q1: Matrix<T>,
    Q2: Matrix<T>,
    R: Matrix<T>,
    GQ1: Matrix<T>,
    GQ2: Matrix<T>,
    LGQ2: Matrix<T>,
    S: Matrix<T>,
    chol: CholeskyEngine<T>,

    workq: Vec<T>,
    workq2: Vec<T>,
    workn: Vec<T>,
    workdx: Vec<T>,
    workp: Vec<T>,
    workn2: Vec<T>,
}

impl<T> QRCholSolver<T>
where
    T: FloatT,
{
    pub fn new(
        data: &ProblemData<T>,
        _cone_idxs: &[Range<usize>],
        Q1: Matrix<T>,
        Q2: Matrix<T>,
        R: Matrix<T>,
    ) -> Result<Self, LinSysError> {
        let (n, p, q) = (data.n(), data.p(), data.q());
        let n2 = n - p;
        assert!(Q1.nrows() == n && Q1.ncols() == p);
        assert!(Q2.nrows() == n && Q2.ncols() == n2);
        assert!(R.nrows() == p && R.ncols() == p);

        // GQ1, GQ2 column by column (G may be sparse)
        let mut GQ1 = Matrix::zeros((q, p));
        for j in 0..p {
            data.G
                .gemv(MatrixShape::N, GQ1.col_slice_mut(j), Q1.col_slice(j), T::one(), T::zero());
        }
        let mut GQ2 = Matrix::zeros((q, n2));
        for j in 0..n2 {
            data.G
                .gemv(MatrixShape::N, GQ2.col_slice_mut(j), Q2.col_slice(j), T::one(), T::zero());
        }

        Ok(Self {
            n,
            p,
            q,
            n2,
            Q1,
            Q2,
            R,
            GQ1,
            GQ2,
            LGQ2: Matrix::zeros((q, n2)),
            S: Matrix::zeros((n2, n2)),
            chol: CholeskyEngine::new(n2),
            workq: vec![T::zero(); q],
            workq2: vec![T::zero(); q],
            workn: vec![T::zero(); n],
            workdx: vec![T::zero(); n],
            workp: vec![T::zero(); p],
            workn2: vec![T::zero(); n2],
        })
    }

    // v := Λ⁻¹ v per cone (∇²F for primal-barrier cones, ∇²F⁻¹ for
    // dual-barrier ones), out-of-place through `out`
    fn apply_lambda_inv(
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        out: &mut [T],
        v: &[T],
    ) -> Result<(), LinSysError> {
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rng = rng.clone();
            if cone.use_dual_barrier() {
                if !cone.inv_hess_prod(&mut out[rng.clone()], &v[rng]) {
                    return Err(LinSysError::ConeHessian);
                }
            } else {
                cone.hess_prod(&mut out[rng.clone()], &v[rng]);
            }
        }
        Ok(())
    }

    pub fn refactor(
        &mut self,
        _data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
    ) -> Result<(), LinSysError> {
        // LGQ2 = Λ⁻¹ GQ2, then S = (GQ2)ᵀ LGQ2
        for j in 0..self.n2 {
            self.workq.copy_from(self.GQ2.col_slice(j));
            Self::apply_lambda_inv(cones, cone_idxs, &mut self.workq2, &self.workq)?;
            self.LGQ2.col_slice_mut(j).copy_from(&self.workq2);
        }
        self.S
            .gemm(MatrixShape::T, MatrixShape::N, &self.GQ2, &self.LGQ2, T::one(), T::zero());
        self.chol
            .factor(&self.S)
            .map_err(|e| LinSysError::Factorization(e.to_string()))
    }

    pub fn solve3(
        &mut self,
        _data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        x: &mut [T],
        y: &mut [T],
        z: &mut [T],
    ) -> Result<(), LinSysError> {
        let (p, n2) = (self.p, self.n2);

        // a from the equality rows:  Rᵀ a = u2
        self.workp.copy_from(y);
        if p > 0 {
            let info = &mut 0_i32;
            T::xtrtrs(
                MatrixTriangle::Triu.as_blas_char(),
                MatrixShape::T.as_blas_char(),
                b'N',
                p as i32,
                1,
                &self.R.data,
                p as i32,
                &mut self.workp,
                p as i32,
                info,
            );
            if *info != 0 {
                return Err(LinSysError::Singular);
            }
        }

        // reduced right-hand side:
        //   S b = Q2ᵀ u1 + (LGQ2)ᵀ u3 - (GQ2)ᵀ Λ⁻¹ (GQ1 a)
        self.Q2.gemv(MatrixShape::T, &mut self.workn2, x, T::one(), T::zero());
        self.LGQ2.gemv(MatrixShape::T, &mut self.workn2, z, T::one(), T::one());
        if p > 0 {
            self.GQ1
                .gemv(MatrixShape::N, &mut self.workq, &self.workp, T::one(), T::zero());
            Self::apply_lambda_inv(cones, cone_idxs, &mut self.workq2, &self.workq)?;
            self.GQ2
                .gemv(MatrixShape::T, &mut self.workn2, &self.workq2, -T::one(), T::one());
        }
        if n2 > 0 {
            self.chol.solve(&mut self.workn2);
        }

        // dx = Q1 a + Q2 b, kept aside while x still holds u1
        self.workdx.set(T::zero());
        if p > 0 {
            self.Q1
                .gemv(MatrixShape::N, &mut self.workdx, &self.workp, T::one(), T::zero());
        }
        self.Q2
            .gemv(MatrixShape::N, &mut self.workdx, &self.workn2, T::one(), T::one());

        // dz = Λ⁻¹ (G dx - u3)
        _data
            .G
            .gemv(MatrixShape::N, &mut self.workq, &self.workdx, T::one(), T::zero());
        for i in 0..self.q {
            self.workq[i] -= z[i];
        }
        Self::apply_lambda_inv(cones, cone_idxs, &mut self.workq2, &self.workq)?;
        z.copy_from(&self.workq2);

        // dy from the retained factor:  R dy = Q1ᵀ(u1 - Gᵀ dz)
        if p > 0 {
            _data.G.gemv(MatrixShape::T, &mut self.workn, z, T::one(), T::zero());
            for i in 0..self.n {
                self.workn[i] = x[i] - self.workn[i];
            }
            self.Q1
                .gemv(MatrixShape::T, &mut self.workp, &self.workn, T::one(), T::zero());
            let info = &mut 0_i32;
            T::xtrtrs(
                MatrixTriangle::Triu.as_blas_char(),
                MatrixShape::N.as_blas_char(),
                b'N',
                p as i32,
                1,
                &self.R.data,
                p as i32,
                &mut self.workp,
                p as i32,
                info,
            );
            if *info != 0 {
                return Err(LinSysError::Singular);
            }
            y.copy_from(&self.workp);
        }

        x.copy_from(&self.workdx);
        Ok(())
    }
}
