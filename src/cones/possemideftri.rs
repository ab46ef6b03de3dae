use super::*;

// -------------------------------------
// Positive semidefinite cone (svec triangle)
// -------------------------------------

/// `{ svec(S) : S ⪰ 0 }` with barrier `-logdet(S)`, ν = side.
///
/// Points are scaled lower-triangle vectorizations (svec).  All operators
/// have closed forms in S and S⁻¹:  ∇F = -svec(S⁻¹),
/// ∇²F·svec(V) = svec(S⁻¹ V S⁻¹), ∇²F⁻¹·svec(V) = svec(S V S).
pub struct PosSemidefTriCone<T> {
    core: ConeCore<T>,
    side: usize,
    S: Matrix<T>,
    Sinv: Matrix<T>,
    M1: Matrix<T>,
    M2: Matrix<T>,
    chol: CholeskyEngine<T>,
    chol_dual: CholeskyEngine<T>,
}

impl<T> PosSemidefTriCone<T>
where
    T: FloatT,
{
    /// `dim` is the svec length, side(side+1)/2.
    pub fn new(dim: usize) -> Self {
        let side = triangular_side(dim);
        Self {
            core: ConeCore::new(dim, side.as_T()),
            side,
            S: Matrix::zeros((side, side)),
            Sinv: Matrix::zeros((side, side)),
            M1: Matrix::zeros((side, side)),
            M2: Matrix::zeros((side, side)),
            chol: CholeskyEngine::new(side),
            chol_dual: CholeskyEngine::new(side),
        }
    }

    pub fn side(&self) -> usize {
        self.side
    }

    // S⁻¹ V S⁻¹ (sandwich = Sinv) or S V S (sandwich = S), in svec coords
    fn sandwich(&mut self, out: &mut [T], v: &[T], use_inv: bool) {
        svec_to_mat(&mut self.M1, v);
        let A = if use_inv { &self.Sinv } else { &self.S };
        self.M2
            .gemm(MatrixShape::N, MatrixShape::N, A, &self.M1, T::one(), T::zero());
        self.M1
            .gemm(MatrixShape::N, MatrixShape::N, &self.M2, A, T::one(), T::zero());
        mat_to_svec(out, &self.M1);
    }
}

impl<T> BarrierCone<T> for PosSemidefTriCone<T>
where
    T: FloatT,
{
    fn core(&self) -> &ConeCore<T> {
        &self.core
    }
    fn core_mut(&mut self) -> &mut ConeCore<T> {
        &mut self.core
    }

    fn initial_point(&self, arr: &mut [T]) {
        arr.set(T::zero());
        for k in 0..self.side {
            arr[svec_diag_index(self.side, k)] = T::one();
        }
    }

    fn update_feas(&mut self) -> bool {
        if !self.core.point.is_finite() {
            return false;
        }
        svec_to_mat(&mut self.S, &self.core.point);
        self.chol.factor(&self.S).is_ok()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        if !self.core.dual_point.is_finite() {
            return Some(false);
        }
        svec_to_mat(&mut self.M1, &self.core.dual_point);
        Some(self.chol_dual.factor(&self.M1).is_ok())
    }

    fn update_grad(&mut self) {
        // feasibility has factored S already
        self.chol.inverse_into(&mut self.Sinv);
        self.Sinv.symmetrize_from_triu();
        mat_to_svec(&mut self.core.grad, &self.Sinv);
        self.core.grad.negate();
    }

    fn update_hess(&mut self) {
        let c = &mut self.core;
        symm_kron(&mut c.hess, &self.Sinv);
    }

    fn hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        self.sandwich(out, v, true);
        true
    }

    fn inv_hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        self.sandwich(out, v, false);
        true
    }

    fn hess_diag_fast(&mut self, out: &mut [T]) -> bool {
        let n = self.side;
        for (k, (i, j)) in svec_pairs(n).enumerate() {
            out[k] = if i == j {
                self.Sinv[(i, i)] * self.Sinv[(i, i)]
            } else {
                self.Sinv[(i, i)] * self.Sinv[(j, j)] + self.Sinv[(i, j)] * self.Sinv[(i, j)]
            };
        }
        true
    }

    fn inv_hess_fast(&mut self) -> bool {
        symm_kron(&mut self.core.inv_hess, &self.S);
        true
    }

    fn use_correction(&self) -> bool {
        true
    }

    fn update_correction(&mut self, dir: &[T]) {
        // ½D³F[Δ,Δ] = -svec(S⁻¹ Δ S⁻¹ Δ S⁻¹)
        svec_to_mat(&mut self.M1, dir);
        self.M2.gemm(
            MatrixShape::N,
            MatrixShape::N,
            &self.Sinv,
            &self.M1,
            T::one(),
            T::zero(),
        );
        // M1 = Sinv Δ Sinv Δ = (M2 M2ᵀ... ) careful: M2 = Sinv Δ; want Sinv Δ Sinv Δ Sinv
        self.M1
            .gemm(MatrixShape::N, MatrixShape::N, &self.M2, &self.M2, T::one(), T::zero());
        // M1 = (Sinv Δ)² ; corr = -svec(M1 Sinv)
        self.M2.gemm(
            MatrixShape::N,
            MatrixShape::N,
            &self.M1,
            &self.Sinv,
            T::one(),
            T::zero(),
        );
        mat_to_svec(&mut self.core.corr, &self.M2);
        self.core.corr.negate();
    }
}

impl_cone_contract!(PosSemidefTriCone);
