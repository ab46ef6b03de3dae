use super::*;

// -------------------------------------
// Doubly nonnegative cone (svec triangle)
// -------------------------------------

/// `{ svec(S) : S ⪰ 0, S ≥ 0 entrywise }` with barrier
/// `-logdet(S) - Σ_{i<j} log(Sᵢⱼ)`, ν = side + side(side-1)/2.
///
/// Diagonal nonnegativity is implied by the PSD part, so only the
/// off-diagonal entries carry log terms.
pub struct DoublyNonnegativeTriCone<T> {
    core: ConeCore<T>,
    side: usize,
    S: Matrix<T>,
    Sinv: Matrix<T>,
    M1: Matrix<T>,
    chol: CholeskyEngine<T>,
    chol_dual: CholeskyEngine<T>,
}

impl<T> DoublyNonnegativeTriCone<T>
where
    T: FloatT,
{
    /// `dim` is the svec length, side(side+1)/2.
    pub fn new(dim: usize) -> Self {
        let side = triangular_side(dim);
        let nu = side + (side * (side - 1)) / 2;
        Self {
            core: ConeCore::new(dim, nu.as_T()),
            side,
            S: Matrix::zeros((side, side)),
            Sinv: Matrix::zeros((side, side)),
            M1: Matrix::zeros((side, side)),
            chol: CholeskyEngine::new(side),
            chol_dual: CholeskyEngine::new(side),
        }
    }
}

impl<T> BarrierCone<T> for DoublyNonnegativeTriCone<T>
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
        // identity plus a small positive off-diagonal, strictly inside
        let δ = T::from_usize(self.side).unwrap().recip();
        for (k, (i, j)) in svec_pairs(self.side).enumerate() {
            arr[k] = if i == j { T::one() } else { T::SQRT_2() * δ };
        }
    }

    fn update_feas(&mut self) -> bool {
        let s = &self.core.point;
        if !s.is_finite() {
            return false;
        }
        for (k, (i, j)) in svec_pairs(self.side).enumerate() {
            if i != j && s[k] <= T::zero() {
                return false;
            }
        }
        svec_to_mat(&mut self.S, s);
        self.chol.factor(&self.S).is_ok()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // sufficient: Z ≻ 0 picks the PSD summand of the dual decomposition
        if !self.core.dual_point.is_finite() {
            return Some(false);
        }
        svec_to_mat(&mut self.M1, &self.core.dual_point);
        Some(self.chol_dual.factor(&self.M1).is_ok())
    }

    fn update_grad(&mut self) {
        self.chol.inverse_into(&mut self.Sinv);
        self.Sinv.symmetrize_from_triu();
        mat_to_svec(&mut self.core.grad, &self.Sinv);
        self.core.grad.negate();
        for (k, (i, j)) in svec_pairs(self.side).enumerate() {
            if i != j {
                self.core.grad[k] -= self.core.point[k].recip();
            }
        }
    }

    fn update_hess(&mut self) {
        symm_kron(&mut self.core.hess, &self.Sinv);
        for (k, (i, j)) in svec_pairs(self.side).enumerate() {
            if i != j {
                let x = self.core.point[k];
                self.core.hess[(k, k)] += (x * x).recip();
            }
        }
    }
}

impl_cone_contract!(DoublyNonnegativeTriCone);
