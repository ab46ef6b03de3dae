use super::*;

// -------------------------------------
// Hypograph of the root-determinant
// -------------------------------------

/// `{ (u, svec(W)) : W ⪰ 0, u ≤ det(W)^{1/n} }` with barrier
/// `-log(det(W)^{1/n} - u) - logdet W`, ν = side + 1.
pub struct HypoRootdetTriCone<T> {
    core: ConeCore<T>,
    side: usize,
    W: Matrix<T>,
    Winv: Matrix<T>,
    M1: Matrix<T>,
    chol: CholeskyEngine<T>,
    chol_dual: CholeskyEngine<T>,
    kron: Matrix<T>,
}

impl<T> HypoRootdetTriCone<T>
where
    T: FloatT,
{
    /// `dim` = 1 + side(side+1)/2.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 2);
        let sd = dim - 1;
        let side = triangular_side(sd);
        Self {
            core: ConeCore::new(dim, T::from_usize(side + 1).unwrap()),
            side,
            W: Matrix::zeros((side, side)),
            Winv: Matrix::zeros((side, side)),
            M1: Matrix::zeros((side, side)),
            chol: CholeskyEngine::new(side),
            chol_dual: CholeskyEngine::new(side),
            kron: Matrix::zeros((sd, sd)),
        }
    }

    fn sd(&self) -> usize {
        self.core.dim - 1
    }

    // φ = det(W)^{1/n}; requires the Cholesky factor of W
    fn phi(&self) -> T {
        let n = T::from_usize(self.side).unwrap();
        (self.chol.logdet() / n).exp()
    }
}

impl<T> BarrierCone<T> for HypoRootdetTriCone<T>
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
        arr[0] = -T::one();
        for k in 0..self.side {
            arr[1 + svec_diag_index(self.side, k)] = T::one();
        }
    }

    fn update_feas(&mut self) -> bool {
        let chol_ok = {
            let s = &self.core.point;
            if !s.is_finite() {
                false
            } else {
                svec_to_mat(&mut self.W, &s[1..]);
                self.chol.factor(&self.W).is_ok()
            }
        };
        chol_ok && self.phi() - self.core.point[0] > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // dual cone: p ≤ 0, R ⪰ 0, n·det(R)^{1/n} ≥ -p
        let z = &self.core.dual_point;
        let p = z[0];
        if !z.is_finite() || p >= T::zero() {
            return Some(false);
        }
        svec_to_mat(&mut self.M1, &z[1..]);
        if self.chol_dual.factor(&self.M1).is_err() {
            return Some(false);
        }
        let n = T::from_usize(self.side).unwrap();
        let rootdet = (self.chol_dual.logdet() / n).exp();
        Some(n * rootdet + p > T::zero())
    }

    fn update_grad(&mut self) {
        self.chol.inverse_into(&mut self.Winv);
        self.Winv.symmetrize_from_triu();

        let sd = self.sd();
        let n = T::from_usize(self.side).unwrap();
        let φ = self.phi();
        let ζ = φ - self.core.point[0];

        mat_to_svec(&mut self.core.work[0..sd], &self.Winv);

        self.core.grad[0] = ζ.recip();
        let coef = φ / (n * ζ) + T::one();
        for i in 0..sd {
            self.core.grad[1 + i] = -coef * self.core.work[i];
        }
    }

    fn update_hess(&mut self) {
        let sd = self.sd();
        let n = T::from_usize(self.side).unwrap();
        let φ = self.phi();
        let ζ = φ - self.core.point[0];
        let ζ2 = ζ * ζ;

        symm_kron(&mut self.kron, &self.Winv);

        let c = &mut self.core;
        let H = &mut c.hess;
        let k = &c.work[0..sd]; // svec(W⁻¹) from the gradient update

        let kk_coef = φ * φ / (n * n * ζ2) - φ / (n * n * ζ);
        let kron_coef = T::one() + φ / (n * ζ);

        H[(0, 0)] = ζ2.recip();
        for i in 0..sd {
            let hu = -φ * k[i] / (n * ζ2);
            H[(0, 1 + i)] = hu;
            H[(1 + i, 0)] = hu;
            for j in 0..sd {
                H[(1 + i, 1 + j)] = kk_coef * k[i] * k[j] + kron_coef * self.kron[(i, j)];
            }
        }
    }
}

impl_cone_contract!(HypoRootdetTriCone);
