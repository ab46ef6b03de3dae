use super::*;

// -------------------------------------
// Hypograph of the perspective of logdet
// -------------------------------------

/// `{ (u, v, svec(W)) : v > 0, W ≻ 0, u ≤ v·logdet(W/v) }` with barrier
/// `-log(v·logdet(W/v) - u) - log v - logdet W`, ν = side + 2.
pub struct HypoPerLogdetTriCone<T> {
    core: ConeCore<T>,
    side: usize,
    W: Matrix<T>,
    Winv: Matrix<T>,
    M1: Matrix<T>,
    chol: CholeskyEngine<T>,
    chol_dual: CholeskyEngine<T>,
    kron: Matrix<T>,
}

impl<T> HypoPerLogdetTriCone<T>
where
    T: FloatT,
{
    /// `dim` = 2 + side(side+1)/2.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 3);
        let sd = dim - 2;
        let side = triangular_side(sd);
        Self {
            core: ConeCore::new(dim, T::from_usize(side + 2).unwrap()),
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
        self.core.dim - 2
    }

    // φ = v·(logdet W - n log v) - u; requires the Cholesky factor of W
    fn phi(&self, s: &[T]) -> T {
        let (u, v) = (s[0], s[1]);
        let n = T::from_usize(self.side).unwrap();
        v * (self.chol.logdet() - n * v.logsafe()) - u
    }
}

impl<T> BarrierCone<T> for HypoPerLogdetTriCone<T>
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
        arr[1] = T::one();
        for k in 0..self.side {
            arr[2 + svec_diag_index(self.side, k)] = T::one();
        }
    }

    fn update_feas(&mut self) -> bool {
        let feas = {
            let s = &self.core.point;
            if !s.is_finite() || s[1] <= T::zero() {
                false
            } else {
                svec_to_mat(&mut self.W, &s[2..]);
                self.chol.factor(&self.W).is_ok()
            }
        };
        feas && self.phi(&self.core.point) > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // dual cone: p < 0, R ≻ 0, q - n·p + p(n log(-p) - logdet R) ≥ 0
        let z = &self.core.dual_point;
        let (p, q, r) = (z[0], z[1], &z[2..]);
        if !z.is_finite() || p >= T::zero() {
            return Some(false);
        }
        svec_to_mat(&mut self.M1, r);
        if self.chol_dual.factor(&self.M1).is_err() {
            return Some(false);
        }
        let n = T::from_usize(self.side).unwrap();
        let val = q - n * p + p * (n * (-p).logsafe() - self.chol_dual.logdet());
        Some(val > T::zero())
    }

    fn update_grad(&mut self) {
        self.chol.inverse_into(&mut self.Winv);
        self.Winv.symmetrize_from_triu();

        let sd = self.sd();
        let s = &self.core.point;
        let v = s[1];
        let φ = self.phi(s);
        let n = T::from_usize(self.side).unwrap();
        let φv = φ_v_term::<T>(self.chol.logdet(), n, v);

        // k = svec(W⁻¹) stashed in work for the Hessian
        mat_to_svec(&mut self.core.work[0..sd], &self.Winv);

        self.core.grad[0] = φ.recip();
        self.core.grad[1] = -φv / φ - v.recip();
        for i in 0..sd {
            let k = self.core.work[i];
            self.core.grad[2 + i] = -(v / φ + T::one()) * k;
        }
    }

    fn update_hess(&mut self) {
        let sd = self.sd();
        let side = self.side;
        let s = &self.core.point;
        let v = s[1];
        let φ = self.phi(s);
        let φ2 = φ * φ;
        let n = T::from_usize(side).unwrap();
        let φv = φ_v_term::<T>(self.chol.logdet(), n, v);

        symm_kron(&mut self.kron, &self.Winv);

        let c = &mut self.core;
        let H = &mut c.hess;
        let k = &c.work[0..sd]; // svec(W⁻¹) from the gradient update

        // ∇φ = (-1, φv, v·k)
        H[(0, 0)] = φ2.recip();
        H[(0, 1)] = -φv / φ2;
        H[(1, 0)] = H[(0, 1)];
        H[(1, 1)] = φv * φv / φ2 + n / (v * φ) + (v * v).recip();
        for i in 0..sd {
            let hu = -v * k[i] / φ2;
            H[(0, 2 + i)] = hu;
            H[(2 + i, 0)] = hu;
            // φ_vW = k contributes -k/φ; ∇φ∇φᵀ contributes φv·v·k/φ²
            let hv = φv * v * k[i] / φ2 - k[i] / φ;
            H[(1, 2 + i)] = hv;
            H[(2 + i, 1)] = hv;
            for j in 0..sd {
                H[(2 + i, 2 + j)] = v * v * k[i] * k[j] / φ2
                    + (T::one() + v / φ) * self.kron[(i, j)];
            }
        }
    }
}

// φ_v = logdet(W/v) - n = logdet(W) - n log v - n
fn φ_v_term<T: FloatT>(logdet_w: T, n: T, v: T) -> T {
    logdet_w - n * v.logsafe() - n
}

impl_cone_contract!(HypoPerLogdetTriCone);
