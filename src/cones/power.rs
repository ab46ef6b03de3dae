use super::*;

// -------------------------------------
// Generalized power cone
// -------------------------------------

/// `{ (u, w) ∈ R₊^m × R^d : ∏ᵢ uᵢ^{αᵢ} ≥ ‖w‖₂ }` for weights α in the
/// unit simplex, with barrier
/// `-log(∏ uᵢ^{2αᵢ} - ‖w‖²) - Σᵢ (1-αᵢ) log uᵢ`, ν = m + 1.
pub struct PowerCone<T> {
    core: ConeCore<T>,
    α: Vec<T>,
}

impl<T> PowerCone<T>
where
    T: FloatT,
{
    pub fn new(α: Vec<T>, w_dim: usize) -> Self {
        assert!(!α.is_empty() && w_dim >= 1);
        let sum: T = α.as_slice().sum();
        assert!((sum - T::one()).abs() < (1e-9).as_T());
        assert!(α.iter().all(|&a| a > T::zero()));
        let dim = α.len() + w_dim;
        let m = α.len();
        Self {
            core: ConeCore::new(dim, T::from_usize(m + 1).unwrap()),
            α,
        }
    }

    fn m(&self) -> usize {
        self.α.len()
    }

    // φ = ∏ uᵢ^{2αᵢ} and ζ = φ - ‖w‖²
    fn phi_zeta(&self, s: &[T]) -> (T, T) {
        let m = self.m();
        let mut logφ = T::zero();
        for i in 0..m {
            logφ += (2.0).as_T() * self.α[i] * s[i].logsafe();
        }
        let φ = logφ.exp();
        let ζ = φ - s[m..].sumsq();
        (φ, ζ)
    }
}

impl<T> BarrierCone<T> for PowerCone<T>
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
        for i in 0..self.m() {
            arr[i] = T::sqrt(T::one() + self.α[i]);
        }
    }

    fn update_feas(&mut self) -> bool {
        let s = &self.core.point;
        if !s.is_finite() || s[..self.m()].iter().any(|&u| u <= T::zero()) {
            return false;
        }
        let (_φ, ζ) = self.phi_zeta(s);
        ζ > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // dual cone: ∏ (pᵢ/αᵢ)^{αᵢ} ≥ ‖q‖
        let z = &self.core.dual_point;
        let m = self.m();
        if !z.is_finite() || z[..m].iter().any(|&p| p <= T::zero()) {
            return Some(false);
        }
        let mut logφ = T::zero();
        for i in 0..m {
            logφ += (2.0).as_T() * self.α[i] * (z[i] / self.α[i]).logsafe();
        }
        Some(logφ.exp() - z[m..].sumsq() > T::zero())
    }

    fn update_grad(&mut self) {
        let m = self.m();
        let (φ, ζ) = self.phi_zeta(&self.core.point);
        let c = &mut self.core;
        for i in 0..m {
            let u = c.point[i];
            c.grad[i] = -(2.0).as_T() * self.α[i] * φ / (u * ζ) - (T::one() - self.α[i]) / u;
        }
        for j in m..c.dim {
            c.grad[j] = (2.0).as_T() * c.point[j] / ζ;
        }
    }

    fn update_hess(&mut self) {
        let m = self.m();
        let dim = self.core.dim;
        let (φ, ζ) = self.phi_zeta(&self.core.point);
        let ww = φ - ζ; // = ‖w‖²
        let two: T = (2.0).as_T();
        let four: T = (4.0).as_T();
        let ζ2 = ζ * ζ;

        let c = &mut self.core;
        let s = &c.point;
        let H = &mut c.hess;

        // u-u block
        for i in 0..m {
            let αi = self.α[i];
            let ui = s[i];
            for k in 0..i {
                let v = four * αi * self.α[k] * φ * ww / (ui * s[k] * ζ2);
                H[(i, k)] = v;
                H[(k, i)] = v;
            }
            H[(i, i)] = -two * αi * φ * ((two * αi - T::one()) * ζ - two * αi * φ)
                / (ui * ui * ζ2)
                + (T::one() - αi) / (ui * ui);
        }

        // u-w and w-w blocks
        for j in m..dim {
            for i in 0..m {
                let v = -four * self.α[i] * φ * s[j] / (s[i] * ζ2);
                H[(i, j)] = v;
                H[(j, i)] = v;
            }
            for l in m..j {
                let v = four * s[j] * s[l] / ζ2;
                H[(j, l)] = v;
                H[(l, j)] = v;
            }
            H[(j, j)] = two / ζ + four * s[j] * s[j] / ζ2;
        }
    }
}

impl_cone_contract!(PowerCone);
