use super::*;

// -------------------------------------
// Hypograph of the perspective of the sum of logarithms
// -------------------------------------

/// `{ (u, v, w) : v > 0, w > 0, u ≤ v Σᵢ log(wᵢ/v) }` with barrier
/// `-log(v Σᵢ log(wᵢ/v) - u) - log v - Σᵢ log wᵢ`, ν = d + 2.
///
/// The d = 1 case is the exponential cone.
pub struct HypoPerLogCone<T> {
    core: ConeCore<T>,
}

impl<T> HypoPerLogCone<T>
where
    T: FloatT,
{
    /// `dim` = 2 + d ≥ 3.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 3);
        Self {
            core: ConeCore::new(dim, T::from_usize(dim).unwrap()),
        }
    }

    // φ = v Σ log(wᵢ/v) - u
    fn phi(s: &[T]) -> T {
        let (u, v, w) = (s[0], s[1], &s[2..]);
        let mut sumlog = T::zero();
        for &wi in w {
            sumlog += (wi / v).logsafe();
        }
        v * sumlog - u
    }
}

impl<T> BarrierCone<T> for HypoPerLogCone<T>
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
        arr.set(T::one());
        arr[0] = -T::one();
    }

    fn update_feas(&mut self) -> bool {
        let s = &self.core.point;
        s.is_finite()
            && s[1] > T::zero()
            && s[2..].iter().all(|&w| w > T::zero())
            && Self::phi(s) > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // dual cone: p < 0, r > 0, q - d·p + p Σᵢ log(-p/rᵢ) ≥ 0
        let z = &self.core.dual_point;
        let (p, q, r) = (z[0], z[1], &z[2..]);
        if !z.is_finite() || p >= T::zero() || r.iter().any(|&x| x <= T::zero()) {
            return Some(false);
        }
        let d = T::from_usize(r.len()).unwrap();
        let mut sumlog = T::zero();
        for &ri in r {
            sumlog += (-p / ri).logsafe();
        }
        Some(q - d * p + p * sumlog > T::zero())
    }

    fn update_grad(&mut self) {
        let c = &mut self.core;
        let s = &c.point;
        let (v, w) = (s[1], &s[2..]);
        let φ = Self::phi(s);

        // φ_v = Σ log(wᵢ/v) - d
        let mut φv = -T::from_usize(w.len()).unwrap();
        for &wi in w {
            φv += (wi / v).logsafe();
        }

        c.grad[0] = φ.recip();
        c.grad[1] = -φv / φ - v.recip();
        for (i, &wi) in w.iter().enumerate() {
            c.grad[2 + i] = -(v / wi) / φ - wi.recip();
        }
    }

    fn update_hess(&mut self) {
        // H = ∇φ∇φᵀ/φ² - ∇²φ/φ + diag(0, 1/v², 1/wᵢ²)
        let c = &mut self.core;
        let dim = c.dim;
        let s = &c.point;
        let (v, w) = (s[1], &s[2..]);
        let d = w.len();
        let φ = Self::phi(s);
        let φ2 = φ * φ;

        // ∇φ into workspace
        let gφ = &mut c.work;
        gφ[0] = -T::one();
        gφ[1] = -T::from_usize(d).unwrap();
        for (i, &wi) in w.iter().enumerate() {
            gφ[1] += (wi / v).logsafe();
            gφ[2 + i] = v / wi;
        }

        let H = &mut c.hess;
        for j in 0..dim {
            for i in 0..=j {
                let val = gφ[i] * gφ[j] / φ2;
                H[(i, j)] = val;
                H[(j, i)] = val;
            }
        }

        // -∇²φ/φ terms
        H[(1, 1)] += T::from_usize(d).unwrap() / (v * φ);
        for i in 0..d {
            let wi = w[i];
            let x = (wi * φ).recip();
            H[(1, 2 + i)] -= x;
            H[(2 + i, 1)] -= x;
            H[(2 + i, 2 + i)] += v / (wi * wi * φ);
        }

        // diagonal of the -log v - Σ log wᵢ terms
        H[(1, 1)] += (v * v).recip();
        for i in 0..d {
            H[(2 + i, 2 + i)] += (w[i] * w[i]).recip();
        }
    }
}

impl_cone_contract!(HypoPerLogCone);
