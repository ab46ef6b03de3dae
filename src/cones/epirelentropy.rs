use super::*;

// -------------------------------------
// Epigraph of vector relative entropy
// -------------------------------------

/// `{ (u, v, w) : v > 0, w > 0, u ≥ Σᵢ wᵢ log(wᵢ/vᵢ) }` with barrier
/// `-log(u - Σᵢ wᵢ log(wᵢ/vᵢ)) - Σᵢ log vᵢ - Σᵢ log wᵢ`, ν = 2d + 1.
pub struct EpiRelEntropyCone<T> {
    core: ConeCore<T>,
}

impl<T> EpiRelEntropyCone<T>
where
    T: FloatT,
{
    /// `dim` = 1 + 2d, odd and ≥ 3.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 3 && dim % 2 == 1);
        Self {
            core: ConeCore::new(dim, T::from_usize(dim).unwrap()),
        }
    }

    fn d(&self) -> usize {
        (self.core.dim - 1) / 2
    }

    fn phi(s: &[T], d: usize) -> T {
        let (v, w) = (&s[1..1 + d], &s[1 + d..]);
        let mut φ = s[0];
        for i in 0..d {
            φ -= w[i] * (w[i] / v[i]).logsafe();
        }
        φ
    }
}

impl<T> BarrierCone<T> for EpiRelEntropyCone<T>
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
    }

    fn update_feas(&mut self) -> bool {
        let d = self.d();
        let s = &self.core.point;
        s.is_finite()
            && s[1..].iter().all(|&x| x > T::zero())
            && Self::phi(s, d) > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // dual cone, per coordinate: p > 0 and qᵢ > p·exp(-rᵢ/p - 1)
        let d = self.d();
        let z = &self.core.dual_point;
        let (p, q, r) = (z[0], &z[1..1 + d], &z[1 + d..]);
        if !z.is_finite() || p <= T::zero() || q.iter().any(|&x| x <= T::zero()) {
            return Some(false);
        }
        let logp = p.logsafe();
        for i in 0..d {
            if q[i].logsafe() <= logp - T::one() - r[i] / p {
                return Some(false);
            }
        }
        Some(true)
    }

    fn update_grad(&mut self) {
        let d = self.d();
        let φ = Self::phi(&self.core.point, d);
        let c = &mut self.core;
        let s = &c.point;

        c.grad[0] = -φ.recip();
        for i in 0..d {
            let (v, w) = (s[1 + i], s[1 + d + i]);
            c.grad[1 + i] = -(w / v) / φ - v.recip();
            c.grad[1 + d + i] = ((w / v).logsafe() + T::one()) / φ - w.recip();
        }
    }

    fn update_hess(&mut self) {
        let d = self.d();
        let dim = self.core.dim;
        let φ = Self::phi(&self.core.point, d);
        let φ2 = φ * φ;

        let c = &mut self.core;
        let s = &c.point;

        // ∇φ into workspace
        let gφ = &mut c.work;
        gφ[0] = T::one();
        for i in 0..d {
            let (v, w) = (s[1 + i], s[1 + d + i]);
            gφ[1 + i] = w / v;
            gφ[1 + d + i] = -((w / v).logsafe() + T::one());
        }

        let H = &mut c.hess;
        for j in 0..dim {
            for i in 0..=j {
                let val = gφ[i] * gφ[j] / φ2;
                H[(i, j)] = val;
                H[(j, i)] = val;
            }
        }

        // -∇²φ/φ plus the diagonal log-barrier terms
        for i in 0..d {
            let (v, w) = (s[1 + i], s[1 + d + i]);
            H[(1 + i, 1 + i)] += w / (v * v * φ) + (v * v).recip();
            let x = (v * φ).recip();
            H[(1 + i, 1 + d + i)] -= x;
            H[(1 + d + i, 1 + i)] -= x;
            H[(1 + d + i, 1 + d + i)] += (w * φ).recip() + (w * w).recip();
        }
    }
}

impl_cone_contract!(EpiRelEntropyCone);
