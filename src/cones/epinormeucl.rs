use super::*;

// -------------------------------------
// Second-order cone (epigraph of the Euclidean norm)
// -------------------------------------

/// `{ (u, w) : u ≥ ‖w‖₂ }` with barrier `-log(u² - ‖w‖²)`, ν = 2.
///
/// The barrier is `-log(sᵀJs)` with `J = diag(1, -I)`; gradient, Hessian
/// and inverse Hessian all have closed forms in `J s` and `sᵀJs`.
pub struct EpiNormEuclCone<T> {
    core: ConeCore<T>,
}

impl<T> EpiNormEuclCone<T>
where
    T: FloatT,
{
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 2);
        Self {
            core: ConeCore::new(dim, (2.0).as_T()),
        }
    }

    // r = sᵀ J s = u² - ‖w‖²
    fn quad_val(s: &[T]) -> T {
        s[0] * s[0] - s[1..].sumsq()
    }

    // out = J v
    fn jmul(out: &mut [T], v: &[T]) {
        out[0] = v[0];
        for i in 1..v.len() {
            out[i] = -v[i];
        }
    }

    fn strict_feas(s: &[T]) -> bool {
        s.is_finite() && s[0] > T::zero() && Self::quad_val(s) > T::zero()
    }
}

impl<T> BarrierCone<T> for EpiNormEuclCone<T>
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
        arr[0] = T::SQRT_2();
    }

    fn update_feas(&mut self) -> bool {
        Self::strict_feas(&self.core.point)
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // self-dual
        Some(Self::strict_feas(&self.core.dual_point))
    }

    fn update_grad(&mut self) {
        let c = &mut self.core;
        let r = Self::quad_val(&c.point);
        Self::jmul(&mut c.grad, &c.point);
        c.grad.scale(-(2.0).as_T() / r);
    }

    fn update_hess(&mut self) {
        // H = (4/r²)(Js)(Js)ᵀ - (2/r)J
        let c = &mut self.core;
        let r = Self::quad_val(&c.point);
        Self::jmul(&mut c.work, &c.point);
        let a = &c.work;
        let c4 = (4.0).as_T() / (r * r);
        let c2 = (2.0).as_T() / r;

        for j in 0..c.dim {
            for i in 0..c.dim {
                c.hess[(i, j)] = c4 * a[i] * a[j];
            }
        }
        c.hess[(0, 0)] -= c2;
        for i in 1..c.dim {
            c.hess[(i, i)] += c2;
        }
    }

    fn hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        let c = &self.core;
        let r = Self::quad_val(&c.point);
        let mut jpv = c.point[0] * v[0];
        for i in 1..c.dim {
            jpv -= c.point[i] * v[i];
        }
        let c4 = (4.0).as_T() * jpv / (r * r);
        let c2 = (2.0).as_T() / r;
        out[0] = c4 * c.point[0] - c2 * v[0];
        for i in 1..c.dim {
            out[i] = -c4 * c.point[i] + c2 * v[i];
        }
        true
    }

    fn inv_hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        // H⁻¹ v = (sᵀv) s - (r/2) J v
        let c = &self.core;
        let r = Self::quad_val(&c.point);
        let sv = c.point.dot(v);
        let half_r = r * (0.5).as_T();
        out[0] = sv * c.point[0] - half_r * v[0];
        for i in 1..c.dim {
            out[i] = sv * c.point[i] + half_r * v[i];
        }
        true
    }

    fn hess_diag_fast(&mut self, out: &mut [T]) -> bool {
        let c = &self.core;
        let r = Self::quad_val(&c.point);
        let c4 = (4.0).as_T() / (r * r);
        let c2 = (2.0).as_T() / r;
        out[0] = c4 * c.point[0] * c.point[0] - c2;
        for i in 1..c.dim {
            out[i] = c4 * c.point[i] * c.point[i] + c2;
        }
        true
    }

    fn inv_hess_fast(&mut self) -> bool {
        let c = &mut self.core;
        let r = Self::quad_val(&c.point);
        let half_r = r * (0.5).as_T();
        for j in 0..c.dim {
            for i in 0..c.dim {
                c.inv_hess[(i, j)] = c.point[i] * c.point[j];
            }
        }
        c.inv_hess[(0, 0)] -= half_r;
        for i in 1..c.dim {
            c.inv_hess[(i, i)] += half_r;
        }
        true
    }

    fn use_correction(&self) -> bool {
        true
    }

    fn update_correction(&mut self, dir: &[T]) {
        // ½D³F[u,u] = [4(Js·u)Ju + 2(uᵀJu)Js]/r² - 8(Js·u)²Js/r³
        let c = &mut self.core;
        let r = Self::quad_val(&c.point);
        let mut jsu = c.point[0] * dir[0];
        let mut uju = dir[0] * dir[0];
        for i in 1..c.dim {
            jsu -= c.point[i] * dir[i];
            uju -= dir[i] * dir[i];
        }
        let c1 = (4.0).as_T() * jsu / (r * r);
        let c2 = (2.0).as_T() * uju / (r * r) - (8.0).as_T() * jsu * jsu / (r * r * r);

        c.corr[0] = c1 * dir[0] + c2 * c.point[0];
        for i in 1..c.dim {
            c.corr[i] = -c1 * dir[i] - c2 * c.point[i];
        }
    }
}

impl_cone_contract!(EpiNormEuclCone);
