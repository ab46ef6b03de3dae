use super::*;

// -------------------------------------
// Nonnegative orthant
// -------------------------------------

/// The nonnegative orthant `{ s : s ≥ 0 }` with barrier `-Σᵢ log sᵢ`,
/// ν = dim.
pub struct NonnegativeCone<T> {
    core: ConeCore<T>,
}

impl<T> NonnegativeCone<T>
where
    T: FloatT,
{
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 1);
        Self {
            core: ConeCore::new(dim, dim.as_T()),
        }
    }
}

impl<T> BarrierCone<T> for NonnegativeCone<T>
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
        let p = &self.core.point;
        p.is_finite() && p.iter().all(|&x| x > T::zero())
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        let d = &self.core.dual_point;
        Some(d.is_finite() && d.iter().all(|&x| x > T::zero()))
    }

    fn update_grad(&mut self) {
        let c = &mut self.core;
        c.grad.scalarop_from(|p| -p.recip(), &c.point);
    }

    fn update_hess(&mut self) {
        let c = &mut self.core;
        c.hess.data_mut().set(T::zero());
        for (i, &p) in c.point.iter().enumerate() {
            c.hess[(i, i)] = (p * p).recip();
        }
    }

    fn hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        let p = &self.core.point;
        for i in 0..p.len() {
            out[i] = v[i] / (p[i] * p[i]);
        }
        true
    }

    fn inv_hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        let p = &self.core.point;
        for i in 0..p.len() {
            out[i] = v[i] * p[i] * p[i];
        }
        true
    }

    fn hess_diag_fast(&mut self, out: &mut [T]) -> bool {
        let p = &self.core.point;
        for i in 0..p.len() {
            out[i] = (p[i] * p[i]).recip();
        }
        true
    }

    fn inv_hess_fast(&mut self) -> bool {
        let c = &mut self.core;
        c.inv_hess.data_mut().set(T::zero());
        for (i, &p) in c.point.iter().enumerate() {
            c.inv_hess[(i, i)] = p * p;
        }
        true
    }

    fn use_correction(&self) -> bool {
        true
    }

    fn update_correction(&mut self, dir: &[T]) {
        let c = &mut self.core;
        for i in 0..c.dim {
            let p = c.point[i];
            c.corr[i] = -dir[i] * dir[i] / (p * p * p);
        }
    }
}

impl_cone_contract!(NonnegativeCone);
