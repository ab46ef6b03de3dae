use super::*;

// -------------------------------------
// Epigraph of the ℓ∞ norm
// -------------------------------------

/// `{ (u, w) : u ≥ ‖w‖∞ }` with barrier
/// `-Σᵢ log(u² - wᵢ²) + (d-1) log u`, ν = d + 1 where d = dim - 1.
///
/// The Hessian has arrow structure (dense first row/column plus a
/// diagonal), so products and inverse products run in O(d).
pub struct EpiNormInfCone<T> {
    core: ConeCore<T>,
}

impl<T> EpiNormInfCone<T>
where
    T: FloatT,
{
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 2);
        Self {
            core: ConeCore::new(dim, dim.as_T()),
        }
    }

    // arrow entries (α, bᵢ, Dᵢ) of the Hessian at the loaded point
    fn arrow_entries(&self, i: usize) -> (T, T) {
        let s = &self.core.point;
        let u = s[0];
        let w = s[1 + i];
        let ρ = u * u - w * w;
        let b = -(4.0).as_T() * u * w / (ρ * ρ);
        let d = (2.0).as_T() / ρ + (4.0).as_T() * w * w / (ρ * ρ);
        (b, d)
    }

    fn arrow_alpha(&self) -> T {
        let s = &self.core.point;
        let u = s[0];
        let d = self.core.dim - 1;
        let mut α = -T::from_usize(d - 1).unwrap() / (u * u);
        for i in 0..d {
            let w = s[1 + i];
            let ρ = u * u - w * w;
            α += -(2.0).as_T() / ρ + (4.0).as_T() * u * u / (ρ * ρ);
        }
        α
    }
}

impl<T> BarrierCone<T> for EpiNormInfCone<T>
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
        arr[0] = T::sqrt(self.core.nu);
    }

    fn update_feas(&mut self) -> bool {
        let s = &self.core.point;
        s.is_finite() && s[0] > T::zero() && s[1..].iter().all(|&w| T::abs(w) < s[0])
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // dual cone is the ℓ1-norm epigraph
        let z = &self.core.dual_point;
        let norm1 = z[1..].iter().fold(T::zero(), |acc, &q| acc + T::abs(q));
        Some(z.is_finite() && z[0] > norm1)
    }

    fn update_grad(&mut self) {
        let c = &mut self.core;
        let u = c.point[0];
        let d = c.dim - 1;
        let mut gu = T::from_usize(d - 1).unwrap() / u;
        for i in 0..d {
            let w = c.point[1 + i];
            let ρ = u * u - w * w;
            gu -= (2.0).as_T() * u / ρ;
            c.grad[1 + i] = (2.0).as_T() * w / ρ;
        }
        c.grad[0] = gu;
    }

    fn update_hess(&mut self) {
        let dim = self.core.dim;
        let α = self.arrow_alpha();
        let c = &mut self.core;
        c.hess.data_mut().set(T::zero());
        c.hess[(0, 0)] = α;
        for i in 0..(dim - 1) {
            let (b, d) = {
                let s = &c.point;
                let u = s[0];
                let w = s[1 + i];
                let ρ = u * u - w * w;
                (
                    -(4.0).as_T() * u * w / (ρ * ρ),
                    (2.0).as_T() / ρ + (4.0).as_T() * w * w / (ρ * ρ),
                )
            };
            c.hess[(0, 1 + i)] = b;
            c.hess[(1 + i, 0)] = b;
            c.hess[(1 + i, 1 + i)] = d;
        }
    }

    fn hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        let dim = self.core.dim;
        let α = self.arrow_alpha();
        let mut out_u = α * v[0];
        for i in 0..(dim - 1) {
            let (b, d) = self.arrow_entries(i);
            out_u += b * v[1 + i];
            out[1 + i] = b * v[0] + d * v[1 + i];
        }
        out[0] = out_u;
        true
    }

    fn inv_hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        // arrow system via the Schur complement of the diagonal block
        let dim = self.core.dim;
        let α = self.arrow_alpha();
        let mut schur = α;
        let mut rhs_u = v[0];
        for i in 0..(dim - 1) {
            let (b, d) = self.arrow_entries(i);
            schur -= b * b / d;
            rhs_u -= b * v[1 + i] / d;
        }
        let xu = rhs_u / schur;
        out[0] = xu;
        for i in 0..(dim - 1) {
            let (b, d) = self.arrow_entries(i);
            out[1 + i] = (v[1 + i] - b * xu) / d;
        }
        true
    }

    fn hess_diag_fast(&mut self, out: &mut [T]) -> bool {
        let dim = self.core.dim;
        out[0] = self.arrow_alpha();
        for i in 0..(dim - 1) {
            let (_b, d) = self.arrow_entries(i);
            out[1 + i] = d;
        }
        true
    }
}

impl_cone_contract!(EpiNormInfCone);
