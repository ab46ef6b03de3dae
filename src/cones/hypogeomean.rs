use super::*;
use super::hypopowermean::{
    powermean_dual_feas, powermean_feas, powermean_grad, powermean_hess,
};

// -------------------------------------
// Hypograph of the geometric mean
// -------------------------------------

/// `{ (u, w) : w ≥ 0, u ≤ (∏ᵢ wᵢ)^{1/d} }` with barrier
/// `-log((∏ wᵢ)^{1/d} - u) - Σᵢ log wᵢ`, ν = d + 1.
///
/// The equal-weight case of [`HypoPowerMeanCone`]; the barrier kernels
/// are shared.
pub struct HypoGeoMeanCone<T> {
    core: ConeCore<T>,
    α: Vec<T>,
}

impl<T> HypoGeoMeanCone<T>
where
    T: FloatT,
{
    /// `dim` = 1 + d, with d the number of geometric-mean terms.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 2);
        let d = dim - 1;
        let inv_d = T::from_usize(d).unwrap().recip();
        Self {
            core: ConeCore::new(dim, T::from_usize(dim).unwrap()),
            α: vec![inv_d; d],
        }
    }
}

impl<T> BarrierCone<T> for HypoGeoMeanCone<T>
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
        powermean_feas(&self.α, &self.core.point)
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        Some(powermean_dual_feas(&self.α, &self.core.dual_point))
    }

    fn update_grad(&mut self) {
        powermean_grad(&self.α, &self.core.point, &mut self.core.grad);
    }

    fn update_hess(&mut self) {
        powermean_hess(&self.α, &self.core.point, &mut self.core.hess);
    }
}

impl_cone_contract!(HypoGeoMeanCone);
