use super::*;

// -------------------------------------
// Hypograph of the weighted power mean
// -------------------------------------

/// `{ (u, w) : w ≥ 0, u ≤ ∏ᵢ wᵢ^{αᵢ} }` for weights α in the unit
/// simplex, with barrier `-log(∏ wᵢ^{αᵢ} - u) - Σᵢ log wᵢ`, ν = d + 1.
pub struct HypoPowerMeanCone<T> {
    core: ConeCore<T>,
    α: Vec<T>,
}

impl<T> HypoPowerMeanCone<T>
where
    T: FloatT,
{
    pub fn new(α: Vec<T>) -> Self {
        assert!(!α.is_empty());
        let sum: T = α.as_slice().sum();
        assert!((sum - T::one()).abs() < (1e-9).as_T());
        assert!(α.iter().all(|&a| a > T::zero()));
        let dim = α.len() + 1;
        Self {
            core: ConeCore::new(dim, T::from_usize(dim).unwrap()),
            α,
        }
    }
}

// shared barrier kernels for power-mean type hypographs; w are the last
// d coordinates, u the first

pub(crate) fn powermean_phi<T: FloatT>(α: &[T], w: &[T]) -> T {
    let mut logφ = T::zero();
    for (a, x) in α.iter().zip(w) {
        logφ += *a * x.logsafe();
    }
    logφ.exp()
}

pub(crate) fn powermean_feas<T: FloatT>(α: &[T], s: &[T]) -> bool {
    let w = &s[1..];
    if !s.is_finite() || w.iter().any(|&x| x <= T::zero()) {
        return false;
    }
    powermean_phi(α, w) - s[0] > T::zero()
}

pub(crate) fn powermean_dual_feas<T: FloatT>(α: &[T], z: &[T]) -> bool {
    // dual cone: p ≤ 0, q ≥ 0, ∏ (qᵢ/αᵢ)^{αᵢ} ≥ -p
    let (p, q) = (z[0], &z[1..]);
    if !z.is_finite() || p >= T::zero() || q.iter().any(|&x| x <= T::zero()) {
        return false;
    }
    let mut logφ = T::zero();
    for (a, x) in α.iter().zip(q) {
        logφ += *a * (*x / *a).logsafe();
    }
    logφ.exp() + p > T::zero()
}

pub(crate) fn powermean_grad<T: FloatT>(α: &[T], s: &[T], grad: &mut [T]) {
    let w = &s[1..];
    let φ = powermean_phi(α, w);
    let ζ = φ - s[0];
    grad[0] = ζ.recip();
    for i in 0..w.len() {
        let p = α[i] * φ / w[i];
        grad[1 + i] = -p / ζ - w[i].recip();
    }
}

pub(crate) fn powermean_hess<T: FloatT>(α: &[T], s: &[T], H: &mut Matrix<T>) {
    let d = α.len();
    let w = &s[1..];
    let φ = powermean_phi(α, w);
    let ζ = φ - s[0];
    let ζ2 = ζ * ζ;

    H[(0, 0)] = ζ2.recip();
    for i in 0..d {
        let pi = α[i] * φ / w[i];
        let v = -pi / ζ2;
        H[(0, 1 + i)] = v;
        H[(1 + i, 0)] = v;
        for j in 0..=i {
            let pj = α[j] * φ / w[j];
            let mut v = -pi * pj / (φ * ζ) + pi * pj / ζ2;
            if i == j {
                v += pi / (w[i] * ζ) + (w[i] * w[i]).recip();
            }
            H[(1 + i, 1 + j)] = v;
            H[(1 + j, 1 + i)] = v;
        }
    }
}

impl<T> BarrierCone<T> for HypoPowerMeanCone<T>
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

impl_cone_contract!(HypoPowerMeanCone);
