use super::*;

// -------------------------------------
// Epigraph of perspective of separable spectral functions
// -------------------------------------

/// Separable spectral function h applied coordinatewise (vector domain)
/// or to eigenvalues (matrix domain).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SepSpectralFun {
    /// h(x) = -log x
    NegLog,
    /// h(x) = x log x
    NegEntropy,
    /// h(x) = x^p for p ∈ (1, 2]
    Power12(f64),
}

impl SepSpectralFun {
    fn h<T: FloatT>(&self, x: T) -> T {
        match self {
            SepSpectralFun::NegLog => -x.logsafe(),
            SepSpectralFun::NegEntropy => x * x.logsafe(),
            SepSpectralFun::Power12(p) => x.powf((*p).as_T()),
        }
    }

    fn h_deriv<T: FloatT>(&self, x: T) -> T {
        match self {
            SepSpectralFun::NegLog => -x.recip(),
            SepSpectralFun::NegEntropy => x.logsafe() + T::one(),
            SepSpectralFun::Power12(p) => {
                let p: T = (*p).as_T();
                p * x.powf(p - T::one())
            }
        }
    }

    fn h_deriv2<T: FloatT>(&self, x: T) -> T {
        match self {
            SepSpectralFun::NegLog => (x * x).recip(),
            SepSpectralFun::NegEntropy => x.recip(),
            SepSpectralFun::Power12(p) => {
                let p: T = (*p).as_T();
                p * (p - T::one()) * x.powf(p - (2.0).as_T())
            }
        }
    }

    // conjugate h*(y) = sup_x xy - h(x); None if y is outside int dom h*
    fn h_conj<T: FloatT>(&self, y: T) -> Option<T> {
        match self {
            SepSpectralFun::NegLog => {
                if y >= T::zero() {
                    None
                } else {
                    Some(-T::one() - (-y).logsafe())
                }
            }
            SepSpectralFun::NegEntropy => Some((y - T::one()).exp()),
            SepSpectralFun::Power12(p) => {
                if y <= T::zero() {
                    Some(T::zero())
                } else {
                    let p: T = (*p).as_T();
                    let q = p / (p - T::one());
                    Some((p - T::one()) * (y / p).powf(q))
                }
            }
        }
    }
}

// shared per-coordinate pieces of the barrier
// ζ = u - v Σ h(xᵢ),  xᵢ = wᵢ/v (eigenvalues in the matrix case)
fn zeta<T: FloatT>(h: SepSpectralFun, u: T, v: T, xs: &[T]) -> T {
    let mut ζ = u;
    for &x in xs {
        ζ -= v * h.h(x);
    }
    ζ
}

// ζ_v = -Σ (h(x) - x h'(x))
fn zeta_v<T: FloatT>(h: SepSpectralFun, xs: &[T]) -> T {
    let mut out = T::zero();
    for &x in xs {
        out -= h.h(x) - x * h.h_deriv(x);
    }
    out
}

fn dual_feas_eigs<T: FloatT>(h: SepSpectralFun, p: T, q: T, rs: &[T]) -> bool {
    if p <= T::zero() {
        return false;
    }
    let mut sum = T::zero();
    for &r in rs {
        match h.h_conj(-r / p) {
            Some(val) => sum += val,
            None => return false,
        }
    }
    q > p * sum
}

// -------------------------------------
// vector domain
// -------------------------------------

/// `{ (u, v, w) : v > 0, w > 0, u ≥ v Σᵢ h(wᵢ/v) }` with barrier
/// `-log(u - v Σᵢ h(wᵢ/v)) - log v - Σᵢ log wᵢ`, ν = d + 2.
pub struct EpiPerSepSpectralVectorCone<T> {
    core: ConeCore<T>,
    h: SepSpectralFun,
}

impl<T> EpiPerSepSpectralVectorCone<T>
where
    T: FloatT,
{
    pub fn new(h: SepSpectralFun, d: usize) -> Self {
        assert!(d >= 1);
        Self {
            core: ConeCore::new(2 + d, T::from_usize(d + 2).unwrap()),
            h,
        }
    }

    fn d(&self) -> usize {
        self.core.dim - 2
    }
}

impl<T> BarrierCone<T> for EpiPerSepSpectralVectorCone<T>
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
        let d = self.d();
        arr.set(T::one());
        arr[0] = T::from_usize(d).unwrap() * self.h.h(T::one()) + T::one();
    }

    fn update_feas(&mut self) -> bool {
        let s = &self.core.point;
        if !s.is_finite() || s[1] <= T::zero() || s[2..].iter().any(|&w| w <= T::zero()) {
            return false;
        }
        let v = s[1];
        let mut ζ = s[0];
        for &w in &s[2..] {
            ζ -= v * self.h.h(w / v);
        }
        ζ > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        let z = &self.core.dual_point;
        if !z.is_finite() {
            return Some(false);
        }
        Some(dual_feas_eigs(self.h, z[0], z[1], &z[2..]))
    }

    fn update_grad(&mut self) {
        let h = self.h;
        let c = &mut self.core;
        let s = &c.point;
        let (v, w) = (s[1], &s[2..]);

        // xs into work
        for (x, &wi) in c.work[0..w.len()].iter_mut().zip(w) {
            *x = wi / v;
        }
        let xs = &c.work[0..w.len()];
        let ζ = zeta(h, s[0], v, xs);
        let ζv = zeta_v(h, xs);

        c.grad[0] = -ζ.recip();
        c.grad[1] = -ζv / ζ - v.recip();
        for i in 0..w.len() {
            c.grad[2 + i] = h.h_deriv(xs[i]) / ζ - w[i].recip();
        }
    }

    fn update_hess(&mut self) {
        let h = self.h;
        let d = self.d();
        let dim = self.core.dim;
        let c = &mut self.core;
        let s = &c.point;
        let (v, w) = (s[1], &s[2..]);

        let xs = &c.work[0..d]; // from the gradient update
        let ζ = zeta(h, s[0], v, xs);
        let ζv = zeta_v(h, xs);
        let ζ2 = ζ * ζ;

        // ∇ζ = (1, ζv, -h'(xᵢ)) into work2
        let gζ = &mut c.work2;
        gζ[0] = T::one();
        gζ[1] = ζv;
        for i in 0..d {
            gζ[2 + i] = -h.h_deriv(xs[i]);
        }

        let H = &mut c.hess;
        for j in 0..dim {
            for i in 0..=j {
                let val = gζ[i] * gζ[j] / ζ2;
                H[(i, j)] = val;
                H[(j, i)] = val;
            }
        }

        // -∇²ζ/ζ plus log-barrier diagonals
        let mut s_vv = T::zero();
        for i in 0..d {
            let x = xs[i];
            let h2 = h.h_deriv2(x);
            s_vv += x * x * h2;
            let x_vw = -x * h2 / (v * ζ);
            H[(1, 2 + i)] += x_vw;
            H[(2 + i, 1)] += x_vw;
            H[(2 + i, 2 + i)] += h2 / (v * ζ) + (w[i] * w[i]).recip();
        }
        H[(1, 1)] += s_vv / (v * ζ) + (v * v).recip();
    }
}

impl_cone_contract!(EpiPerSepSpectralVectorCone);

// -------------------------------------
// matrix domain
// -------------------------------------

/// `{ (u, v, svec(W)) : v > 0, W ≻ 0, u ≥ v·tr h(W/v) }` with barrier
/// `-log(u - v·tr h(W/v)) - log v - logdet W`, ν = side + 2.
///
/// The W-block of the Hessian combines `skron(W⁻¹)` with the
/// divided-difference kernel of h′ through [`eig_dot_kron`].
pub struct EpiPerSepSpectralMatrixCone<T> {
    core: ConeCore<T>,
    h: SepSpectralFun,
    side: usize,
    W: Matrix<T>,
    Winv: Matrix<T>,
    Θ: Matrix<T>,
    kron: Matrix<T>,
    Mwork1: Matrix<T>,
    Mwork2: Matrix<T>,
    eig: EigEngine<T>,
    eig_dual: EigEngine<T>,
    xs: Vec<T>,
}

impl<T> EpiPerSepSpectralMatrixCone<T>
where
    T: FloatT,
{
    pub fn new(h: SepSpectralFun, side: usize) -> Self {
        assert!(side >= 1);
        let sd = triangular_number(side);
        Self {
            core: ConeCore::new(2 + sd, T::from_usize(side + 2).unwrap()),
            h,
            side,
            W: Matrix::zeros((side, side)),
            Winv: Matrix::zeros((side, side)),
            Θ: Matrix::zeros((side, side)),
            kron: Matrix::zeros((sd, sd)),
            Mwork1: Matrix::zeros((side, side)),
            Mwork2: Matrix::zeros((side, side)),
            eig: EigEngine::new(side),
            eig_dual: EigEngine::new(side),
            xs: vec![T::zero(); side],
        }
    }

    fn sd(&self) -> usize {
        self.core.dim - 2
    }

    // svec(Q diag(coefs) Qᵀ) using the stored eigenvectors
    fn svec_from_eigs(&mut self, coefs: &[T], out: &mut [T]) {
        let n = self.side;
        for j in 0..n {
            for i in 0..n {
                let mut val = T::zero();
                for k in 0..n {
                    val += self.eig.V[(i, k)] * coefs[k] * self.eig.V[(j, k)];
                }
                self.Mwork1[(i, j)] = val;
            }
        }
        mat_to_svec(out, &self.Mwork1);
    }
}

impl<T> BarrierCone<T> for EpiPerSepSpectralMatrixCone<T>
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
        arr[1] = T::one();
        for k in 0..self.side {
            arr[2 + svec_diag_index(self.side, k)] = T::one();
        }
        arr[0] = T::from_usize(self.side).unwrap() * self.h.h(T::one()) + T::one();
    }

    fn update_feas(&mut self) -> bool {
        let feasible = {
            let s = &self.core.point;
            if !s.is_finite() || s[1] <= T::zero() {
                false
            } else {
                svec_to_mat(&mut self.W, &s[2..]);
                self.eig.eigen(&self.W).is_ok()
            }
        };
        if !feasible || self.eig.λ[0] <= T::zero() {
            return false;
        }
        let (u, v) = (self.core.point[0], self.core.point[1]);
        for (x, &λ) in self.xs.iter_mut().zip(&self.eig.λ) {
            *x = λ / v;
        }
        zeta(self.h, u, v, &self.xs) > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        let ok = {
            let z = &self.core.dual_point;
            if !z.is_finite() {
                return Some(false);
            }
            svec_to_mat(&mut self.Mwork2, &z[2..]);
            self.eig_dual.eigvals(&self.Mwork2).is_ok()
        };
        if !ok {
            return Some(false);
        }
        let z = &self.core.dual_point;
        Some(dual_feas_eigs(self.h, z[0], z[1], &self.eig_dual.λ))
    }

    fn update_grad(&mut self) {
        // NB: update_feas stored the eigendecomposition of W and xs
        let h = self.h;
        let (u, v) = (self.core.point[0], self.core.point[1]);
        let ζ = zeta(h, u, v, &self.xs);
        let ζv = zeta_v(h, &self.xs);
        let side = self.side;
        let sd = self.sd();

        // W⁻¹ from the eigendecomposition
        for j in 0..side {
            for i in 0..side {
                let mut val = T::zero();
                for k in 0..side {
                    val += self.eig.V[(i, k)] * self.eig.V[(j, k)] / self.eig.λ[k];
                }
                self.Winv[(i, j)] = val;
            }
        }

        self.core.grad[0] = -ζ.recip();
        self.core.grad[1] = -ζv / ζ - v.recip();

        // grad_W = svec(h'(W/v))/ζ - svec(W⁻¹)
        let mut coefs = std::mem::take(&mut self.xs);
        let saved = coefs.clone();
        for c in coefs.iter_mut() {
            *c = h.h_deriv(*c) / ζ;
        }
        let mut gw = std::mem::take(&mut self.core.work);
        self.svec_from_eigs(&coefs, &mut gw[0..sd]);
        self.core.work = gw;
        self.xs = saved;

        let mut winv_svec = std::mem::take(&mut self.core.work2);
        mat_to_svec(&mut winv_svec[0..sd], &self.Winv);
        for i in 0..sd {
            self.core.grad[2 + i] = self.core.work[i] - winv_svec[i];
        }
        self.core.work2 = winv_svec;
    }

    fn update_hess(&mut self) {
        let h = self.h;
        let (u, v) = (self.core.point[0], self.core.point[1]);
        let ζ = zeta(h, u, v, &self.xs);
        let ζv = zeta_v(h, &self.xs);
        let ζ2 = ζ * ζ;
        let side = self.side;
        let sd = self.sd();

        // Θ: first divided differences of h′ at the eigenvalues
        for j in 0..side {
            for i in 0..side {
                let (xi, xj) = (self.xs[i], self.xs[j]);
                self.Θ[(i, j)] = if (xi - xj).abs()
                    < T::epsilon().sqrt() * T::max(T::one(), xi.abs())
                {
                    h.h_deriv2((xi + xj) * (0.5).as_T())
                } else {
                    (h.h_deriv(xi) - h.h_deriv(xj)) / (xi - xj)
                };
            }
        }

        // ∇ζ_W = -svec(h'(W/v)) into work (recompute; grad stored a
        // different combination)
        let mut coefs = std::mem::take(&mut self.xs);
        let saved = coefs.clone();
        for c in coefs.iter_mut() {
            *c = -h.h_deriv(*c);
        }
        let mut gζw = std::mem::take(&mut self.core.work);
        self.svec_from_eigs(&coefs, &mut gζw[0..sd]);

        // ζ_vW = svec(Q diag(x h''(x)/v) Qᵀ) into work2
        for (c, &x) in coefs.iter_mut().zip(&saved) {
            *c = x * h.h_deriv2(x) / v;
        }
        let mut ζvw = std::mem::take(&mut self.core.work2);
        self.svec_from_eigs(&coefs, &mut ζvw[0..sd]);
        self.xs = saved;

        // kron pieces
        let mut eigkron = std::mem::replace(&mut self.kron, Matrix::zeros((0, 0)));
        eig_dot_kron(&mut eigkron, &self.Θ, &self.eig.V, &mut self.Mwork1, &mut self.Mwork2);

        let mut s_vv = T::zero();
        for &x in &self.xs {
            s_vv += x * x * h.h_deriv2(x);
        }

        let c = &mut self.core;
        let H = &mut c.hess;

        H[(0, 0)] = ζ2.recip();
        H[(0, 1)] = ζv / ζ2;
        H[(1, 0)] = H[(0, 1)];
        H[(1, 1)] = ζv * ζv / ζ2 + s_vv / (v * ζ) + (v * v).recip();
        for i in 0..sd {
            let hu = gζw[i] / ζ2;
            H[(0, 2 + i)] = hu;
            H[(2 + i, 0)] = hu;
            let hv = ζv * gζw[i] / ζ2 - ζvw[i] / ζ;
            H[(1, 2 + i)] = hv;
            H[(2 + i, 1)] = hv;
        }

        // W-block: ∇ζ∇ζᵀ/ζ² + eigkron(Θ)/(vζ) + skron(W⁻¹)
        let mut skr = std::mem::replace(&mut self.Mwork1, Matrix::zeros((0, 0)));
        skr.resize((sd, sd));
        symm_kron(&mut skr, &self.Winv);
        for j in 0..sd {
            for i in 0..sd {
                H[(2 + i, 2 + j)] =
                    gζw[i] * gζw[j] / ζ2 + eigkron[(i, j)] / (v * ζ) + skr[(i, j)];
            }
        }
        skr.resize((side, side));
        self.Mwork1 = skr;
        self.kron = eigkron;
        c.work = gζw;
        c.work2 = ζvw;
    }
}

impl_cone_contract!(EpiPerSepSpectralMatrixCone);
