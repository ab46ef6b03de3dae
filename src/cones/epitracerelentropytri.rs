use super::*;

// -------------------------------------
// Epigraph of trace relative entropy
// -------------------------------------

/// `{ (u, svec(V), svec(W)) : V ≻ 0, W ≻ 0,
///    u ≥ tr(W log W) - tr(W log V) }` with barrier
/// `-log(u - tr(W log W) + tr(W log V)) - logdet V - logdet W`,
/// ν = 2·side + 1.
///
/// Derivatives of the matrix logarithm are evaluated through
/// Daleckii-Krein divided-difference kernels at the eigenvalues.
pub struct EpiTraceRelEntropyTriCone<T> {
    core: ConeCore<T>,
    side: usize,
    V: Matrix<T>,
    W: Matrix<T>,
    Vinv: Matrix<T>,
    Winv: Matrix<T>,
    Wtil: Matrix<T>, // Qᵥᵀ W Qᵥ
    Γv: Matrix<T>,
    Γw: Matrix<T>,
    eig_v: EigEngine<T>,
    eig_w: EigEngine<T>,
    eig_dual: EigEngine<T>,
    Mw1: Matrix<T>,
    Mw2: Matrix<T>,
    kron_v: Matrix<T>,
    kron_w: Matrix<T>,
    gv: Vec<T>,
    gw: Vec<T>,
    φ: T,
}

impl<T> EpiTraceRelEntropyTriCone<T>
where
    T: FloatT,
{
    /// `dim` = 1 + 2·side(side+1)/2.
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 3 && dim % 2 == 1);
        let sd = (dim - 1) / 2;
        let side = triangular_side(sd);
        Self {
            core: ConeCore::new(dim, T::from_usize(2 * side + 1).unwrap()),
            side,
            V: Matrix::zeros((side, side)),
            W: Matrix::zeros((side, side)),
            Vinv: Matrix::zeros((side, side)),
            Winv: Matrix::zeros((side, side)),
            Wtil: Matrix::zeros((side, side)),
            Γv: Matrix::zeros((side, side)),
            Γw: Matrix::zeros((side, side)),
            eig_v: EigEngine::new(side),
            eig_w: EigEngine::new(side),
            eig_dual: EigEngine::new(side),
            Mw1: Matrix::zeros((side, side)),
            Mw2: Matrix::zeros((side, side)),
            kron_v: Matrix::zeros((sd, sd)),
            kron_w: Matrix::zeros((sd, sd)),
            gv: vec![T::zero(); sd],
            gw: vec![T::zero(); sd],
            φ: T::zero(),
        }
    }

    fn sd(&self) -> usize {
        (self.core.dim - 1) / 2
    }

    // Q diag(coefs) Qᵀ into `out`
    fn eig_recombine(Q: &Matrix<T>, coefs: &[T], out: &mut Matrix<T>) {
        let n = Q.nrows();
        for j in 0..n {
            for i in 0..n {
                let mut val = T::zero();
                for k in 0..n {
                    val += Q[(i, k)] * coefs[k] * Q[(j, k)];
                }
                out[(i, j)] = val;
            }
        }
    }

    fn fill_log_dd1(Γ: &mut Matrix<T>, λ: &[T]) {
        let n = λ.len();
        for j in 0..n {
            for i in 0..n {
                Γ[(i, j)] = log_dd1(λ[i], λ[j]);
            }
        }
    }
}

// first divided difference of log
fn log_dd1<T: FloatT>(a: T, b: T) -> T {
    let tol = T::epsilon().sqrt() * T::max(T::one(), a.abs());
    if (a - b).abs() < tol {
        (2.0).as_T() / (a + b)
    } else {
        (a.logsafe() - b.logsafe()) / (a - b)
    }
}

// second divided difference of log, symmetric in the outer arguments
fn log_dd2<T: FloatT>(a: T, b: T, c: T) -> T {
    let tol = T::epsilon().sqrt() * T::max(T::one(), a.abs());
    if (a - c).abs() > tol {
        (log_dd1(a, b) - log_dd1(b, c)) / (a - c)
    } else if (a - b).abs() > tol {
        (a.recip() - log_dd1(a, b)) / (a - b)
    } else {
        let m = (a + b + c) / (3.0).as_T();
        -(2.0).as_T().recip() / (m * m)
    }
}

impl<T> BarrierCone<T> for EpiTraceRelEntropyTriCone<T>
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
        // V = W = I gives zero relative entropy; u = 1 is interior
        let sd = self.sd();
        arr.set(T::zero());
        arr[0] = T::one();
        for k in 0..self.side {
            let d = svec_diag_index(self.side, k);
            arr[1 + d] = T::one();
            arr[1 + sd + d] = T::one();
        }
    }

    fn update_feas(&mut self) -> bool {
        let sd = self.sd();
        let eigs_ok = {
            let s = &self.core.point;
            if !s.is_finite() {
                false
            } else {
                svec_to_mat(&mut self.V, &s[1..1 + sd]);
                svec_to_mat(&mut self.W, &s[1 + sd..]);
                self.eig_v.eigen(&self.V).is_ok() && self.eig_w.eigen(&self.W).is_ok()
            }
        };
        if !eigs_ok || self.eig_v.λ[0] <= T::zero() || self.eig_w.λ[0] <= T::zero() {
            return false;
        }

        // Wtil = Qᵥᵀ W Qᵥ
        self.Mw1.gemm(
            MatrixShape::T,
            MatrixShape::N,
            &self.eig_v.V,
            &self.W,
            T::one(),
            T::zero(),
        );
        self.Wtil.gemm(
            MatrixShape::N,
            MatrixShape::N,
            &self.Mw1,
            &self.eig_v.V,
            T::one(),
            T::zero(),
        );

        // φ = u - Σ λw log λw + Σ_k log(λv_k)·Wtil_kk
        let mut φ = self.core.point[0];
        for &λ in &self.eig_w.λ {
            φ -= λ * λ.logsafe();
        }
        for k in 0..self.side {
            φ += self.eig_v.λ[k].logsafe() * self.Wtil[(k, k)];
        }
        self.φ = φ;
        φ > T::zero()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // sufficient condition (exact in the commuting case):
        // p > 0, Zv ≻ 0, Zw + p(log(Zv/p) + I) ≻ 0
        let sd = self.sd();
        let p = self.core.dual_point[0];
        if !self.core.dual_point.is_finite() || p <= T::zero() {
            return Some(false);
        }
        {
            let z = &self.core.dual_point;
            svec_to_mat(&mut self.Mw1, &z[1..1 + sd]);
        }
        if self.eig_dual.eigen(&self.Mw1).is_err() || self.eig_dual.λ[0] <= T::zero() {
            return Some(false);
        }
        // Mw2 = p·log(Zv/p)
        let coefs: Vec<T> = self
            .eig_dual
            .λ
            .iter()
            .map(|&λ| p * (λ / p).logsafe())
            .collect();
        Self::eig_recombine(&self.eig_dual.V, &coefs, &mut self.Mw2);
        {
            let z = &self.core.dual_point;
            svec_to_mat(&mut self.Mw1, &z[1 + sd..]);
        }
        for i in 0..self.side {
            for j in 0..self.side {
                self.Mw1[(i, j)] += self.Mw2[(i, j)];
            }
            self.Mw1[(i, i)] += p;
        }
        Some(self.eig_dual.eigvals(&self.Mw1).is_ok() && self.eig_dual.λ[0] > T::zero())
    }

    fn update_grad(&mut self) {
        let sd = self.sd();
        let side = self.side;
        let φ = self.φ;

        // inverses from the eigendecompositions
        let inv_v: Vec<T> = self.eig_v.λ.iter().map(|&λ| λ.recip()).collect();
        let inv_w: Vec<T> = self.eig_w.λ.iter().map(|&λ| λ.recip()).collect();
        Self::eig_recombine(&self.eig_v.V, &inv_v, &mut self.Vinv);
        Self::eig_recombine(&self.eig_w.V, &inv_w, &mut self.Winv);

        Self::fill_log_dd1(&mut self.Γv, &self.eig_v.λ);
        Self::fill_log_dd1(&mut self.Γw, &self.eig_w.λ);

        // ∇φ_V = Qᵥ (Γᵥ ∘ Wtil) Qᵥᵀ
        for j in 0..side {
            for i in 0..side {
                self.Mw1[(i, j)] = self.Γv[(i, j)] * self.Wtil[(i, j)];
            }
        }
        self.Mw2.gemm(
            MatrixShape::N,
            MatrixShape::N,
            &self.eig_v.V,
            &self.Mw1,
            T::one(),
            T::zero(),
        );
        self.Mw1.gemm(
            MatrixShape::N,
            MatrixShape::T,
            &self.Mw2,
            &self.eig_v.V,
            T::one(),
            T::zero(),
        );
        mat_to_svec(&mut self.gv, &self.Mw1);

        // ∇φ_W = log V - log W - I
        let logv: Vec<T> = self.eig_v.λ.iter().map(|&λ| λ.logsafe()).collect();
        Self::eig_recombine(&self.eig_v.V, &logv, &mut self.Mw1);
        let logw: Vec<T> = self.eig_w.λ.iter().map(|&λ| λ.logsafe()).collect();
        Self::eig_recombine(&self.eig_w.V, &logw, &mut self.Mw2);
        for j in 0..side {
            for i in 0..side {
                let v = self.Mw1[(i, j)] - self.Mw2[(i, j)];
                self.Mw1[(i, j)] = if i == j { v - T::one() } else { v };
            }
        }
        mat_to_svec(&mut self.gw, &self.Mw1);

        // grad = -∇φ/φ - (0, svec(V⁻¹), svec(W⁻¹))
        self.core.grad[0] = -φ.recip();
        let mut tmp = std::mem::take(&mut self.core.work);
        mat_to_svec(&mut tmp[0..sd], &self.Vinv);
        for i in 0..sd {
            self.core.grad[1 + i] = -self.gv[i] / φ - tmp[i];
        }
        mat_to_svec(&mut tmp[0..sd], &self.Winv);
        for i in 0..sd {
            self.core.grad[1 + sd + i] = -self.gw[i] / φ - tmp[i];
        }
        self.core.work = tmp;
    }

    fn update_hess(&mut self) {
        let sd = self.sd();
        let side = self.side;
        let φ = self.φ;
        let φ2 = φ * φ;

        // divided-difference kron operators for Dlog at V and W
        {
            let mut kv = std::mem::replace(&mut self.kron_v, Matrix::zeros((0, 0)));
            eig_dot_kron(&mut kv, &self.Γv, &self.eig_v.V, &mut self.Mw1, &mut self.Mw2);
            self.kron_v = kv;
            let mut kw = std::mem::replace(&mut self.kron_w, Matrix::zeros((0, 0)));
            eig_dot_kron(&mut kw, &self.Γw, &self.eig_w.V, &mut self.Mw1, &mut self.Mw2);
            self.kron_w = kw;
        }

        let H = &mut self.core.hess;

        // u row/column and the rank-one ∇φ∇φᵀ/φ² part
        H[(0, 0)] = φ2.recip();
        for i in 0..sd {
            let hv = self.gv[i] / φ2;
            H[(0, 1 + i)] = hv;
            H[(1 + i, 0)] = hv;
            let hw = self.gw[i] / φ2;
            H[(0, 1 + sd + i)] = hw;
            H[(1 + sd + i, 0)] = hw;
        }
        for j in 0..sd {
            for i in 0..sd {
                H[(1 + i, 1 + j)] = self.gv[i] * self.gv[j] / φ2;
                H[(1 + i, 1 + sd + j)] = self.gv[i] * self.gw[j] / φ2 - self.kron_v[(i, j)] / φ;
                H[(1 + sd + j, 1 + i)] = H[(1 + i, 1 + sd + j)];
                H[(1 + sd + i, 1 + sd + j)] =
                    self.gw[i] * self.gw[j] / φ2 + self.kron_w[(i, j)] / φ;
            }
        }

        // V-V block: -dΨ/φ where Ψ(V) = Dlog(V)†[W], via second divided
        // differences in V's eigenbasis, column by svec column
        let isqrt2 = T::FRAC_1_SQRT_2();
        let mut col = vec![T::zero(); sd];
        for (c, (k, l)) in svec_pairs(side).enumerate() {
            // Htil = Qᵥᵀ E_kl Qᵥ expressed through rows of Qᵥ
            let scale = if k == l { T::one() } else { isqrt2 };
            for b in 0..side {
                for a in 0..side {
                    let v = self.eig_v.V[(k, a)] * self.eig_v.V[(l, b)]
                        + self.eig_v.V[(l, a)] * self.eig_v.V[(k, b)];
                    self.Mw1[(a, b)] = scale * v * if k == l { (0.5).as_T() } else { T::one() };
                }
            }
            // B₀_ij = Σ_k (Wtil_ik Htil_kj + Htil_ik Wtil_kj)·log[λi,λk,λj]
            for j in 0..side {
                for i in 0..side {
                    let mut val = T::zero();
                    for m in 0..side {
                        val += (self.Wtil[(i, m)] * self.Mw1[(m, j)]
                            + self.Mw1[(i, m)] * self.Wtil[(m, j)])
                            * log_dd2(self.eig_v.λ[i], self.eig_v.λ[m], self.eig_v.λ[j]);
                    }
                    self.Mw2[(i, j)] = val;
                }
            }
            // back to the standard basis
            self.Mw1.gemm(
                MatrixShape::N,
                MatrixShape::N,
                &self.eig_v.V,
                &self.Mw2,
                T::one(),
                T::zero(),
            );
            self.Mw2.gemm(
                MatrixShape::N,
                MatrixShape::T,
                &self.Mw1,
                &self.eig_v.V,
                T::one(),
                T::zero(),
            );
            mat_to_svec(&mut col, &self.Mw2);
            for r in 0..sd {
                self.core.hess[(1 + r, 1 + c)] -= col[r] / φ;
            }
        }

        // log-barrier curvature of -logdet V - logdet W
        {
            let mut skr = std::mem::replace(&mut self.Mw1, Matrix::zeros((0, 0)));
            skr.resize((sd, sd));
            symm_kron(&mut skr, &self.Vinv);
            for j in 0..sd {
                for i in 0..sd {
                    self.core.hess[(1 + i, 1 + j)] += skr[(i, j)];
                }
            }
            symm_kron(&mut skr, &self.Winv);
            for j in 0..sd {
                for i in 0..sd {
                    self.core.hess[(1 + sd + i, 1 + sd + j)] += skr[(i, j)];
                }
            }
            skr.resize((side, side));
            self.Mw1 = skr;
        }
    }
}

impl_cone_contract!(EpiTraceRelEntropyTriCone);
