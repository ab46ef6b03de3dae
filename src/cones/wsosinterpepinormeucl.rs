use super::*;
use super::wsosinterpnonnegative::{wsos_block_sandwich, wsos_lambda_block};

// -------------------------------------
// WSOS interpolation cone, Euclidean norm of polynomials
// -------------------------------------

/// Interpolant cone for `‖(f_2, …, f_R)(x)‖₂ ≤ f_1(x)` on the domain:
/// the point stacks R blocks of `U` values.  Membership requires, per ℓ,
/// positive definiteness of the block arrow matrix with diagonal blocks
/// `Λ_ℓ(s_1)` and first block row/column `Λ_ℓ(s_r)`.
///
/// Barrier: `-Σ_ℓ logdet(arrow_ℓ(s))`, ν = Σ_ℓ R·L_ℓ.
pub struct WSOSInterpEpiNormEuclCone<T> {
    core: ConeCore<T>,
    R: usize,
    U: usize,
    Ps: Vec<Matrix<T>>,
    chols: Vec<CholeskyEngine<T>>,
    arrows: Vec<Matrix<T>>,
    Vs: Vec<Matrix<T>>,
    Bs: Vec<Matrix<T>>,
    scaled: Vec<Matrix<T>>,
    blockwork: Vec<Matrix<T>>,
}

impl<T> WSOSInterpEpiNormEuclCone<T>
where
    T: FloatT,
{
    pub fn new(R: usize, U: usize, Ps: Vec<Matrix<T>>) -> Self {
        assert!(R >= 2 && !Ps.is_empty());
        assert!(Ps.iter().all(|P| P.nrows() == U && P.ncols() >= 1));
        let nu: usize = Ps.iter().map(|P| R * P.ncols()).sum();
        Self {
            core: ConeCore::new(R * U, nu.as_T()),
            R,
            U,
            chols: Ps.iter().map(|P| CholeskyEngine::new(R * P.ncols())).collect(),
            arrows: Ps
                .iter()
                .map(|P| Matrix::zeros((R * P.ncols(), R * P.ncols())))
                .collect(),
            Vs: Ps
                .iter()
                .map(|P| Matrix::zeros((R * P.ncols(), R * P.ncols())))
                .collect(),
            Bs: Ps.iter().map(|_| Matrix::zeros((R * U, R * U))).collect(),
            scaled: Ps.iter().map(|P| Matrix::zeros((U, P.ncols()))).collect(),
            blockwork: Ps
                .iter()
                .map(|P| Matrix::zeros((P.ncols(), P.ncols())))
                .collect(),
            Ps,
        }
    }
}

impl<T> BarrierCone<T> for WSOSInterpEpiNormEuclCone<T>
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
        for u in 0..self.U {
            arr[u] = T::one();
        }
    }

    fn update_feas(&mut self) -> bool {
        if !self.core.point.is_finite() {
            return false;
        }
        let (R, U) = (self.R, self.U);
        for l in 0..self.Ps.len() {
            self.arrows[l].data_mut().set(T::zero());
            // diagonal blocks all carry Λ(s₁)
            for a in 0..R {
                let s = &self.core.point;
                let σ = |u: usize| s[u];
                wsos_lambda_block(
                    &self.Ps[l],
                    σ,
                    &mut self.arrows[l],
                    a,
                    a,
                    &mut self.scaled[l],
                    &mut self.blockwork[l],
                );
            }
            // border blocks carry Λ(s_r)
            for r in 1..R {
                let s = &self.core.point;
                let σ = |u: usize| s[r * U + u];
                wsos_lambda_block(
                    &self.Ps[l],
                    σ,
                    &mut self.arrows[l],
                    0,
                    r,
                    &mut self.scaled[l],
                    &mut self.blockwork[l],
                );
                let L = self.Ps[l].ncols();
                for j in 0..L {
                    for i in 0..L {
                        self.arrows[l][(r * L + i, j)] = self.arrows[l][(j, r * L + i)];
                    }
                }
            }
            if self.chols[l].factor(&self.arrows[l]).is_err() {
                return false;
            }
        }
        true
    }

    fn update_grad(&mut self) {
        let (R, U) = (self.R, self.U);
        self.core.grad.set(T::zero());
        for l in 0..self.Ps.len() {
            self.chols[l].inverse_into(&mut self.Vs[l]);
            self.Vs[l].symmetrize_from_triu();
            wsos_block_sandwich(&self.Ps[l], &self.Vs[l], R, &mut self.Bs[l]);

            let B = &self.Bs[l];
            for u in 0..U {
                let mut g1 = T::zero();
                for a in 0..R {
                    g1 -= B[(a * U + u, a * U + u)];
                }
                self.core.grad[u] += g1;
                for r in 1..R {
                    self.core.grad[r * U + u] -= (2.0).as_T() * B[(u, r * U + u)];
                }
            }
        }
    }

    fn update_hess(&mut self) {
        let (R, U) = (self.R, self.U);
        let two: T = (2.0).as_T();
        self.core.hess.data_mut().set(T::zero());

        for l in 0..self.Ps.len() {
            let B = &self.Bs[l];
            for u in 0..U {
                for v in 0..U {
                    // (1,u)-(1,v): Σ_{a,c} B_{ac}(u,v)²
                    if v >= u {
                        let mut h = T::zero();
                        for a in 0..R {
                            for c in 0..R {
                                let x = B[(a * U + u, c * U + v)];
                                h += x * x;
                            }
                        }
                        self.core.hess[(u, v)] += h;
                        if u != v {
                            self.core.hess[(v, u)] += h;
                        }
                    }
                    // (1,u)-(r,v): 2 Σ_a B_{a1}(u,v)·B_{ar}(u,v)
                    for r in 1..R {
                        let mut h = T::zero();
                        for a in 0..R {
                            h += B[(a * U + u, v)] * B[(a * U + u, r * U + v)];
                        }
                        h *= two;
                        self.core.hess[(u, r * U + v)] += h;
                        self.core.hess[(r * U + v, u)] += h;
                    }
                    // (r,u)-(r',v): 2(B₁ᵣ(v,u)·B₁ᵣ'(u,v) + B₁₁(u,v)·Bᵣᵣ'(u,v))
                    for r in 1..R {
                        for rp in r..R {
                            if r == rp && v < u {
                                continue;
                            }
                            let h = two
                                * (B[(v, r * U + u)] * B[(u, rp * U + v)]
                                    + B[(u, v)] * B[(r * U + u, rp * U + v)]);
                            let (k1, k2) = (r * U + u, rp * U + v);
                            self.core.hess[(k1, k2)] += h;
                            if k1 != k2 {
                                self.core.hess[(k2, k1)] += h;
                            }
                        }
                    }
                }
            }
        }
    }
}

impl_cone_contract!(WSOSInterpEpiNormEuclCone);
