use super::*;
use super::wsosinterpnonnegative::wsos_lambda_block;

// -------------------------------------
// WSOS interpolation cone, ℓ∞ norm of polynomials
// -------------------------------------

/// Interpolant cone for `|f_r(x)| ≤ f_1(x)` on the domain, for
/// r = 2..R: the point stacks R blocks of `U` values.  Membership
/// requires, for each ℓ and r, that the pair
/// `Λ_ℓ(s_1 + s_r) ≻ 0` and `Λ_ℓ(s_1 - s_r) ≻ 0`
/// (the similarity-split of the 2×2 block arrow matrix).
///
/// Barrier: `-Σ_ℓ [ Σ_r (logdet Λ(s₁+s_r) + logdet Λ(s₁-s_r))
///                  - (R-2)·logdet Λ(s₁) ]`, ν = Σ_ℓ R·L_ℓ.
pub struct WSOSInterpEpiNormInfCone<T> {
    core: ConeCore<T>,
    R: usize,
    U: usize,
    Ps: Vec<Matrix<T>>,
    // per ℓ: factorization and B-matrix of Λ(s₁), then of the ± pair
    // for each r ≥ 2 (index 2(r-2) for +, 2(r-2)+1 for -)
    chol0: Vec<CholeskyEngine<T>>,
    chol_pm: Vec<Vec<CholeskyEngine<T>>>,
    B0: Vec<Matrix<T>>,
    B_pm: Vec<Vec<Matrix<T>>>,
    lambda: Vec<Matrix<T>>,
    scaled: Vec<Matrix<T>>,
    blockwork: Vec<Matrix<T>>,
}

impl<T> WSOSInterpEpiNormInfCone<T>
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
            chol0: Ps.iter().map(|P| CholeskyEngine::new(P.ncols())).collect(),
            chol_pm: Ps
                .iter()
                .map(|P| (0..2 * (R - 1)).map(|_| CholeskyEngine::new(P.ncols())).collect())
                .collect(),
            B0: Ps.iter().map(|_| Matrix::zeros((U, U))).collect(),
            B_pm: Ps
                .iter()
                .map(|_| (0..2 * (R - 1)).map(|_| Matrix::zeros((U, U))).collect())
                .collect(),
            lambda: Ps.iter().map(|P| Matrix::zeros((P.ncols(), P.ncols()))).collect(),
            scaled: Ps.iter().map(|P| Matrix::zeros((U, P.ncols()))).collect(),
            blockwork: Ps
                .iter()
                .map(|P| Matrix::zeros((P.ncols(), P.ncols())))
                .collect(),
            Ps,
        }
    }

    // B = P Λ(σ)⁻¹ Pᵀ for the given per-point weights; factors into chol
    fn factor_and_b(
        P: &Matrix<T>,
        σ: impl Fn(usize) -> T,
        chol: &mut CholeskyEngine<T>,
        B: &mut Matrix<T>,
        lambda: &mut Matrix<T>,
        scaled: &mut Matrix<T>,
        blockwork: &mut Matrix<T>,
    ) -> bool {
        let (U, L) = (P.nrows(), P.ncols());
        wsos_lambda_block(P, σ, lambda, 0, 0, scaled, blockwork);
        if chol.factor(lambda).is_err() {
            return false;
        }
        let mut X = Matrix::zeros((L, U));
        for j in 0..U {
            for i in 0..L {
                X[(i, j)] = P[(j, i)];
            }
        }
        chol.solve_mat(&mut X);
        B.gemm(MatrixShape::N, MatrixShape::N, P, &X, T::one(), T::zero());
        true
    }
}

impl<T> BarrierCone<T> for WSOSInterpEpiNormInfCone<T>
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
            for r in 1..R {
                for (pm, sign) in [(0usize, T::one()), (1usize, -T::one())] {
                    let s = &self.core.point;
                    let σ = |u: usize| s[u] + sign * s[r * U + u];
                    let idx = 2 * (r - 1) + pm;
                    if !Self::factor_and_b(
                        &self.Ps[l],
                        σ,
                        &mut self.chol_pm[l][idx],
                        &mut self.B_pm[l][idx],
                        &mut self.lambda[l],
                        &mut self.scaled[l],
                        &mut self.blockwork[l],
                    ) {
                        return false;
                    }
                }
            }
            // Λ(s₁) on its own, for the (R-2) compensating term
            let s = &self.core.point;
            let σ = |u: usize| s[u];
            if !Self::factor_and_b(
                &self.Ps[l],
                σ,
                &mut self.chol0[l],
                &mut self.B0[l],
                &mut self.lambda[l],
                &mut self.scaled[l],
                &mut self.blockwork[l],
            ) {
                return false;
            }
        }
        true
    }

    fn update_grad(&mut self) {
        // B matrices were refreshed during the feasibility check
        let (R, U) = (self.R, self.U);
        let rm2 = T::from_usize(R - 2).unwrap();
        self.core.grad.set(T::zero());
        for l in 0..self.Ps.len() {
            for u in 0..U {
                let mut g1 = rm2 * self.B0[l][(u, u)];
                for r in 1..R {
                    let bp = self.B_pm[l][2 * (r - 1)][(u, u)];
                    let bm = self.B_pm[l][2 * (r - 1) + 1][(u, u)];
                    g1 -= bp + bm;
                    self.core.grad[r * U + u] -= bp - bm;
                }
                self.core.grad[u] += g1;
            }
        }
    }

    fn update_hess(&mut self) {
        let (R, U) = (self.R, self.U);
        let rm2 = T::from_usize(R - 2).unwrap();
        self.core.hess.data_mut().set(T::zero());

        for l in 0..self.Ps.len() {
            for u in 0..U {
                for v in 0..U {
                    let b0 = self.B0[l][(u, v)];
                    let mut h11 = -rm2 * b0 * b0;
                    for r in 1..R {
                        let bp = self.B_pm[l][2 * (r - 1)][(u, v)];
                        let bm = self.B_pm[l][2 * (r - 1) + 1][(u, v)];
                        let (bp2, bm2) = (bp * bp, bm * bm);
                        h11 += bp2 + bm2;
                        self.core.hess[(r * U + u, r * U + v)] += bp2 + bm2;
                        self.core.hess[(u, r * U + v)] += bp2 - bm2;
                        self.core.hess[(r * U + u, v)] += bp2 - bm2;
                    }
                    self.core.hess[(u, v)] += h11;
                }
            }
        }
    }
}

impl_cone_contract!(WSOSInterpEpiNormInfCone);
