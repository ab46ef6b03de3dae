use super::*;
use super::wsosinterpnonnegative::{wsos_block_sandwich, wsos_lambda_block};

// -------------------------------------
// WSOS interpolation cone, PSD matrices of polynomials
// -------------------------------------

/// Interpolant cone of R × R symmetric polynomial matrices that admit a
/// weighted sums-of-squares certificate: the point stacks, for every
/// svec pair (r1 ≥ r2), the values of entry (r1, r2) at `U` points, with
/// the usual √2 off-diagonal scaling.  Membership requires the block
/// matrix `Λ_ℓ(s)`, with (r1, r2) block `P_ℓᵀ Diag(s_{r1r2}) P_ℓ`, to be
/// positive definite for every ℓ.
///
/// Barrier: `-Σ_ℓ logdet Λ_ℓ(s)`, ν = Σ_ℓ R·L_ℓ.
pub struct WSOSInterpPosSemidefTriCone<T> {
    core: ConeCore<T>,
    R: usize,
    U: usize,
    Ps: Vec<Matrix<T>>,
    chols: Vec<CholeskyEngine<T>>,
    lambdas: Vec<Matrix<T>>,
    Vs: Vec<Matrix<T>>,
    Bs: Vec<Matrix<T>>,
    scaled: Vec<Matrix<T>>,
    blockwork: Vec<Matrix<T>>,
}

impl<T> WSOSInterpPosSemidefTriCone<T>
where
    T: FloatT,
{
    pub fn new(R: usize, U: usize, Ps: Vec<Matrix<T>>) -> Self {
        assert!(R >= 1 && !Ps.is_empty());
        assert!(Ps.iter().all(|P| P.nrows() == U && P.ncols() >= 1));
        let dim = triangular_number(R) * U;
        let nu: usize = Ps.iter().map(|P| R * P.ncols()).sum();
        Self {
            core: ConeCore::new(dim, nu.as_T()),
            R,
            U,
            chols: Ps.iter().map(|P| CholeskyEngine::new(R * P.ncols())).collect(),
            lambdas: Ps
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

    // index of the (r1 ≥ r2, u) coordinate
    fn coord(&self, pair_idx: usize, u: usize) -> usize {
        pair_idx * self.U + u
    }
}

impl<T> BarrierCone<T> for WSOSInterpPosSemidefTriCone<T>
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
        // identity polynomial matrix: ones on diagonal blocks
        arr.set(T::zero());
        for (p, (r1, r2)) in svec_pairs(self.R).enumerate() {
            if r1 == r2 {
                for u in 0..self.U {
                    arr[p * self.U + u] = T::one();
                }
            }
        }
    }

    fn update_feas(&mut self) -> bool {
        if !self.core.point.is_finite() {
            return false;
        }
        let isqrt2 = T::FRAC_1_SQRT_2();
        let U = self.U;
        let R = self.R;
        for l in 0..self.Ps.len() {
            for (p, (r1, r2)) in svec_pairs(R).enumerate() {
                let scal = if r1 == r2 { T::one() } else { isqrt2 };
                let base = p * U;
                let s = &self.core.point;
                let σ = |u: usize| s[base + u] * scal;
                wsos_lambda_block(
                    &self.Ps[l],
                    σ,
                    &mut self.lambdas[l],
                    r1,
                    r2,
                    &mut self.scaled[l],
                    &mut self.blockwork[l],
                );
                if r1 != r2 {
                    // mirror block
                    let L = self.Ps[l].ncols();
                    for j in 0..L {
                        for i in 0..L {
                            self.lambdas[l][(r2 * L + i, r1 * L + j)] =
                                self.lambdas[l][(r1 * L + j, r2 * L + i)];
                        }
                    }
                }
            }
            if self.chols[l].factor(&self.lambdas[l]).is_err() {
                return false;
            }
        }
        true
    }

    fn update_grad(&mut self) {
        let sqrt2 = T::SQRT_2();
        let (R, U) = (self.R, self.U);
        self.core.grad.set(T::zero());
        for l in 0..self.Ps.len() {
            self.chols[l].inverse_into(&mut self.Vs[l]);
            self.Vs[l].symmetrize_from_triu();
            wsos_block_sandwich(&self.Ps[l], &self.Vs[l], R, &mut self.Bs[l]);

            let B = &self.Bs[l];
            for (p, (r1, r2)) in svec_pairs(R).enumerate() {
                let scal = if r1 == r2 { T::one() } else { sqrt2 };
                for u in 0..U {
                    self.core.grad[self.coord(p, u)] -= scal * B[(r1 * U + u, r2 * U + u)];
                }
            }
        }
    }

    fn update_hess(&mut self) {
        let (R, U) = (self.R, self.U);
        let isqrt2 = T::FRAC_1_SQRT_2();
        self.core.hess.data_mut().set(T::zero());

        for l in 0..self.Ps.len() {
            let B = &self.Bs[l];
            for (p1, (a, b)) in svec_pairs(R).enumerate() {
                let γ1 = if a == b { T::one() } else { isqrt2 };
                for (p2, (c, d)) in svec_pairs(R).enumerate() {
                    if p2 < p1 {
                        continue;
                    }
                    let γ2 = if c == d { T::one() } else { isqrt2 };
                    for u in 0..U {
                        for v in 0..U {
                            // visit each unordered coordinate pair once
                            if p1 == p2 && v < u {
                                continue;
                            }
                            // sum tr(V A_{p1,u} V A_{p2,v}) over the
                            // symmetrized block pairs
                            let term = |x: usize, y: usize, z: usize, w: usize| {
                                B[(y * U + u, z * U + v)] * B[(w * U + v, x * U + u)]
                            };
                            let mut val = term(a, b, c, d);
                            if c != d {
                                val += term(a, b, d, c);
                            }
                            if a != b {
                                val += term(b, a, c, d);
                                if c != d {
                                    val += term(b, a, d, c);
                                }
                            }
                            val *= γ1 * γ2;
                            let (k1, k2) = (self.coord(p1, u), self.coord(p2, v));
                            self.core.hess[(k1, k2)] += val;
                            if k1 != k2 {
                                self.core.hess[(k2, k1)] += val;
                            }
                        }
                    }
                }
            }
        }
    }
}

impl_cone_contract!(WSOSInterpPosSemidefTriCone);
