use super::*;

// -------------------------------------
// WSOS interpolation cone, nonnegative
// -------------------------------------

/// Interpolant basis cone of weighted sums-of-squares polynomials that
/// are nonnegative on the underlying domain: `s` holds the values of a
/// polynomial at `U` interpolation points, and membership requires
/// `Λ_ℓ(s) = P_ℓᵀ Diag(s) P_ℓ ≻ 0` for every basis matrix `P_ℓ`.
///
/// Barrier: `-Σ_ℓ logdet Λ_ℓ(s)`, ν = Σ_ℓ L_ℓ.
pub struct WSOSInterpNonnegativeCone<T> {
    core: ConeCore<T>,
    Ps: Vec<Matrix<T>>,
    chols: Vec<CholeskyEngine<T>>,
    lambdas: Vec<Matrix<T>>,
    // Bs[ℓ] = P_ℓ Λ_ℓ⁻¹ P_ℓᵀ
    Bs: Vec<Matrix<T>>,
    scaled: Vec<Matrix<T>>,
}

impl<T> WSOSInterpNonnegativeCone<T>
where
    T: FloatT,
{
    /// `U` interpolation points and one `U × L_ℓ` basis matrix per term.
    pub fn new(U: usize, Ps: Vec<Matrix<T>>) -> Self {
        assert!(!Ps.is_empty());
        assert!(Ps.iter().all(|P| P.nrows() == U && P.ncols() <= U && P.ncols() >= 1));
        let nu: usize = Ps.iter().map(|P| P.ncols()).sum();
        let chols = Ps.iter().map(|P| CholeskyEngine::new(P.ncols())).collect();
        let lambdas = Ps.iter().map(|P| Matrix::zeros((P.ncols(), P.ncols()))).collect();
        let Bs = Ps.iter().map(|_| Matrix::zeros((U, U))).collect();
        let scaled = Ps.iter().map(|P| Matrix::zeros((U, P.ncols()))).collect();
        Self {
            core: ConeCore::new(U, nu.as_T()),
            Ps,
            chols,
            lambdas,
            Bs,
            scaled,
        }
    }
}

impl<T> BarrierCone<T> for WSOSInterpNonnegativeCone<T>
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
        if !self.core.point.is_finite() {
            return false;
        }
        let s = &self.core.point;
        for (((P, Λ), M), chol) in self
            .Ps
            .iter()
            .zip(&mut self.lambdas)
            .zip(&mut self.scaled)
            .zip(&mut self.chols)
        {
            // M = Diag(s) P, Λ = Pᵀ M
            let (U, L) = (P.nrows(), P.ncols());
            for j in 0..L {
                for i in 0..U {
                    M[(i, j)] = s[i] * P[(i, j)];
                }
            }
            Λ.gemm(MatrixShape::T, MatrixShape::N, P, M, T::one(), T::zero());
            if chol.factor(Λ).is_err() {
                return false;
            }
        }
        true
    }

    fn update_grad(&mut self) {
        self.core.grad.set(T::zero());
        for (P, (B, chol)) in self
            .Ps
            .iter()
            .zip(self.Bs.iter_mut().zip(&self.chols))
        {
            let (U, L) = (P.nrows(), P.ncols());
            // X = Λ⁻¹ Pᵀ, then B = P X
            let mut X = Matrix::zeros((L, U));
            for j in 0..U {
                for i in 0..L {
                    X[(i, j)] = P[(j, i)];
                }
            }
            chol.solve_mat(&mut X);
            B.gemm(MatrixShape::N, MatrixShape::N, P, &X, T::one(), T::zero());
            for u in 0..U {
                self.core.grad[u] -= B[(u, u)];
            }
        }
    }

    fn update_hess(&mut self) {
        let U = self.core.dim;
        let H = &mut self.core.hess;
        H.data_mut().set(T::zero());
        for B in &self.Bs {
            for j in 0..U {
                for i in 0..U {
                    H[(i, j)] += B[(i, j)] * B[(i, j)];
                }
            }
        }
    }
}

impl_cone_contract!(WSOSInterpNonnegativeCone);

// ---------------------------------------------------------------
// shared helpers for the block WSOS cones
// ---------------------------------------------------------------

// Bfull = (I_R ⊗ P) V (I_R ⊗ P)ᵀ, with V given as a dense RL × RL matrix
pub(crate) fn wsos_block_sandwich<T: FloatT>(
    P: &Matrix<T>,
    V: &Matrix<T>,
    R: usize,
    Bfull: &mut Matrix<T>,
) {
    let (U, L) = (P.nrows(), P.ncols());
    debug_assert!(V.nrows() == R * L && Bfull.nrows() == R * U);

    let mut Vab = Matrix::<T>::zeros((L, L));
    let mut VPt = Matrix::<T>::zeros((L, U));
    let mut Bab = Matrix::<T>::zeros((U, U));

    for a in 0..R {
        for b in 0..R {
            for j in 0..L {
                for i in 0..L {
                    Vab[(i, j)] = V[(a * L + i, b * L + j)];
                }
            }
            VPt.gemm(MatrixShape::N, MatrixShape::T, &Vab, P, T::one(), T::zero());
            Bab.gemm(MatrixShape::N, MatrixShape::N, P, &VPt, T::one(), T::zero());
            for j in 0..U {
                for i in 0..U {
                    Bfull[(a * U + i, b * U + j)] = Bab[(i, j)];
                }
            }
        }
    }
}

// Λ(σ) = Pᵀ Diag(σ) P accumulated into the (a, b) block of `out`
pub(crate) fn wsos_lambda_block<T: FloatT>(
    P: &Matrix<T>,
    σ: impl Fn(usize) -> T,
    out: &mut Matrix<T>,
    a: usize,
    b: usize,
    scaled: &mut Matrix<T>,
    block: &mut Matrix<T>,
) {
    let (U, L) = (P.nrows(), P.ncols());
    for j in 0..L {
        for i in 0..U {
            scaled[(i, j)] = σ(i) * P[(i, j)];
        }
    }
    block.gemm(MatrixShape::T, MatrixShape::N, P, scaled, T::one(), T::zero());
    for j in 0..L {
        for i in 0..L {
            out[(a * L + i, b * L + j)] = block[(i, j)];
        }
    }
}
