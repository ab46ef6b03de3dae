use super::*;

// -------------------------------------
// Linear matrix inequality cone
// -------------------------------------

/// `{ s : Σᵢ sᵢ Aᵢ ≻ 0 }` for fixed symmetric matrices Aᵢ, with barrier
/// `-logdet(Σᵢ sᵢ Aᵢ)`, ν = side.
///
/// The first matrix must be positive definite so that e₁ is an interior
/// anchor.
pub struct LinMatrixIneqCone<T> {
    core: ConeCore<T>,
    As: Vec<Matrix<T>>,
    side: usize,
    S: Matrix<T>,
    Sinv: Matrix<T>,
    Ms: Vec<Matrix<T>>,
    chol: CholeskyEngine<T>,
}

impl<T> LinMatrixIneqCone<T>
where
    T: FloatT,
{
    pub fn new(As: Vec<Matrix<T>>) -> Self {
        assert!(!As.is_empty());
        let side = As[0].nrows();
        assert!(As.iter().all(|A| A.nrows() == side && A.ncols() == side));

        // A₁ ≻ 0 is required for the initial point
        let mut chol = CholeskyEngine::new(side);
        assert!(chol.factor(&As[0]).is_ok(), "leading matrix must be positive definite");

        let dim = As.len();
        Self {
            core: ConeCore::new(dim, side.as_T()),
            Ms: As.iter().map(|_| Matrix::zeros((side, side))).collect(),
            As,
            side,
            S: Matrix::zeros((side, side)),
            Sinv: Matrix::zeros((side, side)),
            chol,
        }
    }

    fn form_s(&mut self) {
        let n2 = self.side * self.side;
        self.S.data_mut().set(T::zero());
        for (coef, A) in self.core.point.iter().zip(&self.As) {
            for k in 0..n2 {
                self.S.data[k] += *coef * A.data[k];
            }
        }
    }
}

impl<T> BarrierCone<T> for LinMatrixIneqCone<T>
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
        arr[0] = T::one();
    }

    fn update_feas(&mut self) -> bool {
        if !self.core.point.is_finite() {
            return false;
        }
        self.form_s();
        self.chol.factor(&self.S).is_ok()
    }

    fn update_grad(&mut self) {
        self.chol.inverse_into(&mut self.Sinv);
        self.Sinv.symmetrize_from_triu();
        for (i, A) in self.As.iter().enumerate() {
            self.Ms[i].gemm(MatrixShape::N, MatrixShape::N, &self.Sinv, A, T::one(), T::zero());
            let mut tr = T::zero();
            for k in 0..self.side {
                tr += self.Ms[i][(k, k)];
            }
            self.core.grad[i] = -tr;
        }
    }

    fn update_hess(&mut self) {
        let dim = self.core.dim;
        let n = self.side;
        for i in 0..dim {
            for j in 0..=i {
                // tr(Mᵢ Mⱼ)
                let mut v = T::zero();
                for a in 0..n {
                    for b in 0..n {
                        v += self.Ms[i][(a, b)] * self.Ms[j][(b, a)];
                    }
                }
                self.core.hess[(i, j)] = v;
                self.core.hess[(j, i)] = v;
            }
        }
    }
}

impl_cone_contract!(LinMatrixIneqCone);
