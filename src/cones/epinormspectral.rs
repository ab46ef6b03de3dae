use super::*;

// -------------------------------------
// Epigraph of the spectral norm
// -------------------------------------

/// `{ (u, vec(W)) : u ≥ σ_max(W) }` for W of size d1 × d2 (d1 ≤ d2,
/// columns flattened), with barrier
/// `-logdet(u²I - WWᵀ) + (d1 - 1) log u`, ν = d1 + 1.
///
/// With the dual-barrier flag this models the nuclear-norm epigraph
/// (the dual cone).
pub struct EpiNormSpectralCone<T> {
    core: ConeCore<T>,
    d1: usize,
    d2: usize,
    W: Matrix<T>,
    Z: Matrix<T>,
    Zinv: Matrix<T>,
    ZiW: Matrix<T>,
    Ma: Matrix<T>,
    Mb: Matrix<T>,
    chol: CholeskyEngine<T>,
    svd: SVDEngine<T>,
}

impl<T> EpiNormSpectralCone<T>
where
    T: FloatT,
{
    pub fn new(d1: usize, d2: usize) -> Self {
        assert!(d1 >= 1 && d1 <= d2);
        let dim = 1 + d1 * d2;
        Self {
            core: ConeCore::new(dim, T::from_usize(d1 + 1).unwrap()),
            d1,
            d2,
            W: Matrix::zeros((d1, d2)),
            Z: Matrix::zeros((d1, d1)),
            Zinv: Matrix::zeros((d1, d1)),
            ZiW: Matrix::zeros((d1, d2)),
            Ma: Matrix::zeros((d1, d1)),
            Mb: Matrix::zeros((d1, d2)),
            chol: CholeskyEngine::new(d1),
            svd: SVDEngine::new((d1, d2)),
        }
    }

    // Z = u²I - WWᵀ (triu only); the loaded W is refreshed as a side effect
    fn form_z(&mut self) {
        let s = &self.core.point;
        let u = s[0];
        self.W.data_mut().copy_from(&s[1..]);
        self.Z.data_mut().set(T::zero());
        for i in 0..self.d1 {
            self.Z[(i, i)] = u * u;
        }
        self.Z.syrk(&self.W, MatrixShape::N, -T::one(), T::one());
    }

    fn tr_zinv(&self) -> T {
        let mut tr = T::zero();
        for i in 0..self.d1 {
            tr += self.Zinv[(i, i)];
        }
        tr
    }
}

impl<T> BarrierCone<T> for EpiNormSpectralCone<T>
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
        if !self.core.point.is_finite() || self.core.point[0] <= T::zero() {
            return false;
        }
        self.form_z();
        self.chol.factor(&self.Z).is_ok()
    }

    fn dual_feas_oracle(&mut self) -> Option<bool> {
        // dual cone is the nuclear-norm epigraph: p ≥ Σᵢ σᵢ(R)
        let z = &self.core.dual_point;
        if !z.is_finite() || z[0] <= T::zero() {
            return Some(false);
        }
        self.Mb.data_mut().copy_from(&z[1..]);
        if self.svd.factor(&self.Mb).is_err() {
            return Some(false);
        }
        let σsum = self.svd.s.as_slice().sum();
        Some(z[0] > σsum)
    }

    fn update_grad(&mut self) {
        // feasibility factored Z
        self.chol.inverse_into(&mut self.Zinv);
        self.Zinv.symmetrize_from_triu();
        self.ZiW.gemm(
            MatrixShape::N,
            MatrixShape::N,
            &self.Zinv,
            &self.W,
            T::one(),
            T::zero(),
        );

        let u = self.core.point[0];
        let d1m1 = T::from_usize(self.d1 - 1).unwrap();
        self.core.grad[0] = -(2.0).as_T() * u * self.tr_zinv() + d1m1 / u;
        let two: T = (2.0).as_T();
        for (g, &x) in self.core.grad[1..].iter_mut().zip(self.ZiW.data()) {
            *g = two * x;
        }
    }

    fn update_hess(&mut self) {
        // column-by-column through the Hessian product operator
        let dim = self.core.dim;
        let mut H = std::mem::replace(&mut self.core.hess, Matrix::zeros((0, 0)));
        let mut e = std::mem::take(&mut self.core.work);
        for j in 0..dim {
            e.set(T::zero());
            e[j] = T::one();
            self.hess_prod_fast(H.col_slice_mut(j), &e);
        }
        self.core.work = e;
        self.core.hess = H;
    }

    fn hess_prod_fast(&mut self, out: &mut [T], v: &[T]) -> bool {
        let (d1, d2) = (self.d1, self.d2);
        let u = self.core.point[0];
        let a = v[0];
        let two: T = (2.0).as_T();
        let trz = self.tr_zinv();

        // U = matrix part of the direction
        let U = &mut self.Mb;
        U.data_mut().copy_from(&v[1..]);

        // Ma = dZ = 2ua·I - (UWᵀ + WUᵀ)
        let dZ = &mut self.Ma;
        dZ.data_mut().set(T::zero());
        for i in 0..d1 {
            dZ[(i, i)] = two * u * a;
        }
        dZ.gemm(MatrixShape::N, MatrixShape::T, U, &self.W, -T::one(), T::one());
        dZ.gemm(MatrixShape::N, MatrixShape::T, &self.W, U, -T::one(), T::one());

        // Zinv dZ Zinv, built in place of dZ
        let tmp = &mut self.Z; // Z itself is not needed again this iterate
        tmp.gemm(MatrixShape::N, MatrixShape::N, &self.Zinv, dZ, T::one(), T::zero());
        dZ.gemm(MatrixShape::N, MatrixShape::N, tmp, &self.Zinv, T::one(), T::zero());

        // u component: -2a·tr(Z⁻¹) + 2u·tr(Z⁻¹dZZ⁻¹) - (d1-1)a/u²
        let mut tr_sandwich = T::zero();
        for i in 0..d1 {
            tr_sandwich += dZ[(i, i)];
        }
        let d1m1 = T::from_usize(d1 - 1).unwrap();
        out[0] = -two * a * trz + two * u * tr_sandwich - d1m1 * a / (u * u);

        // W component: 2(Z⁻¹U - Z⁻¹dZZ⁻¹W)
        {
            let outW = &mut out[1..];
            // Z⁻¹U into a fresh view: use column gemv to avoid another buffer
            for j in 0..d2 {
                let col_u = &U.data()[j * d1..(j + 1) * d1];
                let col_o = &mut outW[j * d1..(j + 1) * d1];
                self.Zinv.gemv(MatrixShape::N, col_o, col_u, two, T::zero());
            }
            // minus 2 (Z⁻¹dZZ⁻¹) W
            for j in 0..d2 {
                let col_w = &self.W.data()[j * d1..(j + 1) * d1];
                let col_o = &mut outW[j * d1..(j + 1) * d1];
                dZ.gemv(MatrixShape::N, col_o, col_w, -two, T::one());
            }
        }
        true
    }
}

impl_cone_contract!(EpiNormSpectralCone);
