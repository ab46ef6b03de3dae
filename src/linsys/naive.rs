#![allow(non_snake_case)]

use super::*;

/// Block-elimination system solver usable with any model.
///
/// Assembles the symmetric 3×3 reduced matrix as one sparse triu CSC with
/// the per-cone `-Λ` blocks embedded as dense sub-blocks, and factors it
/// with sparse LDLᵀ.  The sparsity pattern is fixed at construction; only
/// the cone blocks are rewritten between iterations.  If the LDLᵀ
/// factorization hits a zero pivot the solver falls back to a dense LU of
/// the same matrix.
pub struct NaiveElimSolver<T: FloatT> {
    n: usize,
    p: usize,
    q: usize,

    K: CscMatrix<T>,
    // per cone, nz positions of its triu block entries in (i ≤ j)
    // column-major order
    lambda_nz: Vec<Vec<usize>>,

    ldl: LdlFactorization<T>,
    lu: LUEngine<T>,
    Mdense: Matrix<T>,
    use_lu: bool,

    work: Vec<T>,
}

impl<T> NaiveElimSolver<T>
where
    T: FloatT,
{
    pub fn new(
        data: &ProblemData<T>,
        cones: &[SupportedCone<T>],
        cone_idxs: &[Range<usize>],
    ) -> Result<Self, LinSysError> {
        let (n, p, q) = (data.n(), data.p(), data.q());
        let N = n + p + q;

        let At = data.A.to_csc().transpose();
        let Gt = data.G.to_csc().transpose();

        let mut colptr = vec![0usize; N + 1];
        let mut rowval = Vec::new();
        let mut nzval = Vec::new();
        let mut lambda_nz: Vec<Vec<usize>> = cones.iter().map(|_| Vec::new()).collect();

        // x columns: structural zero diagonal only
        for i in 0..n {
            rowval.push(i);
            nzval.push(T::zero());
            colptr[i + 1] = rowval.len();
        }

        // y columns: Aᵀ column plus zero diagonal
        for j in 0..p {
            for ptr in At.colptr[j]..At.colptr[j + 1] {
                rowval.push(At.rowval[ptr]);
                nzval.push(At.nzval[ptr]);
            }
            rowval.push(n + j);
            nzval.push(T::zero());
            colptr[n + j + 1] = rowval.len();
        }

        // z columns: Gᵀ column plus the dense triu column of its cone block
        for (k, rng) in cone_idxs.iter().enumerate() {
            for lj in 0..rng.len() {
                let j = rng.start + lj;
                for ptr in Gt.colptr[j]..Gt.colptr[j + 1] {
                    rowval.push(Gt.rowval[ptr]);
                    nzval.push(Gt.nzval[ptr]);
                }
                for li in 0..=lj {
                    lambda_nz[k].push(rowval.len());
                    rowval.push(n + p + rng.start + li);
                    nzval.push(-T::one());
                }
                colptr[n + p + j + 1] = rowval.len();
            }
        }

        let K = CscMatrix::new(N, N, colptr, rowval, nzval);

        let mut signs = vec![1_i8; N];
        signs[n..].iter_mut().for_each(|s| *s = -1);

        let ldl = LdlFactorization::new(&K, &signs)
            .map_err(|e| LinSysError::Factorization(e.to_string()))?;

        Ok(Self {
            n,
            p,
            q,
            K,
            lambda_nz,
            ldl,
            lu: LUEngine::new(N),
            Mdense: Matrix::zeros((N, N)),
            use_lu: false,
            work: vec![T::zero(); N],
        })
    }

    pub fn refactor(
        &mut self,
        _data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
    ) -> Result<(), LinSysError> {
        // rewrite the -Λ blocks from the refreshed cones
        for (k, (cone, rng)) in cones.iter_mut().zip(cone_idxs).enumerate() {
            let dim = rng.len();
            let block: &Matrix<T> = if cone.use_dual_barrier() {
                cone.hess()
            } else {
                cone.inv_hess().ok_or(LinSysError::ConeHessian)?
            };
            let mut idx = 0;
            for lj in 0..dim {
                for li in 0..=lj {
                    self.K.nzval[self.lambda_nz[k][idx]] = -block[(li, lj)];
                    idx += 1;
                }
            }
        }

        match self.ldl.factor(&self.K) {
            Ok(()) => {
                self.use_lu = false;
                Ok(())
            }
            Err(_) => {
                // dense LU fallback on the same matrix
                self.Mdense.data_mut().set(T::zero());
                for (i, j, v) in self.K.triplets() {
                    self.Mdense[(i, j)] = v;
                    self.Mdense[(j, i)] = v;
                }
                self.lu
                    .factor(&self.Mdense)
                    .map_err(|e| LinSysError::Factorization(e.to_string()))?;
                self.use_lu = true;
                Ok(())
            }
        }
    }

    pub fn solve3(
        &mut self,
        _data: &ProblemData<T>,
        _cones: &mut [SupportedCone<T>],
        _cone_idxs: &[Range<usize>],
        x: &mut [T],
        y: &mut [T],
        z: &mut [T],
    ) -> Result<(), LinSysError> {
        let (n, p, q) = (self.n, self.p, self.q);
        self.work[0..n].copy_from(x);
        self.work[n..n + p].copy_from(y);
        self.work[n + p..n + p + q].copy_from(z);

        if self.use_lu {
            self.lu.solve(&mut self.work);
        } else {
            self.ldl.solve(&mut self.work);
        }

        x.copy_from(&self.work[0..n]);
        y.copy_from(&self.work[n..n + p]);
        z.copy_from(&self.work[n + p..n + p + q]);
        Ok(())
    }
}
