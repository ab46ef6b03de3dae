#![allow(non_snake_case)]

//! Preprocessing (rank-revealing reductions of A and [A; G]) and the
//! primal-dual initial point.

use crate::algebra::*;
use crate::cones::{Cone, SupportedCone};
use crate::model::ProblemData;
use crate::point::Point;
use crate::solver::settings::Settings;
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("primal equality constraints are inconsistent")]
    PrimalInconsistent,
    #[error("dual equality constraints are inconsistent")]
    DualInconsistent,
    #[error("initialization failed: {0}")]
    Numerical(String),
}

/// QR factors of Aᵀ retained for the QR-Cholesky system solver.
pub(crate) struct QRRetained<T> {
    pub Q1: Matrix<T>,
    pub Q2: Matrix<T>,
    pub R: Matrix<T>,
}

/// Index bookkeeping produced by preprocessing.
pub(crate) struct Preprocessed<T> {
    /// original x indices kept (in pivot order)
    pub x_keep: Vec<usize>,
    /// original y indices kept (in pivot order)
    pub y_keep: Vec<usize>,
    pub qr: Option<QRRetained<T>>,
}

impl<T> Preprocessed<T> {
    pub fn identity(n: usize, p: usize) -> Self {
        Self {
            x_keep: (0..n).collect(),
            y_keep: (0..p).collect(),
            qr: None,
        }
    }
}

// stack [A; G] into one dense matrix
fn stack_AG<T: FloatT>(data: &ProblemData<T>) -> Matrix<T> {
    let (n, p, q) = (data.n(), data.p(), data.q());
    let Ad = data.A.to_dense();
    let Gd = data.G.to_dense();
    let mut M = Matrix::zeros((p + q, n));
    for j in 0..n {
        for i in 0..p {
            M[(i, j)] = Ad[(i, j)];
        }
        for i in 0..q {
            M[(p + i, j)] = Gd[(i, j)];
        }
    }
    M
}

/// Run rank estimation on [A; G] and Aᵀ, reduce the data in place, and
/// retain the Aᵀ factors.  `tol` is the pivot threshold for rank
/// estimation.
pub(crate) fn preprocess<T: FloatT>(
    data: &mut ProblemData<T>,
    tol: T,
) -> Result<Preprocessed<T>, PreprocessError> {
    let n0 = data.n();
    let p0 = data.p();

    // ---- column reduction via the QR of [A; G] ----
    let M = stack_AG(data);
    let mut eng = PivotedQREngine::<T>::new((p0 + data.q(), n0));
    eng.factor(&M)
        .map_err(|e| PreprocessError::Numerical(e.to_string()))?;
    let rank = eng.rank(tol);

    let x_keep: Vec<usize> = if rank < n0 {
        let keep: Vec<usize> = eng.jpvt[0..rank].to_vec();
        let drop: Vec<usize> = eng.jpvt[rank..].to_vec();

        // the dropped dual equalities must be implied:
        // c_drop = R12ᵀ R11⁻ᵀ c_keep
        let mut v = vec![T::zero(); rank];
        for (i, &j) in keep.iter().enumerate() {
            v[i] = data.c[j];
        }
        eng.solve_r(&mut v, rank, MatrixShape::T);
        for (jj, &jdrop) in drop.iter().enumerate() {
            let mut pred = T::zero();
            for i in 0..rank {
                pred += eng.r_entry(i, rank + jj) * v[i];
            }
            if (pred - data.c[jdrop]).abs() > tol * (T::one() + data.c[jdrop].abs()) {
                return Err(PreprocessError::DualInconsistent);
            }
        }

        data.c = keep.iter().map(|&j| data.c[j]).collect();
        data.A = data.A.select_columns(&keep);
        data.G = data.G.select_columns(&keep);
        keep
    } else {
        (0..n0).collect()
    };

    // ---- row reduction via the QR of Aᵀ ----
    let n = data.n();
    let (y_keep, qr) = if p0 > 0 {
        let At = {
            let Ad = data.A.to_dense();
            let mut At = Matrix::zeros((n, p0));
            for j in 0..p0 {
                for i in 0..n {
                    At[(i, j)] = Ad[(j, i)];
                }
            }
            At
        };
        let mut eng = PivotedQREngine::<T>::new((n, p0));
        eng.factor(&At)
            .map_err(|e| PreprocessError::Numerical(e.to_string()))?;
        let rank = eng.rank(tol);

        let keep: Vec<usize> = eng.jpvt[0..rank].to_vec();
        if rank < p0 {
            // dropped primal equalities must be implied:
            // b_drop = R12ᵀ R11⁻ᵀ b_keep
            let drop: Vec<usize> = eng.jpvt[rank..].to_vec();
            let mut v = vec![T::zero(); rank];
            for (i, &j) in keep.iter().enumerate() {
                v[i] = data.b[j];
            }
            eng.solve_r(&mut v, rank, MatrixShape::T);
            for (jj, &jdrop) in drop.iter().enumerate() {
                let mut pred = T::zero();
                for i in 0..rank {
                    pred += eng.r_entry(i, rank + jj) * v[i];
                }
                if (pred - data.b[jdrop]).abs() > tol * (T::one() + data.b[jdrop].abs()) {
                    return Err(PreprocessError::PrimalInconsistent);
                }
            }
        }

        // reorder/reduce the equality rows to match the retained factors
        data.b = keep.iter().map(|&j| data.b[j]).collect();
        data.A = data.A.select_rows(&keep);

        // materialize Q1, Q2 and the leading R block
        let Qfull = eng.q_full();
        let mut Q1 = Matrix::zeros((n, rank));
        Q1.copy_cols_from(&Qfull, 0, rank);
        let mut Q2 = Matrix::zeros((n, n - rank));
        Q2.copy_cols_from(&Qfull, rank, n - rank);
        let mut R = Matrix::zeros((rank, rank));
        for j in 0..rank {
            for i in 0..=j {
                R[(i, j)] = eng.r_entry(i, j);
            }
        }
        (keep, Some(QRRetained { Q1, Q2, R }))
    } else {
        // no equalities: Q2 is the full identity basis
        let Q1 = Matrix::zeros((n, 0));
        let Q2 = Matrix::identity(n);
        let R = Matrix::zeros((0, 0));
        (Vec::new(), Some(QRRetained { Q1, Q2, R }))
    };

    Ok(Preprocessed { x_keep, y_keep, qr })
}

/// Initial cone anchors and the minimum-norm primal/dual starting point:
///   s from `set_initial_point`, z = -∇F(s) per cone,
///   x from [A; G] x = [b; h - s],  y from Aᵀ y = -c - Gᵀ z,  τ = κ = 1.
pub(crate) fn initial_point<T: FloatT>(
    data: &ProblemData<T>,
    cones: &mut [SupportedCone<T>],
    cone_idxs: &[Range<usize>],
    point: &mut Point<T>,
    qr: Option<&QRRetained<T>>,
    settings: &Settings<T>,
) -> Result<(), PreprocessError> {
    let (n, p, q) = (data.n(), data.p(), data.q());

    // cone anchors and their dual images; for dual-barrier cones the
    // anchor lives on the z side and -∇F(anchor) on the s side
    for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
        let rng = rng.clone();
        cone.set_initial_point(&mut point.s[rng.clone()]);
        cone.load_point(&point.s[rng.clone()]);
        debug_assert!(cone.is_feas());
        let g = cone.grad();
        for (i, k) in rng.clone().enumerate() {
            point.z[k] = -g[i];
        }
        if cone.use_dual_barrier() {
            for k in rng {
                let (sk, zk) = (point.s[k], point.z[k]);
                point.s[k] = zk;
                point.z[k] = sk;
            }
        }
    }

    point.τ = T::one();
    point.κ = T::one();

    let dense_inputs_ok = settings.init_use_fallback
        || settings.init_use_iterative
        || matches!(
            (&data.A, &data.G),
            (
                crate::model::ConstraintMatrix::Dense(_),
                crate::model::ConstraintMatrix::Dense(_)
            )
        );
    if !dense_inputs_ok {
        return Err(PreprocessError::Numerical(
            "sparse factorization is unavailable for the initial point; \
             enable init_use_fallback or init_use_iterative"
                .into(),
        ));
    }

    // x: minimum-norm solution of [A; G] x = [b; h - s]
    let mut rhs = vec![T::zero(); p + q];
    rhs[0..p].copy_from(&data.b);
    for i in 0..q {
        rhs[p + i] = data.h[i] - point.s[i];
    }
    if settings.init_use_iterative {
        cgls(data, &rhs, &mut point.x);
    } else {
        let M = stack_AG(data);
        solve_ls_any(&M, &rhs, &mut point.x)?;
    }

    // y: minimum-norm solution of Aᵀ y = -c - Gᵀ z
    if p > 0 {
        let mut rhsy = vec![T::zero(); n];
        rhsy.scalarop_from(|c| -c, &data.c);
        data.G
            .gemv(MatrixShape::T, &mut rhsy, &point.z, -T::one(), T::one());

        if let Some(qr) = qr {
            // y = R⁻¹ Q1ᵀ rhs with the retained factors
            let rank = qr.R.nrows();
            let mut w = vec![T::zero(); rank];
            qr.Q1.gemv(MatrixShape::T, &mut w, &rhsy, T::one(), T::zero());
            let info = &mut 0_i32;
            if rank > 0 {
                T::xtrtrs(
                    MatrixTriangle::Triu.as_blas_char(),
                    MatrixShape::N.as_blas_char(),
                    b'N',
                    rank as i32,
                    1,
                    &qr.R.data,
                    rank as i32,
                    &mut w,
                    rank as i32,
                    info,
                );
            }
            if *info != 0 {
                return Err(PreprocessError::Numerical("singular R in y solve".into()));
            }
            point.y.copy_from(&w);
        } else {
            let At = {
                let Ad = data.A.to_dense();
                let mut At = Matrix::zeros((n, p));
                for j in 0..p {
                    for i in 0..n {
                        At[(i, j)] = Ad[(j, i)];
                    }
                }
                At
            };
            solve_ls_any(&At, &rhsy, &mut point.y)?;
        }
    }
    Ok(())
}

// least-squares / minimum-norm solve of M x = b for any shape of M
fn solve_ls_any<T: FloatT>(M: &Matrix<T>, b: &[T], x: &mut [T]) -> Result<(), PreprocessError> {
    let (m, n) = (M.nrows(), M.ncols());
    let mut work = Vec::new();
    if m >= n {
        let mut eng = PivotedQREngine::<T>::new((m, n));
        eng.factor(M)
            .map_err(|e| PreprocessError::Numerical(e.to_string()))?;
        let rank = eng.rank(T::epsilon() * (100.0).as_T());
        eng.solve_ls(b, x, rank, &mut work);
    } else {
        // wide: factor the transpose and take the minimum-norm solution
        let mut Mt = Matrix::zeros((n, m));
        for j in 0..m {
            for i in 0..n {
                Mt[(i, j)] = M[(j, i)];
            }
        }
        let mut eng = PivotedQREngine::<T>::new((n, m));
        eng.factor(&Mt)
            .map_err(|e| PreprocessError::Numerical(e.to_string()))?;
        let rank = eng.rank(T::epsilon() * (100.0).as_T());
        eng.solve_min_norm(b, x, rank, &mut work);
    }
    Ok(())
}

// conjugate gradient on the normal equations of [A; G] x = rhs
fn cgls<T: FloatT>(data: &ProblemData<T>, rhs: &[T], x: &mut [T]) {
    let (n, p, q) = (data.n(), data.p(), data.q());
    let apply = |v: &[T], out: &mut [T]| {
        data.A.gemv(MatrixShape::N, &mut out[0..p], v, T::one(), T::zero());
        data.G
            .gemv(MatrixShape::N, &mut out[p..p + q], v, T::one(), T::zero());
    };
    let apply_t = |v: &[T], out: &mut [T]| {
        data.A.gemv(MatrixShape::T, out, &v[0..p], T::one(), T::zero());
        data.G.gemv(MatrixShape::T, out, &v[p..p + q], T::one(), T::one());
    };

    x.set(T::zero());
    let mut r = rhs.to_vec(); // residual in the range space
    let mut s = vec![T::zero(); n];
    apply_t(&r, &mut s);
    let mut d = s.clone();
    let mut sq = s.sumsq();
    let mut mv = vec![T::zero(); p + q];

    let tol = T::epsilon().sqrt() * (T::one() + rhs.norm());
    for _ in 0..(2 * (n + p + q)) {
        if sq.sqrt() <= tol {
            break;
        }
        apply(&d, &mut mv);
        let denom = mv.sumsq();
        if denom <= T::zero() {
            break;
        }
        let α = sq / denom;
        x.axpby(α, &d, T::one());
        r.axpby(-α, &mv, T::one());
        apply_t(&r, &mut s);
        let sq_new = s.sumsq();
        let β = sq_new / sq;
        sq = sq_new;
        for i in 0..n {
            d[i] = s[i] + β * d[i];
        }
    }
}
