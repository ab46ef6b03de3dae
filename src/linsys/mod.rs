#![allow(non_snake_case)]

//! Direction system solvers.
//!
//! After the per-cone elimination of `ds` and the scalar elimination of
//! `dκ`, each Newton direction reduces to a symmetric 3×3 block system
//! over `(dx, dy, dz)` bordered by the τ column:
//!
//!     [ 0   Aᵀ   Gᵀ ] [dx]
//!     [ A   0    0  ] [dy]  =  u + dτ·(-c, b, h)
//!     [ G   0   -Λ  ] [dz]
//!
//! with `Λ_k` the per-cone scaling operator (`∇²F⁻¹` at the scaled point
//! for primal-barrier cones, `∇²F` for dual-barrier ones).  The factored
//! system is reused across the centering, prediction and correction
//! right-hand sides of one iteration; τ is recovered from one extra solve
//! against the constant vector.

use crate::algebra::*;
use crate::cones::{Cone, SupportedCone};
use crate::model::ProblemData;
use crate::point::Direction;
use std::ops::Range;
use thiserror::Error;

mod naive;
mod qrchol;

pub use naive::*;
pub use qrchol::*;

/// Errors from the direction system.
#[derive(Error, Debug)]
pub enum LinSysError {
    #[error("KKT factorization failed: {0}")]
    Factorization(String),
    #[error("cone Hessian factorization failed")]
    ConeHessian,
    #[error("direction system is singular")]
    Singular,
}

/// Which system solver to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemSolverKind {
    /// block-eliminated sparse LDLᵀ with a dense LU fallback
    Naive,
    /// QR null-space reduction to a dense positive definite system
    QRChol,
}

pub(crate) enum ReducedKind<T: FloatT> {
    Naive(NaiveElimSolver<T>),
    QRChol(QRCholSolver<T>),
}

/// The direction system shared by all steppers.
pub struct SystemSolver<T: FloatT> {
    reduced: ReducedKind<T>,

    // constant-column solve, refreshed by `update_lhs`
    t2x: Vec<T>,
    t2y: Vec<T>,
    t2z: Vec<T>,

    // work for the per-RHS solve
    wz: Vec<T>,
    ws: Vec<T>,
    ux: Vec<T>,
    uy: Vec<T>,
    uz: Vec<T>,

    σ: T, // μ/τ² from the last update
}

impl<T> SystemSolver<T>
where
    T: FloatT,
{
    pub fn new_naive(
        data: &ProblemData<T>,
        cones: &[SupportedCone<T>],
        cone_idxs: &[Range<usize>],
    ) -> Result<Self, LinSysError> {
        let reduced = ReducedKind::Naive(NaiveElimSolver::new(data, cones, cone_idxs)?);
        Ok(Self::from_reduced(reduced, data))
    }

    pub fn new_qrchol(
        data: &ProblemData<T>,
        cone_idxs: &[Range<usize>],
        Q1: Matrix<T>,
        Q2: Matrix<T>,
        Rfact: Matrix<T>,
    ) -> Result<Self, LinSysError> {
        let reduced = ReducedKind::QRChol(QRCholSolver::new(data, cone_idxs, Q1, Q2, Rfact)?);
        Ok(Self::from_reduced(reduced, data))
    }

    fn from_reduced(reduced: ReducedKind<T>, data: &ProblemData<T>) -> Self {
        let (n, p, q) = (data.n(), data.p(), data.q());
        Self {
            reduced,
            t2x: vec![T::zero(); n],
            t2y: vec![T::zero(); p],
            t2z: vec![T::zero(); q],
            wz: vec![T::zero(); q],
            ws: vec![T::zero(); q],
            ux: vec![T::zero(); n],
            uy: vec![T::zero(); p],
            uz: vec![T::zero(); q],
            σ: T::one(),
        }
    }

    /// Refactor the reduced system at the current (scaled) cone state and
    /// refresh the constant-column solve.  Called once per iteration.
    pub fn update_lhs(
        &mut self,
        data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        μ: T,
        τ: T,
    ) -> Result<(), LinSysError> {
        self.σ = μ / (τ * τ);

        match &mut self.reduced {
            ReducedKind::Naive(s) => s.refactor(data, cones, cone_idxs)?,
            ReducedKind::QRChol(s) => s.refactor(data, cones, cone_idxs)?,
        }

        // t2 = M⁻¹ (-c, b, h)
        self.t2x.scalarop_from(|c| -c, &data.c);
        self.t2y.copy_from(&data.b);
        self.t2z.copy_from(&data.h);
        let (t2x, t2y, t2z) = (&mut self.t2x, &mut self.t2y, &mut self.t2z);
        match &mut self.reduced {
            ReducedKind::Naive(s) => s.solve3(data, cones, cone_idxs, t2x, t2y, t2z)?,
            ReducedKind::QRChol(s) => s.solve3(data, cones, cone_idxs, t2x, t2y, t2z)?,
        }
        Ok(())
    }

    /// Solve the full direction system for the given right-hand side.
    /// `update_lhs` must have run at the current iterate.
    pub fn solve_system(
        &mut self,
        data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        rhs: &Direction<T>,
        dir: &mut Direction<T>,
    ) -> Result<(), LinSysError> {
        // d3 = r_z + Λ̂ r_s, staged through ws
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rs = &rhs.s[rng.clone()];
            let out = &mut self.ws[rng.clone()];
            if cone.use_dual_barrier() {
                out.copy_from(rs);
            } else if !cone.inv_hess_prod(out, rs) {
                return Err(LinSysError::ConeHessian);
            }
        }

        // t1 = M⁻¹ (r_x, -r_y, -(r_z + Λ̂ r_s)), solved in place in u*
        self.ux.copy_from(&rhs.x);
        self.uy.scalarop_from(|v| -v, &rhs.y);
        for i in 0..self.ws.len() {
            self.uz[i] = -(rhs.z[i] + self.ws[i]);
        }
        let (ux, uy, uz) = (&mut self.ux, &mut self.uy, &mut self.uz);
        match &mut self.reduced {
            ReducedKind::Naive(s) => s.solve3(data, cones, cone_idxs, ux, uy, uz)?,
            ReducedKind::QRChol(s) => s.solve3(data, cones, cone_idxs, ux, uy, uz)?,
        }

        // dτ from the bordered row
        let cbh_t1 = data.c.dot(&self.ux) + data.b.dot(&self.uy) + data.h.dot(&self.uz);
        let cbh_t2 = data.c.dot(&self.t2x) + data.b.dot(&self.t2y) + data.h.dot(&self.t2z);
        let denom = self.σ - cbh_t2;
        if denom == T::zero() || !denom.is_finite() {
            return Err(LinSysError::Singular);
        }
        let dτ = (rhs.τ + rhs.κ + cbh_t1) / denom;

        dir.τ = dτ;
        dir.κ = rhs.κ - self.σ * dτ;
        dir.x.waxpby(T::one(), &self.ux, dτ, &self.t2x);
        dir.y.waxpby(T::one(), &self.uy, dτ, &self.t2y);
        dir.z.waxpby(T::one(), &self.uz, dτ, &self.t2z);

        // recover ds per cone
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rng = rng.clone();
            if cone.use_dual_barrier() {
                // ds = r_s - H̃ dz
                let out = &mut self.ws[rng.clone()];
                cone.hess_prod(out, &dir.z[rng.clone()]);
                for (i, k) in rng.clone().enumerate() {
                    dir.s[k] = rhs.s[k] - out[i];
                }
            } else {
                // ds = H̃⁻¹(r_s - dz)
                let tmp = &mut self.wz[rng.clone()]; // wz is free now
                for (i, k) in rng.clone().enumerate() {
                    tmp[i] = rhs.s[k] - dir.z[k];
                }
                let out = &mut self.ws[rng.clone()];
                if !cone.inv_hess_prod(out, &self.wz[rng.clone()]) {
                    return Err(LinSysError::ConeHessian);
                }
                dir.s[rng.clone()].copy_from(&self.ws[rng]);
            }
        }
        Ok(())
    }
}
