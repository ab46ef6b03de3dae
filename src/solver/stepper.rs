#![allow(non_snake_case)]

//! Predictor-corrector stepper for the homogeneous embedding.
//!
//! Each iteration refreshes the cones at the 1/√μ-scaled iterate, updates
//! the system solver, branches between a prediction and a centering
//! right-hand side on the central-path proximity of every cone, optionally
//! adds the third-order correction round, refines each solve against the
//! full system operator, and line-searches to a neighborhood-safe α.

use crate::algebra::*;
use crate::cones::{Cone, SupportedCone};
use crate::linsys::{LinSysError, SystemSolver};
use crate::model::ProblemData;
use crate::point::{Direction, Point};
use crate::solver::residuals::Residuals;
use crate::solver::settings::Settings;
use std::ops::Range;
use thiserror::Error;

// proximity threshold for the predict/center branch
const BETA_CENTER: f64 = 0.04;
// backtracking factor and floors for the line search
const LS_BACKTRACK: f64 = 0.9;
const ALPHA_FLOOR: f64 = 1e-3;
const ALPHA_FLOOR_CORR: f64 = 1e-6;
// cap on iterative refinement rounds per solve
const MAX_REFINE: usize = 2;

#[derive(Error, Debug)]
pub enum StepError {
    #[error("a cone rejected the current iterate")]
    ConeInfeasible,
    #[error(transparent)]
    LinSys(#[from] LinSysError),
    #[error("line search failed below the minimum step size")]
    LineSearch,
    #[error("iterate lost positivity of τ, κ or μ")]
    LostPositivity,
}

/// Which branch the stepper took this iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Predict,
    Center,
}

pub(crate) struct Stepper<T: FloatT> {
    rhs: Direction<T>,
    dir: Direction<T>,
    cand: Direction<T>,
    refine_dir: Direction<T>,
    res: Direction<T>,
    res_cand: Direction<T>,
    saved_dir: Direction<T>,

    // scaled-point staging and line search trials
    sc: Vec<T>,
    ls_s: Vec<T>,
    ls_z: Vec<T>,
    corr_work: Vec<T>,

    prev_α: T,
}

impl<T> Stepper<T>
where
    T: FloatT,
{
    pub fn new(n: usize, p: usize, q: usize) -> Self {
        Self {
            rhs: Direction::new(n, p, q),
            dir: Direction::new(n, p, q),
            cand: Direction::new(n, p, q),
            refine_dir: Direction::new(n, p, q),
            res: Direction::new(n, p, q),
            res_cand: Direction::new(n, p, q),
            saved_dir: Direction::new(n, p, q),
            sc: vec![T::zero(); q],
            ls_s: vec![T::zero(); q],
            ls_z: vec![T::zero(); q],
            corr_work: vec![T::zero(); q],
            prev_α: T::one(),
        }
    }

    /// One full predictor/centering step; returns the accepted α and the
    /// branch taken.
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        point: &mut Point<T>,
        residuals: &Residuals<T>,
        system: &mut SystemSolver<T>,
        ν: T,
        settings: &Settings<T>,
    ) -> Result<(T, StepKind), StepError> {
        let μ = point.mu(ν);
        let rt = μ.sqrt();

        // 1. refresh cones at the scaled iterate
        self.load_scaled_point(cones, cone_idxs, point, rt)?;

        // 2. refresh the system factorization
        system.update_lhs(data, cones, cone_idxs, μ, point.τ)?;

        // 3. predict while every cone sits close to the central path
        let β_c: T = BETA_CENTER.as_T();
        let τκ_near = ((point.τ * point.κ) / μ - T::one()).abs() <= β_c;
        let near_path = τκ_near
            && cones
                .iter_mut()
                .all(|c| c.in_neighborhood(μ, β_c, settings.use_infty_nbhd));
        let kind = if near_path {
            StepKind::Predict
        } else {
            StepKind::Center
        };

        // 4. build the right-hand side and solve
        match kind {
            StepKind::Predict => self.predict_rhs(cones, cone_idxs, point, residuals),
            StepKind::Center => self.center_rhs(cones, cone_idxs, point, μ, rt),
        }
        self.solve_refined(data, cones, cone_idxs, system, μ, point)?;

        // 5. third-order correction round, for cones that supply one
        let corrected = self.correction_round(cones, cone_idxs, point, rt);
        if corrected {
            self.saved_dir.copy_from(&self.dir);
            self.solve_refined(data, cones, cone_idxs, system, μ, point)?;
        }

        // 6. neighborhood line search; if the corrected direction fails,
        // retry with the uncorrected one before giving up
        let mut α = self.line_search(cones, cone_idxs, point, ν, corrected, settings);
        if α == T::zero() && corrected {
            self.dir.copy_from(&self.saved_dir);
            α = self.line_search(cones, cone_idxs, point, ν, false, settings);
        }
        if α == T::zero() {
            return Err(StepError::LineSearch);
        }

        // 7. commit
        point.add_step(&self.dir, α);
        let μ_next = point.mu(ν);
        if !(point.τ > T::zero() && point.κ > T::zero() && μ_next > T::zero()) {
            return Err(StepError::LostPositivity);
        }
        self.prev_α = α;
        Ok((α, kind))
    }

    fn load_scaled_point(
        &mut self,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        point: &Point<T>,
        rt: T,
    ) -> Result<(), StepError> {
        let inv_rt = rt.recip();
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rng = rng.clone();
            let (prim, dual) = if cone.use_dual_barrier() {
                (&point.z, &point.s)
            } else {
                (&point.s, &point.z)
            };
            cone.load_point(&prim[rng.clone()]);
            cone.rescale_point(inv_rt);
            for k in rng.clone() {
                self.sc[k] = dual[k] * inv_rt;
            }
            cone.load_dual_point(&self.sc[rng]);
            if !cone.is_feas() {
                return Err(StepError::ConeInfeasible);
            }
        }
        Ok(())
    }

    // prediction drives the linear residuals and complementarity to zero
    fn predict_rhs(
        &mut self,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        point: &Point<T>,
        residuals: &Residuals<T>,
    ) {
        self.rhs.x.copy_from(&residuals.rx);
        self.rhs.y.copy_from(&residuals.ry);
        self.rhs.z.copy_from(&residuals.rz);
        self.rhs.τ = residuals.rτ;
        self.rhs.κ = -point.κ;
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rng = rng.clone();
            let dual = if cone.use_dual_barrier() {
                &point.s
            } else {
                &point.z
            };
            for k in rng {
                self.rhs.s[k] = -dual[k];
            }
        }
    }

    // centering drives the iterate toward the central path at fixed μ
    fn center_rhs(
        &mut self,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        point: &Point<T>,
        μ: T,
        rt: T,
    ) {
        self.rhs.x.set(T::zero());
        self.rhs.y.set(T::zero());
        self.rhs.z.set(T::zero());
        self.rhs.τ = T::zero();
        self.rhs.κ = -point.κ + μ / point.τ;
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rng = rng.clone();
            let dual = if cone.use_dual_barrier() {
                &point.s
            } else {
                &point.z
            };
            let g = cone.grad();
            for (i, k) in rng.enumerate() {
                self.rhs.s[k] = -dual[k] - rt * g[i];
            }
        }
    }

    // add -√μ·(½D³F[Δ̃,Δ̃]) to the cone rows and the Mehrotra-style τκ
    // cross term; returns whether any cone contributed
    fn correction_round(
        &mut self,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        point: &Point<T>,
        rt: T,
    ) -> bool {
        let inv_rt = rt.recip();
        let mut any = false;
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            if !cone.use_correction() {
                continue;
            }
            any = true;
            let rng = rng.clone();
            let prim_dir = if cone.use_dual_barrier() {
                &self.dir.z
            } else {
                &self.dir.s
            };
            for (i, k) in rng.clone().enumerate() {
                self.corr_work[rng.start + i] = prim_dir[k] * inv_rt;
            }
            let corr = cone.correction(&self.corr_work[rng.clone()]);
            for (i, k) in rng.enumerate() {
                self.rhs.s[k] -= rt * corr[i];
            }
        }
        if any {
            self.rhs.κ -= self.dir.τ * self.dir.κ / point.τ;
        }
        any
    }

    fn solve_refined(
        &mut self,
        data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        system: &mut SystemSolver<T>,
        μ: T,
        point: &Point<T>,
    ) -> Result<(), StepError> {
        system.solve_system(data, cones, cone_idxs, &self.rhs, &mut self.dir)?;

        let rhs_scale = T::one() + self.rhs.norm_inf();
        for _ in 0..MAX_REFINE {
            self.apply_lhs_residual(data, cones, cone_idxs, μ, point, false);
            let (res_inf, res_2) = (self.res.norm_inf(), self.res.norm());
            if res_inf <= T::epsilon().sqrt() * (0.1).as_T() * rhs_scale {
                break;
            }

            system.solve_system(data, cones, cone_idxs, &self.res, &mut self.refine_dir)?;
            self.cand.copy_from(&self.dir);
            self.cand.axpy(T::one(), &self.refine_dir);

            self.apply_lhs_residual(data, cones, cone_idxs, μ, point, true);
            let (cand_inf, cand_2) = (self.res_cand.norm_inf(), self.res_cand.norm());

            // keep the refinement only on strict improvement in both norms
            if cand_inf < res_inf && cand_2 < res_2 {
                self.dir.copy_from(&self.cand);
            } else {
                break;
            }
        }
        Ok(())
    }

    // residual rhs - L·d of the full six-block operator, for d = dir
    // (use_cand = false) or d = cand, stored in res / res_cand
    fn apply_lhs_residual(
        &mut self,
        data: &ProblemData<T>,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        μ: T,
        point: &Point<T>,
        use_cand: bool,
    ) {
        let (d, out) = if use_cand {
            (&self.cand, &mut self.res_cand)
        } else {
            (&self.dir, &mut self.res)
        };
        let σ = μ / (point.τ * point.τ);

        // out = L·d
        data.A.gemv(MatrixShape::T, &mut out.x, &d.y, T::one(), T::zero());
        data.G.gemv(MatrixShape::T, &mut out.x, &d.z, T::one(), T::one());
        out.x.axpby(d.τ, &data.c, T::one());

        data.A.gemv(MatrixShape::N, &mut out.y, &d.x, -T::one(), T::zero());
        out.y.axpby(d.τ, &data.b, T::one());

        data.G.gemv(MatrixShape::N, &mut out.z, &d.x, -T::one(), T::zero());
        out.z.axpby(d.τ, &data.h, T::one());
        out.z.axpby(-T::one(), &d.s, T::one());

        out.τ = -data.c.dot(&d.x) - data.b.dot(&d.y) - data.h.dot(&d.z) - d.κ;
        out.κ = σ * d.τ + d.κ;

        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rng = rng.clone();
            let (pd, dd) = if cone.use_dual_barrier() {
                (&d.z, &d.s)
            } else {
                (&d.s, &d.z)
            };
            cone.hess_prod(&mut out.s[rng.clone()], &pd[rng.clone()]);
            for k in rng {
                out.s[k] += dd[k];
            }
        }

        // out := rhs - out
        out.x.axpby(T::one(), &self.rhs.x, -T::one());
        out.y.axpby(T::one(), &self.rhs.y, -T::one());
        out.z.axpby(T::one(), &self.rhs.z, -T::one());
        out.s.axpby(T::one(), &self.rhs.s, -T::one());
        out.τ = self.rhs.τ - out.τ;
        out.κ = self.rhs.κ - out.κ;
    }

    // backtracking line search constrained to the wide neighborhood
    fn line_search(
        &mut self,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        point: &Point<T>,
        ν: T,
        corrected: bool,
        settings: &Settings<T>,
    ) -> T {
        let β = settings.max_nbhd;
        let β_min = T::one() - β;
        let ε = T::epsilon();
        let floor: T = if corrected {
            ALPHA_FLOOR_CORR.as_T()
        } else {
            ALPHA_FLOOR.as_T()
        };

        let mut α = T::min(T::one(), self.prev_α * (1.4).as_T());
        let clip: T = (0.9999).as_T();
        if self.dir.τ < T::zero() {
            α = T::min(α, -point.τ / self.dir.τ * clip);
        }
        if self.dir.κ < T::zero() {
            α = T::min(α, -point.κ / self.dir.κ * clip);
        }

        while α >= floor {
            if self.trial_ok(cones, cone_idxs, point, ν, α, β, β_min, ε, settings) {
                return α;
            }
            α *= LS_BACKTRACK.as_T();
        }
        T::zero()
    }

    #[allow(clippy::too_many_arguments)]
    fn trial_ok(
        &mut self,
        cones: &mut [SupportedCone<T>],
        cone_idxs: &[Range<usize>],
        point: &Point<T>,
        ν: T,
        α: T,
        β: T,
        β_min: T,
        ε: T,
        settings: &Settings<T>,
    ) -> bool {
        let τ1 = point.τ + α * self.dir.τ;
        let κ1 = point.κ + α * self.dir.κ;
        let τκ = τ1 * κ1;
        if τκ <= ε {
            return false;
        }

        let sz = <[T] as VectorMath<T>>::dot_shifted(
            &point.z,
            &point.s,
            &self.dir.z,
            &self.dir.s,
            α,
        );
        let μ1 = (sz + τκ) / (ν + T::one());
        if μ1 <= ε || (τκ - μ1).abs() > β * μ1 {
            return false;
        }

        // per-cone complementarity floors
        for (cone, rng) in cones.iter().zip(cone_idxs) {
            let rng = rng.clone();
            let szk = <[T] as VectorMath<T>>::dot_shifted(
                &point.z[rng.clone()],
                &point.s[rng.clone()],
                &self.dir.z[rng.clone()],
                &self.dir.s[rng],
                α,
            );
            if szk <= ε || szk < β_min * μ1 * cone.nu() {
                return false;
            }
        }

        // load the scaled trial point and run the cone oracles
        let rt1 = μ1.sqrt();
        let inv_rt1 = rt1.recip();
        for i in 0..self.ls_s.len() {
            self.ls_s[i] = (point.s[i] + α * self.dir.s[i]) * inv_rt1;
            self.ls_z[i] = (point.z[i] + α * self.dir.z[i]) * inv_rt1;
        }
        for (cone, rng) in cones.iter_mut().zip(cone_idxs) {
            let rng = rng.clone();
            let (prim, dual) = if cone.use_dual_barrier() {
                (&self.ls_z, &self.ls_s)
            } else {
                (&self.ls_s, &self.ls_z)
            };
            cone.load_point(&prim[rng.clone()]);
            cone.load_dual_point(&dual[rng]);
            if !cone.is_feas()
                || !cone.is_dual_feas()
                || !cone.in_neighborhood(μ1, β, settings.use_infty_nbhd)
            {
                return false;
            }
        }
        true
    }
}
