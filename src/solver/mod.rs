#![allow(non_snake_case)]

//! Solver orchestration: preprocessing, the interior-point iteration
//! loop, convergence and termination checks, and solution reporting.

mod preprocess;
mod print;
mod residuals;
mod settings;
mod stepper;

pub use settings::{Settings, SettingsBuilder};

use crate::algebra::*;
use crate::cones::{Cone, SupportedCone};
use crate::linsys::{SystemSolver, SystemSolverKind};
use crate::model::{Model, ModelError, ProblemData};
use crate::point::Point;
use preprocess::{initial_point, preprocess, Preprocessed, PreprocessError};
use residuals::Residuals;
use std::ops::Range;
use std::time::Instant;
use stepper::{StepKind, Stepper};
use thiserror::Error;

/// Solver state and termination statuses.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Status {
    NotLoaded,
    Loaded,
    SolveCalled,
    Optimal,
    PrimalInfeasible,
    DualInfeasible,
    PrimalInconsistent,
    DualInconsistent,
    IllPosed,
    SlowProgress,
    IterationLimit,
    TimeLimit,
    NumericalFailure,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Errors surfaced by [`Solver::load`].
#[derive(Error, Debug)]
pub enum SolverError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// The primal-dual conic interior-point solver.
pub struct Solver<T: FloatT> {
    settings: Settings<T>,
    status: Status,

    orig_n: usize,
    orig_p: usize,

    data: Option<ProblemData<T>>,
    cones: Vec<SupportedCone<T>>,
    cone_idxs: Vec<Range<usize>>,
    prep: Option<Preprocessed<T>>,

    point: Point<T>,
    ν: T,
    μ: T,

    // reported solution, expanded to the original index order
    x_full: Vec<T>,
    y_full: Vec<T>,
    z_sol: Vec<T>,
    s_sol: Vec<T>,
    obj_primal: T,
    obj_dual: T,

    iterations: u32,
    solve_time: f64,

    // slow-progress tracking
    prev_metric: T,
    slow_count: u8,
    last_α: T,
    last_kind: Option<StepKind>,
}

impl<T> Solver<T>
where
    T: FloatT,
{
    pub fn new(settings: Settings<T>) -> Self {
        Self {
            settings,
            status: Status::NotLoaded,
            orig_n: 0,
            orig_p: 0,
            data: None,
            cones: Vec::new(),
            cone_idxs: Vec::new(),
            prep: None,
            point: Point::new(0, 0, 0),
            ν: T::zero(),
            μ: T::zero(),
            x_full: Vec::new(),
            y_full: Vec::new(),
            z_sol: Vec::new(),
            s_sol: Vec::new(),
            obj_primal: T::zero(),
            obj_dual: T::zero(),
            iterations: 0,
            solve_time: 0.0,
            prev_metric: T::infinity(),
            slow_count: 0,
            last_α: T::zero(),
            last_kind: None,
        }
    }

    /// Load a model.  The solver takes ownership of the model data and
    /// cones for the duration of the solve.
    pub fn load(&mut self, model: Model<T>) -> Result<(), SolverError> {
        if self.settings.system_solver == SystemSolverKind::QRChol && !self.settings.preprocess {
            return Err(SolverError::Config(
                "the QRChol system solver requires preprocessing".into(),
            ));
        }

        self.orig_n = model.n();
        self.orig_p = model.p();
        let Model {
            data,
            cones,
            cone_idxs,
        } = model;
        self.data = Some(data);
        self.cones = cones;
        self.cone_idxs = cone_idxs;
        self.prep = None;
        self.status = Status::Loaded;
        self.iterations = 0;
        self.solve_time = 0.0;
        Ok(())
    }

    /// Run the interior-point iteration to termination.
    pub fn solve(&mut self) {
        assert!(
            self.data.is_some(),
            "no model loaded; call load() before solve()"
        );
        self.status = Status::SolveCalled;
        let t0 = Instant::now();
        self.run(t0);
        self.solve_time = t0.elapsed().as_secs_f64();
        self.finalize();
        if self.settings.verbose {
            print::footer(self.status, self.solve_time);
        }
    }

    fn run(&mut self, t0: Instant) {
        // ---- preprocessing and initial point ----
        let prep = if self.settings.preprocess {
            let data = self.data.as_mut().unwrap();
            match preprocess(data, self.settings.init_tol_qr) {
                Ok(prep) => prep,
                Err(PreprocessError::PrimalInconsistent) => {
                    self.status = Status::PrimalInconsistent;
                    return;
                }
                Err(PreprocessError::DualInconsistent) => {
                    self.status = Status::DualInconsistent;
                    return;
                }
                Err(PreprocessError::Numerical(_)) => {
                    self.status = Status::NumericalFailure;
                    return;
                }
            }
        } else {
            let data = self.data.as_ref().unwrap();
            Preprocessed::identity(data.n(), data.p())
        };

        let data = self.data.as_ref().unwrap();
        let (n, p, q) = (data.n(), data.p(), data.q());
        self.ν = self.cones.iter().fold(T::zero(), |acc, c| acc + c.nu());
        self.point = Point::new(n, p, q);

        if initial_point(
            data,
            &mut self.cones,
            &self.cone_idxs,
            &mut self.point,
            prep.qr.as_ref(),
            &self.settings,
        )
        .is_err()
        {
            self.status = Status::NumericalFailure;
            self.prep = Some(prep);
            return;
        }

        // ---- system solver ----
        let system = match self.settings.system_solver {
            SystemSolverKind::Naive => {
                SystemSolver::new_naive(data, &self.cones, &self.cone_idxs)
            }
            SystemSolverKind::QRChol => {
                let qr = prep.qr.as_ref().expect("preprocessing retains QR factors");
                SystemSolver::new_qrchol(
                    data,
                    &self.cone_idxs,
                    qr.Q1.clone(),
                    qr.Q2.clone(),
                    qr.R.clone(),
                )
            }
        };
        let mut system = match system {
            Ok(s) => s,
            Err(_) => {
                self.status = Status::NumericalFailure;
                self.prep = Some(prep);
                return;
            }
        };
        self.prep = Some(prep);

        let mut residuals = Residuals::new(n, p, q);
        let mut stepper = Stepper::new(n, p, q);

        if self.settings.verbose {
            print::header();
        }

        // ---- main loop ----
        loop {
            residuals.update(self.data.as_ref().unwrap(), &self.point);
            self.μ = self.point.mu(self.ν);

            if let Some(status) = self.check_termination(&residuals, t0) {
                self.status = status;
                if self.settings.verbose {
                    self.print_iteration(&residuals);
                }
                break;
            }
            if self.settings.verbose {
                self.print_iteration(&residuals);
            }

            match stepper.step(
                self.data.as_ref().unwrap(),
                &mut self.cones,
                &self.cone_idxs,
                &mut self.point,
                &residuals,
                &mut system,
                self.ν,
                &self.settings,
            ) {
                Ok((α, kind)) => {
                    self.last_α = α;
                    self.last_kind = Some(kind);
                }
                Err(_) => {
                    self.status = Status::NumericalFailure;
                    break;
                }
            }
            self.iterations += 1;
        }
    }

    // polled in order: optimality, primal infeasibility, dual
    // infeasibility, ill-posedness, slow progress, iteration limit,
    // time limit
    fn check_termination(&mut self, r: &Residuals<T>, t0: Instant) -> Option<Status> {
        let data = self.data.as_ref().unwrap();
        let τ = self.point.τ;
        let set = &self.settings;

        let c_scale = T::one() + data.c.norm_inf();
        let b_scale = T::one() + data.b.norm_inf();
        let h_scale = T::one() + data.h.norm_inf();

        let feas_x = r.rx.norm_inf() / τ / c_scale;
        let feas_y = r.ry.norm_inf() / τ / b_scale;
        let feas_z = r.rz.norm_inf() / τ / h_scale;
        let feas = T::max(feas_x, T::max(feas_y, feas_z));

        let obj_p = r.cx / τ;
        let obj_d = -(r.by + r.hz) / τ;
        let gap = self.point.s.dot(&self.point.z) / (τ * τ);
        let rel_gap = gap / (T::one() + T::min(obj_p.abs(), obj_d.abs()));

        if feas <= set.tol_feas && (gap <= set.tol_abs_opt || rel_gap <= set.tol_rel_opt) {
            return Some(Status::Optimal);
        }

        // primal infeasibility certificate from (y, z)
        let denom_p = -(r.by + r.hz);
        if denom_p > T::zero() && r.rx_inf.norm_inf() / denom_p <= set.tol_feas {
            return Some(Status::PrimalInfeasible);
        }

        // dual infeasibility certificate from (x, s)
        let denom_d = -r.cx;
        if denom_d > T::zero() {
            let mut ax_inf = T::zero();
            for i in 0..data.p() {
                ax_inf = T::max(ax_inf, (r.ry[i] + τ * data.b[i]).abs());
            }
            let gxs_inf = r.rz_inf.norm_inf();
            if T::max(ax_inf, gxs_inf) / denom_d <= set.tol_feas {
                return Some(Status::DualInfeasible);
            }
        }

        if self.μ <= set.tol_abs_opt && τ <= set.tol_feas * T::min(T::one(), self.point.κ) {
            return Some(Status::IllPosed);
        }

        // slow progress: two consecutive iterations with relative
        // improvement below tol_slow
        let metric = T::max(feas, rel_gap);
        if self.iterations > 0 {
            if metric > self.prev_metric * (T::one() - set.tol_slow) {
                self.slow_count += 1;
            } else {
                self.slow_count = 0;
            }
            if self.slow_count >= 2 {
                return Some(Status::SlowProgress);
            }
        }
        self.prev_metric = T::min(self.prev_metric, metric);

        if self.iterations >= set.iter_limit {
            return Some(Status::IterationLimit);
        }
        if t0.elapsed().as_secs_f64() > set.time_limit {
            return Some(Status::TimeLimit);
        }
        None
    }

    fn print_iteration(&self, r: &Residuals<T>) {
        let τ = self.point.τ;
        let obj_p = r.cx / τ;
        let obj_d = -(r.by + r.hz) / τ;
        let gap = self.point.s.dot(&self.point.z) / (τ * τ);
        print::iteration(
            self.iterations,
            obj_p,
            obj_d,
            gap,
            r.rx.norm_inf() / τ,
            T::max(r.ry.norm_inf(), r.rz.norm_inf()) / τ,
            τ,
            self.point.κ,
            self.μ,
            self.last_α,
            self.last_kind,
        );
    }

    // expand the iterate back to the original index order and compute
    // the reported objective values
    fn finalize(&mut self) {
        let Some(data) = self.data.as_ref() else {
            return;
        };
        let τ = self.point.τ;

        // divide through by τ for solution-like statuses; leave
        // certificates as rays
        let scale = match self.status {
            Status::Optimal | Status::SlowProgress | Status::IterationLimit | Status::TimeLimit => {
                if τ > T::zero() {
                    τ.recip()
                } else {
                    T::one()
                }
            }
            _ => T::one(),
        };

        self.x_full = vec![T::zero(); self.orig_n];
        self.y_full = vec![T::zero(); self.orig_p];
        if let Some(prep) = self.prep.as_ref() {
            for (i, &j) in prep.x_keep.iter().enumerate() {
                self.x_full[j] = self.point.x[i] * scale;
            }
            for (i, &j) in prep.y_keep.iter().enumerate() {
                self.y_full[j] = self.point.y[i] * scale;
            }
        } else {
            for (i, v) in self.point.x.iter().enumerate() {
                self.x_full[i] = *v * scale;
            }
            for (i, v) in self.point.y.iter().enumerate() {
                self.y_full[i] = *v * scale;
            }
        }
        self.z_sol = self.point.z.iter().map(|&v| v * scale).collect();
        self.s_sol = self.point.s.iter().map(|&v| v * scale).collect();

        let obj_p = data.c.dot(&self.point.x) / τ + data.obj_offset;
        let obj_d = -(data.b.dot(&self.point.y) + data.h.dot(&self.point.z)) / τ + data.obj_offset;
        self.obj_primal = obj_p;
        self.obj_dual = obj_d;
    }

    // ---- accessors ----

    pub fn status(&self) -> Status {
        self.status
    }
    /// primal solution in the original column order
    pub fn x(&self) -> &[T] {
        &self.x_full
    }
    /// equality duals in the original row order
    pub fn y(&self) -> &[T] {
        &self.y_full
    }
    pub fn z(&self) -> &[T] {
        &self.z_sol
    }
    pub fn s(&self) -> &[T] {
        &self.s_sol
    }
    pub fn tau(&self) -> T {
        self.point.τ
    }
    pub fn kappa(&self) -> T {
        self.point.κ
    }
    pub fn mu(&self) -> T {
        self.μ
    }
    pub fn primal_obj(&self) -> T {
        self.obj_primal
    }
    pub fn dual_obj(&self) -> T {
        self.obj_dual
    }
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
    /// wall-clock solve time in seconds
    pub fn solve_time(&self) -> f64 {
        self.solve_time
    }
    /// how many equality rows preprocessing removed
    pub fn removed_equalities(&self) -> usize {
        match self.prep.as_ref() {
            Some(prep) => self.orig_p - prep.y_keep.len(),
            None => 0,
        }
    }
}
