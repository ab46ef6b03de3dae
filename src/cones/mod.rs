#![allow(non_snake_case)]

//! Cone library.
//!
//! One type per supported cone, each implementing the [`Cone`] contract
//! through the crate-internal [`BarrierCone`] hook trait: a cone supplies
//! its barrier-specific pieces (feasibility tests, gradient, Hessian, and
//! optional fast paths and third-order correction) and inherits the lazy
//! recomputation machinery, the dense-Hessian fallbacks and the
//! central-path neighborhood test.
//!
//! Derived quantities form a dependency chain: feasibility → gradient →
//! Hessian → Hessian factorization → correction.  Loading or rescaling a
//! point clears everything downstream; queries repopulate the caches in
//! order.

use crate::algebra::*;
use enum_dispatch::*;

mod doublynonnegativetri;
mod epinormeucl;
mod epinorminf;
mod epinormspectral;
mod epipersepspectral;
mod epipersquare;
mod epirelentropy;
mod epitracerelentropytri;
mod hypogeomean;
mod hypoperlog;
mod hypoperlogdettri;
mod hypopowermean;
mod hyporootdettri;
mod linmatrixineq;
mod nonnegative;
mod possemideftri;
mod power;
mod wsosinterpepinormeucl;
mod wsosinterpepinorminf;
mod wsosinterpnonnegative;
mod wsosinterppossemideftri;

pub use doublynonnegativetri::*;
pub use epinormeucl::*;
pub use epinorminf::*;
pub use epinormspectral::*;
pub use epipersepspectral::*;
pub use epipersquare::*;
pub use epirelentropy::*;
pub use epitracerelentropytri::*;
pub use hypogeomean::*;
pub use hypoperlog::*;
pub use hypoperlogdettri::*;
pub use hypopowermean::*;
pub use hyporootdettri::*;
pub use linmatrixineq::*;
pub use nonnegative::*;
pub use possemideftri::*;
pub use power::*;
pub use wsosinterpepinormeucl::*;
pub use wsosinterpepinorminf::*;
pub use wsosinterpnonnegative::*;
pub use wsosinterppossemideftri::*;

/// The cone contract used by the stepper and the system solvers.
///
/// Unless noted otherwise, operations are valid only once a primal (and,
/// where relevant, dual) point has been loaded.  Points are loaded in the
/// solver's scaled coordinates (divided by √μ), so the central-path
/// condition reads `dual_point = -∇F(point)`.
#[enum_dispatch]
pub trait Cone<T>
where
    T: FloatT,
{
    /// dimension of the cone (length of its point vectors)
    fn dim(&self) -> usize;

    /// barrier parameter ν
    fn nu(&self) -> T;

    /// if true, the solver swaps primal and dual roles for this cone's slice
    fn use_dual_barrier(&self) -> bool;

    /// write a strictly feasible primal anchor with ⟨p, -∇F(p)⟩ = ν
    fn set_initial_point(&self, arr: &mut [T]);

    /// store a primal point and reset all freshness flags
    fn load_point(&mut self, point: &[T]);

    /// store a dual point and reset all freshness flags
    fn load_dual_point(&mut self, point: &[T]);

    /// multiply the stored primal point by α
    fn rescale_point(&mut self, α: T);

    /// clear all freshness flags
    fn reset_data(&mut self);

    /// strict primal feasibility of the loaded point (conservative)
    fn is_feas(&mut self) -> bool;

    /// strict dual feasibility of the loaded dual point (conservative)
    fn is_dual_feas(&mut self) -> bool;

    /// barrier gradient ∇F at the loaded point
    fn grad(&mut self) -> &[T];

    /// out = ∇²F(point) · v
    fn hess_prod(&mut self, out: &mut [T], v: &[T]);

    /// out = ∇²F(point)⁻¹ · v; false if the Hessian factorization failed
    fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) -> bool;

    /// materialized Hessian (full symmetric storage)
    fn hess(&mut self) -> &Matrix<T>;

    /// materialized inverse Hessian; None if the factorization failed
    fn inv_hess(&mut self) -> Option<&Matrix<T>>;

    /// whether the loaded (scaled) primal/dual pair lies within distance β
    /// of the central path in the cone's local metric
    fn in_neighborhood(&mut self, μ: T, β: T, use_infty: bool) -> bool;

    /// whether this cone supplies a third-order correction
    fn use_correction(&self) -> bool;

    /// ½ D³F(point)[dir, dir]; valid only if `use_correction`
    fn correction(&mut self, primal_dir: &[T]) -> &[T];
}

/// Shared mutable state embedded in every cone type.
pub(crate) struct ConeCore<T> {
    pub dim: usize,
    pub nu: T,
    pub use_dual: bool,

    pub point: Vec<T>,
    pub dual_point: Vec<T>,
    pub grad: Vec<T>,
    pub hess: Matrix<T>,
    pub inv_hess: Matrix<T>,
    pub hess_fact: CholeskyEngine<T>,
    pub corr: Vec<T>,

    pub work: Vec<T>,
    pub work2: Vec<T>,

    // private scratch for the neighborhood test; cone implementations
    // must not touch these
    nbhd_work: Vec<T>,
    nbhd_work2: Vec<T>,

    // freshness flags, cleared on every load/rescale/reset
    pub feas_checked: bool,
    pub feas: bool,
    pub dual_feas_checked: bool,
    pub dual_feas: bool,
    pub grad_ok: bool,
    pub hess_ok: bool,
    pub hess_fact_ok: bool,
    pub hess_fact_good: bool,
    pub inv_hess_ok: bool,
}

impl<T> ConeCore<T>
where
    T: FloatT,
{
    pub fn new(dim: usize, nu: T) -> Self {
        Self {
            dim,
            nu,
            use_dual: false,
            point: vec![T::zero(); dim],
            dual_point: vec![T::zero(); dim],
            grad: vec![T::zero(); dim],
            // Hessian storage is allocated on first materialization
            hess: Matrix::zeros((0, 0)),
            inv_hess: Matrix::zeros((0, 0)),
            hess_fact: CholeskyEngine::new(0),
            corr: vec![T::zero(); dim],
            work: vec![T::zero(); dim],
            work2: vec![T::zero(); dim],
            nbhd_work: vec![T::zero(); dim],
            nbhd_work2: vec![T::zero(); dim],
            feas_checked: false,
            feas: false,
            dual_feas_checked: false,
            dual_feas: false,
            grad_ok: false,
            hess_ok: false,
            hess_fact_ok: false,
            hess_fact_good: false,
            inv_hess_ok: false,
        }
    }

    pub fn reset(&mut self) {
        self.feas_checked = false;
        self.feas = false;
        self.dual_feas_checked = false;
        self.dual_feas = false;
        self.grad_ok = false;
        self.hess_ok = false;
        self.hess_fact_ok = false;
        self.hess_fact_good = false;
        self.inv_hess_ok = false;
    }
}

/// Barrier-specific hooks supplied by each cone type.  The provided
/// methods implement the [`Cone`] contract on top of them; the
/// `impl_cone_contract!` macro forwards the public trait to these.
pub(crate) trait BarrierCone<T>
where
    T: FloatT,
{
    fn core(&self) -> &ConeCore<T>;
    fn core_mut(&mut self) -> &mut ConeCore<T>;

    /// strictly feasible anchor with z = -∇F(p) also strictly feasible
    fn initial_point(&self, arr: &mut [T]);

    /// strict feasibility of `core.point`, conservative on numerics
    fn update_feas(&mut self) -> bool;

    /// explicit dual cone membership oracle for `core.dual_point`.
    /// `None` selects the Dikin-ellipsoid fallback: the dual point is
    /// accepted only if it lies in the unit ellipsoid of the conjugate
    /// barrier around -∇F(point), which always implies membership.
    fn dual_feas_oracle(&mut self) -> Option<bool> {
        None
    }

    /// populate `core.grad` (feasibility already established)
    fn update_grad(&mut self);

    /// populate `core.hess` as a full symmetric matrix (gradient fresh)
    fn update_hess(&mut self);

    // optional fast paths; a `false` return falls back to the
    // materialized Hessian
    fn hess_prod_fast(&mut self, _out: &mut [T], _v: &[T]) -> bool {
        false
    }
    fn inv_hess_prod_fast(&mut self, _out: &mut [T], _v: &[T]) -> bool {
        false
    }
    fn hess_diag_fast(&mut self, _out: &mut [T]) -> bool {
        false
    }
    /// populate `core.inv_hess` directly; default goes through the
    /// Cholesky factorization of the materialized Hessian
    fn inv_hess_fast(&mut self) -> bool {
        false
    }

    fn use_correction(&self) -> bool {
        false
    }

    /// populate `core.corr` with ½ D³F[dir, dir]
    fn update_correction(&mut self, _dir: &[T]) {
        unreachable!("cone does not supply a correction");
    }

    // ---------------------------------------------------------------
    // provided: lazy recomputation over the hooks
    // ---------------------------------------------------------------

    fn bc_load_point(&mut self, point: &[T]) {
        let c = self.core_mut();
        c.point.copy_from(point);
        c.reset();
    }

    fn bc_load_dual_point(&mut self, point: &[T]) {
        let c = self.core_mut();
        c.dual_point.copy_from(point);
        c.reset();
    }

    fn bc_rescale_point(&mut self, α: T) {
        let c = self.core_mut();
        c.point.scale(α);
        c.reset();
    }

    fn bc_is_feas(&mut self) -> bool {
        if !self.core().feas_checked {
            let feas = self.update_feas();
            let c = self.core_mut();
            c.feas = feas;
            c.feas_checked = true;
        }
        self.core().feas
    }

    fn bc_is_dual_feas(&mut self) -> bool {
        if !self.core().dual_feas_checked {
            let feas = match self.dual_feas_oracle() {
                Some(feas) => feas,
                None => self.bc_dikin_dual_feas(),
            };
            let c = self.core_mut();
            c.dual_feas = feas;
            c.dual_feas_checked = true;
        }
        self.core().dual_feas
    }

    fn bc_grad(&mut self) -> &[T] {
        if !self.core().grad_ok {
            // feasibility is a hard prerequisite: it loads the caches the
            // gradient update reads from
            let feas = self.bc_is_feas();
            debug_assert!(feas);
            self.update_grad();
            self.core_mut().grad_ok = true;
        }
        &self.core().grad
    }

    fn bc_ensure_hess(&mut self) {
        if !self.core().hess_ok {
            self.bc_grad();
            let dim = self.core().dim;
            if self.core().hess.nrows() != dim {
                self.core_mut().hess.resize((dim, dim));
            }
            self.update_hess();
            self.core_mut().hess_ok = true;
        }
    }

    // factorization of the materialized Hessian; true if positive definite
    fn bc_ensure_hess_fact(&mut self) -> bool {
        if !self.core().hess_fact_ok {
            self.bc_ensure_hess();
            let dim = self.core().dim;
            let c = self.core_mut();
            if c.hess_fact.n() != dim {
                c.hess_fact.resize(dim);
            }
            let good = c.hess_fact.factor(&c.hess).is_ok();
            c.hess_fact_ok = true;
            c.hess_fact_good = good;
        }
        self.core().hess_fact_good
    }

    fn bc_hess_prod(&mut self, out: &mut [T], v: &[T]) {
        self.bc_grad();
        if self.hess_prod_fast(out, v) {
            return;
        }
        self.bc_ensure_hess();
        self.core().hess.symv(out, v, T::one(), T::zero());
    }

    fn bc_inv_hess_prod(&mut self, out: &mut [T], v: &[T]) -> bool {
        self.bc_grad();
        if self.inv_hess_prod_fast(out, v) {
            return true;
        }
        if !self.bc_ensure_hess_fact() {
            return false;
        }
        out.copy_from(v);
        self.core().hess_fact.solve(out);
        true
    }

    fn bc_hess(&mut self) -> &Matrix<T> {
        self.bc_ensure_hess();
        &self.core().hess
    }

    fn bc_inv_hess(&mut self) -> Option<&Matrix<T>> {
        if !self.core().inv_hess_ok {
            self.bc_grad();
            let dim = self.core().dim;
            if self.core().inv_hess.nrows() != dim {
                self.core_mut().inv_hess.resize((dim, dim));
            }
            if !self.inv_hess_fast() {
                if !self.bc_ensure_hess_fact() {
                    return None;
                }
                let c = self.core_mut();
                c.hess_fact.inverse_into(&mut c.inv_hess);
                c.inv_hess.symmetrize_from_triu();
            }
            self.core_mut().inv_hess_ok = true;
        }
        Some(&self.core().inv_hess)
    }

    // distance to the central path in the local metric; the loaded points
    // are scaled by 1/√μ so the target is dual_point = -∇F(point)
    fn bc_in_neighborhood(&mut self, _μ: T, β: T, use_infty: bool) -> bool {
        if !self.bc_is_feas() {
            return false;
        }
        self.bc_grad();

        let dim = self.core().dim;
        let mut δ = std::mem::take(&mut self.core_mut().nbhd_work);
        let mut tmp = std::mem::take(&mut self.core_mut().nbhd_work2);
        {
            let c = self.core();
            for i in 0..dim {
                δ[i] = c.dual_point[i] + c.grad[i];
            }
        }

        let η = if use_infty {
            // per-coordinate deviation scaled by the Hessian diagonal
            let got = self.hess_diag_fast(&mut tmp) || {
                self.bc_ensure_hess();
                let c = self.core();
                for i in 0..dim {
                    tmp[i] = c.hess[(i, i)];
                }
                true
            };
            debug_assert!(got);
            let mut worst = T::zero();
            for i in 0..dim {
                if tmp[i] <= T::zero() {
                    worst = T::infinity();
                    break;
                }
                worst = T::max(worst, T::abs(δ[i]) / T::sqrt(tmp[i]));
            }
            worst
        } else {
            if !self.bc_inv_hess_prod(&mut tmp, &δ) {
                self.core_mut().nbhd_work = δ;
                self.core_mut().nbhd_work2 = tmp;
                return false;
            }
            let η2 = δ.dot(&tmp);
            if η2 < T::zero() {
                T::infinity()
            } else {
                T::sqrt(η2)
            }
        };

        self.core_mut().nbhd_work = δ;
        self.core_mut().nbhd_work2 = tmp;

        η.is_finite() && η < β
    }

    // Dikin-ellipsoid membership of the dual point in the conjugate
    // barrier's unit ball around -∇F(point); sufficient for strict dual
    // feasibility by self-concordance
    fn bc_dikin_dual_feas(&mut self) -> bool {
        self.bc_in_neighborhood(T::one(), T::one(), false)
    }

    fn bc_correction(&mut self, dir: &[T]) -> &[T] {
        debug_assert!(self.use_correction());
        self.bc_grad();
        self.update_correction(dir);
        &self.core().corr
    }
}

/// Forward the public [`Cone`] trait of a cone type to its
/// [`BarrierCone`] hooks, and generate the dual-barrier builder.
macro_rules! impl_cone_contract {
    ($C:ident) => {
        impl<T> $C<T>
        where
            T: FloatT,
        {
            /// use the conjugate barrier: the solver swaps primal and dual
            /// roles on this cone's slice
            pub fn with_dual_barrier(mut self) -> Self {
                self.core_mut().use_dual = true;
                self
            }
        }

        impl<T> crate::cones::Cone<T> for $C<T>
        where
            T: FloatT,
        {
            fn dim(&self) -> usize {
                self.core().dim
            }
            fn nu(&self) -> T {
                self.core().nu
            }
            fn use_dual_barrier(&self) -> bool {
                self.core().use_dual
            }
            fn set_initial_point(&self, arr: &mut [T]) {
                self.initial_point(arr);
            }
            fn load_point(&mut self, point: &[T]) {
                self.bc_load_point(point);
            }
            fn load_dual_point(&mut self, point: &[T]) {
                self.bc_load_dual_point(point);
            }
            fn rescale_point(&mut self, α: T) {
                self.bc_rescale_point(α);
            }
            fn reset_data(&mut self) {
                self.core_mut().reset();
            }
            fn is_feas(&mut self) -> bool {
                self.bc_is_feas()
            }
            fn is_dual_feas(&mut self) -> bool {
                self.bc_is_dual_feas()
            }
            fn grad(&mut self) -> &[T] {
                self.bc_grad()
            }
            fn hess_prod(&mut self, out: &mut [T], v: &[T]) {
                self.bc_hess_prod(out, v);
            }
            fn inv_hess_prod(&mut self, out: &mut [T], v: &[T]) -> bool {
                self.bc_inv_hess_prod(out, v)
            }
            fn hess(&mut self) -> &Matrix<T> {
                self.bc_hess()
            }
            fn inv_hess(&mut self) -> Option<&Matrix<T>> {
                self.bc_inv_hess()
            }
            fn in_neighborhood(&mut self, μ: T, β: T, use_infty: bool) -> bool {
                self.bc_in_neighborhood(μ, β, use_infty)
            }
            fn use_correction(&self) -> bool {
                BarrierCone::use_correction(self)
            }
            fn correction(&mut self, primal_dir: &[T]) -> &[T] {
                self.bc_correction(primal_dir)
            }
        }
    };
}
pub(crate) use impl_cone_contract;

/// Tagged sum over the cone variants; the solver iterates over a
/// `Vec<SupportedCone<T>>`.
#[enum_dispatch(Cone<T>)]
pub enum SupportedCone<T>
where
    T: FloatT,
{
    NonnegativeCone(NonnegativeCone<T>),
    EpiNormEuclCone(EpiNormEuclCone<T>),
    EpiPerSquareCone(EpiPerSquareCone<T>),
    EpiNormInfCone(EpiNormInfCone<T>),
    EpiNormSpectralCone(EpiNormSpectralCone<T>),
    PosSemidefTriCone(PosSemidefTriCone<T>),
    DoublyNonnegativeTriCone(DoublyNonnegativeTriCone<T>),
    PowerCone(PowerCone<T>),
    HypoGeoMeanCone(HypoGeoMeanCone<T>),
    HypoPowerMeanCone(HypoPowerMeanCone<T>),
    HypoPerLogCone(HypoPerLogCone<T>),
    HypoPerLogdetTriCone(HypoPerLogdetTriCone<T>),
    HypoRootdetTriCone(HypoRootdetTriCone<T>),
    EpiPerSepSpectralVectorCone(EpiPerSepSpectralVectorCone<T>),
    EpiPerSepSpectralMatrixCone(EpiPerSepSpectralMatrixCone<T>),
    EpiRelEntropyCone(EpiRelEntropyCone<T>),
    EpiTraceRelEntropyTriCone(EpiTraceRelEntropyTriCone<T>),
    WSOSInterpNonnegativeCone(WSOSInterpNonnegativeCone<T>),
    WSOSInterpPosSemidefTriCone(WSOSInterpPosSemidefTriCone<T>),
    WSOSInterpEpiNormInfCone(WSOSInterpEpiNormInfCone<T>),
    WSOSInterpEpiNormEuclCone(WSOSInterpEpiNormEuclCone<T>),
    LinMatrixIneqCone(LinMatrixIneqCone<T>),
}

#[cfg(test)]
mod tests;
