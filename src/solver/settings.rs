use crate::algebra::*;
use crate::linsys::SystemSolverKind;
use derive_builder::Builder;

/// Solver options.
///
/// All tolerances are expressed on the scaled residuals and the
/// complementarity gap of the homogeneous embedding.
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Settings<T: FloatT> {
    /// print a per-iteration table and termination reasons
    #[builder(default = "false")]
    pub verbose: bool,

    /// cap on main-loop iterations
    #[builder(default = "250")]
    pub iter_limit: u32,

    /// wall-clock cap in seconds, polled at iteration boundaries
    #[builder(default = "f64::INFINITY")]
    pub time_limit: f64,

    /// relative optimality gap tolerance
    #[builder(default = "T::epsilon().sqrt() * (10.0).as_T()")]
    pub tol_rel_opt: T,

    /// absolute optimality gap tolerance
    #[builder(default = "T::epsilon().sqrt() * (10.0).as_T()")]
    pub tol_abs_opt: T,

    /// feasibility tolerance on scaled residuals
    #[builder(default = "T::epsilon().sqrt() * (10.0).as_T()")]
    pub tol_feas: T,

    /// threshold for slow-progress termination
    #[builder(default = "(5e-3).as_T()")]
    pub tol_slow: T,

    /// enable rank reduction of A and [A; G]
    #[builder(default = "true")]
    pub preprocess: bool,

    /// use iterative least squares for the initial x, y instead of QR
    #[builder(default = "false")]
    pub init_use_iterative: bool,

    /// pivot tolerance for rank estimation in the preprocessing QR
    #[builder(default = "T::epsilon() * (100.0).as_T()")]
    pub init_tol_qr: T,

    /// permit a dense-factorization fallback when sparse inputs must be
    /// densified for the QR of the initial-point solves
    #[builder(default = "true")]
    pub init_use_fallback: bool,

    /// wide neighborhood parameter β_max
    #[builder(default = "(0.7).as_T()")]
    pub max_nbhd: T,

    /// use the ∞-norm neighborhood in the per-cone proximity check
    #[builder(default = "false")]
    pub use_infty_nbhd: bool,

    /// which direction system factorization to use
    #[builder(default = "SystemSolverKind::QRChol")]
    pub system_solver: SystemSolverKind,
}

impl<T: FloatT> SettingsBuilder<T> {
    fn validate(&self) -> Result<(), String> {
        if let Some(β) = self.max_nbhd {
            if β <= T::zero() || β >= T::one() {
                return Err("max_nbhd must lie in (0, 1)".into());
            }
        }
        if let Some(tol) = self.tol_feas {
            if tol <= T::zero() {
                return Err("tol_feas must be positive".into());
            }
        }
        Ok(())
    }
}

impl<T> Default for Settings<T>
where
    T: FloatT,
{
    fn default() -> Self {
        SettingsBuilder::<T>::default().build().unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::<f64>::default();
        assert!(!s.verbose);
        assert_eq!(s.iter_limit, 250);
        assert_eq!(s.system_solver, SystemSolverKind::QRChol);
        assert!(s.max_nbhd > 0.0 && s.max_nbhd < 1.0);
    }

    #[test]
    fn test_builder_validation() {
        let r = SettingsBuilder::<f64>::default().max_nbhd(1.5).build();
        assert!(r.is_err());
    }
}
