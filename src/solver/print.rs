//! Verbose-mode iteration table and termination banner.

use super::stepper::StepKind;
use crate::algebra::FloatT;

pub(crate) fn header() {
    println!(
        "{:>4} {:>11} {:>11} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7} {:>4}",
        "iter", "p_obj", "d_obj", "gap", "x_feas", "yz_feas", "tau", "kap", "mu", "alpha", "dir"
    );
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn iteration<T: FloatT>(
    iter: u32,
    obj_p: T,
    obj_d: T,
    gap: T,
    x_feas: T,
    yz_feas: T,
    τ: T,
    κ: T,
    μ: T,
    α: T,
    kind: Option<StepKind>,
) {
    let dir = match kind {
        Some(StepKind::Predict) => "pred",
        Some(StepKind::Center) => "cent",
        None => "-",
    };
    println!(
        "{:>4} {:>11.4e} {:>11.4e} {:>9.2e} {:>9.2e} {:>9.2e} {:>9.2e} {:>9.2e} {:>9.2e} {:>7.2} {:>4}",
        iter, obj_p, obj_d, gap, x_feas, yz_feas, τ, κ, μ, α, dir
    );
}

pub(crate) fn footer(status: super::Status, seconds: f64) {
    println!("terminated with status {status} in {seconds:.3e} seconds");
}
