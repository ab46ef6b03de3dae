#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{
    EpiNormEuclCone, EpiNormInfCone, HypoPerLogCone, NonnegativeCone, SupportedCone,
};
use nappe::model::Model;
use nappe::solver::{Settings, Solver, Status};

#[test]
fn test_mixed_soc_nonneg_log() {
    // max y + t  s.t.  y ≤ log(x), x ≤ 3, (t, x - 1, y) ∈ SOC with t ≤ ½
    // variables (x, y, t)
    let A = Matrix::<f64>::zeros((0, 3));
    let G = Matrix::from(&[
        // hypoperlog rows: (y, 1, x)
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        // nonnegative rows: x ≤ 3, t ≤ 1/2
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0],
        // SOC rows: (t, x - 1, y)
        [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
    ]);
    let h = vec![0.0, 1.0, 0.0, 3.0, 0.5, 0.0, -1.0, 0.0];
    let cones: Vec<SupportedCone<f64>> = vec![
        HypoPerLogCone::new(3).into(),
        NonnegativeCone::new(2).into(),
        EpiNormEuclCone::new(3).into(),
    ];
    let model = Model::new(vec![0.0, -1.0, -1.0], A, vec![], G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    let x = solver.x();
    // the SOC caps the distance of (x-1, y) at t ≤ 1/2, so the log bound
    // cannot be pushed to x = 3; solution stays on ‖(x-1, y)‖ = 1/2 with
    // y = log x
    assert!(x[1] <= x[0].ln() + 1e-6);
    let dist = ((x[0] - 1.0).powi(2) + x[1].powi(2)).sqrt();
    assert!(dist <= 0.5 + 1e-6);
    assert!(x[2] <= 0.5 + 1e-6);
    // both inequalities are active at the optimum
    assert!((dist - 0.5).abs() <= 1e-5);
    assert!((x[1] - x[0].ln()).abs() <= 1e-4);
}

#[test]
fn test_norminf_projection() {
    // min t  s.t.  t ≥ ‖(x₁ - 1, x₂ + 3)‖∞, x₁ + x₂ = 0.  With x₂ = -x₁
    // the entries are (x₁ - 1, -x₁ + 3), equalized at x₁ = 2 where both
    // are 1, so the optimum is t = 1
    let A = Matrix::from(&[[0.0, 1.0, 1.0]]);
    let b = vec![0.0];
    // variables (t, x₁, x₂); cone point (t, x₁ - 1, x₂ + 3)
    let G = Matrix::from(&[
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, -1.0],
    ]);
    let h = vec![0.0, -1.0, 3.0];
    let cones: Vec<SupportedCone<f64>> = vec![EpiNormInfCone::new(3).into()];
    let model = Model::new(vec![1.0, 0.0, 0.0], A, b, G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - 1.0).abs() <= 1e-5);
    assert!((solver.x()[1] - 2.0).abs() <= 1e-4);
}
