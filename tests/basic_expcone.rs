#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{HypoPerLogCone, NonnegativeCone, SupportedCone};
use nappe::model::Model;
use nappe::solver::{Settings, Solver, Status};

// max y  s.t.  y ≤ log(x), x ≤ 5, through the 3-dimensional
// hypo-perspective-log cone (u, v, w) with v = 1:  u ≤ log(w)
fn log_bound_model(xmax: f64) -> Model<f64> {
    // variables (x, y)
    let A = Matrix::<f64>::zeros((0, 2));
    let G = Matrix::from(&[
        [0.0, -1.0], // u = y
        [0.0, 0.0],  // v = 1 via h
        [-1.0, 0.0], // w = x
        [1.0, 0.0],  // x ≤ xmax
    ]);
    let h = vec![0.0, 1.0, 0.0, xmax];
    let cones: Vec<SupportedCone<f64>> =
        vec![HypoPerLogCone::new(3).into(), NonnegativeCone::new(1).into()];
    Model::new(vec![0.0, -1.0], A, vec![], G, h, cones, 0.0).unwrap()
}

#[test]
fn test_hypoperlog_feasible() {
    let mut solver = Solver::new(Settings::default());
    solver.load(log_bound_model(5.0)).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    let expect = 5.0_f64.ln();
    assert!((solver.primal_obj() + expect).abs() <= 1e-6);

    let x = solver.x();
    assert!((x[0] - 5.0).abs() <= 1e-5);
    assert!((x[1] - expect).abs() <= 1e-5);

    // KKT residual at the reported solution: y ≈ log x and the bound is
    // tight, so the conic slack for the log row is ~0
    assert!((x[1] - x[0].ln()).abs() <= 1e-6);
}

#[test]
fn test_hypoperlog_infeasible() {
    // y ≥ 2 with y ≤ log(x) and x ≤ 5 is infeasible since log 5 < 2
    let A = Matrix::<f64>::zeros((0, 2));
    let G = Matrix::from(&[
        [0.0, -1.0],
        [0.0, 0.0],
        [-1.0, 0.0],
        [1.0, 0.0],
        [0.0, -1.0], // 2 ≤ y  ⇔  -y ≤ -2
    ]);
    let h = vec![0.0, 1.0, 0.0, 5.0, -2.0];
    let cones: Vec<SupportedCone<f64>> =
        vec![HypoPerLogCone::new(3).into(), NonnegativeCone::new(2).into()];
    let model = Model::new(vec![0.0, -1.0], A, vec![], G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::PrimalInfeasible);
}

#[test]
fn test_hypoperlog_multivariate() {
    // max Σ log(xᵢ)  s.t.  x₁ + x₂ = 2, through hypoperlog with d = 2:
    // optimum at x₁ = x₂ = 1 with objective 0
    let A = Matrix::from(&[[0.0, 1.0, 1.0]]);
    let b = vec![2.0];
    // variables (t, x₁, x₂); cone point (t, 1, x₁, x₂)
    let G = Matrix::from(&[
        [-1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, -1.0],
    ]);
    let h = vec![0.0, 1.0, 0.0, 0.0];
    let cones: Vec<SupportedCone<f64>> = vec![HypoPerLogCone::new(4).into()];
    let model = Model::new(vec![-1.0, 0.0, 0.0], A, b, G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert!(solver.primal_obj().abs() <= 1e-6);
    assert!((solver.x()[1] - 1.0).abs() <= 1e-5);
    assert!((solver.x()[2] - 1.0).abs() <= 1e-5);
}
