#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{EpiNormEuclCone, EpiPerSquareCone, NonnegativeCone, SupportedCone};
use nappe::linsys::SystemSolverKind;
use nappe::model::Model;
use nappe::solver::{Settings, SettingsBuilder, Solver, Status};

// min x + y  s.t.  (t, x, y) ∈ SOC₃,  t ≤ 1
// optimum x = y = -1/√2 at t = 1, objective -√2
fn socp_model() -> Model<f64> {
    let A = Matrix::<f64>::zeros((0, 3));
    // rows: t ≤ 1 in the nonnegative cone, then s = (t, x, y) in the SOC
    let G = Matrix::from(&[
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, -1.0],
    ]);
    let h = vec![1.0, 0.0, 0.0, 0.0];
    let cones: Vec<SupportedCone<f64>> =
        vec![NonnegativeCone::new(1).into(), EpiNormEuclCone::new(3).into()];
    Model::new(vec![0.0, 1.0, 1.0], A, vec![], G, h, cones, 0.0).unwrap()
}

#[test]
fn test_socp() {
    let mut solver = Solver::new(Settings::default());
    solver.load(socp_model()).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    let sqrt2 = std::f64::consts::SQRT_2;
    assert!((solver.primal_obj() + sqrt2).abs() <= 1e-6);

    let x = solver.x();
    assert!((x[0] - 1.0).abs() <= 1e-5);
    assert!((x[1] + 1.0 / sqrt2).abs() <= 1e-5);
    assert!((x[2] + 1.0 / sqrt2).abs() <= 1e-5);
}

#[test]
fn test_socp_naive() {
    let settings = SettingsBuilder::default()
        .system_solver(SystemSolverKind::Naive)
        .build()
        .unwrap();
    let mut solver = Solver::new(settings);
    solver.load(socp_model()).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() + std::f64::consts::SQRT_2).abs() <= 1e-6);
}

#[test]
fn test_rotated_soc() {
    // min x  s.t.  (x, 1, w) ∈ RSOC (2x ≥ w²),  w = 2  →  x = 2
    // variables (x, w); the perspective component is fixed through h
    let G = Matrix::from(&[[-1.0, 0.0], [0.0, 0.0], [0.0, -1.0]]);
    let h = vec![0.0, 1.0, 0.0];
    let A = Matrix::from(&[[0.0, 1.0]]);
    let b = vec![2.0];
    let cones: Vec<SupportedCone<f64>> = vec![EpiPerSquareCone::new(3).into()];
    let model = Model::new(vec![1.0, 0.0], A, b, G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - 2.0).abs() <= 1e-5);
    assert!((solver.x()[0] - 2.0).abs() <= 1e-5);
}
