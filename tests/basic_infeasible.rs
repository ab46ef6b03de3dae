#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{NonnegativeCone, SupportedCone};
use nappe::model::Model;
use nappe::solver::{Settings, Solver, Status};

fn scalar_model(b: f64) -> Model<f64> {
    // x = b with slack 0 - x ≥ 0, i.e. x ≤ 0: feasible iff b ≤ 0
    let A = Matrix::from(&[[1.0]]);
    let G = Matrix::from(&[[1.0]]);
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(1).into()];
    Model::new(vec![1.0], A, vec![b], G, vec![0.0], cones, 0.0).unwrap()
}

#[test]
fn test_scalar_feasible() {
    let mut solver = Solver::new(Settings::default());
    solver.load(scalar_model(-1.0)).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.x()[0] + 1.0).abs() <= 1e-6);
}

#[test]
fn test_scalar_primal_infeasible() {
    // flip the sign of b: x = 1 conflicts with x ≤ 0
    let mut solver = Solver::new(Settings::default());
    solver.load(scalar_model(1.0)).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::PrimalInfeasible);
}

#[test]
fn test_dual_infeasible() {
    // min -x  s.t.  x ≥ 0 is unbounded below
    let A = Matrix::<f64>::zeros((0, 1));
    let G = Matrix::from(&[[-1.0]]);
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(1).into()];
    let model = Model::new(vec![-1.0], A, vec![], G, vec![0.0], cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::DualInfeasible);
}

#[test]
fn test_iteration_limit() {
    let settings = nappe::solver::SettingsBuilder::default()
        .iter_limit(0)
        .build()
        .unwrap();
    let mut solver = Solver::new(settings);
    solver.load(scalar_model(-1.0)).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::IterationLimit);
    assert_eq!(solver.iterations(), 0);
}

#[test]
fn test_time_limit() {
    let settings = nappe::solver::SettingsBuilder::default()
        .time_limit(0.0)
        .build()
        .unwrap();
    let mut solver = Solver::new(settings);
    solver.load(scalar_model(-1.0)).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::TimeLimit);
}
