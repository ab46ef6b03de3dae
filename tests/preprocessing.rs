#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{NonnegativeCone, SupportedCone};
use nappe::model::Model;
use nappe::solver::{SettingsBuilder, Solver, SolverError, Status};

// min x1 + x2  s.t.  x1 = 1 (written twice), x ≥ 0
fn duplicated_row_model(b2: f64) -> Model<f64> {
    let A = Matrix::from(&[[1.0, 0.0], [1.0, 0.0]]);
    let G = Matrix::from(&[[-1.0, 0.0], [0.0, -1.0]]);
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(2).into()];
    Model::new(
        vec![1.0, 1.0],
        A,
        vec![1.0, b2],
        G,
        vec![0.0, 0.0],
        cones,
        0.0,
    )
    .unwrap()
}

#[test]
fn test_rank_deficient_rows_reduced() {
    let settings = SettingsBuilder::default().preprocess(true).build().unwrap();
    let mut solver = Solver::new(settings);
    solver.load(duplicated_row_model(1.0)).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert_eq!(solver.removed_equalities(), 1);
    assert!((solver.primal_obj() - 1.0).abs() <= 1e-6);
    // y is reported in the original row order
    assert_eq!(solver.y().len(), 2);
}

#[test]
fn test_inconsistent_rows_detected() {
    // the duplicated row carries a different right-hand side
    let mut solver = Solver::new(SettingsBuilder::default().build().unwrap());
    solver.load(duplicated_row_model(2.0)).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::PrimalInconsistent);
}

#[test]
fn test_qrchol_without_preprocess_rejected() {
    let settings = SettingsBuilder::default().preprocess(false).build().unwrap();
    let mut solver = Solver::new(settings);
    assert!(matches!(
        solver.load(duplicated_row_model(1.0)),
        Err(SolverError::Config(_))
    ));
}

#[test]
fn test_dependent_columns_reduced() {
    // x2 enters every constraint and the objective exactly like x1, so
    // the column pair is rank deficient
    let A = Matrix::from(&[[1.0, 1.0]]);
    let G = Matrix::from(&[[-1.0, -1.0]]);
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(1).into()];
    let model = Model::new(vec![1.0, 1.0], A, vec![1.0], G, vec![0.0], cones, 0.0).unwrap();

    let mut solver = Solver::new(SettingsBuilder::default().build().unwrap());
    solver.load(model).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - 1.0).abs() <= 1e-6);
    // the reported x is expanded back to both columns
    assert_eq!(solver.x().len(), 2);
    let combined = solver.x()[0] + solver.x()[1];
    assert!((combined - 1.0).abs() <= 1e-6);
}

#[test]
fn test_dependent_columns_dual_inconsistent() {
    // same dependent columns but an objective that disagrees on them
    let A = Matrix::from(&[[1.0, 1.0]]);
    let G = Matrix::from(&[[-1.0, -1.0]]);
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(1).into()];
    let model = Model::new(vec![1.0, 2.0], A, vec![1.0], G, vec![0.0], cones, 0.0).unwrap();

    let mut solver = Solver::new(SettingsBuilder::default().build().unwrap());
    solver.load(model).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::DualInconsistent);
}

#[test]
fn test_iterative_initialization() {
    let settings = SettingsBuilder::default()
        .init_use_iterative(true)
        .build()
        .unwrap();
    let mut solver = Solver::new(settings);
    solver.load(duplicated_row_model(1.0)).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - 1.0).abs() <= 1e-6);
}
