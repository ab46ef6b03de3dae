#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{NonnegativeCone, SupportedCone};
use nappe::linsys::SystemSolverKind;
use nappe::model::Model;
use nappe::solver::{Settings, SettingsBuilder, Solver, Status};

// min -x1 - x2  s.t.  x1 ≤ 1, x2 ≤ 1, x1 + x2 ≤ 1.5
// optimum -1.5 at any point on the x1 + x2 = 1.5 face with x ≤ 1
fn lp_model() -> Model<f64> {
    let A = Matrix::<f64>::zeros((0, 2));
    let G = Matrix::from(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
    let h = vec![1.0, 1.0, 1.5];
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(3).into()];
    Model::new(vec![-1.0, -1.0], A, vec![], G, h, cones, 0.0).unwrap()
}

fn solve_lp(settings: Settings<f64>) -> Solver<f64> {
    let mut solver = Solver::new(settings);
    solver.load(lp_model()).unwrap();
    solver.solve();
    solver
}

fn check_lp_solution(solver: &Solver<f64>) {
    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - (-1.5)).abs() <= 1e-6);
    assert!((solver.dual_obj() - (-1.5)).abs() <= 1e-6);

    let x = solver.x();
    assert!((x[0] + x[1] - 1.5).abs() <= 1e-6);
    assert!(x[0] <= 1.0 + 1e-6 && x[1] <= 1.0 + 1e-6);
}

#[test]
fn test_lp_qrchol() {
    let solver = solve_lp(Settings::default());
    check_lp_solution(&solver);
    assert!(solver.tau() > 0.0 && solver.kappa() > 0.0);
    assert!(solver.mu() <= 1e-6);
}

#[test]
fn test_lp_naive() {
    let settings = SettingsBuilder::default()
        .system_solver(SystemSolverKind::Naive)
        .preprocess(false)
        .build()
        .unwrap();
    check_lp_solution(&solve_lp(settings));
}

#[test]
fn test_lp_infty_nbhd() {
    let settings = SettingsBuilder::default().use_infty_nbhd(true).build().unwrap();
    check_lp_solution(&solve_lp(settings));
}

#[test]
fn test_lp_with_equality() {
    // min -x1 - x2  s.t.  x1 = 0.25, x ≥ 0, x1 + x2 ≤ 1.5
    let A = Matrix::from(&[[1.0, 0.0]]);
    let G = Matrix::from(&[[-1.0, 0.0], [0.0, -1.0], [1.0, 1.0]]);
    let h = vec![0.0, 0.0, 1.5];
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(3).into()];
    let model = Model::new(vec![-1.0, -1.0], A, vec![0.25], G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    let x = solver.x();
    assert!((x[0] - 0.25).abs() <= 1e-6);
    assert!((x[1] - 1.25).abs() <= 1e-6);
    assert!((solver.primal_obj() - (-1.5)).abs() <= 1e-6);
}

#[test]
fn test_lp_objective_offset() {
    let A = Matrix::<f64>::zeros((0, 2));
    let G = Matrix::from(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(3).into()];
    let model = Model::new(
        vec![-1.0, -1.0],
        A,
        vec![],
        G,
        vec![1.0, 1.0, 1.5],
        cones,
        10.0,
    )
    .unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - 8.5).abs() <= 1e-6);
}

#[test]
fn test_lp_sparse_inputs() {
    let A = CscMatrix::<f64>::zeros((0, 2));
    let G = CscMatrix::from_dense(&Matrix::from(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]));
    let cones: Vec<SupportedCone<f64>> = vec![NonnegativeCone::new(3).into()];
    let model = Model::new(
        vec![-1.0, -1.0],
        A,
        vec![],
        G,
        vec![1.0, 1.0, 1.5],
        cones,
        0.0,
    )
    .unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();
    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - (-1.5)).abs() <= 1e-6);
}
