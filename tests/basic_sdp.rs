#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{NonnegativeCone, PosSemidefTriCone, SupportedCone};
use nappe::model::Model;
use nappe::solver::{Settings, Solver, Status};

#[test]
fn test_sdp_trace_objective() {
    // max trace(X)  s.t.  X ⪰ 0 (2×2),  X₁₁ + X₂₂ ≤ 1  →  trace(X) = 1
    // variables are svec(X) = (X₁₁, √2 X₁₂, X₂₂)
    let A = Matrix::<f64>::zeros((0, 3));
    let mut G = Matrix::<f64>::zeros((4, 3));
    // nonnegative row: X₁₁ + X₂₂ ≤ 1
    G[(0, 0)] = 1.0;
    G[(0, 2)] = 1.0;
    // PSD rows: s = svec(X)
    G[(1, 0)] = -1.0;
    G[(2, 1)] = -1.0;
    G[(3, 2)] = -1.0;
    let h = vec![1.0, 0.0, 0.0, 0.0];
    let cones: Vec<SupportedCone<f64>> =
        vec![NonnegativeCone::new(1).into(), PosSemidefTriCone::new(3).into()];
    let model = Model::new(vec![-1.0, 0.0, -1.0], A, vec![], G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() + 1.0).abs() <= 1e-6);

    let x = solver.x();
    let trace = x[0] + x[2];
    assert!((trace - 1.0).abs() <= 1e-6);
    // the optimal X must be PSD: check the 2×2 determinant
    let det = x[0] * x[2] - (x[1] / std::f64::consts::SQRT_2).powi(2);
    assert!(det >= -1e-8);
}

#[test]
fn test_sdp_nearest_point_like() {
    // min X₁₁ + X₂₂ - X₁₂√2·(√2)  s.t. X ⪰ 0, X₁₂ fixed via equality
    // fix √2·X₁₂ = 0.8 and minimize the trace: optimum has X₁₁X₂₂ = X₁₂²
    let A = Matrix::from(&[[0.0, 1.0, 0.0]]);
    let b = vec![0.8];
    let mut G = Matrix::<f64>::zeros((3, 3));
    G[(0, 0)] = -1.0;
    G[(1, 1)] = -1.0;
    G[(2, 2)] = -1.0;
    let h = vec![0.0; 3];
    let cones: Vec<SupportedCone<f64>> = vec![PosSemidefTriCone::new(3).into()];
    let model = Model::new(vec![1.0, 0.0, 1.0], A, b, G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    // min X₁₁ + X₂₂ subject to X₁₁X₂₂ ≥ X₁₂², X₁₂ = 0.8/√2:
    // optimum 2·|X₁₂| = 2·0.8/√2 = 0.8·√2
    let expect = 0.8 * std::f64::consts::SQRT_2;
    assert!((solver.primal_obj() - expect).abs() <= 1e-5);
}
