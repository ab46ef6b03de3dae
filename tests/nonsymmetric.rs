#![allow(non_snake_case)]

use nappe::algebra::*;
use nappe::cones::{
    EpiRelEntropyCone, HypoGeoMeanCone, NonnegativeCone, PowerCone, SupportedCone,
    WSOSInterpEpiNormInfCone, WSOSInterpNonnegativeCone,
};
use nappe::model::Model;
use nappe::solver::{Settings, Solver, Status};

#[test]
fn test_hypogeomean() {
    // max geomean(x1, x2)  s.t.  x1 + x2 ≤ 2  →  t = 1 at x = (1, 1)
    // variables (t, x1, x2), cone point (t, x1, x2)
    let A = Matrix::<f64>::zeros((0, 3));
    let G = Matrix::from(&[
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, -1.0],
        [0.0, 1.0, 1.0],
    ]);
    let h = vec![0.0, 0.0, 0.0, 2.0];
    let cones: Vec<SupportedCone<f64>> =
        vec![HypoGeoMeanCone::new(3).into(), NonnegativeCone::new(1).into()];
    let model = Model::new(vec![-1.0, 0.0, 0.0], A, vec![], G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() + 1.0).abs() <= 1e-6);
    assert!((solver.x()[1] - 1.0).abs() <= 1e-5);
    assert!((solver.x()[2] - 1.0).abs() <= 1e-5);
}

#[test]
fn test_power_cone() {
    // max w  s.t.  (u1, u2, w) in the power cone with α = (½, ½),
    // u1 = 1, u2 = 2:  w* = √(u1·u2) = √2
    let A = Matrix::from(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
    let b = vec![1.0, 2.0];
    let G = Matrix::from(&[
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, -1.0],
    ]);
    let h = vec![0.0; 3];
    let cones: Vec<SupportedCone<f64>> = vec![PowerCone::new(vec![0.5, 0.5], 1).into()];
    let model = Model::new(vec![0.0, 0.0, -1.0], A, b, G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    let sqrt2 = std::f64::consts::SQRT_2;
    assert!((solver.primal_obj() + sqrt2).abs() <= 1e-5);
    assert!((solver.x()[2] - sqrt2).abs() <= 1e-5);
}

#[test]
fn test_wsos_interp_nonnegative() {
    // max t  s.t.  x² - t lies in the interpolation cone on the grid
    // {-1, 0, 1} with the degree-1 basis P = [1, x]:
    //   Λ(s) = [[Σ sᵤ, s₃ - s₁], [s₃ - s₁, s₁ + s₃]]
    // with s(t) = (1-t, -t, 1-t) this is diag(2-3t, 2-2t), so the
    // largest feasible t is 2/3
    let P = Matrix::from(&[[1.0, -1.0], [1.0, 0.0], [1.0, 1.0]]);
    let A = Matrix::<f64>::zeros((0, 1));
    let G = Matrix::from(&[[1.0], [1.0], [1.0]]);
    let h = vec![1.0, 0.0, 1.0];
    let cones: Vec<SupportedCone<f64>> =
        vec![WSOSInterpNonnegativeCone::new(3, vec![P]).into()];
    let model = Model::new(vec![-1.0], A, vec![], G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() + 2.0 / 3.0).abs() <= 1e-6);
    assert!((solver.x()[0] - 2.0 / 3.0).abs() <= 1e-5);
    // the reported slack must sit (weakly) inside the cone:
    // both diagonal Λ entries are nonnegative
    let s = solver.s();
    assert!(s[0] + s[1] + s[2] >= -1e-7);
    assert!(s[0] + s[2] >= -1e-7);
}

#[test]
fn test_wsos_interp_epinorminf() {
    // min t  s.t.  |g| ≤ t in the R = 2 interpolation cone on a 2-point
    // grid with the constant basis P = [1]: the split factors are
    //   Λ(s₁ ± s₂) = Σᵤ (s₁ ± s₂)ᵤ
    // with s₁ = (t, t) and s₂ = (1, -3) these are 2t - 2 and 2t + 2,
    // so the optimum is t = 1
    let P = Matrix::from(&[[1.0], [1.0]]);
    let A = Matrix::<f64>::zeros((0, 1));
    let G = Matrix::from(&[[-1.0], [-1.0], [0.0], [0.0]]);
    let h = vec![0.0, 0.0, 1.0, -3.0];
    let cones: Vec<SupportedCone<f64>> =
        vec![WSOSInterpEpiNormInfCone::new(2, 2, vec![P]).into()];
    let model = Model::new(vec![1.0], A, vec![], G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    assert!((solver.primal_obj() - 1.0).abs() <= 1e-6);
    assert!((solver.x()[0] - 1.0).abs() <= 1e-5);
}

#[test]
fn test_relative_entropy() {
    // min u  s.t.  u ≥ w log(w/v), v = 1, w = 2:  u* = 2 log 2
    let A = Matrix::from(&[[0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
    let b = vec![1.0, 2.0];
    let G = Matrix::from(&[
        [-1.0, 0.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, -1.0],
    ]);
    let h = vec![0.0; 3];
    let cones: Vec<SupportedCone<f64>> = vec![EpiRelEntropyCone::new(3).into()];
    let model = Model::new(vec![1.0, 0.0, 0.0], A, b, G, h, cones, 0.0).unwrap();

    let mut solver = Solver::new(Settings::default());
    solver.load(model).unwrap();
    solver.solve();

    assert_eq!(solver.status(), Status::Optimal);
    let expect = 2.0 * 2.0_f64.ln();
    assert!((solver.primal_obj() - expect).abs() <= 1e-5);
}
