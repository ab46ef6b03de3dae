use super::*;

// deterministic noise for perturbed points
fn wiggle(seed: &mut u64) -> f64 {
    *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (((*seed >> 33) as f64) / ((1u64 << 31) as f64) - 1.0).clamp(-1.0, 1.0)
}

fn all_test_cones() -> Vec<(&'static str, SupportedCone<f64>)> {
    let vander = Matrix::from(&[[1.0, -1.0], [1.0, 0.0], [1.0, 1.0]]);
    let ones31 = Matrix::from(&[[1.0], [1.0], [1.0]]);
    let ones21 = Matrix::from(&[[1.0], [1.0]]);
    let sym_off = Matrix::from(&[[0.0, 1.0], [1.0, 0.0]]);

    vec![
        ("nonnegative", NonnegativeCone::new(3).into()),
        ("epinormeucl", EpiNormEuclCone::new(3).into()),
        ("epipersquare", EpiPerSquareCone::new(4).into()),
        ("epinorminf", EpiNormInfCone::new(4).into()),
        ("epinormspectral", EpiNormSpectralCone::new(2, 3).into()),
        ("possemideftri", PosSemidefTriCone::new(6).into()),
        ("doublynonnegativetri", DoublyNonnegativeTriCone::new(6).into()),
        ("power", PowerCone::new(vec![0.3, 0.7], 2).into()),
        ("hypogeomean", HypoGeoMeanCone::new(4).into()),
        ("hypopowermean", HypoPowerMeanCone::new(vec![0.2, 0.3, 0.5]).into()),
        ("hypoperlog3", HypoPerLogCone::new(3).into()),
        ("hypoperlog5", HypoPerLogCone::new(5).into()),
        ("hypoperlogdettri", HypoPerLogdetTriCone::new(8).into()),
        ("hyporootdettri", HypoRootdetTriCone::new(7).into()),
        (
            "epipersepspectral_vector_neglog",
            EpiPerSepSpectralVectorCone::new(SepSpectralFun::NegLog, 3).into(),
        ),
        (
            "epipersepspectral_vector_negentropy",
            EpiPerSepSpectralVectorCone::new(SepSpectralFun::NegEntropy, 2).into(),
        ),
        (
            "epipersepspectral_vector_power12",
            EpiPerSepSpectralVectorCone::new(SepSpectralFun::Power12(1.5), 2).into(),
        ),
        (
            "epipersepspectral_matrix_neglog",
            EpiPerSepSpectralMatrixCone::new(SepSpectralFun::NegLog, 2).into(),
        ),
        (
            "epipersepspectral_matrix_negentropy",
            EpiPerSepSpectralMatrixCone::new(SepSpectralFun::NegEntropy, 2).into(),
        ),
        ("epirelentropy", EpiRelEntropyCone::new(5).into()),
        ("epitracerelentropytri", EpiTraceRelEntropyTriCone::new(7).into()),
        (
            "wsosinterpnonnegative",
            WSOSInterpNonnegativeCone::new(3, vec![vander.clone(), ones31]).into(),
        ),
        (
            "wsosinterppossemideftri",
            WSOSInterpPosSemidefTriCone::new(2, 2, vec![ones21.clone()]).into(),
        ),
        (
            "wsosinterpepinorminf",
            WSOSInterpEpiNormInfCone::new(2, 2, vec![ones21.clone()]).into(),
        ),
        (
            "wsosinterpepinormeucl",
            WSOSInterpEpiNormEuclCone::new(2, 2, vec![ones21]).into(),
        ),
        (
            "linmatrixineq",
            LinMatrixIneqCone::new(vec![Matrix::identity(2), sym_off]).into(),
        ),
    ]
}

fn check_cone_contract(name: &str, cone: &mut SupportedCone<f64>, perturb: f64, seed: &mut u64) {
    let dim = cone.dim();
    let ν = cone.nu();

    let mut p = vec![0.0; dim];
    cone.set_initial_point(&mut p);
    for x in p.iter_mut() {
        *x += perturb * wiggle(seed);
    }

    cone.load_point(&p);
    assert!(cone.is_feas(), "{name}: initial point must be feasible");

    // logarithmic homogeneity: ⟨∇F(p), p⟩ = -ν
    let g = cone.grad().to_vec();
    let gp = g.dot(&p);
    assert!(
        (gp + ν).abs() <= 1e-8 * (1.0 + ν),
        "{name}: ⟨∇F(p), p⟩ = {gp}, expected {}",
        -ν
    );

    // z = -∇F(p) is strictly dual feasible
    let z: Vec<f64> = g.iter().map(|x| -x).collect();
    cone.load_dual_point(&z);
    assert!(cone.is_dual_feas(), "{name}: -∇F(p) must be dual feasible");

    // second-order homogeneity: ∇²F(p)·p = -∇F(p)
    let mut hp = vec![0.0; dim];
    cone.hess_prod(&mut hp, &p);
    let scale = 1.0 + g.norm();
    assert!(
        hp.iter().zip(&g).all(|(h, g)| (h + g).abs() <= 2e-6 * scale),
        "{name}: ∇²F(p)·p must equal -∇F(p)"
    );

    // Hessian symmetry through the materialized matrix
    {
        let H = cone.hess();
        let mut worst = 0.0_f64;
        for j in 0..dim {
            for i in 0..j {
                worst = worst.max((H[(i, j)] - H[(j, i)]).abs() / (1.0 + H[(i, j)].abs()));
            }
        }
        assert!(worst <= 1e-7, "{name}: Hessian must be symmetric ({worst})");
    }

    // inverse Hessian round trip on a pseudo-random direction
    let v: Vec<f64> = (0..dim).map(|_| wiggle(seed)).collect();
    let mut hv = vec![0.0; dim];
    let mut vback = vec![0.0; dim];
    cone.hess_prod(&mut hv, &v);
    assert!(cone.inv_hess_prod(&mut vback, &hv), "{name}: inverse Hessian");
    let vscale = 1.0 + v.norm();
    assert!(
        vback.iter().zip(&v).all(|(a, b)| (a - b).abs() <= 5e-6 * vscale),
        "{name}: ∇²F⁻¹·∇²F·v must round-trip"
    );

    // the anchor pair is exactly central, so it lies in any neighborhood
    if perturb == 0.0 {
        assert!(
            cone.in_neighborhood(1.0, 0.1, false),
            "{name}: central pair must be in the neighborhood"
        );
        assert!(
            cone.in_neighborhood(1.0, 0.1, true),
            "{name}: central pair must be in the ∞-norm neighborhood"
        );
    }
}

#[test]
fn test_cone_contract_at_initial_points() {
    let mut seed = 17_u64;
    for (name, mut cone) in all_test_cones() {
        check_cone_contract(name, &mut cone, 0.0, &mut seed);
    }
}

#[test]
fn test_cone_contract_at_perturbed_points() {
    let mut seed = 23_u64;
    for (name, mut cone) in all_test_cones() {
        check_cone_contract(name, &mut cone, 0.01, &mut seed);
    }
}

#[test]
fn test_rescale_and_reset() {
    let mut cone: SupportedCone<f64> = EpiNormEuclCone::new(3).into();
    let mut p = vec![0.0; 3];
    cone.set_initial_point(&mut p);
    cone.load_point(&p);
    assert!(cone.is_feas());
    let g1 = cone.grad().to_vec();

    // gradient scales inversely with the point
    cone.rescale_point(2.0);
    assert!(cone.is_feas());
    let g2 = cone.grad().to_vec();
    for (a, b) in g1.iter().zip(&g2) {
        assert!((0.5 * a - b).abs() < 1e-14);
    }

    // infeasible point is rejected
    cone.load_point(&[1.0, 2.0, 0.0]);
    assert!(!cone.is_feas());
}

#[test]
fn test_dual_barrier_flag() {
    let cone: SupportedCone<f64> = EpiNormSpectralCone::new(2, 2).with_dual_barrier().into();
    assert!(cone.use_dual_barrier());
    assert_eq!(cone.dim(), 5);
}

#[test]
fn test_corrections_match_third_derivative() {
    // finite-difference check of ½D³F[Δ,Δ] against the Hessian for the
    // cones that supply corrections
    let cones: Vec<(&str, SupportedCone<f64>)> = vec![
        ("nonnegative", NonnegativeCone::new(3).into()),
        ("epinormeucl", EpiNormEuclCone::new(3).into()),
        ("epipersquare", EpiPerSquareCone::new(4).into()),
        ("possemideftri", PosSemidefTriCone::new(6).into()),
    ];

    let mut seed = 99_u64;
    for (name, mut cone) in cones {
        assert!(cone.use_correction());
        let dim = cone.dim();
        let mut p = vec![0.0; dim];
        cone.set_initial_point(&mut p);
        for x in p.iter_mut() {
            *x += 0.05 * wiggle(&mut seed);
        }

        let δ: Vec<f64> = (0..dim).map(|_| 0.1 * wiggle(&mut seed)).collect();

        cone.load_point(&p);
        assert!(cone.is_feas());
        let corr = cone.correction(&δ).to_vec();

        // D³F[δ,δ] ≈ (∇²F(p+hδ)·δ - ∇²F(p-hδ)·δ) / 2h
        let h = 1e-5_f64;
        let mut fwd = vec![0.0; dim];
        let mut bwd = vec![0.0; dim];
        let pf: Vec<f64> = p.iter().zip(&δ).map(|(a, b)| a + h * b).collect();
        cone.load_point(&pf);
        assert!(cone.is_feas());
        cone.hess_prod(&mut fwd, &δ);
        let pb: Vec<f64> = p.iter().zip(&δ).map(|(a, b)| a - h * b).collect();
        cone.load_point(&pb);
        assert!(cone.is_feas());
        cone.hess_prod(&mut bwd, &δ);

        for i in 0..dim {
            let d3 = (fwd[i] - bwd[i]) / (2.0 * h);
            assert!(
                (corr[i] - 0.5 * d3).abs() <= 1e-5 * (1.0 + d3.abs()),
                "{name}: correction mismatch at {i}: {} vs {}",
                corr[i],
                0.5 * d3
            );
        }
    }
}
