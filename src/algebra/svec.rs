#![allow(non_snake_case)]

//! Scaled vectorization of symmetric matrices.
//!
//! A symmetric d×d matrix is stored column-by-column of its lower
//! triangle, with every off-diagonal entry multiplied by √2.  The scaling
//! makes the vectorization an isometry: ⟨svec(A), svec(B)⟩ = trace(AB).
//! This module is the single home of that convention; nothing else in the
//! crate rescales svec data on its own.

use super::*;

/// Iterate the (row, col) pairs of the lower triangle in svec order.
#[inline]
pub fn svec_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |j| (j..n).map(move |i| (i, j)))
}

/// Position of the (j,j) diagonal entry within an svec of side n.
#[inline]
pub fn svec_diag_index(n: usize, j: usize) -> usize {
    svec_index(n, j, j)
}

/// Position of the (i,j), i ≥ j entry within an svec of side n.
#[inline]
pub fn svec_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i >= j && i < n);
    j * n - ((j * (j - 1)) >> 1) + (i - j)
}

/// Unpack an svec into a full (both triangles) symmetric matrix.
pub fn svec_to_mat<T: FloatT>(X: &mut Matrix<T>, x: &[T]) {
    let n = X.nrows();
    debug_assert!(x.len() == triangular_number(n));
    let isqrt2 = T::FRAC_1_SQRT_2();

    let mut k = 0;
    for j in 0..n {
        X[(j, j)] = x[k];
        k += 1;
        for i in (j + 1)..n {
            let v = x[k] * isqrt2;
            X[(i, j)] = v;
            X[(j, i)] = v;
            k += 1;
        }
    }
}

/// Pack a symmetric matrix (full storage) into an svec.
pub fn mat_to_svec<T: FloatT>(x: &mut [T], X: &Matrix<T>) {
    let n = X.nrows();
    debug_assert!(x.len() == triangular_number(n));
    let sqrt2 = T::SQRT_2();

    let mut k = 0;
    for j in 0..n {
        x[k] = X[(j, j)];
        k += 1;
        for i in (j + 1)..n {
            x[k] = X[(i, j)] * sqrt2;
            k += 1;
        }
    }
}

/// Multiply every off-diagonal entry of an svec by √2 in place.
///
/// Together with [`svec_unscale`] this converts between plain
/// lower-triangle packing and the scaled svec convention.
pub fn svec_scale<T: FloatT>(x: &mut [T]) {
    let n = triangular_side(x.len());
    let sqrt2 = T::SQRT_2();
    for (k, (i, j)) in svec_pairs(n).enumerate() {
        if i != j {
            x[k] *= sqrt2;
        }
    }
}

/// Divide every off-diagonal entry of an svec by √2 in place.
pub fn svec_unscale<T: FloatT>(x: &mut [T]) {
    let n = triangular_side(x.len());
    let isqrt2 = T::FRAC_1_SQRT_2();
    for (k, (i, j)) in svec_pairs(n).enumerate() {
        if i != j {
            x[k] *= isqrt2;
        }
    }
}

/// Symmetric Kronecker product:  out · svec(X) = svec(A X Aᵀ) for any
/// symmetric X.  `A` must be symmetric (full storage); the result is
/// symmetric and carries the √2 svec scaling.
pub fn symm_kron<T: FloatT>(out: &mut Matrix<T>, A: &Matrix<T>) {
    let n = A.nrows();
    debug_assert!(out.nrows() == triangular_number(n));
    let sqrt2 = T::SQRT_2();

    let mut col = 0;
    for (k, l) in svec_pairs(n) {
        let mut row = 0;
        for (i, j) in svec_pairs(n) {
            if row > col {
                break;
            }
            out[(row, col)] = match (i == j, k == l) {
                (true, true) => A[(i, k)] * A[(i, k)],
                (true, false) => sqrt2 * A[(i, k)] * A[(i, l)],
                (false, true) => sqrt2 * A[(i, k)] * A[(j, k)],
                (false, false) => A[(i, k)] * A[(j, l)] + A[(i, l)] * A[(j, k)],
            };
            row += 1;
        }
        col += 1;
    }
    out.symmetrize_from_triu();
}

/// Build the svec operator for  svec(X) ↦ svec(V (Θ ∘ (Vᵀ X V)) Vᵀ),
/// where V is orthogonal and Θ is symmetric.  Used by separable-spectral
/// cones, where Θ holds divided-difference kernels at the eigenvalues.
pub fn eig_dot_kron<T: FloatT>(
    out: &mut Matrix<T>,
    Θ: &Matrix<T>,
    V: &Matrix<T>,
    work1: &mut Matrix<T>,
    work2: &mut Matrix<T>,
) {
    let n = V.nrows();
    let sd = triangular_number(n);
    debug_assert!(out.nrows() == sd && out.ncols() == sd);
    let isqrt2 = T::FRAC_1_SQRT_2();

    // column by column: out[:, c] = svec(V (Θ ∘ (Vᵀ E_c V)) Vᵀ) where E_c
    // is the c-th svec basis matrix.  Vᵀ E_c V is a symmetrized outer
    // product of two rows of V.
    for (c, (k, l)) in svec_pairs(n).enumerate() {
        let M = &mut *work1;
        // M = Vᵀ E_kl V, with E_kl the unit svec basis element
        let scale = if k == l { T::one() } else { isqrt2 };
        for b in 0..n {
            for a in 0..n {
                let v = V[(k, a)] * V[(l, b)] + V[(l, a)] * V[(k, b)];
                M[(a, b)] = scale * v * if k == l { (0.5).as_T() } else { T::one() };
            }
        }
        // M := Θ ∘ M
        for b in 0..n {
            for a in 0..n {
                M[(a, b)] *= Θ[(a, b)];
            }
        }
        // work2 = V M Vᵀ
        let tmp = &mut *work2;
        tmp.gemm(MatrixShape::N, MatrixShape::N, V, M, T::one(), T::zero());
        M.gemm(MatrixShape::N, MatrixShape::T, tmp, V, T::one(), T::zero());
        mat_to_svec(out.col_slice_mut(c), M);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn symmat3() -> Matrix<f64> {
        let mut X = Matrix::from(&[[2.0, 0.5, -1.0], [0.0, 3.0, 0.25], [0.0, 0.0, 1.5]]);
        X.symmetrize_from_triu();
        X
    }

    #[test]
    fn test_svec_roundtrip() {
        let X = symmat3();
        let mut x = vec![0.0; 6];
        mat_to_svec(&mut x, &X);

        let mut Y = Matrix::<f64>::zeros((3, 3));
        svec_to_mat(&mut Y, &x);
        assert!(X.data().norm_inf_diff(Y.data()) < 1e-15);
    }

    #[test]
    fn test_svec_inner_product_is_trace() {
        let X = symmat3();
        let mut Y = Matrix::from(&[[1.0, -0.5, 0.0], [0.0, 2.0, 1.0], [0.0, 0.0, 4.0]]);
        Y.symmetrize_from_triu();

        let (mut x, mut y) = (vec![0.0; 6], vec![0.0; 6]);
        mat_to_svec(&mut x, &X);
        mat_to_svec(&mut y, &Y);

        let mut XY = Matrix::<f64>::zeros((3, 3));
        XY.gemm(MatrixShape::N, MatrixShape::N, &X, &Y, 1.0, 0.0);
        let trace = XY[(0, 0)] + XY[(1, 1)] + XY[(2, 2)];

        assert!((x.dot(&y) - trace).abs() < 1e-14);
    }

    #[test]
    fn test_svec_scale_roundtrip() {
        // packed lower triangle of a 3x3 matrix, then the √2 scaling
        let mut x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let orig = x.clone();
        svec_scale(&mut x);
        for (k, (i, j)) in svec_pairs(3).enumerate() {
            if i == j {
                assert_eq!(x[k], orig[k]);
            } else {
                assert_eq!(x[k], orig[k] * std::f64::consts::SQRT_2);
            }
        }
        svec_unscale(&mut x);
        assert!(x.norm_inf_diff(&orig) < 1e-15);
    }

    #[test]
    fn test_symm_kron() {
        let A = symmat3();
        let X = {
            let mut X = Matrix::from(&[[1.0, 0.2, 0.0], [0.0, -1.0, 0.7], [0.0, 0.0, 2.0]]);
            X.symmetrize_from_triu();
            X
        };

        let mut K = Matrix::<f64>::zeros((6, 6));
        symm_kron(&mut K, &A);

        let mut x = vec![0.0; 6];
        mat_to_svec(&mut x, &X);
        let mut kx = vec![0.0; 6];
        K.gemv(MatrixShape::N, &mut kx, &x, 1.0, 0.0);

        // direct computation of svec(A X Aᵀ)
        let mut tmp = Matrix::<f64>::zeros((3, 3));
        tmp.gemm(MatrixShape::N, MatrixShape::N, &A, &X, 1.0, 0.0);
        let mut AXA = Matrix::<f64>::zeros((3, 3));
        AXA.gemm(MatrixShape::N, MatrixShape::T, &tmp, &A, 1.0, 0.0);
        let mut axa = vec![0.0; 6];
        mat_to_svec(&mut axa, &AXA);

        assert!(kx.norm_inf_diff(&axa) < 1e-13);
    }

    #[test]
    fn test_eig_dot_kron_identity_theta() {
        // with Θ all ones and V orthogonal, the operator is svec(X) ↦ svec(V Vᵀ X V Vᵀ) = svec(X)
        let r = std::f64::consts::FRAC_1_SQRT_2;
        let V = Matrix::from(&[[r, -r, 0.0], [r, r, 0.0], [0.0, 0.0, 1.0]]);
        let mut Θ = Matrix::<f64>::zeros((3, 3));
        Θ.data_mut().set(1.0);

        let mut out = Matrix::<f64>::zeros((6, 6));
        let mut w1 = Matrix::<f64>::zeros((3, 3));
        let mut w2 = Matrix::<f64>::zeros((3, 3));
        eig_dot_kron(&mut out, &Θ, &V, &mut w1, &mut w2);

        let I = Matrix::<f64>::identity(6);
        assert!(out.data().norm_inf_diff(I.data()) < 1e-13);
    }
}
