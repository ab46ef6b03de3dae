#![allow(non_snake_case)]

use super::*;
use std::iter::zip;
use thiserror::Error;

/// Errors from the sparse LDLᵀ factorization.
#[derive(Error, Debug)]
pub enum LdlError {
    #[error("Matrix dimension fields are incompatible")]
    IncompatibleDimension,
    #[error("Matrix is missing an explicit diagonal entry")]
    MissingDiagonal,
    #[error("Matrix is not upper triangular")]
    NotUpperTriangular,
    #[error("Matrix factorization produced a zero pivot")]
    ZeroPivot,
    #[error("Sparsity pattern changed between refactorizations")]
    PatternChanged,
}

const UNKNOWN: usize = usize::MAX;

/// Sparse LDLᵀ factorization of a symmetric quasidefinite matrix given by
/// its upper triangle in CSC form, with AMD fill-reducing ordering.
///
/// The symbolic analysis (ordering, elimination tree, column counts) is
/// performed once at construction and cached; later calls to
/// [`LdlFactorization::factor`] with an identically structured matrix
/// reuse it.  Pivots are sign-regularized against the expected inertia of
/// the KKT system.
pub struct LdlFactorization<T> {
    n: usize,

    // fill-reducing ordering and its inverse
    perm: Vec<usize>,
    iperm: Vec<usize>,

    // permuted upper triangle and the map from input nz positions into it
    Aperm: CscMatrix<T>,
    nzmap: Vec<usize>,

    // factor data
    L: CscMatrix<T>,
    D: Vec<T>,
    Dinv: Vec<T>,

    // symbolic data
    etree: Vec<usize>,
    Lnz: Vec<usize>,

    // expected pivot signs (permuted order) and regularization
    Dsigns: Vec<i8>,
    regularize_eps: T,
    regularize_delta: T,

    // workspace
    bwork: Vec<bool>,
    iwork: Vec<usize>,
    fwork: Vec<T>,
    xwork: Vec<T>,
}

impl<T> LdlFactorization<T>
where
    T: FloatT,
{
    /// Symbolic setup for the triu matrix `A`.  `dsigns` gives the
    /// expected sign of each diagonal pivot in the original ordering.
    pub fn new(A: &CscMatrix<T>, dsigns: &[i8]) -> Result<Self, LdlError> {
        let n = A.n;
        if A.m != n || dsigns.len() != n {
            return Err(LdlError::IncompatibleDimension);
        }
        check_structure(A)?;

        // AMD ordering with default parameters
        let (perm, iperm) = {
            let control = amd::Control::default();
            let (perm, iperm, _info) = amd::order(n, &A.colptr, &A.rowval, &control).unwrap();
            (perm, iperm)
        };

        let (Aperm, nzmap) = permute_symmetric(A, &iperm);

        // elimination tree and column counts on the permuted pattern
        let mut etree = vec![UNKNOWN; n];
        let mut Lnz = vec![0; n];
        let mut iwork = vec![0; 3 * n];
        etree_and_counts(n, &Aperm.colptr, &Aperm.rowval, &mut iwork, &mut Lnz, &mut etree)?;

        let lnz_total: usize = Lnz.iter().sum();
        let mut l_colptr = vec![0; n + 1];
        l_colptr[n] = lnz_total; // real column pointers are set at factor time
        let L = CscMatrix::new(n, n, l_colptr, vec![0; lnz_total], vec![T::zero(); lnz_total]);

        let mut Dsigns = vec![0_i8; n];
        for k in 0..n {
            Dsigns[k] = dsigns[perm[k]];
        }

        Ok(Self {
            n,
            perm,
            iperm,
            Aperm,
            nzmap,
            L,
            D: vec![T::zero(); n],
            Dinv: vec![T::zero(); n],
            etree,
            Lnz,
            Dsigns,
            regularize_eps: (1e-12).as_T(),
            regularize_delta: (1e-7).as_T(),
            bwork: vec![false; n],
            iwork,
            fwork: vec![T::zero(); n],
            xwork: vec![T::zero(); n],
        })
    }

    /// Numeric factorization of a matrix with the same pattern as the one
    /// given at construction.
    pub fn factor(&mut self, A: &CscMatrix<T>) -> Result<(), LdlError> {
        if A.nnz() != self.nzmap.len() {
            return Err(LdlError::PatternChanged);
        }
        for (i, &v) in A.nzval.iter().enumerate() {
            self.Aperm.nzval[self.nzmap[i]] = v;
        }
        self.factor_inner()
    }

    /// Solves A x = b using the factors, in place.
    pub fn solve(&mut self, b: &mut [T]) {
        assert_eq!(b.len(), self.n);
        let x = &mut self.xwork;
        for k in 0..self.n {
            x[k] = b[self.perm[k]];
        }
        lsolve(&self.L.colptr, &self.L.rowval, &self.L.nzval, x);
        zip(x.iter_mut(), &self.Dinv).for_each(|(x, d)| *x *= *d);
        ltsolve(&self.L.colptr, &self.L.rowval, &self.L.nzval, x);
        for k in 0..self.n {
            b[self.perm[k]] = x[k];
        }
    }

    fn factor_inner(&mut self) -> Result<(), LdlError> {
        let n = self.n;
        if n == 0 {
            return Ok(());
        }
        let A = &self.Aperm;
        let (Lp, Li, Lx) = (&mut self.L.colptr, &mut self.L.rowval, &mut self.L.nzval);
        let (D, Dinv) = (&mut self.D, &mut self.Dinv);

        let y_markers = &mut self.bwork;
        let (y_idx, rest) = self.iwork.split_at_mut(n);
        let (elim_buffer, next_colspace) = rest.split_at_mut(n);
        let y_vals = &mut self.fwork;

        // set Lp to cumsum(Lnz), starting from zero
        Lp[0] = 0;
        let mut acc = 0;
        for (Lp, Lnz) in zip(&mut Lp[1..], &self.Lnz) {
            *Lp = acc + Lnz;
            acc = *Lp;
        }

        y_markers.fill(false);
        y_vals.fill(T::zero());
        D.fill(T::zero());
        next_colspace.copy_from_slice(&Lp[0..n]);

        let mut regularize = |d: &mut T, k: usize| -> Result<(), LdlError> {
            let sign = T::from_i8(self.Dsigns[k]).unwrap();
            if *d * sign < self.regularize_eps {
                *d = self.regularize_delta * sign;
            }
            if *d == T::zero() {
                return Err(LdlError::ZeroPivot);
            }
            Ok(())
        };

        // first pivot
        D[0] = A.nzval[0];
        regularize(&mut D[0], 0)?;
        Dinv[0] = T::recip(D[0]);

        // up-looking factorization: for each k, solve
        // y = L(0:k-1, 0:k-1) \ b with b the strict upper part of column
        // k of A; y becomes row k of L.
        for k in 1..n {
            let mut nnz_y = 0;

            // locate the nonzero pattern of row k via the elimination tree
            for i in A.colptr[k]..A.colptr[k + 1] {
                let bidx = A.rowval[i];
                if bidx == k {
                    D[k] = A.nzval[i];
                    continue;
                }
                y_vals[bidx] = A.nzval[i];

                if !y_markers[bidx] {
                    y_markers[bidx] = true;
                    elim_buffer[0] = bidx;
                    let mut nnz_e = 1;
                    let mut next_idx = self.etree[bidx];
                    while next_idx != UNKNOWN && next_idx < k {
                        if y_markers[next_idx] {
                            break;
                        }
                        y_markers[next_idx] = true;
                        elim_buffer[nnz_e] = next_idx;
                        next_idx = self.etree[next_idx];
                        nnz_e += 1;
                    }
                    // stash the elimination path in reverse order
                    while nnz_e != 0 {
                        nnz_e -= 1;
                        y_idx[nnz_y] = elim_buffer[nnz_e];
                        nnz_y += 1;
                    }
                }
            }

            // numeric elimination along the recorded pattern
            for i in (0..nnz_y).rev() {
                let cidx = y_idx[i];
                let tmp_idx = next_colspace[cidx];
                let y_vals_cidx = y_vals[cidx];

                for j in Lp[cidx]..tmp_idx {
                    y_vals[Li[j]] -= Lx[j] * y_vals_cidx;
                }

                Lx[tmp_idx] = y_vals_cidx * Dinv[cidx];
                D[k] -= y_vals_cidx * Lx[tmp_idx];

                Li[tmp_idx] = k;
                next_colspace[cidx] += 1;

                y_vals[cidx] = T::zero();
                y_markers[cidx] = false;
            }

            regularize(&mut D[k], k)?;
            Dinv[k] = T::recip(D[k]);
        }

        Ok(())
    }
}

fn check_structure<T: FloatT>(A: &CscMatrix<T>) -> Result<(), LdlError> {
    for (i, j, _v) in A.triplets() {
        if i > j {
            return Err(LdlError::NotUpperTriangular);
        }
    }
    // every column must carry an explicit diagonal entry (possibly zero)
    for j in 0..A.n {
        let has_diag = (A.colptr[j]..A.colptr[j + 1]).any(|p| A.rowval[p] == j);
        if !has_diag {
            return Err(LdlError::MissingDiagonal);
        }
    }
    Ok(())
}

// Symmetric permutation of a triu matrix: out[(i,j)] = A[(perm... )] with
// iperm mapping old indices to new.  Also returns the map from input nz
// positions to output nz positions so values can be refreshed in place.
fn permute_symmetric<T: FloatT>(
    A: &CscMatrix<T>,
    iperm: &[usize],
) -> (CscMatrix<T>, Vec<usize>) {
    let n = A.n;
    let nnz = A.nnz();
    let mut counts = vec![0usize; n];
    let mut dest_rc = vec![(0usize, 0usize); nnz];

    for (p, (i, j, _)) in A.triplets().enumerate() {
        let (mut r, mut c) = (iperm[i], iperm[j]);
        if r > c {
            std::mem::swap(&mut r, &mut c);
        }
        dest_rc[p] = (r, c);
        counts[c] += 1;
    }

    let mut colptr = vec![0usize; n + 1];
    for j in 0..n {
        colptr[j + 1] = colptr[j] + counts[j];
    }

    // place entries, sorting each column by row index afterwards
    let mut next = colptr[0..n].to_vec();
    let mut rowval = vec![0usize; nnz];
    let mut nzval = vec![T::zero(); nnz];
    let mut slot_of_input = vec![0usize; nnz];
    for (p, &(r, c)) in dest_rc.iter().enumerate() {
        let slot = next[c];
        next[c] += 1;
        rowval[slot] = r;
        nzval[slot] = A.nzval[p];
        slot_of_input[p] = slot;
    }

    // in-column insertion sort keeping the nz map in sync
    let mut slot_perm: Vec<usize> = (0..nnz).collect();
    for j in 0..n {
        let lo = colptr[j];
        let hi = colptr[j + 1];
        for a in (lo + 1)..hi {
            let mut b = a;
            while b > lo && rowval[b - 1] > rowval[b] {
                rowval.swap(b - 1, b);
                nzval.swap(b - 1, b);
                slot_perm.swap(b - 1, b);
                b -= 1;
            }
        }
    }
    // slot_perm[q] is the input slot now stored at position q; invert the
    // composition to map input nz positions to final positions
    let mut final_of_slot = vec![0usize; nnz];
    for (q, &s) in slot_perm.iter().enumerate() {
        final_of_slot[s] = q;
    }
    let nzmap: Vec<usize> = slot_of_input.iter().map(|&s| final_of_slot[s]).collect();

    (CscMatrix::new(n, n, colptr, rowval, nzval), nzmap)
}

// Compute the elimination tree and column counts for a quasidefinite
// matrix in triu CSC form.
fn etree_and_counts(
    n: usize,
    Ap: &[usize],
    Ai: &[usize],
    iwork: &mut [usize],
    Lnz: &mut [usize],
    etree: &mut [usize],
) -> Result<(), LdlError> {
    let work = &mut iwork[0..n];
    work.fill(0);
    Lnz.fill(0);
    etree.fill(UNKNOWN);

    for j in 0..n {
        work[j] = j;
        for istart in Ai.iter().take(Ap[j + 1]).skip(Ap[j]) {
            let mut i = *istart;
            while work[i] != j {
                if etree[i] == UNKNOWN {
                    etree[i] = j;
                }
                Lnz[i] += 1;
                work[i] = j;
                i = etree[i];
            }
        }
    }
    Ok(())
}

// Solves (L+I)x = b, with x replacing b
fn lsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in 0..x.len() {
        let xi = x[i];
        for j in Lp[i]..Lp[i + 1] {
            x[Li[j]] -= Lx[j] * xi;
        }
    }
}

// Solves (L+I)ᵀx = b, with x replacing b
fn ltsolve<T: FloatT>(Lp: &[usize], Li: &[usize], Lx: &[T], x: &mut [T]) {
    for i in (0..x.len()).rev() {
        let mut s = T::zero();
        for j in Lp[i]..Lp[i + 1] {
            s += Lx[j] * x[Li[j]];
        }
        x[i] -= s;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kkt_example() -> (CscMatrix<f64>, Vec<i8>) {
        // [ 1  0  1 ]
        // [ 0  2  1 ]
        // [ 1  1 -1 ]   quasidefinite with signs (+, +, -)
        let A = CscMatrix::new(
            3,
            3,
            vec![0, 1, 2, 5],
            vec![0, 1, 0, 1, 2],
            vec![1.0, 2.0, 1.0, 1.0, -1.0],
        );
        (A, vec![1, 1, -1])
    }

    #[test]
    fn test_ldl_solve() {
        let (A, signs) = kkt_example();
        let mut ldl = LdlFactorization::new(&A, &signs).unwrap();
        ldl.factor(&A).unwrap();

        let xtrue = [1.0, -1.0, 2.0];
        // b = A x, A symmetric from triu data
        let mut b = [3.0, 0.0, -2.0];
        ldl.solve(&mut b);
        assert!(b.norm_inf_diff(&xtrue) < 1e-10);
    }

    #[test]
    fn test_ldl_refactor_with_new_values() {
        let (A, signs) = kkt_example();
        let mut ldl = LdlFactorization::new(&A, &signs).unwrap();
        ldl.factor(&A).unwrap();

        // same pattern, different values
        let mut A2 = A.clone();
        A2.nzval = vec![4.0, 3.0, 1.0, 1.0, -2.0];
        ldl.factor(&A2).unwrap();

        let xtrue = [1.0, 1.0, 1.0];
        let mut b = [5.0, 4.0, 0.0];
        ldl.solve(&mut b);
        assert!(b.norm_inf_diff(&xtrue) < 1e-10);
    }

    #[test]
    fn test_ldl_rejects_lower_triangle() {
        let A = CscMatrix::new(2, 2, vec![0, 2, 3], vec![0, 1, 1], vec![1.0, 0.5, 1.0]);
        assert!(matches!(
            LdlFactorization::new(&A, &[1, 1]),
            Err(LdlError::NotUpperTriangular)
        ));
    }
}
