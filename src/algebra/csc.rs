#![allow(non_snake_case)]

use super::*;

/// Sparse matrix in standard Compressed Sparse Column (CSC) format
///
/// __Example usage__ : To construct the 3 x 3 matrix
/// ```text
/// A = [1.  3.  5.]
///     [2.  0.  6.]
///     [0.  4.  7.]
/// ```
///
/// ```no_run
/// use nappe::algebra::CscMatrix;
///
/// let A : CscMatrix<f64> = CscMatrix::new(
///    3,                                // m
///    3,                                // n
///    vec![0, 2, 4, 7],                 //colptr
///    vec![0, 1, 0, 2, 0, 1, 2],        //rowval
///    vec![1., 2., 3., 4., 5., 6., 7.], //nzval
///  );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CscMatrix<T = f64> {
    /// number of rows
    pub m: usize,
    /// number of columns
    pub n: usize,
    /// CSC format column pointer, length n+1
    pub colptr: Vec<usize>,
    /// vector of row indices
    pub rowval: Vec<usize>,
    /// vector of non-zero matrix elements
    pub nzval: Vec<T>,
}

impl<T> CscMatrix<T>
where
    T: FloatT,
{
    pub fn new(m: usize, n: usize, colptr: Vec<usize>, rowval: Vec<usize>, nzval: Vec<T>) -> Self {
        assert_eq!(rowval.len(), nzval.len());
        assert_eq!(colptr.len(), n + 1);
        assert_eq!(colptr[n], rowval.len());
        CscMatrix {
            m,
            n,
            colptr,
            rowval,
            nzval,
        }
    }

    pub fn zeros(size: (usize, usize)) -> Self {
        let (m, n) = size;
        CscMatrix::new(m, n, vec![0; n + 1], Vec::new(), Vec::new())
    }

    pub fn identity(n: usize) -> Self {
        let colptr = (0usize..=n).collect();
        let rowval = (0usize..n).collect();
        let nzval = vec![T::one(); n];
        CscMatrix::new(n, n, colptr, rowval, nzval)
    }

    /// number of nonzeros
    pub fn nnz(&self) -> usize {
        self.colptr[self.n]
    }

    pub fn from_dense(A: &Matrix<T>) -> Self {
        let (m, n) = (A.nrows(), A.ncols());
        let mut out = CscMatrix::zeros((m, n));
        for j in 0..n {
            for i in 0..m {
                if A[(i, j)] != T::zero() {
                    out.rowval.push(i);
                    out.nzval.push(A[(i, j)]);
                }
            }
            out.colptr[j + 1] = out.rowval.len();
        }
        out
    }

    pub fn to_dense(&self) -> Matrix<T> {
        let mut A = Matrix::zeros((self.m, self.n));
        for j in 0..self.n {
            for p in self.colptr[j]..self.colptr[j + 1] {
                A[(self.rowval[p], j)] = self.nzval[p];
            }
        }
        A
    }

    /// y = α op(self) x + β y
    pub fn gemv(&self, shape: MatrixShape, y: &mut [T], x: &[T], α: T, β: T) {
        match shape {
            MatrixShape::N => {
                assert!(x.len() == self.n && y.len() == self.m);
                y.scale(β);
                for (j, &xj) in x.iter().enumerate() {
                    if xj == T::zero() {
                        continue;
                    }
                    for p in self.colptr[j]..self.colptr[j + 1] {
                        y[self.rowval[p]] += α * self.nzval[p] * xj;
                    }
                }
            }
            MatrixShape::T => {
                assert!(x.len() == self.m && y.len() == self.n);
                for (j, yj) in y.iter_mut().enumerate() {
                    let mut v = T::zero();
                    for p in self.colptr[j]..self.colptr[j + 1] {
                        v += self.nzval[p] * x[self.rowval[p]];
                    }
                    *yj = α * v + β * (*yj);
                }
            }
        }
    }

    /// Keep only the listed columns, in the given order.
    pub fn select_columns(&self, keep: &[usize]) -> Self {
        let mut out = CscMatrix::zeros((self.m, keep.len()));
        for (jnew, &j) in keep.iter().enumerate() {
            for p in self.colptr[j]..self.colptr[j + 1] {
                out.rowval.push(self.rowval[p]);
                out.nzval.push(self.nzval[p]);
            }
            out.colptr[jnew + 1] = out.rowval.len();
        }
        out
    }

    /// Keep only the listed rows, in the given order.
    pub fn select_rows(&self, keep: &[usize]) -> Self {
        let mut rowmap = vec![usize::MAX; self.m];
        for (inew, &i) in keep.iter().enumerate() {
            rowmap[i] = inew;
        }
        let mut out = CscMatrix::zeros((keep.len(), self.n));
        // two passes: count, then fill in sorted-row order per column
        for j in 0..self.n {
            let mut col: Vec<(usize, T)> = Vec::new();
            for p in self.colptr[j]..self.colptr[j + 1] {
                let inew = rowmap[self.rowval[p]];
                if inew != usize::MAX {
                    col.push((inew, self.nzval[p]));
                }
            }
            col.sort_by_key(|&(i, _)| i);
            for (i, v) in col {
                out.rowval.push(i);
                out.nzval.push(v);
            }
            out.colptr[j + 1] = out.rowval.len();
        }
        out
    }

    /// Materialized transpose.
    pub fn transpose(&self) -> Self {
        let mut out = CscMatrix::zeros((self.n, self.m));
        out.rowval = vec![0; self.nnz()];
        out.nzval = vec![T::zero(); self.nnz()];

        let mut counts = vec![0usize; self.m];
        for &r in &self.rowval {
            counts[r] += 1;
        }
        for i in 0..self.m {
            out.colptr[i + 1] = out.colptr[i] + counts[i];
        }
        let mut next = out.colptr[0..self.m].to_vec();
        for (r, c, v) in self.triplets() {
            let slot = next[r];
            next[r] += 1;
            out.rowval[slot] = c;
            out.nzval[slot] = v;
        }
        out
    }

    /// Iterate nonzero triplets (row, col, value).
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.n).flat_map(move |j| {
            (self.colptr[j]..self.colptr[j + 1]).map(move |p| (self.rowval[p], j, self.nzval[p]))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_matrix() -> CscMatrix<f64> {
        // [1.  3.  5.]
        // [2.  0.  6.]
        // [0.  4.  7.]
        CscMatrix::new(
            3,
            3,
            vec![0, 2, 4, 7],
            vec![0, 1, 0, 2, 0, 1, 2],
            vec![1., 2., 3., 4., 5., 6., 7.],
        )
    }

    #[test]
    fn test_gemv() {
        let A = test_matrix();
        let x = [1.0, 2.0, 3.0];
        let mut y = [0.0; 3];
        A.gemv(MatrixShape::N, &mut y, &x, 1.0, 0.0);
        assert_eq!(y, [22.0, 20.0, 29.0]);

        let mut yt = [0.0; 3];
        A.gemv(MatrixShape::T, &mut yt, &x, 1.0, 0.0);
        assert_eq!(yt, [5.0, 15.0, 38.0]);
    }

    #[test]
    fn test_dense_roundtrip() {
        let A = test_matrix();
        let D = A.to_dense();
        let B = CscMatrix::from_dense(&D);
        assert_eq!(A, B);
    }

    #[test]
    fn test_select() {
        let A = test_matrix();
        let C = A.select_columns(&[0, 2]);
        assert_eq!(C.to_dense(), Matrix::from(&[[1.0, 5.0], [2.0, 6.0], [0.0, 7.0]]));

        let R = A.select_rows(&[1, 2]);
        assert_eq!(R.to_dense(), Matrix::from(&[[2.0, 0.0, 6.0], [0.0, 4.0, 7.0]]));
    }
}
