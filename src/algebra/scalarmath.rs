use super::FloatT;

/// Scalar operations on [`FloatT`](crate::algebra::FloatT)
pub trait ScalarMath {
    /// Restricts the value to be at least `min_thresh` and at most `max_thresh`.
    fn clip(&self, min_thresh: Self, max_thresh: Self) -> Self;

    /// Safe calculation for log barriers.
    ///
    /// Returns log(s) if s > 0, -Infinity otherwise.
    fn logsafe(&self) -> Self;
}

impl<T: FloatT> ScalarMath for T {
    fn clip(&self, min_thresh: T, max_thresh: T) -> T {
        T::min(T::max(*self, min_thresh), max_thresh)
    }

    fn logsafe(&self) -> T {
        if *self <= T::zero() {
            -T::infinity()
        } else {
            self.ln()
        }
    }
}

/// Number of elements in the lower triangle of an n x n matrix
#[inline]
pub fn triangular_number(n: usize) -> usize {
    (n * (n + 1)) >> 1
}

/// Linear index of the (k,k) diagonal entry within a packed triangle
#[inline]
pub fn triangular_index(k: usize) -> usize {
    // 0-based index into a packed triangle
    triangular_number(k + 1) - 1
}

/// Side dimension of the symmetric matrix packed into a triangle of
/// length `d`, i.e. the n with n(n+1)/2 == d.
///
/// # Panics
/// Panics if `d` is not a triangular number.
pub fn triangular_side(d: usize) -> usize {
    let n = ((((8 * d + 1) as f64).sqrt() as usize) - 1) >> 1;
    debug_assert!(triangular_number(n) == d);
    n
}
