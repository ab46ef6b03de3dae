use super::BlasFloatT;
use num_traits::{Float, FloatConst, FromPrimitive, NumAssign};

/// Trait for floating point types used by the solver.
///
/// All floating point calculations are carried out on values implementing
/// `FloatT`, with implementations provided for the `f32` and `f64` native
/// types. The bound includes [`BlasFloatT`](crate::algebra::BlasFloatT)
/// since the cone library and the preprocessing QR lean on LAPACK
/// factorizations throughout.

pub trait FloatT:
    'static
    + Send
    + Float
    + FloatConst
    + NumAssign
    + Default
    + FromPrimitive
    + BlasFloatT
    + std::fmt::Display
    + std::fmt::LowerExp
    + std::fmt::Debug
{
}
cfg_if::cfg_if! {
    if #[cfg(not(feature = "r-blas"))] {
        // R blas/lapack only provides double precision routines
        impl FloatT for f32 {}
    }
}
impl FloatT for f64 {}

/// Trait for converting Rust primitives to [`FloatT`](crate::algebra::FloatT)
///
/// Required internally for converting constant primitives to
/// [`FloatT`](crate::algebra::FloatT), and by the user settings for
/// converting defaults of primitive type.

// NB: AsFloatT is a convenience trait for f32/64 and u32/64
// so that we can do things like (2.0).as_T() everywhere on
// constants, rather than the awful T::from_f32(2.0).unwrap()

#[allow(non_snake_case)]
pub trait AsFloatT<T>: 'static {
    fn as_T(&self) -> T;
}

macro_rules! impl_as_T {
    ($ty:ty, $ident:ident) => {
        impl<T> AsFloatT<T> for $ty
        where
            T: std::ops::Mul<T, Output = T> + FromPrimitive + 'static,
        {
            #[inline]
            fn as_T(&self) -> T {
                T::$ident(*self).unwrap()
            }
        }
    };
}
impl_as_T!(u32, from_u32);
impl_as_T!(u64, from_u64);
impl_as_T!(usize, from_usize);
impl_as_T!(f32, from_f32);
impl_as_T!(f64, from_f64);
