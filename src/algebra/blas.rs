#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(clippy::too_many_arguments)]

// standard imports via blas-lapack-rs crates
extern crate blas_src;
extern crate lapack_src;
use blas::*;
use lapack::*;

/// Scalar types with the BLAS/LAPACK routines required by the solver.
///
/// Every routine is exposed through its own single-method trait so that
/// generic code can call e.g. `T::xpotrf(...)` with the f32/f64 variant
/// selected at compile time.

// NB: the "r-blas" source only provides double precision routines, so
// single precision support is compiled out when it is selected.

pub trait BlasFloatT:
    private::BlasFloatSealed
    + XgemmScalar
    + XgemvScalar
    + XsymvScalar
    + XsyrkScalar
    + XpotrfScalar
    + XpotrsScalar
    + XsyevrScalar
    + XgesddScalar
    + XgetrfScalar
    + XgetrsScalar
    + Xgeqp3Scalar
    + XorgqrScalar
    + XormqrScalar
    + XtrtrsScalar
{}

cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
    impl BlasFloatT for f32 {}
  }
}
impl BlasFloatT for f64 {}

mod private {
    pub trait BlasFloatSealed {}
    cfg_if::cfg_if! {
      if #[cfg(not(feature = "r-blas"))] {
        impl BlasFloatSealed for f32 {}
      }
    }
    impl BlasFloatSealed for f64 {}
}

// --------------------------------------
// ?gemm : general matrix-matrix multiply
// --------------------------------------

pub trait XgemmScalar: Sized {
    fn xgemm(
        transa: u8, transb: u8, m: i32, n: i32, k: i32, alpha: Self, a: &[Self], lda: i32,
        b: &[Self], ldb: i32, beta: Self, c: &mut [Self], ldc: i32,
    );
}

macro_rules! impl_blas_xgemm {
    ($T:ty, $XGEMM:path) => {
        impl XgemmScalar for $T {
            fn xgemm(
                transa: u8, transb: u8, m: i32, n: i32, k: i32, alpha: Self, a: &[Self], lda: i32,
                b: &[Self], ldb: i32, beta: Self, c: &mut [Self], ldc: i32,
            ) {
                unsafe { $XGEMM(transa, transb, m, n, k, alpha, a, lda, b, ldb, beta, c, ldc); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xgemm!(f32, sgemm);
  }
}
impl_blas_xgemm!(f64, dgemm);

// --------------------------------------
// ?gemv : general matrix-vector multiply
// --------------------------------------

pub trait XgemvScalar: Sized {
    fn xgemv(
        trans: u8, m: i32, n: i32, alpha: Self, a: &[Self], lda: i32, x: &[Self], incx: i32,
        beta: Self, y: &mut [Self], incy: i32,
    );
}

macro_rules! impl_blas_xgemv {
    ($T:ty, $XGEMV:path) => {
        impl XgemvScalar for $T {
            fn xgemv(
                trans: u8, m: i32, n: i32, alpha: Self, a: &[Self], lda: i32, x: &[Self], incx: i32,
                beta: Self, y: &mut [Self], incy: i32,
            ) {
                unsafe { $XGEMV(trans, m, n, alpha, a, lda, x, incx, beta, y, incy); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xgemv!(f32, sgemv);
  }
}
impl_blas_xgemv!(f64, dgemv);

// --------------------------------------
// ?symv : symmetric matrix-vector multiply
// --------------------------------------

pub trait XsymvScalar: Sized {
    fn xsymv(
        uplo: u8, n: i32, alpha: Self, a: &[Self], lda: i32, x: &[Self], incx: i32,
        beta: Self, y: &mut [Self], incy: i32,
    );
}

macro_rules! impl_blas_xsymv {
    ($T:ty, $XSYMV:path) => {
        impl XsymvScalar for $T {
            fn xsymv(
                uplo: u8, n: i32, alpha: Self, a: &[Self], lda: i32, x: &[Self], incx: i32,
                beta: Self, y: &mut [Self], incy: i32,
            ) {
                unsafe { $XSYMV(uplo, n, alpha, a, lda, x, incx, beta, y, incy); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xsymv!(f32, ssymv);
  }
}
impl_blas_xsymv!(f64, dsymv);

// --------------------------------------
// ?syrk : symmetric rank-k update
// --------------------------------------

pub trait XsyrkScalar: Sized {
    fn xsyrk(
        uplo: u8, trans: u8, n: i32, k: i32, alpha: Self, a: &[Self], lda: i32,
        beta: Self, c: &mut [Self], ldc: i32,
    );
}

macro_rules! impl_blas_xsyrk {
    ($T:ty, $XSYRK:path) => {
        impl XsyrkScalar for $T {
            fn xsyrk(
                uplo: u8, trans: u8, n: i32, k: i32, alpha: Self, a: &[Self], lda: i32,
                beta: Self, c: &mut [Self], ldc: i32,
            ) {
                unsafe { $XSYRK(uplo, trans, n, k, alpha, a, lda, beta, c, ldc); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xsyrk!(f32, ssyrk);
  }
}
impl_blas_xsyrk!(f64, dsyrk);

// --------------------------------------
// ?potrf / ?potrs : Cholesky decomposition and solve
// --------------------------------------

pub trait XpotrfScalar: Sized {
    fn xpotrf(uplo: u8, n: i32, a: &mut [Self], lda: i32, info: &mut i32);
}

macro_rules! impl_blas_xpotrf {
    ($T:ty, $XPOTRF:path) => {
        impl XpotrfScalar for $T {
            fn xpotrf(uplo: u8, n: i32, a: &mut [Self], lda: i32, info: &mut i32) {
                unsafe { $XPOTRF(uplo, n, a, lda, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xpotrf!(f32, spotrf);
  }
}
impl_blas_xpotrf!(f64, dpotrf);

pub trait XpotrsScalar: Sized {
    fn xpotrs(
        uplo: u8, n: i32, nrhs: i32, a: &[Self], lda: i32, b: &mut [Self], ldb: i32,
        info: &mut i32,
    );
}

macro_rules! impl_blas_xpotrs {
    ($T:ty, $XPOTRS:path) => {
        impl XpotrsScalar for $T {
            fn xpotrs(
                uplo: u8, n: i32, nrhs: i32, a: &[Self], lda: i32, b: &mut [Self], ldb: i32,
                info: &mut i32,
            ) {
                unsafe { $XPOTRS(uplo, n, nrhs, a, lda, b, ldb, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xpotrs!(f32, spotrs);
  }
}
impl_blas_xpotrs!(f64, dpotrs);

// --------------------------------------
// ?syevr : symmetric eigen decomposition
// --------------------------------------

pub trait XsyevrScalar: Sized {
    fn xsyevr(
        jobz: u8, range: u8, uplo: u8, n: i32, a: &mut [Self], lda: i32, vl: Self, vu: Self,
        il: i32, iu: i32, abstol: Self, m: &mut i32, w: &mut [Self], z: &mut [Self], ldz: i32,
        isuppz: &mut [i32], work: &mut [Self], lwork: i32, iwork: &mut [i32], liwork: i32,
        info: &mut i32,
    );
}

macro_rules! impl_blas_xsyevr {
    ($T:ty, $XSYEVR:path) => {
        impl XsyevrScalar for $T {
            fn xsyevr(
                jobz: u8, range: u8, uplo: u8, n: i32, a: &mut [Self], lda: i32, vl: Self, vu: Self,
                il: i32, iu: i32, abstol: Self, m: &mut i32, w: &mut [Self], z: &mut [Self], ldz: i32,
                isuppz: &mut [i32], work: &mut [Self], lwork: i32, iwork: &mut [i32], liwork: i32,
                info: &mut i32,
            ) {
                unsafe {
                    $XSYEVR(
                        jobz, range, uplo, n, a, lda, vl, vu, il, iu, abstol, m,
                        w, z, ldz, isuppz, work, lwork, iwork, liwork, info,
                    );
                }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xsyevr!(f32, ssyevr);
  }
}
impl_blas_xsyevr!(f64, dsyevr);

// --------------------------------------
// ?gesdd : SVD (divide and conquer method)
// --------------------------------------

pub trait XgesddScalar: Sized {
    fn xgesdd(
        jobz: u8, m: i32, n: i32, a: &mut [Self], lda: i32, s: &mut [Self], u: &mut [Self],
        ldu: i32, vt: &mut [Self], ldvt: i32, work: &mut [Self], lwork: i32, iwork: &mut [i32],
        info: &mut i32,
    );
}

macro_rules! impl_blas_xgesdd {
    ($T:ty, $XGESDD:path) => {
        impl XgesddScalar for $T {
            fn xgesdd(
                jobz: u8, m: i32, n: i32, a: &mut [Self], lda: i32, s: &mut [Self], u: &mut [Self],
                ldu: i32, vt: &mut [Self], ldvt: i32, work: &mut [Self], lwork: i32,
                iwork: &mut [i32], info: &mut i32,
            ) {
                unsafe { $XGESDD(jobz, m, n, a, lda, s, u, ldu, vt, ldvt, work, lwork, iwork, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xgesdd!(f32, sgesdd);
  }
}
impl_blas_xgesdd!(f64, dgesdd);

// --------------------------------------
// ?getrf / ?getrs : LU decomposition and solve
// --------------------------------------

pub trait XgetrfScalar: Sized {
    fn xgetrf(m: i32, n: i32, a: &mut [Self], lda: i32, ipiv: &mut [i32], info: &mut i32);
}

macro_rules! impl_blas_xgetrf {
    ($T:ty, $XGETRF:path) => {
        impl XgetrfScalar for $T {
            fn xgetrf(m: i32, n: i32, a: &mut [Self], lda: i32, ipiv: &mut [i32], info: &mut i32) {
                unsafe { $XGETRF(m, n, a, lda, ipiv, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xgetrf!(f32, sgetrf);
  }
}
impl_blas_xgetrf!(f64, dgetrf);

pub trait XgetrsScalar: Sized {
    fn xgetrs(
        trans: u8, n: i32, nrhs: i32, a: &[Self], lda: i32, ipiv: &[i32], b: &mut [Self],
        ldb: i32, info: &mut i32,
    );
}

macro_rules! impl_blas_xgetrs {
    ($T:ty, $XGETRS:path) => {
        impl XgetrsScalar for $T {
            fn xgetrs(
                trans: u8, n: i32, nrhs: i32, a: &[Self], lda: i32, ipiv: &[i32], b: &mut [Self],
                ldb: i32, info: &mut i32,
            ) {
                unsafe { $XGETRS(trans, n, nrhs, a, lda, ipiv, b, ldb, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xgetrs!(f32, sgetrs);
  }
}
impl_blas_xgetrs!(f64, dgetrs);

// --------------------------------------
// ?geqp3 : column pivoted QR decomposition
// --------------------------------------

pub trait Xgeqp3Scalar: Sized {
    fn xgeqp3(
        m: i32, n: i32, a: &mut [Self], lda: i32, jpvt: &mut [i32], tau: &mut [Self],
        work: &mut [Self], lwork: i32, info: &mut i32,
    );
}

macro_rules! impl_blas_xgeqp3 {
    ($T:ty, $XGEQP3:path) => {
        impl Xgeqp3Scalar for $T {
            fn xgeqp3(
                m: i32, n: i32, a: &mut [Self], lda: i32, jpvt: &mut [i32], tau: &mut [Self],
                work: &mut [Self], lwork: i32, info: &mut i32,
            ) {
                unsafe { $XGEQP3(m, n, a, lda, jpvt, tau, work, lwork, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xgeqp3!(f32, sgeqp3);
  }
}
impl_blas_xgeqp3!(f64, dgeqp3);

// --------------------------------------
// ?orgqr : materialize the orthogonal factor of a QR
// --------------------------------------

pub trait XorgqrScalar: Sized {
    fn xorgqr(
        m: i32, n: i32, k: i32, a: &mut [Self], lda: i32, tau: &[Self], work: &mut [Self],
        lwork: i32, info: &mut i32,
    );
}

macro_rules! impl_blas_xorgqr {
    ($T:ty, $XORGQR:path) => {
        impl XorgqrScalar for $T {
            fn xorgqr(
                m: i32, n: i32, k: i32, a: &mut [Self], lda: i32, tau: &[Self], work: &mut [Self],
                lwork: i32, info: &mut i32,
            ) {
                unsafe { $XORGQR(m, n, k, a, lda, tau, work, lwork, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xorgqr!(f32, sorgqr);
  }
}
impl_blas_xorgqr!(f64, dorgqr);

// --------------------------------------
// ?ormqr : multiply by the orthogonal factor of a QR
// --------------------------------------

pub trait XormqrScalar: Sized {
    fn xormqr(
        side: u8, trans: u8, m: i32, n: i32, k: i32, a: &[Self], lda: i32, tau: &[Self],
        c: &mut [Self], ldc: i32, work: &mut [Self], lwork: i32, info: &mut i32,
    );
}

macro_rules! impl_blas_xormqr {
    ($T:ty, $XORMQR:path) => {
        impl XormqrScalar for $T {
            fn xormqr(
                side: u8, trans: u8, m: i32, n: i32, k: i32, a: &[Self], lda: i32, tau: &[Self],
                c: &mut [Self], ldc: i32, work: &mut [Self], lwork: i32, info: &mut i32,
            ) {
                unsafe { $XORMQR(side, trans, m, n, k, a, lda, tau, c, ldc, work, lwork, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xormqr!(f32, sormqr);
  }
}
impl_blas_xormqr!(f64, dormqr);

// --------------------------------------
// ?trtrs : triangular solve
// --------------------------------------

pub trait XtrtrsScalar: Sized {
    fn xtrtrs(
        uplo: u8, trans: u8, diag: u8, n: i32, nrhs: i32, a: &[Self], lda: i32, b: &mut [Self],
        ldb: i32, info: &mut i32,
    );
}

macro_rules! impl_blas_xtrtrs {
    ($T:ty, $XTRTRS:path) => {
        impl XtrtrsScalar for $T {
            fn xtrtrs(
                uplo: u8, trans: u8, diag: u8, n: i32, nrhs: i32, a: &[Self], lda: i32,
                b: &mut [Self], ldb: i32, info: &mut i32,
            ) {
                unsafe { $XTRTRS(uplo, trans, diag, n, nrhs, a, lda, b, ldb, info); }
            }
        }
    };
}
cfg_if::cfg_if! {
  if #[cfg(not(feature = "r-blas"))] {
      // R blas/lapack only provides double precision routines
      impl_blas_xtrtrs!(f32, strtrs);
  }
}
impl_blas_xtrtrs!(f64, dtrtrs);
