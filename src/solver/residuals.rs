#![allow(non_snake_case)]

use crate::algebra::*;
use crate::model::ProblemData;
use crate::point::Point;

/// KKT residuals of the homogeneous embedding, plus the partial
/// residuals and inner products used by the convergence and
/// infeasibility checks.
pub struct Residuals<T> {
    /// r_x = -Aᵀy - Gᵀz - cτ
    pub rx: Vec<T>,
    /// r_y = Ax - bτ
    pub ry: Vec<T>,
    /// r_z = s + Gx - hτ
    pub rz: Vec<T>,
    /// τ-row residual: cᵀx + bᵀy + hᵀz + κ
    pub rτ: T,

    // partial residuals for infeasibility certificates
    /// -Aᵀy - Gᵀz
    pub rx_inf: Vec<T>,
    /// s + Gx
    pub rz_inf: Vec<T>,

    // cached inner products
    pub cx: T,
    pub by: T,
    pub hz: T,
}

impl<T> Residuals<T>
where
    T: FloatT,
{
    pub fn new(n: usize, p: usize, q: usize) -> Self {
        Self {
            rx: vec![T::zero(); n],
            ry: vec![T::zero(); p],
            rz: vec![T::zero(); q],
            rτ: T::zero(),
            rx_inf: vec![T::zero(); n],
            rz_inf: vec![T::zero(); q],
            cx: T::zero(),
            by: T::zero(),
            hz: T::zero(),
        }
    }

    pub fn update(&mut self, data: &ProblemData<T>, point: &Point<T>) {
        self.cx = data.c.dot(&point.x);
        self.by = data.b.dot(&point.y);
        self.hz = data.h.dot(&point.z);

        // rx_inf = -Aᵀy - Gᵀz
        data.A
            .gemv(MatrixShape::T, &mut self.rx_inf, &point.y, -T::one(), T::zero());
        data.G
            .gemv(MatrixShape::T, &mut self.rx_inf, &point.z, -T::one(), T::one());

        // rx = rx_inf - cτ
        self.rx.waxpby(T::one(), &self.rx_inf, -point.τ, &data.c);

        // ry = Ax - bτ
        data.A
            .gemv(MatrixShape::N, &mut self.ry, &point.x, T::one(), T::zero());
        self.ry.axpby(-point.τ, &data.b, T::one());

        // rz_inf = s + Gx
        self.rz_inf.copy_from(&point.s);
        data.G
            .gemv(MatrixShape::N, &mut self.rz_inf, &point.x, T::one(), T::one());

        // rz = rz_inf - hτ
        self.rz.waxpby(T::one(), &self.rz_inf, -point.τ, &data.h);

        self.rτ = self.cx + self.by + self.hz + point.κ;
    }
}
