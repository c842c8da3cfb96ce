//! 3×3 homogeneous matrices for 2D affine transforms.
//!
//! Matrices are row-major (`m[row][col]`) and act on column vectors, so `outer * inner`
//! applied to a vector runs `inner` first.

use std::ops::Mul;

use crate::foundation::core::{Affine, Vec2};
use crate::foundation::error::{SceneError, SceneResult};

const SINGULAR_EPS: f64 = 1e-12;

/// Homogeneous 3-vector. Points carry `z = 1`, directions `z = 0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const UNIT_X: Self = Self::new(1.0, 0.0, 0.0);
    pub const UNIT_Y: Self = Self::new(0.0, 1.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn point(p: Vec2) -> Self {
        Self::new(p.x, p.y, 1.0)
    }

    pub fn direction(d: Vec2) -> Self {
        Self::new(d.x, d.y, 0.0)
    }

    pub fn xy(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn with_z(self, z: f64) -> Self {
        Self { z, ..self }
    }

    pub fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn scaled(self, f: f64) -> Self {
        Self::new(self.x * f, self.y * f, self.z * f)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix3 {
    pub m: [[f64; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix3 {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    pub const fn from_rows(m: [[f64; 3]; 3]) -> Self {
        Self { m }
    }

    pub fn translation(v: Vec2) -> Self {
        Self::from_rows([[1.0, 0.0, v.x], [0.0, 1.0, v.y], [0.0, 0.0, 1.0]])
    }

    /// Rotation by `angle_deg` in the plane spanned by the orthonormal axes `u` and `v`,
    /// turning `u` towards `v`.
    pub fn rotation_in_plane(u: Vec3, v: Vec3, angle_deg: f64) -> Self {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let u = [u.x, u.y, u.z];
        let v = [v.x, v.y, v.z];
        let mut m = Self::IDENTITY.m;
        for (r, row) in m.iter_mut().enumerate() {
            for (k, cell) in row.iter_mut().enumerate() {
                *cell += s * (v[r] * u[k] - u[r] * v[k]) + (c - 1.0) * (u[r] * u[k] + v[r] * v[k]);
            }
        }
        Self { m }
    }

    /// 2D rotation about the origin; positive angles turn +x towards +y.
    pub fn rotation(angle_deg: f64) -> Self {
        Self::rotation_in_plane(Vec3::UNIT_X, Vec3::UNIT_Y, angle_deg)
    }

    pub fn scaling(v: Vec2) -> Self {
        Self::scaling_xyz(Vec3::new(v.x, v.y, 1.0))
    }

    pub fn scaling_xyz(v: Vec3) -> Self {
        Self::from_rows([[v.x, 0.0, 0.0], [0.0, v.y, 0.0], [0.0, 0.0, v.z]])
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        let a = &self.m;
        let b = &rhs.m;
        let mut out = [[0.0; 3]; 3];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
            }
        }
        Self { m: out }
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// General 3×3 inverse via the adjugate.
    pub fn invert(&self) -> SceneResult<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < SINGULAR_EPS {
            return Err(SceneError::geometry(format!(
                "matrix is not invertible (det = {det})"
            )));
        }
        let m = &self.m;
        let inv_det = 1.0 / det;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
            m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
        };
        Ok(Self::from_rows([
            [
                cof(1, 2, 1, 2) * inv_det,
                -cof(0, 2, 1, 2) * inv_det,
                cof(0, 1, 1, 2) * inv_det,
            ],
            [
                -cof(1, 2, 0, 2) * inv_det,
                cof(0, 2, 0, 2) * inv_det,
                -cof(0, 1, 0, 2) * inv_det,
            ],
            [
                cof(1, 2, 0, 1) * inv_det,
                -cof(0, 2, 0, 1) * inv_det,
                cof(0, 1, 0, 1) * inv_det,
            ],
        ]))
    }

    pub fn approx_eq(&self, other: &Self, eps: f64) -> bool {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .all(|(a, b)| (a - b).abs() <= eps)
    }

    /// Canvas-style affine coefficients `[a, b, c, d, e, f]`.
    pub fn to_affine(&self) -> Affine {
        let m = &self.m;
        Affine::new([m[0][0], m[1][0], m[0][1], m[1][1], m[0][2], m[1][2]])
    }
}

impl Mul for Matrix3 {
    type Output = Matrix3;

    fn mul(self, rhs: Matrix3) -> Matrix3 {
        Matrix3::mul(&self, &rhs)
    }
}

impl Mul<Vec3> for Matrix3 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        self.apply(rhs)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/math/matrix.rs"]
mod tests;
