//! Vector, matrix and quaternion primitives used by the pose evaluator.
//!
//! Tag rotations are stored as row-major 3x3 matrices (`m[row][col]`).
//! Transforms handed to renderers are column-major 4x4 arrays, OpenGL style.

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Linear interpolation `(1 - t) * self + t * other`
pub trait Lerp: Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        (1.0 - t) * self + t * other
    }
}

/// 3D vector for positions, bounds and normals
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product `self x other`
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(&self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len)
        } else {
            Self::ZERO
        }
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Convert to a glam vector for easier math operations
    pub fn to_glam(&self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    pub fn from_glam(v: glam::Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            x: self.x.lerp(&other.x, t),
            y: self.y.lerp(&other.y, t),
            z: self.z.lerp(&other.z, t),
        }
    }
}

/// Row-major 3x3 rotation matrix, `m[row][col]`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Mat3 {
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    pub const fn new(m: [[f32; 3]; 3]) -> Self {
        Self { m }
    }

    pub fn transpose(&self) -> Self {
        let m = &self.m;
        Self::new([
            [m[0][0], m[1][0], m[2][0]],
            [m[0][1], m[1][1], m[2][1]],
            [m[0][2], m[1][2], m[2][2]],
        ])
    }

    pub fn to_glam(&self) -> glam::Mat3 {
        glam::Mat3::from_cols_array_2d(&self.transpose().m)
    }

    pub fn from_glam(m: glam::Mat3) -> Self {
        Self::new(m.to_cols_array_2d()).transpose()
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Quaternion representation for rotations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// Below this value of `1 - cos(theta)` slerp falls back to a plain lerp
const SLERP_DELTA: f32 = 0.01;

/// Cyclic successor of a quaternion axis index
const NEXT: [usize; 3] = [1, 2, 0];

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    fn neg(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }

    fn weighted(&self, a: f32, other: &Self, b: f32) -> Self {
        Self::new(
            a * self.x + b * other.x,
            a * self.y + b * other.y,
            a * self.z + b * other.z,
            a * self.w + b * other.w,
        )
    }

    /// Rotation quaternion of an orthonormal matrix (trace method)
    pub fn from_matrix(mat: &Mat3) -> Self {
        let m = &mat.m;
        let trace = m[0][0] + m[1][1] + m[2][2];

        if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            return Self::new(
                (m[2][1] - m[1][2]) * s,
                (m[0][2] - m[2][0]) * s,
                (m[1][0] - m[0][1]) * s,
                0.25 / s,
            );
        }

        // Largest diagonal element picks the stable component
        let mut i = 0;
        if m[1][1] > m[0][0] {
            i = 1;
        }
        if m[2][2] > m[i][i] {
            i = 2;
        }
        let j = NEXT[i];
        let k = NEXT[j];

        let mut s = (m[i][i] - (m[j][j] + m[k][k]) + 1.0).sqrt();
        let mut q = [0.0f32; 4];
        q[i] = s * 0.5;
        if s != 0.0 {
            s = 0.5 / s;
        }
        q[3] = (m[k][j] - m[j][k]) * s;
        q[j] = (m[j][i] + m[i][j]) * s;
        q[k] = (m[k][i] + m[i][k]) * s;

        Self::new(q[0], q[1], q[2], q[3])
    }

    /// Rotation matrix of a unit quaternion
    pub fn to_matrix(&self) -> Mat3 {
        let Self { x, y, z, w } = *self;
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, xy, xz) = (x * x2, x * y2, x * z2);
        let (yy, yz, zz) = (y * y2, y * z2, z * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);

        Mat3::new([
            [1.0 - (yy + zz), xy - wz, xz + wy],
            [xy + wz, 1.0 - (xx + zz), yz - wx],
            [xz - wy, yz + wx, 1.0 - (xx + yy)],
        ])
    }

    /// Spherical linear interpolation along the shorter arc.
    ///
    /// Nearly parallel inputs are blended linearly; the result is not
    /// renormalized in that case.
    pub fn slerp(&self, to: &Self, t: f32) -> Self {
        let mut cosom = self.dot(to);
        let to = if cosom < 0.0 {
            cosom = -cosom;
            to.neg()
        } else {
            *to
        };

        let (scale0, scale1) = if 1.0 - cosom > SLERP_DELTA {
            let omega = cosom.acos();
            let sinom = omega.sin();
            (
                ((1.0 - t) * omega).sin() / sinom,
                (t * omega).sin() / sinom,
            )
        } else {
            (1.0 - t, t)
        };

        self.weighted(scale0, &to, scale1)
    }

    pub fn to_glam(&self) -> glam::Quat {
        glam::Quat::from_xyzw(self.x, self.y, self.z, self.w)
    }

    pub fn from_glam(q: glam::Quat) -> Self {
        Self::new(q.x, q.y, q.z, q.w)
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Lerp for Quat {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self.slerp(other, t)
    }
}

/// 4x4 transformation matrix (column-major, like OpenGL)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Mat4 {
    /// Matrix data in column-major order, `data[col * 4 + row]`
    pub data: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        data: [
            1.0, 0.0, 0.0, 0.0, // Column 0
            0.0, 1.0, 0.0, 0.0, // Column 1
            0.0, 0.0, 1.0, 0.0, // Column 2
            0.0, 0.0, 0.0, 1.0, // Column 3
        ],
    };

    /// Rigid transform with `rotation` in the upper 3x3 block and
    /// `translation` in the last column
    pub fn from_rotation_translation(rotation: &Mat3, translation: Vec3) -> Self {
        let mut data = [0.0f32; 16];
        for (c, col) in data.chunks_exact_mut(4).take(3).enumerate() {
            for (r, cell) in col.iter_mut().take(3).enumerate() {
                *cell = rotation.m[r][c];
            }
        }
        data[12] = translation.x;
        data[13] = translation.y;
        data[14] = translation.z;
        data[15] = 1.0;
        Self { data }
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[col * 4 + row]
    }

    /// Matrix product `self * other`
    pub fn mul(&self, other: &Self) -> Self {
        let mut data = [0.0f32; 16];
        for c in 0..4 {
            for r in 0..4 {
                data[c * 4 + r] = (0..4).map(|k| self.get(r, k) * other.get(k, c)).sum();
            }
        }
        Self { data }
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let m = &self.data;
        Vec3 {
            x: m[0] * p.x + m[4] * p.y + m[8] * p.z + m[12],
            y: m[1] * p.x + m[5] * p.y + m[9] * p.z + m[13],
            z: m[2] * p.x + m[6] * p.y + m[10] * p.z + m[14],
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.data[12], self.data[13], self.data[14])
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.data
    }

    pub fn to_glam(&self) -> glam::Mat4 {
        glam::Mat4::from_cols_array(&self.data)
    }

    pub fn from_glam(m: glam::Mat4) -> Self {
        Self {
            data: m.to_cols_array(),
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::mul(&self, &rhs)
    }
}
