/// Which side `other` is multiplied on in [`Matrix4x4d::multiply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MatrixOrder {
    /// `self = self * other`.
    #[default]
    Prepend,
    /// `self = other * self`.
    Append,
}

/// Row-major 4x4 double-precision transform.
///
/// Vectors are columns: `transform*` computes `M * v`. A chain built with
/// [`MatrixOrder::Prepend`] therefore applies the most recently added transform to a vector
/// first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4x4d {
    m: [f64; 16],
}

const IDENTITY: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

const SINGULAR_EPSILON: f64 = 1e-12;

impl Default for Matrix4x4d {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix4x4d {
    /// The identity transform.
    pub const fn identity() -> Self {
        Self { m: IDENTITY }
    }

    /// Build from 16 row-major values.
    pub const fn from_array(m: [f64; 16]) -> Self {
        Self { m }
    }

    /// Row-major values.
    pub const fn as_array(&self) -> &[f64; 16] {
        &self.m
    }

    /// Reset to identity.
    pub fn set_identity(&mut self) -> &mut Self {
        self.m = IDENTITY;
        self
    }

    /// `true` when every element equals the identity.
    pub fn is_identity(&self) -> bool {
        self.m == IDENTITY
    }

    /// Compose with `other` on the side given by `order`.
    pub fn multiply(&mut self, other: &Self, order: MatrixOrder) -> &mut Self {
        self.m = match order {
            MatrixOrder::Prepend => mul(&self.m, &other.m),
            MatrixOrder::Append => mul(&other.m, &self.m),
        };
        self
    }

    /// Compose a translation.
    pub fn translate(&mut self, x: f64, y: f64, z: f64, order: MatrixOrder) -> &mut Self {
        let t = Self::from_array([
            1.0, 0.0, 0.0, x, //
            0.0, 1.0, 0.0, y, //
            0.0, 0.0, 1.0, z, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        self.multiply(&t, order)
    }

    /// Compose a scale.
    pub fn scale(&mut self, x: f64, y: f64, z: f64, order: MatrixOrder) -> &mut Self {
        let s = Self::from_array([
            x, 0.0, 0.0, 0.0, //
            0.0, y, 0.0, 0.0, //
            0.0, 0.0, z, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        self.multiply(&s, order)
    }

    /// Compose a rotation of `angle` radians around the x axis.
    pub fn rotate_x(&mut self, angle: f64, order: MatrixOrder) -> &mut Self {
        let (s, c) = angle.sin_cos();
        let r = Self::from_array([
            1.0, 0.0, 0.0, 0.0, //
            0.0, c, -s, 0.0, //
            0.0, s, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        self.multiply(&r, order)
    }

    /// Compose a rotation of `angle` radians around the y axis.
    pub fn rotate_y(&mut self, angle: f64, order: MatrixOrder) -> &mut Self {
        let (s, c) = angle.sin_cos();
        let r = Self::from_array([
            c, 0.0, s, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            -s, 0.0, c, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        self.multiply(&r, order)
    }

    /// Compose a rotation of `angle` radians around the z axis.
    pub fn rotate_z(&mut self, angle: f64, order: MatrixOrder) -> &mut Self {
        let (s, c) = angle.sin_cos();
        let r = Self::from_array([
            c, -s, 0.0, 0.0, //
            s, c, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        self.multiply(&r, order)
    }

    /// Compose a 2D shear: `x' = x + sx * y`, `y' = y + sy * x`.
    pub fn shear(&mut self, sx: f64, sy: f64, order: MatrixOrder) -> &mut Self {
        let r = Self::from_array([
            1.0, sx, 0.0, 0.0, //
            sy, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ]);
        self.multiply(&r, order)
    }

    /// Apply to `[x, y]` with `z = 0`, `w = 1`.
    pub fn transform2d(&self, v: &mut [f64; 2]) -> &Self {
        let m = &self.m;
        let [x, y] = *v;
        *v = [m[0] * x + m[1] * y + m[3], m[4] * x + m[5] * y + m[7]];
        self
    }

    /// Apply to `[x, y, z]` with an implicit `w = 1`; the projective row is ignored.
    pub fn transform3d(&self, v: &mut [f64; 3]) -> &Self {
        let m = &self.m;
        let [x, y, z] = *v;
        *v = [
            m[0] * x + m[1] * y + m[2] * z + m[3],
            m[4] * x + m[5] * y + m[6] * z + m[7],
            m[8] * x + m[9] * y + m[10] * z + m[11],
        ];
        self
    }

    /// Apply to a homogeneous `[x, y, z, w]`.
    pub fn transform4d(&self, v: &mut [f64; 4]) -> &Self {
        let m = &self.m;
        let src = *v;
        for (r, out) in v.iter_mut().enumerate() {
            let row = &m[r * 4..r * 4 + 4];
            *out = row[0] * src[0] + row[1] * src[1] + row[2] * src[2] + row[3] * src[3];
        }
        self
    }

    /// Invert in place. Returns `false` and leaves `self` untouched when singular.
    pub fn invert(&mut self) -> bool {
        let mut a = self.m;
        let mut inv = IDENTITY;

        for col in 0..4 {
            let pivot_row = (col..4)
                .max_by(|&i, &j| a[i * 4 + col].abs().total_cmp(&a[j * 4 + col].abs()))
                .unwrap_or(col);
            let pivot = a[pivot_row * 4 + col];
            if pivot.abs() < SINGULAR_EPSILON {
                return false;
            }
            if pivot_row != col {
                swap_rows(&mut a, pivot_row, col);
                swap_rows(&mut inv, pivot_row, col);
            }

            let scale = 1.0 / pivot;
            for c in 0..4 {
                a[col * 4 + c] *= scale;
                inv[col * 4 + c] *= scale;
            }
            a[col * 4 + col] = 1.0;

            for r in 0..4 {
                if r == col {
                    continue;
                }
                let f = a[r * 4 + col];
                if f == 0.0 {
                    continue;
                }
                for c in 0..4 {
                    a[r * 4 + c] -= f * a[col * 4 + c];
                    inv[r * 4 + c] -= f * inv[col * 4 + c];
                }
                a[r * 4 + col] = 0.0;
            }
        }

        self.m = inv;
        true
    }
}

fn mul(a: &[f64; 16], b: &[f64; 16]) -> [f64; 16] {
    let mut out = [0.0f64; 16];
    for r in 0..4 {
        let mut acc = [0.0f64; 4];
        for k in 0..4 {
            let s = a[r * 4 + k];
            let row = &b[k * 4..k * 4 + 4];
            for c in 0..4 {
                acc[c] += s * row[c];
            }
        }
        out[r * 4..r * 4 + 4].copy_from_slice(&acc);
    }
    out
}

fn swap_rows(m: &mut [f64; 16], a: usize, b: usize) {
    for c in 0..4 {
        m.swap(a * 4 + c, b * 4 + c);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/matrix.rs"]
mod tests;
