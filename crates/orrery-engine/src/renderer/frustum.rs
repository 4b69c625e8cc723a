use glam::{Mat4, Vec3, Vec4};

/// View frustum as six inward-facing planes `(normal, d)` with `dot(n, p) + d >= 0` inside.
///
/// Planes are extracted from a view-projection matrix (Gribb/Hartmann), using
/// the 0..1 depth range that `Mat4::perspective_rh` produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    pub fn from_view_projection(view_proj: &Mat4) -> Self {
        let mut frustum = Self { planes: [Vec4::ZERO; 6] };
        frustum.set_from(view_proj);
        frustum
    }

    /// Recompute planes in place from a new view-projection matrix.
    pub fn set_from(&mut self, m: &Mat4) {
        let r0 = m.row(0);
        let r1 = m.row(1);
        let r2 = m.row(2);
        let r3 = m.row(3);

        self.planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near (z >= 0)
            r3 - r2, // far
        ];
        for plane in &mut self.planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }
    }

    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        self.planes.iter().all(|pl| pl.truncate().dot(p) + pl.w >= 0.0)
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|pl| pl.truncate().dot(center) + pl.w >= -radius)
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::from_view_projection(&Mat4::IDENTITY)
    }
}
