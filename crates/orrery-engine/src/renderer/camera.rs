use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Perspective parameters for [`Camera3D`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov_y_deg: f32,
    pub near: f32,
    /// Far plane; must cover the Oort cloud after distance compression.
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            near: 0.1,
            far: 200_000.0,
            min_distance: 2.0,
            max_distance: 20_000.0,
        }
    }
}

/// Screen-space projection of a world point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// Pixel position, origin top-left, Y down.
    pub pos: Vec2,
    /// Normalized device depth; > 1 means behind the camera or past the far plane.
    pub depth: f32,
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],
    pub position: [f32; 4],
}

/// Orbit camera around a target point, Y-up.
#[derive(Debug, Clone)]
pub struct Camera3D {
    /// Rotation around the Y axis (radians).
    pub azimuth: f32,
    /// Angle above the ecliptic plane (radians), clamped short of the poles.
    pub elevation: f32,
    /// Distance from target in scene units.
    pub distance: f32,
    pub target: Vec3,
    pub aspect: f32,
    pub config: CameraConfig,
}

impl Camera3D {
    const ORBIT_SENSITIVITY: f32 = 0.005;
    const ZOOM_STEP: f32 = 1.1;
    const MAX_ELEVATION: f32 = 1.55;

    pub fn new(config: CameraConfig, viewport: Viewport) -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.5,
            distance: 1800.0,
            target: Vec3::ZERO,
            aspect: viewport.aspect(),
            config,
        }
    }

    /// Update aspect ratio after a viewport change.
    pub fn resize(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    /// Orbit by a pointer delta in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * Self::ORBIT_SENSITIVITY;
        self.elevation += dy * Self::ORBIT_SENSITIVITY;
        self.elevation = self.elevation.clamp(-Self::MAX_ELEVATION, Self::MAX_ELEVATION);
    }

    /// Multiplicative zoom; positive steps move closer.
    pub fn zoom(&mut self, steps: f32) {
        self.distance /= Self::ZOOM_STEP.powf(steps);
        self.distance = self
            .distance
            .clamp(self.config.min_distance, self.config.max_distance);
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target + Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az) * self.distance
    }

    /// World-inverse matrix of the camera.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_y_deg.to_radians(),
            self.aspect,
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_projection: self.view_projection().to_cols_array_2d(),
            position: self.position().extend(1.0).to_array(),
        }
    }

    /// Project a world point to pixel coordinates.
    pub fn project(&self, world: Vec3, viewport: Viewport) -> ScreenPoint {
        project_with(&self.view_projection(), world, viewport)
    }

    /// Ray through a pixel: (origin, normalized direction).
    pub fn unproject_ray(&self, screen: Vec2, viewport: Viewport) -> (Vec3, Vec3) {
        let ndc_x = screen.x / viewport.width * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / viewport.height * 2.0;
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        (near, (far - near).normalize_or_zero())
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::new(CameraConfig::default(), Viewport::default())
    }
}

/// Project with a precomputed view-projection matrix.
///
/// Points behind the eye come out with depth > 1 after the perspective divide
/// flips sign, which callers treat as hidden.
pub fn project_with(view_proj: &Mat4, world: Vec3, viewport: Viewport) -> ScreenPoint {
    let clip = *view_proj * world.extend(1.0);
    let depth = if clip.w <= 0.0 {
        f32::INFINITY
    } else {
        clip.z / clip.w
    };
    let w = if clip.w.abs() > f32::EPSILON { clip.w } else { f32::EPSILON };
    let ndc = Vec2::new(clip.x / w, clip.y / w);
    ScreenPoint {
        pos: Vec2::new(
            (ndc.x * 0.5 + 0.5) * viewport.width,
            (-ndc.y * 0.5 + 0.5) * viewport.height,
        ),
        depth,
    }
}
