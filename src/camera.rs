//! Fly camera and perspective projection used to turn a cursor position into a pick ray.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::pick::Ray;

/// Converts cgmath's OpenGL clip space (z in -1..1) to wgpu's (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

const SAFE_FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2 - 0.0001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let mut camera = Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: Rad(0.0),
        };
        camera.set_pitch(pitch);
        camera
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    pub fn set_yaw<Y: Into<Rad<f32>>>(&mut self, yaw: Y) {
        self.yaw = yaw.into();
    }

    /// Pitch is clamped just short of straight up/down so the view never flips.
    pub fn set_pitch<P: Into<Rad<f32>>>(&mut self, pitch: P) {
        let pitch = pitch.into();
        self.pitch = Rad(pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2));
    }

    /// Unit view direction; yaw 0 looks down +X, yaw -90° down -Z.
    pub fn forward(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw).normalize()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.forward().cross(Vector3::unit_y()).normalize()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.right().cross(self.forward()).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.forward(), Vector3::unit_y())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new((0.0, 0.0, 3.0), Deg(-90.0), Deg(0.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// The projection the level viewer uses: 45° vertical field of view, 1..10000 depth range.
    pub fn for_scene(width: u32, height: u32) -> Self {
        Self::new(width, height, Deg(45.0), 1.0, 10_000.0)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// OpenGL-convention perspective, as used for unprojecting the cursor.
    pub fn gl_matrix(&self) -> Matrix4<f32> {
        perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.gl_matrix()
    }

    /// Eye-space direction through a point in normalized device coordinates.
    ///
    /// Same as multiplying `(x, y, -1, 1)` by the inverse projection and
    /// keeping `(x, y, -1, 0)`.
    pub fn unproject_direction(&self, ndc_x: f32, ndc_y: f32) -> Vector3<f32> {
        let tan_half = (self.fovy.0 / 2.0).tan();
        Vector3::new(ndc_x * tan_half * self.aspect, ndc_y * tan_half, -1.0)
    }
}

/// Cursor position in pixels to normalized device coordinates (y up).
pub fn cursor_to_ndc(cursor: PhysicalPosition<f64>, size: PhysicalSize<u32>) -> (f32, f32) {
    let width = size.width.max(1) as f64;
    let height = size.height.max(1) as f64;
    let x = 2.0 * cursor.x / width - 1.0;
    let y = 1.0 - 2.0 * cursor.y / height;
    (x as f32, y as f32)
}

/// World space ray from the camera through the cursor.
pub fn screen_ray(
    cursor: PhysicalPosition<f64>,
    size: PhysicalSize<u32>,
    camera: &Camera,
    projection: &Projection,
) -> Ray {
    let (x, y) = cursor_to_ndc(cursor, size);
    let eye = projection.unproject_direction(x, y);
    // inverse view of a look-to matrix: eye -z maps onto forward
    let direction = camera.right() * eye.x + camera.up() * eye.y - camera.forward() * eye.z;
    Ray::new(camera.position, direction.normalize())
}
