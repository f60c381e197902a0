//! Fixed viewing camera and perspective projection.

use nalgebra::{Matrix4, Point3, Vector3};

/// nalgebra builds OpenGL clip space (`z` in `-1..1`); wgpu expects `0..1`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn build_view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.target, &self.up)
    }
}

impl Default for Camera {
    /// Looks down at the cube from above and in front, as the tutorial does.
    fn default() -> Self {
        Self {
            eye: Point3::new(0.0, 15.0, 30.0),
            target: Point3::origin(),
            up: Vector3::y(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    pub aspect: f32,
    /// Vertical field of view in radians.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn build_projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fovy, self.znear, self.zfar)
    }

    /// Combined view-projection in OpenGL clip space.
    pub fn view_proj(&self, camera: &Camera) -> Matrix4<f32> {
        self.build_projection_matrix() * camera.build_view_matrix()
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            aspect: 800.0 / 600.0,
            fovy: 45f32.to_radians(),
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_proj = (OPENGL_TO_WGPU_MATRIX * projection.view_proj(camera)).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    #[test]
    fn origin_projects_to_screen_center() {
        let camera = Camera::default();
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &Projection::default());
        let clip = Matrix4::from(uniform.view_proj) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }
}
