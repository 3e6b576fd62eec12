use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::config::CameraConfig;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Right-handed camera looking down -Z, so points in front of it have a
/// negative view-space z.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub transform: Transform,
    /// Vertical field of view, degrees.
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect_ratio: f32) -> Self {
        let r = config.rotation;
        Self {
            transform: Transform {
                position: config.position,
                rotation: Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
                ..Default::default()
            },
            fov: config.fov,
            aspect_ratio,
            near: config.near,
            far: config.far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.transform.matrix().inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }
}
