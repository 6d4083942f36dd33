//! Local transforms carried by model asset nodes.
//!
//! Asset nodes store translation, a 3x3 rotation and a uniform scale. They are
//! kept as an [`Instance`] so parent/child transforms compose with `*`.

use std::ops::Mul;

use cgmath::{Matrix3, One, Quaternion, Vector3};

/// Translation, rotation (as quaternion) and scale of one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Build from the node layout stored in asset files.
    ///
    /// `rotation` is row-major as written on disk.
    pub fn from_parts(translation: [f32; 3], rotation: [[f32; 3]; 3], scale: f32) -> Self {
        // Matrix3::new takes columns, column j is (r[0][j], r[1][j], r[2][j])
        let r = rotation;
        let matrix = Matrix3::new(
            r[0][0], r[1][0], r[2][0], //
            r[0][1], r[1][1], r[2][1], //
            r[0][2], r[1][2], r[2][2],
        );
        Self {
            position: translation.into(),
            rotation: Quaternion::from(matrix),
            scale: Vector3::new(scale, scale, scale),
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl<'a, 'b> Mul<&'b Instance> for &'a Instance {
    type Output = Instance;

    fn mul(self, rhs: &'b Instance) -> Self::Output {
        let new_rotation = self.rotation * rhs.rotation;

        let new_scale = Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let new_position = self.position + (self.rotation * scaled_rhs_pos);

        Instance {
            position: new_position,
            rotation: new_rotation,
            scale: new_scale,
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}
