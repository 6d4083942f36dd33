//! Placement records read from the level descriptor.

use cgmath::Vector3;

/// One placeable object from the descriptor's `<entitySet>`.
///
/// Records are transient: the scene loader consumes each one right after it
/// is parsed and only keeps what ends up in a [`SceneObject`](crate::data_structures::scene_graph::SceneObject).
#[derive(Clone, Debug, PartialEq)]
pub struct EntityRecord {
    /// Model reference as written in the descriptor (e.g. `Rock01_`).
    pub model_name: String,
    /// Display/debug key, expected to be unique within one load.
    pub name: String,
    /// World position, already remapped from the descriptor's axes to `(x, z, -y)`.
    pub position: Vector3<f32>,
    /// Euler angles in degrees, applied in Z, Y, X order.
    pub rotation: Vector3<f32>,
}

impl EntityRecord {
    pub fn new(model_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            name: name.into(),
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}
