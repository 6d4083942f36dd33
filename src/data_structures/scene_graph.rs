//! The loaded scene: an ordered list of placed, render-ready objects.

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};

use crate::{
    context::{TextureHandle, Uploader, NO_TEXTURE},
    data_structures::{instance::Instance, model::Mesh},
};

/// One drawable piece of a descriptor entity.
///
/// An entity whose model has several mesh nodes contributes one `SceneObject`
/// per node, all sharing the entity's name, path and placement.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub name: String,
    pub model_path: String,
    pub position: Vector3<f32>,
    /// Degrees, applied Z then Y then X.
    pub rotation: Vector3<f32>,
    pub mesh: Option<Mesh>,
    /// [`NO_TEXTURE`] when nothing could be resolved; draw with a fallback.
    pub texture: TextureHandle,
    pub model_matrix: Matrix4<f32>,
}

impl SceneObject {
    pub fn new(
        name: &str,
        model_path: &str,
        position: Vector3<f32>,
        rotation: Vector3<f32>,
        local: Option<&Instance>,
        mesh: Mesh,
        texture: TextureHandle,
    ) -> Self {
        let model_matrix = placement_matrix(position, rotation, local);
        Self {
            name: name.to_string(),
            model_path: model_path.to_string(),
            position,
            rotation,
            mesh: Some(mesh),
            texture,
            model_matrix,
        }
    }

    pub fn has_texture(&self) -> bool {
        self.texture != NO_TEXTURE
    }

    pub fn index_count(&self) -> u32 {
        self.mesh.as_ref().map_or(0, |mesh| mesh.num_elements)
    }
}

/// Combines the entity placement with an asset node's local transform.
///
/// The entity rotation is applied to the mesh first (X, then Y, then Z), then
/// the node's local transform, then the entity translation.
pub fn placement_matrix(
    position: Vector3<f32>,
    rotation: Vector3<f32>,
    local: Option<&Instance>,
) -> Matrix4<f32> {
    let local = local.map_or_else(Matrix4::identity, Instance::to_matrix);
    Matrix4::from_translation(position)
        * local
        * Matrix4::from_angle_z(Deg(rotation.z))
        * Matrix4::from_angle_y(Deg(rotation.y))
        * Matrix4::from_angle_x(Deg(rotation.x))
}

/// Everything produced by one descriptor load, in descriptor order.
#[derive(Debug, Default)]
pub struct Scene {
    pub source: String,
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(source: impl Into<String>, objects: Vec<SceneObject>) -> Self {
        Self {
            source: source.into(),
            objects,
        }
    }

    pub fn empty(source: impl Into<String>) -> Self {
        Self::new(source, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneObject> {
        self.objects.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&SceneObject> {
        self.objects.get(idx)
    }

    /// Hands every owned mesh back to the uploader that created it.
    pub fn release(mut self, uploader: &mut dyn Uploader) {
        for object in self.objects.iter_mut() {
            if let Some(mesh) = object.mesh.take() {
                uploader.release_mesh(mesh.handle);
            }
        }
    }
}

impl<'a> IntoIterator for &'a Scene {
    type Item = &'a SceneObject;
    type IntoIter = std::slice::Iter<'a, SceneObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}
