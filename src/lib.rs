//! xblock-ngin
//!
//! Loads a level described by an `.xblock` descriptor into a render-ready
//! scene: every placed entity is resolved to a `.nif` model, its meshes are
//! converted to one shared vertex layout and uploaded, and a matching `.dds`
//! texture is looked up next to it. Scene objects can then be picked with a
//! ray cast from the cursor.
//!
//! High-level modules
//! - `camera`: fly camera, projection and cursor-to-ray conversion
//! - `context`: the upload seam and the `wgpu` context behind it
//! - `data_structures`: engine data models (vertices, meshes, instances, scene objects)
//! - `pick`: ray/box intersection and object selection
//! - `resources`: descriptor, model and texture loading plus the scene assembler
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod pick;
pub mod resources;

#[cfg(test)]
pub(crate) mod log_capture;

pub use context::{GpuContext, NO_TEXTURE, TextureHandle, Uploader};
pub use data_structures::scene_graph::{Scene, SceneObject};
pub use resources::{LoaderConfig, load_scene};

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use winit::dpi::{PhysicalPosition, PhysicalSize};

/// Installs `env_logger` as the `log` backend, honouring `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    if env_logger::try_init().is_err() {
        log::debug!("Logger already initialized");
    }
}
