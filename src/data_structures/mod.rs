//! Engine data structures: entities, meshes, textures, transforms and the scene.
//!
//! - `entity` holds the transient placement records read from the descriptor
//! - `model` contains the shared vertex layout and mesh handles
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `instance` holds node-local transforms read from model assets
//! - `scene_graph` is the loaded scene: placed objects with mesh and texture handles

pub mod entity;
pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
