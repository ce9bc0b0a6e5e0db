//! Mesh module
//!
//! Phantom client-side objects built from raw entity packets:
//! - Mesh entities and their two variants (interpolated, carrier-mounted)
//! - Shared packet construction for both variants
//! - The registry that owns meshes and refreshes visibility each tick
//! - A tokio tick loop for hosts without a scheduler

pub mod entity;
pub mod packets;
pub mod registry;
pub mod ticker;

pub use entity::{Mesh, MeshId, MeshVariant, VisibilityChange, VisibilityQuery};
pub use registry::{MeshRegistry, SharedMeshRegistry, TickReport};
pub use ticker::run_tick_loop;
