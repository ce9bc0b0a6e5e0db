//! Alexandria Mesh Library
//!
//! Packet-level phantom entities ("meshes") for a Minecraft server. A mesh
//! exists only on the clients it is shown to: the host supplies a query for
//! who should see it, and the registry spawns and removes it per client as
//! that answer changes from tick to tick.
//!
//! ## Modules
//!
//! - `color` - Highlight colors and their teams
//! - `config` - Configuration management
//! - `error` - Error types and result definitions
//! - `math` - Transform value type and protocol conversions
//! - `mesh` - Meshes, the mesh registry and its tick loop
//! - `protocol` - Packet values and the packet channel

pub mod color;
pub mod config;
pub mod error;
pub mod math;
pub mod mesh;
pub mod protocol;

// Re-export commonly used types
pub use color::{Highlight, NamedColor};
pub use config::{AlexandriaConfig, MeshSettings};
pub use error::{AlexandriaError, Result};
pub use math::Transform;
pub use mesh::{Mesh, MeshId, MeshRegistry, SharedMeshRegistry};
pub use protocol::{ClientId, ItemAppearance, Packet, PacketChannel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
