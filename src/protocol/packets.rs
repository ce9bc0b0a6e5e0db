//! Packet definitions module
//!
//! Typed values for the protocol packets the mesh layer emits. Encoding them
//! to bytes is the transport's job; the mesh layer only decides which packets
//! go to which client, and in what order.

use std::fmt;

use bitflags::bitflags;
use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata index of the shared entity flags byte
pub const ENTITY_FLAGS_INDEX: u8 = 0;

/// Metadata index of the carrier's reset field (area effect cloud radius)
pub const CARRIER_RESET_INDEX: u8 = 8;

/// Metadata index of the armor stand flags byte
pub const ARMOR_STAND_FLAGS_INDEX: u8 = 15;

/// Metadata index of the armor stand head pose
pub const HEAD_ROTATION_INDEX: u8 = 16;

/// Numeric handle the protocol uses to address an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle(pub u32);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A connected client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Random client id
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ClientId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Entity types a mesh is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Visual body, renders the item on its head
    ArmorStand,
    /// Invisible carrier the body rides when not interpolated
    AreaEffectCloud,
}

/// Equipment slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Feet,
    Legs,
    Chest,
    Head,
}

/// Item-like visual descriptor of a mesh
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemAppearance {
    /// Namespaced item key, e.g. `minecraft:diamond_sword`
    pub item: String,
    /// Stack size
    #[serde(default = "default_count")]
    pub count: u8,
    /// Resource pack model selector
    #[serde(default)]
    pub custom_model_data: Option<i32>,
}

fn default_count() -> u8 {
    1
}

impl ItemAppearance {
    /// Single item without a custom model
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            count: 1,
            custom_model_data: None,
        }
    }

    /// Set the custom model data
    pub fn with_custom_model_data(mut self, data: i32) -> Self {
        self.custom_model_data = Some(data);
        self
    }
}

bitflags! {
    /// Shared entity flags (metadata index 0)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u8 {
        const ON_FIRE = 0x01;
        const CROUCHING = 0x02;
        const SPRINTING = 0x08;
        const SWIMMING = 0x10;
        const INVISIBLE = 0x20;
        const GLOWING = 0x40;
        const FLYING = 0x80;
    }
}

bitflags! {
    /// Armor stand flags (metadata index 15)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArmorStandFlags: u8 {
        const SMALL = 0x01;
        const HAS_ARMS = 0x04;
        const NO_BASE_PLATE = 0x08;
        /// Zero-size hitbox, no interaction
        const MARKER = 0x10;
    }
}

/// Value of a metadata entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetadataValue {
    Byte(u8),
    Float(f32),
    /// Euler angles in degrees
    Rotation(Vec3),
}

/// One indexed metadata field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetadataValue,
}

impl MetadataEntry {
    pub fn entity_flags(flags: EntityFlags) -> Self {
        Self {
            index: ENTITY_FLAGS_INDEX,
            value: MetadataValue::Byte(flags.bits()),
        }
    }

    pub fn armor_stand_flags(flags: ArmorStandFlags) -> Self {
        Self {
            index: ARMOR_STAND_FLAGS_INDEX,
            value: MetadataValue::Byte(flags.bits()),
        }
    }

    pub fn head_rotation(rotation: Vec3) -> Self {
        Self {
            index: HEAD_ROTATION_INDEX,
            value: MetadataValue::Rotation(rotation),
        }
    }

    /// Zeroes the carrier's size so it neither renders nor drifts
    pub fn carrier_reset() -> Self {
        Self {
            index: CARRIER_RESET_INDEX,
            value: MetadataValue::Float(0.0),
        }
    }
}

/// Outgoing protocol packets used by meshes
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// Spawn a non-living entity
    SpawnEntity {
        handle: EntityHandle,
        uuid: Uuid,
        kind: EntityKind,
        position: DVec3,
    },
    /// Remove entities from the client
    DestroyEntities { handles: Vec<EntityHandle> },
    /// Update indexed metadata fields
    EntityMetadata {
        handle: EntityHandle,
        entries: Vec<MetadataEntry>,
    },
    /// Move an entity to an absolute position
    EntityTeleport {
        handle: EntityHandle,
        position: DVec3,
        on_ground: bool,
    },
    /// Set an equipment slot
    EntityEquipment {
        handle: EntityHandle,
        slot: EquipmentSlot,
        item: ItemAppearance,
    },
    /// Replace the passengers of a vehicle
    SetPassengers {
        vehicle: EntityHandle,
        passengers: Vec<EntityHandle>,
    },
    /// Add entries (entity UUIDs or player names) to a team
    TeamAddEntities { team: String, entries: Vec<String> },
}

impl Packet {
    /// Packet name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Packet::SpawnEntity { .. } => "spawn_entity",
            Packet::DestroyEntities { .. } => "destroy_entities",
            Packet::EntityMetadata { .. } => "entity_metadata",
            Packet::EntityTeleport { .. } => "entity_teleport",
            Packet::EntityEquipment { .. } => "entity_equipment",
            Packet::SetPassengers { .. } => "set_passengers",
            Packet::TeamAddEntities { .. } => "team_add_entities",
        }
    }

    /// Entity the packet is addressed to, if it addresses exactly one
    pub fn target(&self) -> Option<EntityHandle> {
        match self {
            Packet::SpawnEntity { handle, .. }
            | Packet::EntityMetadata { handle, .. }
            | Packet::EntityTeleport { handle, .. }
            | Packet::EntityEquipment { handle, .. } => Some(*handle),
            Packet::SetPassengers { vehicle, .. } => Some(*vehicle),
            Packet::DestroyEntities { .. } | Packet::TeamAddEntities { .. } => None,
        }
    }
}
