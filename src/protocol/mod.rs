//! Protocol module
//!
//! Packet values and the channel that delivers them.

pub mod channel;
pub mod packets;

pub use channel::{Delivery, HandleAllocator, PacketChannel, RecordingChannel, TracingChannel};
pub use packets::{
    ArmorStandFlags, ClientId, EntityFlags, EntityHandle, EntityKind, EquipmentSlot,
    ItemAppearance, MetadataEntry, MetadataValue, Packet,
};
