//! Mesh packet construction
//!
//! Builders shared by both mesh variants. None of them know which variant
//! they serve: the caller decides which handle is the body, and which one is
//! positioned (the body itself, or the carrier it rides).

use glam::{DVec3, Vec3};
use uuid::Uuid;

use crate::color::{Highlight, NamedColor};
use crate::protocol::{
    ArmorStandFlags, EntityFlags, EntityHandle, EntityKind, EquipmentSlot, ItemAppearance,
    MetadataEntry, Packet,
};

/// Equipment slot the mesh item is rendered in
pub const APPEARANCE_SLOT: EquipmentSlot = EquipmentSlot::Head;

/// Flags byte of a body: always invisible, glowing on request
pub fn body_flags(glowing: bool) -> EntityFlags {
    if glowing {
        EntityFlags::INVISIBLE | EntityFlags::GLOWING
    } else {
        EntityFlags::INVISIBLE
    }
}

/// Everything a client needs to render a body.
///
/// Spawn, flags + marker + head pose, item, then the highlight team if the
/// mesh is highlighted.
pub fn body_spawn(
    body: EntityHandle,
    entity_uuid: Uuid,
    position: DVec3,
    head_rotation: Vec3,
    appearance: &ItemAppearance,
    highlight: Highlight,
    team_prefix: &str,
) -> Vec<Packet> {
    let mut packets = Vec::with_capacity(4);
    packets.push(Packet::SpawnEntity {
        handle: body,
        uuid: entity_uuid,
        kind: EntityKind::ArmorStand,
        position,
    });
    packets.push(Packet::EntityMetadata {
        handle: body,
        entries: vec![
            MetadataEntry::entity_flags(body_flags(highlight.is_glowing())),
            MetadataEntry::armor_stand_flags(ArmorStandFlags::MARKER),
            MetadataEntry::head_rotation(head_rotation),
        ],
    });
    packets.push(equipment(body, appearance));
    if let Some(color) = highlight.color() {
        packets.push(team_membership(entity_uuid, color, team_prefix));
    }
    packets
}

/// Carrier spawn, reset, and the body mounted on it
pub fn carrier_spawn(
    carrier: EntityHandle,
    carrier_uuid: Uuid,
    body: EntityHandle,
    position: DVec3,
) -> Vec<Packet> {
    vec![
        Packet::SpawnEntity {
            handle: carrier,
            uuid: carrier_uuid,
            kind: EntityKind::AreaEffectCloud,
            position,
        },
        Packet::EntityMetadata {
            handle: carrier,
            entries: vec![MetadataEntry::carrier_reset()],
        },
        Packet::SetPassengers {
            vehicle: carrier,
            passengers: vec![body],
        },
    ]
}

/// Move `positioned` and turn the head of `rotated`
pub fn transform_update(
    positioned: EntityHandle,
    rotated: EntityHandle,
    position: DVec3,
    head_rotation: Vec3,
) -> Vec<Packet> {
    vec![
        Packet::EntityTeleport {
            handle: positioned,
            position,
            on_ground: false,
        },
        Packet::EntityMetadata {
            handle: rotated,
            entries: vec![MetadataEntry::head_rotation(head_rotation)],
        },
    ]
}

pub fn equipment(body: EntityHandle, appearance: &ItemAppearance) -> Packet {
    Packet::EntityEquipment {
        handle: body,
        slot: APPEARANCE_SLOT,
        item: appearance.clone(),
    }
}

/// Put the entity into the team that renders `color`
pub fn team_membership(entity_uuid: Uuid, color: NamedColor, team_prefix: &str) -> Packet {
    Packet::TeamAddEntities {
        team: color.team_name(team_prefix),
        entries: vec![entity_uuid.to_string()],
    }
}

/// Packets applying a highlight change to an already spawned body
pub fn highlight_update(
    body: EntityHandle,
    entity_uuid: Uuid,
    highlight: Highlight,
    team_prefix: &str,
) -> Vec<Packet> {
    let mut packets = Vec::with_capacity(2);
    if let Some(color) = highlight.color() {
        packets.push(team_membership(entity_uuid, color, team_prefix));
    }
    packets.push(glowing(body, highlight.is_glowing()));
    packets
}

pub fn glowing(body: EntityHandle, state: bool) -> Packet {
    Packet::EntityMetadata {
        handle: body,
        entries: vec![MetadataEntry::entity_flags(body_flags(state))],
    }
}

pub fn destroy(handles: &[EntityHandle]) -> Packet {
    Packet::DestroyEntities {
        handles: handles.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::protocol::MetadataValue;

    #[test]
    fn test_body_flags() {
        assert_eq!(body_flags(false), EntityFlags::INVISIBLE);
        assert_eq!(body_flags(true).bits(), 0x60);
    }

    #[test]
    fn test_body_spawn_without_highlight() {
        let uuid = Uuid::new_v4();
        let packets = body_spawn(
            EntityHandle(1),
            uuid,
            DVec3::ZERO,
            Vec3::ZERO,
            &ItemAppearance::new("minecraft:stick"),
            Highlight::Off,
            "t_",
        );

        assert_eq!(packets.len(), 3);
        assert_eq!(
            packets[0],
            Packet::SpawnEntity {
                handle: EntityHandle(1),
                uuid,
                kind: EntityKind::ArmorStand,
                position: DVec3::ZERO,
            }
        );
        let Packet::EntityMetadata { entries, .. } = &packets[1] else {
            panic!("expected metadata, got {:?}", packets[1]);
        };
        assert_eq!(entries[0].value, MetadataValue::Byte(0x20));
        assert_eq!(entries[1].value, MetadataValue::Byte(0x10));
        assert_eq!(entries[2].index, 16);
        assert_eq!(packets[2].name(), "entity_equipment");
    }

    #[test]
    fn test_body_spawn_with_highlight_joins_team() {
        let uuid = Uuid::new_v4();
        let packets = body_spawn(
            EntityHandle(1),
            uuid,
            DVec3::ZERO,
            Vec3::ZERO,
            &ItemAppearance::new("minecraft:stick"),
            Highlight::Color(NamedColor::Aqua),
            "t_",
        );

        assert_eq!(packets.len(), 4);
        let Packet::EntityMetadata { entries, .. } = &packets[1] else {
            panic!("expected metadata, got {:?}", packets[1]);
        };
        assert_eq!(entries[0].value, MetadataValue::Byte(0x60));
        assert_eq!(
            packets[3],
            Packet::TeamAddEntities {
                team: "t_aqua".to_string(),
                entries: vec![uuid.to_string()],
            }
        );
    }

    #[test]
    fn test_transform_update_roles() {
        let packets = transform_update(EntityHandle(2), EntityHandle(1), DVec3::X, Vec3::Y);
        assert_eq!(packets[0].target(), Some(EntityHandle(2)));
        assert_eq!(packets[1].target(), Some(EntityHandle(1)));
    }

    #[test]
    fn test_highlight_update_off_only_clears_glow() {
        let packets = highlight_update(EntityHandle(1), Uuid::new_v4(), Highlight::Off, "t_");
        assert_eq!(packets, vec![glowing(EntityHandle(1), false)]);
    }
}
