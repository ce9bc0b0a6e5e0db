//! Mesh entities
//!
//! A mesh is one phantom object, drawn by an invisible armor stand wearing
//! an item. Interpolated meshes move the armor stand directly and let the
//! client smooth its motion. Non-interpolated meshes mount it on an
//! invisible carrier and only ever teleport the carrier, which the client
//! renders without the armor stand's interpolation lag.
//!
//! Each client either has a mesh spawned or not; that state is membership in
//! the mesh's visible set. Setters only talk to that set and never change it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::trace;
use uuid::Uuid;

use crate::color::Highlight;
use crate::config::MeshSettings;
use crate::math::Transform;
use crate::protocol::{ClientId, EntityHandle, ItemAppearance, Packet, PacketChannel};

use super::packets;

/// Registry-issued identifier of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub Uuid);

impl MeshId {
    /// Random mesh id
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Computes which clients should currently see a mesh
pub type VisibilityQuery = Box<dyn Fn(MeshId) -> HashSet<ClientId> + Send>;

/// How a mesh maps onto protocol entities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshVariant {
    /// The body is positioned directly
    Interpolated,
    /// The body rides `carrier`, which is positioned instead
    NonInterpolated {
        carrier: EntityHandle,
        carrier_uuid: Uuid,
    },
}

/// Result of one visibility refresh of a mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityChange {
    pub spawned: usize,
    pub removed: usize,
}

/// A phantom object synchronized to a set of clients
pub struct Mesh {
    id: MeshId,
    body: EntityHandle,
    entity_uuid: Uuid,
    variant: MeshVariant,
    appearance: ItemAppearance,
    transform: Transform,
    highlight: Highlight,
    visibility: VisibilityQuery,
    last_visible: HashSet<ClientId>,
    channel: Arc<dyn PacketChannel>,
    settings: Arc<MeshSettings>,
}

impl Mesh {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: MeshId,
        body: EntityHandle,
        variant: MeshVariant,
        appearance: ItemAppearance,
        transform: Transform,
        visibility: VisibilityQuery,
        channel: Arc<dyn PacketChannel>,
        settings: Arc<MeshSettings>,
    ) -> Self {
        Self {
            id,
            body,
            entity_uuid: Uuid::new_v4(),
            variant,
            appearance,
            transform,
            highlight: Highlight::Off,
            visibility,
            last_visible: HashSet::new(),
            channel,
            settings,
        }
    }

    // ============ Accessors ============

    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Handle of the armor stand
    pub fn body_handle(&self) -> EntityHandle {
        self.body
    }

    /// Handle of the carrier, for non-interpolated meshes
    pub fn carrier_handle(&self) -> Option<EntityHandle> {
        match self.variant {
            MeshVariant::Interpolated => None,
            MeshVariant::NonInterpolated { carrier, .. } => Some(carrier),
        }
    }

    /// Handle the teleport packets are addressed to
    pub fn positioned_handle(&self) -> EntityHandle {
        self.carrier_handle().unwrap_or(self.body)
    }

    /// Every protocol handle this mesh occupies
    pub fn handles(&self) -> Vec<EntityHandle> {
        match self.variant {
            MeshVariant::Interpolated => vec![self.body],
            MeshVariant::NonInterpolated { carrier, .. } => vec![self.body, carrier],
        }
    }

    /// UUID of the body, also its entry in highlight teams
    pub fn entity_uuid(&self) -> Uuid {
        self.entity_uuid
    }

    pub fn variant(&self) -> MeshVariant {
        self.variant
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self.variant, MeshVariant::Interpolated)
    }

    pub fn appearance(&self) -> &ItemAppearance {
        &self.appearance
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn highlight(&self) -> Highlight {
        self.highlight
    }

    /// Clients the mesh is currently spawned for
    pub fn visible_clients(&self) -> &HashSet<ClientId> {
        &self.last_visible
    }

    pub fn is_visible_to(&self, client: ClientId) -> bool {
        self.last_visible.contains(&client)
    }

    fn y_offset(&self) -> f64 {
        self.settings.y_offset(self.is_interpolated())
    }

    // ============ Mutation ============

    /// Change the item. Sends an equipment update to every visible client.
    pub fn set_appearance(&mut self, appearance: ItemAppearance) {
        self.appearance = appearance;
        let packet = packets::equipment(self.body, &self.appearance);
        self.broadcast(std::slice::from_ref(&packet));
    }

    /// Move the mesh. Sends a teleport and a head rotation to every visible
    /// client.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        let packets = packets::transform_update(
            self.positioned_handle(),
            self.body,
            self.transform.body_position(self.y_offset()),
            self.transform.head_rotation(),
        );
        self.broadcast(&packets);
    }

    /// Change the highlight. Sends team and flag updates to every visible
    /// client.
    ///
    /// The protocol carries one team per entity, so every client sees the
    /// same highlight.
    pub fn set_highlight(&mut self, highlight: Highlight) {
        self.highlight = highlight;
        let packets = packets::highlight_update(
            self.body,
            self.entity_uuid,
            highlight,
            &self.settings.team_prefix,
        );
        self.broadcast(&packets);
    }

    /// Toggle the glowing flag for some of the clients that see this mesh.
    ///
    /// Clients that don't currently see the mesh are skipped. The next
    /// [`Mesh::set_highlight`] overrides this for everyone.
    pub fn set_glowing(&self, state: bool, clients: impl IntoIterator<Item = ClientId>) {
        let packet = packets::glowing(self.body, state);
        for client in clients {
            if self.last_visible.contains(&client) {
                self.channel.send_packet(client, &packet);
            }
        }
    }

    /// Replace the visibility query, effective from the next tick
    pub fn set_visibility_query<F>(&mut self, query: F)
    where
        F: Fn(MeshId) -> HashSet<ClientId> + Send + 'static,
    {
        self.visibility = Box::new(query);
    }

    // ============ Visibility ============

    /// Full packet sequence showing this mesh to a client
    pub fn spawn_packets(&self) -> Vec<Packet> {
        let position = self.transform.body_position(self.y_offset());
        let mut sequence = packets::body_spawn(
            self.body,
            self.entity_uuid,
            position,
            self.transform.head_rotation(),
            &self.appearance,
            self.highlight,
            &self.settings.team_prefix,
        );
        if let MeshVariant::NonInterpolated {
            carrier,
            carrier_uuid,
        } = self.variant
        {
            sequence.extend(packets::carrier_spawn(
                carrier,
                carrier_uuid,
                self.body,
                position,
            ));
        }
        sequence
    }

    /// Packet sequence hiding this mesh from a client
    pub fn remove_packets(&self) -> Vec<Packet> {
        vec![packets::destroy(&self.handles())]
    }

    /// Show the mesh to clients that don't already see it.
    ///
    /// Returns how many clients were spawned for. Unless the visibility
    /// query also includes them, the next tick removes them again.
    pub fn spawn(&mut self, clients: impl IntoIterator<Item = ClientId>) -> usize {
        let sequence = self.spawn_packets();
        let mut spawned = 0;
        for client in clients {
            if self.last_visible.insert(client) {
                self.channel.send_packets(client, &sequence);
                spawned += 1;
            }
        }
        spawned
    }

    /// Hide the mesh from clients that currently see it.
    ///
    /// Returns how many clients were removed for.
    pub fn remove(&mut self, clients: impl IntoIterator<Item = ClientId>) -> usize {
        let sequence = self.remove_packets();
        let mut removed = 0;
        for client in clients {
            if self.last_visible.remove(&client) {
                self.channel.send_packets(client, &sequence);
                removed += 1;
            }
        }
        removed
    }

    /// Hide the mesh from every client that sees it
    pub(crate) fn remove_all(&mut self) -> usize {
        let sequence = self.remove_packets();
        let removed = self.last_visible.len();
        for client in self.last_visible.drain() {
            self.channel.send_packets(client, &sequence);
        }
        removed
    }

    /// Re-run the visibility query and spawn/remove for the difference
    pub(crate) fn refresh_visibility(&mut self) -> VisibilityChange {
        let visible = (self.visibility)(self.id);

        let leaving: Vec<ClientId> = self.last_visible.difference(&visible).copied().collect();
        let entering: Vec<ClientId> = visible.difference(&self.last_visible).copied().collect();

        if !leaving.is_empty() {
            let sequence = self.remove_packets();
            for client in &leaving {
                self.channel.send_packets(*client, &sequence);
            }
        }
        if !entering.is_empty() {
            let sequence = self.spawn_packets();
            for client in &entering {
                self.channel.send_packets(*client, &sequence);
            }
        }

        if !leaving.is_empty() || !entering.is_empty() {
            trace!(
                mesh = %self.id,
                spawned = entering.len(),
                removed = leaving.len(),
                visible = visible.len(),
                "Mesh visibility changed"
            );
        }

        self.last_visible = visible;
        VisibilityChange {
            spawned: entering.len(),
            removed: leaving.len(),
        }
    }

    fn broadcast(&self, packets: &[Packet]) {
        for client in &self.last_visible {
            self.channel.send_packets(*client, packets);
        }
    }
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mesh")
            .field("id", &self.id)
            .field("body", &self.body)
            .field("entity_uuid", &self.entity_uuid)
            .field("variant", &self.variant)
            .field("appearance", &self.appearance)
            .field("transform", &self.transform)
            .field("highlight", &self.highlight)
            .field("last_visible", &self.last_visible)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::color::NamedColor;
    use crate::protocol::{EntityKind, RecordingChannel};

    fn interpolated(channel: &Arc<RecordingChannel>) -> Mesh {
        Mesh::new(
            MeshId::random(),
            EntityHandle(1),
            MeshVariant::Interpolated,
            ItemAppearance::new("minecraft:stick"),
            Transform::from_translation(DVec3::new(0.0, 10.0, 0.0)),
            Box::new(|_| HashSet::new()),
            channel.clone(),
            Arc::new(MeshSettings::default()),
        )
    }

    fn non_interpolated(channel: &Arc<RecordingChannel>) -> Mesh {
        Mesh::new(
            MeshId::random(),
            EntityHandle(1),
            MeshVariant::NonInterpolated {
                carrier: EntityHandle(2),
                carrier_uuid: Uuid::new_v4(),
            },
            ItemAppearance::new("minecraft:stick"),
            Transform::from_translation(DVec3::new(0.0, 10.0, 0.0)),
            Box::new(|_| HashSet::new()),
            channel.clone(),
            Arc::new(MeshSettings::default()),
        )
    }

    #[test]
    fn test_handle_roles() {
        let channel = Arc::new(RecordingChannel::new());

        let mesh = interpolated(&channel);
        assert_eq!(mesh.positioned_handle(), EntityHandle(1));
        assert_eq!(mesh.carrier_handle(), None);
        assert_eq!(mesh.handles(), vec![EntityHandle(1)]);

        let mesh = non_interpolated(&channel);
        assert_eq!(mesh.positioned_handle(), EntityHandle(2));
        assert_eq!(mesh.carrier_handle(), Some(EntityHandle(2)));
        assert_eq!(mesh.handles(), vec![EntityHandle(1), EntityHandle(2)]);
    }

    #[test]
    fn test_spawn_position_uses_variant_offset() {
        let channel = Arc::new(RecordingChannel::new());
        let settings = MeshSettings::default();

        let sequence = interpolated(&channel).spawn_packets();
        let Packet::SpawnEntity { position, .. } = &sequence[0] else {
            panic!("first packet must spawn the body");
        };
        assert_eq!(position.y, 10.0 - settings.interpolated_y_offset);

        let sequence = non_interpolated(&channel).spawn_packets();
        let Packet::SpawnEntity { position, .. } = &sequence[0] else {
            panic!("first packet must spawn the body");
        };
        assert_eq!(position.y, 10.0 - settings.non_interpolated_y_offset);
    }

    #[test]
    fn test_non_interpolated_spawn_mounts_body_on_carrier() {
        let channel = Arc::new(RecordingChannel::new());
        let mesh = non_interpolated(&channel);
        let sequence = mesh.spawn_packets();

        assert_eq!(sequence.len(), 6);
        assert!(matches!(
            sequence[3],
            Packet::SpawnEntity {
                handle: EntityHandle(2),
                kind: EntityKind::AreaEffectCloud,
                ..
            }
        ));
        assert_eq!(sequence[4].target(), Some(EntityHandle(2)));
        assert_eq!(
            sequence[5],
            Packet::SetPassengers {
                vehicle: EntityHandle(2),
                passengers: vec![EntityHandle(1)],
            }
        );
    }

    #[test]
    fn test_explicit_spawn_and_remove_are_idempotent() {
        let channel = Arc::new(RecordingChannel::new());
        let mut mesh = interpolated(&channel);
        let client = ClientId::random();

        assert_eq!(mesh.spawn([client]), 1);
        assert_eq!(mesh.spawn([client]), 0);
        assert!(mesh.is_visible_to(client));
        assert_eq!(channel.deliveries_to(client).len(), 1);

        assert_eq!(mesh.remove([client]), 1);
        assert_eq!(mesh.remove([client]), 0);
        assert!(!mesh.is_visible_to(client));
        assert_eq!(
            channel.deliveries_to(client).last().map(|d| d.packets.clone()),
            Some(vec![packets::destroy(&[EntityHandle(1)])])
        );
    }

    #[test]
    fn test_setters_reach_only_visible_clients() {
        let channel = Arc::new(RecordingChannel::new());
        let mut mesh = interpolated(&channel);
        let seen = ClientId::random();
        let unseen = ClientId::random();
        mesh.spawn([seen]);
        channel.clear();

        mesh.set_appearance(ItemAppearance::new("minecraft:diamond"));
        mesh.set_highlight(NamedColor::Red.into());
        mesh.set_transform(Transform::from_translation(DVec3::ONE));

        assert_eq!(channel.deliveries_to(seen).len(), 3);
        assert!(channel.deliveries_to(unseen).is_empty());
        assert_eq!(mesh.visible_clients().len(), 1);
        assert_eq!(mesh.highlight(), Highlight::Color(NamedColor::Red));
    }

    #[test]
    fn test_non_interpolated_transform_targets() {
        let channel = Arc::new(RecordingChannel::new());
        let mut mesh = non_interpolated(&channel);
        let client = ClientId::random();
        mesh.spawn([client]);
        channel.clear();

        mesh.set_transform(Transform::from_translation(DVec3::ONE));

        let packets = channel.packets_to(client);
        assert_eq!(packets.len(), 2);
        assert!(matches!(
            packets[0],
            Packet::EntityTeleport {
                handle: EntityHandle(2),
                ..
            }
        ));
        assert!(matches!(
            packets[1],
            Packet::EntityMetadata {
                handle: EntityHandle(1),
                ..
            }
        ));
    }

    #[test]
    fn test_set_glowing_skips_hidden_clients() {
        let channel = Arc::new(RecordingChannel::new());
        let mut mesh = interpolated(&channel);
        let seen = ClientId::random();
        let unseen = ClientId::random();
        mesh.spawn([seen]);
        channel.clear();

        mesh.set_glowing(true, [seen, unseen]);

        assert_eq!(channel.packets_to(seen), vec![packets::glowing(EntityHandle(1), true)]);
        assert!(channel.packets_to(unseen).is_empty());
    }

    #[test]
    fn test_refresh_visibility_diffs() {
        let channel = Arc::new(RecordingChannel::new());
        let mut mesh = interpolated(&channel);
        let a = ClientId::random();
        let b = ClientId::random();

        mesh.set_visibility_query(move |_| HashSet::from([a, b]));
        assert_eq!(
            mesh.refresh_visibility(),
            VisibilityChange {
                spawned: 2,
                removed: 0
            }
        );

        mesh.set_visibility_query(move |_| HashSet::from([b]));
        assert_eq!(
            mesh.refresh_visibility(),
            VisibilityChange {
                spawned: 0,
                removed: 1
            }
        );
        assert_eq!(mesh.visible_clients(), &HashSet::from([b]));

        // Unchanged set sends nothing
        channel.clear();
        assert_eq!(mesh.refresh_visibility(), VisibilityChange::default());
        assert_eq!(channel.delivery_count(), 0);
    }
}
