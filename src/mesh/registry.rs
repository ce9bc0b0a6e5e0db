//! Mesh registry
//!
//! Owns every live mesh and refreshes their visibility once per game tick.
//! Each tick, every mesh's visibility query is re-run and diffed against
//! the clients it was last spawned for:
//! - Clients entering the set receive the full spawn sequence
//! - Clients leaving the set receive the removal sequence
//!
//! This is the only place visibility membership changes on its own; mesh
//! setters and explicit spawn/remove calls act on top of it.

use std::collections::hash_map::{self, HashMap};
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::MeshSettings;
use crate::math::Transform;
use crate::protocol::{ClientId, ItemAppearance, PacketChannel};

use super::entity::{Mesh, MeshId, MeshVariant};

/// Summary of one registry tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Meshes refreshed
    pub meshes: usize,
    /// Spawn sequences sent
    pub spawned: usize,
    /// Removal sequences sent
    pub removed: usize,
}

/// Registry of live meshes
pub struct MeshRegistry {
    meshes: HashMap<MeshId, Mesh>,
    channel: Arc<dyn PacketChannel>,
    settings: Arc<MeshSettings>,
    ticks: u64,
}

impl MeshRegistry {
    /// Create an empty registry sending through `channel`
    pub fn new(channel: Arc<dyn PacketChannel>, settings: MeshSettings) -> Self {
        Self {
            meshes: HashMap::new(),
            channel,
            settings: Arc::new(settings),
            ticks: 0,
        }
    }

    /// Settings shared by the registry's meshes
    pub fn settings(&self) -> &MeshSettings {
        &self.settings
    }

    /// Number of ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Mesh id not used by any live mesh
    fn next_mesh_id(&self) -> MeshId {
        let mut id = MeshId::random();
        while self.meshes.contains_key(&id) {
            id = MeshId::random();
        }
        id
    }

    /// Create a mesh.
    ///
    /// No packets are sent: the mesh stays invisible until the next tick
    /// runs `visibility`, or until it is spawned explicitly.
    pub fn create<F>(
        &mut self,
        appearance: ItemAppearance,
        transform: Transform,
        visibility: F,
        interpolated: bool,
    ) -> MeshId
    where
        F: Fn(MeshId) -> HashSet<ClientId> + Send + 'static,
    {
        let id = self.next_mesh_id();
        let body = self.channel.allocate_entity_handle();
        let variant = if interpolated {
            MeshVariant::Interpolated
        } else {
            MeshVariant::NonInterpolated {
                carrier: self.channel.allocate_entity_handle(),
                carrier_uuid: Uuid::new_v4(),
            }
        };

        let mesh = Mesh::new(
            id,
            body,
            variant,
            appearance,
            transform,
            Box::new(visibility),
            self.channel.clone(),
            self.settings.clone(),
        );
        debug!(mesh = %id, body = %body, interpolated, "Created mesh");
        self.meshes.insert(id, mesh);
        id
    }

    /// Detach a mesh from the registry.
    ///
    /// With `send_removal_packets`, every client that currently sees the mesh
    /// is sent the removal sequence before this returns. Returns `None` for
    /// an unknown id.
    pub fn remove(&mut self, id: MeshId, send_removal_packets: bool) -> Option<Mesh> {
        let mut mesh = self.meshes.remove(&id)?;
        let removed = if send_removal_packets {
            mesh.remove_all()
        } else {
            0
        };
        debug!(mesh = %id, removed, "Removed mesh");
        Some(mesh)
    }

    /// Remove every mesh
    pub fn clear(&mut self, send_removal_packets: bool) -> usize {
        let count = self.meshes.len();
        if send_removal_packets {
            for mesh in self.meshes.values_mut() {
                mesh.remove_all();
            }
        }
        self.meshes.clear();
        debug!(count, "Cleared meshes");
        count
    }

    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(&id)
    }

    pub fn get_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(&id)
    }

    pub fn contains(&self, id: MeshId) -> bool {
        self.meshes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Ids of every live mesh, in no particular order
    pub fn ids(&self) -> impl Iterator<Item = MeshId> + '_ {
        self.meshes.keys().copied()
    }

    pub fn iter(&self) -> hash_map::Values<'_, MeshId, Mesh> {
        self.meshes.values()
    }

    pub fn iter_mut(&mut self) -> hash_map::ValuesMut<'_, MeshId, Mesh> {
        self.meshes.values_mut()
    }

    /// Refresh the visibility of every mesh.
    ///
    /// Should be called once per game tick.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;

        let mut report = TickReport {
            tick: self.ticks,
            meshes: self.meshes.len(),
            ..Default::default()
        };
        for mesh in self.meshes.values_mut() {
            let change = mesh.refresh_visibility();
            report.spawned += change.spawned;
            report.removed += change.removed;
        }

        if report.spawned > 0 || report.removed > 0 {
            trace!(
                tick = report.tick,
                meshes = report.meshes,
                spawned = report.spawned,
                removed = report.removed,
                "Mesh visibility refreshed"
            );
        }
        report
    }
}

impl std::fmt::Debug for MeshRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshRegistry")
            .field("meshes", &self.meshes.len())
            .field("settings", &self.settings)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

/// A registry behind one coarse lock, for hosts that touch meshes from more
/// than one thread.
///
/// A tick holds the lock for its whole diff-then-send, so no packets go out
/// for a mesh removed halfway through.
#[derive(Debug, Clone)]
pub struct SharedMeshRegistry {
    inner: Arc<Mutex<MeshRegistry>>,
}

impl SharedMeshRegistry {
    pub fn new(registry: MeshRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    /// Lock the registry
    pub fn lock(&self) -> MutexGuard<'_, MeshRegistry> {
        self.inner.lock()
    }

    /// Run one tick under the lock
    pub fn tick(&self) -> TickReport {
        self.inner.lock().tick()
    }
}
