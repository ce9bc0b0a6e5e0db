//! Packet channel
//!
//! The capability the mesh layer needs from its host: deliver a sequence of
//! packets to one client, and hand out entity handles that don't collide
//! with any other live entity.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::packets::{ClientId, EntityHandle, Packet};

/// Default first handle of a [`HandleAllocator`].
///
/// High enough to stay clear of the handles a host server hands out to its
/// own entities.
pub const PHANTOM_HANDLE_BASE: u32 = 1 << 30;

/// Transport for mesh packets
///
/// Sends are fire-and-forget: a client that disconnected mid-send is the
/// implementation's concern, never the caller's.
pub trait PacketChannel: Send + Sync {
    /// Allocate an entity handle unique among all live entities of every
    /// client
    fn allocate_entity_handle(&self) -> EntityHandle;

    /// Deliver a packet sequence to one client, in order
    fn send_packets(&self, client: ClientId, packets: &[Packet]);

    /// Deliver a single packet to one client
    fn send_packet(&self, client: ClientId, packet: &Packet) {
        self.send_packets(client, std::slice::from_ref(packet));
    }
}

/// Monotonic entity handle counter
#[derive(Debug)]
pub struct HandleAllocator {
    next: AtomicU32,
}

impl HandleAllocator {
    /// Create an allocator handing out handles from `start` upwards
    pub fn starting_at(start: u32) -> Self {
        Self {
            next: AtomicU32::new(start),
        }
    }

    /// Allocate the next handle
    pub fn next(&self) -> EntityHandle {
        EntityHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::starting_at(PHANTOM_HANDLE_BASE)
    }
}

/// One `send_packets` call as seen by a [`RecordingChannel`]
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub client: ClientId,
    pub packets: Vec<Packet>,
}

/// In-memory channel that records every delivery
#[derive(Debug, Default)]
pub struct RecordingChannel {
    handles: HandleAllocator,
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// All deliveries so far, oldest first
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    /// Take and clear the recorded deliveries
    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut *self.deliveries.lock())
    }

    /// Deliveries addressed to one client
    pub fn deliveries_to(&self, client: ClientId) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .iter()
            .filter(|delivery| delivery.client == client)
            .cloned()
            .collect()
    }

    /// Packets addressed to one client, flattened across deliveries
    pub fn packets_to(&self, client: ClientId) -> Vec<Packet> {
        self.deliveries_to(client)
            .into_iter()
            .flat_map(|delivery| delivery.packets)
            .collect()
    }

    /// Number of recorded deliveries
    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().len()
    }

    /// Forget recorded deliveries
    pub fn clear(&self) {
        self.deliveries.lock().clear();
    }
}

impl PacketChannel for RecordingChannel {
    fn allocate_entity_handle(&self) -> EntityHandle {
        self.handles.next()
    }

    fn send_packets(&self, client: ClientId, packets: &[Packet]) {
        self.deliveries.lock().push(Delivery {
            client,
            packets: packets.to_vec(),
        });
    }
}

/// Channel that only logs what it would send
#[derive(Debug, Default)]
pub struct TracingChannel {
    handles: HandleAllocator,
    log_packets: bool,
}

impl TracingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every packet at debug level, not just a per-delivery summary
    pub fn with_packet_logging(mut self, enabled: bool) -> Self {
        self.log_packets = enabled;
        self
    }
}

impl PacketChannel for TracingChannel {
    fn allocate_entity_handle(&self) -> EntityHandle {
        self.handles.next()
    }

    fn send_packets(&self, client: ClientId, packets: &[Packet]) {
        trace!(client = %client, count = packets.len(), "Sending packets");
        if self.log_packets {
            for packet in packets {
                debug!(client = %client, packet = packet.name(), ?packet, "Packet");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_allocator_is_monotonic() {
        let allocator = HandleAllocator::starting_at(10);
        assert_eq!(allocator.next(), EntityHandle(10));
        assert_eq!(allocator.next(), EntityHandle(11));
        assert_eq!(allocator.next(), EntityHandle(12));
    }

    #[test]
    fn test_default_allocator_base() {
        let allocator = HandleAllocator::default();
        assert_eq!(allocator.next(), EntityHandle(PHANTOM_HANDLE_BASE));
    }

    #[test]
    fn test_recording_channel() {
        let channel = RecordingChannel::new();
        let a = ClientId::random();
        let b = ClientId::random();
        let packet = Packet::DestroyEntities {
            handles: vec![EntityHandle(1)],
        };

        channel.send_packet(a, &packet);
        channel.send_packets(b, &[packet.clone(), packet.clone()]);

        assert_eq!(channel.delivery_count(), 2);
        assert_eq!(channel.packets_to(a), vec![packet.clone()]);
        assert_eq!(channel.packets_to(b).len(), 2);

        let taken = channel.take();
        assert_eq!(taken.len(), 2);
        assert_eq!(channel.delivery_count(), 0);
    }
}
