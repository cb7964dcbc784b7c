use std::collections::{HashMap, VecDeque};

use log::{debug, warn};

use replica_shared::{LobbyMessage, ObjectMessage, PeerId, TransportError};

use super::PeerTransport;

/// Configuration of the per-peer outbound queue
#[derive(Clone, Copy, Debug)]
pub struct OutboxConfig {
    /// Messages held for a peer whose channel is not open. Beyond this the
    /// oldest queued message is dropped.
    pub max_pending_per_peer: usize,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            max_pending_per_peer: 256,
        }
    }
}

/// Who a lobby message goes to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageTarget {
    Peer(PeerId),
    Broadcast,
    BroadcastExcept(PeerId),
}

/// Single egress point of the host. Sending never fails from the caller's
/// point of view: a closed channel queues (bounded), a peer the transport
/// has no link for is skipped, anything else is dropped with a warning.
pub struct Outbox {
    transport: Box<dyn PeerTransport>,
    pending: HashMap<PeerId, VecDeque<LobbyMessage>>,
    config: OutboxConfig,
}

impl Outbox {
    pub fn new(transport: Box<dyn PeerTransport>, config: OutboxConfig) -> Self {
        Self {
            transport,
            pending: HashMap::new(),
            config,
        }
    }

    pub fn send(&mut self, peer: &PeerId, message: LobbyMessage) {
        if self.pending.get(peer).is_some_and(|queue| !queue.is_empty()) {
            // keep per-peer order: earlier messages go first
            self.flush_peer(peer);
            if self.pending.get(peer).is_some_and(|queue| !queue.is_empty()) {
                self.enqueue(peer, message);
                return;
            }
        }

        match self.transport.send(peer, &message) {
            Ok(()) => {}
            Err(TransportError::ChannelNotOpen { .. }) => self.enqueue(peer, message),
            Err(TransportError::UnknownPeer { .. }) => {
                debug!("no link to {}, dropping '{}'", peer, message.kind)
            }
            Err(err) => warn!("dropping '{}' for {}: {}", message.kind, peer, err),
        }
    }

    pub fn send_object(&mut self, peer: &PeerId, message: &ObjectMessage) {
        match message.to_lobby() {
            Ok(lobby) => self.send(peer, lobby),
            Err(err) => warn!("cannot encode {} for {}: {}", message.kind(), peer, err),
        }
    }

    /// Resolves `target` against the currently connected `peers`
    pub fn send_to<'p>(
        &mut self,
        target: &MessageTarget,
        peers: impl Iterator<Item = &'p PeerId>,
        message: LobbyMessage,
    ) {
        match target {
            MessageTarget::Peer(peer) => self.send(peer, message),
            MessageTarget::Broadcast => {
                for peer in peers {
                    self.send(peer, message.clone());
                }
            }
            MessageTarget::BroadcastExcept(excluded) => {
                for peer in peers.filter(|peer| *peer != excluded) {
                    self.send(peer, message.clone());
                }
            }
        }
    }

    /// Retries every queued message whose channel has opened since
    pub fn flush(&mut self) {
        let peers: Vec<PeerId> = self.pending.keys().cloned().collect();
        for peer in peers {
            self.flush_peer(&peer);
        }
    }

    pub fn pending_len(&self, peer: &PeerId) -> usize {
        self.pending.get(peer).map_or(0, VecDeque::len)
    }

    /// Forgets everything queued for a peer that is gone
    pub fn drop_peer(&mut self, peer: &PeerId) {
        if let Some(queue) = self.pending.remove(peer) {
            if !queue.is_empty() {
                debug!("discarding {} queued message(s) for {}", queue.len(), peer);
            }
        }
    }

    fn enqueue(&mut self, peer: &PeerId, message: LobbyMessage) {
        let max_pending = self.config.max_pending_per_peer;
        let queue = self.pending.entry(peer.clone()).or_default();
        while queue.len() >= max_pending.max(1) {
            if let Some(dropped) = queue.pop_front() {
                warn!("outbox for {} is full, dropping '{}'", peer, dropped.kind);
            }
        }
        queue.push_back(message);
    }

    fn flush_peer(&mut self, peer: &PeerId) {
        let Some(queue) = self.pending.get_mut(peer) else {
            return;
        };
        while let Some(message) = queue.front() {
            if !self.transport.is_open(peer) {
                break;
            }
            match self.transport.send(peer, message) {
                Ok(()) => {}
                Err(TransportError::ChannelNotOpen { .. }) => break,
                Err(TransportError::UnknownPeer { .. }) => {
                    debug!("no link to {}, discarding {} queued", peer, queue.len());
                    queue.clear();
                    break;
                }
                Err(err) => warn!("dropping queued '{}' for {}: {}", message.kind, peer, err),
            }
            queue.pop_front();
        }
        if queue.is_empty() {
            self.pending.remove(peer);
        }
    }
}
