use std::{collections::BTreeMap, time::Duration};

use log::debug;

use replica_client::{ClientConfig, ClientEvent, PeerSession, ValueMirror};
use replica_server::{DispatchOutcome, HostConfig, HostRouter};
use replica_shared::{DescriptorRegistry, Instant, LobbyMessage, ObjectId, PeerId, Value};

use crate::{local_transport::LocalTransport, test_models};

const MAX_EXCHANGE_ROUNDS: usize = 32;

/// One host and any number of peer sessions wired through a
/// `LocalTransport`, driven by a manual clock
pub struct TestLobby {
    pub host: HostRouter,
    transport: LocalTransport,
    registry: DescriptorRegistry,
    peers: BTreeMap<PeerId, PeerSession>,
    client_config: ClientConfig,
    now: Instant,
}

impl TestLobby {
    /// Lobby with the demo objects, sync models, limiters and roster binding
    pub fn new() -> Self {
        let registry = DescriptorRegistry::new();
        if let Err(err) = test_models::register_descriptors(&registry) {
            panic!("demo descriptors failed to register: {}", err);
        }
        let config = HostConfig {
            roster: Some(test_models::roster_binding()),
            ..HostConfig::default()
        };
        let mut lobby = Self::with_config(config, registry);
        for model in test_models::sync_models() {
            if let Err(err) = lobby.host.add_model(model) {
                panic!("demo sync model failed to register: {}", err);
            }
        }
        for (name, limit) in test_models::rate_limits() {
            lobby.host.add_rate_limiter(name, limit);
        }
        lobby
    }

    pub fn with_config(config: HostConfig, registry: DescriptorRegistry) -> Self {
        let transport = LocalTransport::new();
        let host = HostRouter::new(config, registry.clone(), transport.clone());
        Self {
            host,
            transport,
            registry,
            peers: BTreeMap::new(),
            client_config: ClientConfig::default(),
            now: Instant::now(),
        }
    }

    pub fn with_client_config(mut self, client_config: ClientConfig) -> Self {
        self.client_config = client_config;
        self
    }

    // Clock

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn advance(&mut self, duration: Duration) {
        self.now += duration;
    }

    // Wiring

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &LocalTransport {
        &self.transport
    }

    /// Opens a link, connects the peer on the host and starts its session
    pub fn join(&mut self, peer: &str) -> PeerId {
        let peer = PeerId::from(peer);
        self.transport.open(&peer);
        self.host.connect_peer(&peer);
        let session = PeerSession::start(self.client_config.clone(), self.registry.clone(), self.now);
        self.peers.insert(peer.clone(), session);
        peer
    }

    pub fn disconnect(&mut self, peer: &PeerId) {
        self.host.disconnect_peer(peer);
        self.transport.forget(peer);
        if let Some(mut session) = self.peers.remove(peer) {
            session.leave();
        }
    }

    pub fn peer(&self, peer: &PeerId) -> &PeerSession {
        match self.peers.get(peer) {
            Some(session) => session,
            None => panic!("no peer {} in lobby", peer),
        }
    }

    pub fn peer_mut(&mut self, peer: &PeerId) -> &mut PeerSession {
        match self.peers.get_mut(peer) {
            Some(session) => session,
            None => panic!("no peer {} in lobby", peer),
        }
    }

    pub fn peer_value(&self, peer: &PeerId, id: &ObjectId) -> Option<Value> {
        self.peers
            .get(peer)?
            .mirror_as::<ValueMirror>(id)
            .filter(|mirror| mirror.revision() > 0)
            .map(|mirror| mirror.value().clone())
    }

    pub fn host_value(&self, id: &ObjectId) -> Option<Value> {
        self.host.engine().get_snapshot(id).map(|snapshot| snapshot.value)
    }

    pub fn send_command(&mut self, peer: &PeerId, kind: &str, body: Value) {
        self.peer_mut(peer).send_command(kind, body);
    }

    pub fn take_events(&mut self, peer: &PeerId) -> Vec<ClientEvent> {
        self.peer_mut(peer).take_events()
    }

    /// Domain messages a peer received, in order
    pub fn lobby_messages(&mut self, peer: &PeerId) -> Vec<LobbyMessage> {
        self.take_events(peer)
            .into_iter()
            .filter_map(|event| match event {
                ClientEvent::Lobby(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    // Pumping

    /// Hands everything in flight from the host to `peer`'s session
    pub fn host_to_peer(&mut self, peer: &PeerId) -> usize {
        let messages = self.transport.deliver(peer);
        let count = messages.len();
        if let Some(session) = self.peers.get_mut(peer) {
            for message in messages {
                session.receive(message, self.now);
            }
        }
        count
    }

    /// Sends everything `peer` queued to the host, as encoded bytes
    pub fn peer_to_host(&mut self, peer: &PeerId) -> Vec<DispatchOutcome> {
        let Some(session) = self.peers.get_mut(peer) else {
            return Vec::new();
        };
        let mut outcomes = Vec::new();
        for message in session.take_outgoing() {
            let bytes = match message.to_bytes() {
                Ok(bytes) => bytes,
                Err(err) => panic!("peer {} produced an unencodable message: {}", peer, err),
            };
            outcomes.push(self.host.receive_bytes(peer, &bytes, self.now));
        }
        outcomes
    }

    /// Pumps both directions until nothing moves
    pub fn exchange(&mut self) -> Vec<DispatchOutcome> {
        let peers: Vec<PeerId> = self.peers.keys().cloned().collect();
        let mut outcomes = Vec::new();
        for round in 0..MAX_EXCHANGE_ROUNDS {
            self.host.flush();
            let mut moved = 0;
            for peer in &peers {
                let sent = self.peer_to_host(peer);
                moved += sent.len();
                outcomes.extend(sent);
                moved += self.host_to_peer(peer);
            }
            if moved == 0 {
                debug!("lobby quiet after {} round(s)", round);
                break;
            }
        }
        outcomes
    }

    /// Lets every session run its stall and timeout checks
    pub fn update(&mut self) {
        self.host.sync_descriptors();
        for session in self.peers.values_mut() {
            session.update(self.now);
        }
    }
}

impl Default for TestLobby {
    fn default() -> Self {
        Self::new()
    }
}
