use std::{collections::HashMap, mem, sync::Arc};

use log::{debug, info, warn};

use replica_shared::{
    DescriptorRegistry, DescriptorSubscription, HostObject, Instant, LobbyMessage, ObjectDescriptor,
    ObjectId, ObjectMessage, PatchOp, PeerConnectAction, PeerId, RegistryError, Revision, Value,
    OBJECT_ACK, OBJECT_PATCH, OBJECT_REPLACE, OBJECT_REQUEST,
};

use crate::{
    engine::ReplicationEngine,
    rate_limiter::{RateLimitConfig, RateLimiters},
    router::{CommandContext, CommandDispatcher, DispatchOutcome, DropReason, SyncModel},
    server::server_config::{HostConfig, RosterBinding},
    transport::{MessageTarget, Outbox, PeerTransport},
    user::{ParticipantId, Participants},
    HostError,
};

/// Limiter guarding `object:request`, keyed per peer
pub const REQUEST_LIMITER: &str = "object:request";

/// The host's front door: builds host objects from the descriptor registry,
/// routes every inbound message to a command or the object protocol, and
/// keeps peer/participant bookkeeping.
pub struct HostRouter {
    config: HostConfig,
    registry: DescriptorRegistry,
    subscription: DescriptorSubscription,
    // descriptors waiting for a dependency to be built
    pending: Vec<Arc<ObjectDescriptor>>,
    descriptors: HashMap<ObjectId, Arc<ObjectDescriptor>>,
    engine: ReplicationEngine,
    outbox: Outbox,
    dispatcher: CommandDispatcher,
    participants: Participants,
    limiters: RateLimiters,
}

impl HostRouter {
    /// Create a new HostRouter and build every descriptor registered so far
    pub fn new<T: PeerTransport + 'static>(
        config: HostConfig,
        registry: DescriptorRegistry,
        transport: T,
    ) -> Self {
        let mut limiters = RateLimiters::new();
        limiters.insert(REQUEST_LIMITER, config.request_limit);

        let mut router = Self {
            outbox: Outbox::new(Box::new(transport), config.outbox),
            subscription: registry.subscribe(),
            config,
            registry,
            pending: Vec::new(),
            descriptors: HashMap::new(),
            engine: ReplicationEngine::new(),
            dispatcher: CommandDispatcher::new(),
            participants: Participants::new(),
            limiters,
        };
        router.sync_descriptors();
        router
    }

    // Descriptors

    /// Picks up late registrations and builds every descriptor whose
    /// dependencies now exist. Returns how many objects were built.
    pub fn sync_descriptors(&mut self) -> usize {
        self.pending.extend(self.subscription.poll());

        let mut built = 0;
        loop {
            let mut progress = false;
            for descriptor in mem::take(&mut self.pending) {
                match self.build(&descriptor) {
                    Ok(()) => {
                        built += 1;
                        progress = true;
                    }
                    Err(HostError::Registry(RegistryError::MissingDependency {
                        dependency, ..
                    })) => {
                        debug!(
                            "object {} waits for dependency {}",
                            descriptor.id(),
                            dependency
                        );
                        self.pending.push(descriptor);
                    }
                    Err(err) => warn!("could not build object {}: {}", descriptor.id(), err),
                }
            }
            if !progress || self.pending.is_empty() {
                break;
            }
        }
        built
    }

    fn build(&mut self, descriptor: &Arc<ObjectDescriptor>) -> Result<(), HostError> {
        let id = descriptor.id().clone();
        if self.engine.contains(&id) {
            return Err(HostError::DuplicateObject { id });
        }
        if let Some(dependency) = descriptor
            .dependencies()
            .iter()
            .find(|dependency| !self.engine.contains(dependency))
        {
            return Err(RegistryError::MissingDependency {
                id,
                dependency: dependency.clone(),
            }
            .into());
        }

        let seed = descriptor.build_host(&self.engine)?;
        self.engine.insert(seed.object)?;
        self.engine.initialize(&id, seed.initial, &mut self.outbox)?;
        self.descriptors.insert(id, descriptor.clone());
        Ok(())
    }

    /// Descriptors still waiting for a dependency
    pub fn pending_descriptors(&self) -> Vec<ObjectId> {
        self.pending
            .iter()
            .map(|descriptor| descriptor.id().clone())
            .collect()
    }

    // Sync models

    pub fn add_model(&mut self, model: SyncModel) -> Result<(), HostError> {
        self.dispatcher.add_model(model)
    }

    pub fn add_rate_limiter(&mut self, name: impl Into<String>, config: RateLimitConfig) {
        self.limiters.insert(name, config);
    }

    // Peers

    /// Registers a peer and runs each object's peer-connect action
    pub fn connect_peer(&mut self, peer: &PeerId) {
        if !self.engine.connect_peer(peer) {
            debug!("peer {} is already connected", peer);
            return;
        }
        info!("peer {} connected", peer);

        for id in self.engine.object_ids() {
            let Some(descriptor) = self.descriptors.get(id) else {
                continue;
            };
            match descriptor.peer_connect_action() {
                PeerConnectAction::Nothing => {}
                PeerConnectAction::SendSnapshot => {
                    self.engine.send_snapshot(peer, id, &mut self.outbox);
                }
                PeerConnectAction::Custom(hook) => {
                    if let Some(object) = self.engine.object(id) {
                        for message in hook(peer, object) {
                            self.outbox.send_object(peer, &message);
                        }
                    }
                }
            }
        }
    }

    /// Forgets the peer's ack state and queued messages, and removes its
    /// participant from the roster
    pub fn disconnect_peer(&mut self, peer: &PeerId) {
        if !self.engine.disconnect_peer(peer) {
            return;
        }
        self.outbox.drop_peer(peer);
        self.limiters.forget(REQUEST_LIMITER, &request_key(peer));
        info!("peer {} disconnected", peer);

        let Some(participant) = self.participants.unbind_peer(peer) else {
            return;
        };
        if let Some(binding) = self.config.roster.clone() {
            if let Err(err) = self.remove_from_roster(&binding, &participant) {
                warn!(
                    "could not remove {} from roster {}: {}",
                    participant, binding.object, err
                );
            }
        }
    }

    /// Republishes the roster without `participant` as one `set` step
    fn remove_from_roster(
        &mut self,
        binding: &RosterBinding,
        participant: &ParticipantId,
    ) -> Result<Option<Revision>, HostError> {
        let object = self
            .engine
            .object(&binding.object)
            .ok_or_else(|| HostError::UnknownObject {
                id: binding.object.clone(),
            })?;
        let mut roster = object.replica().value().clone();
        let Some(entries) = roster
            .get_mut(binding.field.as_str())
            .and_then(Value::as_array_mut)
        else {
            return Ok(None);
        };

        let identity = participant.to_value();
        let before = entries.len();
        entries.retain(|entry| entry.get(binding.key.as_str()) != Some(&identity));
        if entries.len() == before {
            return Ok(None);
        }

        let rev = self
            .engine
            .apply_patch(&binding.object, vec![PatchOp::set(roster)], &mut self.outbox)?;
        info!(
            "removed {} from roster {}, now at revision {}",
            participant, binding.object, rev
        );
        Ok(Some(rev))
    }

    pub fn bind_participant(&mut self, peer: &PeerId, participant: impl Into<ParticipantId>) {
        self.participants.bind(peer.clone(), participant.into());
    }

    // Inbound

    pub fn receive_bytes(&mut self, peer: &PeerId, bytes: &[u8], now: Instant) -> DispatchOutcome {
        match LobbyMessage::from_bytes(bytes) {
            Ok(message) => self.receive(peer, message, now),
            Err(err) => {
                debug!("undecodable message from {}: {}", peer, err);
                DispatchOutcome::Dropped(DropReason::Malformed)
            }
        }
    }

    /// Offers the message to the sync-model commands first, then to the
    /// built-in object protocol
    pub fn receive(&mut self, peer: &PeerId, message: LobbyMessage, now: Instant) -> DispatchOutcome {
        if !self.engine.is_connected(peer) {
            debug!("dropping '{}' from unknown peer {}", message.kind, peer);
            return DispatchOutcome::Dropped(DropReason::UnknownPeer);
        }
        self.limiters.maybe_prune(now);

        if self.dispatcher.claims(&message.kind) {
            let mut context = CommandContext::new(
                peer,
                now,
                &mut self.engine,
                &mut self.outbox,
                &mut self.participants,
                &mut self.limiters,
            );
            if let Some(outcome) = self
                .dispatcher
                .dispatch(&message.kind, &message.body, &mut context)
            {
                return outcome;
            }
        }

        match message.kind.as_str() {
            OBJECT_REQUEST | OBJECT_ACK => self.receive_object(peer, &message, now),
            OBJECT_REPLACE | OBJECT_PATCH => {
                warn!("peer {} tried to publish '{}'", peer, message.kind);
                DispatchOutcome::Dropped(DropReason::NotPermitted)
            }
            _ => {
                debug!("nothing handles '{}' from {}", message.kind, peer);
                DispatchOutcome::Dropped(DropReason::UnknownKind)
            }
        }
    }

    fn receive_object(
        &mut self,
        peer: &PeerId,
        message: &LobbyMessage,
        now: Instant,
    ) -> DispatchOutcome {
        let object_message = match ObjectMessage::from_lobby(message) {
            Ok(object_message) => object_message,
            Err(err) => {
                debug!("malformed '{}' from {}: {}", message.kind, peer, err);
                return DispatchOutcome::Dropped(DropReason::Malformed);
            }
        };

        match object_message {
            ObjectMessage::Request { id, since_rev } => {
                let allowed = self
                    .limiters
                    .allow_at(REQUEST_LIMITER, &request_key(peer), now);
                if allowed != Some(true) {
                    debug!("request for {} from {} rate limited", id, peer);
                    return DispatchOutcome::Dropped(DropReason::RateLimited);
                }
                self.engine
                    .serve_request(peer, &id, since_rev, &mut self.outbox);
                DispatchOutcome::Handled
            }
            ObjectMessage::Ack { id, rev } => {
                self.engine.acknowledge(peer, &id, rev);
                DispatchOutcome::Handled
            }
            ObjectMessage::Replace { .. } | ObjectMessage::Patch { .. } => {
                DispatchOutcome::Dropped(DropReason::NotPermitted)
            }
        }
    }

    // Outbound

    pub fn send_lobby_message(&mut self, kind: &str, body: Value, target: MessageTarget) {
        let message = LobbyMessage::new(kind, body);
        self.outbox.send_to(&target, self.engine.peers(), message);
    }

    pub fn apply_patch(&mut self, id: &ObjectId, ops: Vec<PatchOp>) -> Result<Revision, HostError> {
        self.engine.apply_patch(id, ops, &mut self.outbox)
    }

    pub fn mutate<T, F>(&mut self, id: &ObjectId, build: F) -> Result<Revision, HostError>
    where
        T: HostObject,
        F: FnOnce(&T) -> Result<Vec<PatchOp>, HostError>,
    {
        self.engine.mutate::<T, F>(id, &mut self.outbox, build)
    }

    /// Retries queued messages for peers whose channel has opened
    pub fn flush(&mut self) {
        self.outbox.flush();
    }

    // Accessors

    pub fn engine(&self) -> &ReplicationEngine {
        &self.engine
    }

    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn pending_messages(&self, peer: &PeerId) -> usize {
        self.outbox.pending_len(peer)
    }

    pub fn rate_limiters(&self) -> &RateLimiters {
        &self.limiters
    }
}

fn request_key(peer: &PeerId) -> String {
    format!("request:{}", peer)
}
