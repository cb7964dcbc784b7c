use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info, warn};

use replica_shared::{
    ClientObject, DescriptorRegistry, DescriptorSubscription, Instant, LobbyMessage,
    ObjectDescriptor, ObjectId, ObjectMessage, Revision, Timer, Value,
};

use crate::{
    client_config::ClientConfig,
    events::ClientEvent,
    mirrors::ValueMirror,
    reconciler::{PatchOutcome, ReadyStep, Reconciler},
};

/// One peer's view of a hosted session: a mirror per object, fed through
/// the Reconciler, plus the requests and acks that keep them in step with
/// the host.
///
/// Nothing here touches a socket. Inbound messages are handed to
/// [`PeerSession::receive`]; outbound ones are collected with
/// [`PeerSession::take_outgoing`].
pub struct PeerSession {
    config: ClientConfig,
    registry: DescriptorRegistry,
    subscription: DescriptorSubscription,
    reconciler: Reconciler,
    mirrors: HashMap<ObjectId, Box<dyn ClientObject>>,
    outgoing: Vec<LobbyMessage>,
    events: Vec<ClientEvent>,
    timeout_timer: Timer,
    active: bool,
}

impl PeerSession {
    /// Joins a session: builds a mirror for every registered descriptor and
    /// requests the ones flagged `request_on_start`
    pub fn start(config: ClientConfig, registry: DescriptorRegistry, now: Instant) -> Self {
        let mut session = Self {
            reconciler: Reconciler::new(config.reconciler()),
            timeout_timer: Timer::new(config.session_timeout, now),
            subscription: registry.subscribe(),
            config,
            registry,
            mirrors: HashMap::new(),
            outgoing: Vec::new(),
            events: Vec::new(),
            active: true,
        };
        session.adopt_descriptors(now);
        session
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    // Descriptors

    fn adopt_descriptors(&mut self, now: Instant) {
        for descriptor in self.subscription.poll() {
            self.adopt(&descriptor, now);
        }
    }

    fn adopt(&mut self, descriptor: &ObjectDescriptor, now: Instant) {
        let id = descriptor.id();
        self.reconciler.track(id, descriptor.stall_timeout());
        if !self.mirrors.contains_key(id) {
            let mirror = match descriptor.client_factory() {
                Some(factory) => factory(id),
                None => Box::new(ValueMirror::new()),
            };
            self.mirrors.insert(id.clone(), mirror);
        }
        if descriptor.wants_request_on_start() {
            self.reconciler.mark_resync(id, now);
            self.send_object(ObjectMessage::Request {
                id: id.clone(),
                since_rev: None,
            });
        }
    }

    // Incoming

    pub fn receive(&mut self, message: LobbyMessage, now: Instant) {
        if !self.active {
            debug!("session left, ignoring '{}'", message.kind);
            return;
        }
        self.timeout_timer.reset(now);

        if !message.is_object_protocol() {
            self.events.push(ClientEvent::Lobby(message));
            return;
        }

        let object_message = match ObjectMessage::from_lobby(&message) {
            Ok(object_message) => object_message,
            Err(err) => {
                warn!("dropping '{}' from host: {}", message.kind, err);
                return;
            }
        };

        // late registrations may have arrived since the last update
        self.adopt_descriptors(now);

        match object_message {
            ObjectMessage::Replace { id, rev, value } => {
                self.ensure_mirror(&id);
                if !self.reconciler.apply_replace(&id, rev, value) {
                    debug!("ignored stale replace for {} at {}", id, rev);
                }
            }
            ObjectMessage::Patch { id, rev, ops } => {
                self.ensure_mirror(&id);
                if self.reconciler.apply_patch(&id, rev, ops, now) == PatchOutcome::Rejected {
                    self.resync(&id, now);
                }
            }
            ObjectMessage::Request { id, .. } | ObjectMessage::Ack { id, .. } => {
                debug!("ignoring '{}' for {} from host", message.kind, id);
            }
        }

        self.deliver_ready(now);
    }

    /// Objects seen before their descriptor get a plain value mirror
    fn ensure_mirror(&mut self, id: &ObjectId) {
        if !self.mirrors.contains_key(id) {
            debug!("no descriptor for {}, mirroring it as a plain value", id);
            self.mirrors
                .insert(id.clone(), Box::new(ValueMirror::new()));
        }
    }

    /// Hands reconciled steps to the mirrors and acknowledges the highest
    /// contiguous revision of every object that advanced
    fn deliver_ready(&mut self, now: Instant) {
        let mut advanced: BTreeMap<ObjectId, Revision> = BTreeMap::new();
        let mut failed: HashSet<ObjectId> = HashSet::new();

        for step in self.reconciler.take_ready() {
            let id = step.id().clone();
            if failed.contains(&id) {
                continue;
            }
            let Some(mirror) = self.mirrors.get_mut(&id) else {
                continue;
            };
            let rev = step.rev();
            match step {
                ReadyStep::Replace { value, .. } => mirror.on_replace(rev, value),
                ReadyStep::Patch { ops, .. } => {
                    if let Err(err) = mirror.on_patch(rev, &ops) {
                        warn!(
                            "mirror {} could not apply revision {}: {}, resyncing",
                            id, rev, err
                        );
                        failed.insert(id);
                        continue;
                    }
                }
            }
            self.events.push(ClientEvent::Updated {
                id: id.clone(),
                rev,
            });
            advanced.insert(id, rev);
        }

        for id in &failed {
            advanced.remove(id);
            self.reconciler.reset(id);
            self.resync(id, now);
        }
        for (id, _) in advanced {
            let rev = self.reconciler.revision(&id);
            self.send_object(ObjectMessage::Ack { id, rev });
        }
    }

    // Recovery

    /// Asks the host for whatever `id` is missing, at most once per stall
    /// timeout
    fn resync(&mut self, id: &ObjectId, now: Instant) {
        if !self.reconciler.note_resync(id, now) {
            debug!("resync for {} already in flight", id);
            return;
        }
        let held = self.reconciler.revision(id);
        info!("requesting {} since revision {}", id, held);
        self.send_object(ObjectMessage::Request {
            id: id.clone(),
            since_rev: (held > 0).then_some(held),
        });
    }

    /// Picks up late descriptors, turns stalled gaps into resync requests
    /// and leaves the session once the host has gone quiet
    pub fn update(&mut self, now: Instant) {
        if !self.active {
            return;
        }
        if self.timeout_timer.ringing(now) {
            warn!(
                "nothing heard from host for {:?}, leaving session",
                self.timeout_timer.duration()
            );
            self.leave();
            self.events.push(ClientEvent::SessionTimedOut);
            return;
        }

        self.adopt_descriptors(now);

        let mut stalled = Vec::new();
        self.reconciler
            .check_stalls(now, |id, _| stalled.push(id.clone()));
        for id in stalled {
            self.resync(&id, now);
        }
    }

    /// Discards every mirror; nothing further is sent or received
    pub fn leave(&mut self) {
        if !self.active {
            return;
        }
        info!("leaving session with {} mirror(s)", self.mirrors.len());
        self.active = false;
        self.mirrors.clear();
        self.reconciler.clear();
        self.outgoing.clear();
    }

    // Outgoing

    /// Queues a domain command such as `chat:send:request`
    pub fn send_command(&mut self, kind: &str, body: Value) {
        if !self.active {
            warn!("session left, dropping command '{}'", kind);
            return;
        }
        self.outgoing.push(LobbyMessage::new(kind, body));
    }

    /// Explicitly asks for an object's current state. Always sent; automatic
    /// resyncs for `id` then hold off for a stall timeout.
    pub fn request(&mut self, id: &ObjectId, now: Instant) {
        self.reconciler.mark_resync(id, now);
        let held = self.reconciler.revision(id);
        self.send_object(ObjectMessage::Request {
            id: id.clone(),
            since_rev: (held > 0).then_some(held),
        });
    }

    fn send_object(&mut self, message: ObjectMessage) {
        if !self.active {
            return;
        }
        match message.to_lobby() {
            Ok(lobby) => self.outgoing.push(lobby),
            Err(err) => warn!("cannot encode {}: {}", message.kind(), err),
        }
    }

    pub fn take_outgoing(&mut self) -> Vec<LobbyMessage> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn take_events(&mut self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.events)
    }

    // Mirrors

    pub fn revision(&self, id: &ObjectId) -> Revision {
        self.reconciler.revision(id)
    }

    pub fn mirror(&self, id: &ObjectId) -> Option<&dyn ClientObject> {
        self.mirrors.get(id).map(|mirror| mirror.as_ref())
    }

    pub fn mirror_as<T: ClientObject>(&self, id: &ObjectId) -> Option<&T> {
        self.mirrors.get(id)?.as_any().downcast_ref::<T>()
    }

    pub fn mirror_ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.mirrors.keys()
    }
}
