use replica_shared::{HostObject, Instant, LobbyMessage, ObjectId, PatchOp, PeerId, Revision, Value};

use crate::{
    engine::ReplicationEngine,
    rate_limiter::RateLimiters,
    transport::{MessageTarget, Outbox},
    user::{ParticipantId, Participants},
    HostError,
};

/// Everything a command handler may touch while it runs. Handlers reach
/// host objects and peers only through this, never through the transport.
pub struct CommandContext<'a> {
    sender: &'a PeerId,
    now: Instant,
    engine: &'a mut ReplicationEngine,
    outbox: &'a mut Outbox,
    participants: &'a mut Participants,
    limiters: &'a mut RateLimiters,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        sender: &'a PeerId,
        now: Instant,
        engine: &'a mut ReplicationEngine,
        outbox: &'a mut Outbox,
        participants: &'a mut Participants,
        limiters: &'a mut RateLimiters,
    ) -> Self {
        Self {
            sender,
            now,
            engine,
            outbox,
            participants,
            limiters,
        }
    }

    pub fn sender(&self) -> &PeerId {
        self.sender
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// The participant the sender is bound to, if any
    pub fn participant(&self) -> Option<&ParticipantId> {
        self.participants.participant_of(self.sender)
    }

    pub fn participants(&self) -> &Participants {
        self.participants
    }

    /// Binds the sender to `participant`
    pub fn bind_participant(&mut self, participant: ParticipantId) {
        self.participants.bind(self.sender.clone(), participant);
    }

    pub fn engine(&self) -> &ReplicationEngine {
        self.engine
    }

    pub fn object_as<T: HostObject>(&self, id: &ObjectId) -> Result<&T, HostError> {
        self.engine.object_as::<T>(id)
    }

    pub fn apply_patch(&mut self, id: &ObjectId, ops: Vec<PatchOp>) -> Result<Revision, HostError> {
        self.engine.apply_patch(id, ops, self.outbox)
    }

    pub fn mutate<T, F>(&mut self, id: &ObjectId, build: F) -> Result<Revision, HostError>
    where
        T: HostObject,
        F: FnOnce(&T) -> Result<Vec<PatchOp>, HostError>,
    {
        self.engine.mutate::<T, F>(id, self.outbox, build)
    }

    /// Single egress point for command results and broadcasts
    pub fn send_lobby_message(&mut self, kind: &str, body: Value, target: MessageTarget) {
        let message = LobbyMessage::new(kind, body);
        self.outbox.send_to(&target, self.engine.peers(), message);
    }

    /// Sends a message to the sender only
    pub fn reply(&mut self, kind: &str, body: Value) {
        self.reply_message(LobbyMessage::new(kind, body));
    }

    pub fn reply_message(&mut self, message: LobbyMessage) {
        self.outbox.send(self.sender, message);
    }

    /// Counts one call against the named limiter. An unknown limiter denies.
    pub fn allow(&mut self, limiter: &str, key: &str) -> bool {
        self.limiters
            .allow_at(limiter, key, self.now)
            .unwrap_or(false)
    }
}
