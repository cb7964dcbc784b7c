use std::{fmt, sync::Arc, time::Duration};

use crate::{
    messages::object_message::ObjectMessage,
    object::{client_object::ClientObject, host_object::HostObject, replica::Replica},
    registry::{
        ack_policy::{AckPolicy, DEFAULT_LOG_RETENTION, DEFAULT_STALL_TIMEOUT},
        error::RegistryError,
    },
    types::{ObjectId, PeerId, Value},
};

pub type HostFactory =
    Arc<dyn Fn(&HostFactoryContext<'_>) -> Result<HostSeed, RegistryError> + Send + Sync>;
pub type ClientFactory = Arc<dyn Fn(&ObjectId) -> Box<dyn ClientObject> + Send + Sync>;
pub type PeerConnectHook =
    Arc<dyn Fn(&PeerId, &dyn HostObject) -> Vec<ObjectMessage> + Send + Sync>;

/// What a host factory produces: the (unpublished) object and the value it
/// is first published with.
pub struct HostSeed {
    pub object: Box<dyn HostObject>,
    pub initial: Value,
}

/// Read-only view of host objects that have already been constructed
pub trait HostObjectLookup {
    fn host_object(&self, id: &ObjectId) -> Option<&dyn HostObject>;
}

pub struct HostFactoryContext<'a> {
    descriptor: &'a ObjectDescriptor,
    objects: &'a dyn HostObjectLookup,
}

impl<'a> HostFactoryContext<'a> {
    pub fn new(descriptor: &'a ObjectDescriptor, objects: &'a dyn HostObjectLookup) -> Self {
        Self {
            descriptor,
            objects,
        }
    }

    pub fn id(&self) -> &ObjectId {
        self.descriptor.id()
    }

    /// A fresh, unpublished replica configured from the descriptor
    pub fn replica(&self) -> Replica {
        Replica::new(
            self.descriptor.id().clone(),
            *self.descriptor.ack_policy(),
            self.descriptor.log_retention(),
        )
    }

    /// Another host object this one was declared to depend on
    pub fn dependency(&self, id: &ObjectId) -> Result<&'a dyn HostObject, RegistryError> {
        self.objects
            .host_object(id)
            .ok_or_else(|| RegistryError::MissingDependency {
                id: self.descriptor.id().clone(),
                dependency: id.clone(),
            })
    }
}

/// Behavior when a new peer connects to the host
#[derive(Clone, Default)]
pub enum PeerConnectAction {
    #[default]
    Nothing,
    SendSnapshot,
    Custom(PeerConnectHook),
}

impl fmt::Debug for PeerConnectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerConnectAction::Nothing => f.write_str("Nothing"),
            PeerConnectAction::SendSnapshot => f.write_str("SendSnapshot"),
            PeerConnectAction::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Registration record binding an object id to its construction and policy
#[derive(Clone)]
pub struct ObjectDescriptor {
    id: ObjectId,
    host_factory: HostFactory,
    depends_on: Vec<ObjectId>,
    ack_policy: AckPolicy,
    log_retention: usize,
    stall_timeout: Duration,
    on_peer_connect: PeerConnectAction,
    client_factory: Option<ClientFactory>,
    request_on_start: bool,
}

impl ObjectDescriptor {
    pub fn new<F>(id: impl Into<ObjectId>, host_factory: F) -> Self
    where
        F: Fn(&HostFactoryContext<'_>) -> Result<HostSeed, RegistryError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            host_factory: Arc::new(host_factory),
            depends_on: Vec::new(),
            ack_policy: AckPolicy::default(),
            log_retention: DEFAULT_LOG_RETENTION,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            on_peer_connect: PeerConnectAction::default(),
            client_factory: None,
            request_on_start: true,
        }
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ObjectId>,
    {
        self.depends_on.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_ack_policy(mut self, ack_policy: AckPolicy) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    pub fn with_log_retention(mut self, log_retention: usize) -> Self {
        self.log_retention = log_retention.max(1);
        self
    }

    pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
        self.stall_timeout = stall_timeout;
        self
    }

    pub fn on_peer_connect(mut self, action: PeerConnectAction) -> Self {
        self.on_peer_connect = action;
        self
    }

    pub fn with_client_factory<F>(mut self, client_factory: F) -> Self
    where
        F: Fn(&ObjectId) -> Box<dyn ClientObject> + Send + Sync + 'static,
    {
        self.client_factory = Some(Arc::new(client_factory));
        self
    }

    pub fn request_on_start(mut self, request_on_start: bool) -> Self {
        self.request_on_start = request_on_start;
        self
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn dependencies(&self) -> &[ObjectId] {
        &self.depends_on
    }

    pub fn ack_policy(&self) -> &AckPolicy {
        &self.ack_policy
    }

    pub fn log_retention(&self) -> usize {
        self.log_retention
    }

    pub fn stall_timeout(&self) -> Duration {
        self.stall_timeout
    }

    pub fn peer_connect_action(&self) -> &PeerConnectAction {
        &self.on_peer_connect
    }

    pub fn client_factory(&self) -> Option<&ClientFactory> {
        self.client_factory.as_ref()
    }

    pub fn wants_request_on_start(&self) -> bool {
        self.request_on_start
    }

    /// Runs the host factory, checking that the product carries this id
    pub fn build_host(&self, objects: &dyn HostObjectLookup) -> Result<HostSeed, RegistryError> {
        let context = HostFactoryContext::new(self, objects);
        let seed = (self.host_factory)(&context)?;
        if seed.object.id() != &self.id {
            return Err(RegistryError::IdMismatch {
                expected: self.id.clone(),
                actual: seed.object.id().clone(),
            });
        }
        Ok(seed)
    }
}

impl fmt::Debug for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDescriptor")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .field("ack_policy", &self.ack_policy)
            .field("log_retention", &self.log_retention)
            .field("stall_timeout", &self.stall_timeout)
            .field("on_peer_connect", &self.on_peer_connect)
            .field("request_on_start", &self.request_on_start)
            .finish_non_exhaustive()
    }
}
