use std::{
    collections::HashMap,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use log::{debug, info};

use crate::{
    registry::{descriptor::ObjectDescriptor, error::RegistryError},
    types::ObjectId,
};

/// Observable registry of object descriptors.
///
/// One instance is created per process/session and cloned into every
/// component that needs it; clones share the same descriptors. Components
/// that must react to late registrations hold a `DescriptorSubscription`.
#[derive(Clone, Default)]
pub struct DescriptorRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    descriptors: Vec<Arc<ObjectDescriptor>>,
    index: HashMap<ObjectId, usize>,
    subscribers: Vec<Sender<Arc<ObjectDescriptor>>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a descriptor and notifies every live subscriber.
    pub fn register(
        &self,
        descriptor: ObjectDescriptor,
    ) -> Result<Arc<ObjectDescriptor>, RegistryError> {
        let mut inner = self.lock();
        if inner.index.contains_key(descriptor.id()) {
            return Err(RegistryError::DuplicateId {
                id: descriptor.id().clone(),
            });
        }

        let descriptor = Arc::new(descriptor);
        let position = inner.descriptors.len();
        inner.index.insert(descriptor.id().clone(), position);
        inner.descriptors.push(descriptor.clone());

        let before = inner.subscribers.len();
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(descriptor.clone()).is_ok());
        let pruned = before - inner.subscribers.len();
        if pruned > 0 {
            debug!("pruned {} dropped descriptor subscriber(s)", pruned);
        }

        info!("registered object descriptor {}", descriptor.id());
        Ok(descriptor)
    }

    pub fn get(&self, id: &ObjectId) -> Option<Arc<ObjectDescriptor>> {
        let inner = self.lock();
        inner
            .index
            .get(id)
            .and_then(|position| inner.descriptors.get(*position))
            .cloned()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.lock().index.contains_key(id)
    }

    /// All descriptors, in registration order
    pub fn descriptors(&self) -> Vec<Arc<ObjectDescriptor>> {
        self.lock().descriptors.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().descriptors.is_empty()
    }

    /// Subscribes to registrations. Descriptors registered before this call
    /// are replayed first, so a subscriber never misses one.
    pub fn subscribe(&self) -> DescriptorSubscription {
        let (sender, receiver) = mpsc::channel();
        let mut inner = self.lock();
        for descriptor in &inner.descriptors {
            // receiver is alive in this scope
            let _ = sender.send(descriptor.clone());
        }
        inner.subscribers.push(sender);
        DescriptorSubscription { receiver }
    }
}

pub struct DescriptorSubscription {
    receiver: Receiver<Arc<ObjectDescriptor>>,
}

impl DescriptorSubscription {
    /// Descriptors registered since the last poll
    pub fn poll(&self) -> Vec<Arc<ObjectDescriptor>> {
        self.receiver.try_iter().collect()
    }
}
