use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::container::producer::InstanceProducer;
use crate::container::registry::RegistryError;
use crate::key::ServiceType;

type ProducerMap = HashMap<ServiceType, Arc<InstanceProducer>>;

/// The mapping from closed contracts to producers.
///
/// The map itself is immutable: every write copies it and swaps the shared
/// reference, so lookups never block.
pub(crate) struct RegistrationStore {
    producers: ArcSwap<ProducerMap>,
}

impl RegistrationStore {
    pub(crate) fn new() -> Self {
        Self {
            producers: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Inserts `producer` for its service type. Returns the producer it
    /// replaced, if overriding is allowed.
    pub(crate) fn register(
        &self,
        producer: Arc<InstanceProducer>,
        allow_overriding: bool,
    ) -> Result<Option<Arc<InstanceProducer>>, RegistryError> {
        let service_type = producer.service_type().clone();
        loop {
            let current = self.producers.load_full();
            if current.contains_key(&service_type) && !allow_overriding {
                return Err(RegistryError::DuplicateRegistration { service_type });
            }
            let mut next = ProducerMap::clone(&current);
            let replaced = next.insert(service_type.clone(), Arc::clone(&producer));
            let previous = self.producers.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&*previous, &current) {
                return Ok(replaced);
            }
        }
    }

    /// Inserts `producer` unless another producer was installed first, and
    /// returns the winner.
    pub(crate) fn install(&self, producer: Arc<InstanceProducer>) -> Arc<InstanceProducer> {
        if let Some(existing) = self.lookup(producer.service_type()) {
            return existing;
        }
        let mut installed = Arc::clone(&producer);
        self.producers.rcu(|current| {
            if let Some(existing) = current.get(producer.service_type()) {
                installed = Arc::clone(existing);
                Arc::clone(current)
            } else {
                let mut next = ProducerMap::clone(current);
                next.insert(producer.service_type().clone(), Arc::clone(&producer));
                installed = Arc::clone(&producer);
                Arc::new(next)
            }
        });
        installed
    }

    pub(crate) fn lookup(&self, service_type: &ServiceType) -> Option<Arc<InstanceProducer>> {
        self.producers.load().get(service_type).cloned()
    }

    pub(crate) fn contains(&self, service_type: &ServiceType) -> bool {
        self.producers.load().contains_key(service_type)
    }

    /// Returns every producer, ordered by registration.
    pub(crate) fn producers(&self) -> Vec<Arc<InstanceProducer>> {
        let mut producers: Vec<_> = self.producers.load().values().cloned().collect();
        producers.sort_by_key(|producer| producer.registration().id());
        producers
    }
}
