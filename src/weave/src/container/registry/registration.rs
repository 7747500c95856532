use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::container::slot::InstanceSlot;
use crate::decorator::DecoratorDescriptor;
use crate::key::ServiceType;
use crate::lifetime::Lifetime;
use crate::provider::Provider;

/// The identity of a [`Registration`], unique in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl Display for RegistrationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "#{}", self.0)
    }
}

/// The identity of a container, unique in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

impl ContainerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a registration builds its instance.
#[derive(Clone)]
pub(crate) enum Recipe {
    Provider(Arc<dyn Provider>),
    Decorator(Arc<DecoratorDescriptor>),
}

/// An implementation bound to a provider and a lifetime, owned by one
/// container.
///
/// A [`Registration`] is immutable. Clones share the registration, and so
/// share its singleton instance: registering one [`Registration`] for
/// several contracts makes them all resolve to the same object.
#[derive(Clone)]
pub struct Registration {
    inner: Arc<RegistrationInner>,
}

struct RegistrationInner {
    id: RegistrationId,
    container: ContainerId,
    implementation_type: ServiceType,
    recipe: Recipe,
    lifetime: Lifetime,
    slot: InstanceSlot,
}

impl Registration {
    pub(crate) fn new(
        container: ContainerId,
        implementation_type: ServiceType,
        recipe: Recipe,
        lifetime: Lifetime,
    ) -> Self {
        Self {
            inner: Arc::new(RegistrationInner {
                id: RegistrationId::next(),
                container,
                implementation_type,
                recipe,
                lifetime,
                slot: InstanceSlot::new(),
            }),
        }
    }

    pub fn id(&self) -> RegistrationId {
        self.inner.id
    }

    pub fn container(&self) -> ContainerId {
        self.inner.container
    }

    pub fn implementation_type(&self) -> &ServiceType {
        &self.inner.implementation_type
    }

    pub fn lifetime(&self) -> &Lifetime {
        &self.inner.lifetime
    }

    pub(crate) fn recipe(&self) -> &Recipe {
        &self.inner.recipe
    }

    pub(crate) fn slot(&self) -> &InstanceSlot {
        &self.inner.slot
    }
}

impl Debug for Registration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Registration")
            .field("id", &self.inner.id)
            .field("implementation_type", &self.inner.implementation_type)
            .field("lifetime", &self.inner.lifetime)
            .finish_non_exhaustive()
    }
}

/// A source of registrations for an implementation pattern.
///
/// A closed template always yields the same registration. An open one
/// yields one registration per closed implementation type, so that a
/// singleton pattern gives one instance per closed type.
pub(crate) enum RegistrationTemplate {
    Closed(Registration),
    Open {
        container: ContainerId,
        provider: Arc<dyn Provider>,
        lifetime: Lifetime,
        closed: Mutex<HashMap<ServiceType, Registration>>,
    },
}

impl RegistrationTemplate {
    pub(crate) fn open(container: ContainerId, provider: Arc<dyn Provider>, lifetime: Lifetime) -> Self {
        Self::Open {
            container,
            provider,
            lifetime,
            closed: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn registration_for(&self, implementation_type: &ServiceType) -> Registration {
        match self {
            Self::Closed(registration) => registration.clone(),
            Self::Open {
                container,
                provider,
                lifetime,
                closed,
            } => closed
                .lock()
                .entry(implementation_type.clone())
                .or_insert_with(|| {
                    Registration::new(
                        *container,
                        implementation_type.clone(),
                        Recipe::Provider(Arc::clone(provider)),
                        lifetime.clone(),
                    )
                })
                .clone(),
        }
    }
}
