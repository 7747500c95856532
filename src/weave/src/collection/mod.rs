//! Sequences of services registered for one contract.

mod resolver;

use std::ops::Index;
use std::slice::Iter;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::container::registry::{Registration, RegistrationTemplate};
use crate::instance::Instance;
use crate::key::{ServiceType, TypeParam};
use crate::lifetime::Lifetime;
use crate::provider::Provider;

pub(crate) use resolver::CollectionPlan;

/// A resolved, read-only sequence of instances.
///
/// Every resolution of a container-controlled collection yields a fresh
/// [`Collection`], while cached elements stay identical across resolutions.
///
/// # Examples
///
/// ```rust
/// # use weave::collection::Collection;
/// # use weave::instance::Instance;
/// # use weave::key::ServiceType;
/// let collection = Collection::new(
///     ServiceType::named("IPlugin"),
///     vec![Instance::new(1u8), Instance::new(2u8)],
/// );
/// assert_eq!(collection.len(), 2);
/// assert_eq!(collection[1].get::<u8>(), Some(&2));
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    service_type: ServiceType,
    elements: Arc<[Instance]>,
}

impl Collection {
    pub fn new(service_type: ServiceType, elements: Vec<Instance>) -> Self {
        Self {
            service_type,
            elements: elements.into(),
        }
    }

    /// The element contract of this collection.
    pub fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> Iter<'_, Instance> {
        self.elements.iter()
    }
}

impl Index<usize> for Collection {
    type Output = Instance;

    fn index(&self, index: usize) -> &Self::Output {
        &self.elements[index]
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Instance;
    type IntoIter = Iter<'a, Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A caller-owned source of collection elements.
///
/// The container reads the elements on every resolution and never caches
/// them. A [`None`] element is reported as a missing one.
pub trait ExternalCollection: Send + Sync + 'static {
    fn elements(&self) -> Vec<Option<Instance>>;
}

impl ExternalCollection for RwLock<Vec<Instance>> {
    fn elements(&self) -> Vec<Option<Instance>> {
        self.read().iter().cloned().map(Some).collect()
    }
}

impl ExternalCollection for RwLock<Vec<Option<Instance>>> {
    fn elements(&self) -> Vec<Option<Instance>> {
        self.read().clone()
    }
}

impl<T: ExternalCollection + ?Sized> ExternalCollection for Arc<T> {
    fn elements(&self) -> Vec<Option<Instance>> {
        T::elements(self)
    }
}

/// One element of a container-controlled collection.
///
/// The implementation may be a pattern over the parameters of the
/// collection contract, in which case the element is closed per requested
/// contract and skipped where it can't be closed.
pub struct Element {
    implementation: ServiceType,
    params: Vec<TypeParam>,
    source: ElementSource,
}

pub(crate) enum ElementSource {
    Provider {
        provider: Arc<dyn Provider>,
        lifetime: Lifetime,
    },
    Registration(Registration),
}

impl Element {
    pub fn new<P: Provider>(implementation: ServiceType, provider: P) -> Self {
        Self {
            implementation,
            params: Vec::new(),
            source: ElementSource::Provider {
                provider: Arc::new(provider),
                lifetime: Lifetime::Transient,
            },
        }
    }

    /// Creates an element sharing an existing registration.
    pub fn registration(registration: Registration) -> Self {
        Self {
            implementation: registration.implementation_type().clone(),
            params: Vec::new(),
            source: ElementSource::Registration(registration),
        }
    }

    /// Sets the lifetime of an element created with [`Element::new`].
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        if let ElementSource::Provider { lifetime: current, .. } = &mut self.source {
            *current = lifetime;
        }
        self
    }

    pub fn param(mut self, param: TypeParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn implementation(&self) -> &ServiceType {
        &self.implementation
    }

    pub(crate) fn into_parts(self) -> (ServiceType, Vec<TypeParam>, ElementSource) {
        (self.implementation, self.params, self.source)
    }
}

/// How a container-controlled collection was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CollectionStyle {
    Types,
    Registrations,
}

pub(crate) struct CollectionElement {
    pub(crate) implementation: ServiceType,
    pub(crate) params: Vec<TypeParam>,
    pub(crate) template: RegistrationTemplate,
}

pub(crate) enum CollectionKind {
    /// Elements owned by the container. The style is unset while the
    /// collection was only appended to.
    Controlled {
        style: Option<CollectionStyle>,
        elements: Vec<CollectionElement>,
    },
    External(Arc<dyn ExternalCollection>),
}

pub(crate) struct CollectionEntry {
    pub(crate) contract: ServiceType,
    pub(crate) kind: CollectionKind,
}

impl CollectionKind {
    pub(crate) fn style_name(&self) -> &'static str {
        match self {
            Self::Controlled {
                style: Some(CollectionStyle::Types),
                ..
            } => "types",
            Self::Controlled {
                style: Some(CollectionStyle::Registrations),
                ..
            } => "registrations",
            Self::Controlled { style: None, .. } => "appended elements",
            Self::External(_) => "an external collection",
        }
    }
}
