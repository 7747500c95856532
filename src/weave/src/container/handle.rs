use std::any::Any;
use std::sync::Arc;

use crate::collection::{Collection, CollectionStyle, Element, ExternalCollection};
use crate::container::core::ContainerCore;
use crate::container::injector::{Injector, InjectorError};
use crate::container::options::ContainerOptions;
use crate::container::producer::InstanceProducer;
use crate::container::registry::{ContainerId, Registration, RegistryError};
use crate::container::unregistered::UnregisteredTypeEvent;
use crate::container::verify::{self, VerificationError};
use crate::decorator::DecoratorDescriptor;
use crate::initializer::Initializer;
use crate::instance::Instance;
use crate::key::{ServiceType, TypeFacts};
use crate::lifetime::Lifetime;
use crate::matcher::{Pattern, PredicateContext};
use crate::module::Module;
use crate::provider::component::{Component, ComponentProvider};
use crate::provider::context::CallContext;
use crate::provider::instance::SharedInstanceProvider;
use crate::provider::Provider;
use crate::scope::Scope;

/// A dependency-injection container.
///
/// A container is configured through its `register*` methods and locked by
/// its first resolution, after which every configuration call fails with
/// [`RegistryError::ContainerLocked`]. Clones share the same container.
#[derive(Clone)]
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            core: Arc::new(ContainerCore::new(options)),
        }
    }

    /// Creates a container configured by `module`.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the module, or
    /// [`RegistryError::Aggregated`] if it reported several.
    pub fn init<M: Module>(module: M) -> Result<Self, RegistryError> {
        let container = Self::new();
        let mut errors = Vec::new();
        module.setup(&container, &mut errors);
        match errors.len() {
            0 => Ok(container),
            1 => Err(errors.remove(0)),
            _ => Err(RegistryError::Aggregated { errors }),
        }
    }

    pub fn id(&self) -> ContainerId {
        self.core.id()
    }

    pub fn options(&self) -> ContainerOptions {
        self.core.options()
    }

    /// Returns true once the container has been locked by a resolution or
    /// by [`Container::verify`].
    pub fn is_locked(&self) -> bool {
        self.core.is_locked()
    }

    /// Replaces the options. Registrations made before keep the default
    /// scoped lifestyle they captured.
    pub fn configure_options(&self, options: ContainerOptions) -> Result<(), RegistryError> {
        self.core.set_options(options)
    }

    pub fn declare_type(&self, facts: TypeFacts) -> Result<(), RegistryError> {
        self.core.declare_type(facts)
    }

    /// Creates a registration owned by this container without registering
    /// it, so that it can be shared by several contracts or collections.
    pub fn create_registration<P: Provider>(
        &self,
        implementation_type: ServiceType,
        provider: P,
        lifetime: Lifetime,
    ) -> Result<Registration, RegistryError> {
        self.core
            .create_registration(implementation_type, Arc::new(provider), lifetime)
    }

    /// Registers `provider` for the closed contract `service_type`.
    pub fn register<P: Provider>(
        &self,
        service_type: ServiceType,
        implementation_type: ServiceType,
        provider: P,
        lifetime: Lifetime,
    ) -> Result<(), RegistryError> {
        self.core
            .register(service_type, implementation_type, Arc::new(provider), lifetime)
    }

    pub fn register_registration(
        &self,
        service_type: ServiceType,
        registration: Registration,
    ) -> Result<(), RegistryError> {
        self.core.register_registration(service_type, registration)
    }

    /// Registers one shared `value` for `service_type`.
    pub fn register_instance<T>(&self, service_type: ServiceType, value: T) -> Result<(), RegistryError>
    where
        T: Any + Send + Sync,
    {
        self.register(
            service_type,
            ServiceType::of::<T>(),
            SharedInstanceProvider::new(Instance::new(value)),
            Lifetime::Singleton,
        )
    }

    /// Registers the constructor of `C` for `service_type`.
    pub fn register_component<C: Component>(
        &self,
        service_type: ServiceType,
        lifetime: Lifetime,
    ) -> Result<(), RegistryError> {
        self.register(
            service_type,
            ServiceType::of::<C>(),
            ComponentProvider::<C>::new(),
            lifetime,
        )
    }

    /// Registers an implementation pattern, closed per request.
    pub fn register_pattern<P: Provider>(
        &self,
        pattern: Pattern,
        provider: P,
    ) -> Result<(), RegistryError> {
        self.core.register_pattern(pattern, Arc::new(provider), None)
    }

    /// Registers a pattern applied only where `predicate` returns true.
    ///
    /// Conditional registrations of one contract are evaluated in
    /// registration order, and at most one of them may apply to a request.
    pub fn register_conditional<P, F>(
        &self,
        pattern: Pattern,
        provider: P,
        predicate: F,
    ) -> Result<(), RegistryError>
    where
        P: Provider,
        F: Fn(&PredicateContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.core
            .register_pattern(pattern, Arc::new(provider), Some(Arc::new(predicate)))
    }

    pub fn register_collection_of_types(
        &self,
        contract: ServiceType,
        elements: Vec<Element>,
    ) -> Result<(), RegistryError> {
        self.core
            .register_collection(contract, CollectionStyle::Types, elements)
    }

    pub fn register_collection_of_registrations(
        &self,
        contract: ServiceType,
        registrations: Vec<Registration>,
    ) -> Result<(), RegistryError> {
        let elements = registrations.into_iter().map(Element::registration).collect();
        self.core
            .register_collection(contract, CollectionStyle::Registrations, elements)
    }

    /// Registers a caller-owned collection, read on every resolution.
    pub fn register_collection_external<E: ExternalCollection>(
        &self,
        contract: ServiceType,
        source: E,
    ) -> Result<(), RegistryError> {
        self.core
            .register_collection_external(contract, Arc::new(source))
    }

    pub fn append_to_collection(
        &self,
        contract: ServiceType,
        element: Element,
    ) -> Result<(), RegistryError> {
        self.core.append_to_collection(contract, element)
    }

    pub fn register_decorator(&self, decorator: DecoratorDescriptor) -> Result<(), RegistryError> {
        self.core.register_decorator(decorator)
    }

    pub fn register_initializer(&self, initializer: Initializer) -> Result<(), RegistryError> {
        self.core.register_initializer(initializer)
    }

    /// Registers a handler for closed contracts nothing else can serve.
    pub fn on_unregistered_type<F>(&self, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut UnregisteredTypeEvent) + Send + Sync + 'static,
    {
        self.core.on_unregistered_type(Arc::new(handler))
    }

    /// Returns the producer registered for `service_type`, if any. Patterns
    /// are only visible here once a request closed them.
    pub fn lookup(&self, service_type: &ServiceType) -> Option<Arc<InstanceProducer>> {
        self.core.lookup(service_type)
    }

    pub fn resolve(&self, service_type: &ServiceType) -> Result<Instance, InjectorError> {
        self.core.resolve_root(service_type, None)
    }

    pub fn resolve_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError> {
        self.core.resolve_all_root(service_type, None)
    }

    pub fn begin_scope(&self) -> Scope {
        Scope::begin(Arc::clone(&self.core))
    }

    /// Locks the container and resolves everything it can resolve, once.
    ///
    /// # Errors
    ///
    /// Returns every resolution failure found.
    pub fn verify(&self) -> Result<(), VerificationError> {
        verify::verify(&self.core)
    }
}

impl Injector for Container {
    fn dyn_get(&self, service_type: &ServiceType) -> Result<Instance, InjectorError> {
        self.resolve(service_type)
    }

    fn dyn_get_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError> {
        self.resolve_all(service_type)
    }

    fn dyn_get_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Instance, InjectorError> {
        self.core.dyn_get_dependency(service_type, context)
    }

    fn dyn_get_all_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Collection, InjectorError> {
        self.core.dyn_get_all_dependency(service_type, context)
    }
}
