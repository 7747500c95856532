use std::collections::HashMap;
use std::hash::Hash;
use std::mem;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::collection::{
    Collection, CollectionElement, CollectionKind, CollectionPlan, CollectionStyle, Element,
    ElementSource, ExternalCollection,
};
use crate::container::injector::{Injector, InjectorError};
use crate::container::options::ContainerOptions;
use crate::container::producer::{Activation, InstanceProducer};
use crate::container::registry::{
    ConfigState, ContainerId, Recipe, Registration, RegistrationId, RegistrationStore,
    RegistrationTemplate, RegistryError,
};
use crate::container::unregistered::{UnregisteredHandler, UnregisteredTypeEvent};
use crate::decorator::{self, DecoratorDescriptor};
use crate::initializer::Initializer;
use crate::instance::Instance;
use crate::key::{ServiceType, TypeFacts};
use crate::lifetime::{Lifetime, ScopedLifestyle};
use crate::matcher::{self, Outcome, Pattern, PatternRegistration, Predicate};
use crate::provider::context::{CallContext, InjectionConsumer};
use crate::provider::Provider;
use crate::scope::{self, ScopeRef};

/// The shared state behind every handle of one container.
///
/// A container is configured first and locked on its first resolution. The
/// configuration is then frozen, while the registration store keeps
/// receiving the producers materialized from patterns.
pub(crate) struct ContainerCore {
    id: ContainerId,
    store: RegistrationStore,
    configuring: Mutex<ConfigState>,
    frozen: OnceLock<Arc<ConfigState>>,
    matches: ArcSwap<HashMap<MatchKey, Result<Arc<InstanceProducer>, InjectorError>>>,
    activations:
        ArcSwap<HashMap<(ServiceType, RegistrationId), Result<Arc<Activation>, InjectorError>>>,
    unregistered: ArcSwap<HashMap<ServiceType, Result<Registration, InjectorError>>>,
    collections: ArcSwap<HashMap<ServiceType, Result<Arc<CollectionPlan>, InjectorError>>>,
}

/// The key of a cached match. Matches involving a predicate are cached per
/// consumer, others once for every consumer.
#[derive(Clone, PartialEq, Eq, Hash)]
struct MatchKey {
    service_type: ServiceType,
    consumer: ConsumerKey,
}

#[derive(Clone, PartialEq, Eq, Hash)]
enum ConsumerKey {
    Independent,
    Root,
    Consumer(InjectionConsumer),
}

impl ContainerCore {
    pub(crate) fn new(options: ContainerOptions) -> Self {
        Self {
            id: ContainerId::next(),
            store: RegistrationStore::new(),
            configuring: Mutex::new(ConfigState {
                options,
                ..Default::default()
            }),
            frozen: OnceLock::new(),
            matches: ArcSwap::from_pointee(HashMap::new()),
            activations: ArcSwap::from_pointee(HashMap::new()),
            unregistered: ArcSwap::from_pointee(HashMap::new()),
            collections: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    pub(crate) fn id(&self) -> ContainerId {
        self.id
    }

    pub(crate) fn store(&self) -> &RegistrationStore {
        &self.store
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.frozen.get().is_some()
    }

    /// Returns the frozen configuration, locking the container first if
    /// needed.
    pub(crate) fn config(&self) -> Arc<ConfigState> {
        Arc::clone(self.frozen.get_or_init(|| {
            let state = mem::take(&mut *self.configuring.lock());
            debug!(target: "weave", container = ?self.id, "container locked");
            Arc::new(state)
        }))
    }

    pub(crate) fn options(&self) -> ContainerOptions {
        let state = self.configuring.lock();
        match self.frozen.get() {
            Some(frozen) => frozen.options.clone(),
            None => state.options.clone(),
        }
    }

    fn configure<R, F>(&self, operation: &'static str, f: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&mut ConfigState) -> Result<R, RegistryError>,
    {
        let mut state = self.configuring.lock();
        if self.is_locked() {
            return Err(RegistryError::ContainerLocked { operation });
        }
        f(&mut state)
    }

    pub(crate) fn set_options(&self, options: ContainerOptions) -> Result<(), RegistryError> {
        self.configure("configure_options", |state| {
            state.options = options;
            Ok(())
        })
    }

    pub(crate) fn declare_type(&self, facts: TypeFacts) -> Result<(), RegistryError> {
        self.configure("declare_type", |state| {
            state.catalog.declare(facts);
            Ok(())
        })
    }

    pub(crate) fn create_registration(
        &self,
        implementation_type: ServiceType,
        provider: Arc<dyn Provider>,
        lifetime: Lifetime,
    ) -> Result<Registration, RegistryError> {
        self.configure("create_registration", |state| {
            let lifetime = resolve_lifetime(state, lifetime, &implementation_type)?;
            Ok(Registration::new(
                self.id,
                implementation_type,
                Recipe::Provider(provider),
                lifetime,
            ))
        })
    }

    pub(crate) fn register(
        &self,
        service_type: ServiceType,
        implementation_type: ServiceType,
        provider: Arc<dyn Provider>,
        lifetime: Lifetime,
    ) -> Result<(), RegistryError> {
        self.configure("register", |state| {
            ensure_closed(&service_type)?;
            let lifetime = resolve_lifetime(state, lifetime, &service_type)?;
            let registration = Registration::new(
                self.id,
                implementation_type,
                Recipe::Provider(provider),
                lifetime,
            );
            self.add_closed(state, service_type, registration)
        })
    }

    pub(crate) fn register_registration(
        &self,
        service_type: ServiceType,
        registration: Registration,
    ) -> Result<(), RegistryError> {
        self.configure("register_registration", |state| {
            ensure_closed(&service_type)?;
            self.ensure_owned(&registration)?;
            self.add_closed(state, service_type, registration)
        })
    }

    pub(crate) fn register_pattern(
        &self,
        pattern: Pattern,
        provider: Arc<dyn Provider>,
        predicate: Option<Predicate>,
    ) -> Result<(), RegistryError> {
        let operation = if predicate.is_some() {
            "register_conditional"
        } else {
            "register_pattern"
        };
        self.configure(operation, |state| {
            let (contract, implementation, params, lifetime) = pattern.into_parts();
            if let Some(reason) = Pattern::validate(&contract, &implementation, &params) {
                return Err(RegistryError::InvalidPattern {
                    pattern: implementation,
                    reason,
                });
            }
            let lifetime = resolve_lifetime(state, lifetime, &contract)?;

            if contract.is_closed() && predicate.is_none() {
                if !implementation.is_closed() {
                    return Err(RegistryError::InvalidPattern {
                        pattern: implementation,
                        reason: format!("closed contract {contract} needs a closed implementation"),
                    });
                }
                let registration =
                    Registration::new(self.id, implementation, Recipe::Provider(provider), lifetime);
                return self.add_closed(state, contract, registration);
            }
            if contract.is_closed() && self.store.contains(&contract) {
                return Err(RegistryError::MixedConditional {
                    service_type: contract,
                });
            }

            let template = if implementation.is_closed() {
                RegistrationTemplate::Closed(Registration::new(
                    self.id,
                    implementation.clone(),
                    Recipe::Provider(provider),
                    lifetime,
                ))
            } else {
                RegistrationTemplate::open(self.id, provider, lifetime)
            };
            debug!(
                target: "weave",
                contract = %contract,
                implementation_type = %implementation,
                conditional = predicate.is_some(),
                "registered pattern",
            );
            state.add_pattern(PatternRegistration {
                contract,
                implementation,
                params,
                template,
                predicate,
            })
        })
    }

    pub(crate) fn register_collection(
        &self,
        contract: ServiceType,
        style: CollectionStyle,
        elements: Vec<Element>,
    ) -> Result<(), RegistryError> {
        let operation = match style {
            CollectionStyle::Types => "register_collection_of_types",
            CollectionStyle::Registrations => "register_collection_of_registrations",
        };
        self.configure(operation, |state| {
            let elements = elements
                .into_iter()
                .map(|element| self.collection_element(state, &contract, element))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(target: "weave", contract = %contract, elements = elements.len(), "registered collection");
            state.add_collection(
                contract,
                CollectionKind::Controlled {
                    style: Some(style),
                    elements,
                },
            )
        })
    }

    pub(crate) fn register_collection_external(
        &self,
        contract: ServiceType,
        source: Arc<dyn ExternalCollection>,
    ) -> Result<(), RegistryError> {
        self.configure("register_collection_external", |state| {
            ensure_closed(&contract)?;
            debug!(target: "weave", contract = %contract, "registered external collection");
            state.add_collection(contract, CollectionKind::External(source))
        })
    }

    pub(crate) fn append_to_collection(
        &self,
        contract: ServiceType,
        element: Element,
    ) -> Result<(), RegistryError> {
        self.configure("append_to_collection", |state| {
            let element = self.collection_element(state, &contract, element)?;
            state.append_element(contract, element)
        })
    }

    pub(crate) fn register_decorator(
        &self,
        mut decorator: DecoratorDescriptor,
    ) -> Result<(), RegistryError> {
        self.configure("register_decorator", |state| {
            if let Some(reason) = Pattern::validate(
                decorator.contract(),
                decorator.implementation(),
                decorator.params(),
            ) {
                return Err(RegistryError::InvalidPattern {
                    pattern: decorator.implementation().clone(),
                    reason,
                });
            }
            let lifetime =
                resolve_lifetime(state, decorator.get_lifetime().clone(), decorator.contract())?;
            decorator.set_lifetime(lifetime);
            debug!(
                target: "weave",
                contract = %decorator.contract(),
                implementation_type = %decorator.implementation(),
                "registered decorator",
            );
            state.decorators.push(Arc::new(decorator));
            Ok(())
        })
    }

    pub(crate) fn register_initializer(&self, initializer: Initializer) -> Result<(), RegistryError> {
        self.configure("register_initializer", |state| {
            state.initializers.push(Arc::new(initializer));
            Ok(())
        })
    }

    pub(crate) fn on_unregistered_type(
        &self,
        handler: Arc<UnregisteredHandler>,
    ) -> Result<(), RegistryError> {
        self.configure("on_unregistered_type", |state| {
            state.unregistered_handlers.push(handler);
            Ok(())
        })
    }

    fn add_closed(
        &self,
        state: &ConfigState,
        service_type: ServiceType,
        registration: Registration,
    ) -> Result<(), RegistryError> {
        if state.conditional_contracts.contains(&service_type) {
            return Err(RegistryError::MixedConditional { service_type });
        }
        let producer = Arc::new(InstanceProducer::new(service_type, registration));
        let replaced = self.store.register(
            Arc::clone(&producer),
            state.options.allow_overriding_registrations(),
        )?;
        debug!(
            target: "weave",
            service_type = %producer.service_type(),
            implementation_type = %producer.implementation_type(),
            lifetime = %producer.registration().lifetime(),
            replaced = replaced.is_some(),
            "registered",
        );
        Ok(())
    }

    fn ensure_owned(&self, registration: &Registration) -> Result<(), RegistryError> {
        if registration.container() == self.id {
            Ok(())
        } else {
            Err(RegistryError::ForeignRegistration {
                implementation_type: registration.implementation_type().clone(),
            })
        }
    }

    fn collection_element(
        &self,
        state: &ConfigState,
        contract: &ServiceType,
        element: Element,
    ) -> Result<CollectionElement, RegistryError> {
        let (implementation, params, source) = element.into_parts();
        if let Some(reason) = Pattern::validate(contract, &implementation, &params) {
            return Err(RegistryError::InvalidPattern {
                pattern: implementation,
                reason,
            });
        }
        let template = match source {
            ElementSource::Provider { provider, lifetime } => {
                let lifetime = resolve_lifetime(state, lifetime, &implementation)?;
                if implementation.is_closed() {
                    RegistrationTemplate::Closed(Registration::new(
                        self.id,
                        implementation.clone(),
                        Recipe::Provider(provider),
                        lifetime,
                    ))
                } else {
                    RegistrationTemplate::open(self.id, provider, lifetime)
                }
            }
            ElementSource::Registration(registration) => {
                self.ensure_owned(&registration)?;
                RegistrationTemplate::Closed(registration)
            }
        };
        Ok(CollectionElement {
            implementation,
            params,
            template,
        })
    }

    /// Returns the producer registered for `service_type`, without matching
    /// patterns.
    pub(crate) fn lookup(&self, service_type: &ServiceType) -> Option<Arc<InstanceProducer>> {
        self.store.lookup(service_type)
    }

    pub(crate) fn resolve_root(
        &self,
        service_type: &ServiceType,
        scope: Option<&ScopeRef>,
    ) -> Result<Instance, InjectorError> {
        self.resolve_in(service_type, &CallContext::root(scope))
    }

    pub(crate) fn resolve_all_root(
        &self,
        service_type: &ServiceType,
        scope: Option<&ScopeRef>,
    ) -> Result<Collection, InjectorError> {
        self.resolve_all_in(service_type, &CallContext::root(scope))
    }

    fn resolve_in(
        &self,
        service_type: &ServiceType,
        context: &CallContext<'_>,
    ) -> Result<Instance, InjectorError> {
        let producer = self.producer_for(service_type, context)?;
        self.produce(&producer, context)
    }

    fn resolve_all_in(
        &self,
        service_type: &ServiceType,
        context: &CallContext<'_>,
    ) -> Result<Collection, InjectorError> {
        let plan = self.collection_plan(service_type)?;
        plan.resolve(self, service_type, context)
    }

    /// Returns an instance of `producer` for the activation described by
    /// `context`.
    pub(crate) fn produce(
        &self,
        producer: &InstanceProducer,
        context: &CallContext<'_>,
    ) -> Result<Instance, InjectorError> {
        self.check_lifestyle(producer, context)?;
        producer.activation(self)?.activate(self, context)
    }

    fn check_lifestyle(
        &self,
        producer: &InstanceProducer,
        context: &CallContext<'_>,
    ) -> Result<(), InjectorError> {
        let Some(frame) = context.frame() else {
            return Ok(());
        };
        if !self.config().options.check_lifestyle_mismatches() {
            return Ok(());
        }
        let lifetime = producer.effective_lifetime(self)?;
        if !lifetime.is_transient() && frame.lifetime.outlive(&lifetime) {
            return Err(InjectorError::LifestyleMismatch {
                consumer: frame.implementation_type.clone(),
                consumer_lifetime: frame.lifetime.to_string(),
                dependency: producer.implementation_type().clone(),
                dependency_lifetime: lifetime.to_string(),
            });
        }
        Ok(())
    }

    fn producer_for(
        &self,
        service_type: &ServiceType,
        context: &CallContext<'_>,
    ) -> Result<Arc<InstanceProducer>, InjectorError> {
        let config = self.config();
        if let Some(producer) = self.store.lookup(service_type) {
            return Ok(producer);
        }
        if !service_type.is_closed() {
            return Err(InjectorError::NotFound {
                service_type: service_type.clone(),
            });
        }

        let consumer = context.consumer();
        let independent = MatchKey {
            service_type: service_type.clone(),
            consumer: ConsumerKey::Independent,
        };
        let dependent = MatchKey {
            service_type: service_type.clone(),
            consumer: consumer
                .clone()
                .map_or(ConsumerKey::Root, ConsumerKey::Consumer),
        };
        {
            let matches = self.matches.load();
            if let Some(cached) = matches
                .get(&independent)
                .or_else(|| matches.get(&dependent))
            {
                return cached.clone();
            }
        }

        let found = matcher::find(
            config.candidates(service_type),
            service_type,
            consumer.as_ref(),
            &config.catalog,
        );
        let key = if found.consumer_dependent {
            dependent
        } else {
            independent
        };
        let result = match found.outcome {
            Outcome::Matched {
                pattern,
                implementation,
            } => {
                let registration = pattern.template.registration_for(&implementation);
                debug!(
                    target: "weave",
                    service_type = %service_type,
                    implementation_type = %implementation,
                    "materialized producer",
                );
                Ok(Arc::new(InstanceProducer::new(service_type.clone(), registration)))
            }
            Outcome::NoMatch { rejected } => match self.raise_unregistered(&config, service_type) {
                Some(Ok(registration)) => {
                    Ok(Arc::new(InstanceProducer::new(service_type.clone(), registration)))
                }
                Some(Err(err)) => Err(err),
                None if rejected.is_empty() => Err(InjectorError::NotFound {
                    service_type: service_type.clone(),
                }),
                None => Err(InjectorError::NoMatchingConditional {
                    service_type: service_type.clone(),
                    rejected,
                }),
            },
            Outcome::Ambiguous { implementations } => {
                warn!(
                    target: "weave",
                    service_type = %service_type,
                    candidates = implementations.len(),
                    "ambiguous registrations",
                );
                Err(InjectorError::AmbiguousRegistrations {
                    service_type: service_type.clone(),
                    implementations,
                })
            }
        };

        match result {
            Ok(producer) if key.consumer == ConsumerKey::Independent => {
                Ok(self.store.install(producer))
            }
            result => insert_if_absent(&self.matches, key, result),
        }
    }

    /// Asks the unregistered-type handlers for a registration of
    /// `service_type`. A supplied registration is kept, so the handlers are
    /// asked once however many consumers request the contract.
    fn raise_unregistered(
        &self,
        config: &ConfigState,
        service_type: &ServiceType,
    ) -> Option<Result<Registration, InjectorError>> {
        if config.unregistered_handlers.is_empty() {
            return None;
        }
        if let Some(supplied) = self.unregistered.load().get(service_type) {
            return Some(supplied.clone());
        }
        let default_lifetime = config
            .options
            .default_scoped_lifestyle()
            .cloned()
            .map(Lifetime::ScopedBy);
        let mut event = UnregisteredTypeEvent::new(service_type.clone(), self.id, default_lifetime);
        for handler in &config.unregistered_handlers {
            handler(&mut event);
        }
        let supplied = event.into_registration()?;
        if let Ok(registration) = &supplied {
            debug!(
                target: "weave",
                service_type = %service_type,
                implementation_type = %registration.implementation_type(),
                "resolved unregistered type",
            );
        }
        Some(insert_if_absent(&self.unregistered, service_type.clone(), supplied))
    }

    /// Returns the activation chain of `registration` serving `service_type`.
    /// The chain is composed once, so its decorator layers keep one cache
    /// for every producer of the registration.
    pub(crate) fn activation(
        &self,
        service_type: &ServiceType,
        registration: &Registration,
    ) -> Result<Arc<Activation>, InjectorError> {
        let key = (service_type.clone(), registration.id());
        if let Some(cached) = self.activations.load().get(&key) {
            return cached.clone();
        }
        let composed = decorator::compose(&self.config(), service_type, registration);
        insert_if_absent(&self.activations, key, composed)
    }

    fn collection_plan(&self, service_type: &ServiceType) -> Result<Arc<CollectionPlan>, InjectorError> {
        let config = self.config();
        if let Some(cached) = self.collections.load().get(service_type) {
            return cached.clone();
        }
        let plan = CollectionPlan::build(&config, service_type).map(Arc::new);
        insert_if_absent(&self.collections, service_type.clone(), plan)
    }

    /// Returns the scope in which instances of `lifestyle` are cached for
    /// the activation described by `context`.
    pub(crate) fn active_scope(
        &self,
        lifestyle: &ScopedLifestyle,
        context: &CallContext<'_>,
    ) -> Option<ScopeRef> {
        let flowing = context
            .scope()
            .filter(|scope| scope.container() == self.id)
            .cloned();
        match lifestyle {
            ScopedLifestyle::ThreadBound => {
                flowing.or_else(|| scope::thread::current(self.id).map(ScopeRef::new))
            }
            ScopedLifestyle::Flowing => flowing,
            ScopedLifestyle::Custom(provider) => provider
                .current_scope()
                .filter(|scope| scope.container() == self.id)
                .or(flowing),
        }
    }
}

impl Injector for ContainerCore {
    fn dyn_get(&self, service_type: &ServiceType) -> Result<Instance, InjectorError> {
        self.resolve_root(service_type, None)
    }

    fn dyn_get_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError> {
        self.resolve_all_root(service_type, None)
    }

    fn dyn_get_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Instance, InjectorError> {
        self.resolve_in(service_type, context)
    }

    fn dyn_get_all_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Collection, InjectorError> {
        self.resolve_all_in(service_type, context)
    }
}

fn resolve_lifetime(
    state: &ConfigState,
    lifetime: Lifetime,
    service_type: &ServiceType,
) -> Result<Lifetime, RegistryError> {
    lifetime
        .resolve(state.options.default_scoped_lifestyle())
        .ok_or_else(|| RegistryError::NoDefaultScopedLifestyle {
            service_type: service_type.clone(),
        })
}

fn ensure_closed(service_type: &ServiceType) -> Result<(), RegistryError> {
    if service_type.is_closed() {
        Ok(())
    } else {
        Err(RegistryError::InvalidPattern {
            pattern: service_type.clone(),
            reason: String::from("parameterized contracts must be registered with a pattern"),
        })
    }
}

/// Caches `value` under `key` unless another thread cached a value first,
/// and returns the cached value.
fn insert_if_absent<K, V>(cache: &ArcSwap<HashMap<K, V>>, key: K, value: V) -> V
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    let mut cached = value.clone();
    cache.rcu(|current| {
        if let Some(existing) = current.get(&key) {
            cached = existing.clone();
            Arc::clone(current)
        } else {
            let mut next = HashMap::clone(current);
            next.insert(key.clone(), value.clone());
            cached = value.clone();
            Arc::new(next)
        }
    });
    cached
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    use crate::container::injector::TypedInjector;
    use crate::provider::closure::RawClosureProvider;
    use crate::provider::instance::InstanceProvider;

    use super::*;

    fn raw_dependency(
        name: &'static str,
        dependency: Option<&'static str>,
    ) -> Arc<dyn Provider> {
        Arc::new(RawClosureProvider::new(
            move |injector: &dyn Injector, _: &CallContext<'_>| {
                if let Some(dependency) = dependency {
                    injector.dyn_get(&ServiceType::named(dependency))?;
                }
                Ok(Ok::<_, Infallible>(name))
            },
        ))
    }

    fn register_named(core: &ContainerCore, name: &'static str, dependency: Option<&'static str>, lifetime: Lifetime) {
        core.register(
            ServiceType::named(name),
            ServiceType::named(format!("{name}Impl")),
            raw_dependency(name, dependency),
            lifetime,
        )
        .unwrap();
    }

    #[test]
    fn container_core_detects_transient_cycle() {
        let core = ContainerCore::new(ContainerOptions::default());
        register_named(&core, "A", Some("B"), Lifetime::Transient);
        register_named(&core, "B", Some("A"), Lifetime::Transient);

        let Err(InjectorError::CyclicDependency { chain }) = core.dyn_get(&ServiceType::named("A"))
        else {
            panic!("the cycle should be detected");
        };
        let names: Vec<_> = chain.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["A", "B", "A"]);
    }

    #[test]
    fn container_core_detects_singleton_cycle_through_transient() {
        let core = ContainerCore::new(ContainerOptions::default());
        register_named(&core, "A", Some("B"), Lifetime::Singleton);
        register_named(&core, "B", Some("A"), Lifetime::Transient);

        let res = core.dyn_get(&ServiceType::named("A"));
        assert!(matches!(res, Err(InjectorError::CyclicDependency { .. })));
        // The failure is cached with the singleton.
        let res = core.dyn_get(&ServiceType::named("A"));
        assert!(matches!(res, Err(InjectorError::CyclicDependency { .. })));
    }

    #[test]
    fn container_core_singleton_is_built_once_across_threads() {
        const THREADS: usize = 8;
        let core = Arc::new(ContainerCore::new(ContainerOptions::default()));
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        core.register(
            ServiceType::of::<Arc<String>>(),
            ServiceType::named("Greeting"),
            Arc::new(RawClosureProvider::new(
                move |_: &dyn Injector, _: &CallContext<'_>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(20));
                    Ok(Ok::<_, Infallible>(Arc::new(String::from("hello"))))
                },
            )),
            Lifetime::Singleton,
        )
        .unwrap();

        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let core = Arc::clone(&core);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    core.get_of::<Arc<String>>().unwrap()
                })
            })
            .collect();
        let greetings: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("Each thread should not `panic!()`"))
            .collect();

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(greetings.iter().all(|g| Arc::ptr_eq(g, &greetings[0])));
    }

    #[test]
    fn container_core_locks_on_first_resolution() {
        let core = ContainerCore::new(ContainerOptions::default());
        core.register(
            ServiceType::of::<i32>(),
            ServiceType::named("Answer"),
            Arc::new(InstanceProvider::new(42i32)),
            Lifetime::Transient,
        )
        .unwrap();
        assert!(!core.is_locked());

        assert_eq!(core.get_of::<i32>().unwrap(), 42);
        assert!(core.is_locked());
        let res = core.register(
            ServiceType::of::<u8>(),
            ServiceType::named("Byte"),
            Arc::new(InstanceProvider::new(1u8)),
            Lifetime::Transient,
        );
        assert!(matches!(
            res,
            Err(RegistryError::ContainerLocked {
                operation: "register"
            })
        ));
    }

    #[test]
    fn container_core_installs_materialized_producers() {
        let core = ContainerCore::new(ContainerOptions::default());
        core.register_pattern(
            Pattern::new(
                ServiceType::named("IRepo").with_param("T"),
                ServiceType::named("RepoA").with_param("T"),
            ),
            Arc::new(InstanceProvider::new(0u8)),
            None,
        )
        .unwrap();
        let request = ServiceType::named("IRepo").with_arg(ServiceType::named("Entity"));

        assert!(core.lookup(&request).is_none());
        core.dyn_get(&request).unwrap();
        let producer = core.lookup(&request).unwrap();
        assert_eq!(producer.implementation_type().to_string(), "RepoA<Entity>");
    }

    #[test]
    fn container_core_caches_conditional_matches_per_consumer() {
        let core = ContainerCore::new(ContainerOptions::default());
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluated);
        core.register_pattern(
            Pattern::new(ServiceType::named("ILogger"), ServiceType::named("FileLogger")),
            Arc::new(InstanceProvider::new("file")),
            Some(Arc::new(move |_: &matcher::PredicateContext<'_>| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            })),
        )
        .unwrap();

        core.dyn_get(&ServiceType::named("ILogger")).unwrap();
        core.dyn_get(&ServiceType::named("ILogger")).unwrap();
        assert_eq!(evaluated.load(Ordering::SeqCst), 1);
        assert!(core.lookup(&ServiceType::named("ILogger")).is_none());
    }
}
