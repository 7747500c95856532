//! Wrapping of resolved services by decorators chosen per service type.

use std::any::{self, Any};
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use tracing::debug;

use crate::container::injector::{ContextForwardingInjectorProxy, Injector, InjectorError};
use crate::container::producer::Activation;
use crate::container::registry::{ConfigState, Recipe, Registration};
use crate::instance::Instance;
use crate::key::{ServiceType, TypeParam};
use crate::lifetime::Lifetime;
use crate::matcher;
use crate::provider::context::CallContext;

type DecorateFn =
    dyn Fn(&dyn Injector, &CallContext<'_>, Instance) -> Result<Instance, InjectorError> + Send + Sync;

type DecoratorPredicate = dyn Fn(&DecoratorContext<'_>) -> bool + Send + Sync;

/// A decorator wrapping every service whose type matches `contract`.
///
/// The factory receives the decorated instance and returns the instance
/// handed out instead. Decorators are applied in registration order, so the
/// last registered decorator is the outermost one.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::sync::Arc;
/// # use weave::decorator::DecoratorDescriptor;
/// # use weave::key::ServiceType;
/// let decorator = DecoratorDescriptor::typed(
///     ServiceType::of::<Arc<str>>(),
///     ServiceType::named("Shouting"),
///     |_, inner: Arc<str>| Ok::<_, Infallible>(Arc::from(inner.to_uppercase())),
/// );
/// ```
pub struct DecoratorDescriptor {
    contract: ServiceType,
    implementation: ServiceType,
    params: Vec<TypeParam>,
    lifetime: Lifetime,
    factory: Arc<DecorateFn>,
    predicate: Option<Arc<DecoratorPredicate>>,
}

impl DecoratorDescriptor {
    pub fn new<F>(contract: ServiceType, implementation: ServiceType, factory: F) -> Self
    where
        F: Fn(&dyn Injector, &CallContext<'_>, Instance) -> Result<Instance, InjectorError>,
        F: Send + Sync + 'static,
    {
        Self {
            contract,
            implementation,
            params: Vec::new(),
            lifetime: Lifetime::Transient,
            factory: Arc::new(factory),
            predicate: None,
        }
    }

    /// Creates a decorator of `T`, where the decorated object is cloned out
    /// of its instance.
    pub fn typed<T, E, F>(contract: ServiceType, implementation: ServiceType, factory: F) -> Self
    where
        T: Any + Clone + Send + Sync,
        E: Into<Box<dyn Error + Send + Sync>>,
        F: Fn(&dyn Injector, T) -> Result<T, E> + Send + Sync + 'static,
    {
        let service_type = contract.clone();
        Self::new(contract, implementation, move |injector, context, inner| {
            let Some(inner) = inner.cloned::<T>() else {
                return Err(InjectorError::IncompatibleInstance {
                    service_type: service_type.clone(),
                    expected: any::type_name::<T>().to_string(),
                    actual: inner.type_name(),
                });
            };
            match factory(injector, inner) {
                Ok(decorated) => Ok(Instance::new(decorated)),
                Err(err) => Err(crate::provider::construction_failed::<T, _>(context, err)),
            }
        })
    }

    pub fn param(mut self, param: TypeParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Applies the decorator only where `predicate` returns true.
    pub fn when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&DecoratorContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn contract(&self) -> &ServiceType {
        &self.contract
    }

    pub fn implementation(&self) -> &ServiceType {
        &self.implementation
    }

    pub fn params(&self) -> &[TypeParam] {
        &self.params
    }

    pub fn get_lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    pub(crate) fn set_lifetime(&mut self, lifetime: Lifetime) {
        self.lifetime = lifetime;
    }

    pub(crate) fn decorate(
        &self,
        injector: &dyn Injector,
        context: &CallContext<'_>,
        decoratee: Instance,
    ) -> Result<Instance, InjectorError> {
        let injector = ContextForwardingInjectorProxy::new(injector, context);
        (self.factory)(&injector, context, decoratee)
    }
}

impl Debug for DecoratorDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DecoratorDescriptor")
            .field("contract", &self.contract)
            .field("implementation", &self.implementation)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// The information a decorator predicate decides on.
pub struct DecoratorContext<'a> {
    service_type: &'a ServiceType,
    implementation_type: &'a ServiceType,
    applied: &'a [ServiceType],
}

impl DecoratorContext<'_> {
    pub fn service_type(&self) -> &ServiceType {
        self.service_type
    }

    /// The implementation of the decorated service, below all decorators.
    pub fn implementation_type(&self) -> &ServiceType {
        self.implementation_type
    }

    /// The decorators applied so far, innermost first.
    pub fn applied(&self) -> &[ServiceType] {
        self.applied
    }
}

/// Builds the activation chain of `registration` serving `service_type`:
/// the registration itself, wrapped by every applicable decorator.
pub(crate) fn compose(
    config: &ConfigState,
    service_type: &ServiceType,
    registration: &Registration,
) -> Result<Arc<Activation>, InjectorError> {
    let mut current = Arc::new(Activation::new(
        service_type.clone(),
        registration.clone(),
        None,
        config.initializers_for(registration.implementation_type(), Some(service_type)),
    ));
    let mut applied: Vec<ServiceType> = Vec::new();

    for decorator in &config.decorators {
        let Some(bindings) = matcher::close(
            &decorator.contract,
            &decorator.implementation,
            &decorator.params,
            service_type,
            &config.catalog,
        ) else {
            continue;
        };
        let Some(implementation) = decorator.implementation.substitute(&bindings) else {
            continue;
        };
        if let Some(predicate) = &decorator.predicate {
            let context = DecoratorContext {
                service_type,
                implementation_type: registration.implementation_type(),
                applied: &applied,
            };
            if !predicate(&context) {
                continue;
            }
        }

        let decoratee_lifetime = current.registration().lifetime();
        if config.options.check_lifestyle_mismatches()
            && !decoratee_lifetime.is_transient()
            && decorator.lifetime.outlive(decoratee_lifetime)
        {
            return Err(InjectorError::LifestyleMismatch {
                consumer: implementation,
                consumer_lifetime: decorator.lifetime.to_string(),
                dependency: current.registration().implementation_type().clone(),
                dependency_lifetime: decoratee_lifetime.to_string(),
            });
        }

        let layer = Registration::new(
            registration.container(),
            implementation.clone(),
            Recipe::Decorator(Arc::clone(decorator)),
            decorator.lifetime.clone(),
        );
        current = Arc::new(Activation::new(
            service_type.clone(),
            layer,
            Some(current),
            config.initializers_for(&implementation, None),
        ));
        applied.push(implementation);
    }

    debug!(
        target: "weave",
        service_type = %service_type,
        implementation_type = %registration.implementation_type(),
        decorators = applied.len(),
        "composed instance producer",
    );
    Ok(current)
}
