use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, OnceLock};

use tracing::warn;

use crate::container::core::ContainerCore;
use crate::container::injector::InjectorError;
use crate::container::registry::{Recipe, Registration};
use crate::initializer::Initializer;
use crate::instance::Instance;
use crate::key::ServiceType;
use crate::lifetime::Lifetime;
use crate::provider::context::{CallContext, Frame};

/// A registration serving one closed contract.
///
/// The activation chain (the registration plus its decorators and
/// initializers) is composed on first use and kept afterwards, including a
/// composition failure, which is re-raised on every later request. Producers
/// of one registration serving the same contract, as materialized for
/// different consumers, share one chain.
pub struct InstanceProducer {
    service_type: ServiceType,
    registration: Registration,
    activation: OnceLock<Result<Arc<Activation>, InjectorError>>,
}

impl InstanceProducer {
    pub fn new(service_type: ServiceType, registration: Registration) -> Self {
        Self {
            service_type,
            registration,
            activation: OnceLock::new(),
        }
    }

    pub fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn implementation_type(&self) -> &ServiceType {
        self.registration.implementation_type()
    }

    /// The lifetime of the outermost layer, which is what consumers capture.
    pub(crate) fn effective_lifetime(&self, core: &ContainerCore) -> Result<Lifetime, InjectorError> {
        Ok(self.activation(core)?.registration().lifetime().clone())
    }

    pub(crate) fn activation(&self, core: &ContainerCore) -> Result<Arc<Activation>, InjectorError> {
        self.activation
            .get_or_init(|| core.activation(&self.service_type, &self.registration))
            .clone()
    }
}

impl Debug for InstanceProducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InstanceProducer")
            .field("service_type", &self.service_type)
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

/// One layer of an activation chain. The innermost layer builds the
/// registered implementation, outer layers are decorators wrapping the layer
/// below.
pub(crate) struct Activation {
    service_type: ServiceType,
    registration: Registration,
    decoratee: Option<Arc<Activation>>,
    initializers: Vec<Arc<Initializer>>,
}

impl Activation {
    pub(crate) fn new(
        service_type: ServiceType,
        registration: Registration,
        decoratee: Option<Arc<Activation>>,
        initializers: Vec<Arc<Initializer>>,
    ) -> Self {
        Self {
            service_type,
            registration,
            decoratee,
            initializers,
        }
    }

    pub(crate) fn registration(&self) -> &Registration {
        &self.registration
    }

    /// Returns the instance of this layer, reusing a cached one where the
    /// lifetime allows it.
    pub(crate) fn activate(
        &self,
        core: &ContainerCore,
        context: &CallContext<'_>,
    ) -> Result<Instance, InjectorError> {
        let id = self.registration.id();
        if context.is_activating(id) {
            let chain = context.cycle(id, &self.service_type);
            warn!(target: "weave", service_type = %self.service_type, "cyclic dependency detected");
            return Err(InjectorError::CyclicDependency { chain });
        }

        // Raised by a cache which is already being filled for this request,
        // by this thread outside the trace or by a thread waiting for it.
        let cycle = || {
            let mut chain = context.cycle(id, &self.service_type);
            if chain.len() == 1 {
                chain.push(self.service_type.clone());
            }
            InjectorError::CyclicDependency { chain }
        };
        let context = context.enter(Frame {
            registration: id,
            service_type: self.service_type.clone(),
            implementation_type: self.registration.implementation_type().clone(),
            lifetime: self.registration.lifetime().clone(),
        });

        match self.registration.lifetime() {
            Lifetime::Transient => self.create(core, &context),
            Lifetime::Singleton => self
                .registration
                .slot()
                .get_or_create(cycle, || self.create(core, &context))
                .map(|(instance, _)| instance),
            Lifetime::ScopedBy(lifestyle) => {
                let Some(scope) = core.active_scope(lifestyle, &context) else {
                    return Err(InjectorError::NoActiveScope {
                        service_type: self.service_type.clone(),
                        lifestyle: lifestyle.to_string(),
                    });
                };
                scope
                    .core()
                    .get_or_create(id, &self.service_type, cycle, || self.create(core, &context))
            }
            Lifetime::Custom(policy) => policy.get_or_create(id, &mut || self.create(core, &context)),
            Lifetime::Scoped => {
                unreachable!("`Scoped` is replaced by the default lifestyle on registration")
            }
        }
    }

    fn create(&self, core: &ContainerCore, context: &CallContext<'_>) -> Result<Instance, InjectorError> {
        let instance = match self.registration.recipe() {
            Recipe::Provider(provider) => provider.dyn_provide(core, context)?,
            Recipe::Decorator(decorator) => {
                let Some(decoratee) = &self.decoratee else {
                    unreachable!("a decorator layer always wraps another layer")
                };
                let inner = decoratee.activate(core, context)?;
                decorator.decorate(core, context, inner)?
            }
        };

        if let Some(expected) = self.service_type.rust_type() {
            if instance.value_type_id() != expected {
                return Err(InjectorError::IncompatibleInstance {
                    service_type: self.service_type.clone(),
                    expected: self.service_type.to_string(),
                    actual: instance.type_name(),
                });
            }
        }
        for initializer in &self.initializers {
            initializer.run(&self.service_type, &instance)?;
        }
        Ok(instance)
    }
}
