mod collect;
mod proxy;

use std::any::{self, Any};
use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

use crate::collection::Collection;
use crate::container::ErrorKind;
use crate::instance::Instance;
use crate::key::ServiceType;
use crate::provider::context::CallContext;
use crate::util::display::ListDisplayer;

pub use collect::FromCollection;
pub(crate) use proxy::ContextForwardingInjectorProxy;

/// The resolution side of a container.
///
/// [`Injector::dyn_get`] starts a new resolution, while
/// [`Injector::dyn_get_dependency`] continues the one described by
/// `context`, so that cycles and lifestyle mismatches can be detected.
/// Providers usually never call the latter directly: they receive an
/// injector which forwards plain requests together with their context.
#[cfg_attr(test, mockall::automock)]
pub trait Injector: Send + Sync {
    fn dyn_get(&self, service_type: &ServiceType) -> Result<Instance, InjectorError>;

    fn dyn_get_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError>;

    fn dyn_get_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Instance, InjectorError>;

    fn dyn_get_all_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Collection, InjectorError>;
}

/// Typed helpers over [`Injector`].
///
/// # Examples
///
/// ```rust
/// # use weave::prelude::*;
/// let container = Container::new();
/// container
///     .register_instance(ServiceType::of::<i32>(), 42i32)
///     .unwrap();
/// let value: i32 = container.get_of().unwrap();
/// assert_eq!(value, 42);
/// ```
pub trait TypedInjector: Injector {
    /// Resolves `service_type` and clones the `T` out of the instance.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::IncompatibleInstance`] if the instance is not
    /// a `T`, or any error of the resolution.
    fn get<T>(&self, service_type: &ServiceType) -> Result<T, InjectorError>
    where
        T: Any + Clone + Send + Sync,
    {
        let instance = self.dyn_get(service_type)?;
        match instance.cloned::<T>() {
            Some(object) => Ok(object),
            None => Err(InjectorError::IncompatibleInstance {
                service_type: service_type.clone(),
                expected: any::type_name::<T>().to_string(),
                actual: instance.type_name(),
            }),
        }
    }

    /// Resolves the contract `ServiceType::of::<T>()`.
    fn get_of<T>(&self) -> Result<T, InjectorError>
    where
        T: Any + Clone + Send + Sync,
    {
        self.get(&ServiceType::of::<T>())
    }

    fn get_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError> {
        self.dyn_get_all(service_type)
    }

    /// Resolves the collection of `service_type` into `C`.
    fn collect<C>(&self, service_type: &ServiceType) -> Result<C, InjectorError>
    where
        C: FromCollection,
    {
        let collection = self.dyn_get_all(service_type)?;
        C::from_collection(&collection)
    }

    fn upcast_dyn(&self) -> &dyn Injector;
}

impl<T> TypedInjector for T
where
    T: Injector,
{
    fn upcast_dyn(&self) -> &dyn Injector {
        self
    }
}

impl TypedInjector for dyn Injector + '_ {
    fn upcast_dyn(&self) -> &dyn Injector {
        self
    }
}

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum InjectorError {
    #[snafu(display("no registration for type {service_type} could be found"))]
    #[non_exhaustive]
    NotFound { service_type: ServiceType },
    #[snafu(display(
        "no registration for type {service_type} could be found, although conditional registrations \
         for {} exist whose predicates did not apply",
        ListDisplayer::new(rejected, ", ")
    ))]
    #[non_exhaustive]
    NoMatchingConditional {
        service_type: ServiceType,
        rejected: Vec<ServiceType>,
    },
    #[snafu(display(
        "multiple applicable registrations found for type {service_type}: {}; make the predicates \
         mutually exclusive, e.g. by checking `!handled()` in the fallback",
        ListDisplayer::new(implementations, ", ")
    ))]
    #[non_exhaustive]
    AmbiguousRegistrations {
        service_type: ServiceType,
        implementations: Vec<ServiceType>,
    },
    #[snafu(display(
        "could not construct the object which depends on itself: {}",
        ListDisplayer::new(chain, " -> ")
    ))]
    #[non_exhaustive]
    CyclicDependency { chain: Vec<ServiceType> },
    #[snafu(display("could not construct the object {service_type}"))]
    #[non_exhaustive]
    ObjectConstruction {
        service_type: ServiceType,
        source: Arc<dyn Error + Send + Sync>,
    },
    #[snafu(display("the instance produced for {service_type} is a {actual}, not a {expected}"))]
    #[non_exhaustive]
    IncompatibleInstance {
        service_type: ServiceType,
        expected: String,
        actual: &'static str,
    },
    #[snafu(display(
        "{consumer} ({consumer_lifetime}) depends on {dependency} ({dependency_lifetime}), \
         which has a shorter lifetime"
    ))]
    #[non_exhaustive]
    LifestyleMismatch {
        consumer: ServiceType,
        consumer_lifetime: String,
        dependency: ServiceType,
        dependency_lifetime: String,
    },
    #[snafu(display("the collection of {service_type} contains a missing element at index {index}"))]
    #[non_exhaustive]
    NullElement {
        service_type: ServiceType,
        index: usize,
    },
    #[snafu(display("no collection of {service_type} is registered"))]
    #[non_exhaustive]
    CollectionNotFound { service_type: ServiceType },
    #[snafu(display("could not resolve {service_type} of {lifestyle} lifestyle outside an active scope"))]
    #[non_exhaustive]
    NoActiveScope {
        service_type: ServiceType,
        lifestyle: String,
    },
    #[snafu(display(
        "{implementation_type} was supplied as scoped for {service_type}, but no default scoped \
         lifestyle is configured"
    ))]
    #[non_exhaustive]
    NoDefaultScopedLifestyle {
        service_type: ServiceType,
        implementation_type: ServiceType,
    },
    #[snafu(display("could not resolve {service_type} from a disposed scope"))]
    #[non_exhaustive]
    ScopeDisposed { service_type: ServiceType },
}

impl InjectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AmbiguousRegistrations { .. } | Self::NoDefaultScopedLifestyle { .. } => {
                ErrorKind::Configuration
            }
            Self::NoActiveScope { .. } | Self::ScopeDisposed { .. } => ErrorKind::Usage,
            _ => ErrorKind::Activation,
        }
    }

    pub(crate) fn construction<E>(service_type: &ServiceType, err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::ObjectConstruction {
            service_type: service_type.clone(),
            source: Arc::from(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injector_error_display_names_cycle() {
        let err = InjectorError::CyclicDependency {
            chain: vec![
                ServiceType::named("A"),
                ServiceType::named("B"),
                ServiceType::named("A"),
            ],
        };
        assert!(err.to_string().ends_with("A -> B -> A"));
        assert_eq!(err.kind(), ErrorKind::Activation);
    }

    #[test]
    fn typed_injector_get_fails_on_incompatible_instance() {
        let mut injector = MockInjector::new();
        injector
            .expect_dyn_get()
            .returning(|_| Ok(Instance::new(String::from("text"))));

        let res = injector.get::<i32>(&ServiceType::named("Number"));
        assert!(matches!(
            res,
            Err(InjectorError::IncompatibleInstance { expected, .. }) if expected == "i32"
        ));
    }

    #[test]
    fn typed_injector_get_of_succeeds() {
        let mut injector = MockInjector::new();
        injector
            .expect_dyn_get()
            .withf(|service_type| *service_type == ServiceType::of::<i32>())
            .returning(|_| Ok(Instance::new(7i32)));

        assert_eq!(injector.get_of::<i32>().unwrap(), 7);
    }
}
