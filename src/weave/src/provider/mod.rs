pub mod closure;
pub mod component;
pub mod context;
pub mod instance;

use std::any::Any;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::container::injector::{Injector, InjectorError, TypedInjector};
use crate::instance::{Dispose, Instance};
use crate::key::ServiceType;
use crate::provider::context::CallContext;

/// A universal factory which constructs objects of one implementation.
///
/// A [`Provider`] is responsible for constructing an object on each request
/// and retrieving all dependencies from an [`Injector`]. It is the only
/// thing the container needs to know about how an implementation is built.
///
/// In convention, a [`Provider`] is a stateless object and may be used by
/// multiple threads. Each request to a [`Provider`] should receive a new
/// object, since sharing is managed by the registration's lifetime rather
/// than the provider.
///
/// Usually, you don't need to implement [`Provider`] manually, since this is
/// automatically done by [`TypedProvider`]'s blanket implementation. See
/// [`TypedProvider`] for more information.
pub trait Provider: Debug + Send + Sync + 'static {
    /// Provides a newly created type-erased object. The `context` describes
    /// the activation in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if all dependencies can't be fetched or the object
    /// construction fails.
    fn dyn_provide(
        &self,
        injector: &dyn Injector,
        context: &CallContext<'_>,
    ) -> Result<Instance, InjectorError>;
}

/// A static variant of the [`Provider`] trait, leveraging static dispatch and
/// type-safety.
pub trait TypedProvider: Provider {
    /// The return type in response to each request to the provider.
    type Output: Any + Send + Sync;

    /// Provides a newly created object of type [`TypedProvider::Output`].
    ///
    /// # Errors
    ///
    /// Returns an error if all dependencies can't be fetched or the object
    /// construction fails.
    fn provide<I>(
        &self,
        injector: &I,
        context: &CallContext<'_>,
    ) -> Result<Self::Output, InjectorError>
    where
        I: TypedInjector + ?Sized;
}

impl<T: TypedProvider> Provider for T {
    fn dyn_provide(
        &self,
        injector: &dyn Injector,
        context: &CallContext<'_>,
    ) -> Result<Instance, InjectorError> {
        self.provide(injector, context).map(Instance::new)
    }
}

/// A [`Provider`] whose objects are disposed when the scope caching them
/// ends.
pub struct DisposableProvider<P>
where
    P: TypedProvider<Output: Dispose + Clone>,
{
    inner: P,
}

impl<P> DisposableProvider<P>
where
    P: TypedProvider<Output: Dispose + Clone>,
{
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P> Debug for DisposableProvider<P>
where
    P: TypedProvider<Output: Dispose + Clone>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DisposableProvider<P>")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<P> Provider for DisposableProvider<P>
where
    P: TypedProvider<Output: Dispose + Clone>,
{
    fn dyn_provide(
        &self,
        injector: &dyn Injector,
        context: &CallContext<'_>,
    ) -> Result<Instance, InjectorError> {
        self.inner
            .provide(injector, context)
            .map(Instance::new_disposable)
    }
}

/// Wraps a failure of user code into [`InjectorError::ObjectConstruction`]
/// for the service being activated.
pub(crate) fn construction_failed<T, E>(context: &CallContext<'_>, err: E) -> InjectorError
where
    T: ?Sized + 'static,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    let service_type = context
        .service_type()
        .cloned()
        .unwrap_or_else(ServiceType::of::<T>);
    InjectorError::construction(&service_type, err)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::container::injector::MockInjector;
    use crate::provider::instance::InstanceProvider;

    use super::*;

    #[derive(Clone, Default)]
    struct Connection(Arc<AtomicBool>);

    impl Dispose for Connection {
        fn dispose(&self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn disposable_provider_attaches_disposer() {
        let connection = Connection::default();
        let provider = DisposableProvider::new(InstanceProvider::new(connection.clone()));
        let injector = MockInjector::new();

        let instance = provider
            .dyn_provide(&injector, &CallContext::root(None))
            .unwrap();
        assert!(instance.is_disposable());
        instance.dispose();
        assert!(connection.0.load(Ordering::SeqCst));
    }
}
