use std::any::Any;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use crate::container::injector::{ContextForwardingInjectorProxy, InjectorError, TypedInjector};
use crate::provider::closure::Closure;
use crate::provider::context::CallContext;
use crate::provider::{self, TypedProvider};

/// Adapts a [`Closure`] to the [`Provider`] seam of a registration.
///
/// Arguments resolve against the contract named after their Rust type, so a
/// closure taking an `Arc<Config>` depends on `ServiceType::of::<Arc<Config>>()`.
/// Those lookups run under the [`CallContext`] of the activation, which keeps
/// cycle detection and lifestyle checks working through the closure. A
/// failure of the closure itself is reported as object construction of the
/// registered implementation type.
///
/// ```rust
/// # use std::convert::Infallible;
/// # use weave::provider::closure::ClosureProvider;
/// let provider = ClosureProvider::new(|port: u16, host: String| {
///     Ok::<_, Infallible>(format!("{host}:{port}"))
/// });
/// ```
///
/// [`Provider`]: crate::provider::Provider
pub struct ClosureProvider<T, C, D>
where
    T: Any + Send + Sync,
    C: Closure<D, Constructed = T>,
    D: Send + Sync + 'static,
{
    closure: C,
    _marker: PhantomData<fn() -> (T, D)>,
}

impl<T, C, D> ClosureProvider<T, C, D>
where
    T: Any + Send + Sync,
    C: Closure<D, Constructed = T>,
    D: Send + Sync + 'static,
{
    /// Wraps `closure`.
    pub fn new(closure: C) -> Self {
        Self {
            closure,
            _marker: PhantomData,
        }
    }
}

impl<T, C, D> Debug for ClosureProvider<T, C, D>
where
    T: Any + Send + Sync,
    C: Closure<D, Constructed = T>,
    D: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClosureProvider")
            .field("output", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T, C, D> TypedProvider for ClosureProvider<T, C, D>
where
    T: Any + Send + Sync,
    C: Closure<D, Constructed = T>,
    D: Send + Sync + 'static,
{
    type Output = T;

    fn provide<I>(
        &self,
        injector: &I,
        context: &CallContext<'_>,
    ) -> Result<Self::Output, InjectorError>
    where
        I: TypedInjector + ?Sized,
    {
        let scoped = ContextForwardingInjectorProxy::new(injector, context);
        self.closure
            .run(&scoped)?
            .map_err(|err| provider::construction_failed::<T, _>(context, err))
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use crate::container::injector::MockInjector;
    use crate::instance::Instance;

    use super::*;

    #[test]
    fn closure_provider_succeeds() {
        let mut injector = MockInjector::new();
        injector
            .expect_dyn_get_dependency()
            .returning(|_, _| Ok(Instance::new(42i32)));

        let provider = ClosureProvider::new(|v: i32| Ok::<_, Infallible>(v));

        let res = provider.provide(&injector, &CallContext::root(None));
        assert_eq!(res.unwrap(), 42);

        let res = provider.provide(&injector, &CallContext::root(None));
        assert_eq!(res.unwrap(), 42);
    }

    #[test]
    fn closure_provider_fails_when_closure_fails() {
        let injector = MockInjector::new();
        let provider = ClosureProvider::new(|| "nope".parse::<i32>());

        let res = provider.provide(&injector, &CallContext::root(None));
        assert!(matches!(
            res,
            Err(InjectorError::ObjectConstruction { service_type, .. })
                if service_type == crate::key::ServiceType::of::<i32>()
        ));
    }
}
