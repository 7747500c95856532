use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::marker::PhantomData;

use crate::container::injector::{ContextForwardingInjectorProxy, InjectorError, TypedInjector};
use crate::provider::component::Component;
use crate::provider::context::CallContext;
use crate::provider::{self, TypedProvider};

/// A [`Provider`] which builds a [`Component`] through its constructor.
///
/// [`Provider`]: crate::provider::Provider
pub struct ComponentProvider<C>
where
    C: Component,
{
    _marker: PhantomData<fn() -> C>,
}

impl<C> ComponentProvider<C>
where
    C: Component,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<C> Debug for ComponentProvider<C>
where
    C: Component,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ComponentProvider<C>")
            .finish_non_exhaustive()
    }
}

impl<C> TypedProvider for ComponentProvider<C>
where
    C: Component,
{
    type Output = C::Constructed;

    fn provide<I>(
        &self,
        injector: &I,
        context: &CallContext<'_>,
    ) -> Result<Self::Output, InjectorError>
    where
        I: TypedInjector + ?Sized,
    {
        let injector = ContextForwardingInjectorProxy::new(injector, context);
        match C::construct(&injector) {
            Ok(Ok(obj)) => Ok(obj.post_process()),
            Ok(Err(err)) => Err(provider::construction_failed::<C::Constructed, _>(
                context, err,
            )),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use crate::container::injector::MockInjector;
    use crate::instance::Instance;
    use crate::key::ServiceType;
    use crate::provider::Provider;

    use super::*;

    pub trait Abstract: Send + Sync + 'static {
        fn value(&self) -> i32;
    }

    pub struct Impl {
        value: i32,
    }

    impl Abstract for Impl {
        fn value(&self) -> i32 {
            self.value
        }
    }

    impl Component for Impl {
        type Constructed = Arc<dyn Abstract>;

        type Error = Infallible;

        fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, InjectorError>
        where
            I: TypedInjector + ?Sized,
        {
            Ok(Ok(Impl {
                value: injector.get(&ServiceType::of::<i32>())?,
            }))
        }

        fn post_process(self) -> Self::Constructed {
            Arc::new(self)
        }
    }

    #[test]
    fn component_provider_succeeds() {
        let mut injector = MockInjector::new();
        injector
            .expect_dyn_get_dependency()
            .returning(|_, _| Ok(Instance::new(3i32)));
        let provider = ComponentProvider::<Impl>::new();

        let object = provider
            .provide(&injector, &CallContext::root(None))
            .unwrap();
        assert_eq!(object.value(), 3);

        let instance = provider
            .dyn_provide(&injector, &CallContext::root(None))
            .unwrap();
        assert!(instance.is::<Arc<dyn Abstract>>());
    }
}
