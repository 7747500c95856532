use std::any::Any;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::container::injector::{Injector, InjectorError, TypedInjector};
use crate::instance::Instance;
use crate::provider::context::CallContext;
use crate::provider::{Provider, TypedProvider};

/// A [`Provider`] which hands out clones of one value.
pub struct InstanceProvider<T>
where
    T: Any + Clone + Send + Sync,
{
    instance: T,
}

impl<T> InstanceProvider<T>
where
    T: Any + Clone + Send + Sync,
{
    pub fn new(instance: T) -> Self {
        Self { instance }
    }
}

impl<T> Debug for InstanceProvider<T>
where
    T: Any + Clone + Send + Sync,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("InstanceProvider<T>")
            .finish_non_exhaustive()
    }
}

impl<T> TypedProvider for InstanceProvider<T>
where
    T: Any + Clone + Send + Sync,
{
    type Output = T;

    fn provide<I>(
        &self,
        _injector: &I,
        _context: &CallContext<'_>,
    ) -> Result<Self::Output, InjectorError>
    where
        I: TypedInjector + ?Sized,
    {
        Ok(self.instance.clone())
    }
}

/// A [`Provider`] which always returns the same [`Instance`], so that every
/// resolution shares one object regardless of the lifetime.
#[derive(Debug)]
pub struct SharedInstanceProvider {
    instance: Instance,
}

impl SharedInstanceProvider {
    pub fn new(instance: Instance) -> Self {
        Self { instance }
    }
}

impl Provider for SharedInstanceProvider {
    fn dyn_provide(
        &self,
        _injector: &dyn Injector,
        _context: &CallContext<'_>,
    ) -> Result<Instance, InjectorError> {
        Ok(self.instance.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::container::injector::MockInjector;

    use super::*;

    #[test]
    fn instance_provider_succeeds() {
        let provider = InstanceProvider::new(42);
        let injector = MockInjector::new();

        let res = provider.provide(&injector, &CallContext::root(None));
        assert_eq!(res.unwrap(), 42);

        let res = provider.provide(&injector, &CallContext::root(None));
        assert_eq!(res.unwrap(), 42);
    }

    #[test]
    fn shared_instance_provider_shares_object() {
        let instance = Instance::new(String::from("shared"));
        let provider = SharedInstanceProvider::new(instance.clone());
        let injector = MockInjector::new();

        let res = provider
            .dyn_provide(&injector, &CallContext::root(None))
            .unwrap();
        assert!(res.ptr_eq(&instance));
    }
}
