use crate::collection::Collection;
use crate::container::injector::{Injector, InjectorError, TypedInjector};
use crate::instance::Instance;
use crate::key::ServiceType;
use crate::provider::context::CallContext;

/// An [`Injector`] which turns plain requests into dependency requests of the
/// activation described by `context`.
pub struct ContextForwardingInjectorProxy<'a, I>
where
    I: TypedInjector + ?Sized,
{
    inner: &'a I,
    context: &'a CallContext<'a>,
}

impl<'a, I> ContextForwardingInjectorProxy<'a, I>
where
    I: TypedInjector + ?Sized,
{
    pub fn new(inner: &'a I, context: &'a CallContext<'a>) -> Self {
        Self { inner, context }
    }
}

impl<I> Injector for ContextForwardingInjectorProxy<'_, I>
where
    I: TypedInjector + ?Sized,
{
    fn dyn_get(&self, service_type: &ServiceType) -> Result<Instance, InjectorError> {
        self.dyn_get_dependency(service_type, self.context)
    }

    fn dyn_get_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError> {
        self.dyn_get_all_dependency(service_type, self.context)
    }

    fn dyn_get_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Instance, InjectorError> {
        self.inner.dyn_get_dependency(service_type, context)
    }

    fn dyn_get_all_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Collection, InjectorError> {
        self.inner.dyn_get_all_dependency(service_type, context)
    }
}
