use std::any::Any;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use crate::container::injector::{ContextForwardingInjectorProxy, InjectorError, TypedInjector};
use crate::provider::closure::RawClosure;
use crate::provider::context::CallContext;
use crate::provider::{self, TypedProvider};

/// A [`Provider`] which supplies objects from a [`RawClosure`].
///
/// [`Provider`]: crate::provider::Provider
pub struct RawClosureProvider<T, C>
where
    T: Any + Send + Sync,
    C: RawClosure<Constructed = T>,
{
    closure: C,
}

impl<T, C> RawClosureProvider<T, C>
where
    T: Any + Send + Sync,
    C: RawClosure<Constructed = T>,
{
    pub fn new(closure: C) -> Self {
        Self { closure }
    }
}

impl<T, C> Debug for RawClosureProvider<T, C>
where
    T: Any + Send + Sync,
    C: RawClosure<Constructed = T>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("RawClosureProvider<T, C>")
            .finish_non_exhaustive()
    }
}

impl<T, C> TypedProvider for RawClosureProvider<T, C>
where
    T: Any + Send + Sync,
    C: RawClosure<Constructed = T>,
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
        let injector = ContextForwardingInjectorProxy::new(injector, context);
        match (self.closure)(&injector, context) {
            Ok(Ok(obj)) => Ok(obj),
            Ok(Err(err)) => Err(provider::construction_failed::<T, _>(context, err)),
            Err(err) => Err(err),
        }
    }
}
