use std::any::Any;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::injector::InjectorError;
use crate::instance::Instance;
use crate::key::{ServiceType, TypeCatalog};

type InitializeFn = dyn Fn(&Instance) -> Result<(), Box<dyn Error + Send + Sync>> + Send + Sync;

/// An action run on every freshly created instance whose implementation or
/// service type is assignable to `target`.
///
/// Initializers are additive: every applicable initializer runs, in
/// registration order.
#[derive(Clone)]
pub struct Initializer {
    target: ServiceType,
    action: Arc<InitializeFn>,
}

impl Initializer {
    pub fn new<F>(target: ServiceType, action: F) -> Self
    where
        F: Fn(&Instance) -> Result<(), Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
    {
        Self {
            target,
            action: Arc::new(action),
        }
    }

    /// Creates an initializer for instances holding a `T`. Instances of
    /// other Rust types are skipped.
    pub fn typed<T, F>(target: ServiceType, action: F) -> Self
    where
        T: Any,
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::new(target, move |instance| {
            if let Some(object) = instance.get::<T>() {
                action(object);
            }
            Ok(())
        })
    }

    pub fn target(&self) -> &ServiceType {
        &self.target
    }

    pub(crate) fn applies_to(
        &self,
        implementation_type: &ServiceType,
        service_type: &ServiceType,
        catalog: &TypeCatalog,
    ) -> bool {
        catalog.is_assignable(implementation_type, &self.target)
            || catalog.is_assignable(service_type, &self.target)
    }

    pub(crate) fn run(&self, service_type: &ServiceType, instance: &Instance) -> Result<(), InjectorError> {
        (self.action)(instance).map_err(|err| InjectorError::construction(service_type, err))
    }
}

impl Debug for Initializer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Initializer")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
