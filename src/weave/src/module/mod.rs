//! Grouping registrations into reusable units.

use std::any;
use std::error::Error;

use crate::container::registry::RegistryError;
use crate::container::Container;

/// A unit of configuration applied by [`Container::init`].
///
/// # Examples
///
/// ```rust
/// # use std::error::Error;
/// # use weave::prelude::*;
/// struct Settings;
///
/// impl Module for Settings {
///     fn configure(&self, container: &Container) -> Result<(), Box<dyn Error + Send + Sync>> {
///         container.register_instance(ServiceType::named("Port"), 8080u16)?;
///         Ok(())
///     }
/// }
///
/// let container = Container::init(Settings).unwrap();
/// let port: u16 = container.get(&ServiceType::named("Port")).unwrap();
/// assert_eq!(port, 8080);
/// ```
pub trait Module: 'static {
    /// Applies the module, reporting its failure to `errors`. Registry
    /// errors are reported as they are, others are attributed to the module.
    fn setup(&self, container: &Container, errors: &mut Vec<RegistryError>) {
        if let Err(err) = self.configure(container) {
            let err = match err.downcast::<RegistryError>() {
                Ok(err) => *err,
                Err(source) => RegistryError::ModuleInner {
                    module: any::type_name::<Self>(),
                    source,
                },
            };
            errors.push(err);
        }
    }

    fn configure(&self, container: &Container) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// A [`Module`] made of other modules, applied in order.
#[derive(Default)]
pub struct Configuration {
    modules: Vec<Box<dyn Module>>,
}

impl Configuration {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<M: Module>(mut self, module: M) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn compose(mut self, mut other: Configuration) -> Self {
        self.modules.append(&mut other.modules);
        self
    }
}

impl Module for Configuration {
    fn setup(&self, container: &Container, errors: &mut Vec<RegistryError>) {
        for module in &self.modules {
            module.setup(container, errors);
        }
    }

    fn configure(&self, _container: &Container) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
