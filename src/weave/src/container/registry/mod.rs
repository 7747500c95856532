mod registration;
mod state;
mod store;

use std::error::Error;

use snafu::prelude::*;

use crate::container::ErrorKind;
use crate::key::ServiceType;
use crate::util::display::AggregatedDisplayer;

pub use registration::{ContainerId, Registration, RegistrationId};
pub(crate) use registration::{Recipe, RegistrationTemplate};
pub(crate) use state::ConfigState;
pub(crate) use store::RegistrationStore;

/// An error raised while a container is being configured.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum RegistryError {
    #[snafu(display("type {service_type} has already been registered"))]
    #[non_exhaustive]
    DuplicateRegistration { service_type: ServiceType },
    #[snafu(display(
        "type {service_type} can't be registered both conditionally and unconditionally"
    ))]
    #[non_exhaustive]
    MixedConditional { service_type: ServiceType },
    #[snafu(display("a collection of {service_type} has already been registered"))]
    #[non_exhaustive]
    DuplicateCollection { service_type: ServiceType },
    #[snafu(display(
        "the collection of {service_type} is already registered with {existing}, not with {requested}"
    ))]
    #[non_exhaustive]
    CollectionStyleMixed {
        service_type: ServiceType,
        existing: &'static str,
        requested: &'static str,
    },
    #[snafu(display(
        "type {service_type} is registered as scoped, but no default scoped lifestyle is configured"
    ))]
    #[non_exhaustive]
    NoDefaultScopedLifestyle { service_type: ServiceType },
    #[snafu(display("the registration of {implementation_type} belongs to another container"))]
    #[non_exhaustive]
    ForeignRegistration { implementation_type: ServiceType },
    #[snafu(display("the registration of {pattern} is invalid: {reason}"))]
    #[non_exhaustive]
    InvalidPattern { pattern: ServiceType, reason: String },
    #[snafu(display("the container is locked, so {operation} is no longer allowed"))]
    #[non_exhaustive]
    ContainerLocked { operation: &'static str },
    #[snafu(display("module {module} fails to setup the configuration"))]
    #[non_exhaustive]
    ModuleInner {
        module: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
    #[snafu(display("aggregated registry errors:\n{}", AggregatedDisplayer::new(errors)))]
    Aggregated { errors: Vec<RegistryError> },
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ContainerLocked { .. } | Self::CollectionStyleMixed { .. } => ErrorKind::Usage,
            _ => ErrorKind::Configuration,
        }
    }
}
