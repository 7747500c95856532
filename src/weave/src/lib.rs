#![allow(clippy::new_without_default)]

pub mod collection;
pub mod container;
pub mod decorator;
pub mod initializer;
pub mod instance;
pub mod key;
pub mod lifetime;
pub mod matcher;
pub mod module;
pub mod provider;
pub mod scope;
mod util;

pub use weave_derive::component;

pub mod prelude {
    pub use crate::collection::{Collection, Element, ExternalCollection};
    pub use crate::component;
    pub use crate::container::injector::{Injector, InjectorError, TypedInjector};
    pub use crate::container::registry::{Registration, RegistryError};
    pub use crate::container::{Container, ContainerOptions, ErrorKind, VerificationError};
    pub use crate::decorator::DecoratorDescriptor;
    pub use crate::initializer::Initializer;
    pub use crate::instance::Instance;
    pub use crate::key::{Constraint, ServiceType, TypeFacts, TypeParam};
    pub use crate::lifetime::{Lifetime, ScopedLifestyle};
    pub use crate::matcher::Pattern;
    pub use crate::module::{Configuration, Module};
    pub use crate::provider::closure::{ClosureProvider, RawClosureProvider};
    pub use crate::provider::component::ComponentProvider;
    pub use crate::provider::context::CallContext;
    pub use crate::provider::instance::InstanceProvider;
    pub use crate::scope::Scope;
}
