pub mod injector;
pub mod registry;

pub(crate) mod core;
mod handle;
pub(crate) mod options;
pub(crate) mod producer;
pub(crate) mod slot;
pub(crate) mod unregistered;
mod verify;

pub use handle::Container;
pub use options::ContainerOptions;
pub use producer::InstanceProducer;
pub use unregistered::UnregisteredTypeEvent;
pub use verify::VerificationError;

/// The broad category of a container error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The registrations are inconsistent.
    Configuration,
    /// A service could not be built.
    Activation,
    /// The container was used in a way it doesn't allow.
    Usage,
}
