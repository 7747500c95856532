mod wrapper;

use std::any::Any;
use std::error::Error;

use crate::container::injector::{InjectorError, TypedInjector};

pub use wrapper::ComponentProvider;

/// An implementation type that knows which contracts its constructor needs.
///
/// [`Component::construct`] pulls each dependency out of the injector by
/// [`ServiceType`], which may be the contract of a plain Rust type, a named
/// contract, or a generic contract closed over its arguments. The instance it
/// builds is then turned into the shape consumers of the registered contract
/// expect by [`Component::post_process`].
///
/// The [`component`] attribute derives all of this from a constructor
/// signature. A hand-written component reads like:
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::sync::Arc;
/// # use weave::container::injector::{InjectorError, TypedInjector};
/// # use weave::key::ServiceType;
/// # use weave::provider::component::Component;
/// trait Repository: Send + Sync {}
///
/// struct OrderRepository {
///     pool_size: u32,
///     connection: Arc<String>,
/// }
///
/// impl Repository for OrderRepository {}
///
/// impl Component for OrderRepository {
///     type Constructed = Arc<dyn Repository>;
///
///     type Error = Infallible;
///
///     fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, InjectorError>
///     where
///         I: TypedInjector + ?Sized,
///     {
///         let pool_size = injector.get(&ServiceType::of::<u32>())?;
///         let connection = injector.get(
///             &ServiceType::named("IConnection").with_arg(ServiceType::named("Order")),
///         )?;
///         Ok(Ok(Self { pool_size, connection }))
///     }
///
///     fn post_process(self) -> Self::Constructed {
///         Arc::new(self)
///     }
/// }
/// ```
///
/// Register it through a [`ComponentProvider`] or
/// [`Container::register_component`].
///
/// [`component`]: crate::component
/// [`ServiceType`]: crate::key::ServiceType
/// [`Container::register_component`]: crate::container::Container::register_component
pub trait Component: Send + Sync + Sized + 'static {
    /// What the registration hands out, such as `Arc<Self>` or
    /// `Arc<dyn Contract>`.
    type Constructed: Any + Send + Sync;

    /// Failure of the constructor body, raised after every dependency was
    /// resolved.
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Resolves the dependencies and runs the constructor.
    ///
    /// # Errors
    ///
    /// The outer error is a failed resolution of some dependency. A failed
    /// constructor body comes back as the inner [`Component::Error`].
    fn construct<I>(injector: &I) -> Result<Result<Self, Self::Error>, InjectorError>
    where
        I: TypedInjector + ?Sized;

    /// Wraps the constructed value for the consumers of the contract.
    fn post_process(self) -> Self::Constructed;
}
