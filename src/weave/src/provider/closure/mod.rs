mod closure_implementation;
mod raw_wrapper;
mod wrapper;

use std::any::Any;
use std::error::Error;

use crate::container::injector::{Injector, InjectorError};
use crate::provider::context::CallContext;

pub use raw_wrapper::RawClosureProvider;
pub use wrapper::ClosureProvider;

/// A specialized form of [`Fn`] that can be called by supplying arguments
/// retrieved from an [`Injector`].
///
/// Closures of `Fn(A1, A2, ...) -> Result<T, E> + Send + Sync + 'static`
/// are [`Closure`]s, where each `Ai` is resolved from the contract
/// `ServiceType::of::<Ai>()` and cloned out of the instance.
///
/// Due to the lack of support for functions of variable length parameters,
/// [`Closure`] is only implemented by functions whose arity is at most 16.
pub trait Closure<D>
where
    Self: Send + Sync + 'static,
    D: Send + Sync + 'static,
{
    /// The successfully constructed object.
    type Constructed: Any + Send + Sync;

    /// The error occurred in object construction after all dependencies are
    /// retrieved.
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Retrieves the dependencies from the injector and calls `self` with
    /// these dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if all dependencies can't be fetched.
    ///
    /// Returns an inner error [`Closure::Error`] wrapped in the outer [`Ok`]
    /// if the object construction fails.
    fn run(
        &self,
        injector: &dyn Injector,
    ) -> Result<Result<Self::Constructed, Self::Error>, InjectorError>;
}

/// A specialized form of [`Fn`] which directly accepts an [`Injector`] and
/// the [`CallContext`] of the activation.
///
/// Raw closures suit open-generic factories: the closed implementation type
/// being built is available through [`CallContext::implementation_type`].
pub trait RawClosure
where
    Self: Fn(
        &dyn Injector,
        &CallContext<'_>,
    ) -> Result<Result<Self::Constructed, Self::Error>, InjectorError>,
    Self: Send + Sync + 'static,
{
    /// The successfully constructed object.
    type Constructed: Any + Send + Sync;

    /// The error occurred in object construction after all dependencies are
    /// retrieved.
    type Error: Into<Box<dyn Error + Send + Sync>>;
}

impl<F, T, E> RawClosure for F
where
    T: Any + Send + Sync,
    E: Into<Box<dyn Error + Send + Sync>>,
    Self: Fn(&dyn Injector, &CallContext<'_>) -> Result<Result<T, E>, InjectorError>,
    Self: Send + Sync + 'static,
{
    type Constructed = T;

    type Error = E;
}
