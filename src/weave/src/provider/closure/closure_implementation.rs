//! [`Closure`] for plain functions of up to sixteen arguments.
//!
//! Every argument `A` is looked up under the contract `ServiceType::of::<A>()`
//! and cloned out of the shared instance. Named contracts, argument contracts
//! and collections are out of reach here; use a [`RawClosure`] or a component
//! for those.
//!
//! [`RawClosure`]: crate::provider::closure::RawClosure

use std::any::Any;
use std::error::Error;

use crate::container::injector::{Injector, InjectorError, TypedInjector};
use crate::key::ServiceType;
use crate::provider::closure::Closure;

fn argument<A>(injector: &dyn Injector) -> Result<A, InjectorError>
where
    A: Any + Clone + Send + Sync,
{
    injector.get::<A>(&ServiceType::of::<A>())
}

macro_rules! impl_closure {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<F, T, E, $($arg,)*> Closure<($($arg,)*)> for F
        where
            F: Fn($($arg,)*) -> Result<T, E> + Send + Sync + 'static,
            T: Any + Send + Sync,
            E: Into<Box<dyn Error + Send + Sync>>,
            $($arg: Any + Clone + Send + Sync,)*
        {
            type Constructed = T;

            type Error = E;

            fn run(
                &self,
                injector: &dyn Injector,
            ) -> Result<Result<Self::Constructed, Self::Error>, InjectorError> {
                // Left to right, so the first missing contract is the one reported.
                $(let $arg = argument::<$arg>(injector)?;)*
                Ok(self($($arg,)*))
            }
        }
    };
}

// Peels one argument per step, down to the nullary closure.
macro_rules! impl_closure_arities {
    () => {
        impl_closure!();
    };
    ($first:ident $(, $rest:ident)*) => {
        impl_closure!($first $(, $rest)*);
        impl_closure_arities!($($rest),*);
    };
}

impl_closure_arities!(
    A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14, A15, A16
);
