mod attrs;
mod impls;

use proc_macro::TokenStream;

/// Derives `weave::provider::component::Component` from the constructor
/// annotated with `#[inject]` in an `impl` block.
///
/// Every constructor argument is resolved from the injector:
///
/// - by default, from `ServiceType::of::<T>()` where `T` is the argument type;
/// - `#[named("IClock")]` resolves `ServiceType::named("IClock")`;
/// - `#[contract(expr)]` resolves the `ServiceType` that `expr` evaluates to;
/// - `#[all]` collects the elements of `ServiceType::of::<T>()` into a
///   `Vec<T>` (or another collection), and `#[all(expr)]` collects the
///   contract `expr`.
///
/// The constructor returns `Self` or `Result<Self, E>`. The attribute may
/// name the constructed type and a post-processor converting `Self` into it,
/// e.g. `#[component(Arc<dyn Clock>, Arc::new)]`.
#[proc_macro_attribute]
pub fn component(attr: TokenStream, item: TokenStream) -> TokenStream {
    attrs::parse_attributes(attr)
        .and_then(|attr_data| impls::expand_implementation(item, attr_data))
        .unwrap_or_else(|err| err.into_compile_error())
        .into()
}
