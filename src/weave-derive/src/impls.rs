use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::token::Comma;
use syn::visit_mut::{self, VisitMut};
use syn::{
    AngleBracketedGenericArguments, Attribute, Error as SynError, Expr, FnArg, GenericArgument,
    Ident, ImplItem, ImplItemFn, ItemImpl, Meta, PathArguments, Result as SynResult, ReturnType,
    Signature, Type, TypePath,
};

use crate::attrs::AttributeData;

const RETURN_TYPE_HINT: &str = "a constructor's return type should be `Self` or `Result<Self, E>`";

#[derive(Debug)]
struct ConstructorData {
    self_type: TypePath,
    identifier: Ident,
    arguments: Vec<ArgumentData>,
    return_type: ReturnTypeData,
}

#[derive(Debug)]
struct ArgumentData {
    span: Span,
    ty: Type,
    source: DependencySource,
}

/// Where an argument of the constructor is resolved from.
#[derive(Debug)]
enum DependencySource {
    /// `ServiceType::of::<T>()` for the argument type `T`.
    Inferred,
    /// `#[named("...")]`
    Named(Expr),
    /// `#[contract(expr)]`, where `expr` evaluates to a `ServiceType`.
    Contract(Expr),
    /// `#[all]` or `#[all(expr)]`, resolving a collection.
    All(Option<Expr>),
}

#[derive(Debug)]
enum ReturnTypeData {
    Infallible,
    Result { error_type: Type },
}

struct AttributeRemovalVisitor;

impl AttributeRemovalVisitor {
    fn is_custom_attribute(attr: &Attribute) -> bool {
        ["inject", "named", "contract", "all"]
            .iter()
            .any(|name| attr.path().is_ident(name))
    }
}

impl VisitMut for AttributeRemovalVisitor {
    fn visit_attributes_mut(&mut self, attrs: &mut Vec<Attribute>) {
        attrs.retain(|attr| !Self::is_custom_attribute(attr));
        attrs
            .iter_mut()
            .for_each(|attr| visit_mut::visit_attribute_mut(self, attr));
    }
}

pub fn expand_implementation(
    impls: TokenStream,
    attr_data: AttributeData,
) -> SynResult<TokenStream2> {
    let mut impls = match syn::parse::<ItemImpl>(impls) {
        Ok(impls) => impls,
        Err(err) => {
            return Err(SynError::new(
                err.span(),
                "`#[component]` should be annotated on the `impl` block",
            ))
        }
    };

    let self_type = get_self_type(&impls)?;
    let signature = get_constructor_signature(&impls.items, impls.span())?;
    let ctor_data = parse_constructor(self_type, signature)?;

    let expanded = expand_component_implementation(ctor_data, attr_data)?;

    let mut visitor = AttributeRemovalVisitor;
    visitor.visit_item_impl_mut(&mut impls);

    Ok(quote! {
        #impls
        #expanded
    })
}

fn get_self_type(impls: &ItemImpl) -> SynResult<TypePath> {
    if let Type::Path(ty) = impls.self_ty.as_ref() {
        Ok(ty.clone())
    } else {
        Err(SynError::new(impls.self_ty.span(), "invalid self type"))
    }
}

fn get_constructor_signature(items: &[ImplItem], impl_span: Span) -> SynResult<Signature> {
    let ctors: Vec<&ImplItemFn> = items
        .iter()
        .filter_map(|item| match item {
            ImplItem::Fn(item_fn) => Some(item_fn),
            _ => None,
        })
        .filter(|item_fn| item_fn.attrs.iter().any(|attr| attr.path().is_ident("inject")))
        .collect();

    let signature = match ctors.as_slice() {
        [ctor] => ctor.sig.clone(),
        [] => {
            return Err(SynError::new(
                impl_span,
                "no associated function is annotated with `#[inject]`",
            ))
        }
        _ => {
            return Err(SynError::new(
                impl_span,
                "only one associated function can be annotated with `#[inject]`",
            ))
        }
    };

    if let Some(FnArg::Receiver(rec)) = signature.inputs.first() {
        return Err(SynError::new(
            rec.span(),
            "method is not allowed to be annotated with `#[inject]`",
        ));
    }

    Ok(signature)
}

fn parse_constructor(self_type: TypePath, signature: Signature) -> SynResult<ConstructorData> {
    let identifier = signature.ident;
    let arguments = parse_constructor_arguments(signature.inputs)?;
    let return_type = parse_constructor_return_type(signature.output, &self_type)?;

    Ok(ConstructorData {
        self_type,
        identifier,
        arguments,
        return_type,
    })
}

fn parse_constructor_arguments(inputs: Punctuated<FnArg, Comma>) -> SynResult<Vec<ArgumentData>> {
    inputs
        .into_iter()
        .map(|arg| -> SynResult<ArgumentData> {
            let FnArg::Typed(arg) = arg else {
                unreachable!("a constructor should not have a receiver argument");
            };
            let span = arg.span();
            let ty = *arg.ty;
            let source = parse_argument_attributes(arg.attrs)?;
            if let DependencySource::All(None) = &source {
                element_type(&ty)?;
            }
            Ok(ArgumentData { span, ty, source })
        })
        .collect()
}

fn parse_argument_attributes(attrs: Vec<Attribute>) -> SynResult<DependencySource> {
    let mut res: Option<DependencySource> = None;

    for attr in attrs {
        let Some(name) = attr.path().get_ident().map(ToString::to_string) else {
            continue;
        };
        let source = match (name.as_str(), &attr.meta) {
            ("named", Meta::List(_)) => DependencySource::Named(attr.parse_args()?),
            ("contract", Meta::List(_)) => DependencySource::Contract(attr.parse_args()?),
            ("all", Meta::Path(_)) => DependencySource::All(None),
            ("all", Meta::List(_)) => DependencySource::All(Some(attr.parse_args()?)),
            ("named", _) => {
                return Err(SynError::new(
                    attr.path().span(),
                    "expects `#[named(...)]` to receive the name of the contract",
                ))
            }
            ("contract", _) => {
                return Err(SynError::new(
                    attr.path().span(),
                    "expects `#[contract(...)]` to receive a `ServiceType` expression",
                ))
            }
            ("all", _) => {
                return Err(SynError::new(
                    attr.path().span(),
                    "expects `#[all]` or `#[all(...)]` with a `ServiceType` expression",
                ))
            }
            _ => continue,
        };

        if res.is_some() {
            return Err(SynError::new(
                attr.path().span(),
                "only one attribute of `#[named(...)]`, `#[contract(...)]` or `#[all]` is allowed",
            ));
        }
        res = Some(source);
    }

    Ok(res.unwrap_or(DependencySource::Inferred))
}

/// Returns `T` of an argument type such as `Vec<T>`.
fn element_type(ty: &Type) -> SynResult<&Type> {
    let error = || {
        SynError::new(
            ty.span(),
            "can't infer the element type of this argument, use `#[all(...)]` to name the contract",
        )
    };
    let Type::Path(path) = ty else {
        return Err(error());
    };
    let Some(segment) = path.path.segments.last() else {
        return Err(error());
    };
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }) =
        &segment.arguments
    else {
        return Err(error());
    };
    match args.first() {
        Some(GenericArgument::Type(element)) => Ok(element),
        _ => Err(error()),
    }
}

fn is_self_type(ty: &TypePath, self_type: &TypePath) -> bool {
    ty == self_type || ty.path.is_ident("Self")
}

fn parse_constructor_return_type(
    output: ReturnType,
    self_type: &TypePath,
) -> SynResult<ReturnTypeData> {
    let ReturnType::Type(_, return_type) = output else {
        return Err(SynError::new(output.span(), RETURN_TYPE_HINT));
    };
    let Type::Path(return_type) = *return_type else {
        return Err(SynError::new(return_type.span(), RETURN_TYPE_HINT));
    };

    if is_self_type(&return_type, self_type) {
        return Ok(ReturnTypeData::Infallible);
    }

    let segments: Vec<String> = return_type
        .path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect();
    let is_result = matches!(
        segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
        ["Result"] | ["std", "result", "Result"] | ["core", "result", "Result"]
    );
    let Some(last) = return_type.path.segments.last().filter(|_| is_result) else {
        return Err(SynError::new(return_type.span(), RETURN_TYPE_HINT));
    };
    parse_result_return_type(&last.arguments, self_type)
}

fn parse_result_return_type(
    type_args: &PathArguments,
    self_type: &TypePath,
) -> SynResult<ReturnTypeData> {
    let PathArguments::AngleBracketed(AngleBracketedGenericArguments {
        args: type_args, ..
    }) = type_args
    else {
        return Err(SynError::new(type_args.span(), RETURN_TYPE_HINT));
    };

    let mut args = type_args.iter();
    match (args.next(), args.next(), args.next()) {
        (
            Some(GenericArgument::Type(Type::Path(ok_type))),
            Some(GenericArgument::Type(error_type)),
            None,
        ) if is_self_type(ok_type, self_type) => Ok(ReturnTypeData::Result {
            error_type: error_type.clone(),
        }),
        _ => Err(SynError::new(type_args.span(), RETURN_TYPE_HINT)),
    }
}

fn expand_dependency(arg: &ArgumentData) -> SynResult<TokenStream2> {
    let ty = &arg.ty;
    let tokens = match &arg.source {
        DependencySource::Inferred => {
            quote! { injector.get(&weave::key::ServiceType::of::<#ty>())? }
        }
        DependencySource::Named(name) => {
            quote! { injector.get(&weave::key::ServiceType::named(#name))? }
        }
        DependencySource::Contract(contract) => quote! { injector.get(&(#contract))? },
        DependencySource::All(Some(contract)) => quote! { injector.collect(&(#contract))? },
        DependencySource::All(None) => {
            let element = element_type(ty)?;
            quote! { injector.collect(&weave::key::ServiceType::of::<#element>())? }
        }
    };
    Ok(tokens)
}

fn expand_component_implementation(
    ctor_data: ConstructorData,
    attr_data: AttributeData,
) -> SynResult<TokenStream2> {
    let self_type = &ctor_data.self_type;
    let constructor = &ctor_data.identifier;

    let associated_type_constructed = match &attr_data {
        AttributeData::Full { output_type, .. } => quote! { type Constructed = #output_type; },
        AttributeData::Default => quote! { type Constructed = #self_type; },
    };

    let associated_type_error = match &ctor_data.return_type {
        ReturnTypeData::Result { error_type } => quote! { type Error = #error_type; },
        ReturnTypeData::Infallible => quote! { type Error = std::convert::Infallible; },
    };

    let mut get_dep_statements = TokenStream2::new();
    let mut dep_args = TokenStream2::new();
    for (i, arg) in ctor_data.arguments.iter().enumerate() {
        let dep = Ident::new(&format!("dep{i}"), arg.span);
        let ty = &arg.ty;
        let value = expand_dependency(arg)?;
        get_dep_statements.extend(quote! { let #dep: #ty = #value; });
        dep_args.extend(quote! { #dep, });
    }

    let wire_deps = match &ctor_data.return_type {
        ReturnTypeData::Infallible => quote! { Ok(Ok(#self_type::#constructor(#dep_args))) },
        ReturnTypeData::Result { .. } => quote! { Ok(#self_type::#constructor(#dep_args)) },
    };

    let post_process_body = match &attr_data {
        AttributeData::Full { post_processor, .. } => quote! { #post_processor(self) },
        AttributeData::Default => quote! { self },
    };

    Ok(quote! {
        impl weave::provider::component::Component for #self_type {
            #associated_type_constructed
            #associated_type_error

            fn construct<I>(injector: &I) -> std::result::Result<
                std::result::Result<Self, Self::Error>,
                weave::container::injector::InjectorError
            >
            where
                I: weave::container::injector::TypedInjector + ?Sized
            {
                #get_dep_statements
                #wire_deps
            }

            fn post_process(self) -> Self::Constructed {
                #post_process_body
            }
        }
    })
}
