mod catalog;
mod param;

use std::any::{self, TypeId};
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use catalog::{TypeCatalog, TypeFacts, TypeKind};
pub use param::{Bindings, Constraint, TypeParam};

/// A structural descriptor of a contract or an implementation.
///
/// A [`ServiceType`] is a name plus an ordered list of type arguments. Each
/// argument is either another [`ServiceType`] or a named type parameter. A
/// descriptor without any parameter, at any depth, is *closed* and can be
/// resolved; a descriptor with parameters is a *pattern* which is matched
/// against closed requests.
///
/// Equality and hashing only consider the name and the arguments, so
/// `ServiceType::of::<T>()` and `ServiceType::named(type_name::<T>())` are
/// the same contract.
///
/// # Examples
///
/// ```rust
/// # use weave::key::ServiceType;
/// let open = ServiceType::named("IRepo").with_param("T");
/// let closed = ServiceType::named("IRepo").with_arg(ServiceType::named("Entity"));
/// assert!(!open.is_closed());
/// assert!(closed.is_closed());
/// assert_eq!(closed.to_string(), "IRepo<Entity>");
/// assert_eq!(open.open_form(), closed.open_form());
/// ```
#[derive(Clone)]
pub struct ServiceType {
    name: Arc<str>,
    args: Arc<[TypeArg]>,
    rust_type: Option<TypeId>,
}

impl ServiceType {
    /// Creates a closed descriptor for the Rust type `T`. Instances produced
    /// for this contract are checked to actually hold a `T`.
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: Arc::from(any::type_name::<T>()),
            args: Arc::from([]),
            rust_type: Some(TypeId::of::<T>()),
        }
    }

    /// Creates a descriptor without type arguments.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            args: Arc::from([]),
            rust_type: None,
        }
    }

    /// Creates a descriptor with the given type arguments.
    pub fn generic<I>(name: impl Into<Arc<str>>, args: I) -> Self
    where
        I: IntoIterator<Item = TypeArg>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
            rust_type: None,
        }
    }

    /// Appends a type argument.
    pub fn with_arg(self, arg: impl Into<TypeArg>) -> Self {
        let mut args = self.args.to_vec();
        args.push(arg.into());
        Self {
            name: self.name,
            args: Arc::from(args),
            rust_type: None,
        }
    }

    /// Appends a type parameter named `name`.
    pub fn with_param(self, name: impl Into<Arc<str>>) -> Self {
        self.with_arg(TypeArg::Param(name.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[TypeArg] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// The [`TypeId`] of the Rust type this descriptor was built from, if it
    /// was built with [`ServiceType::of`].
    pub fn rust_type(&self) -> Option<TypeId> {
        self.rust_type
    }

    /// Returns true if no type parameter occurs in the descriptor.
    pub fn is_closed(&self) -> bool {
        self.args.iter().all(TypeArg::is_closed)
    }

    /// The name and arity shared by every closed form of this descriptor.
    pub fn open_form(&self) -> OpenForm {
        OpenForm {
            name: Arc::clone(&self.name),
            arity: self.args.len(),
        }
    }

    /// Returns every parameter name in order of first occurrence.
    pub fn params(&self) -> Vec<Arc<str>> {
        let mut params = Vec::new();
        self.collect_params(&mut params);
        params
    }

    fn collect_params(&self, params: &mut Vec<Arc<str>>) {
        for arg in self.args.iter() {
            match arg {
                TypeArg::Param(name) => {
                    if !params.contains(name) {
                        params.push(Arc::clone(name));
                    }
                }
                TypeArg::Type(ty) => ty.collect_params(params),
            }
        }
    }

    /// Replaces every parameter with its binding. Returns [`None`] if some
    /// parameter is unbound.
    pub fn substitute(&self, bindings: &Bindings) -> Option<ServiceType> {
        if self.is_closed() {
            return Some(self.clone());
        }
        let args = self
            .args
            .iter()
            .map(|arg| arg.substitute(bindings).map(TypeArg::Type))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::generic(Arc::clone(&self.name), args))
    }

    /// Renames parameters positionally, so that two patterns which only
    /// differ in parameter names compare equal.
    pub(crate) fn normalized(&self) -> ServiceType {
        let renames: HashMap<Arc<str>, Arc<str>> = self
            .params()
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, Arc::from(format!("#{i}"))))
            .collect();
        self.rename(&renames)
    }

    fn rename(&self, renames: &HashMap<Arc<str>, Arc<str>>) -> ServiceType {
        if self.is_closed() {
            return self.clone();
        }
        let args = self.args.iter().map(|arg| match arg {
            TypeArg::Param(name) => TypeArg::Param(Arc::clone(renames.get(name).unwrap_or(name))),
            TypeArg::Type(ty) => TypeArg::Type(ty.rename(renames)),
        });
        Self::generic(Arc::clone(&self.name), args)
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.args == other.args
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.args.hash(state);
    }
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl Debug for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

/// A type argument of a [`ServiceType`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeArg {
    Type(ServiceType),
    Param(Arc<str>),
}

impl TypeArg {
    pub fn param(name: impl Into<Arc<str>>) -> Self {
        Self::Param(name.into())
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Self::Type(ty) => ty.is_closed(),
            Self::Param(_) => false,
        }
    }

    pub fn substitute(&self, bindings: &Bindings) -> Option<ServiceType> {
        match self {
            Self::Type(ty) => ty.substitute(bindings),
            Self::Param(name) => bindings.get(name).cloned(),
        }
    }
}

impl From<ServiceType> for TypeArg {
    fn from(ty: ServiceType) -> Self {
        Self::Type(ty)
    }
}

impl Display for TypeArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Type(ty) => Display::fmt(ty, f),
            Self::Param(name) => write!(f, "{name}"),
        }
    }
}

impl Debug for TypeArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

/// The name and arity of a [`ServiceType`], used to group every pattern that
/// could possibly match a closed request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpenForm {
    name: Arc<str>,
    arity: usize,
}

impl Display for OpenForm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}`{}", self.name, self.arity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> ServiceType {
        ServiceType::named("IRepo")
    }

    #[test]
    fn service_type_eq_ignores_rust_type() {
        let typed = ServiceType::of::<i32>();
        let named = ServiceType::named(any::type_name::<i32>());
        assert_eq!(typed, named);
        assert_eq!(typed.rust_type(), Some(TypeId::of::<i32>()));
        assert_eq!(named.rust_type(), None);
    }

    #[test]
    fn service_type_is_closed_succeeds() {
        let nested = repo().with_arg(ServiceType::named("List").with_param("T"));
        assert!(!nested.is_closed());
        assert!(repo().with_arg(ServiceType::named("Entity")).is_closed());
        assert!(repo().is_closed());
    }

    #[test]
    fn service_type_params_are_deduplicated_in_order() {
        let ty = ServiceType::named("Map")
            .with_param("K")
            .with_arg(ServiceType::named("List").with_param("V"))
            .with_param("K");
        let params: Vec<_> = ty.params().iter().map(ToString::to_string).collect();
        assert_eq!(params, ["K", "V"]);
    }

    #[test]
    fn service_type_substitute_succeeds() {
        let pattern = repo().with_arg(ServiceType::named("List").with_param("T"));
        let mut bindings = Bindings::new();
        assert!(bindings.bind("T", ServiceType::named("Entity")));

        let closed = pattern.substitute(&bindings).unwrap();
        assert_eq!(closed.to_string(), "IRepo<List<Entity>>");
        assert!(repo().with_param("U").substitute(&bindings).is_none());
    }

    #[test]
    fn service_type_normalized_ignores_param_names() {
        let a = repo().with_param("T");
        let b = repo().with_param("TEntity");
        assert_ne!(a, b);
        assert_eq!(a.normalized(), b.normalized());
    }
}
