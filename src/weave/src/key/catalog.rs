use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::key::{Bindings, OpenForm, ServiceType};

/// Whether values of a type are shared by reference or copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Reference,
    Value,
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Value => write!(f, "value"),
        }
    }
}

/// Facts about one (possibly generic) type, used to check constraints and
/// assignability.
///
/// Supertypes are written over the type's own parameters, so that
/// `RepoA<T>` can declare `IRepo<T>` as a supertype.
///
/// # Examples
///
/// ```rust
/// # use weave::key::{ServiceType, TypeFacts};
/// let facts = TypeFacts::reference("RepoA")
///     .param("T")
///     .supertype(ServiceType::named("IRepo").with_param("T"));
/// assert_eq!(facts.params().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TypeFacts {
    name: Arc<str>,
    kind: TypeKind,
    default_constructible: bool,
    params: Vec<Arc<str>>,
    supertypes: Vec<ServiceType>,
}

impl TypeFacts {
    pub fn new(name: impl Into<Arc<str>>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default_constructible: false,
            params: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    pub fn reference(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Reference)
    }

    pub fn value(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, TypeKind::Value)
    }

    /// Facts about the Rust type `T`, named like [`ServiceType::of`] does.
    pub fn of<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self::new(std::any::type_name::<T>(), kind)
    }

    pub fn param(mut self, name: impl Into<Arc<str>>) -> Self {
        self.params.push(name.into());
        self
    }

    pub fn supertype(mut self, supertype: ServiceType) -> Self {
        self.supertypes.push(supertype);
        self
    }

    pub fn default_constructible(mut self) -> Self {
        self.default_constructible = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_default_constructible(&self) -> bool {
        self.default_constructible
    }

    pub fn params(&self) -> &[Arc<str>] {
        &self.params
    }

    pub fn supertypes(&self) -> &[ServiceType] {
        &self.supertypes
    }

    fn open_form(&self) -> OpenForm {
        OpenForm {
            name: Arc::clone(&self.name),
            arity: self.params.len(),
        }
    }

    /// Closes every supertype pattern with the arguments of `ty`.
    fn closed_supertypes(&self, ty: &ServiceType) -> Vec<ServiceType> {
        let mut bindings = Bindings::new();
        for (param, arg) in self.params.iter().zip(ty.args()) {
            let Some(arg) = arg.substitute(&Bindings::new()) else {
                return Vec::new();
            };
            bindings.bind(Arc::clone(param), arg);
        }
        self.supertypes
            .iter()
            .filter_map(|supertype| supertype.substitute(&bindings))
            .collect()
    }
}

/// The set of declared [`TypeFacts`], keyed by name and arity.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    facts: HashMap<OpenForm, TypeFacts>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Default::default()
    }

    /// Declares `facts`, replacing any earlier declaration of the same name
    /// and arity.
    pub fn declare(&mut self, facts: TypeFacts) {
        self.facts.insert(facts.open_form(), facts);
    }

    pub fn facts(&self, ty: &ServiceType) -> Option<&TypeFacts> {
        self.facts.get(&ty.open_form())
    }

    pub fn kind(&self, ty: &ServiceType) -> Option<TypeKind> {
        self.facts(ty).map(TypeFacts::kind)
    }

    pub fn is_default_constructible(&self, ty: &ServiceType) -> bool {
        self.facts(ty)
            .is_some_and(TypeFacts::is_default_constructible)
    }

    /// Returns the closed direct supertypes of a closed type.
    pub fn supertypes_of(&self, ty: &ServiceType) -> Vec<ServiceType> {
        self.facts(ty)
            .map(|facts| facts.closed_supertypes(ty))
            .unwrap_or_default()
    }

    /// Returns `ty` followed by all of its transitive supertypes, nearest
    /// first.
    pub fn ancestors(&self, ty: &ServiceType) -> Vec<ServiceType> {
        let mut visited = HashSet::new();
        let mut ancestors = Vec::new();
        let mut queue = VecDeque::from([ty.clone()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            queue.extend(self.supertypes_of(&current));
            ancestors.push(current);
        }
        ancestors
    }

    /// Returns true if a value of `from` can be used where `to` is expected.
    pub fn is_assignable(&self, from: &ServiceType, to: &ServiceType) -> bool {
        from == to || self.ancestors(from).iter().any(|ancestor| ancestor == to)
    }
}
