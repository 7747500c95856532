use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::key::{ServiceType, TypeArg};

/// A declared type parameter of a pattern, with the constraints a binding
/// must satisfy.
///
/// # Examples
///
/// ```rust
/// # use weave::key::{Constraint, ServiceType, TypeArg, TypeParam};
/// let param = TypeParam::new("T")
///     .constraint(Constraint::ReferenceType)
///     .constraint(Constraint::DerivesFrom(TypeArg::Type(ServiceType::named("Entity"))));
/// assert_eq!(param.name(), "T");
/// assert_eq!(param.constraints().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    name: Arc<str>,
    constraints: Vec<Constraint>,
}

impl TypeParam {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            constraints: Vec::new(),
        }
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// A requirement on the type bound to a [`TypeParam`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// The bound type must be declared as [`TypeKind::Reference`].
    ///
    /// [`TypeKind::Reference`]: crate::key::TypeKind::Reference
    ReferenceType,
    /// The bound type must be declared as [`TypeKind::Value`].
    ///
    /// [`TypeKind::Value`]: crate::key::TypeKind::Value
    ValueType,
    /// The bound type must be declared default constructible.
    DefaultConstructor,
    /// The bound type must be assignable to the target, which may mention
    /// other parameters of the same declaration.
    DerivesFrom(TypeArg),
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ReferenceType => write!(f, "reference type"),
            Self::ValueType => write!(f, "value type"),
            Self::DefaultConstructor => write!(f, "default constructor"),
            Self::DerivesFrom(target) => write!(f, "derives from {target}"),
        }
    }
}

/// Closed types bound to parameter names during unification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    bound: BTreeMap<Arc<str>, ServiceType>,
}

impl Bindings {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, name: &str) -> Option<&ServiceType> {
        self.bound.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bound.contains_key(name)
    }

    /// Binds `name` to `ty`. Returns false if `name` is already bound to a
    /// different type.
    pub fn bind(&mut self, name: impl Into<Arc<str>>, ty: ServiceType) -> bool {
        let name = name.into();
        match self.bound.get(&name) {
            Some(existing) => *existing == ty,
            None => {
                self.bound.insert(name, ty);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ServiceType)> {
        self.bound.iter().map(|(name, ty)| (name.as_ref(), ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_bind_rejects_conflicts() {
        let mut bindings = Bindings::new();
        assert!(bindings.bind("T", ServiceType::named("A")));
        assert!(bindings.bind("T", ServiceType::named("A")));
        assert!(!bindings.bind("T", ServiceType::named("B")));
        assert_eq!(bindings.get("T"), Some(&ServiceType::named("A")));
        assert_eq!(bindings.len(), 1);
    }
}
