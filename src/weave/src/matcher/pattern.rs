use std::collections::HashSet;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::registry::RegistrationTemplate;
use crate::key::{ServiceType, TypeParam};
use crate::lifetime::Lifetime;
use crate::provider::context::InjectionConsumer;

/// A contract pattern mapped to an implementation pattern.
///
/// Parameters occurring in the contract are bound by the requested closed
/// contract. Extra parameters of the implementation must be declared with
/// [`Pattern::param`] and are inferred from `DerivesFrom` constraints.
///
/// # Examples
///
/// ```rust
/// # use weave::key::ServiceType;
/// # use weave::lifetime::Lifetime;
/// # use weave::matcher::Pattern;
/// let pattern = Pattern::new(
///     ServiceType::named("IRepo").with_param("T"),
///     ServiceType::named("RepoA").with_param("T"),
/// )
/// .lifetime(Lifetime::Singleton);
/// assert!(!pattern.contract().is_closed());
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    contract: ServiceType,
    implementation: ServiceType,
    params: Vec<TypeParam>,
    lifetime: Lifetime,
}

impl Pattern {
    pub fn new(contract: ServiceType, implementation: ServiceType) -> Self {
        Self {
            contract,
            implementation,
            params: Vec::new(),
            lifetime: Lifetime::Transient,
        }
    }

    pub fn param(mut self, param: TypeParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn contract(&self) -> &ServiceType {
        &self.contract
    }

    pub fn implementation(&self) -> &ServiceType {
        &self.implementation
    }

    pub fn params(&self) -> &[TypeParam] {
        &self.params
    }

    pub fn get_lifetime(&self) -> &Lifetime {
        &self.lifetime
    }

    pub(crate) fn into_parts(self) -> (ServiceType, ServiceType, Vec<TypeParam>, Lifetime) {
        (self.contract, self.implementation, self.params, self.lifetime)
    }

    /// Returns the reason why the implementation can't be closed from the
    /// contract and the declared parameters, if any.
    pub(crate) fn validate(
        contract: &ServiceType,
        implementation: &ServiceType,
        params: &[TypeParam],
    ) -> Option<String> {
        let known: HashSet<Arc<str>> = contract
            .params()
            .into_iter()
            .chain(params.iter().map(|param| Arc::clone(param.shared_name())))
            .collect();
        implementation
            .params()
            .into_iter()
            .find(|name| !known.contains(name))
            .map(|name| format!("parameter {name} of {implementation} is not declared"))
    }
}

/// The information a conditional predicate decides on.
pub struct PredicateContext<'a> {
    service_type: &'a ServiceType,
    implementation_type: &'a ServiceType,
    consumer: Option<&'a InjectionConsumer>,
    handled: bool,
}

impl<'a> PredicateContext<'a> {
    pub(crate) fn new(
        service_type: &'a ServiceType,
        implementation_type: &'a ServiceType,
        consumer: Option<&'a InjectionConsumer>,
        handled: bool,
    ) -> Self {
        Self {
            service_type,
            implementation_type,
            consumer,
            handled,
        }
    }

    /// The closed contract being resolved.
    pub fn service_type(&self) -> &ServiceType {
        self.service_type
    }

    /// The closed implementation this registration would supply.
    pub fn implementation_type(&self) -> &ServiceType {
        self.implementation_type
    }

    /// The service the contract is injected into, or [`None`] for a root
    /// resolution.
    pub fn consumer(&self) -> Option<&InjectionConsumer> {
        self.consumer
    }

    /// Returns true if an earlier registration already applies.
    pub fn handled(&self) -> bool {
        self.handled
    }
}

pub(crate) type Predicate = Arc<dyn Fn(&PredicateContext<'_>) -> bool + Send + Sync>;

/// A registration made with [`Pattern`], possibly conditional.
pub(crate) struct PatternRegistration {
    pub(crate) contract: ServiceType,
    pub(crate) implementation: ServiceType,
    pub(crate) params: Vec<TypeParam>,
    pub(crate) template: RegistrationTemplate,
    pub(crate) predicate: Option<Predicate>,
}

impl PatternRegistration {
    pub(crate) fn is_conditional(&self) -> bool {
        self.predicate.is_some()
    }

    /// Returns true if `self` and `other` cover exactly the same requests.
    pub(crate) fn overlaps_fully(&self, other: &PatternRegistration) -> bool {
        self.params.iter().all(TypeParam::is_unconstrained)
            && other.params.iter().all(TypeParam::is_unconstrained)
            && self.contract.normalized() == other.contract.normalized()
    }
}

impl Debug for PatternRegistration {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PatternRegistration")
            .field("contract", &self.contract)
            .field("implementation", &self.implementation)
            .field("conditional", &self.is_conditional())
            .finish_non_exhaustive()
    }
}
