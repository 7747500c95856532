use std::sync::Arc;

use crate::key::{Bindings, Constraint, ServiceType, TypeArg, TypeCatalog, TypeKind, TypeParam};

/// Binds the parameters of `pattern` so that it equals the closed `target`.
/// Returns false on a structural mismatch or a conflicting binding.
pub(crate) fn unify(pattern: &ServiceType, target: &ServiceType, bindings: &mut Bindings) -> bool {
    if pattern.name() != target.name() || pattern.arity() != target.arity() {
        return false;
    }
    pattern
        .args()
        .iter()
        .zip(target.args())
        .all(|(pattern, target)| unify_arg(pattern, target, bindings))
}

fn unify_arg(pattern: &TypeArg, target: &TypeArg, bindings: &mut Bindings) -> bool {
    match (pattern, target) {
        (TypeArg::Param(name), TypeArg::Type(target)) if target.is_closed() => {
            bindings.bind(Arc::clone(name), target.clone())
        }
        (TypeArg::Type(pattern), TypeArg::Type(target)) => unify(pattern, target, bindings),
        _ => false,
    }
}

/// Closes `pattern` against `target`: unifies them, infers the parameters
/// implied by `DerivesFrom` constraints, and checks every constraint.
///
/// Every parameter of `pattern`, of `params` and of `implementation` must
/// end up bound.
pub(crate) fn close(
    pattern: &ServiceType,
    implementation: &ServiceType,
    params: &[TypeParam],
    target: &ServiceType,
    catalog: &TypeCatalog,
) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    if !unify(pattern, target, &mut bindings) {
        return None;
    }
    propagate(params, catalog, &mut bindings);

    let all_bound = pattern
        .params()
        .iter()
        .chain(implementation.params().iter())
        .all(|name| bindings.contains(name))
        && params.iter().all(|param| bindings.contains(param.name()));
    if !all_bound {
        return None;
    }

    params
        .iter()
        .all(|param| satisfies(param, &bindings, catalog))
        .then_some(bindings)
}

/// Binds parameters occurring in `DerivesFrom` targets by walking the
/// supertypes of the already bound type, until nothing changes.
fn propagate(params: &[TypeParam], catalog: &TypeCatalog, bindings: &mut Bindings) {
    loop {
        let mut changed = false;
        for param in params {
            let Some(bound) = bindings.get(param.name()).cloned() else {
                continue;
            };
            for constraint in param.constraints() {
                let Constraint::DerivesFrom(TypeArg::Type(target)) = constraint else {
                    continue;
                };
                if target.substitute(bindings).is_some() {
                    continue;
                }
                let inferred = catalog.ancestors(&bound).into_iter().find_map(|ancestor| {
                    let mut attempt = bindings.clone();
                    unify(target, &ancestor, &mut attempt).then_some(attempt)
                });
                if let Some(inferred) = inferred {
                    *bindings = inferred;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

fn satisfies(param: &TypeParam, bindings: &Bindings, catalog: &TypeCatalog) -> bool {
    let Some(bound) = bindings.get(param.name()) else {
        return false;
    };
    param.constraints().iter().all(|constraint| match constraint {
        Constraint::ReferenceType => catalog.kind(bound) == Some(TypeKind::Reference),
        Constraint::ValueType => catalog.kind(bound) == Some(TypeKind::Value),
        Constraint::DefaultConstructor => catalog.is_default_constructible(bound),
        Constraint::DerivesFrom(target) => target
            .substitute(bindings)
            .is_some_and(|target| catalog.is_assignable(bound, &target)),
    })
}

#[cfg(test)]
mod tests {
    use crate::key::TypeFacts;

    use super::*;

    fn named(name: &str) -> ServiceType {
        ServiceType::named(name)
    }

    #[test]
    fn unify_binds_nested_params() {
        let pattern = named("IRepo").with_arg(named("List").with_param("T"));
        let target = named("IRepo").with_arg(named("List").with_arg(named("Entity")));
        let mut bindings = Bindings::new();
        assert!(unify(&pattern, &target, &mut bindings));
        assert_eq!(bindings.get("T"), Some(&named("Entity")));
    }

    #[test]
    fn unify_fails_on_conflicting_params() {
        let pattern = named("Pair").with_param("T").with_param("T");
        let target = named("Pair").with_arg(named("A")).with_arg(named("B"));
        assert!(!unify(&pattern, &target, &mut Bindings::new()));
    }

    #[test]
    fn close_checks_kind_constraints() {
        let mut catalog = TypeCatalog::new();
        catalog.declare(TypeFacts::reference("Entity"));
        catalog.declare(TypeFacts::value("Point"));

        let pattern = named("IRepo").with_param("T");
        let implementation = named("RepoA").with_param("T");
        let params = [TypeParam::new("T").constraint(Constraint::ReferenceType)];

        let entity = named("IRepo").with_arg(named("Entity"));
        let point = named("IRepo").with_arg(named("Point"));
        assert!(close(&pattern, &implementation, &params, &entity, &catalog).is_some());
        assert!(close(&pattern, &implementation, &params, &point, &catalog).is_none());
    }

    #[test]
    fn close_infers_params_through_derives_from() {
        let mut catalog = TypeCatalog::new();
        catalog.declare(
            TypeFacts::reference("OrderValidator")
                .supertype(named("IValidator").with_arg(named("Order"))),
        );

        // Handler<TValidator> where TValidator: IValidator<TEntity>
        let pattern = named("IHandler").with_param("TValidator");
        let implementation = named("Handler").with_param("TValidator").with_param("TEntity");
        let params = [
            TypeParam::new("TValidator").constraint(Constraint::DerivesFrom(TypeArg::Type(
                named("IValidator").with_param("TEntity"),
            ))),
            TypeParam::new("TEntity"),
        ];
        let target = named("IHandler").with_arg(named("OrderValidator"));

        let bindings = close(&pattern, &implementation, &params, &target, &catalog).unwrap();
        assert_eq!(bindings.get("TEntity"), Some(&named("Order")));
        assert_eq!(
            implementation.substitute(&bindings).unwrap().to_string(),
            "Handler<OrderValidator, Order>"
        );
    }

    #[test]
    fn close_fails_with_unbound_implementation_param() {
        let catalog = TypeCatalog::new();
        let pattern = named("IRepo").with_param("T");
        let implementation = named("RepoA").with_param("U");
        let target = named("IRepo").with_arg(named("Entity"));
        assert!(close(&pattern, &implementation, &[], &target, &catalog).is_none());
    }
}
