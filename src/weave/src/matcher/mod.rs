//! Matching of closed requests against parameterized and conditional
//! registrations.

mod pattern;
mod unify;

use std::sync::Arc;

use crate::key::{ServiceType, TypeCatalog};
use crate::provider::context::InjectionConsumer;

pub use pattern::{Pattern, PredicateContext};
pub(crate) use pattern::{PatternRegistration, Predicate};
pub(crate) use unify::close;

/// The result of matching one closed request.
pub(crate) struct Match {
    pub(crate) outcome: Outcome,
    /// True if a predicate took part, so the outcome may differ per consumer.
    pub(crate) consumer_dependent: bool,
}

pub(crate) enum Outcome {
    Matched {
        pattern: Arc<PatternRegistration>,
        implementation: ServiceType,
    },
    NoMatch {
        rejected: Vec<ServiceType>,
    },
    Ambiguous {
        implementations: Vec<ServiceType>,
    },
}

/// Evaluates `candidates` in registration order against `service_type`.
///
/// Candidates which can't be closed are skipped. Among the rest, an
/// unconditional candidate always applies and a conditional one applies if
/// its predicate returns true. Exactly one applicable candidate is a match.
pub(crate) fn find(
    candidates: &[Arc<PatternRegistration>],
    service_type: &ServiceType,
    consumer: Option<&InjectionConsumer>,
    catalog: &TypeCatalog,
) -> Match {
    let mut applicable: Vec<(Arc<PatternRegistration>, ServiceType)> = Vec::new();
    let mut rejected = Vec::new();
    let mut consumer_dependent = false;

    for candidate in candidates {
        let Some(bindings) = close(
            &candidate.contract,
            &candidate.implementation,
            &candidate.params,
            service_type,
            catalog,
        ) else {
            continue;
        };
        let Some(implementation) = candidate.implementation.substitute(&bindings) else {
            continue;
        };
        let applies = match &candidate.predicate {
            Some(predicate) => {
                consumer_dependent = true;
                let context = PredicateContext::new(
                    service_type,
                    &implementation,
                    consumer,
                    !applicable.is_empty(),
                );
                predicate(&context)
            }
            None => true,
        };
        if applies {
            applicable.push((Arc::clone(candidate), implementation));
        } else {
            rejected.push(implementation);
        }
    }

    let outcome = match applicable.len() {
        0 => Outcome::NoMatch { rejected },
        1 => {
            let (pattern, implementation) = applicable.remove(0);
            Outcome::Matched {
                pattern,
                implementation,
            }
        }
        _ => Outcome::Ambiguous {
            implementations: applicable
                .into_iter()
                .map(|(_, implementation)| implementation)
                .collect(),
        },
    };
    Match {
        outcome,
        consumer_dependent,
    }
}

#[cfg(test)]
mod tests {
    use crate::container::registry::{ContainerId, RegistrationTemplate};
    use crate::key::{Constraint, TypeFacts, TypeParam};
    use crate::lifetime::Lifetime;
    use crate::provider::instance::InstanceProvider;

    use super::*;

    fn candidate(
        implementation: &str,
        params: Vec<TypeParam>,
        predicate: Option<Predicate>,
    ) -> Arc<PatternRegistration> {
        Arc::new(PatternRegistration {
            contract: ServiceType::named("IRepo").with_param("T"),
            implementation: ServiceType::named(implementation).with_param("T"),
            params,
            template: RegistrationTemplate::open(
                ContainerId::next(),
                Arc::new(InstanceProvider::new(0u8)),
                Lifetime::Transient,
            ),
            predicate,
        })
    }

    fn request(arg: &str) -> ServiceType {
        ServiceType::named("IRepo").with_arg(ServiceType::named(arg))
    }

    #[test]
    fn find_matches_open_pattern() {
        let candidates = [candidate("RepoA", Vec::new(), None)];
        let found = find(&candidates, &request("Entity"), None, &TypeCatalog::new());
        assert!(!found.consumer_dependent);
        let Outcome::Matched { implementation, .. } = found.outcome else {
            panic!("the pattern should match");
        };
        assert_eq!(implementation.to_string(), "RepoA<Entity>");
    }

    #[test]
    fn find_skips_candidates_with_violated_constraints() {
        let mut catalog = TypeCatalog::new();
        catalog.declare(TypeFacts::value("Point"));
        let candidates = [
            candidate(
                "RefRepo",
                vec![TypeParam::new("T").constraint(Constraint::ReferenceType)],
                None,
            ),
            candidate(
                "ValueRepo",
                vec![TypeParam::new("T").constraint(Constraint::ValueType)],
                None,
            ),
        ];
        let found = find(&candidates, &request("Point"), None, &catalog);
        let Outcome::Matched { implementation, .. } = found.outcome else {
            panic!("exactly one pattern should match");
        };
        assert_eq!(implementation.name(), "ValueRepo");
    }

    #[test]
    fn find_reports_ambiguity() {
        let always: Predicate = Arc::new(|_: &PredicateContext<'_>| true);
        let candidates = [
            candidate("RepoA", Vec::new(), Some(Arc::clone(&always))),
            candidate("RepoB", Vec::new(), Some(always)),
        ];
        let found = find(&candidates, &request("Entity"), None, &TypeCatalog::new());
        assert!(found.consumer_dependent);
        let Outcome::Ambiguous { implementations } = found.outcome else {
            panic!("both patterns should apply");
        };
        assert_eq!(implementations.len(), 2);
    }

    #[test]
    fn find_passes_handled_to_fallback() {
        let candidates = [
            candidate(
                "Special",
                Vec::new(),
                Some(Arc::new(|context: &PredicateContext<'_>| {
                    context.service_type().args()[0].to_string() == "Order"
                })),
            ),
            candidate(
                "Fallback",
                Vec::new(),
                Some(Arc::new(|context: &PredicateContext<'_>| !context.handled())),
            ),
        ];
        let catalog = TypeCatalog::new();

        let Outcome::Matched { implementation, .. } =
            find(&candidates, &request("Order"), None, &catalog).outcome
        else {
            panic!("the special pattern should match");
        };
        assert_eq!(implementation.name(), "Special");

        let found = find(&candidates, &request("Customer"), None, &catalog);
        let Outcome::Matched { implementation, .. } = found.outcome else {
            panic!("the fallback should match");
        };
        assert_eq!(implementation.name(), "Fallback");
    }

    #[test]
    fn find_lists_rejected_conditionals() {
        let never: Predicate = Arc::new(|_: &PredicateContext<'_>| false);
        let candidates = [candidate("RepoA", Vec::new(), Some(never))];
        let found = find(&candidates, &request("Entity"), None, &TypeCatalog::new());
        let Outcome::NoMatch { rejected } = found.outcome else {
            panic!("no pattern should apply");
        };
        assert_eq!(rejected[0].to_string(), "RepoA<Entity>");
    }
}
