use std::sync::Arc;

use tracing::debug;

use crate::collection::{Collection, CollectionEntry, CollectionKind, ExternalCollection};
use crate::container::core::ContainerCore;
use crate::container::injector::InjectorError;
use crate::container::producer::InstanceProducer;
use crate::container::registry::ConfigState;
use crate::key::ServiceType;
use crate::matcher;
use crate::provider::context::CallContext;

/// How the collection of one closed contract is produced.
pub(crate) enum CollectionPlan {
    /// One producer per element, in registration order.
    Controlled(Vec<Arc<InstanceProducer>>),
    External(Arc<dyn ExternalCollection>),
    Empty,
}

impl CollectionPlan {
    /// Collects the elements of every collection registration matching
    /// `service_type`.
    pub(crate) fn build(config: &ConfigState, service_type: &ServiceType) -> Result<Self, InjectorError> {
        let matching: Vec<&CollectionEntry> = config
            .collections
            .iter()
            .filter(|entry| {
                matcher::close(&entry.contract, &entry.contract, &[], service_type, &config.catalog)
                    .is_some()
            })
            .collect();

        if matching.is_empty() {
            return if config.options.resolve_unregistered_collections() {
                Ok(Self::Empty)
            } else {
                Err(InjectorError::CollectionNotFound {
                    service_type: service_type.clone(),
                })
            };
        }

        let has_external = matching
            .iter()
            .any(|entry| matches!(entry.kind, CollectionKind::External(_)));
        if has_external && matching.len() > 1 {
            return Err(InjectorError::AmbiguousRegistrations {
                service_type: service_type.clone(),
                implementations: matching.iter().map(|entry| entry.contract.clone()).collect(),
            });
        }

        let mut producers = Vec::new();
        for entry in matching {
            let elements = match &entry.kind {
                CollectionKind::External(source) => return Ok(Self::External(Arc::clone(source))),
                CollectionKind::Controlled { elements, .. } => elements,
            };
            for element in elements {
                let Some(bindings) = matcher::close(
                    &entry.contract,
                    &element.implementation,
                    &element.params,
                    service_type,
                    &config.catalog,
                ) else {
                    continue;
                };
                let Some(implementation) = element.implementation.substitute(&bindings) else {
                    continue;
                };
                let registration = element.template.registration_for(&implementation);
                producers.push(Arc::new(InstanceProducer::new(service_type.clone(), registration)));
            }
        }

        debug!(
            target: "weave",
            service_type = %service_type,
            elements = producers.len(),
            "planned collection",
        );
        Ok(Self::Controlled(producers))
    }

    pub(crate) fn resolve(
        &self,
        core: &ContainerCore,
        service_type: &ServiceType,
        context: &CallContext<'_>,
    ) -> Result<Collection, InjectorError> {
        let elements = match self {
            Self::Controlled(producers) => producers
                .iter()
                .map(|producer| core.produce(producer, context))
                .collect::<Result<Vec<_>, _>>()?,
            Self::External(source) => source
                .elements()
                .into_iter()
                .enumerate()
                .map(|(index, element)| {
                    element.ok_or_else(|| InjectorError::NullElement {
                        service_type: service_type.clone(),
                        index,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            Self::Empty => Vec::new(),
        };
        Ok(Collection::new(service_type.clone(), elements))
    }
}
