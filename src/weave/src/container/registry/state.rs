use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::collection::{CollectionElement, CollectionEntry, CollectionKind};
use crate::container::options::ContainerOptions;
use crate::container::registry::RegistryError;
use crate::container::unregistered::UnregisteredHandler;
use crate::decorator::DecoratorDescriptor;
use crate::initializer::Initializer;
use crate::key::{OpenForm, ServiceType, TypeCatalog};
use crate::matcher::PatternRegistration;

/// Everything a container knows besides its closed registrations.
///
/// The state is mutable while the container is being configured and frozen
/// behind an [`Arc`] once it is locked.
#[derive(Default)]
pub(crate) struct ConfigState {
    pub(crate) options: ContainerOptions,
    pub(crate) catalog: TypeCatalog,
    pub(crate) patterns: HashMap<OpenForm, Vec<Arc<PatternRegistration>>>,
    /// Closed contracts which have conditional registrations.
    pub(crate) conditional_contracts: HashSet<ServiceType>,
    pub(crate) collections: Vec<CollectionEntry>,
    pub(crate) decorators: Vec<Arc<DecoratorDescriptor>>,
    pub(crate) initializers: Vec<Arc<Initializer>>,
    pub(crate) unregistered_handlers: Vec<Arc<UnregisteredHandler>>,
}

impl ConfigState {
    /// Returns the pattern registrations which may serve `service_type`, in
    /// registration order.
    pub(crate) fn candidates(&self, service_type: &ServiceType) -> &[Arc<PatternRegistration>] {
        self.patterns
            .get(&service_type.open_form())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Adds a pattern registration. A second unconditional registration
    /// covering exactly the same contracts is a duplicate, or replaces the
    /// first one if overriding is allowed.
    pub(crate) fn add_pattern(&mut self, registration: PatternRegistration) -> Result<(), RegistryError> {
        let allow_overriding = self.options.allow_overriding_registrations();
        if registration.is_conditional() && registration.contract.is_closed() {
            self.conditional_contracts
                .insert(registration.contract.clone());
        }

        let candidates = self
            .patterns
            .entry(registration.contract.open_form())
            .or_default();
        if !registration.is_conditional() {
            let existing = candidates.iter().position(|candidate| {
                !candidate.is_conditional() && candidate.overlaps_fully(&registration)
            });
            match existing {
                Some(index) if allow_overriding => {
                    candidates[index] = Arc::new(registration);
                    return Ok(());
                }
                Some(_) => {
                    return Err(RegistryError::DuplicateRegistration {
                        service_type: registration.contract,
                    });
                }
                None => {}
            }
        }
        candidates.push(Arc::new(registration));
        Ok(())
    }

    /// Adds a collection registered in one go. Elements appended before are
    /// kept in front of the registered ones.
    pub(crate) fn add_collection(
        &mut self,
        contract: ServiceType,
        kind: CollectionKind,
    ) -> Result<(), RegistryError> {
        let allow_overriding = self.options.allow_overriding_registrations();
        let Some(index) = self.find_collection(&contract) else {
            self.collections.push(CollectionEntry { contract, kind });
            return Ok(());
        };
        let existing = &mut self.collections[index];

        if let CollectionKind::Controlled {
            style: current @ None,
            elements,
        } = &mut existing.kind
        {
            if let CollectionKind::Controlled {
                style,
                elements: added,
            } = kind
            {
                *current = style;
                elements.extend(added);
                return Ok(());
            }
        }

        if existing.kind.style_name() != kind.style_name() {
            return Err(RegistryError::CollectionStyleMixed {
                service_type: contract,
                existing: existing.kind.style_name(),
                requested: kind.style_name(),
            });
        }
        if !allow_overriding {
            return Err(RegistryError::DuplicateCollection {
                service_type: contract,
            });
        }
        existing.kind = kind;
        Ok(())
    }

    /// Appends one element to the container-controlled collection of
    /// `contract`, creating the collection if needed.
    pub(crate) fn append_element(
        &mut self,
        contract: ServiceType,
        element: CollectionElement,
    ) -> Result<(), RegistryError> {
        let Some(index) = self.find_collection(&contract) else {
            self.collections.push(CollectionEntry {
                contract,
                kind: CollectionKind::Controlled {
                    style: None,
                    elements: vec![element],
                },
            });
            return Ok(());
        };
        match &mut self.collections[index].kind {
            CollectionKind::Controlled { elements, .. } => {
                elements.push(element);
                Ok(())
            }
            existing @ CollectionKind::External(_) => Err(RegistryError::CollectionStyleMixed {
                service_type: contract,
                existing: existing.style_name(),
                requested: "appended elements",
            }),
        }
    }

    /// Returns the initializers applying to instances of
    /// `implementation_type`, or of `service_type` if given.
    pub(crate) fn initializers_for(
        &self,
        implementation_type: &ServiceType,
        service_type: Option<&ServiceType>,
    ) -> Vec<Arc<Initializer>> {
        self.initializers
            .iter()
            .filter(|initializer| {
                initializer.applies_to(
                    implementation_type,
                    service_type.unwrap_or(implementation_type),
                    &self.catalog,
                )
            })
            .cloned()
            .collect()
    }

    fn find_collection(&self, contract: &ServiceType) -> Option<usize> {
        let normalized = contract.normalized();
        self.collections
            .iter()
            .position(|entry| entry.contract.normalized() == normalized)
    }
}
