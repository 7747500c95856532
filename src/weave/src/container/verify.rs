use std::sync::Arc;

use snafu::prelude::*;
use tracing::info;

use crate::container::core::ContainerCore;
use crate::container::injector::InjectorError;
use crate::container::ErrorKind;
use crate::provider::context::CallContext;
use crate::scope::Scope;
use crate::util::display::AggregatedDisplayer;

/// The problems found by [`Container::verify`](crate::container::Container::verify).
#[derive(Debug, Snafu)]
#[snafu(display(
    "the configuration is invalid, {} registrations fail to resolve:\n{}",
    errors.len(),
    AggregatedDisplayer::new(errors)
))]
pub struct VerificationError {
    errors: Vec<InjectorError>,
}

impl VerificationError {
    pub fn errors(&self) -> &[InjectorError] {
        &self.errors
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Activation
    }
}

/// Locks the container and resolves every closed registration, every
/// conditional contract and every closed collection inside a throwaway scope.
pub(crate) fn verify(core: &Arc<ContainerCore>) -> Result<(), VerificationError> {
    let config = core.config();
    let scope = Scope::begin(Arc::clone(core));
    let mut errors = Vec::new();
    let mut verified = 0usize;

    for producer in core.store().producers() {
        let context = CallContext::root(Some(scope.handle()));
        match core.produce(&producer, &context) {
            Ok(_) => verified += 1,
            Err(err) => errors.push(err),
        }
    }

    for contract in &config.conditional_contracts {
        match core.resolve_root(contract, Some(scope.handle())) {
            Ok(_) => verified += 1,
            Err(InjectorError::NoMatchingConditional { .. }) => {}
            Err(err) => errors.push(err),
        }
    }

    for entry in config.collections.iter().filter(|e| e.contract.is_closed()) {
        match core.resolve_all_root(&entry.contract, Some(scope.handle())) {
            Ok(_) => verified += 1,
            Err(err) => errors.push(err),
        }
    }

    scope.dispose();
    info!(
        target: "weave",
        verified,
        failed = errors.len(),
        "container verified",
    );
    if errors.is_empty() {
        Ok(())
    } else {
        Err(VerificationError { errors })
    }
}
