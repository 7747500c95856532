use std::sync::Arc;

use crate::container::injector::InjectorError;
use crate::container::registry::{ContainerId, Recipe, Registration};
use crate::key::ServiceType;
use crate::lifetime::Lifetime;
use crate::provider::Provider;

pub(crate) type UnregisteredHandler = dyn Fn(&mut UnregisteredTypeEvent) + Send + Sync;

/// Raised for a closed contract which nothing registered can serve.
///
/// A handler may supply a registration with [`UnregisteredTypeEvent::register`].
/// The first supplied registration wins and is kept for all later requests
/// of the contract.
pub struct UnregisteredTypeEvent {
    service_type: ServiceType,
    container: ContainerId,
    default_lifetime: Option<Lifetime>,
    registration: Option<Result<Registration, InjectorError>>,
}

impl UnregisteredTypeEvent {
    pub(crate) fn new(
        service_type: ServiceType,
        container: ContainerId,
        default_lifetime: Option<Lifetime>,
    ) -> Self {
        Self {
            service_type,
            container,
            default_lifetime,
            registration: None,
        }
    }

    pub fn service_type(&self) -> &ServiceType {
        &self.service_type
    }

    /// Returns true if an earlier handler already supplied a registration.
    pub fn is_handled(&self) -> bool {
        self.registration.is_some()
    }

    /// Supplies `provider` for the contract. Ignored if the event is already
    /// handled. [`Lifetime::Scoped`] uses the container's default scoped
    /// lifestyle; without one, resolving the contract fails with
    /// [`InjectorError::NoDefaultScopedLifestyle`].
    pub fn register<P: Provider>(
        &mut self,
        implementation_type: ServiceType,
        provider: P,
        lifetime: Lifetime,
    ) {
        if self.is_handled() {
            return;
        }
        let lifetime = match (lifetime, &self.default_lifetime) {
            (Lifetime::Scoped, Some(default)) => default.clone(),
            (Lifetime::Scoped, None) => {
                self.registration = Some(Err(InjectorError::NoDefaultScopedLifestyle {
                    service_type: self.service_type.clone(),
                    implementation_type,
                }));
                return;
            }
            (other, _) => other,
        };
        self.registration = Some(Ok(Registration::new(
            self.container,
            implementation_type,
            Recipe::Provider(Arc::new(provider)),
            lifetime,
        )));
    }

    /// Supplies an existing registration of the same container. Registrations
    /// of other containers are ignored.
    pub fn register_registration(&mut self, registration: Registration) {
        if !self.is_handled() && registration.container() == self.container {
            self.registration = Some(Ok(registration));
        }
    }

    pub(crate) fn into_registration(self) -> Option<Result<Registration, InjectorError>> {
        self.registration
    }
}

#[cfg(test)]
mod tests {
    use crate::lifetime::ScopedLifestyle;
    use crate::provider::instance::InstanceProvider;

    use super::*;

    #[test]
    fn unregistered_type_event_first_registration_wins() {
        let container = ContainerId::next();
        let mut event = UnregisteredTypeEvent::new(ServiceType::named("ILogger"), container, None);
        assert!(!event.is_handled());

        event.register(
            ServiceType::named("ConsoleLogger"),
            InstanceProvider::new(1u8),
            Lifetime::Singleton,
        );
        event.register(
            ServiceType::named("NullLogger"),
            InstanceProvider::new(2u8),
            Lifetime::Transient,
        );

        let registration = event.into_registration().unwrap().unwrap();
        assert_eq!(registration.implementation_type(), &ServiceType::named("ConsoleLogger"));
        assert!(matches!(registration.lifetime(), Lifetime::Singleton));
    }

    #[test]
    fn unregistered_type_event_scoped_uses_default_lifestyle() {
        let mut event = UnregisteredTypeEvent::new(
            ServiceType::named("ISession"),
            ContainerId::next(),
            Some(Lifetime::ScopedBy(ScopedLifestyle::Flowing)),
        );
        event.register(
            ServiceType::named("Session"),
            InstanceProvider::new(1u8),
            Lifetime::Scoped,
        );

        let registration = event.into_registration().unwrap().unwrap();
        assert!(matches!(
            registration.lifetime(),
            Lifetime::ScopedBy(ScopedLifestyle::Flowing)
        ));
    }

    #[test]
    fn unregistered_type_event_scoped_without_default_lifestyle_fails() {
        let mut event =
            UnregisteredTypeEvent::new(ServiceType::named("ISession"), ContainerId::next(), None);
        event.register(
            ServiceType::named("Session"),
            InstanceProvider::new(1u8),
            Lifetime::Scoped,
        );
        assert!(event.is_handled());

        let err = event.into_registration().unwrap().unwrap_err();
        assert!(matches!(err, InjectorError::NoDefaultScopedLifestyle { .. }));
        assert_eq!(err.kind(), crate::container::ErrorKind::Configuration);
    }

    #[test]
    fn unregistered_type_event_ignores_foreign_registrations() {
        let mut event =
            UnregisteredTypeEvent::new(ServiceType::named("ILogger"), ContainerId::next(), None);
        let foreign = Registration::new(
            ContainerId::next(),
            ServiceType::named("ConsoleLogger"),
            Recipe::Provider(Arc::new(InstanceProvider::new(1u8))),
            Lifetime::Transient,
        );
        event.register_registration(foreign);
        assert!(!event.is_handled());
    }
}
