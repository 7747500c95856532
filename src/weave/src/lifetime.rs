use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::container::injector::InjectorError;
use crate::container::registry::RegistrationId;
use crate::instance::Instance;
use crate::scope::ScopeProvider;

/// How long an instance produced by a registration is reused.
///
/// Lifetimes are ordered by [`Lifetime::length`]: a consumer must not
/// outlive a cached dependency, otherwise the dependency is captured beyond
/// its own lifetime.
///
/// [`Lifetime::Scoped`] is a marker for the container's default scoped
/// lifestyle. It is replaced by [`Lifetime::ScopedBy`] when the registration
/// is created.
#[derive(Clone)]
pub enum Lifetime {
    /// A new instance per request.
    Transient,
    /// One instance per container.
    Singleton,
    /// One instance per scope, using the default scoped lifestyle.
    Scoped,
    /// One instance per scope, where the active scope is found by the given
    /// lifestyle.
    ScopedBy(ScopedLifestyle),
    /// Caching is delegated to a user-defined policy.
    Custom(Arc<dyn LifetimePolicy>),
}

impl Lifetime {
    pub const TRANSIENT_LENGTH: u32 = 1;

    pub const SCOPED_LENGTH: u32 = 500;

    pub const SINGLETON_LENGTH: u32 = 1000;

    pub fn custom<P: LifetimePolicy>(policy: P) -> Self {
        Self::Custom(Arc::new(policy))
    }

    pub fn length(&self) -> u32 {
        match self {
            Self::Transient => Self::TRANSIENT_LENGTH,
            Self::Scoped | Self::ScopedBy(_) => Self::SCOPED_LENGTH,
            Self::Singleton => Self::SINGLETON_LENGTH,
            Self::Custom(policy) => policy.length(),
        }
    }

    /// Returns true if instances of `self` strictly outlive instances of
    /// `other`.
    pub fn outlive(&self, other: &Lifetime) -> bool {
        self.length() > other.length()
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Replaces the [`Lifetime::Scoped`] marker by `default`. Returns [`None`]
    /// if the marker is present but no default is configured.
    pub(crate) fn resolve(self, default: Option<&ScopedLifestyle>) -> Option<Lifetime> {
        match self {
            Self::Scoped => default.cloned().map(Self::ScopedBy),
            other => Some(other),
        }
    }
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Transient => write!(f, "Transient"),
            Self::Singleton => write!(f, "Singleton"),
            Self::Scoped => write!(f, "Scoped"),
            Self::ScopedBy(lifestyle) => write!(f, "Scoped({lifestyle})"),
            Self::Custom(policy) => write!(f, "{}", policy.name()),
        }
    }
}

impl Debug for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

/// The policy which finds the active scope of a scoped registration.
#[derive(Clone)]
pub enum ScopedLifestyle {
    /// The innermost scope begun on the current thread.
    ThreadBound,
    /// The scope resolved through, passed along explicitly. This lifestyle
    /// works across threads and tasks, since nothing is bound to the thread.
    Flowing,
    /// A scope supplied by a user-defined provider.
    Custom(Arc<dyn ScopeProvider>),
}

impl ScopedLifestyle {
    pub fn custom<P: ScopeProvider>(provider: P) -> Self {
        Self::Custom(Arc::new(provider))
    }
}

impl Display for ScopedLifestyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ThreadBound => write!(f, "thread-bound"),
            Self::Flowing => write!(f, "flowing"),
            Self::Custom(provider) => write!(f, "{}", provider.name()),
        }
    }
}

impl Debug for ScopedLifestyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(self, f)
    }
}

/// A user-defined caching policy for [`Lifetime::Custom`].
pub trait LifetimePolicy: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// The position of this lifetime between [`Lifetime::TRANSIENT_LENGTH`]
    /// and [`Lifetime::SINGLETON_LENGTH`].
    fn length(&self) -> u32;

    /// Returns the cached instance of `registration`, or calls `create` to
    /// build one.
    ///
    /// # Errors
    ///
    /// Returns the error of `create`, or any error of the policy itself.
    fn get_or_create(
        &self,
        registration: RegistrationId,
        create: &mut dyn FnMut() -> Result<Instance, InjectorError>,
    ) -> Result<Instance, InjectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PerCall;

    impl LifetimePolicy for PerCall {
        fn name(&self) -> &str {
            "PerCall"
        }

        fn length(&self) -> u32 {
            10
        }

        fn get_or_create(
            &self,
            _registration: RegistrationId,
            create: &mut dyn FnMut() -> Result<Instance, InjectorError>,
        ) -> Result<Instance, InjectorError> {
            create()
        }
    }

    #[test]
    fn lifetime_outlive_follows_length() {
        assert!(Lifetime::Singleton.outlive(&Lifetime::Scoped));
        assert!(Lifetime::ScopedBy(ScopedLifestyle::Flowing).outlive(&Lifetime::Transient));
        assert!(!Lifetime::Scoped.outlive(&Lifetime::ScopedBy(ScopedLifestyle::ThreadBound)));
        assert!(Lifetime::Scoped.outlive(&Lifetime::custom(PerCall)));
        assert!(!Lifetime::Transient.outlive(&Lifetime::Singleton));
    }

    #[test]
    fn lifetime_resolve_replaces_scoped_marker() {
        let resolved = Lifetime::Scoped.resolve(Some(&ScopedLifestyle::Flowing));
        assert!(matches!(
            resolved,
            Some(Lifetime::ScopedBy(ScopedLifestyle::Flowing))
        ));
        assert!(Lifetime::Scoped.resolve(None).is_none());
        assert!(matches!(
            Lifetime::Singleton.resolve(None),
            Some(Lifetime::Singleton)
        ));
    }

    #[test]
    fn lifetime_display_succeeds() {
        assert_eq!(Lifetime::custom(PerCall).to_string(), "PerCall");
        assert_eq!(
            Lifetime::ScopedBy(ScopedLifestyle::ThreadBound).to_string(),
            "Scoped(thread-bound)"
        );
    }
}
