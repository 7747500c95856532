use crate::lifetime::ScopedLifestyle;

/// Settings of a container, changeable only while it is being configured.
///
/// # Examples
///
/// ```rust
/// # use weave::container::ContainerOptions;
/// # use weave::lifetime::ScopedLifestyle;
/// let options = ContainerOptions::default()
///     .with_default_scoped_lifestyle(ScopedLifestyle::ThreadBound)
///     .with_allow_overriding_registrations(true);
/// assert!(options.allow_overriding_registrations());
/// assert!(options.check_lifestyle_mismatches());
/// ```
#[derive(Debug, Clone)]
pub struct ContainerOptions {
    allow_overriding_registrations: bool,
    default_scoped_lifestyle: Option<ScopedLifestyle>,
    check_lifestyle_mismatches: bool,
    resolve_unregistered_collections: bool,
}

impl ContainerOptions {
    pub fn allow_overriding_registrations(&self) -> bool {
        self.allow_overriding_registrations
    }

    pub fn default_scoped_lifestyle(&self) -> Option<&ScopedLifestyle> {
        self.default_scoped_lifestyle.as_ref()
    }

    pub fn check_lifestyle_mismatches(&self) -> bool {
        self.check_lifestyle_mismatches
    }

    pub fn resolve_unregistered_collections(&self) -> bool {
        self.resolve_unregistered_collections
    }

    /// Replaces earlier registrations of the same contract instead of
    /// failing.
    pub fn with_allow_overriding_registrations(mut self, allow: bool) -> Self {
        self.allow_overriding_registrations = allow;
        self
    }

    /// The lifestyle used by registrations made with
    /// [`Lifetime::Scoped`](crate::lifetime::Lifetime::Scoped) from now on.
    pub fn with_default_scoped_lifestyle(mut self, lifestyle: ScopedLifestyle) -> Self {
        self.default_scoped_lifestyle = Some(lifestyle);
        self
    }

    pub fn with_check_lifestyle_mismatches(mut self, check: bool) -> Self {
        self.check_lifestyle_mismatches = check;
        self
    }

    /// Resolves collections nobody registered as empty ones.
    pub fn with_resolve_unregistered_collections(mut self, resolve: bool) -> Self {
        self.resolve_unregistered_collections = resolve;
        self
    }
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            allow_overriding_registrations: false,
            default_scoped_lifestyle: None,
            check_lifestyle_mismatches: true,
            resolve_unregistered_collections: false,
        }
    }
}
