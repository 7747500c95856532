//! Scopes: bags of per-scope instances with deterministic teardown.

pub(crate) mod core;
pub(crate) mod thread;

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::thread::ThreadId;

use tracing::debug;

use crate::collection::Collection;
use crate::container::core::ContainerCore;
use crate::container::injector::{Injector, InjectorError};
use crate::container::registry::ContainerId;
use crate::instance::Instance;
use crate::key::ServiceType;
use crate::provider::context::CallContext;

use self::core::ScopeCore;

/// Supplies the active scope for
/// [`ScopedLifestyle::Custom`](crate::lifetime::ScopedLifestyle::Custom).
pub trait ScopeProvider: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn current_scope(&self) -> Option<ScopeRef>;
}

/// A shareable handle to a scope, which doesn't end the scope when dropped.
#[derive(Clone)]
pub struct ScopeRef {
    core: Arc<ScopeCore>,
}

impl ScopeRef {
    pub(crate) fn new(core: Arc<ScopeCore>) -> Self {
        Self { core }
    }

    pub(crate) fn core(&self) -> &Arc<ScopeCore> {
        &self.core
    }

    /// The container this scope was begun from.
    pub fn container(&self) -> ContainerId {
        self.core.container()
    }

    pub fn is_disposed(&self) -> bool {
        self.core.is_disposed()
    }

    pub fn get_item(&self, key: &str) -> Option<Instance> {
        self.core.get_item(key)
    }

    /// Stores `value` under `key`, or removes the item if `value` is
    /// [`None`].
    pub fn set_item(&self, key: &str, value: Option<Instance>) {
        self.core.set_item(key, value);
    }

    pub fn get_or_add_item<F>(&self, key: &str, factory: F) -> Instance
    where
        F: FnOnce() -> Instance,
    {
        self.core.get_or_add_item(key, factory)
    }

    pub fn when_scope_ends<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.core.when_scope_ends(action);
    }

    /// Returns true if both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &ScopeRef) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl Debug for ScopeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScopeRef")
            .field("container", &self.container())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A scope begun from a container.
///
/// Instances of scoped registrations resolved through a [`Scope`], or on the
/// thread which begun it, are cached in it. The scope ends when
/// [`Scope::dispose`] is called or when it is dropped.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::sync::Arc;
/// # use weave::prelude::*;
/// let container = Container::with_options(
///     ContainerOptions::default().with_default_scoped_lifestyle(ScopedLifestyle::Flowing),
/// );
/// container
///     .register(
///         ServiceType::of::<Arc<String>>(),
///         ServiceType::named("Session"),
///         ClosureProvider::new(|| Ok::<_, Infallible>(Arc::new(String::from("session")))),
///         Lifetime::Scoped,
///     )
///     .unwrap();
///
/// let scope = container.begin_scope();
/// let first: Arc<String> = scope.get_of().unwrap();
/// let second: Arc<String> = scope.get_of().unwrap();
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub struct Scope {
    container: Arc<ContainerCore>,
    handle: ScopeRef,
    bound_on: ThreadId,
}

impl Scope {
    pub(crate) fn begin(container: Arc<ContainerCore>) -> Self {
        let core = Arc::new(ScopeCore::new(container.id()));
        thread::bind(&core);
        debug!(target: "weave", "scope begun");
        Self {
            container,
            handle: ScopeRef { core },
            bound_on: std::thread::current().id(),
        }
    }

    /// Begins a scope which ends no later than this one.
    pub fn begin_nested(&self) -> Scope {
        let nested = Self::begin(Arc::clone(&self.container));
        self.handle.core.add_child(&nested.handle.core);
        nested
    }

    pub fn resolve(&self, service_type: &ServiceType) -> Result<Instance, InjectorError> {
        self.container.resolve_root(service_type, Some(&self.handle))
    }

    pub fn resolve_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError> {
        self.container.resolve_all_root(service_type, Some(&self.handle))
    }

    pub fn handle(&self) -> &ScopeRef {
        &self.handle
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_disposed()
    }

    pub fn get_item(&self, key: &str) -> Option<Instance> {
        self.handle.get_item(key)
    }

    pub fn set_item(&self, key: &str, value: Option<Instance>) {
        self.handle.set_item(key, value);
    }

    pub fn get_or_add_item<F>(&self, key: &str, factory: F) -> Instance
    where
        F: FnOnce() -> Instance,
    {
        self.handle.get_or_add_item(key, factory)
    }

    /// Registers `action` to run when the scope ends.
    pub fn when_scope_ends<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.when_scope_ends(action);
    }

    /// Ends the scope. Calling it again has no effect.
    pub fn dispose(&self) {
        if std::thread::current().id() == self.bound_on {
            thread::unbind(&self.handle.core);
        }
        self.handle.core.dispose();
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Debug for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Scope")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Injector for Scope {
    fn dyn_get(&self, service_type: &ServiceType) -> Result<Instance, InjectorError> {
        self.resolve(service_type)
    }

    fn dyn_get_all(&self, service_type: &ServiceType) -> Result<Collection, InjectorError> {
        self.resolve_all(service_type)
    }

    fn dyn_get_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Instance, InjectorError> {
        self.container.dyn_get_dependency(service_type, context)
    }

    fn dyn_get_all_dependency<'a>(
        &self,
        service_type: &ServiceType,
        context: &'a CallContext<'a>,
    ) -> Result<Collection, InjectorError> {
        self.container.dyn_get_all_dependency(service_type, context)
    }
}
