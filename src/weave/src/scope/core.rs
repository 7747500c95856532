use std::collections::HashMap;
use std::mem;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::container::injector::InjectorError;
use crate::container::registry::{ContainerId, RegistrationId};
use crate::container::slot::InstanceSlot;
use crate::instance::Instance;
use crate::key::ServiceType;

/// The state shared by all handles of one scope.
pub(crate) struct ScopeCore {
    container: ContainerId,
    state: Mutex<ScopeState>,
}

#[derive(Default)]
struct ScopeState {
    disposed: bool,
    slots: HashMap<RegistrationId, Arc<InstanceSlot>>,
    items: HashMap<Arc<str>, Instance>,
    teardown: Vec<Teardown>,
    children: Vec<Weak<ScopeCore>>,
}

enum Teardown {
    Dispose(Instance),
    Action(Box<dyn FnOnce() + Send>),
}

impl ScopeCore {
    pub(crate) fn new(container: ContainerId) -> Self {
        Self {
            container,
            state: Mutex::new(ScopeState::default()),
        }
    }

    pub(crate) fn container(&self) -> ContainerId {
        self.container
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    pub(crate) fn add_child(&self, child: &Arc<ScopeCore>) {
        let mut state = self.state.lock();
        state.children.retain(|child| child.strong_count() > 0);
        state.children.push(Arc::downgrade(child));
    }

    /// Returns the instance of `registration` cached in this scope, or builds
    /// it with `create`. Fresh disposable instances are disposed with the
    /// scope.
    pub(crate) fn get_or_create<C, F>(
        &self,
        registration: RegistrationId,
        service_type: &ServiceType,
        cycle: C,
        create: F,
    ) -> Result<Instance, InjectorError>
    where
        C: FnOnce() -> InjectorError,
        F: FnOnce() -> Result<Instance, InjectorError>,
    {
        let slot = {
            let mut state = self.state.lock();
            if state.disposed {
                return Err(InjectorError::ScopeDisposed {
                    service_type: service_type.clone(),
                });
            }
            Arc::clone(
                state
                    .slots
                    .entry(registration)
                    .or_insert_with(|| Arc::new(InstanceSlot::new())),
            )
        };

        let (instance, fresh) = slot.get_or_create(cycle, create)?;
        if fresh && instance.is_disposable() {
            let mut state = self.state.lock();
            if state.disposed {
                drop(state);
                instance.dispose();
                return Err(InjectorError::ScopeDisposed {
                    service_type: service_type.clone(),
                });
            }
            state.teardown.push(Teardown::Dispose(instance.clone()));
        }
        Ok(instance)
    }

    pub(crate) fn get_item(&self, key: &str) -> Option<Instance> {
        self.state.lock().items.get(key).cloned()
    }

    pub(crate) fn set_item(&self, key: &str, value: Option<Instance>) {
        let mut state = self.state.lock();
        match value {
            Some(value) => state.items.insert(Arc::from(key), value),
            None => state.items.remove(key),
        };
    }

    /// Returns the item stored under `key`, or stores the one built by
    /// `factory`. The factory runs without holding the lock, so when two
    /// threads race the first stored item wins.
    pub(crate) fn get_or_add_item<F>(&self, key: &str, factory: F) -> Instance
    where
        F: FnOnce() -> Instance,
    {
        if let Some(item) = self.get_item(key) {
            return item;
        }
        let created = factory();
        self.state
            .lock()
            .items
            .entry(Arc::from(key))
            .or_insert(created)
            .clone()
    }

    /// Registers `action` to run when the scope ends. Runs it at once if the
    /// scope has already ended.
    pub(crate) fn when_scope_ends<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.disposed {
            drop(state);
            action();
        } else {
            state.teardown.push(Teardown::Action(Box::new(action)));
        }
    }

    /// Ends the scope: disposes nested scopes first, then releases cached
    /// disposables and runs end actions in reverse order of registration.
    pub(crate) fn dispose(&self) {
        let ScopeState {
            slots,
            items,
            teardown,
            children,
            ..
        } = {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            let taken = mem::take(&mut *state);
            state.disposed = true;
            taken
        };

        for child in children.iter().rev().filter_map(Weak::upgrade) {
            child.dispose();
        }
        let released = teardown.len();
        for entry in teardown.into_iter().rev() {
            match entry {
                Teardown::Dispose(instance) => instance.dispose(),
                Teardown::Action(action) => action(),
            }
        }
        drop(items);
        drop(slots);

        debug!(target: "weave", released, "scope ended");
    }
}
