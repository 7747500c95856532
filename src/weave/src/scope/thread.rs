use std::cell::RefCell;
use std::sync::{Arc, Weak};

use crate::container::registry::ContainerId;
use crate::scope::core::ScopeCore;

thread_local! {
    static ACTIVE: RefCell<Vec<(ContainerId, Weak<ScopeCore>)>> = const { RefCell::new(Vec::new()) };
}

/// Makes `scope` the innermost active scope of its container on the current
/// thread.
pub(crate) fn bind(scope: &Arc<ScopeCore>) {
    ACTIVE.with_borrow_mut(|active| active.push((scope.container(), Arc::downgrade(scope))));
}

/// Removes `scope` from the current thread. Scopes bound on other threads
/// are left alone and skipped once disposed.
pub(crate) fn unbind(scope: &ScopeCore) {
    let _ = ACTIVE.try_with(|active| {
        active
            .borrow_mut()
            .retain(|(_, bound)| !std::ptr::eq(bound.as_ptr(), scope));
    });
}

/// Returns the innermost live scope of `container` on the current thread.
pub(crate) fn current(container: ContainerId) -> Option<Arc<ScopeCore>> {
    ACTIVE.with_borrow_mut(|active| {
        active.retain(|(_, bound)| bound.strong_count() > 0);
        active
            .iter()
            .rev()
            .filter(|(owner, _)| *owner == container)
            .filter_map(|(_, bound)| bound.upgrade())
            .find(|scope| !scope.is_disposed())
    })
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn current_returns_innermost_scope_of_container() {
        let container = ContainerId::next();
        let outer = Arc::new(ScopeCore::new(container));
        let inner = Arc::new(ScopeCore::new(container));
        let foreign = Arc::new(ScopeCore::new(ContainerId::next()));
        bind(&outer);
        bind(&inner);
        bind(&foreign);

        let found = current(container).unwrap();
        assert!(Arc::ptr_eq(&found, &inner));

        unbind(&inner);
        let found = current(container).unwrap();
        assert!(Arc::ptr_eq(&found, &outer));

        unbind(&outer);
        unbind(&foreign);
        assert!(current(container).is_none());
    }

    #[test]
    fn current_is_local_to_thread() {
        let container = ContainerId::next();
        let scope = Arc::new(ScopeCore::new(container));
        bind(&scope);

        let seen = thread::spawn(move || current(container).is_some())
            .join()
            .expect("Each thread should not `panic!()`");
        assert!(!seen);
        unbind(&scope);
    }
}
