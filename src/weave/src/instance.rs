use std::any::{self, Any, TypeId};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

/// A type which releases resources when the scope owning it ends.
///
/// Instances created through [`Instance::new_disposable`] are disposed by
/// the scope (or the verification pass) that cached them, in reverse
/// creation order.
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self);
}

impl<T: Dispose + ?Sized> Dispose for Arc<T> {
    fn dispose(&self) {
        T::dispose(self)
    }
}

/// A type-erased, shareable object produced by the container.
///
/// Cloning an [`Instance`] shares the underlying object, so two clones are
/// always [`Instance::ptr_eq`].
#[derive(Clone)]
pub struct Instance {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    disposer: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Instance {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            value: Arc::new(value),
            type_name: any::type_name::<T>(),
            disposer: None,
        }
    }

    /// Wraps a value which is disposed when its owning scope ends.
    pub fn new_disposable<T>(value: T) -> Self
    where
        T: Dispose + Clone,
    {
        let disposed = value.clone();
        Self::new(value).with_disposer(move || disposed.dispose())
    }

    pub fn with_disposer<F>(mut self, disposer: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.disposer = Some(Arc::new(disposer));
        self
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn cloned<T: Any + Clone>(&self) -> Option<T> {
        self.get::<T>().cloned()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn value_type_id(&self) -> TypeId {
        Any::type_id(&*self.value)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns true if both handles share the same object.
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }

    pub fn is_disposable(&self) -> bool {
        self.disposer.is_some()
    }

    pub(crate) fn dispose(&self) {
        if let Some(disposer) = &self.disposer {
            disposer();
        }
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .field("disposable", &self.is_disposable())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Clone, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl Dispose for Counter {
        fn dispose(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn instance_get_succeeds() {
        let instance = Instance::new(42i32);
        assert_eq!(instance.get::<i32>(), Some(&42));
        assert!(instance.get::<u32>().is_none());
        assert!(instance.is::<i32>());
        assert_eq!(instance.value_type_id(), TypeId::of::<i32>());
        assert_eq!(instance.type_name(), "i32");
    }

    #[test]
    fn instance_ptr_eq_follows_clones() {
        let a = Instance::new(String::from("a"));
        let b = a.clone();
        let c = Instance::new(String::from("a"));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn instance_dispose_runs_disposer() {
        let counter = Counter::default();
        let instance = Instance::new_disposable(counter.clone());
        assert!(instance.is_disposable());
        instance.dispose();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
