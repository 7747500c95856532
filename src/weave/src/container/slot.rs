use std::collections::HashMap;
use std::mem;
use std::sync::OnceLock;
use std::thread::{self, ThreadId};

use oneshot::Sender;
use parking_lot::Mutex;

use crate::container::injector::InjectorError;
use crate::instance::Instance;

/// A cache cell holding at most one instance, shared by all threads.
///
/// The first requester constructs the instance while others block until it
/// is done and then observe the same instance or the same error. A failed
/// construction is remembered, so the error is re-raised on every later
/// request.
///
/// A thread never blocks on a slot whose constructing thread is, directly or
/// through other threads, blocked on the current thread. Such a wait is
/// reported as a cycle instead.
pub(crate) struct InstanceSlot {
    state: Mutex<SlotState>,
}

enum SlotState {
    Empty,
    Constructing(ConstructingContext),
    Constructed(Instance),
    Failed(InjectorError),
}

impl InstanceSlot {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }

    /// Returns the cached instance, or builds it with `create`. The returned
    /// flag is true if the instance was built by this call.
    ///
    /// `cycle` produces the error raised when the instance depends on itself,
    /// either on the constructing thread or through threads waiting for each
    /// other.
    pub(crate) fn get_or_create<C, F>(
        &self,
        cycle: C,
        create: F,
    ) -> Result<(Instance, bool), InjectorError>
    where
        C: FnOnce() -> InjectorError,
        F: FnOnce() -> Result<Instance, InjectorError>,
    {
        loop {
            let mut state = self.state.lock();
            match &mut *state {
                SlotState::Constructed(instance) => return Ok((instance.clone(), false)),
                SlotState::Failed(err) => return Err(err.clone()),
                SlotState::Constructing(context) if context.is_constructed_by_current_thread() => {
                    return Err(cycle());
                }
                SlotState::Constructing(context) => {
                    let Some(_waiting) = WaitGuard::enter(context.on_thread) else {
                        return Err(cycle());
                    };
                    let (sender, receiver) = oneshot::channel();
                    context.register_waiter(thread::current().id(), sender);
                    drop(state);
                    match receiver.recv() {
                        Ok(WaitResponse::Constructed(instance)) => return Ok((instance, false)),
                        Ok(WaitResponse::Error(err)) => return Err(err),
                        // The constructing thread panicked and the slot was reset.
                        Err(_) => continue,
                    }
                }
                SlotState::Empty => {}
            }
            *state = SlotState::Constructing(ConstructingContext::new(thread::current().id()));
            break;
        }

        let guard = ResetOnUnwind { slot: self };
        let result = create();
        mem::forget(guard);
        self.finish(&result);
        result.map(|instance| (instance, true))
    }

    #[cfg(test)]
    pub(crate) fn get(&self) -> Option<Instance> {
        match &*self.state.lock() {
            SlotState::Constructed(instance) => Some(instance.clone()),
            _ => None,
        }
    }

    fn finish(&self, result: &Result<Instance, InjectorError>) {
        let (next, response) = match result {
            Ok(instance) => (
                SlotState::Constructed(instance.clone()),
                WaitResponse::Constructed(instance.clone()),
            ),
            Err(err) => (SlotState::Failed(err.clone()), WaitResponse::Error(err.clone())),
        };
        let previous = mem::replace(&mut *self.state.lock(), next);
        if let SlotState::Constructing(context) = previous {
            context.notify(response);
        }
    }
}

struct ResetOnUnwind<'a> {
    slot: &'a InstanceSlot,
}

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        // Dropping the waiters' senders wakes them up to retry.
        let previous = mem::replace(&mut *self.slot.state.lock(), SlotState::Empty);
        if let SlotState::Constructing(context) = previous {
            context.release();
        }
    }
}

struct ConstructingContext {
    on_thread: ThreadId,
    waiters: Vec<(ThreadId, Sender<WaitResponse>)>,
}

impl ConstructingContext {
    fn new(on_thread: ThreadId) -> Self {
        Self {
            on_thread,
            waiters: Vec::new(),
        }
    }

    fn is_constructed_by_current_thread(&self) -> bool {
        thread::current().id() == self.on_thread
    }

    fn register_waiter(&mut self, waiter: ThreadId, sender: Sender<WaitResponse>) {
        self.waiters.push((waiter, sender));
    }

    fn notify(self, response: WaitResponse) {
        for sender in self.release() {
            let _ = sender.send(response.clone());
        }
    }

    /// Clears the waiters' edges before they wake, so a stale edge never
    /// makes a later wait of this thread look cyclic.
    fn release(self) -> Vec<Sender<WaitResponse>> {
        let mut waits = waits().lock();
        self.waiters
            .into_iter()
            .map(|(waiter, sender)| {
                if waits.get(&waiter) == Some(&self.on_thread) {
                    waits.remove(&waiter);
                }
                sender
            })
            .collect()
    }
}

/// The thread each blocked thread waits for. Every thread waits for at most
/// one other thread and no edge closing a loop is ever added, so the graph
/// stays a forest.
fn waits() -> &'static Mutex<HashMap<ThreadId, ThreadId>> {
    static WAITS: OnceLock<Mutex<HashMap<ThreadId, ThreadId>>> = OnceLock::new();
    WAITS.get_or_init(Default::default)
}

struct WaitGuard {
    waiter: ThreadId,
    owner: ThreadId,
}

impl WaitGuard {
    /// Records that the current thread waits for `owner`. Returns [`None`]
    /// if `owner` already waits for the current thread.
    fn enter(owner: ThreadId) -> Option<Self> {
        let current = thread::current().id();
        let mut waits = waits().lock();
        let mut next = Some(owner);
        while let Some(thread) = next {
            if thread == current {
                return None;
            }
            next = waits.get(&thread).copied();
        }
        waits.insert(current, owner);
        Some(Self {
            waiter: current,
            owner,
        })
    }
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        let mut waits = waits().lock();
        if waits.get(&self.waiter) == Some(&self.owner) {
            waits.remove(&self.waiter);
        }
    }
}

#[derive(Clone)]
enum WaitResponse {
    Constructed(Instance),
    Error(InjectorError),
}
