use crate::container::registry::RegistrationId;
use crate::key::ServiceType;
use crate::lifetime::Lifetime;
use crate::scope::ScopeRef;

/// Information about one resolution in flight, passed down to providers.
///
/// A [`CallContext`] carries the chain of activations which led to the
/// current request, and the scope the request was made through. A new frame
/// is pushed for every activation and lives on the caller's stack, so it is
/// dropped on both success and failure.
#[derive(Clone)]
pub struct CallContext<'a> {
    trace: Option<InjectionTrace<'a>>,
    scope: Option<&'a ScopeRef>,
}

impl<'a> CallContext<'a> {
    /// Creates the context of a request made directly by a user.
    pub fn root(scope: Option<&'a ScopeRef>) -> Self {
        Self { trace: None, scope }
    }

    /// Returns a context whose innermost activation is `frame`.
    pub fn enter<'b>(&'b self, frame: Frame) -> CallContext<'b> {
        let trace = match &self.trace {
            Some(trace) => trace.append(frame),
            None => InjectionTrace::new(frame),
        };
        CallContext {
            trace: Some(trace),
            scope: self.scope,
        }
    }

    /// The innermost activation, or [`None`] for a root context.
    pub fn frame(&self) -> Option<&Frame> {
        self.trace.as_ref().map(InjectionTrace::frame)
    }

    pub fn service_type(&self) -> Option<&ServiceType> {
        self.frame().map(|frame| &frame.service_type)
    }

    pub fn implementation_type(&self) -> Option<&ServiceType> {
        self.frame().map(|frame| &frame.implementation_type)
    }

    pub fn lifetime(&self) -> Option<&Lifetime> {
        self.frame().map(|frame| &frame.lifetime)
    }

    /// The activation which requests dependencies through this context.
    pub fn consumer(&self) -> Option<InjectionConsumer> {
        self.frame().map(|frame| InjectionConsumer {
            service_type: frame.service_type.clone(),
            implementation_type: frame.implementation_type.clone(),
        })
    }

    pub fn scope(&self) -> Option<&'a ScopeRef> {
        self.scope
    }

    pub fn trace(&self) -> Option<&InjectionTrace<'a>> {
        self.trace.as_ref()
    }

    /// Returns true if `registration` is being activated somewhere in this
    /// context.
    pub fn is_activating(&self, registration: RegistrationId) -> bool {
        self.trace
            .as_ref()
            .is_some_and(|trace| trace.contains(registration))
    }

    /// Returns the service types from the first activation of `registration`
    /// to the innermost one, followed by `service_type` closing the cycle.
    pub(crate) fn cycle(
        &self,
        registration: RegistrationId,
        service_type: &ServiceType,
    ) -> Vec<ServiceType> {
        let mut frames = Vec::new();
        let mut current = self.trace.as_ref();
        while let Some(trace) = current {
            frames.push(trace.frame());
            current = trace.previous();
        }
        frames.reverse();

        let start = frames
            .iter()
            .position(|frame| frame.registration == registration)
            .unwrap_or(0);
        let mut chain: Vec<ServiceType> = Vec::new();
        for frame in &frames[start..] {
            if chain.last() != Some(&frame.service_type) {
                chain.push(frame.service_type.clone());
            }
        }
        chain.push(service_type.clone());
        chain
    }
}

/// One activation: the registration being built and what it was built for.
#[derive(Debug, Clone)]
pub struct Frame {
    pub registration: RegistrationId,
    pub service_type: ServiceType,
    pub implementation_type: ServiceType,
    pub lifetime: Lifetime,
}

/// A linked list of [`Frame`]s living on the stack, innermost first.
#[derive(Clone)]
pub struct InjectionTrace<'a> {
    frame: Frame,
    previous: Option<&'a InjectionTrace<'a>>,
}

impl<'a> InjectionTrace<'a> {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            previous: None,
        }
    }

    pub fn append<'b>(&'b self, frame: Frame) -> InjectionTrace<'b> {
        InjectionTrace {
            frame,
            previous: Some(self),
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn previous(&self) -> Option<&InjectionTrace<'a>> {
        self.previous
    }

    pub fn contains(&self, registration: RegistrationId) -> bool {
        let mut this = Some(self);
        while let Some(trace) = this {
            if trace.frame.registration == registration {
                return true;
            }
            this = trace.previous;
        }
        false
    }
}

/// The service requesting a dependency, as seen by conditional predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectionConsumer {
    pub service_type: ServiceType,
    pub implementation_type: ServiceType,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u64, name: &str) -> Frame {
        Frame {
            registration: RegistrationId::from_raw(id),
            service_type: ServiceType::named(name),
            implementation_type: ServiceType::named(format!("{name}Impl")),
            lifetime: Lifetime::Transient,
        }
    }

    #[test]
    fn call_context_enter_succeeds() {
        let root = CallContext::root(None);
        assert!(root.consumer().is_none());

        let a = root.enter(frame(1, "A"));
        let b = a.enter(frame(2, "B"));
        let consumer = b.consumer().unwrap();
        assert_eq!(consumer.service_type, ServiceType::named("B"));
        assert_eq!(consumer.implementation_type, ServiceType::named("BImpl"));
        assert!(b.is_activating(RegistrationId::from_raw(1)));
        assert!(!a.is_activating(RegistrationId::from_raw(2)));
    }

    #[test]
    fn call_context_cycle_starts_at_first_occurrence() {
        let root = CallContext::root(None);
        let x = root.enter(frame(0, "X"));
        let a = x.enter(frame(1, "A"));
        let b = a.enter(frame(2, "B"));

        let chain = b.cycle(RegistrationId::from_raw(1), &ServiceType::named("A"));
        let names: Vec<_> = chain.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["A", "B", "A"]);
    }
}
