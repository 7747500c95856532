use std::convert::Infallible;
use std::sync::Arc;

use weave::prelude::*;

#[derive(Debug, PartialEq)]
pub struct Report {
    pub a: i32,
    pub greeting: &'static str,
    pub pair: (i64, f64),
    pub ports: Vec<u16>,
    pub plugins: Vec<&'static str>,
}

#[component]
impl Report {
    #[inject]
    pub fn new(
        a: i32,
        #[named("Greeting")] greeting: &'static str,
        #[contract(ServiceType::named("Pair"))] (c, d): (i64, f64),
        #[all] ports: Vec<u16>,
        #[all(ServiceType::named("IPlugin"))] plugins: Vec<&'static str>,
    ) -> Self {
        Self {
            a,
            greeting,
            pair: (c, d),
            ports,
            plugins,
        }
    }
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> u64;
}

pub struct FixedClock {
    at: u64,
}

#[component(Arc<dyn Clock>, Arc::new)]
impl FixedClock {
    #[inject]
    pub fn new(#[named("Epoch")] at: u64) -> Result<Self, Infallible> {
        Ok(Self { at })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.at
    }
}

fn element<T: Clone + Send + Sync + 'static>(implementation: &str, value: T) -> Element {
    Element::new(ServiceType::named(implementation), InstanceProvider::new(value))
}

#[test]
fn component_attributes_resolve_every_source() {
    let container = Container::new();
    container
        .register_instance(ServiceType::of::<i32>(), 42i32)
        .unwrap();
    container
        .register_instance(ServiceType::named("Greeting"), "hello world")
        .unwrap();
    container
        .register(
            ServiceType::named("Pair"),
            ServiceType::named("Pair"),
            ClosureProvider::new(|| Ok::<_, Infallible>((64i64, 3.5f64))),
            Lifetime::Transient,
        )
        .unwrap();
    container
        .register_collection_of_types(
            ServiceType::of::<u16>(),
            vec![element("Http", 80u16), element("Https", 443u16)],
        )
        .unwrap();
    container
        .register_collection_of_types(
            ServiceType::named("IPlugin"),
            vec![element("Audit", "audit"), element("Cache", "cache")],
        )
        .unwrap();
    container
        .register_component::<Report>(ServiceType::named("Report"), Lifetime::Transient)
        .unwrap();

    let report = container
        .resolve(&ServiceType::named("Report"))
        .unwrap();
    assert_eq!(
        report.get::<Report>(),
        Some(&Report::new(
            42,
            "hello world",
            (64, 3.5),
            vec![80, 443],
            vec!["audit", "cache"],
        ))
    );
}

#[test]
fn component_post_processor_builds_trait_object() {
    let container = Container::new();
    container
        .register_instance(ServiceType::named("Epoch"), 1_700_000_000u64)
        .unwrap();
    container
        .register_component::<FixedClock>(ServiceType::of::<Arc<dyn Clock>>(), Lifetime::Singleton)
        .unwrap();

    let clock: Arc<dyn Clock> = container.get_of().unwrap();
    assert_eq!(clock.now(), 1_700_000_000);
}

#[test]
fn component_missing_dependency_fails() {
    let container = Container::new();
    container
        .register_component::<FixedClock>(ServiceType::of::<Arc<dyn Clock>>(), Lifetime::Singleton)
        .unwrap();

    let err = container.resolve(&ServiceType::of::<Arc<dyn Clock>>()).unwrap_err();
    assert!(matches!(err, InjectorError::NotFound { .. }));
}
