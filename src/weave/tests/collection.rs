mod common;

use std::convert::Infallible;
use std::sync::Arc;

use parking_lot::RwLock;
use weave::prelude::*;

fn plugins() -> ServiceType {
    ServiceType::named("IPlugin")
}

fn plugin(name: &'static str) -> Element {
    Element::new(ServiceType::named(name), InstanceProvider::new(name))
}

#[test]
fn collection_resolves_elements_in_order() {
    common::setup_logging();
    let container = Container::new();
    container
        .register_collection_of_types(plugins(), vec![plugin("Audit"), plugin("Cache")])
        .unwrap();

    let names: Vec<&'static str> = container.collect(&plugins()).unwrap();
    assert_eq!(names, ["Audit", "Cache"]);
    let collection = container.resolve_all(&plugins()).unwrap();
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.service_type(), &plugins());
}

#[test]
fn appended_elements_precede_registered_ones() {
    let container = Container::new();
    container
        .append_to_collection(plugins(), plugin("Metrics"))
        .unwrap();
    container
        .register_collection_of_types(plugins(), vec![plugin("Audit")])
        .unwrap();
    container
        .append_to_collection(plugins(), plugin("Cache"))
        .unwrap();

    let names: Vec<&'static str> = container.collect(&plugins()).unwrap();
    assert_eq!(names, ["Metrics", "Audit", "Cache"]);
}

#[test]
fn append_after_resolution_fails() {
    let container = Container::new();
    container
        .register_collection_of_types(plugins(), vec![plugin("Audit")])
        .unwrap();
    container.resolve_all(&plugins()).unwrap();

    let err = container
        .append_to_collection(plugins(), plugin("Cache"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::ContainerLocked { .. }));
}

#[test]
fn mixing_collection_styles_fails() {
    let container = Container::new();
    container
        .register_collection_of_types(plugins(), vec![plugin("Audit")])
        .unwrap();
    let registration = container
        .create_registration(
            ServiceType::named("Cache"),
            InstanceProvider::new("Cache"),
            Lifetime::Singleton,
        )
        .unwrap();

    let err = container
        .register_collection_of_registrations(plugins(), vec![registration])
        .unwrap_err();
    assert!(matches!(err, RegistryError::CollectionStyleMixed { .. }));
    assert_eq!(err.kind(), ErrorKind::Usage);

    let err = container
        .register_collection_of_types(plugins(), vec![plugin("Cache")])
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateCollection { .. }));
}

#[test]
fn singleton_elements_are_shared_across_resolutions() {
    let container = Container::new();
    container
        .register_collection_of_types(
            plugins(),
            vec![
                Element::new(
                    ServiceType::named("Audit"),
                    ClosureProvider::new(|| Ok::<_, Infallible>(Arc::new(String::from("Audit")))),
                )
                .lifetime(Lifetime::Singleton),
                Element::new(
                    ServiceType::named("Cache"),
                    ClosureProvider::new(|| Ok::<_, Infallible>(Arc::new(String::from("Cache")))),
                ),
            ],
        )
        .unwrap();

    let first: Vec<Arc<String>> = container.collect(&plugins()).unwrap();
    let second: Vec<Arc<String>> = container.collect(&plugins()).unwrap();
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    assert!(!Arc::ptr_eq(&first[1], &second[1]));
}

#[test]
fn registration_elements_share_the_registered_instance() {
    let container = Container::new();
    let registration = container
        .create_registration(
            ServiceType::named("Audit"),
            ClosureProvider::new(|| Ok::<_, Infallible>(Arc::new(String::from("Audit")))),
            Lifetime::Singleton,
        )
        .unwrap();
    container
        .register_registration(ServiceType::named("IAudit"), registration.clone())
        .unwrap();
    container
        .register_collection_of_registrations(plugins(), vec![registration])
        .unwrap();

    let single: Arc<String> = container.get(&ServiceType::named("IAudit")).unwrap();
    let all: Vec<Arc<String>> = container.collect(&plugins()).unwrap();
    assert!(Arc::ptr_eq(&single, &all[0]));
}

#[test]
fn generic_elements_are_closed_per_request() {
    let container = Container::new();
    container.declare_type(TypeFacts::reference("Order")).unwrap();
    container.declare_type(TypeFacts::value("Money")).unwrap();
    let name = |name: &'static str| {
        RawClosureProvider::new(move |_: &dyn Injector, context: &CallContext<'_>| {
            let implementation = context
                .implementation_type()
                .map_or_else(|| name.to_string(), ToString::to_string);
            Ok::<_, InjectorError>(Ok::<_, Infallible>(implementation))
        })
    };
    container
        .register_collection_of_types(
            ServiceType::named("IValidator").with_param("T"),
            vec![
                Element::new(ServiceType::named("NotNull").with_param("T"), name("NotNull")),
                Element::new(ServiceType::named("Identity").with_param("T"), name("Identity"))
                    .param(TypeParam::new("T").constraint(Constraint::ReferenceType)),
            ],
        )
        .unwrap();
    let validators = |ty: &str| ServiceType::named("IValidator").with_arg(ServiceType::named(ty));

    let names: Vec<String> = container.collect(&validators("Order")).unwrap();
    assert_eq!(names, ["NotNull<Order>", "Identity<Order>"]);
    let names: Vec<String> = container.collect(&validators("Money")).unwrap();
    assert_eq!(names, ["NotNull<Money>"]);
}

#[test]
fn external_collection_is_read_on_every_resolution() {
    let container = Container::new();
    let source = Arc::new(RwLock::new(vec![Instance::new(1i32)]));
    container
        .register_collection_external(ServiceType::of::<i32>(), Arc::clone(&source))
        .unwrap();

    let values: Vec<i32> = container.collect(&ServiceType::of::<i32>()).unwrap();
    assert_eq!(values, [1]);

    source.write().push(Instance::new(2i32));
    let values: Vec<i32> = container.collect(&ServiceType::of::<i32>()).unwrap();
    assert_eq!(values, [1, 2]);

    let err = container
        .append_to_collection(ServiceType::of::<i32>(), plugin("Audit"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::ContainerLocked { .. }));
}

#[test]
fn appending_to_external_collection_fails() {
    let container = Container::new();
    container
        .register_collection_external(plugins(), RwLock::new(Vec::<Instance>::new()))
        .unwrap();

    let err = container
        .append_to_collection(plugins(), plugin("Audit"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::CollectionStyleMixed { .. }));
}

#[test]
fn missing_external_element_fails_on_resolution() {
    let container = Container::new();
    container
        .register_collection_external(
            plugins(),
            RwLock::new(vec![Some(Instance::new("Audit")), None]),
        )
        .unwrap();

    let err = container.resolve_all(&plugins()).unwrap_err();
    let InjectorError::NullElement { index, .. } = err else {
        panic!("the missing element should be reported");
    };
    assert_eq!(index, 1);
}

#[test]
fn unregistered_collection_fails_by_default() {
    let container = Container::new();
    let err = container.resolve_all(&plugins()).unwrap_err();
    assert!(matches!(err, InjectorError::CollectionNotFound { .. }));
}

#[test]
fn unregistered_collection_resolves_empty_when_enabled() {
    let container = Container::with_options(
        ContainerOptions::default().with_resolve_unregistered_collections(true),
    );
    let collection = container.resolve_all(&plugins()).unwrap();
    assert!(collection.is_empty());
}

#[test]
fn collection_contract_is_not_a_single_registration() {
    let container = Container::new();
    container
        .register_collection_of_types(plugins(), vec![plugin("Audit")])
        .unwrap();

    let err = container.resolve(&plugins()).unwrap_err();
    assert!(matches!(err, InjectorError::NotFound { .. }));
}
