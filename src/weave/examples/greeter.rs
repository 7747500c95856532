use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use weave::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let container = Container::init(AppModule::new("greeter")).unwrap();
    container.verify().unwrap();

    let app: Arc<App> = container.get_of().unwrap();
    app.run();

    let scope = container.begin_scope();
    let session: Arc<Session> = scope.get_of().unwrap();
    session.logger.log(&format!("session #{} started", session.id));
}

struct AppModule {
    app_name: &'static str,
}

impl AppModule {
    fn new(app_name: &'static str) -> Self {
        Self { app_name }
    }
}

impl Module for AppModule {
    fn configure(&self, container: &Container) -> Result<(), Box<dyn Error + Send + Sync>> {
        container.configure_options(
            ContainerOptions::default().with_default_scoped_lifestyle(ScopedLifestyle::Flowing),
        )?;

        container.register_instance(ServiceType::named("AppName"), self.app_name)?;

        container.register_component::<ConsoleLogger>(
            ServiceType::of::<Arc<dyn Logger>>(),
            Lifetime::Singleton,
        )?;

        container.register_collection_of_types(
            ServiceType::of::<Arc<dyn Greeter>>(),
            vec![
                Element::new(
                    ServiceType::of::<EnglishGreeter>(),
                    ComponentProvider::<EnglishGreeter>::new(),
                )
                .lifetime(Lifetime::Singleton),
                Element::new(
                    ServiceType::of::<ChineseGreeter>(),
                    ComponentProvider::<ChineseGreeter>::new(),
                )
                .lifetime(Lifetime::Singleton),
            ],
        )?;

        container.register_decorator(
            DecoratorDescriptor::typed(
                ServiceType::of::<Arc<dyn Logger>>(),
                ServiceType::named("TimestampLogger"),
                |_, inner: Arc<dyn Logger>| {
                    Ok::<_, std::convert::Infallible>(
                        Arc::new(TimestampLogger { inner }) as Arc<dyn Logger>
                    )
                },
            )
            .lifetime(Lifetime::Singleton),
        )?;

        container.register_component::<App>(ServiceType::of::<Arc<App>>(), Lifetime::Singleton)?;

        container.register(
            ServiceType::of::<Arc<Session>>(),
            ServiceType::named("Session"),
            ComponentProvider::<Session>::new(),
            Lifetime::Scoped,
        )?;

        Ok(())
    }
}

trait Logger: Send + Sync + 'static {
    fn log(&self, message: &str);
}

struct ConsoleLogger {
    app_name: &'static str,
}

#[component(Arc<dyn Logger>, Arc::new)]
impl ConsoleLogger {
    #[inject]
    pub fn new(#[named("AppName")] app_name: &'static str) -> Self {
        Self { app_name }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", self.app_name, message);
    }
}

struct TimestampLogger {
    inner: Arc<dyn Logger>,
}

impl Logger for TimestampLogger {
    fn log(&self, message: &str) {
        let elapsed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.inner.log(&format!("{elapsed} {message}"));
    }
}

trait Greeter: Send + Sync + 'static {
    fn greet(&self);
}

struct EnglishGreeter {
    logger: Arc<dyn Logger>,
}

#[component(Arc<dyn Greeter>, Arc::new)]
impl EnglishGreeter {
    #[inject]
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Greeter for EnglishGreeter {
    fn greet(&self) {
        self.logger.log("Hello World!");
    }
}

struct ChineseGreeter {
    logger: Arc<dyn Logger>,
}

#[component(Arc<dyn Greeter>, Arc::new)]
impl ChineseGreeter {
    #[inject]
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Greeter for ChineseGreeter {
    fn greet(&self) {
        self.logger.log("你好世界!");
    }
}

struct App {
    logger: Arc<dyn Logger>,
    greeters: Vec<Arc<dyn Greeter>>,
}

#[component(Arc<App>, Arc::new)]
impl App {
    #[inject]
    fn new(logger: Arc<dyn Logger>, #[all] greeters: Vec<Arc<dyn Greeter>>) -> Self {
        Self { logger, greeters }
    }

    fn run(&self) {
        self.logger.log("Greeting from weave managed objects:");
        for greeter in &self.greeters {
            greeter.greet();
        }
    }
}

struct Session {
    id: u64,
    logger: Arc<dyn Logger>,
}

#[component(Arc<Session>, Arc::new)]
impl Session {
    #[inject]
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { id: 1, logger }
    }
}
