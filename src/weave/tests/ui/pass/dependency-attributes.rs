use std::collections::VecDeque;
use std::sync::Arc;

use weave::prelude::*;

pub trait Plugin: Send + Sync + 'static {}

pub struct Dashboard;

#[component(Arc<Dashboard>, Arc::new)]
impl Dashboard {
    #[inject]
    pub fn new(
        _retries: u8,
        #[named("Title")] _title: &'static str,
        #[contract(ServiceType::named("IRepo").with_arg(ServiceType::named("Order")))]
        _orders: String,
        #[all] _ports: Vec<u16>,
        #[all] _hosts: VecDeque<String>,
        #[all(ServiceType::named("IPlugin"))] _plugins: Vec<Arc<dyn Plugin>>,
    ) -> Self {
        Dashboard
    }
}

pub struct Metrics;

#[component]
impl Metrics {
    #[inject]
    pub fn new(
        #[all(ServiceType::named("IExporter"))] _exporters: Collection,
    ) -> Result<Self, std::fmt::Error> {
        Ok(Metrics)
    }
}

fn main() {}
