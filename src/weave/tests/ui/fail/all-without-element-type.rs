use weave::prelude::*;

pub struct Server;

#[component]
impl Server {
    #[inject]
    pub fn new(#[all] ports: u16) -> Self {
        let _ = ports;
        Server
    }
}

fn main() {
    let _ = Server;
}
