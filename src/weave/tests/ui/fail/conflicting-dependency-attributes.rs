use weave::prelude::*;

pub struct Greeter;

#[component]
impl Greeter {
    #[inject]
    pub fn new(#[named("Greeting")] #[all] greetings: Vec<&'static str>) -> Self {
        let _ = greetings;
        Greeter
    }
}

fn main() {
    let _ = Greeter;
}
