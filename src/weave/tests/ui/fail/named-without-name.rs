use weave::prelude::*;

pub struct Greeter;

#[component]
impl Greeter {
    #[inject]
    pub fn new(#[named] greeting: &'static str) -> Self {
        let _ = greeting;
        Greeter
    }
}

fn main() {
    let _ = Greeter;
}
