//! Console greeting demo: one greeting function applied to two people.

use helper_server::greeter::{greet_friendly, greet_two_people};

fn main() {
    greet_two_people(|name| println!("Hi {name}"), "Jane", "John");
    greet_two_people(|name| println!("{}", greet_friendly(name)), "Jane", "John");
}
