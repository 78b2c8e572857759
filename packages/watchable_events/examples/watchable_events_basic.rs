//! Basic example of using a single-threaded event to broadcast values to several watchers.
//!
//! This demonstrates subscribing, sending, and what happens to values sent before anyone
//! was watching.

use watchable_events::{LocalEvent, LocalWatcher};

fn main() {
    println!("=== Watchable Events Basic Example ===");

    let event = LocalEvent::<String>::builder().name("greetings").build();

    // Nobody is watching yet, so this value is simply dropped.
    let delivered = event.send("is anyone there?".to_string());
    println!("Sent before any watcher subscribed, delivered: {delivered}");

    let printer = LocalWatcher::new(|value: &String| println!("printer: {value}"));
    let shouter = LocalWatcher::new(|value: &String| println!("shouter: {}", value.to_uppercase()));

    event.watch(&printer);
    event.watch(&shouter);

    // Subscribing the same watcher again does not make it receive values twice.
    event.watch(&printer);

    event.send("hello".to_string());

    event.unwatch(&printer);
    event.send("goodbye".to_string());

    println!("Example completed successfully!");
}
