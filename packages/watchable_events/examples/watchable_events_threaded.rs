//! Example of a thread-safe event fed by a producer thread through a dispatcher handle.
//!
//! Watchers run on the producer thread, inline with each dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use watchable_events::{Event, Watcher};

fn main() {
    println!("=== Watchable Events Threaded Example ===");

    let mut producer = None;

    let event = Event::<u64>::builder()
        .name("ticks")
        .build_with_setup(|dispatch| {
            producer = Some(thread::spawn(move || {
                for tick in 1..=5 {
                    match dispatch.dispatch(tick) {
                        Ok(delivered) => println!("tick {tick} delivered: {delivered}"),
                        Err(e) => {
                            println!("stopping producer: {e}");
                            return;
                        }
                    }
                }
            }));
        });

    let total = Arc::new(AtomicU64::new(0));

    event.watch(&Watcher::new({
        let total = Arc::clone(&total);
        move |tick: &u64| {
            total.fetch_add(*tick, Ordering::Relaxed);
        }
    }));

    if let Some(producer) = producer {
        producer.join().expect("producer thread panicked");
    }

    // Some ticks may have been sent before the watcher subscribed - those are not retained.
    println!("Sum of observed ticks: {}", total.load(Ordering::Relaxed));
    println!("Example completed successfully!");
}
