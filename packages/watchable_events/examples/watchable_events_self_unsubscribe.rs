//! Example of watchers that change the subscriptions of their own event while being invoked.
//!
//! A watcher subscribed here unsubscribes itself after the first value it sees and brings in
//! a replacement. The dispatch in progress is not affected - the replacement only starts
//! receiving values from the next send onward.

use std::cell::OnceCell;
use std::rc::Rc;

use watchable_events::{LocalEvent, LocalWatcher};

fn main() {
    println!("=== Watchable Events Self-Unsubscribe Example ===");

    let event = Rc::new(LocalEvent::<u32>::new());

    let replacement = LocalWatcher::new(|value: &u32| println!("replacement saw {value}"));

    let one_shot_slot: Rc<OnceCell<LocalWatcher<u32>>> = Rc::default();
    let one_shot = LocalWatcher::new({
        let event = Rc::downgrade(&event);
        let one_shot_slot = Rc::clone(&one_shot_slot);
        move |value: &u32| {
            println!("one-shot saw {value}, handing over");

            let (Some(event), Some(me)) = (event.upgrade(), one_shot_slot.get()) else {
                return;
            };

            event.unwatch(me);
            event.watch(&replacement);
        }
    });

    // The slot lets the watcher refer to itself. Setting it cannot fail on a fresh cell.
    if one_shot_slot.set(one_shot.clone()).is_err() {
        unreachable!("the slot was just created");
    }

    event.watch(&one_shot);

    for value in 1..=3 {
        println!("sending {value}");
        event.send(value);
    }

    println!("Example completed successfully!");
}
