//! Observable events for in-process change notification.
//!
//! An [`Event`] is a named list of callbacks that the owner fires
//! synchronously:
//! - Callbacks run in registration order with the same argument
//! - Registration is identity-based (`Arc` pointer equality)
//! - The first failing callback aborts the fire and its error propagates
//!
//! Observers must be removed by whoever added them; the event keeps them
//! alive until then.
//!
//! # Example
//!
//! ```ignore
//! let event: Event<u32> = Event::new("counter.changed");
//!
//! let printer = observer(|n: &u32| {
//!     println!("now {}", n);
//!     Ok(())
//! });
//! event.add_observer(&printer)?;
//! event.fire(&42)?;
//! event.remove_observer(&printer)?;
//! ```

mod observable;

pub use observable::{observer, Event, Observer};
