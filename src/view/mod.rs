//! Ordered message view.
//!
//! Messages are kept sorted by `(timestamp, id)` with O(log n) lookup of the
//! insertion point and O(1) lookup by id. Every new message fires
//! [`View::on_message`] with its insertion index, so a widget can mirror the
//! view by inserting at the same positions.

mod index;
mod store;

pub use index::MessageIndex;
pub use store::{Iter, MessageAdded, View};
