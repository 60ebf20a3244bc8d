//! Named broadcast point with synchronous, ordered callbacks.

use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A registered callback. Two observers are the same iff they share an `Arc`.
pub type Observer<A> = Arc<dyn Fn(&A) -> Result<()> + Send + Sync>;

/// Wrap a closure as an [`Observer`].
pub fn observer<A, F>(f: F) -> Observer<A>
where
    F: Fn(&A) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Event that tracks a list of observer callbacks to notify when fired.
pub struct Event<A> {
    /// Diagnostic name only.
    name: String,
    /// Registered callbacks in call order.
    observers: RwLock<Vec<Observer<A>>>,
}

impl<A> Event<A> {
    /// Create a new event with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a callback.
    ///
    /// Fails with [`Error::DuplicateObserver`] if it is already registered.
    pub fn add_observer(&self, callback: &Observer<A>) -> Result<()> {
        let mut observers = self.observers.write();
        if observers.iter().any(|o| same_observer(o, callback)) {
            return Err(Error::DuplicateObserver {
                event: self.name.clone(),
            });
        }
        observers.push(Arc::clone(callback));
        Ok(())
    }

    /// Deregister a callback.
    ///
    /// Fails with [`Error::NotAnObserver`] if it is not registered.
    pub fn remove_observer(&self, callback: &Observer<A>) -> Result<()> {
        let mut observers = self.observers.write();
        match observers.iter().position(|o| same_observer(o, callback)) {
            Some(pos) => {
                observers.remove(pos);
                Ok(())
            }
            None => Err(Error::NotAnObserver {
                event: self.name.clone(),
            }),
        }
    }

    pub fn is_observer(&self, callback: &Observer<A>) -> bool {
        self.observers
            .read()
            .iter()
            .any(|o| same_observer(o, callback))
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }

    /// Call every observer with `args`, in registration order.
    ///
    /// Stops at the first observer that fails and returns its error; later
    /// observers are not called. Callbacks run outside the observer lock, so
    /// registration changes made during a fire apply to the next one.
    pub fn fire(&self, args: &A) -> Result<()> {
        let observers = self.observers.read().clone();
        for observer in &observers {
            observer(args)?;
        }
        Ok(())
    }
}

impl<A> fmt::Debug for Event<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event('{}')", self.name)
    }
}

/// Compare data pointers only; vtable pointers for the same closure may
/// differ across codegen units.
fn same_observer<A>(a: &Observer<A>, b: &Observer<A>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
