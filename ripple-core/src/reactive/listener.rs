//! Change listeners.
//!
//! A listener is an external observer of one rule's value. It is invoked with
//! the new value every time that rule changes, whether by recomputation or by
//! a manual `set`.

use std::rc::Rc;

use crate::error::BoxError;

/// A callback registered against a rule key.
pub struct Listener<V> {
    /// Stored behind an `Rc` so the engine can snapshot a key's listener list
    /// before invoking it, leaving the list free to grow during notification.
    callback: Rc<dyn Fn(&V) -> Result<(), BoxError>>,
}

impl<V> Listener<V> {
    /// Create a listener whose failures abort the notification.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&V) -> Result<(), BoxError> + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Create a listener that cannot fail.
    pub fn infallible<F>(callback: F) -> Self
    where
        F: Fn(&V) + 'static,
    {
        Self::new(move |value| {
            callback(value);
            Ok(())
        })
    }

    /// Invoke the listener with the changed value.
    pub fn notify(&self, value: &V) -> Result<(), BoxError> {
        (self.callback)(value)
    }
}

impl<V> Clone for Listener<V> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}
