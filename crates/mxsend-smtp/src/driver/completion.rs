//! Invoke-at-most-once callback guard.

use std::fmt;

/// Wraps a completion callback so it can fire at most once.
///
/// Several failure paths (a protocol rejection, a transport error, a
/// timeout) may race to report the outcome of one send; only the first
/// report reaches the callback.
pub struct Completion<T> {
    callback: Option<Box<dyn FnOnce(T) + Send>>,
}

impl<T> Completion<T> {
    /// Wraps a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Invokes the callback with `value` if it has not fired yet.
    ///
    /// Returns `true` if this call invoked the callback.
    pub fn fire(&mut self, value: T) -> bool {
        match self.callback.take() {
            Some(callback) => {
                callback(value);
                true
            }
            None => false,
        }
    }

    fn is_fired(&self) -> bool {
        self.callback.is_none()
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("fired", &self.is_fired())
            .finish()
    }
}
