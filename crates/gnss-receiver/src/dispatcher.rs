//! Fix Dispatcher

use nmea_parser::FixRecord;
use tracing::trace;

/// Application callback, run on the reader task
pub type FixCallback = Box<dyn FnMut(&FixRecord) + Send>;

/// Hands parsed fixes to the registered callback
#[derive(Default)]
pub struct FixDispatcher {
    callback: Option<FixCallback>,
    dispatched: u64,
}

impl FixDispatcher {
    /// Create a dispatcher with no callback
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the callback
    pub fn register<F>(&mut self, callback: F)
    where
        F: FnMut(&FixRecord) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    /// Remove the callback; later fixes are dropped
    pub fn unregister(&mut self) {
        self.callback = None;
    }

    /// Check if a callback is registered
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Deliver one fix; returns false if nobody was listening
    pub fn dispatch(&mut self, fix: &FixRecord) -> bool {
        match self.callback.as_mut() {
            Some(callback) => {
                callback(fix);
                self.dispatched += 1;
                true
            }
            None => {
                trace!("No fix callback registered, dropping fix");
                false
            }
        }
    }

    /// Number of fixes delivered so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmea_parser::parse;
    use std::sync::{Arc, Mutex};

    fn fix() -> FixRecord {
        parse(b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A").unwrap()
    }

    #[test]
    fn test_dispatch_without_callback() {
        let mut dispatcher = FixDispatcher::new();
        assert!(!dispatcher.dispatch(&fix()));
        assert_eq!(dispatcher.dispatched(), 0);
    }

    #[test]
    fn test_dispatch_calls_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut dispatcher = FixDispatcher::new();
        dispatcher.register(move |fix| sink.lock().unwrap().push(*fix));

        assert!(dispatcher.dispatch(&fix()));
        assert!(dispatcher.dispatch(&fix()));
        assert_eq!(dispatcher.dispatched(), 2);
        assert_eq!(seen.lock().unwrap().len(), 2);

        dispatcher.unregister();
        assert!(!dispatcher.has_callback());
        assert!(!dispatcher.dispatch(&fix()));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
