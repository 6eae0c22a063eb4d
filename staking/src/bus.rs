//! Synchronous fan-out of token events to subscribers.

use tally_types::TokenEvent;

/// Listeners are invoked inline on the emitting thread, in subscription
/// order; keep handlers fast.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&TokenEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&TokenEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &TokenEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
