/*
[INPUT]:  Topic keys and subscription handlers
[OUTPUT]: Handler lookup for inbound channel frames
[POS]:    WebSocket layer - subscription bookkeeping
[UPDATE]: When changing routing or handler ownership
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::message::{ChannelMessage, SubscriptionHeader};
use super::topic::routing_keys;

/// Callback invoked with every frame routed to a subscription
pub type ReceiveHandler = Arc<dyn Fn(ChannelMessage) + Send + Sync>;

/// One handler per topic key; later inserts replace earlier ones
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    handlers: RwLock<HashMap<String, ReceiveHandler>>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns true when an existing handler was replaced
    pub(crate) fn insert(&self, key: String, handler: ReceiveHandler) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, handler)
            .is_some()
    }

    pub(crate) fn remove(&self, key: &str) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Registered keys, sorted
    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Find the handler for an inbound frame.
    ///
    /// The handler is cloned out of the lock so it may re-enter the registry.
    pub(crate) fn resolve(
        &self,
        subscription: &SubscriptionHeader,
    ) -> Option<(String, ReceiveHandler)> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        routing_keys(&subscription.channel, subscription.instrument.as_deref())
            .into_iter()
            .find_map(|key| handlers.get(&key).cloned().map(|handler| (key, handler)))
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
