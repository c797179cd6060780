//! ConnectionEventSink port - Where registry notifications go.
//!
//! The registry fires warning and disconnect events synchronously with the
//! state change that caused them. Sinks must not block and must not call
//! back into the registry.

use crate::domain::backpressure::ConnectionEvent;

/// Receiver of connection lifecycle notifications.
///
/// # Example
///
/// ```ignore
/// let (sink, events) = ChannelEventSink::new();
/// let registry = ConnectionRegistry::new(Arc::new(sink));
/// tokio::spawn(DisconnectDispatcher::new(events, transport).run(shutdown));
/// ```
pub trait ConnectionEventSink: Send + Sync {
    /// Deliver one notification.
    fn notify(&self, event: ConnectionEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_trait_is_object_safe_and_send_sync() {
        fn _assert_trait_object(_: &dyn ConnectionEventSink) {}
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<std::sync::Arc<dyn ConnectionEventSink>>();
    }
}
