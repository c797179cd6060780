//! Connection event adapters.
//!
//! Implementations of the `ConnectionEventSink` port:
//!
//! - `RecordingEventSink` - Captures notifications for test assertions
//! - `ChannelEventSink` - Forwards notifications to the `DisconnectDispatcher`

mod channel;
mod in_memory;

pub use channel::{ChannelEventSink, DisconnectDispatcher};
pub use in_memory::RecordingEventSink;
