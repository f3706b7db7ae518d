//! # Adapters
//!
//! In-process implementations of the outbound ports.

pub mod clock;
pub mod event_sink;
pub mod transport;

pub use clock::{ManualClock, SystemClock};
pub use event_sink::{InMemoryEventSink, TracingEventSink};
pub use transport::{ChannelTransport, RootsReceiver};
