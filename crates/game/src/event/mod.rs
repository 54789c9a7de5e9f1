mod queue;
mod types;

pub use queue::{EventQueue, EventQueueError, PendingEvent};
pub use types::HostEvent;
