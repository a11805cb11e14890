mod channel;
mod event_types;
mod hooks;
mod watch;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderCreatedEvent, OrderDeliveredEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
pub use watch::{OrderWatch, WatchRegistry};
