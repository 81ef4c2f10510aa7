//! Ledger events and their in-process distribution.
//!
//! Events are published only after the unit of work that produced them has
//! committed; subscribers (read-model projections, notifications) must treat them
//! as facts and tolerate redelivery.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
