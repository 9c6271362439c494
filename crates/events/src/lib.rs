//! ProjectHub domain events and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the event envelope published by API handlers.
//! - [`delivery`]: outbound channels (SMTP email).

pub mod bus;
pub mod delivery;

pub use bus::{DomainEvent, EventActor, EventBus, EventSubject};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError, OutgoingEmail};
