//! Outbound delivery channels for domain events.

pub mod email;
