//! Event-driven notifications.
//!
//! The [`NotificationDispatcher`] subscribes to the event bus and emails
//! the people an event concerns.

pub mod dispatcher;

pub use dispatcher::NotificationDispatcher;
