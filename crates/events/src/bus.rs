//! In-process event bus.
//!
//! Handlers publish a [`DomainEvent`] after a state change has been
//! committed. Subscribers (the notification dispatcher, the audit log) run
//! as background tasks and never block or fail the publishing request.

use chrono::Utc;
use projecthub_core::roles::Role;
use projecthub_core::types::{DbId, Timestamp};
use serde::Serialize;
use tokio::sync::broadcast;

/// The entity an event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSubject {
    pub kind: &'static str,
    pub id: DbId,
}

/// Who caused the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventActor {
    pub role: Role,
    pub id: DbId,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    /// Dot-separated name, e.g. `"guide.approved"`.
    pub event_type: String,
    pub subject: Option<EventSubject>,
    pub actor: Option<EventActor>,
    /// Address to notify, when the event concerns a person with an email.
    pub recipient_email: Option<String>,
    pub payload: serde_json::Value,
    pub occurred_at: Timestamp,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            subject: None,
            actor: None,
            recipient_email: None,
            payload: serde_json::Value::Object(Default::default()),
            occurred_at: Utc::now(),
        }
    }

    pub fn about(mut self, kind: &'static str, id: DbId) -> Self {
        self.subject = Some(EventSubject { kind, id });
        self
    }

    pub fn by(mut self, role: Role, id: DbId) -> Self {
        self.actor = Some(EventActor { role, id });
        self
    }

    pub fn notify(mut self, email: impl Into<String>) -> Self {
        self.recipient_email = Some(email.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out bus shared as `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// When the buffer is full the oldest events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently when nobody
    /// is listening.
    pub fn publish(&self, event: DomainEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_enriched_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            DomainEvent::new("guide.approved")
                .about("guide", 12)
                .by(Role::Admin, 1)
                .notify("mehta@example.edu")
                .with_payload(serde_json::json!({ "status": "approved" })),
        );

        let event = rx.recv().await.expect("event should be delivered");
        assert_eq!(event.event_type, "guide.approved");
        assert_eq!(event.subject, Some(EventSubject { kind: "guide", id: 12 }));
        assert_eq!(event.actor.map(|a| a.role), Some(Role::Admin));
        assert_eq!(event.recipient_email.as_deref(), Some("mehta@example.edu"));
        assert_eq!(event.payload["status"], "approved");
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let bus = EventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(DomainEvent::new("group.members_replaced"));

        assert_eq!(first.recv().await.unwrap().event_type, "group.members_replaced");
        assert_eq!(second.recv().await.unwrap().event_type, "group.members_replaced");
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::new("division.created"));
    }
}
