//! Event-to-email dispatch.
//!
//! Runs as a background task. Delivery failures are logged and dropped; the
//! request that published the event has already succeeded.

use projecthub_core::{group, guide};
use projecthub_events::{DomainEvent, EmailDelivery, OutgoingEmail};
use tokio::sync::broadcast;

pub struct NotificationDispatcher {
    /// `None` when SMTP is not configured; events are then only logged.
    email: Option<EmailDelivery>,
}

impl NotificationDispatcher {
    pub fn new(email: Option<EmailDelivery>) -> Self {
        Self { email }
    }

    /// Consume events until the [`EventBus`](projecthub_events::EventBus)
    /// is dropped.
    pub async fn run(self, mut receiver: broadcast::Receiver<DomainEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.dispatch(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, event: &DomainEvent) {
        tracing::info!(
            event_type = %event.event_type,
            subject = ?event.subject,
            actor = ?event.actor,
            "Domain event"
        );

        let Some(email) = compose(event) else {
            return;
        };
        let Some(delivery) = &self.email else {
            tracing::debug!(to = %email.to, "SMTP not configured, skipping email");
            return;
        };
        if let Err(e) = delivery.send(&email).await {
            tracing::error!(
                error = %e,
                event_type = %event.event_type,
                to = %email.to,
                "Failed to send notification email"
            );
        }
    }
}

/// The email an event should produce, if any.
pub fn compose(event: &DomainEvent) -> Option<OutgoingEmail> {
    let to = event.recipient_email.as_deref()?;
    let name = event.payload["name"].as_str().unwrap_or("there");

    match event.event_type.as_str() {
        guide::EVENT_GUIDE_APPROVED => Some(OutgoingEmail::new(
            to,
            "Registration approved",
            format!(
                "Hello {name},\n\nYour guide registration has been approved. \
                 You can now sign in and create project groups."
            ),
        )),
        guide::EVENT_GUIDE_REJECTED => Some(OutgoingEmail::new(
            to,
            "Registration rejected",
            format!(
                "Hello {name},\n\nYour guide registration was not approved. \
                 Contact the department office for details."
            ),
        )),
        group::EVENT_GUIDE_REASSIGNED => {
            let guide_name = event.payload["guide_name"].as_str().unwrap_or("there");
            let group_name = event.payload["group_name"].as_str().unwrap_or("a project group");
            Some(OutgoingEmail::new(
                to,
                "New group assigned",
                format!("Hello {guide_name},\n\nYou are now the guide of {group_name}."),
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use projecthub_core::roles::Role;
    use projecthub_events::EventBus;
    use serde_json::json;

    use super::*;

    #[test]
    fn approval_email_greets_guide() {
        let event = DomainEvent::new(guide::EVENT_GUIDE_APPROVED)
            .about("guide", 4)
            .notify("mehta@college.edu")
            .with_payload(json!({ "name": "Dr. Mehta", "status": "approved" }));

        let email = compose(&event).expect("approval should produce an email");
        assert_eq!(email.to, "mehta@college.edu");
        assert_eq!(email.subject, "[ProjectHub] Registration approved");
        assert!(email.body.starts_with("Hello Dr. Mehta"));
    }

    #[test]
    fn reassignment_email_names_group() {
        let event = DomainEvent::new(group::EVENT_GUIDE_REASSIGNED)
            .notify("shah@college.edu")
            .with_payload(json!({ "group_name": "Team Orion", "guide_name": "Prof. Shah" }));

        let email = compose(&event).expect("reassignment should produce an email");
        assert!(email.body.contains("Team Orion"));
    }

    #[test]
    fn events_without_recipient_send_nothing() {
        let event = DomainEvent::new(guide::EVENT_GUIDE_APPROVED);
        assert!(compose(&event).is_none());
    }

    #[test]
    fn roster_events_send_nothing() {
        let event = DomainEvent::new(group::EVENT_MEMBERS_REPLACED).notify("x@college.edu");
        assert!(compose(&event).is_none());
    }

    #[tokio::test]
    async fn run_exits_when_bus_dropped() {
        let bus = EventBus::default();
        let receiver = bus.subscribe();
        let handle = tokio::spawn(NotificationDispatcher::new(None).run(receiver));

        bus.publish(DomainEvent::new(guide::EVENT_GUIDE_APPROVED).by(Role::Admin, 1));
        drop(bus);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("dispatcher should stop after the bus closes")
            .expect("dispatcher task should not panic");
    }
}
