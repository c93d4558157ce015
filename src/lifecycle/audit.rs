//! Structured audit events for user lifecycle transitions.
//!
//! The write path emits events; the sink decides what to do with them. The
//! sink observes and never vetoes: destroy semantics are unchanged whether
//! or not anything is listening.

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAuditEvent {
    Created { id: i32, name: String },
    Updated { id: i32, name: String },
    /// Emitted immediately before removal, with the user's current name.
    DestroyStarted { id: i32, name: String },
    /// Emitted only after the delete transaction commits.
    Destroyed { id: i32, name: String },
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: UserAuditEvent);
}

pub type SharedAuditSink = Arc<dyn AuditSink>;

/// Default sink: forwards lifecycle events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: UserAuditEvent) {
        match event {
            UserAuditEvent::Created { id, name } => {
                tracing::info!(user_id = id, name = %name, "user created");
            }
            UserAuditEvent::Updated { id, name } => {
                tracing::info!(user_id = id, name = %name, "user updated");
            }
            UserAuditEvent::DestroyStarted { id, name } => {
                tracing::info!(user_id = id, name = %name, "about to remove user");
            }
            UserAuditEvent::Destroyed { id, name } => {
                tracing::info!(user_id = id, name = %name, "user removed");
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSink;
    use super::*;

    #[test]
    fn sink_preserves_event_order() {
        let sink = RecordingSink::default();
        sink.record(UserAuditEvent::DestroyStarted {
            id: 1,
            name: "Ann".into(),
        });
        sink.record(UserAuditEvent::Destroyed {
            id: 1,
            name: "Ann".into(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], UserAuditEvent::DestroyStarted { .. }));
        assert!(matches!(events[1], UserAuditEvent::Destroyed { .. }));
    }
}
