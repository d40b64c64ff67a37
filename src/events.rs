//! Protocol event hook.
//!
//! Grant handling announces credential lifecycle transitions through
//! [`EventSink`]. Emission is best-effort: sinks must not block, and their
//! failures never affect protocol correctness.

use uuid::Uuid;

use crate::models::GrantType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthEvent {
    CodeIssued {
        client_id: Uuid,
        user_id: String,
    },
    TokenIssued {
        client_id: Uuid,
        user_id: Option<String>,
        grant_type: GrantType,
    },
    TokenRefreshed {
        client_id: Uuid,
        user_id: Option<String>,
    },
    TokenRevoked {
        token_id: Uuid,
        client_id: Uuid,
    },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: OAuthEvent);
}

/// Default sink: structured log lines at debug level. Never carries secret
/// material.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: OAuthEvent) {
        match event {
            OAuthEvent::CodeIssued { client_id, user_id } => {
                tracing::debug!(%client_id, %user_id, "authorization code issued");
            }
            OAuthEvent::TokenIssued {
                client_id,
                user_id,
                grant_type,
            } => {
                tracing::debug!(
                    %client_id,
                    user_id = user_id.as_deref().unwrap_or("-"),
                    grant_type = %grant_type,
                    "token issued"
                );
            }
            OAuthEvent::TokenRefreshed { client_id, user_id } => {
                tracing::debug!(
                    %client_id,
                    user_id = user_id.as_deref().unwrap_or("-"),
                    "token refreshed"
                );
            }
            OAuthEvent::TokenRevoked {
                token_id,
                client_id,
            } => {
                tracing::debug!(%token_id, %client_id, "token revoked");
            }
        }
    }
}

/// Discards everything. Useful in tests.
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: OAuthEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<OAuthEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: OAuthEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn sinks_receive_events_in_order() {
        let sink = RecordingSink::default();
        let client_id = Uuid::new_v4();
        sink.emit(OAuthEvent::CodeIssued {
            client_id,
            user_id: "1".into(),
        });
        sink.emit(OAuthEvent::TokenIssued {
            client_id,
            user_id: Some("1".into()),
            grant_type: GrantType::AuthorizationCode,
        });

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], OAuthEvent::CodeIssued { .. }));
        assert!(matches!(events[1], OAuthEvent::TokenIssued { .. }));
    }
}
