//! Domain events raised by the auth service.
//!
//! Emission is best effort. Sinks swallow their own failures so that a broken
//! consumer can never fail a login.

use crate::db::models::{GuestId, UserId};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    UserCreated { user_id: UserId, guest_id: Option<GuestId> },
    UserLoggedIn { user_id: UserId, guest_id: Option<GuestId> },
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: AuthEvent);
}

/// Records events as structured log lines.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: AuthEvent) {
        match event {
            AuthEvent::UserCreated { user_id, guest_id } => {
                info!(user_id, guest_id = ?guest_id, "user created");
            }
            AuthEvent::UserLoggedIn { user_id, guest_id } => {
                info!(user_id, guest_id = ?guest_id, "user logged in");
            }
        }
    }
}

/// Forwards events to an in-process consumer.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<AuthEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuthEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: AuthEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!("Dropped auth event, consumer is gone: {:?}", e.0);
        }
    }
}
