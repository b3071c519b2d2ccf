//! Auth-state change channel
//!
//! Built on `tokio::sync::broadcast`: every subscription receives every
//! event published after it was created. Publishing with no subscribers is a
//! no-op. A subscription is a cancellation handle; dropping it (or calling
//! [`AuthSubscription::unsubscribe`]) ends delivery.

use tokio::sync::broadcast;

use crate::types::AuthEvent;

const DEFAULT_CAPACITY: usize = 64;

pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn publish(&self, event: AuthEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for AuthEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthEvents")
            .field("receiver_count", &self.sender.receiver_count())
            .finish()
    }
}

pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Next event, or `None` once the publisher is gone
    ///
    /// A subscriber that falls behind skips the overwritten events and
    /// continues with the oldest one still buffered.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}
