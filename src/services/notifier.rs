use std::sync::Arc;

use tokio::sync::mpsc;

use super::email::{EmailNotification, EmailProvider};

const QUEUE_DEPTH: usize = 256;

/// Best-effort asynchronous email dispatch. Every flow that notifies an
/// account goes through this one channel; delivery failures are logged and
/// never surfaced to the request that queued the notification.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<EmailNotification>,
}

impl Notifier {
    /// Spawn the dispatcher task and return a handle for enqueueing.
    pub fn start(provider: Arc<dyn EmailProvider>) -> Self {
        let (tx, mut rx) = mpsc::channel::<EmailNotification>(QUEUE_DEPTH);

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                if let Err(e) = provider.send(&notification).await {
                    tracing::error!(
                        error = %e,
                        to = %notification.to,
                        "Failed to deliver notification email"
                    );
                }
            }
            tracing::debug!("Notification channel closed, dispatcher exiting");
        });

        Self { tx }
    }

    pub fn enqueue(&self, notification: EmailNotification) {
        if let Err(e) = self.tx.try_send(notification) {
            tracing::error!(error = %e, "Notification queue full, dropping email");
        }
    }
}
