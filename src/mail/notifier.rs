//! Background worker that owns notification delivery.

use tokio::sync::mpsc;

use super::{ContactNotification, Mailer};

/// Hands notifications to the worker; never waits for delivery.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<ContactNotification>,
}

impl Notifier {
    /// Start the delivery worker on the current runtime.
    pub fn spawn(mailer: Mailer) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ContactNotification>();

        tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                mailer.deliver(notification).await;
            }
            tracing::debug!("notification worker stopped");
        });

        Self { tx }
    }

    pub fn notify(&self, notification: ContactNotification) {
        if self.tx.send(notification).is_err() {
            tracing::error!("Notification worker is gone; contact notification dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::testing::{mailer, FailingSender, FlakySender, RecordingSender};
    use std::{sync::Arc, time::Duration};

    fn notification(name: &str) -> ContactNotification {
        ContactNotification {
            sender_name: name.to_string(),
            sender_email: "someone@example.com".to_string(),
            message: "Hi".to_string(),
            voice_memo: None,
        }
    }

    async fn wait_for(sender: &RecordingSender, count: usize) -> usize {
        for _ in 0..100 {
            let sent = sender.sent.lock().await.len();
            if sent >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sender.sent.lock().await.len()
    }

    #[tokio::test]
    async fn test_notifications_are_delivered_in_background() {
        let sender = Arc::new(RecordingSender::default());
        let notifier = Notifier::spawn(mailer(sender.clone()));

        notifier.notify(notification("First"));
        notifier.notify(notification("Second"));

        assert_eq!(wait_for(&sender, 2).await, 2);
        let sent = sender.sent.lock().await;
        assert!(sent[0].contains("from First"));
        assert!(sent[1].contains("from Second"));
    }

    #[tokio::test]
    async fn test_worker_survives_send_failures() {
        let sender = Arc::new(FlakySender::failing(2));
        let notifier = Notifier::spawn(mailer(sender.clone()));

        notifier.notify(notification("Lost"));
        notifier.notify(notification("Also lost"));
        notifier.notify(notification("Later"));

        assert_eq!(wait_for(&sender.recorder, 1).await, 1);
        let sent = sender.recorder.sent.lock().await;
        assert!(sent[0].contains("from Later"));
    }

    #[tokio::test]
    async fn test_always_failing_sender_does_not_stop_the_worker() {
        let notifier = Notifier::spawn(mailer(Arc::new(FailingSender)));
        notifier.notify(notification("Lost"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!notifier.tx.is_closed());
    }
}
