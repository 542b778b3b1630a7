use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::notifications::Notifier,
};

/// Records every message and notification it is asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(Uuid, Uuid, String)>>,
    notifications: Mutex<Vec<(Uuid, String, String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(sender, recipient, body)` in delivery order.
    pub fn messages(&self) -> Vec<(Uuid, Uuid, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// `(user, kind, title, body)` in delivery order.
    pub fn notifications(&self) -> Vec<(Uuid, String, String, String)> {
        self.notifications.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_message(&self, sender_id: Uuid, recipient_id: Uuid, body: &str) -> AppResult<()> {
        self.messages
            .lock()
            .unwrap()
            .push((sender_id, recipient_id, body.to_string()));
        Ok(())
    }

    async fn notify(&self, user_id: Uuid, kind: &str, title: &str, body: &str) -> AppResult<()> {
        self.notifications.lock().unwrap().push((
            user_id,
            kind.to_string(),
            title.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Fails every delivery.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send_message(&self, _sender_id: Uuid, _recipient_id: Uuid, _body: &str) -> AppResult<()> {
        Err(AppError::Database("messages table unavailable".into()))
    }

    async fn notify(&self, _user_id: Uuid, _kind: &str, _title: &str, _body: &str) -> AppResult<()> {
        Err(AppError::Database("notifications table unavailable".into()))
    }
}
