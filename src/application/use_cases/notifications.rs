use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::{app_error::AppResult, application::pricing::format_amount};

/// Best-effort messaging towards creators and subscribers.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, sender_id: Uuid, recipient_id: Uuid, body: &str)
    -> AppResult<()>;

    async fn notify(&self, user_id: Uuid, kind: &str, title: &str, body: &str) -> AppResult<()>;
}

/// Follow-up work for a settled purchase. Runs after the ledger commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    WelcomeMessage {
        creator_id: Uuid,
        subscriber_id: Uuid,
        body: String,
    },
    NewSubscriber {
        creator_id: Uuid,
        amount: i64,
    },
    NewTip {
        creator_id: Uuid,
        amount: i64,
        message: Option<String>,
    },
    ContentPurchased {
        creator_id: Uuid,
        content_id: Uuid,
        amount: i64,
    },
}

impl SideEffect {
    pub fn name(&self) -> &'static str {
        match self {
            SideEffect::WelcomeMessage { .. } => "welcome_message",
            SideEffect::NewSubscriber { .. } => "new_subscriber",
            SideEffect::NewTip { .. } => "new_tip",
            SideEffect::ContentPurchased { .. } => "content_purchased",
        }
    }

    async fn deliver(&self, notifier: &dyn Notifier) -> AppResult<()> {
        match self {
            SideEffect::WelcomeMessage {
                creator_id,
                subscriber_id,
                body,
            } => notifier.send_message(*creator_id, *subscriber_id, body).await,
            SideEffect::NewSubscriber { creator_id, amount } => {
                notifier
                    .notify(
                        *creator_id,
                        "subscription",
                        "New subscriber",
                        &format!("Someone subscribed for {}", format_amount(*amount)),
                    )
                    .await
            }
            SideEffect::NewTip {
                creator_id,
                amount,
                message,
            } => {
                let body = match message {
                    Some(message) => format!("You received a {} tip: {}", format_amount(*amount), message),
                    None => format!("You received a {} tip", format_amount(*amount)),
                };
                notifier.notify(*creator_id, "tip", "New tip", &body).await
            }
            SideEffect::ContentPurchased {
                creator_id,
                content_id,
                amount,
            } => {
                notifier
                    .notify(
                        *creator_id,
                        "purchase",
                        "Content purchased",
                        &format!(
                            "Content {} was unlocked for {}",
                            content_id,
                            format_amount(*amount)
                        ),
                    )
                    .await
            }
        }
    }
}

/// Delivers every effect, logging failures instead of returning them.
pub async fn run_side_effects(notifier: Arc<dyn Notifier>, effects: Vec<SideEffect>) {
    for effect in effects {
        if let Err(err) = effect.deliver(notifier.as_ref()).await {
            tracing::warn!(error = %err, effect = effect.name(), "Side effect delivery failed");
        }
    }
}

/// Fire-and-forget wrapper around [`run_side_effects`].
pub fn spawn_side_effects(
    notifier: Arc<dyn Notifier>,
    effects: Vec<SideEffect>,
) -> Option<JoinHandle<()>> {
    if effects.is_empty() {
        return None;
    }
    Some(tokio::spawn(run_side_effects(notifier, effects)))
}
