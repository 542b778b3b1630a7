use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::ledger::{SubscriptionProfile, SubscriptionRepo},
    domain::entities::subscription_status::SubscriptionStatus,
};

pub struct SubscriptionUseCases {
    subscription_repo: Arc<dyn SubscriptionRepo>,
}

impl SubscriptionUseCases {
    pub fn new(subscription_repo: Arc<dyn SubscriptionRepo>) -> Self {
        Self { subscription_repo }
    }

    /// Loads a subscription owned by `user_id`. Other users get `NotFound`.
    async fn get_owned(&self, subscription_id: Uuid, user_id: Uuid) -> AppResult<SubscriptionProfile> {
        self.subscription_repo
            .get_by_id(subscription_id)
            .await?
            .filter(|s| s.subscriber_id == user_id)
            .ok_or_else(|| AppError::NotFound("Subscription not found".into()))
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, subscription_id: Uuid, user_id: Uuid) -> AppResult<SubscriptionProfile> {
        let subscription = self.get_owned(subscription_id, user_id).await?;
        if subscription.status != SubscriptionStatus::Active {
            return Err(AppError::Validation("Subscription is not active".into()));
        }
        self.subscription_repo.cancel(subscription.id).await
    }

    /// Only a cancelled subscription with time left on it can be resumed.
    #[instrument(skip(self))]
    pub async fn reactivate(
        &self,
        subscription_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<SubscriptionProfile> {
        let subscription = self.get_owned(subscription_id, user_id).await?;
        if subscription.status != SubscriptionStatus::Cancelled {
            return Err(AppError::Validation("Subscription is not cancelled".into()));
        }
        if subscription.expires_at <= Utc::now().naive_utc() {
            return Err(AppError::Validation("Subscription has expired".into()));
        }
        self.subscription_repo.reactivate(subscription.id).await
    }
}
