use serde::{Deserialize, Serialize};

/// Local status of a gateway payment intent.
///
/// Two writers touch this field: the synchronous confirm path and the
/// webhook reconciler. Neither may move an intent back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_intent_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Pending,
    Succeeded,
    Failed,
}

impl PaymentIntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentIntentStatus::Pending => "pending",
            PaymentIntentStatus::Succeeded => "succeeded",
            PaymentIntentStatus::Failed => "failed",
        }
    }

    /// Status stored after a writer attempts to write `next` over `self`.
    ///
    /// `succeeded` is absorbing. `failed` only yields to `succeeded`, since a
    /// later success means the gateway collected the money.
    pub fn transition(self, next: PaymentIntentStatus) -> PaymentIntentStatus {
        match (self, next) {
            (PaymentIntentStatus::Succeeded, _) => PaymentIntentStatus::Succeeded,
            (PaymentIntentStatus::Failed, PaymentIntentStatus::Succeeded) => {
                PaymentIntentStatus::Succeeded
            }
            (PaymentIntentStatus::Failed, _) => PaymentIntentStatus::Failed,
            (PaymentIntentStatus::Pending, next) => next,
        }
    }
}

impl Default for PaymentIntentStatus {
    fn default() -> Self {
        PaymentIntentStatus::Pending
    }
}

impl std::fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
