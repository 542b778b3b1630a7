use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Completed => "completed",
            PayoutStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verification state of a creator's connected payout account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payout_account_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutAccountStatus {
    Pending,
    Verified,
}

impl PayoutAccountStatus {
    /// Maps the gateway's account capability flags.
    pub fn from_capabilities(charges_enabled: bool, payouts_enabled: bool) -> Self {
        if charges_enabled && payouts_enabled {
            PayoutAccountStatus::Verified
        } else {
            PayoutAccountStatus::Pending
        }
    }
}
