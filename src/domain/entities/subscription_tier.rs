use serde::{Deserialize, Serialize};

/// Billing period chosen for a subscription purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Monthly,
    Quarterly,
    Yearly,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Monthly => "monthly",
            SubscriptionTier::Quarterly => "quarterly",
            SubscriptionTier::Yearly => "yearly",
        }
    }

    /// Price for this tier given the monthly base price.
    ///
    /// Quarterly is `floor(base * 2.7)`, yearly is `base * 10`.
    pub fn price(&self, monthly_base: i64) -> i64 {
        match self {
            SubscriptionTier::Monthly => monthly_base,
            SubscriptionTier::Quarterly => monthly_base * 27 / 10,
            SubscriptionTier::Yearly => monthly_base * 10,
        }
    }
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        SubscriptionTier::Monthly
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(SubscriptionTier::Monthly),
            "quarterly" => Ok(SubscriptionTier::Quarterly),
            "yearly" => Ok(SubscriptionTier::Yearly),
            _ => Err(format!("Invalid subscription tier: {}", s)),
        }
    }
}
