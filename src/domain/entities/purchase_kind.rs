use serde::{Deserialize, Serialize};

/// What a payment buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "purchase_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    Subscription,
    Tip,
    Ppv,
    LiveStream,
}

impl PurchaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseKind::Subscription => "subscription",
            PurchaseKind::Tip => "tip",
            PurchaseKind::Ppv => "ppv",
            PurchaseKind::LiveStream => "live_stream",
        }
    }
}

impl std::fmt::Display for PurchaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PurchaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscription" => Ok(PurchaseKind::Subscription),
            "tip" => Ok(PurchaseKind::Tip),
            "ppv" => Ok(PurchaseKind::Ppv),
            "live_stream" => Ok(PurchaseKind::LiveStream),
            _ => Err(format!("Invalid purchase kind: {}", s)),
        }
    }
}
