//! Charge amounts, platform fee and payout calendar arithmetic.
//!
//! All money values are integer minor currency units.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::{purchase_kind::PurchaseKind, subscription_tier::SubscriptionTier},
};

/// Smallest chargeable base amount ($1).
pub const MIN_AMOUNT: i64 = 100;
/// Largest chargeable base amount ($10,000).
pub const MAX_AMOUNT: i64 = 1_000_000;
/// Share of every charge withheld by the platform.
pub const PLATFORM_FEE_PERCENT: i64 = 5;
/// Minimum balance before a payout may be requested ($50).
pub const MIN_PAYOUT_AMOUNT: i64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub amount: i64,
    pub platform_fee: i64,
}

pub fn validate_amount(amount: i64) -> AppResult<()> {
    if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&amount) {
        return Err(AppError::Validation(
            "Amount must be between $1 and $10,000".into(),
        ));
    }
    Ok(())
}

/// Computes the final charge for a purchase. Tiers only apply to subscriptions.
pub fn quote(kind: PurchaseKind, base_amount: i64, tier: Option<SubscriptionTier>) -> Quote {
    let amount = match kind {
        PurchaseKind::Subscription => tier.unwrap_or_default().price(base_amount),
        _ => base_amount,
    };
    Quote {
        amount,
        platform_fee: platform_fee(amount),
    }
}

/// `floor(amount * 0.05)`
pub fn platform_fee(amount: i64) -> i64 {
    amount * PLATFORM_FEE_PERCENT / 100
}

/// Expiry of a subscription bought at `from`. Every tier grants one
/// calendar month; the tier only changes the price.
pub fn subscription_expiry(from: NaiveDateTime) -> NaiveDateTime {
    from.checked_add_months(Months::new(1)).unwrap_or(from)
}

/// Half-open window `[start, end)` covering the calendar month of `now`.
pub fn month_window(now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .unwrap_or_else(|| now.date())
        .and_hms_opt(0, 0, 0)
        .unwrap_or(now);
    let next = first.checked_add_months(Months::new(1)).unwrap_or(first);
    (first, next)
}

/// Payouts run weekly on Fridays. Returns the next Friday strictly after `today`.
pub fn next_payout_date(today: NaiveDate) -> NaiveDate {
    let from_monday = today.weekday().num_days_from_monday();
    let friday = Weekday::Fri.num_days_from_monday();
    let ahead = (friday + 7 - from_monday) % 7;
    let ahead = if ahead == 0 { 7 } else { ahead };
    today
        .checked_add_days(Days::new(ahead as u64))
        .unwrap_or(today)
}

/// Formats minor units as dollars, e.g. `1250` -> `$12.50`.
pub fn format_amount(amount: i64) -> String {
    format!("${}.{:02}", amount / 100, (amount % 100).abs())
}
