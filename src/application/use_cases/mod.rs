pub mod ledger;
pub mod notifications;
pub mod payouts;
pub mod reconciliation;
pub mod settlement;
pub mod subscriptions;
