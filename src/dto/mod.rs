pub mod auth;
pub mod orders;
pub mod payments;
pub mod transactions;
pub mod webhooks;
