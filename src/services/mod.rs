pub mod auth_service;
pub mod order_service;
pub mod payment_service;
pub mod transaction_service;
pub mod webhook_service;
