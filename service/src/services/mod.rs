// service/src/services/mod.rs

pub mod email_mock;
pub mod notifications;
pub mod payment_mock;
