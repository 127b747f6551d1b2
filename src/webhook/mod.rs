//! Deposit-detection webhook maintenance (optional)

pub mod registrar;

pub use registrar::WebhookRegistrar;
