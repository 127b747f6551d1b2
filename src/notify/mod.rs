//! Outbound notifications (optional, fire-and-forget)

pub mod telegram;

pub use telegram::TelegramNotifier;
