// Notifier implementations
pub mod telegram;
pub mod throttle;

pub use telegram::TelegramNotifier;
pub use throttle::Throttled;
