pub mod config;
pub mod models;
pub mod plugins;
pub mod poll_cycle;
pub mod scheduler;
pub mod scraper;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use models::{Listing, SeenSet};
pub use poll_cycle::{CycleReport, PollCycle};
pub use scheduler::ListingScheduler;
pub use store::DedupStore;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
