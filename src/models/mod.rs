pub mod listing;
pub mod seen_set;

pub use listing::{Listing, LINK_UNAVAILABLE, PRICE_UNAVAILABLE, TITLE_UNAVAILABLE};
pub use seen_set::SeenSet;
