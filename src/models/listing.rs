use serde::{Deserialize, Serialize};

pub const TITLE_UNAVAILABLE: &str = "Titolo non disponibile";
pub const LINK_UNAVAILABLE: &str = "Link non disponibile";
pub const PRICE_UNAVAILABLE: &str = "Prezzo non disponibile";

/// One advertisement as extracted from a listing page.
///
/// `link` is the identity of a listing: two records with the same link are
/// the same listing, including records that both fell back to
/// [`LINK_UNAVAILABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub title: String,
    pub link: String,
    pub price: String,
}

impl Listing {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            price: price.into(),
        }
    }

    /// Text sent to the destination when this listing is first seen.
    pub fn notification_text(&self) -> String {
        format!(
            "Nuova inserzione trovata:\n{}\nPrezzo: {}\nLink: {}",
            self.title, self.price, self.link
        )
    }

    pub fn has_link(&self) -> bool {
        self.link != LINK_UNAVAILABLE
    }
}
