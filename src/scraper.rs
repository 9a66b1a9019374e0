use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::config::ScraperConfig;
use crate::models::{Listing, LINK_UNAVAILABLE, PRICE_UNAVAILABLE, TITLE_UNAVAILABLE};
use crate::plugins::traits::ListingSource;
use crate::utils::error::{AppError, Result};

/// CSS selectors describing where each listing part lives on a results page.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    card: Selector,
    title: Selector,
    link: Selector,
    price: Selector,
}

impl ListingSelectors {
    pub fn parse(card: &str, title: &str, link: &str, price: &str) -> Result<Self> {
        Ok(Self {
            card: parse_selector(card)?,
            title: parse_selector(title)?,
            link: parse_selector(link)?,
            price: parse_selector(price)?,
        })
    }

    /// Extract every card on the page. Parts that cannot be found fall back
    /// to their "non disponibile" placeholders.
    pub fn extract(&self, html: &str, page_url: &Url) -> Vec<Listing> {
        let document = Html::parse_document(html);

        document
            .select(&self.card)
            .map(|card| {
                let title = first_text(&card, &self.title)
                    .unwrap_or_else(|| TITLE_UNAVAILABLE.to_string());
                let link = card
                    .select(&self.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| resolve_link(page_url, href))
                    .unwrap_or_else(|| LINK_UNAVAILABLE.to_string());
                let price = first_text(&card, &self.price)
                    .unwrap_or_else(|| PRICE_UNAVAILABLE.to_string());

                Listing { title, link, price }
            })
            .collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn first_text(card: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

// Absolute hrefs are kept byte for byte, since they are the stored identity.
fn resolve_link(page_url: &Url, href: &str) -> String {
    if Url::parse(href).is_ok() {
        return href.to_string();
    }
    page_url
        .join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

/// Fetches a results page over HTTP and extracts its listing cards.
pub struct HttpListingSource {
    client: Client,
    user_agent: String,
    selectors: ListingSelectors,
}

impl HttpListingSource {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let selectors = ListingSelectors::parse(
            &config.card_selector,
            &config.title_selector,
            &config.link_selector,
            &config.price_selector,
        )?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            selectors,
        })
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Listing>> {
        let page_url = Url::parse(url).map_err(|e| AppError::Fetch {
            url: url.to_string(),
            message: format!("invalid URL: {}", e),
        })?;

        let response = self
            .client
            .get(page_url.clone())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.text().await?;
        let listings = self.selectors.extract(&body, &page_url);
        tracing::debug!(url, count = listings.len(), "Extracted listings");
        Ok(listings)
    }
}
