//! nature.com research-article catalog
//!
//! Listing pages are sorted by publication date; a random card is picked from
//! the requested page and its article page is fetched for the abstract.

use super::SourceFeed;
use crate::config::SourceConfig;
use crate::error::Result;
use crate::types::{Document, ABSTRACT_NOT_AVAILABLE};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

static CARD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("article.u-full-height.c-card.c-card--flush").expect("Valid card selector")
});
static CARD_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3.c-card__title").expect("Valid card title selector"));
static CARD_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("Valid card link selector"));
static ABSTRACT_SECTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.c-article-section__content").expect("Valid abstract selector")
});

/// Citation markers glued to the preceding word ("reefs1,2" -> "reefs")
static CITATION_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)(\d+(?:,\d+)*)").expect("Valid citation regex"));

/// A card on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub title: String,
    pub url: String,
}

/// HTTP-backed catalog provider
pub struct NatureCatalog {
    client: Client,
    base_url: String,
    page_count: u32,
}

impl NatureCatalog {
    /// Create a catalog client from configuration
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_count: config.furthest_page,
        })
    }

    fn listing_url(&self, page: u32) -> String {
        format!(
            "{}/nature/research-articles?searchType=journalSearch&sort=PubDate&page={}",
            self.base_url, page
        )
    }

    async fn get_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl SourceFeed for NatureCatalog {
    async fn fetch_random(&self, page: u32) -> Result<Option<Document>> {
        info!("Fetching a random article from page {}...", page);
        let listing = self.get_html(&self.listing_url(page)).await?;

        let cards = parse_listing(&listing, &self.base_url);
        if cards.is_empty() {
            info!("No articles found on page {}", page);
            return Ok(None);
        }

        let card = {
            let index = rand::thread_rng().gen_range(0..cards.len());
            cards[index].clone()
        };
        debug!("Fetching article: {}", card.title);

        let article = self.get_html(&card.url).await?;
        let body_text = match parse_abstract(&article) {
            Some(text) => clean_abstract(&text),
            None => ABSTRACT_NOT_AVAILABLE.to_string(),
        };

        Ok(Some(Document::new(card.title, body_text, card.url)))
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }
}

/// Extract the article cards from a listing page
pub fn parse_listing(html: &str, base_url: &str) -> Vec<ListingCard> {
    let document = Html::parse_document(html);

    document
        .select(&CARD)
        .filter_map(|card| {
            let title = card.select(&CARD_TITLE).next().map(element_text)?;
            let href = card.select(&CARD_LINK).next()?.value().attr("href")?;
            if title.is_empty() {
                return None;
            }
            Some(ListingCard {
                title,
                url: absolute_url(base_url, href),
            })
        })
        .collect()
}

/// Extract the abstract section text from an article page
pub fn parse_abstract(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let text = document.select(&ABSTRACT_SECTION).next().map(element_text)?;
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Strip citation digits glued to words
pub fn clean_abstract(text: &str) -> String {
    CITATION_DIGITS.replace_all(text, "$1").into_owned()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn absolute_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_url, href)
    }
}
