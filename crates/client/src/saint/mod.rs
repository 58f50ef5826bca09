//! Saint-of-the-day scraping loader.
//!
//! Two page loads against catholic.org:
//!
//! 1. `/saints/sofd.php`: the first link inside `#saintsSofd` points at
//!    the full entry.
//! 2. The full entry: the first `h1` is the name; inside `#saintContent` the
//!    first `img[data-src]` is the portrait and the first `p` the
//!    introduction.
//!
//! A missing piece anywhere is a [`LoaderError`] carrying a user-visible
//! title/message pair.

use std::sync::Arc;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use sotd_core::{Error, Network, Request};

pub const SAINT_BASE_URL: &str = "https://www.catholic.org";
const LISTING_PATH: &str = "/saints/sofd.php";

const ERROR_TITLE: &str = "Internal Server Error";
const ERROR_MESSAGE: &str = "Something went wrong parsing the Saint Of The Day, let the developer know!";

/// The scraped saint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaintOfTheDay {
    pub name: String,
    pub introduction: String,
    pub read_more_link: String,
    pub image_src: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to fetch saint page: {0}")]
    Fetch(#[from] Error),

    #[error("saint page is missing {0}")]
    MissingElement(&'static str),

    #[error("invalid saint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl LoaderError {
    /// Heading shown to the user.
    pub fn title(&self) -> &'static str {
        ERROR_TITLE
    }

    /// Explanation shown to the user.
    pub fn message(&self) -> &'static str {
        ERROR_MESSAGE
    }

    pub fn status(&self) -> u16 {
        500
    }
}

pub struct SaintLoader {
    network: Arc<dyn Network>,
    base_url: Url,
}

impl SaintLoader {
    pub fn new(network: Arc<dyn Network>) -> Result<Self, LoaderError> {
        Ok(Self::with_base_url(network, Url::parse(SAINT_BASE_URL)?))
    }

    pub fn with_base_url(network: Arc<dyn Network>, base_url: Url) -> Self {
        Self { network, base_url }
    }

    pub async fn load(&self) -> Result<SaintOfTheDay, LoaderError> {
        let listing = self.fetch_html(self.base_url.join(LISTING_PATH)?).await?;
        let href = parse_listing(&listing).ok_or(LoaderError::MissingElement("#saintsSofd link"))?;

        let read_more = self.base_url.join(&href)?;
        let detail = self.fetch_html(read_more.clone()).await?;

        let saint = parse_detail(&detail, &self.base_url, &read_more)?;
        tracing::info!(name = %saint.name, "loaded saint of the day");
        Ok(saint)
    }

    async fn fetch_html(&self, url: Url) -> Result<String, LoaderError> {
        let mut response = self.network.fetch(Request::get(url)).await?;
        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status().as_u16()).into());
        }
        Ok(response.text()?)
    }
}

fn first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract the full-entry href from the listing page.
pub fn parse_listing(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let link = first(document.root_element(), "#saintsSofd a")?;
    link.value().attr("href").map(str::to_string)
}

/// Extract the saint from the full-entry page.
pub fn parse_detail(html: &str, base_url: &Url, read_more: &Url) -> Result<SaintOfTheDay, LoaderError> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let name = first(root, "h1").map(text_of).ok_or(LoaderError::MissingElement("h1"))?;
    let content = first(root, "#saintContent").ok_or(LoaderError::MissingElement("#saintContent"))?;

    let src = first(content, "img")
        .and_then(|img| img.value().attr("data-src"))
        .ok_or(LoaderError::MissingElement("#saintContent img[data-src]"))?;
    let image_src = base_url.join(src)?;

    let introduction = first(content, "p")
        .map(text_of)
        .ok_or(LoaderError::MissingElement("#saintContent p"))?;

    Ok(SaintOfTheDay { name, introduction, read_more_link: read_more.to_string(), image_src: image_src.to_string() })
}
