//! Adapter for an Amazon-style book search
//!
//! Queries the store's search endpoint restricted to books and reads the
//! first result block: product name, star rating, number of ratings, link
//! and the per-format prices.

use crate::cache::{Record, Schema};
use crate::source::dump::dump_if_configured;
use crate::source::http::{fetch_page, Page};
use crate::source::{title_matches, AdapterOptions, FetchError, SourceAdapter};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

const RESULT_BLOCK: &str =
    r#"div[class="sg-col sg-col-4-of-12 sg-col-8-of-16 sg-col-12-of-20 s-list-col-right"]"#;
const RESULT_NAME: &str = r#"span[class="a-size-medium a-color-base a-text-normal"]"#;
const RESULT_LINK: &str = r#"a[class="a-link-normal s-link-style a-text-normal"]"#;
const RESULT_RATING: &str = "span.a-icon-alt";
const RATINGS_LINK: &str = r#"a[class="a-link-normal s-link-style"]"#;
const RATINGS_COUNT: &str = "span.a-size-base";
const PRICE_ROW: &str = r#"div[class="a-row a-spacing-mini"]"#;
const PRICE_LABEL: &str = r#"a[class="a-size-base a-link-normal s-link-style a-text-bold"]"#;
const PRICE_BOX: &str = "span.a-price";
const PRICE_VALUE: &str = "span.a-offscreen";

const ROBOT_MARKERS: &[&str] = &[
    "make sure you're not a robot",
    "To discuss automated access to Amazon data please contact",
];

/// Price labels mapped to the record fields they fill
const PRICE_FIELDS: &[(&str, &str)] = &[
    ("Kindle", "kindle_price"),
    ("Audible Audiobook", "audible_price"),
    ("Paperback", "paperback_price"),
];

/// Store search adapter
pub struct AmazonAdapter {
    client: Client,
    base_url: Url,
    options: AdapterOptions,
    schema: Schema,
}

impl AmazonAdapter {
    pub fn new(client: Client, base_url: Url, options: AdapterOptions) -> Self {
        Self {
            client,
            base_url,
            options,
            schema: Self::schema_definition(),
        }
    }

    /// Ten requests, five seconds apart, before a missing result block counts
    pub fn default_options() -> AdapterOptions {
        AdapterOptions {
            max_attempts: 10,
            attempt_delay: Duration::from_secs(5),
            dump_dir: None,
        }
    }

    /// Cache layout; keyed by the input title
    pub fn schema_definition() -> Schema {
        Schema::new(
            "title_from_src",
            &[
                "name",
                "rating",
                "users_rated",
                "kindle_price",
                "audible_price",
                "paperback_price",
                "link",
            ],
        )
    }

    fn classify_missing(&self, title: &str, page: &Page) -> FetchError {
        if !page.is_success() {
            return FetchError::transient(format!("HTTP {} without search results", page.status));
        }

        dump_if_configured(self.options.dump_dir.as_deref(), self.name(), title, &page.body);
        FetchError::not_found("Expected result block not found")
    }
}

#[async_trait]
impl SourceAdapter for AmazonAdapter {
    fn name(&self) -> &str {
        "amazon"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn fetch(&self, title: &str, author: &str) -> Result<Record, FetchError> {
        let query = format!("{} {}", title, author);
        let params = [("k", query.trim()), ("i", "stripbooks")];
        let mut last_page = None;

        for attempt in 1..=self.options.max_attempts {
            let page = fetch_page(&self.client, &self.base_url, &params).await?;

            match parse_search_page(&page.body, &page.url, title) {
                SearchOutcome::Parsed(result) => return result,
                SearchOutcome::MissingResults => {
                    if is_robot_page(&page.body) {
                        tracing::error!("Anti-automation page returned for '{}'", title);
                        return Err(FetchError::fatal("Source detected automated access"));
                    }
                    tracing::debug!(
                        "No result block for '{}' (attempt {}/{})",
                        title,
                        attempt,
                        self.options.max_attempts
                    );
                    last_page = Some(page);
                }
            }

            if attempt < self.options.max_attempts && !self.options.attempt_delay.is_zero() {
                tokio::time::sleep(self.options.attempt_delay).await;
            }
        }

        match last_page {
            Some(page) => Err(self.classify_missing(title, &page)),
            None => Err(FetchError::transient("No request attempts configured")),
        }
    }
}

/// Result of reading one search results page
#[derive(Debug)]
enum SearchOutcome {
    /// The page has no result block at all
    MissingResults,

    /// The result block was found and read
    Parsed(Result<Record, FetchError>),
}

fn is_robot_page(body: &str) -> bool {
    ROBOT_MARKERS.iter().any(|marker| body.contains(marker))
}

/// Parses a search results page
///
/// Kept synchronous so the parsed document never lives across an await.
fn parse_search_page(html: &str, page_url: &str, title: &str) -> SearchOutcome {
    let document = Html::parse_document(html);

    match select_first(document.root_element(), RESULT_BLOCK) {
        Some(block) => SearchOutcome::Parsed(extract_record(block, page_url, title)),
        None => SearchOutcome::MissingResults,
    }
}

/// Extracts the record from the first result block
fn extract_record(block: ElementRef<'_>, page_url: &str, title: &str) -> Result<Record, FetchError> {
    let name = select_first(block, RESULT_NAME)
        .map(element_text)
        .ok_or_else(|| FetchError::not_found("Name not found"))?;

    if !title_matches(&name, title) {
        return Err(FetchError::not_found(format!(
            "Name does not match: '{}'",
            name
        )));
    }

    let link = select_first(block, RESULT_LINK)
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(page_url, href))
        .unwrap_or_default();

    let rating = select_first(block, RESULT_RATING)
        .map(element_text)
        .unwrap_or_default();

    let users_rated = select_first(block, RATINGS_LINK)
        .and_then(|a| select_first(a, RATINGS_COUNT))
        .map(|span| element_text(span).replace(',', ""))
        .unwrap_or_else(|| "0".to_string());

    let prices = extract_prices(block);

    let mut record = Record::new()
        .with("name", name)
        .with("rating", rating)
        .with("users_rated", users_rated)
        .with("link", link);

    for (label, field) in PRICE_FIELDS {
        record.set(*field, prices.get(*label).cloned().unwrap_or_default());
    }

    Ok(record)
}

/// Collects format label to price, with the currency sign stripped
fn extract_prices(block: ElementRef<'_>) -> HashMap<String, String> {
    let mut prices = HashMap::new();

    let Ok(row_selector) = Selector::parse(PRICE_ROW) else {
        return prices;
    };

    for row in block.select(&row_selector) {
        let label = select_first(row, PRICE_LABEL).map(element_text);
        let value = select_first(row, PRICE_BOX)
            .and_then(|price| select_first(price, PRICE_VALUE))
            .map(|v| element_text(v).replace('$', ""));

        // Rows without both parts are promotions or delivery notes
        if let (Some(label), Some(value)) = (label, value) {
            prices.insert(label, value);
        }
    }

    prices
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Resolves a possibly relative href against the page URL
fn absolutize(page_url: &str, href: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}
