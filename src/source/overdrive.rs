//! Adapter for an OverDrive-style library catalogue
//!
//! Searches a library's catalogue and reports whether the title is held as
//! an ebook and/or audiobook and whether a copy can be borrowed right now.

use crate::cache::{Record, Schema};
use crate::source::dump::dump_if_configured;
use crate::source::http::{fetch_page, Page};
use crate::source::{title_matches, AdapterOptions, FetchError, SourceAdapter};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

const RESULTS_BLOCK: &str = "section#search div#main";
const TITLE_CARD: &str = r#"li[class="js-titleCard Item"]"#;
const CARD_TITLE: &str = "h3.title-name";
const EBOOK_ICON: &str = "i.icon-ebook";
const AUDIOBOOK_ICON: &str = "i.icon-audiobook";
const BORROW_BUTTON: &str =
    r#"button[class="TitleActionButton u-allCaps secondary-color is-borrow js-borrow secondary"]"#;

const NO_MATCHES_MARKER: &str = "We couldn't find any matches for";
const SESSION_EXPIRED_MARKER: &str = "Your session has expired";

/// Library catalogue adapter
pub struct OverdriveAdapter {
    client: Client,
    base_url: Url,
    options: AdapterOptions,
    schema: Schema,
}

impl OverdriveAdapter {
    pub fn new(client: Client, base_url: Url, options: AdapterOptions) -> Self {
        Self {
            client,
            base_url,
            options,
            schema: Self::schema_definition(),
        }
    }

    /// Two requests, each preceded by a fifteen second pause
    pub fn default_options() -> AdapterOptions {
        AdapterOptions {
            max_attempts: 2,
            attempt_delay: Duration::from_secs(15),
            dump_dir: None,
        }
    }

    /// Cache layout; keyed by the matched catalogue title
    pub fn schema_definition() -> Schema {
        Schema::new("title", &["title", "audiobook", "ebook", "available", "link"])
    }

    fn classify_missing(&self, title: &str, page: &Page) -> FetchError {
        if page.body.contains(SESSION_EXPIRED_MARKER) {
            tracing::error!("Catalogue session expired while fetching '{}'", title);
            return FetchError::fatal("Source rejected the session");
        }

        if !page.is_success() {
            return FetchError::transient(format!("HTTP {} without search results", page.status));
        }

        dump_if_configured(self.options.dump_dir.as_deref(), self.name(), title, &page.body);
        FetchError::not_found("Results block not found")
    }
}

#[async_trait]
impl SourceAdapter for OverdriveAdapter {
    fn name(&self) -> &str {
        "overdrive"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    async fn fetch(&self, title: &str, author: &str) -> Result<Record, FetchError> {
        let query = format!("{} {}", title, author);
        let params = [("query", query.trim())];
        let mut last_page = None;

        for attempt in 1..=self.options.max_attempts {
            // The catalogue throttles bursts, so pause before every request
            if !self.options.attempt_delay.is_zero() {
                tokio::time::sleep(self.options.attempt_delay).await;
            }

            let page = fetch_page(&self.client, &self.base_url, &params).await?;

            if page.body.contains(NO_MATCHES_MARKER) {
                return Err(FetchError::not_found("No matches"));
            }

            match parse_catalogue_page(&page.body, title) {
                Some(result) => return result.map(|record| record.with("link", page.url.as_str())),
                None => {
                    tracing::debug!(
                        "No results block for '{}' (attempt {}/{})",
                        title,
                        attempt,
                        self.options.max_attempts
                    );
                    last_page = Some(page);
                }
            }
        }

        match last_page {
            Some(page) => Err(self.classify_missing(title, &page)),
            None => Err(FetchError::transient("No request attempts configured")),
        }
    }
}

/// Parses a catalogue search page
///
/// Returns `None` when the results block is missing entirely.
fn parse_catalogue_page(html: &str, title: &str) -> Option<Result<Record, FetchError>> {
    let document = Html::parse_document(html);
    let results = select_first(document.root_element(), RESULTS_BLOCK)?;
    Some(extract_availability(results, title))
}

/// Folds every matching title card into one availability record
fn extract_availability(results: ElementRef<'_>, title: &str) -> Result<Record, FetchError> {
    let Ok(card_selector) = Selector::parse(TITLE_CARD) else {
        return Err(FetchError::transient("Invalid title card selector"));
    };

    let mut matched = false;
    let mut ebook = false;
    let mut audiobook = false;
    let mut available = false;

    for card in results.select(&card_selector) {
        let card_title = select_first(card, CARD_TITLE)
            .and_then(|h3| h3.value().attr("title"))
            .unwrap_or("");

        if !title_matches(card_title, title) {
            continue;
        }

        matched = true;
        ebook |= select_first(card, EBOOK_ICON).is_some();
        audiobook |= select_first(card, AUDIOBOOK_ICON).is_some();
        available |= select_first(card, BORROW_BUTTON).is_some();
    }

    if !matched {
        return Err(FetchError::not_found("Name not found"));
    }

    Ok(Record::new()
        .with("title", title)
        .with("audiobook", audiobook.to_string())
        .with("ebook", ebook.to_string())
        .with("available", available.to_string()))
}

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}
