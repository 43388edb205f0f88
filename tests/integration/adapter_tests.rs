//! Concrete adapters against mock HTTP servers
//!
//! These tests use wiremock to stand in for the store search and the
//! library catalogue, with attempt delays set to zero.

use shelf_scout::cache::{RecordCache, TsvCache};
use shelf_scout::engine::{RateLimiter, ResolveEngine, ResolveError, Termination};
use shelf_scout::source::{
    build_http_client, AdapterOptions, AmazonAdapter, FetchError, OverdriveAdapter, SourceAdapter,
};
use shelf_scout::state::{Batch, Disposition, WorkItem};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options(max_attempts: u32, dump_dir: Option<PathBuf>) -> AdapterOptions {
    AdapterOptions {
        max_attempts,
        attempt_delay: Duration::ZERO,
        dump_dir,
    }
}

fn amazon(server: &MockServer, max_attempts: u32, dump_dir: Option<PathBuf>) -> AmazonAdapter {
    let base_url = Url::parse(&format!("{}/s", server.uri())).unwrap();
    AmazonAdapter::new(
        build_http_client(None).unwrap(),
        base_url,
        options(max_attempts, dump_dir),
    )
}

fn overdrive(server: &MockServer, max_attempts: u32) -> OverdriveAdapter {
    let base_url = Url::parse(&format!("{}/search", server.uri())).unwrap();
    OverdriveAdapter::new(
        build_http_client(None).unwrap(),
        base_url,
        options(max_attempts, None),
    )
}

fn amazon_result(name: &str) -> String {
    format!(
        r#"<html><body>
        <div class="sg-col sg-col-4-of-12 sg-col-8-of-16 sg-col-12-of-20 s-list-col-right">
          <a class="a-link-normal s-link-style a-text-normal" href="/Dune/dp/0441013597">
            <span class="a-size-medium a-color-base a-text-normal">{}</span>
          </a>
          <span class="a-icon-alt">4.7 out of 5 stars</span>
          <a class="a-link-normal s-link-style" href="/r"><span class="a-size-base">1,024</span></a>
          <div class="a-row a-spacing-mini">
            <a class="a-size-base a-link-normal s-link-style a-text-bold" href="/a">Audible Audiobook</a>
            <span class="a-price"><span class="a-offscreen">$0.00</span></span>
          </div>
        </div>
        </body></html>"#,
        name
    )
}

fn catalogue_page(title: &str) -> String {
    format!(
        r#"<html><body><section id="search"><div id="main"><ul>
        <li class="js-titleCard Item">
          <h3 class="title-name" title="{}">{}</h3>
          <i class="icon-audiobook"></i>
          <button class="TitleActionButton u-allCaps secondary-color is-borrow js-borrow secondary">Borrow</button>
        </li>
        </ul></div></section></body></html>"#,
        title, title
    )
}

#[tokio::test]
async fn test_amazon_extracts_first_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "Dune Frank Herbert"))
        .and(query_param("i", "stripbooks"))
        .respond_with(ResponseTemplate::new(200).set_body_string(amazon_result("Dune")))
        .expect(1)
        .mount(&server)
        .await;

    let record = amazon(&server, 3, None)
        .fetch("Dune", "Frank Herbert")
        .await
        .unwrap();

    assert_eq!(record.get("name"), Some("Dune"));
    assert_eq!(record.get("users_rated"), Some("1024"));
    assert_eq!(record.get("audible_price"), Some("0.00"));
    assert_eq!(record.get("kindle_price"), Some(""));
    assert_eq!(
        record.get("link"),
        Some(format!("{}/Dune/dp/0441013597", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_amazon_robot_page_is_fatal_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(503).set_body_string(
            "<html><body>Sorry, we just need to make sure you're not a robot.</body></html>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = amazon(&server, 5, None).fetch("Dune", "").await;
    assert!(matches!(result, Err(FetchError::Fatal { .. })));
}

#[tokio::test]
async fn test_amazon_missing_block_retries_then_dumps() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let dump_dir = dir.path().join("amazon_errors");

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Empty</body></html>"))
        .expect(3)
        .mount(&server)
        .await;

    let result = amazon(&server, 3, Some(dump_dir.clone()))
        .fetch("Dune", "")
        .await;

    assert!(matches!(result, Err(FetchError::NotFound { .. })));
    let dumped: Vec<_> = std::fs::read_dir(&dump_dir).unwrap().collect();
    assert_eq!(dumped.len(), 1);
}

#[tokio::test]
async fn test_amazon_server_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(2)
        .mount(&server)
        .await;

    let result = amazon(&server, 2, None).fetch("Dune", "").await;
    assert!(matches!(result, Err(FetchError::Transient { .. })));
}

#[tokio::test]
async fn test_overdrive_reports_availability() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "Emma Jane Austen"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalogue_page("Emma")))
        .mount(&server)
        .await;

    let record = overdrive(&server, 2)
        .fetch("Emma", "Jane Austen")
        .await
        .unwrap();

    assert_eq!(record.get("title"), Some("Emma"));
    assert_eq!(record.get("audiobook"), Some("true"));
    assert_eq!(record.get("ebook"), Some("false"));
    assert_eq!(record.get("available"), Some("true"));
    assert!(record.get("link").unwrap().starts_with(&server.uri()));
}

#[tokio::test]
async fn test_overdrive_no_matches_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body>We couldn't find any matches for \"Zzyzx\"</body></html>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let result = overdrive(&server, 2).fetch("Zzyzx", "").await;
    assert!(matches!(result, Err(FetchError::NotFound { .. })));
}

#[tokio::test]
async fn test_overdrive_expired_session_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Your session has expired.</body></html>"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let result = overdrive(&server, 2).fetch("Emma", "").await;
    assert!(matches!(result, Err(FetchError::Fatal { .. })));
}

#[tokio::test]
async fn test_engine_with_amazon_persists_and_aborts_on_robot_page() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("amazon_cache.tsv");

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "Dune Frank Herbert"))
        .respond_with(ResponseTemplate::new(200).set_body_string(amazon_result("Dune")))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "Emma Jane Austen"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "To discuss automated access to Amazon data please contact api-services-support@amazon.com.",
        ))
        .mount(&server)
        .await;

    let adapter = amazon(&server, 1, None);
    let mut cache = TsvCache::load(&cache_path, adapter.schema().clone()).unwrap();
    let engine = ResolveEngine::new(Box::new(adapter), RateLimiter::immediate(), 20);

    let mut batch = Batch::new();
    batch.insert(1u64, WorkItem::new("Dune", vec!["Frank Herbert".to_string()]));
    batch.insert(2u64, WorkItem::new("Emma", vec!["Jane Austen".to_string()]));
    batch.insert(3u64, WorkItem::new("Persuasion", vec!["Jane Austen".to_string()]));

    let result = engine.resolve(&batch, &mut cache).await;
    let Err(ResolveError::Fatal { report, .. }) = result else {
        panic!("expected the robot page to abort the run");
    };

    assert_eq!(report.termination, Termination::Aborted);
    assert_eq!(report.outcomes[0].disposition, Disposition::Fetched);
    assert_eq!(report.outcomes[2].disposition, Disposition::NotAttempted);

    let reloaded = TsvCache::load(&cache_path, cache.schema().clone()).unwrap();
    let record = reloaded.get("Dune").unwrap();
    assert_eq!(record.get("index"), Some("1"));
    assert_eq!(record.get("name"), Some("Dune"));
    assert_eq!(record.get("users_rated"), Some("1024"));
}
