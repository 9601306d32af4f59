//! Integration tests for the crawl engine
//!
//! These tests use wiremock to serve a small wiki and run the full
//! coordinator (overseer, workers, SQLite store) against it.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wikitrawl::config::{parse_config, Config};
use wikitrawl::crawler::{seed_store, Coordinator, HttpFetcher, PageFetcher};
use wikitrawl::storage::{open_store, ContentStore, FrontierStore, LinkFilter};
use wikitrawl::CrawlError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a configuration crawling `base_url` with a database in `dir`
fn create_test_config(base_url: &str, dir: &TempDir, max_attempts: u32) -> Config {
    let db_path = dir.path().join("crawl.db");
    let toml = format!(
        r#"
[crawl]
seed-url = "{base_url}/wiki/Example"
workers = 2
max-attempts = {max_attempts}

[rate-limits]
per-second = 50
per-minute = 1000
per-hour = 10000

[buffers]
frontier-ceiling = 100
content-ceiling = 2
refill-batch = 10

[schedule]
overseer-frequency = 10.0
worker-frequency = 20.0
metrics-every = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
database-path = "{}"
"#,
        db_path.display()
    );

    parse_config(&toml, |_| None).expect("test config is valid")
}

fn article(heading: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a> "#, href, href))
        .collect();

    format!(
        r#"<html><head><title>{heading} - Test Wiki</title></head><body>
<h1 class="firstHeading"><span class="mw-page-title-main">{heading}</span></h1>
<div class="mw-content-ltr mw-parser-output">
<p>{heading} links to {anchors}</p>
<div class="mw-heading mw-heading2"><h2>Details</h2></div>
<p>More about {heading}.</p>
</div>
</body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_of_small_wiki() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 5);

    mount_page(
        &server,
        "/wiki/Example",
        article(
            "Example",
            &["/wiki/Alpha", "/wiki/Beta", "/wiki/Gamma", "/wiki/Alpha#History"],
        ),
    )
    .await;
    for name in ["Alpha", "Beta", "Gamma"] {
        mount_page(&server, &format!("/wiki/{}", name), article(name, &[])).await;
    }

    let store = open_store(Path::new(&config.output.database_path)).unwrap();
    assert!(seed_store(&store, &config.crawl.seed_url).unwrap());

    let coordinator = Coordinator::new(&config).unwrap();
    let report = coordinator
        .run_until(tokio::time::sleep(Duration::from_secs(3)))
        .await
        .unwrap();

    assert_eq!(report.links_flushed, 4);
    assert!(coordinator.context().frontier.is_empty());
    assert!(coordinator.context().content.is_empty());

    assert_eq!(store.count_pages().unwrap(), 4);
    assert_eq!(store.count_links(&LinkFilter::All).unwrap(), 4);
    assert_eq!(store.count_links(&LinkFilter::Completed).unwrap(), 4);

    let children = store
        .query_links(&LinkFilter::Url(format!("{}/wiki/Alpha", server.uri())), None)
        .unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(
        children[0].parent_url.as_deref(),
        Some(config.crawl.seed_url.as_str())
    );
    assert!(children[0].parent_priority > 0);
}

#[tokio::test]
async fn test_missing_page_is_quarantined() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 2);

    mount_page(
        &server,
        "/wiki/Example",
        article("Example", &["/wiki/Missing"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = open_store(Path::new(&config.output.database_path)).unwrap();
    seed_store(&store, &config.crawl.seed_url).unwrap();

    Coordinator::new(&config)
        .unwrap()
        .run_until(tokio::time::sleep(Duration::from_secs(3)))
        .await
        .unwrap();

    let quarantined = store
        .query_links(&LinkFilter::Quarantined { max_attempts: 2 }, None)
        .unwrap();
    assert_eq!(quarantined.len(), 1);
    assert_eq!(quarantined[0].url, format!("{}/wiki/Missing", server.uri()));
    assert_eq!(quarantined[0].attempts, 2);

    // The quarantined row is never handed back to the frontier
    assert!(store.take_pending(10, Some(2)).unwrap().is_empty());
    assert_eq!(store.count_pages().unwrap(), 1);
}

#[tokio::test]
async fn test_shutdown_without_seed_is_clean() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 5);

    let coordinator = Coordinator::new(&config).unwrap();
    let report = coordinator
        .run_until(tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();

    assert_eq!(report.links_flushed, 0);
    assert_eq!(report.pages_flushed, 0);
}

#[tokio::test]
async fn test_http_fetcher_status_handling() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), &dir, 5);

    mount_page(&server, "/wiki/Ok", article("Ok", &[])).await;
    Mock::given(method("GET"))
        .and(path("/wiki/Broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(HttpFetcher::from_config(&config.user_agent).unwrap());

    let body = fetcher
        .fetch(&format!("{}/wiki/Ok", server.uri()))
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("mw-page-title-main"));

    let err = fetcher
        .fetch(&format!("{}/wiki/Broken", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::Status { status: 500, .. }));
    assert!(err.is_fetch_error());

    let err = fetcher
        .fetch(&format!("{}/wiki/Unmounted", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, CrawlError::Status { status: 404, .. }));
}
