//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full fetch, extract and follow cycle end-to-end.

use reqwest::Client;
use scrapesmart::config::Config;
use scrapesmart::crawler::{
    run_crawl, CrawlJob, Crawler, HtmlExtractor, HttpFetcher, PageFetcher,
};
use scrapesmart::events::{CrawlEvent, EventSink};
use scrapesmart::output::download_images;
use scrapesmart::{FetchError, ScrapeError};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(format!("<html><body>{}</body></html>", body))
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::with_client(Client::new(), Duration::ZERO)
}

fn crawler() -> Crawler {
    Crawler::new(
        Box::new(fetcher()),
        Box::new(HtmlExtractor::new()),
        vec!["cloudflare".to_string()],
    )
}

fn job(start_url: &str, max_pages: usize) -> CrawlJob {
    CrawlJob {
        start_url: start_url.to_string(),
        max_pages,
        follow_links: true,
        extract_images: true,
        max_images: 10,
    }
}

#[tokio::test]
async fn test_fetch_returns_markup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<h1>Catalogue</h1>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let markup = fetcher()
        .fetch(&format!("{}/", mock_server.uri()))
        .await
        .unwrap();

    assert!(markup.contains("<h1>Catalogue</h1>"));
}

#[tokio::test]
async fn test_fetch_server_error_is_recoverable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = fetcher()
        .fetch(&format!("{}/broken", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert!(!err.is_abort());
}

#[tokio::test]
async fn test_fetch_challenge_page_aborts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><head><title>Just a moment...</title></head></html>"),
        )
        .mount(&mock_server)
        .await;

    let err = fetcher()
        .fetch(&format!("{}/", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::ChallengeDetected { .. }));
    assert!(err.is_abort());
}

#[tokio::test]
async fn test_full_crawl_follows_links_in_order() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<h1>Home</h1>
               <a href="/a">First</a>
               <a href="/b">Second</a>
               <img src="/logo.png">"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<p>Page A</p><a href="/c">Third</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("<p>Page B</p>"))
        .mount(&mock_server)
        .await;

    // Beyond the page budget; must never be fetched
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html("<p>Page C</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let start = format!("{}/", base);
    let outcome = crawler().crawl(&job(&start, 3), &EventSink::none()).await;

    assert_eq!(
        outcome.fetch_order(),
        vec![start.clone(), format!("{}/a", base), format!("{}/b", base)]
    );
    assert!(outcome.corpus.as_str().starts_with("Home"));
    assert!(outcome.corpus.as_str().contains("Page A"));
    assert!(outcome.corpus.as_str().contains("Page B"));
    assert!(!outcome.corpus.as_str().contains("Page C"));

    // Images come from the last fetched page, which has none
    assert!(outcome.image_urls.is_empty());
    assert_eq!(outcome.remaining_frontier, vec![format!("{}/c", base)]);
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn test_crawl_skips_failed_page() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>Index</p><a href="/gone">Gone</a><a href="/ok">Ok</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<p>Still here</p>"))
        .mount(&mock_server)
        .await;

    let (events, mut rx) = EventSink::channel();
    let outcome = crawler()
        .crawl(&job(&format!("{}/", base), 5), &events)
        .await;
    drop(events);

    assert_eq!(outcome.pages_fetched(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].url, format!("{}/gone", base));
    assert!(outcome.corpus.as_str().contains("Still here"));

    let mut failed = Vec::new();
    while let Some(event) = rx.recv().await {
        if let CrawlEvent::PageFailed { url, .. } = event {
            failed.push(url);
        }
    }
    assert_eq!(failed, vec![format!("{}/gone", base)]);
}

#[tokio::test]
async fn test_crawl_stops_on_challenge_page() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>Landing</p><a href="/guarded">Guarded</a><a href="/next">Next</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/guarded"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<script src="/cdn-cgi/challenge-platform/h/b"></script>"#),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html("<p>Next</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let outcome = crawler()
        .crawl(&job(&format!("{}/", base), 5), &EventSink::none())
        .await;

    assert_eq!(outcome.pages_fetched(), 1);
    assert!(outcome.corpus.as_str().starts_with("Landing"));
    assert!(outcome.remaining_frontier.contains(&format!("{}/next", base)));
    assert_eq!(outcome.aborted_at, Some(format!("{}/guarded", base)));
}

#[tokio::test]
async fn test_crawl_collects_images_of_last_page() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/gallery"))
        .respond_with(html(
            r#"<img src="/a.png"><img src="https://cdn.example.com/b.jpg"><img src="//cdn.example.com/c.svg">"#,
        ))
        .mount(&mock_server)
        .await;

    let mut job = job(&format!("{}/gallery", base), 1);
    job.max_images = 2;
    let outcome = crawler().crawl(&job, &EventSink::none()).await;

    assert_eq!(
        outcome.image_urls,
        vec![
            format!("{}/a.png", base),
            "https://cdn.example.com/b.jpg".to_string()
        ]
    );
}

#[tokio::test]
async fn test_run_crawl_from_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>Configured</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.fetcher.settle_delay_ms = 0;

    let outcome = run_crawl(&format!("{}/", mock_server.uri()), &config)
        .await
        .unwrap();

    assert_eq!(outcome.corpus.as_str(), "Configured");
}

#[tokio::test]
async fn test_run_crawl_rejects_invalid_start_url() {
    let result = run_crawl("ftp://example.com/", &Config::default()).await;
    assert!(matches!(result, Err(ScrapeError::InvalidStartUrl(_))));
}

#[tokio::test]
async fn test_download_images_numbers_by_position() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<svg/>".to_vec()))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let urls = vec![
        format!("{}/missing.jpg", base),
        format!("{}/logo.svg", base),
    ];

    let report = download_images(&Client::new(), &urls, dir.path(), 10)
        .await
        .unwrap();

    assert_eq!(report.saved, vec![dir.path().join("image2.svg")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, urls[0]);
    assert!(!dir.path().join("image1.jpg").exists());
    assert_eq!(
        std::fs::read(dir.path().join("image2.svg")).unwrap(),
        b"<svg/>"
    );
}
