use std::time::Duration;

use harvest_engine::{crawl, DocumentBody, FetchSettings, RateLimiter, StaticFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Synthetic 3-hop graph: `/` -> `/a`, `/b`; `/a` -> `/c` (and back to `/`);
/// `/c` -> `/d`. A depth-2 crawl must visit `/`, `/a`, `/b`, `/c` exactly
/// once each and never touch `/d`.
#[tokio::test]
async fn depth_two_crawl_visits_reachable_pages_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page(
            r#"<p>Root page with words.</p><a href="/a">a</a> <a href="/b">b</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(page(
            r#"<p>Page a with words.</p><a href="/c">c</a> <a href="/">home</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(page("<p>Page b with words.</p>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(page(r#"<p>Page c with words.</p><a href="/d">d</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(page("<p>Page d must stay unvisited.</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = StaticFetcher::new(FetchSettings::default());
    let mut limiter = RateLimiter::new(Duration::ZERO);
    let seed = format!("{}/", server.uri());

    let documents = crawl(&seed, 2, &fetcher, &mut limiter, 100)
        .await
        .expect("crawl ok");

    let mut sources: Vec<String> = documents.iter().map(|d| d.source_url.clone()).collect();
    sources.sort();
    let mut expected: Vec<String> = ["/", "/a", "/b", "/c"]
        .iter()
        .map(|p| format!("{}{}", server.uri(), p))
        .collect();
    expected.sort();
    assert_eq!(sources, expected);
    assert!(documents
        .iter()
        .all(|d| matches!(d.body, DocumentBody::Html(_))));

    server.verify().await;
}

#[tokio::test]
async fn depth_zero_crawl_fetches_only_the_seed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page(r#"<p>Seed only.</p><a href="/a">a</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(page("<p>Never fetched.</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = StaticFetcher::new(FetchSettings::default());
    let mut limiter = RateLimiter::new(Duration::ZERO);
    let seed = format!("{}/", server.uri());

    let documents = crawl(&seed, 0, &fetcher, &mut limiter, 100)
        .await
        .expect("crawl ok");
    assert_eq!(documents.len(), 1);

    server.verify().await;
}

#[tokio::test]
async fn failing_seed_fails_the_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = StaticFetcher::new(FetchSettings::default());
    let mut limiter = RateLimiter::new(Duration::ZERO);
    let seed = format!("{}/", server.uri());

    assert!(crawl(&seed, 1, &fetcher, &mut limiter, 100).await.is_err());
}

#[tokio::test]
async fn failing_inner_page_only_costs_that_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(page(
            r#"<p>Root with words.</p><a href="/broken">x</a> <a href="/ok">y</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(page("<p>Inner page with words.</p>"))
        .mount(&server)
        .await;

    let fetcher = StaticFetcher::new(FetchSettings::default());
    let mut limiter = RateLimiter::new(Duration::ZERO);
    let seed = format!("{}/", server.uri());

    let documents = crawl(&seed, 1, &fetcher, &mut limiter, 100)
        .await
        .expect("crawl ok");
    assert_eq!(documents.len(), 2);
}
