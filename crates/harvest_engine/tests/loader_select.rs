use std::time::{Duration, Instant};

use harvest_core::RoutingDecision;
use harvest_engine::{
    DocumentBody, FailureKind, FetchOutcome, LoaderKind, LoaderSelect, LoaderSettings,
    RenderSettings,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quick_settings() -> LoaderSettings {
    LoaderSettings {
        request_delay: Duration::ZERO,
        ..LoaderSettings::default()
    }
}

#[tokio::test]
async fn skip_urls_never_touch_the_network() {
    let server = MockServer::start().await;
    let mut loader = LoaderSelect::new(quick_settings());
    let url = format!("{}/anything", server.uri());

    let result = loader.fetch(&url, RoutingDecision::Skip, false).await;

    assert_eq!(result.loader, LoaderKind::Skip);
    assert_eq!(result.failure().unwrap().kind, FailureKind::Skipped);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn skip_stays_skipped_in_the_retry_pass() {
    let server = MockServer::start().await;
    let mut loader = LoaderSelect::new(quick_settings());
    let url = format!("{}/anything", server.uri());

    let result = loader.fetch(&url, RoutingDecision::Skip, true).await;

    assert_eq!(result.failure().unwrap().kind, FailureKind::Skipped);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn skipped_urls_pay_no_rate_limit_delay() {
    let settings = LoaderSettings {
        request_delay: Duration::from_millis(300),
        ..LoaderSettings::default()
    };
    let mut loader = LoaderSelect::new(settings);

    let started = Instant::now();
    for _ in 0..3 {
        let result = loader
            .fetch("https://skipped.example/x", RoutingDecision::Skip, false)
            .await;
        assert!(!result.is_success());
    }
    assert!(
        started.elapsed() < Duration::from_millis(200),
        "skip handling must not sleep"
    );
}

#[tokio::test]
async fn consecutive_fetches_honor_the_request_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hello there</p>", "text/html"))
        .mount(&server)
        .await;

    let settings = LoaderSettings {
        request_delay: Duration::from_millis(150),
        ..LoaderSettings::default()
    };
    let mut loader = LoaderSelect::new(settings);
    let url = format!("{}/page", server.uri());

    let started = Instant::now();
    loader.fetch(&url, RoutingDecision::Default, false).await;
    loader.fetch(&url, RoutingDecision::Default, false).await;
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn csv_extension_is_parsed_row_wise() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data.csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("name,role\nAda,engineer\n", "text/csv"),
        )
        .mount(&server)
        .await;

    let mut loader = LoaderSelect::new(quick_settings());
    let url = format!("{}/data.csv", server.uri());

    let result = loader.fetch(&url, RoutingDecision::Default, false).await;

    assert_eq!(result.loader, LoaderKind::CsvRows);
    let FetchOutcome::Fetched(documents) = &result.outcome else {
        panic!("expected documents, got {:?}", result.outcome);
    };
    assert_eq!(
        documents[0].body,
        DocumentBody::PlainText("name: Ada; role: engineer".to_string())
    );
}

#[tokio::test]
async fn csv_content_type_is_parsed_row_wise() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/export"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("a,b\n1,2\n", "text/csv"))
        .mount(&server)
        .await;

    let mut loader = LoaderSelect::new(quick_settings());
    let url = format!("{}/export", server.uri());

    let result = loader.fetch(&url, RoutingDecision::Default, false).await;

    let FetchOutcome::Fetched(documents) = &result.outcome else {
        panic!("expected documents, got {:?}", result.outcome);
    };
    assert_eq!(
        documents[0].body,
        DocumentBody::PlainText("a: 1; b: 2".to_string())
    );
}

#[tokio::test]
async fn force_render_goes_through_the_render_endpoint() {
    let content = MockServer::start().await;
    let render = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("Rendered page text.", "text/plain"),
        )
        .mount(&render)
        .await;

    let settings = LoaderSettings {
        request_delay: Duration::ZERO,
        render: RenderSettings {
            endpoint: render.uri(),
            ..RenderSettings::default()
        },
        ..LoaderSettings::default()
    };
    let mut loader = LoaderSelect::new(settings);
    let url = format!("{}/app", content.uri());

    let result = loader.fetch(&url, RoutingDecision::ForceRender, false).await;

    assert_eq!(result.loader, LoaderKind::Render);
    assert!(result.is_success());
    assert!(content.received_requests().await.unwrap().is_empty());
    let rendered = render.received_requests().await.unwrap();
    assert_eq!(rendered.len(), 1);
    assert!(rendered[0].url.path().contains("/app"));
}

#[tokio::test]
async fn retry_pass_forces_the_render_loader() {
    let content = MockServer::start().await;
    let render = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("Rendered on retry.", "text/plain"),
        )
        .mount(&render)
        .await;

    let settings = LoaderSettings {
        request_delay: Duration::ZERO,
        render: RenderSettings {
            endpoint: render.uri(),
            ..RenderSettings::default()
        },
        ..LoaderSettings::default()
    };
    let mut loader = LoaderSelect::new(settings);
    let url = format!("{}/js-only", content.uri());

    // Default classification, but the retry pass overrides it.
    let result = loader.fetch(&url, RoutingDecision::Default, true).await;

    assert_eq!(result.loader, LoaderKind::Render);
    assert!(result.is_success());
    assert!(content.received_requests().await.unwrap().is_empty());
    assert_eq!(render.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn blank_bodies_fail_as_empty_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("   \n  ", "text/html"))
        .mount(&server)
        .await;

    let mut loader = LoaderSelect::new(quick_settings());
    let url = format!("{}/blank", server.uri());

    let result = loader.fetch(&url, RoutingDecision::Default, false).await;
    assert_eq!(result.failure().unwrap().kind, FailureKind::EmptyContent);
}
