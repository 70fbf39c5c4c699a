//! End-to-end checks against a mocked registry

mod helper;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};

use cciu::check::CheckOptions;
use cciu::registry::DockerRegistry;
use cciu::version::Verdict;

use helper::{Event, RecordingReporter, create_checker, references};

fn registry(server: &Server, timeout: Option<Duration>) -> Arc<DockerRegistry> {
    Arc::new(
        DockerRegistry::new(timeout, None)
            .unwrap()
            .with_endpoint(&server.url()),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn checks_references_against_registry_tags() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/library/alpine/tags/list")
        .match_query(Matcher::UrlEncoded("n".into(), "1000".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name": "library/alpine", "tags": ["3.11", "3.12", "3.13", "latest"]}"#)
        .expect(1)
        .create_async()
        .await;

    let checker = create_checker(registry(&server, None), CheckOptions::default());
    let mut reporter = RecordingReporter::default();

    let stats = checker
        .run(&references(&["alpine:3.12", "alpine:3.13"]), &mut reporter)
        .await;

    mock.assert_async().await;
    assert_eq!(stats.fetch.fetched, 1);
    assert_eq!(stats.checked, 2);
    assert_eq!(
        reporter.events,
        vec![
            Event::Reference("alpine:3.12".to_string(), None),
            Event::Tag("alpine:3.13".to_string(), Verdict::Ahead),
            Event::Tag("alpine:3.12".to_string(), Verdict::Equal),
            Event::Tag("alpine:3.11".to_string(), Verdict::Outdated),
            Event::Reference("alpine:3.13".to_string(), None),
            Event::Tag("alpine:3.13".to_string(), Verdict::Equal),
            Event::Tag("alpine:3.12".to_string(), Verdict::Outdated),
            Event::Tag("alpine:3.11".to_string(), Verdict::Outdated),
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_repository_is_reported_per_reference() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/org/gone/tags/list")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let checker = create_checker(registry(&server, None), CheckOptions::default());
    let mut reporter = RecordingReporter::default();

    let stats = checker
        .run(&references(&["quay.io/org/gone:1.0"]), &mut reporter)
        .await;

    assert_eq!(stats.fetch_failed, 1);
    assert!(stats.reconciles());
    assert_eq!(reporter.errors().len(), 1);
    assert_eq!(reporter.errors()[0].0, "quay.io/org/gone:1.0");
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_registry_times_out() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/v2/library/alpine/tags/list")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(500));
            w.write_all(br#"{"tags": ["3.13"]}"#)
        })
        .create_async()
        .await;

    let checker = create_checker(
        registry(&server, Some(Duration::from_millis(100))),
        CheckOptions::default(),
    );
    let mut reporter = RecordingReporter::default();

    let stats = checker.run(&references(&["alpine:3.12"]), &mut reporter).await;

    assert_eq!(stats.fetch_failed, 1);
    assert!(reporter.errors()[0].1.contains("Timed out"));
}
