use testrun_metrics::application::{PrometheusReporter, RunStatus};
use testrun_metrics::config::{LabelSet, ReporterArgs, RunConfiguration};
use testrun_metrics::domain::errors::{RegistryError, ReporterError};
use testrun_metrics::domain::outcome::{Outcome, OutcomeEvent, Phase};
use testrun_metrics::infrastructure::event_source::{InputFormat, parse_line};
use testrun_metrics::infrastructure::mock::MockPusher;

fn ci_config() -> RunConfiguration {
    RunConfiguration::new(
        "ci_",
        "localhost:9091",
        "ci_job",
        LabelSet::parse(["env=prod", "region=us"]).unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn test_pass_fail_and_setup_error_scenario() {
    let pusher = MockPusher::new();
    let mut reporter = PrometheusReporter::configure(Some(ci_config()), pusher.clone());

    let events = [
        OutcomeEvent::new("test_a", "tests/a.rs::test_a", Outcome::Passed, Phase::Call),
        OutcomeEvent::new("test_b", "tests/b.rs::test_b", Outcome::Failed, Phase::Call),
        OutcomeEvent::new("test_b", "tests/b.rs::test_b", Outcome::Failed, Phase::Setup),
    ];
    for event in &events {
        reporter.on_test_report(event).unwrap();
    }

    let counters = *reporter.counters().unwrap();
    assert_eq!(counters.passed, 1);
    assert_eq!(counters.failed, 1);
    assert_eq!(counters.skipped, 0);

    let summary = reporter.on_session_finish().await.unwrap().unwrap();
    assert_eq!(summary.series_pushed, 5);
    assert_eq!(reporter.status(), RunStatus::Flushed);

    let pushes = pusher.pushes();
    assert_eq!(pushes.len(), 1, "exactly one push per run");

    let push = &pushes[0];
    assert_eq!(push.job, "ci_job");
    let expected = [
        ("ci_failed", 1.0),
        ("ci_passed", 1.0),
        ("ci_skipped", 0.0),
        ("ci_test_a", 1.0),
        ("ci_test_b", 0.0),
    ];
    assert_eq!(push.series.len(), expected.len());
    for (name, value) in expected {
        assert_eq!(push.series.get(name), Some(&value), "{name}");
    }

    // Every series carries the same label set
    for name in push.series.keys() {
        assert!(
            push.body.contains(&format!("{name}{{env=\"prod\",region=\"us\"}}")),
            "{name} is missing labels"
        );
    }
    assert!(push.body.contains("# HELP ci_test_b tests/b.rs::test_b"));
}

#[tokio::test]
async fn test_inactive_reporting_processes_nothing() {
    let args = ReporterArgs {
        pushgateway_url: Some("localhost:9091".to_string()),
        metric_prefix: Some(String::new()),
        ..ReporterArgs::default()
    };
    let config = RunConfiguration::from_args(&args).unwrap();
    assert!(config.is_none());

    let pusher = MockPusher::new();
    let mut reporter = PrometheusReporter::configure(config, pusher.clone());
    for i in 0..1000 {
        reporter
            .on_test_report(&OutcomeEvent::call(format!("test_{i}"), Outcome::Failed))
            .unwrap();
    }

    assert!(reporter.on_session_finish().await.unwrap().is_none());
    assert!(!reporter.is_active());
    assert!(reporter.registry().is_none());
    assert_eq!(pusher.push_count(), 0);
}

#[tokio::test]
async fn test_rerun_within_run_is_a_hard_failure() {
    let pusher = MockPusher::new();
    let mut reporter = PrometheusReporter::configure(Some(ci_config()), pusher.clone());

    reporter
        .on_test_report(&OutcomeEvent::call("test_flaky", Outcome::Failed))
        .unwrap();
    let rerun = reporter.on_test_report(&OutcomeEvent::call("test_flaky", Outcome::Passed));

    assert_eq!(
        rerun.unwrap_err(),
        ReporterError::Registry(RegistryError::DuplicateMetric {
            name: "ci_test_flaky".to_string()
        })
    );
    assert_eq!(
        reporter.registry().and_then(|r| r.value("ci_test_flaky")),
        Some(0.0)
    );

    reporter.unconfigure();
    assert_eq!(pusher.push_count(), 0);
}

#[tokio::test]
async fn test_libtest_stream_drives_reporter() {
    let stream = [
        r#"{ "type": "suite", "event": "started", "test_count": 3 }"#,
        r#"{ "type": "test", "event": "started", "name": "auth::login" }"#,
        r#"{ "type": "test", "name": "auth::login", "event": "ok" }"#,
        r#"{ "type": "test", "event": "started", "name": "auth::logout" }"#,
        r#"{ "type": "test", "name": "auth::logout", "event": "failed", "stdout": "assertion failed" }"#,
        r#"{ "type": "test", "name": "auth::slow", "event": "ignored" }"#,
        r#"{ "type": "suite", "event": "failed", "passed": 1, "failed": 1, "ignored": 1, "measured": 0, "filtered_out": 0 }"#,
    ];

    let pusher = MockPusher::new();
    let mut reporter = PrometheusReporter::configure(Some(ci_config()), pusher.clone());
    for line in stream {
        if let Some(event) = parse_line(InputFormat::Libtest, line).unwrap() {
            reporter.on_test_report(&event).unwrap();
        }
    }
    let summary = reporter.on_session_finish().await.unwrap().unwrap();

    assert_eq!(summary.counters.passed, 1);
    assert_eq!(summary.counters.failed, 1);
    assert_eq!(summary.counters.skipped, 1);

    let push = &pusher.pushes()[0];
    assert_eq!(push.series["ci_auth::login"], 1.0);
    assert_eq!(push.series["ci_auth::logout"], 0.0);
    assert_eq!(push.series["ci_auth::slow"], 0.0);
    assert_eq!(push.series["ci_skipped"], 1.0);
}
