mod common;

use std::time::Duration;

use e6r_invoker::{InvokerError, RetryPolicy};
use e6r_schemas::DeploymentTag;

#[tokio::test]
async fn recoverable_failures_stop_at_the_attempt_budget() {
    // GIVEN an engine that denies every call no matter how fresh the session
    let rig = common::rig_with_retry(
        &[DeploymentTag::Green],
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        },
    );
    rig.engine.set_always_deny(true);

    // WHEN a call runs
    let err = rig.invoker.schema_names().await.unwrap_err();

    // THEN exactly max_attempts attempts were made, each after a re-auth,
    // and the final denial surfaced
    assert_eq!(rig.engine.calls_for("schema-names").len(), 3);
    assert_eq!(rig.engine.auth_count(), 3); // initial + 2 recovery re-auths
    match err {
        InvokerError::Rpc(status) => assert!(status.message().contains("Access denied")),
        other => panic!("expected rpc error, got: {other}"),
    }
}

#[tokio::test]
async fn transport_failures_surface_without_retry() {
    // GIVEN an established session
    let rig = common::rig(&[DeploymentTag::Green]);
    rig.invoker.schema_names().await.expect("warmup");

    // WHEN the next call dies with a transport-level failure
    rig.engine
        .push_failure(tonic::Status::unavailable("connection reset by peer"));
    let err = rig.invoker.catalogs().await.unwrap_err();

    // THEN it surfaced unchanged on the first attempt
    assert_eq!(rig.engine.calls_for("get-catalogs").len(), 1);
    match err {
        InvokerError::Rpc(status) => {
            assert_eq!(status.code(), tonic::Code::Unavailable);
            assert!(status.message().contains("connection reset"));
        }
        other => panic!("expected rpc error, got: {other}"),
    }

    // AND the channel is flagged for eviction-on-return, not silently reused
    assert!(rig.session.is_broken());
    // No extra authentication was attempted.
    assert_eq!(rig.engine.auth_count(), 1);
}

#[tokio::test]
async fn genuine_query_errors_surface_unchanged() {
    let rig = common::rig(&[DeploymentTag::Green]);
    rig.invoker.schema_names().await.expect("warmup");

    rig.engine.push_failure(tonic::Status::invalid_argument(
        "Syntax error at or near 'selectt'",
    ));
    let err = rig.invoker.dry_run("selectt 1", None).await.unwrap_err();

    assert_eq!(rig.engine.calls_for("dry-run").len(), 1);
    match err {
        InvokerError::Rpc(status) => {
            assert_eq!(status.code(), tonic::Code::InvalidArgument);
            assert!(status.message().contains("Syntax error"));
        }
        other => panic!("expected rpc error, got: {other}"),
    }
    assert!(!rig.session.is_broken());
}

#[tokio::test]
async fn failed_responses_still_feed_the_hint_intake() {
    // GIVEN an established green session
    let rig = common::rig(&[DeploymentTag::Green]);
    rig.invoker.schema_names().await.expect("warmup");

    // WHEN a call fails with a status whose trailers announce the next tag
    let mut status = tonic::Status::resource_exhausted("engine draining");
    status.metadata_mut().insert(
        "new-strategy",
        "blue".parse().expect("ascii metadata value"),
    );
    rig.engine.push_failure(status);
    rig.invoker.catalogs().await.unwrap_err();

    // THEN the hint was observed even though the call failed
    assert_eq!(rig.coordinator.pending(), Some(DeploymentTag::Blue));
    assert_eq!(rig.coordinator.active(), Some(DeploymentTag::Green));
}
