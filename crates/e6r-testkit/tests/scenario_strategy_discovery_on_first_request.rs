mod common;

use e6r_schemas::DeploymentTag;

#[tokio::test]
async fn first_request_probes_blue_then_green_and_caches_the_winner() {
    // GIVEN a fresh process (no tag discovered) against a green-only engine
    let rig = common::rig(&[DeploymentTag::Green]);

    // WHEN the first prepare goes out
    let handle = rig.invoker.prepare("select 1", None).await.expect("prepare");

    // THEN discovery probed blue, was rejected, retried green, and the
    // prepare itself was sent under green
    let auths = rig.engine.calls_for("authenticate");
    assert_eq!(auths.len(), 2);
    assert_eq!(auths[0].strategy.as_deref(), Some("blue"));
    assert_eq!(auths[1].strategy.as_deref(), Some("green"));

    let prepares = rig.engine.calls_for("prepare");
    assert_eq!(prepares.len(), 1);
    assert_eq!(prepares[0].strategy.as_deref(), Some("green"));
    assert_eq!(prepares[0].session_id, "s1");

    // AND the winner is cached for everything that follows
    assert_eq!(rig.coordinator.active(), Some(DeploymentTag::Green));
    assert_eq!(handle.tag, Some(DeploymentTag::Green));

    rig.invoker.status(&handle).await.expect("status");
    let statuses = rig.engine.calls_for("status");
    assert_eq!(statuses[0].strategy.as_deref(), Some("green"));
    // No further authentication was needed, and discovery reused one
    // channel for both probes.
    assert_eq!(rig.engine.auth_count(), 1);
    assert_eq!(rig.dial.dial_count(), 1);
}

#[tokio::test]
async fn discovery_rejected_on_both_tags_surfaces_the_original_error() {
    // GIVEN an engine that serves neither tag (mid-redeploy pathological case)
    let rig = common::rig(&[]);

    // WHEN the first prepare attempts discovery
    let err = rig.invoker.prepare("select 1", None).await.unwrap_err();

    // THEN both probes ran and the wrong-tag rejection surfaced unchanged
    // (no endless blue/green cycling)
    let auths = rig.engine.calls_for("authenticate");
    assert_eq!(auths.len(), 2);
    let msg = err.to_string();
    assert!(msg.contains("deployment tag"), "unexpected error: {msg}");
    assert_eq!(rig.coordinator.active(), None);
}
