mod common;

use e6r_schemas::DeploymentTag;

#[tokio::test]
async fn hint_becomes_pending_and_is_adopted_at_clear() {
    // GIVEN an established green session
    let rig = common::rig(&[DeploymentTag::Green]);
    let q1 = rig.invoker.prepare("select 1", None).await.expect("prepare q1");
    assert_eq!(q1.tag, Some(DeploymentTag::Green));

    // WHEN the handover window opens (both deployments serve) and an
    // execute response carries the hint "blue"
    rig.engine.set_serving(&[DeploymentTag::Green, DeploymentTag::Blue]);
    rig.engine.push_hint("blue");
    rig.invoker.execute(&q1).await.expect("execute q1");

    // THEN the hint is deferred: pending=blue, active still green
    assert_eq!(rig.coordinator.active(), Some(DeploymentTag::Green));
    assert_eq!(rig.coordinator.pending(), Some(DeploymentTag::Blue));

    // AND the in-flight query keeps its registered tag on follow-ups
    rig.invoker.next_batch(&q1).await.expect("fetch q1");
    let fetches = rig.engine.calls_for("get-next-result-batch");
    assert_eq!(fetches[0].strategy.as_deref(), Some("green"));

    // AND a brand-new query adopts the announced tag immediately
    let q2 = rig.invoker.prepare("select 2", None).await.expect("prepare q2");
    assert_eq!(q2.tag, Some(DeploymentTag::Blue));

    // WHEN q1 terminates (the safe point)
    rig.invoker.clear(&q1).await.expect("clear q1");

    // THEN pending was promoted
    assert_eq!(rig.coordinator.active(), Some(DeploymentTag::Blue));
    assert_eq!(rig.coordinator.pending(), None);

    // AND q2 continues under blue
    rig.invoker.status(&q2).await.expect("status q2");
    let statuses = rig.engine.calls_for("status");
    assert_eq!(statuses[0].strategy.as_deref(), Some("blue"));
}

#[tokio::test]
async fn clear_forgets_the_query_registration() {
    let rig = common::rig(&[DeploymentTag::Green]);
    let q = rig.invoker.prepare("select 1", None).await.expect("prepare");
    assert_eq!(rig.coordinator.tracked_queries(), 1);

    rig.invoker.clear(&q).await.expect("clear");
    assert_eq!(rig.coordinator.tracked_queries(), 0);
}

#[tokio::test]
async fn cancel_is_also_a_safe_point() {
    let rig = common::rig(&[DeploymentTag::Green]);
    let q = rig.invoker.prepare("select 1", None).await.expect("prepare");

    rig.engine.set_serving(&[DeploymentTag::Green, DeploymentTag::Blue]);
    rig.engine.push_hint("blue");
    rig.invoker.execute(&q).await.expect("execute");
    assert_eq!(rig.coordinator.pending(), Some(DeploymentTag::Blue));

    rig.invoker.cancel(&q).await.expect("cancel");
    assert_eq!(rig.coordinator.active(), Some(DeploymentTag::Blue));
    assert_eq!(rig.coordinator.pending(), None);
    assert_eq!(rig.coordinator.tracked_queries(), 0);
}
