mod common;

use e6r_schemas::DeploymentTag;
use e6r_session::Credentials;

#[tokio::test]
async fn expired_session_is_replaced_once_and_the_call_retried() {
    // GIVEN an established session
    let rig = common::rig(&[DeploymentTag::Green]);
    rig.invoker.schema_names().await.expect("warmup");
    assert_eq!(rig.engine.auth_count(), 1);

    // WHEN the server stops honoring the session id
    rig.engine.expire_session();

    // THEN the next call is denied once, re-authenticates, and succeeds
    let schemas = rig.invoker.schema_names().await.expect("recovered call");
    assert_eq!(schemas, vec!["default".to_string()]);

    let calls = rig.engine.calls_for("schema-names");
    assert_eq!(calls.len(), 3); // warmup + denied attempt + retry
    assert_eq!(calls[1].session_id, "s1");
    assert_eq!(calls[2].session_id, "s2");
    assert_eq!(rig.engine.auth_count(), 2);
}

#[tokio::test]
async fn concurrent_observers_converge_on_one_reauth() {
    // GIVEN an established session and its epoch
    let rig = common::rig(&[DeploymentTag::Green]);
    rig.invoker.schema_names().await.expect("warmup");
    let seen_epoch = rig.session.epoch();

    // WHEN two callers that both saw the same failure re-authenticate
    let s1 = std::sync::Arc::clone(&rig.session);
    let s2 = std::sync::Arc::clone(&rig.session);
    let (a, b) = tokio::join!(
        tokio::spawn(async move { s1.reauthenticate(seen_epoch).await }),
        tokio::spawn(async move { s2.reauthenticate(seen_epoch).await }),
    );
    let id_a = a.expect("join").expect("reauth");
    let id_b = b.expect("join").expect("reauth");

    // THEN only one authenticate ran and both proceed with the same id
    assert_eq!(rig.engine.auth_count(), 2); // initial + exactly one re-auth
    assert_eq!(id_a, id_b);
    assert_eq!(id_a, "s2");
}

#[tokio::test]
async fn rotated_credentials_are_used_by_the_next_reauth() {
    // GIVEN an established session under the original token
    let rig = common::rig(&[DeploymentTag::Green]);
    rig.invoker.schema_names().await.expect("warmup");
    assert_eq!(
        rig.engine.last_auth(),
        Some(("alice@example.com".to_string(), "t0ken".to_string()))
    );

    // WHEN credentials rotate and the old session dies
    rig.session.rotate_credentials(Credentials {
        user: "bob@example.com".to_string(),
        token: "fresh-token".to_string(),
    });
    rig.engine.expire_session();

    // THEN recovery authenticates with the rotated credentials
    rig.invoker.schema_names().await.expect("recovered call");
    assert_eq!(
        rig.engine.last_auth(),
        Some(("bob@example.com".to_string(), "fresh-token".to_string()))
    );
}
