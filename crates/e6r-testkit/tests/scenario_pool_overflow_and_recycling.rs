use std::sync::Arc;
use std::time::Duration;

use e6r_pool::{AffinityKey, Pool, PoolConfig, PoolError};
use e6r_schemas::DeploymentTag;
use e6r_session::EngineDial;
use e6r_strategy::StrategyCoordinator;
use e6r_testkit::{test_session_config, MockDial, MockEngine};

fn pool_with(config: PoolConfig) -> (Pool, Arc<MockEngine>) {
    e6r_testkit::init_test_logging();
    let engine = MockEngine::new(&[DeploymentTag::Green]);
    let dial: Arc<dyn EngineDial> = MockDial::new(Arc::clone(&engine));
    let coordinator = Arc::new(StrategyCoordinator::with_cache_timeout(None));
    let pool = Pool::new(config, test_session_config(), dial, coordinator).expect("pool config");
    (pool, engine)
}

#[tokio::test]
async fn overflow_channels_exist_only_while_held() {
    let (pool, _engine) = pool_with(PoolConfig {
        min: 1,
        max: 1,
        overflow: 1,
        acquire_timeout: Duration::from_millis(100),
        recycle_age: None,
        pre_ping: false,
    });

    // GIVEN the only resident is held
    let resident = pool.acquire(AffinityKey::from_raw(1)).await.expect("resident");
    assert!(!resident.is_ephemeral());

    // WHEN a second caller arrives
    let burst = pool.acquire(AffinityKey::from_raw(2)).await.expect("overflow");

    // THEN it rides an ephemeral overflow channel
    assert!(burst.is_ephemeral());
    assert_eq!(pool.stats().active, 2);

    // AND the overflow channel is destroyed on return, not parked
    burst.release();
    let stats = pool.stats();
    assert_eq!(stats.active, 1);
    assert_eq!(stats.idle, 0);

    // AND the next burst builds a fresh one rather than reusing anything
    let burst2 = pool.acquire(AffinityKey::from_raw(2)).await.expect("overflow again");
    assert!(burst2.is_ephemeral());
    assert_eq!(pool.stats().total_created, 3); // resident + two ephemerals

    // AND the budget is a hard cap while both are held
    let err = pool
        .acquire(AffinityKey::from_raw(3))
        .await
        .expect_err("overflow budget spent");
    assert!(matches!(err, PoolError::Exhausted));
}

#[tokio::test]
async fn over_age_channels_are_destroyed_on_return_and_min_restored() {
    let (pool, _engine) = pool_with(PoolConfig {
        min: 1,
        max: 2,
        overflow: 0,
        acquire_timeout: Duration::from_millis(100),
        // Zero: every channel is over-age the moment it exists.
        recycle_age: Some(Duration::ZERO),
        pre_ping: false,
    });
    assert_eq!(pool.stats().total_created, 1);

    // WHEN a caller acquires (the warm channel is already over-age, so a
    // fresh resident is created for it)
    let guard = pool.acquire(AffinityKey::from_raw(1)).await.expect("acquire");
    assert_eq!(pool.stats().total_created, 2);
    let used_id = guard.id();

    // AND returns it
    guard.release();

    // THEN the returned channel was destroyed and the warm floor restored
    // with yet another channel
    let stats = pool.stats();
    assert_eq!(stats.idle, 1);
    assert_eq!(stats.total_created, 3);
    let next = pool.acquire(AffinityKey::from_raw(1)).await.expect("reacquire");
    assert_ne!(next.id(), used_id);
}

#[tokio::test]
async fn failed_pre_ping_discards_the_channel_instead_of_handing_it_out() {
    let (pool, engine) = pool_with(PoolConfig {
        min: 1,
        max: 2,
        overflow: 0,
        acquire_timeout: Duration::from_millis(100),
        recycle_age: None,
        pre_ping: true,
    });

    // GIVEN the warm channel's transport no longer answers the probe
    engine.set_probe_ok(false);

    // WHEN a caller acquires
    let guard = pool.acquire(AffinityKey::from_raw(1)).await.expect("acquire");

    // THEN the dead channel was probed, discarded, and a fresh resident
    // created instead (fresh channels are not probed — nothing is live yet)
    assert!(engine.probe_count() >= 1);
    assert_eq!(pool.stats().total_created, 2);
    drop(guard);
}

#[tokio::test]
async fn creation_failures_propagate_and_are_counted() {
    // GIVEN a session template whose TLS material cannot be read, and no
    // warm channels to trip over at construction
    let engine = MockEngine::new(&[DeploymentTag::Green]);
    let dial: Arc<dyn EngineDial> = MockDial::new(Arc::clone(&engine));
    let coordinator = Arc::new(StrategyCoordinator::with_cache_timeout(None));
    let mut session_config = test_session_config();
    session_config.options.tls =
        e6r_session::TlsMaterial::PemPath("/nonexistent/ca.pem".into());
    let pool = Pool::new(
        PoolConfig {
            min: 0,
            max: 2,
            overflow: 0,
            acquire_timeout: Duration::from_millis(100),
            recycle_age: None,
            pre_ping: false,
        },
        session_config,
        dial,
        coordinator,
    );

    // Construction with min=0 defers the failure to acquire …
    let pool = pool.expect("no warm channels, construction succeeds");
    let err = pool
        .acquire(AffinityKey::from_raw(1))
        .await
        .expect_err("creation must fail");
    assert!(matches!(err, PoolError::Create(_)));
    assert_eq!(pool.stats().failed_creations, 1);
    assert_eq!(pool.stats().total_created, 0);
}
