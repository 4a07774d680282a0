//! Shared rig for the scenario suite: a scripted engine behind a real
//! session manager, strategy coordinator and invoker.

use std::sync::Arc;
use std::time::Duration;

use e6r_invoker::{Invoker, RetryPolicy};
use e6r_schemas::DeploymentTag;
use e6r_session::{EngineDial, SessionManager};
use e6r_strategy::StrategyCoordinator;
use e6r_testkit::{test_session_config, MockDial, MockEngine};

pub struct Rig {
    pub engine: Arc<MockEngine>,
    pub dial: Arc<MockDial>,
    pub coordinator: Arc<StrategyCoordinator>,
    pub session: Arc<SessionManager>,
    pub invoker: Invoker,
}

pub fn rig(serving: &[DeploymentTag]) -> Rig {
    rig_with_retry(
        serving,
        RetryPolicy {
            max_attempts: 5,
            backoff: Duration::ZERO,
        },
    )
}

pub fn rig_with_retry(serving: &[DeploymentTag], retry: RetryPolicy) -> Rig {
    e6r_testkit::init_test_logging();
    let engine = MockEngine::new(serving);
    let dial = MockDial::new(Arc::clone(&engine));
    let coordinator = Arc::new(StrategyCoordinator::with_cache_timeout(None));
    let dial_dyn: Arc<dyn EngineDial> = dial.clone();
    let session = Arc::new(
        SessionManager::new(test_session_config(), dial_dyn, Arc::clone(&coordinator))
            .expect("test session config must validate"),
    );
    let invoker = Invoker::new(Arc::clone(&session), Arc::clone(&coordinator), retry);
    Rig {
        engine,
        dial,
        coordinator,
        session,
        invoker,
    }
}
