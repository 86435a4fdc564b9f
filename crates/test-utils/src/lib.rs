pub mod builders;
pub mod fake_worker;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use lanekeeper::logging::LOG_ENV;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Upper bound for a single scheduler scenario, including gated workers.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test-writer subscriber once per test binary.
///
/// Honours the same `LANEKEEPER_LOG` filter as the binary, e.g.
/// `LANEKEEPER_LOG=lanekeeper=debug cargo test -- --nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .init();
    });
}

/// Await `f`, failing the test if it outlives [`SCENARIO_TIMEOUT`].
///
/// A hang here usually means a lane guard was never released or a
/// `FakeWorker` gate was never opened.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(SCENARIO_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!(
            "scenario still running after {:?}; stuck lane or unopened worker gate?",
            SCENARIO_TIMEOUT
        ),
    }
}
