use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use lanekeeper::errors::{LanekeeperError, Result};
use lanekeeper::exec::{JobDescriptor, WorkerBackend, WorkerOutcome};
use lanekeeper::types::WorkerKind;

/// One call to `run_job`.
#[derive(Debug, Clone)]
pub struct RecordedJob {
    pub cmd: String,
    pub job: JobDescriptor,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: Mutex<Vec<RecordedJob>>,
    exit_codes: Mutex<HashMap<WorkerKind, VecDeque<i32>>>,
    spawn_failures: Mutex<HashSet<WorkerKind>>,
    gates: Mutex<HashMap<WorkerKind, Arc<Notify>>>,
}

/// A fake worker backend that:
/// - records every descriptor it is handed
/// - exits with scripted codes per kind (0 when nothing is scripted)
/// - can refuse to start a kind, or hold a kind until released
#[derive(Debug, Clone, Default)]
pub struct FakeWorker {
    inner: Arc<Inner>,
}

impl FakeWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next run of `kind` exit with `code`.
    pub fn exit_next(&self, kind: WorkerKind, code: i32) {
        self.inner
            .exit_codes
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(code);
    }

    /// Every future run of `kind` fails to start.
    pub fn fail_spawn(&self, kind: WorkerKind) {
        self.inner.spawn_failures.lock().unwrap().insert(kind);
    }

    /// Hold every future run of `kind` until the returned handle is notified
    /// (one `notify_one` releases one run).
    pub fn gate(&self, kind: WorkerKind) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.inner
            .gates
            .lock()
            .unwrap()
            .insert(kind, Arc::clone(&notify));
        notify
    }

    pub fn jobs(&self) -> Vec<RecordedJob> {
        self.inner.jobs.lock().unwrap().clone()
    }

    pub fn jobs_of(&self, kind: WorkerKind) -> Vec<RecordedJob> {
        self.jobs()
            .into_iter()
            .filter(|r| r.job.kind == kind)
            .collect()
    }
}

impl WorkerBackend for FakeWorker {
    fn run_job(
        &self,
        cmd: &str,
        job: JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<WorkerOutcome>> + Send + '_>> {
        let cmd = cmd.to_string();

        Box::pin(async move {
            let kind = job.kind;

            if self.inner.spawn_failures.lock().unwrap().contains(&kind) {
                return Err(LanekeeperError::WorkerSpawn {
                    category: kind.category(),
                    message: format!("{cmd}: refused by fake worker"),
                });
            }

            self.inner.jobs.lock().unwrap().push(RecordedJob { cmd, job });

            let gate = self.inner.gates.lock().unwrap().get(&kind).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            let code = self
                .inner
                .exit_codes
                .lock()
                .unwrap()
                .get_mut(&kind)
                .and_then(VecDeque::pop_front)
                .unwrap_or(0);

            Ok(if code == 0 {
                WorkerOutcome::Success
            } else {
                WorkerOutcome::Failed(code)
            })
        })
    }
}
