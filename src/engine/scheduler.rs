// src/engine/scheduler.rs

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::config::model::ConfigFile;
use crate::config::source::ConfigSource;
use crate::errors::Result;
use crate::exec::{DispatchOutcome, Dispatcher};
use crate::types::Lane;

use super::lanes::{LaneGuard, SchedulerState};
use super::priority::{IndexedTask, LANE_PRIORITY, partition, validate_priority_table};
use super::{LaneDecision, TickReport};

/// Polls the config on a fixed interval and starts one batch per idle lane.
///
/// `tick` never waits for a batch: each batch runs as its own tokio task and
/// releases its lane when it settles. A lane found busy is skipped for that
/// tick; its work is picked up by a later tick once the lane is idle.
pub struct Scheduler {
    source: Arc<dyn ConfigSource>,
    dispatcher: Arc<Dispatcher>,
    state: Arc<SchedulerState>,
    in_flight: JoinSet<()>,
    ticks: u64,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.len())
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(source: Arc<dyn ConfigSource>, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        validate_priority_table(&LANE_PRIORITY)?;
        Ok(Self {
            source,
            dispatcher,
            state: Arc::new(SchedulerState::new()),
            in_flight: JoinSet::new(),
            ticks: 0,
        })
    }

    pub fn state(&self) -> &Arc<SchedulerState> {
        &self.state
    }

    /// Number of ticks evaluated so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One pass of the poll loop.
    ///
    /// Reloads the config, then evaluates every lane. An unreadable config is
    /// returned as an error and is fatal to the caller.
    pub fn tick(&mut self) -> Result<TickReport> {
        self.reap_finished();

        self.ticks += 1;
        let tick = self.ticks;
        info!("[{}] start to check at {}", tick, Local::now().format("%Y-%m-%d %H:%M:%S"));

        let cfg = match self.source.load() {
            Ok(cfg) => Arc::new(cfg),
            Err(err) => {
                self.dispatcher
                    .errors()
                    .record("tick", format!("failed to load config: {err}"));
                return Err(err);
            }
        };
        let next_tick_in = cfg.check_interval();

        if cfg.config.pause {
            info!(tick, "paused; no lane evaluated");
            return Ok(TickReport {
                tick,
                paused: true,
                lanes: Vec::new(),
                next_tick_in,
            });
        }

        let mut batches = partition(&cfg.task)?;
        let mut lanes = Vec::with_capacity(Lane::ALL.len());

        for lane in Lane::ALL {
            let decision = match batches.remove(&lane) {
                None => {
                    debug!(tick, lane = %lane, "no tasks for lane");
                    LaneDecision::Empty
                }
                Some(batch) => match self.state.try_acquire(lane) {
                    None => {
                        info!(tick, lane = %lane, "lane busy, skipping");
                        LaneDecision::Busy
                    }
                    Some(guard) => {
                        let tasks = batch.len();
                        info!(tick, lane = %lane, tasks, "lane busy now");
                        self.in_flight.spawn(run_lane(
                            Arc::clone(&self.dispatcher),
                            Arc::clone(&cfg),
                            batch,
                            guard,
                        ));
                        LaneDecision::Started { tasks }
                    }
                },
            };
            lanes.push((lane, decision));
        }

        Ok(TickReport {
            tick,
            paused: false,
            lanes,
            next_tick_in,
        })
    }

    /// Wait for every in-flight batch to settle.
    pub async fn wait_idle(&mut self) {
        while let Some(res) = self.in_flight.join_next().await {
            self.on_joined(res);
        }
    }

    /// Single tick, then wait for the batches it started.
    pub async fn run_once(&mut self) -> Result<TickReport> {
        let report = self.tick()?;
        self.wait_idle().await;
        Ok(report)
    }

    /// Tick every `check_interval` until `shutdown` resolves.
    ///
    /// Shutdown is abrupt: in-flight batches are aborted and their worker
    /// processes killed.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let report = self.tick()?;
            debug!(tick = report.tick, next_tick_in = ?report.next_tick_in, "timer armed");

            tokio::select! {
                _ = &mut shutdown => {
                    info!(in_flight = self.in_flight.len(), "shutdown requested; aborting lanes");
                    self.in_flight.abort_all();
                    break;
                }
                _ = tokio::time::sleep(report.next_tick_in) => {}
            }
        }

        Ok(())
    }

    fn reap_finished(&mut self) {
        while let Some(res) = self.in_flight.try_join_next() {
            self.on_joined(res);
        }
    }

    fn on_joined(&self, res: std::result::Result<(), JoinError>) {
        match res {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => debug!("lane batch cancelled"),
            Err(err) => self
                .dispatcher
                .errors()
                .record("lane", format!("lane batch panicked: {err}")),
        }
    }
}

/// Dispatch `batch` strictly in order. A failed task does not stop the batch.
async fn run_lane(
    dispatcher: Arc<Dispatcher>,
    cfg: Arc<ConfigFile>,
    batch: Vec<IndexedTask>,
    guard: LaneGuard,
) {
    let lane = guard.lane();

    for IndexedTask { index, task } in &batch {
        match dispatcher.dispatch(&cfg, *index, task).await {
            Ok(DispatchOutcome::Completed { files }) => {
                debug!(lane = %lane, task_index = index, files, "task completed")
            }
            Ok(outcome) => debug!(lane = %lane, task_index = index, ?outcome, "task settled"),
            Err(err) => warn!(lane = %lane, task_index = index, error = %err, "task failed"),
        }
    }

    drop(guard);
    info!(lane = %lane, "lane idle");
}
