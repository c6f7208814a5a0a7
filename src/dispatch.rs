//! The batch engine: rate-limited admission, bounded concurrency, and
//! result aggregation.
//!
//! A single dispatch loop walks the enumerated units in order: completion
//! filter, input read, endpoint rotation, rate gate, concurrency slot, spawn.
//! Jobs run independently and each sends exactly one report back; the
//! aggregator consumes reports until every admitted job is accounted for.
//! Per-unit and per-job errors never terminate the loop or other jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc, watch};
use tokio::time::{Instant, sleep_until};

use crate::gemini::{GenerationParams, TextGenerator};
use crate::job::{Job, JobReport, cancelled};
use crate::rotation::{Endpoint, Rotator};
use crate::ui::BatchProgress;
use crate::worklist::{Admission, Claims, WorkUnit};

/// Knobs of one batch run, resolved from config before dispatch starts.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Capacity of the concurrency limiter.
    pub workers: usize,
    /// Minimum spacing between consecutive admissions.
    pub interval: Duration,
    /// Wall-clock deadline per job.
    pub job_timeout: Duration,
    /// Stop admitting new jobs after this many failures. 0 = no limit.
    pub fail_limit: u32,
    /// Treat an empty model response as a job failure.
    pub fail_on_empty: bool,
    /// Generation parameters shared by every job in the batch.
    pub params: GenerationParams,
}

/// Final counters of a batch run. At normal termination
/// `skipped + completed + failed == total`; an early stop (failure budget or
/// shutdown signal) leaves the un-admitted remainder unaccounted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub total: usize,
    pub skipped_done: usize,
    pub skipped_duplicate: usize,
    pub completed: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn skipped(&self) -> usize {
        self.skipped_done + self.skipped_duplicate
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Owns the dispatch loop and the aggregation of job reports.
pub struct Dispatcher<C> {
    endpoints: Rotator<Endpoint<C>>,
    options: DispatchOptions,
    progress: BatchProgress,
    shutdown: watch::Receiver<bool>,
}

impl<C: TextGenerator + 'static> Dispatcher<C> {
    pub fn new(
        endpoints: Vec<Endpoint<C>>,
        options: DispatchOptions,
        progress: BatchProgress,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            endpoints: Rotator::new(endpoints),
            options,
            progress,
            shutdown,
        }
    }

    /// Run the batch over the enumerated units and return the final counters.
    pub async fn run(mut self, units: Vec<WorkUnit>) -> BatchOutcome {
        let total = units.len();
        let mut outcome = BatchOutcome {
            total,
            ..Default::default()
        };
        let mut claims = Claims::default();
        let semaphore = Arc::new(Semaphore::new(self.options.workers));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<JobReport>();

        let mut admitted = 0usize;
        let mut consumed = 0usize;
        // Rate gate: no admission before this instant. It is re-armed from
        // the moment a slot is actually taken, so two admissions are never
        // less than one interval apart even when slot acquisition stalls.
        let mut next_admission = Instant::now();

        for (i, unit) in units.iter().enumerate() {
            // Fold in any reports that already arrived, so the failure
            // budget check sees the current count.
            while let Ok(report) = report_rx.try_recv() {
                self.consume(report, &mut outcome);
                consumed += 1;
            }
            if self.budget_exhausted(&outcome) {
                self.progress.budget_exhausted(outcome.failed);
                break;
            }

            match claims.plan(unit) {
                Admission::SkipDone => {
                    outcome.skipped_done += 1;
                    self.progress.skip_done(&unit.target);
                    continue;
                }
                Admission::SkipDuplicate => {
                    outcome.skipped_duplicate += 1;
                    self.progress.skip_duplicate(&unit.target);
                    continue;
                }
                Admission::Admit => {}
            }

            // Read the input up front: a read failure is a unit failure that
            // never consumes a concurrency slot.
            let prompt = match tokio::fs::read_to_string(&unit.input_path).await {
                Ok(prompt) => prompt,
                Err(err) => {
                    outcome.failed += 1;
                    self.progress.read_failed(&unit.input_path, &err);
                    continue;
                }
            };

            let endpoint = self.endpoints.next();
            let client = Arc::clone(&endpoint.client);
            let region = endpoint.label.clone();

            tokio::select! {
                biased;
                _ = cancelled(self.shutdown.clone()) => {
                    self.progress.interrupted();
                    break;
                }
                _ = sleep_until(next_admission) => {}
            }

            let permit = tokio::select! {
                biased;
                _ = cancelled(self.shutdown.clone()) => {
                    self.progress.interrupted();
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    permit.expect("semaphore never closed")
                }
            };
            next_admission = Instant::now() + self.options.interval;

            admitted += 1;
            let index = i + 1;
            self.progress.admitted(index, total, &unit.target, &region);

            let job = Job {
                index,
                prompt,
                target: unit.target.clone(),
                client,
                params: self.options.params.clone(),
                deadline: self.options.job_timeout,
                fail_on_empty: self.options.fail_on_empty,
            };
            let report_tx = report_tx.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                let report = job.run(shutdown).await;
                // The slot is freed before the report is consumed: the
                // aggregator can never block a release.
                drop(permit);
                let _ = report_tx.send(report);
            });
        }
        drop(report_tx);

        // Drain: exactly one report per admitted job, including after an
        // early stop. Already-admitted jobs run to completion (or are
        // cancelled by the shutdown signal) before the summary is printed.
        while consumed < admitted {
            match report_rx.recv().await {
                Some(report) => {
                    self.consume(report, &mut outcome);
                    consumed += 1;
                }
                None => break,
            }
        }

        self.progress.finish(&outcome);
        outcome
    }

    fn consume(&self, report: JobReport, outcome: &mut BatchOutcome) {
        match report.result {
            Ok(success) => {
                outcome.completed += 1;
                for warning in &success.warnings {
                    self.progress.job_warning(report.index, warning);
                }
                self.progress.job_done(report.index, success.bytes_written);
            }
            Err(failure) => {
                outcome.failed += 1;
                self.progress.job_failed(report.index, &report.target, &failure);
            }
        }
    }

    fn budget_exhausted(&self, outcome: &BatchOutcome) -> bool {
        self.options.fail_limit > 0 && outcome.failed >= self.options.fail_limit as usize
    }
}
