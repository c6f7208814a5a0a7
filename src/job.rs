//! Execution of a single admitted job.
//!
//! A [`Job`] is one work unit bound to an endpoint, a deadline and a set of
//! generation parameters. Running it invokes the inference client under the
//! deadline, persists the output, and yields exactly one [`JobReport`].
//! Execution is pure with respect to the console: rendering happens in the
//! aggregator, over the structured report.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use crate::error::JobFailure;
use crate::gemini::{GenerationParams, TextGenerator};

/// One unit of in-flight work. Created at admission, destroyed once its
/// report has been produced.
pub struct Job<C> {
    /// 1-based position among the enumerated units, used in progress lines.
    pub index: usize,
    pub prompt: String,
    pub target: PathBuf,
    pub client: Arc<C>,
    pub params: GenerationParams,
    /// Wall-clock budget for the inference call, independent of admission
    /// pacing.
    pub deadline: Duration,
    /// Whether an empty model response fails the job instead of producing an
    /// empty output file.
    pub fail_on_empty: bool,
}

/// The single completion signal for an admitted job.
#[derive(Debug)]
pub struct JobReport {
    pub index: usize,
    pub target: PathBuf,
    pub result: Result<JobSuccess, JobFailure>,
}

#[derive(Debug)]
pub struct JobSuccess {
    pub bytes_written: usize,
    /// Non-fatal diagnostics from the provider (prompt blocked, early finish).
    pub warnings: Vec<String>,
}

/// Resolves once the shutdown signal fires. If the sender is dropped without
/// ever signalling, this never resolves.
pub(crate) async fn cancelled(mut shutdown: watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl<C: TextGenerator> Job<C> {
    /// Run the job to completion, producing its report. Timing out or
    /// cancelling this job affects no other in-flight job: the deadline and
    /// the generate future are scoped to this call alone.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> JobReport {
        let result = self.execute(shutdown).await;
        JobReport {
            index: self.index,
            target: self.target,
            result,
        }
    }

    async fn execute(&self, shutdown: watch::Receiver<bool>) -> Result<JobSuccess, JobFailure> {
        let generation = tokio::select! {
            biased;
            _ = cancelled(shutdown) => return Err(JobFailure::Cancelled),
            outcome = timeout(self.deadline, self.client.generate(&self.prompt, &self.params)) => {
                match outcome {
                    Ok(Ok(generation)) => generation,
                    Ok(Err(err)) => return Err(JobFailure::Generate(err)),
                    Err(_) => return Err(JobFailure::TimedOut(self.deadline)),
                }
            }
        };

        if generation.text.is_empty() && self.fail_on_empty {
            return Err(JobFailure::EmptyResponse);
        }

        tokio::fs::write(&self.target, generation.text.as_bytes())
            .await
            .map_err(JobFailure::Write)?;

        Ok(JobSuccess {
            bytes_written: generation.text.len(),
            warnings: generation.warnings,
        })
    }
}
