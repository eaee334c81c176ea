//! Bounded, timed fan-out of per-chunk model calls.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use quickprep_core::config::PipelineConfig;
use tracing::{debug, warn};

use crate::provider::LlmError;

/// One unit of generation work, addressed by its position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkJob {
    pub section: usize,
    pub chunk: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutput {
    pub section: usize,
    pub chunk: usize,
    pub text: String,
}

/// The earliest failing job, in job order.
#[derive(Debug)]
pub struct ChunkFailure {
    pub section: usize,
    pub chunk: usize,
    pub error: LlmError,
}

/// Runs chunk jobs with at most `concurrency` in flight, each under its own
/// timeout. Outputs come back in job order.
#[derive(Debug, Clone, Copy)]
pub struct ChunkDispatcher {
    concurrency: usize,
    timeout: Duration,
}

impl Default for ChunkDispatcher {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(120))
    }
}

impl ChunkDispatcher {
    pub fn new(concurrency: usize, timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.concurrency, Duration::from_secs(config.chunk_timeout_secs))
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every job, stopping at the first failure in job order.
    ///
    /// On failure the stream is dropped: calls still in flight are cancelled
    /// and queued jobs never start.
    pub async fn run<F, Fut>(&self, jobs: Vec<ChunkJob>, work: F) -> Result<Vec<ChunkOutput>, ChunkFailure>
    where
        F: Fn(ChunkJob) -> Fut,
        Fut: Future<Output = Result<String, LlmError>>,
    {
        let total = jobs.len();
        debug!(jobs = total, concurrency = self.concurrency, "Dispatching chunks");

        let timeout = self.timeout;
        let mut results = stream::iter(jobs)
            .map(|job| {
                let (section, chunk) = (job.section, job.chunk);
                let fut = work(job);
                async move {
                    let result = match tokio::time::timeout(timeout, fut).await {
                        Ok(result) => result,
                        Err(_) => {
                            warn!(section, chunk, "Chunk timed out after {:?}", timeout);
                            Err(LlmError::Timeout(timeout))
                        }
                    };
                    (section, chunk, result)
                }
            })
            .buffered(self.concurrency);

        let mut outputs = Vec::with_capacity(total);
        while let Some((section, chunk, result)) = results.next().await {
            match result {
                Ok(text) => outputs.push(ChunkOutput { section, chunk, text }),
                Err(error) => {
                    debug!(section, chunk, done = outputs.len(), total, "Stopping dispatch");
                    return Err(ChunkFailure { section, chunk, error });
                }
            }
        }
        Ok(outputs)
    }
}
