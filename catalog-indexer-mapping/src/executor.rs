//! Concurrency executors for provider tasks.

use std::sync::Arc;

use async_trait::async_trait;
use catalog_indexer_shared::Document;
use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::errors::MappingError;

/// One independent unit of provider work.
pub type Task<T> = BoxFuture<'static, Result<T, MappingError>>;

/// Default number of tasks allowed in flight at once.
const DEFAULT_MAX_CONCURRENCY: usize = 16;

/// Runs a set of independent tasks to completion.
///
/// Contract: either every task succeeds and the results come back in
/// submission order, or the first failure is returned and no results are.
/// The resolver only relies on this all-or-nothing contract, never on
/// whether tasks actually overlap in time.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Run all `tasks` and return their results in submission order.
    async fn run_all(&self, tasks: Vec<Task<Document>>) -> Result<Vec<Document>, MappingError>;
}

/// Executor spawning every task onto the Tokio runtime.
///
/// A semaphore bounds how many tasks run at once. On the first failure the
/// remaining tasks are aborted.
pub struct TokioExecutor {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
}

impl TokioExecutor {
    /// Create an executor with the default concurrency bound.
    pub fn new() -> Self {
        Self::with_max_concurrency(DEFAULT_MAX_CONCURRENCY)
    }

    /// Create an executor allowing at most `max_concurrency` tasks in flight.
    pub fn with_max_concurrency(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    /// The concurrency bound.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

impl Default for TokioExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskExecutor for TokioExecutor {
    #[instrument(skip(self, tasks), fields(task_count = tasks.len()))]
    async fn run_all(&self, tasks: Vec<Task<Document>>) -> Result<Vec<Document>, MappingError> {
        let task_count = tasks.len();
        let mut set = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let semaphore = self.semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| MappingError::executor(e.to_string()))?;
                let document = task.await?;
                Ok::<_, MappingError>((index, document))
            });
        }

        let mut results: Vec<Option<Document>> = (0..task_count).map(|_| None).collect();

        // Returning early drops the set, which aborts whatever is still running.
        while let Some(joined) = set.join_next().await {
            let (index, document) = joined.map_err(|e| MappingError::executor(e.to_string()))??;
            results[index] = Some(document);
        }

        debug!(task_count = task_count, "All tasks completed");

        results
            .into_iter()
            .map(|result| result.ok_or_else(|| MappingError::executor("task produced no result")))
            .collect()
    }
}

/// Executor awaiting tasks one after another on the calling task.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    /// Create a sequential executor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TaskExecutor for SequentialExecutor {
    async fn run_all(&self, tasks: Vec<Task<Document>>) -> Result<Vec<Document>, MappingError> {
        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            results.push(task.await?);
        }
        Ok(results)
    }
}
