//! Orchestrator module for the catalog indexer pipeline.
//!
//! Drains reindex messages from a channel and runs them one at a time.

mod dispatch;

pub use dispatch::request_from_message;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, instrument, warn};

use crate::errors::PipelineError;
use crate::reindexer::{ReindexReport, Reindexer};
use catalog_indexer_shared::IndexMessage;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffer.
    pub channel_buffer_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
        }
    }
}

/// Counters of one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages whose reindex succeeded.
    pub succeeded: usize,
    /// Messages whose reindex failed with a data or transport error.
    pub failed: usize,
    /// Messages rejected before any work was done.
    pub rejected: usize,
}

/// Orchestrator that feeds queue messages to the reindexer.
///
/// Messages are handled sequentially since the reindexer owns a single
/// operation registry. Failed operations are logged and the loop moves on;
/// a configuration error stops the run and is returned to the caller.
pub struct Orchestrator {
    reindexer: Arc<Reindexer>,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
}

impl Orchestrator {
    /// Create a new orchestrator around `reindexer`.
    pub fn new(reindexer: Arc<Reindexer>) -> Self {
        Self::with_config(reindexer, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(reindexer: Arc<Reindexer>, config: OrchestratorConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            reindexer,
            config,
            shutdown_tx,
        }
    }

    /// Create a message channel sized by the configuration.
    pub fn channel(&self) -> (mpsc::Sender<IndexMessage>, mpsc::Receiver<IndexMessage>) {
        mpsc::channel(self.config.channel_buffer_size)
    }

    /// Run until the channel closes, a shutdown is requested or a
    /// configuration error occurs.
    #[instrument(skip(self, rx))]
    pub async fn run(&self, mut rx: mpsc::Receiver<IndexMessage>) -> Result<RunSummary, PipelineError> {
        info!("Starting catalog indexer orchestrator");

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut summary = RunSummary::default();

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(message) = msg else {
                        info!("Message channel closed");
                        break;
                    };

                    match self.dispatch(&message).await {
                        Ok(_) => summary.succeeded += 1,
                        Err(e @ PipelineError::InvalidMessage(_)) => {
                            warn!(error = %e, indexer_id = %message.indexer_id, "Rejected message");
                            summary.rejected += 1;
                        }
                        Err(e) if e.is_configuration() => {
                            error!(error = %e, indexer_id = %message.indexer_id, "Configuration error, stopping");
                            return Err(e);
                        }
                        Err(e) => {
                            error!(error = %e, indexer_id = %message.indexer_id, "Failed to process message");
                            summary.failed += 1;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            rejected = summary.rejected,
            "Orchestrator shutdown complete"
        );
        Ok(summary)
    }

    /// Validate and run a single message.
    pub async fn dispatch(&self, message: &IndexMessage) -> Result<ReindexReport, PipelineError> {
        let request = request_from_message(message)?;
        self.reindexer.execute(&message.indexer_id, request).await
    }

    /// Trigger a graceful shutdown; the message being handled completes
    /// first.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
