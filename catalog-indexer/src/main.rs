//! Catalog indexer entry point.
//!
//! Reads reindex messages as JSON lines from standard input and runs them
//! against the configured search index until input ends or a shutdown
//! signal arrives.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use catalog_indexer::config::load_snapshot;
use catalog_indexer::{telemetry, Dependencies, IndexerCatalog, IndexerSettings, IndexingError};
use catalog_indexer_mapping::{EntityDataSourceRegistry, ProviderFactory, ServiceContainer};
use catalog_indexer_pipeline::{EntitySource, InMemoryEntitySource};
use catalog_indexer_shared::IndexMessage;

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    dotenv::dotenv().ok();
    telemetry::init();

    info!("Starting catalog indexer");

    let settings = IndexerSettings::from_env()?;
    let catalog = IndexerCatalog::from_path(&settings.catalog_path)?;

    let source: Arc<dyn EntitySource> = match &settings.snapshot_path {
        Some(path) => Arc::new(load_snapshot(path)?),
        None => {
            warn!("INDEXER_SNAPSHOT is not set, starting with an empty entity source");
            Arc::new(InMemoryEntitySource::new())
        }
    };

    // Providers are registered by the embedding application; the standalone
    // binary indexes rows as they come.
    let datasources =
        EntityDataSourceRegistry::new(ProviderFactory::new(Arc::new(ServiceContainer::new())));

    let deps = Dependencies::new(&settings, catalog, datasources, source).await?;

    let (tx, rx) = deps.orchestrator.channel();
    let reader = tokio::spawn(forward_stdin(tx));

    let result = deps.orchestrator.run(rx).await;
    reader.abort();

    match result {
        Ok(summary) => {
            info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                rejected = summary.rejected,
                "Catalog indexer stopped"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Catalog indexer stopped on error");
            Err(e.into())
        }
    }
}

/// Forward every parsable line of standard input to the orchestrator.
async fn forward_stdin(tx: mpsc::Sender<IndexMessage>) -> Result<(), IndexingError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match IndexMessage::from_json(line.as_bytes()) {
            Ok(message) => {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!(error = %e, "Skipping unparsable message"),
        }
    }

    info!("Input closed");
    Ok(())
}
