//! Configuration and dependency wiring.

mod catalog;
mod dependencies;
mod settings;
mod snapshot;

pub use catalog::IndexerCatalog;
pub use dependencies::Dependencies;
pub use settings::IndexerSettings;
pub use snapshot::load_snapshot;
