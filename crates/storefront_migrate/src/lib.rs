//! Storefront Legacy Migration
//!
//! Moves the legacy relational storefront data (users, products, reviews,
//! wishlists, carts, orders) into the document store.
//!
//! # Architecture
//!
//! - **Sources** - a MySQL database or a directory of JSON exports, behind
//!   [`LegacySource`]
//! - **Transformers** - pure per-entity functions from flat legacy rows to
//!   nested documents, resolving foreign keys through an [`IdentityMap`]
//! - **Writer** - full replace: each collection is cleared, then refilled
//!   one document at a time under fresh ids
//! - **Aggregator** - recomputes product ratings from the migrated reviews
//!
//! Passes run strictly in [`EntityKind::MIGRATION_ORDER`] so every
//! reference points at a document written earlier in the same run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use storefront_migrate::{MigrationConfig, migrate};
//!
//! let config = MigrationConfig::load().await?;
//! let report = migrate(&config).await?;
//! ```

pub mod aggregate;
pub mod config;
pub mod driver;
pub mod entity;
pub mod error;
pub mod identity;
pub mod record;
pub mod report;
pub mod source;
pub mod transform;
pub mod writer;

use storefront_db::queries::collection_counts;
use storefront_db::{DocumentStore, MemoryStore, SurrealStore};
use tracing::{info, warn};

pub use config::{MigrationConfig, SourceConfig};
pub use driver::Migrator;
pub use entity::EntityKind;
pub use error::{ConfigError, MigrateError, ReadError, Result};
pub use identity::IdentityMap;
pub use record::LegacyRecord;
pub use report::{IssueSeverity, MigrationIssue, MigrationReport, PassState, PassSummary};
pub use source::{LegacySource, LegacyTable};

/// Run a full migration with the given configuration.
///
/// Fails only if the source or the target cannot be reached. Per-pass and
/// per-record problems end up in the returned report.
pub async fn migrate(config: &MigrationConfig) -> Result<MigrationReport> {
    let source = source::connect(&config.source).await?;

    if config.dry_run {
        info!("Dry run: writing to an in-memory store");
        let store = MemoryStore::new();
        let report = Migrator::new(source.as_ref(), &store)
            .dry_run(true)
            .run()
            .await;
        log_counts(&store).await;
        return Ok(report);
    }

    let target = config.target.as_ref().ok_or(ConfigError::Missing {
        key: "TARGET_DB_URL",
    })?;
    let store = SurrealStore::connect(target)
        .await
        .map_err(MigrateError::TargetUnavailable)?;
    store
        .health_check()
        .await
        .map_err(MigrateError::TargetUnavailable)?;

    let report = Migrator::new(source.as_ref(), &store).run().await;
    log_counts(&store).await;
    Ok(report)
}

async fn log_counts(store: &dyn DocumentStore) {
    match collection_counts(store).await {
        Ok(counts) => {
            for (collection, count) in counts {
                info!(collection = %collection, documents = count, "Target collection");
            }
        }
        Err(e) => warn!("Could not count target collections: {}", e),
    }
}
