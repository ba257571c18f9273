//! Pass sequencing.
//!
//! Runs one pass per entity kind in [`EntityKind::MIGRATION_ORDER`]. A pass
//! reads its tables, transforms every row, and replaces the target
//! collection. A pass that cannot read or clear is marked failed and the
//! run moves on; nothing below the run level is fatal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use storefront_db::{DbError, DocumentStore};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::aggregate::RatingAccumulator;
use crate::entity::EntityKind;
use crate::error::ReadError;
use crate::identity::IdentityMap;
use crate::record::LegacyRecord;
use crate::report::{IssueSeverity, MigrationIssue, MigrationReport, PassState, PassSummary};
use crate::source::{ChildIndex, LegacySource, LegacyTable};
use crate::transform::{
    TransformContext, TransformResult, Transformed, transform_cart, transform_order,
    transform_product, transform_review, transform_user, transform_wishlist,
};
use crate::writer::{WriteOutcome, Writer};

/// Why a pass was abandoned.
#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("Failed to clear target collection: {0}")]
    Clear(#[source] DbError),
}

/// Moves every entity kind from a legacy source into a document store.
pub struct Migrator<'a> {
    source: &'a dyn LegacySource,
    store: &'a dyn DocumentStore,
    now: DateTime<Utc>,
    dry_run: bool,
}

impl<'a> Migrator<'a> {
    pub fn new(source: &'a dyn LegacySource, store: &'a dyn DocumentStore) -> Self {
        Self {
            source,
            store,
            now: Utc::now(),
            dry_run: false,
        }
    }

    /// Fix the time used for absent timestamps.
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Mark the run as a dry run in the report.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> MigrationReport {
        let mut report =
            MigrationReport::new(self.source.describe(), self.store.describe(), self.dry_run);
        info!(
            source = %report.source,
            target = %report.target,
            dry_run = self.dry_run,
            "Starting migration"
        );

        let mut ids = IdentityMap::new();
        for kind in EntityKind::MIGRATION_ORDER {
            let mut pass = PassSummary::new(kind);
            if let Err(e) = self
                .run_pass(kind, &mut ids, &mut pass, &mut report.issues)
                .await
            {
                let resolution = match e {
                    PassError::Read(_) => "pass abandoned, target collection left unchanged",
                    PassError::Clear(_) => "pass abandoned",
                };
                report.issues.push(
                    MigrationIssue::new(IssueSeverity::Critical, kind, None, e.to_string())
                        .resolved(resolution),
                );
                pass.fail(&e);
            }
            pass.log();
            report.passes.push(pass);
        }

        report.finish();
        report.log_summary();
        report
    }

    async fn run_pass(
        &self,
        kind: EntityKind,
        ids: &mut IdentityMap,
        pass: &mut PassSummary,
        issues: &mut Vec<MigrationIssue>,
    ) -> Result<(), PassError> {
        match kind {
            EntityKind::User => {
                let rows = self.read(LegacyTable::Users, pass).await?;
                pass.read = rows.len();
                let ctx = TransformContext::new(ids, self.now);
                let docs = collect(
                    kind,
                    rows.iter()
                        .map(|row| (row.legacy_id(), transform_user(row, &ctx))),
                    pass,
                    issues,
                );
                self.write(kind, &docs, ids, pass, issues).await?;
            }

            EntityKind::Product => {
                let rows = self.read(LegacyTable::Products, pass).await?;
                pass.read = rows.len();
                let ctx = TransformContext::new(ids, self.now);
                let docs = collect(
                    kind,
                    rows.iter()
                        .map(|row| (row.legacy_id(), transform_product(row, &ctx))),
                    pass,
                    issues,
                );
                self.write(kind, &docs, ids, pass, issues).await?;
            }

            EntityKind::Review => {
                let rows = self.read(LegacyTable::Reviews, pass).await?;
                pass.read = rows.len();
                let ctx = TransformContext::new(ids, self.now);
                let docs = collect(
                    kind,
                    rows.iter()
                        .map(|row| (row.legacy_id(), transform_review(row, &ctx))),
                    pass,
                    issues,
                );
                let outcome = self.write(kind, &docs, ids, pass, issues).await?;

                let mut ratings = RatingAccumulator::new();
                for (doc, id) in docs.iter().zip(&outcome.ids) {
                    if id.is_some() {
                        ratings.record(&doc.document.product, doc.document.rating);
                    }
                }

                let applied = ratings.apply(self.store).await;
                for (product, e) in applied.failed {
                    issues.push(
                        MigrationIssue::new(
                            IssueSeverity::Error,
                            EntityKind::Product,
                            None,
                            format!("Failed to update rating of product {product}: {e}"),
                        )
                        .resolved("rating left unchanged"),
                    );
                }
                info!(products = applied.updated, "Recomputed product ratings");
            }

            EntityKind::Wishlist => {
                let rows = self.read(LegacyTable::Wishlists, pass).await?;
                let items = self.read(LegacyTable::WishlistItems, pass).await?;
                pass.read = rows.len();
                let items = children(kind, items, "wishlist_id", issues);

                let ctx = TransformContext::new(ids, self.now);
                let docs = collect(
                    kind,
                    rows.iter().map(|row| {
                        let lines = row.legacy_id().map_or(&[][..], |id| items.children(id));
                        (row.legacy_id(), transform_wishlist(row, lines, &ctx))
                    }),
                    pass,
                    issues,
                );
                self.write(kind, &docs, ids, pass, issues).await?;
            }

            EntityKind::Cart => {
                let rows = self.read(LegacyTable::CartEntries, pass).await?;
                pass.read = rows.len();
                let entries = children(kind, rows, "user_id", issues);

                let ctx = TransformContext::new(ids, self.now);
                let docs = collect(
                    kind,
                    entries.parents().into_iter().map(|user| {
                        (Some(user), transform_cart(user, entries.children(user), &ctx))
                    }),
                    pass,
                    issues,
                );
                self.write(kind, &docs, ids, pass, issues).await?;
            }

            EntityKind::Order => {
                let rows = self.read(LegacyTable::Orders, pass).await?;
                let lines = self.read(LegacyTable::OrderItems, pass).await?;
                pass.read = rows.len();
                let lines = children(kind, lines, "order_id", issues);

                let ctx = TransformContext::new(ids, self.now);
                let docs = collect(
                    kind,
                    rows.iter().map(|row| {
                        let items = row.legacy_id().map_or(&[][..], |id| lines.children(id));
                        (row.legacy_id(), transform_order(row, items, &ctx))
                    }),
                    pass,
                    issues,
                );
                self.write(kind, &docs, ids, pass, issues).await?;
            }
        }

        pass.state = PassState::Done;
        Ok(())
    }

    async fn read(
        &self,
        table: LegacyTable,
        pass: &mut PassSummary,
    ) -> Result<Vec<LegacyRecord>, ReadError> {
        pass.state = PassState::Reading;
        let rows = self.source.read_table(table).await?;
        debug!(table = %table, rows = rows.len(), "Read legacy table");
        pass.state = PassState::Transforming;
        Ok(rows)
    }

    async fn write<T: Serialize>(
        &self,
        kind: EntityKind,
        docs: &[Transformed<T>],
        ids: &mut IdentityMap,
        pass: &mut PassSummary,
        issues: &mut Vec<MigrationIssue>,
    ) -> Result<WriteOutcome, PassError> {
        pass.state = PassState::Writing;
        let outcome = Writer::new(self.store)
            .write_all(kind, docs, ids)
            .await
            .map_err(PassError::Clear)?;

        pass.written = outcome.written();
        pass.failed_writes = outcome.failures.len();
        for failure in &outcome.failures {
            issues.push(
                MigrationIssue::new(
                    IssueSeverity::Error,
                    kind,
                    Some(failure.legacy_id),
                    format!("Insert failed: {}", failure.error),
                )
                .resolved("record skipped"),
            );
        }
        Ok(outcome)
    }
}

/// Gather transformed documents, turning skips and field diagnostics into
/// report issues.
fn collect<T>(
    kind: EntityKind,
    results: impl IntoIterator<Item = (Option<i64>, TransformResult<T>)>,
    pass: &mut PassSummary,
    issues: &mut Vec<MigrationIssue>,
) -> Vec<Transformed<T>> {
    let mut docs = Vec::new();
    for (legacy_id, result) in results {
        match result {
            Ok(doc) => {
                for issue in &doc.issues {
                    warn!(
                        entity = %kind,
                        legacy_id = doc.legacy_id,
                        field = %issue.field,
                        "{}; {}",
                        issue.message,
                        issue.resolution
                    );
                    issues.push(
                        MigrationIssue::new(
                            IssueSeverity::Warning,
                            kind,
                            Some(doc.legacy_id),
                            format!("{}: {}", issue.field, issue.message),
                        )
                        .resolved(issue.resolution.clone()),
                    );
                }
                docs.push(doc);
            }
            Err(reason) => {
                warn!(entity = %kind, legacy_id = ?legacy_id, reason = %reason, "Skipping record");
                pass.skipped += 1;
                issues.push(
                    MigrationIssue::new(IssueSeverity::Error, kind, legacy_id, reason.to_string())
                        .resolved("record skipped"),
                );
            }
        }
    }
    docs
}

/// Group child rows by their parent key, reporting rows without one.
fn children(
    kind: EntityKind,
    rows: Vec<LegacyRecord>,
    parent_field: &'static str,
    issues: &mut Vec<MigrationIssue>,
) -> ChildIndex {
    let index = ChildIndex::group_by(rows, parent_field);
    if index.orphans > 0 {
        warn!(entity = %kind, orphans = index.orphans, "Rows without {parent_field}");
        issues.push(
            MigrationIssue::new(
                IssueSeverity::Warning,
                kind,
                None,
                format!("{} rows have no {parent_field}", index.orphans),
            )
            .resolved("rows ignored"),
        );
    }
    index
}
