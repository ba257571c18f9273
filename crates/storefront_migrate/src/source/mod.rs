//! Legacy data sources.
//!
//! A source yields the rows of one legacy table at a time, in source order.
//! Two backends exist: a MySQL database and a directory of JSON exports.

mod json_dir;
mod mysql;

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use tracing::info;

pub use json_dir::JsonDirSource;
pub use mysql::MySqlSource;

use crate::config::SourceConfig;
use crate::error::{ReadError, Result};
use crate::record::LegacyRecord;

/// A table in the legacy relational schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyTable {
    Users,
    Products,
    Reviews,
    Wishlists,
    WishlistItems,
    CartEntries,
    Orders,
    OrderItems,
}

impl LegacyTable {
    /// Table name in the legacy database.
    pub fn table_name(&self) -> &'static str {
        match self {
            LegacyTable::Users => "users",
            LegacyTable::Products => "products",
            LegacyTable::Reviews => "reviews",
            LegacyTable::Wishlists => "wishlists",
            LegacyTable::WishlistItems => "wishlist_item",
            LegacyTable::CartEntries => "cart",
            LegacyTable::Orders => "orders",
            LegacyTable::OrderItems => "order_items",
        }
    }

    /// File name of the table's JSON export.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.table_name())
    }
}

impl fmt::Display for LegacyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Read access to the legacy store.
#[async_trait]
pub trait LegacySource: Send + Sync {
    /// Short description for logs and the run report.
    fn describe(&self) -> String;

    /// All rows of a table, in source order.
    async fn read_table(&self, table: LegacyTable) -> std::result::Result<Vec<LegacyRecord>, ReadError>;
}

/// Open the configured source. Failure here is fatal for the run.
pub async fn connect(config: &SourceConfig) -> Result<Box<dyn LegacySource>> {
    let source: Box<dyn LegacySource> = match config {
        SourceConfig::JsonDir(path) => Box::new(JsonDirSource::open(path).await?),
        SourceConfig::MySql(mysql) => Box::new(MySqlSource::connect(mysql).await?),
    };
    info!("Reading legacy data from {}", source.describe());
    Ok(source)
}

/// Child rows grouped by a parent's legacy id.
///
/// Rows keep their source order within each group. Rows without a usable
/// parent key are counted in `orphans` and otherwise ignored.
#[derive(Debug, Default)]
pub struct ChildIndex {
    groups: HashMap<i64, Vec<LegacyRecord>>,
    pub orphans: usize,
}

impl ChildIndex {
    pub fn group_by(rows: Vec<LegacyRecord>, parent_field: &str) -> Self {
        let mut index = Self::default();
        for row in rows {
            match row.int(parent_field) {
                Some(parent) => index.groups.entry(parent).or_default().push(row),
                None => index.orphans += 1,
            }
        }
        index
    }

    /// Children of one parent, empty if it has none.
    pub fn children(&self, parent: i64) -> &[LegacyRecord] {
        self.groups.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parent ids in ascending order.
    pub fn parents(&self) -> Vec<i64> {
        let mut parents: Vec<i64> = self.groups.keys().copied().collect();
        parents.sort_unstable();
        parents
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: serde_json::Value) -> LegacyRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_table_file_names() {
        assert_eq!(LegacyTable::CartEntries.file_name(), "cart.json");
        assert_eq!(LegacyTable::WishlistItems.file_name(), "wishlist_item.json");
        assert_eq!(LegacyTable::OrderItems.to_string(), "order_items");
    }

    #[test]
    fn test_child_index_keeps_order() {
        let index = ChildIndex::group_by(
            vec![
                row(json!({ "id": 1, "order_id": 10, "product_id": 5 })),
                row(json!({ "id": 2, "order_id": 11, "product_id": 6 })),
                row(json!({ "id": 3, "order_id": "10", "product_id": 7 })),
                row(json!({ "id": 4, "product_id": 8 })),
            ],
            "order_id",
        );

        let products: Vec<i64> = index
            .children(10)
            .iter()
            .filter_map(|r| r.int("product_id"))
            .collect();
        assert_eq!(products, vec![5, 7]);
        assert_eq!(index.children(99).len(), 0);
        assert_eq!(index.parents(), vec![10, 11]);
        assert_eq!(index.orphans, 1);
        assert_eq!(index.len(), 2);
    }
}
