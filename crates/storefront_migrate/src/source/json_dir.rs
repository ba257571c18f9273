//! JSON export directory backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{LegacySource, LegacyTable};
use crate::error::{MigrateError, ReadError};
use crate::record::LegacyRecord;

/// Reads `<table>.json` files, each holding an array of flat records.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    /// Open an export directory. The directory must exist; individual
    /// table files are only checked when read.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, MigrateError> {
        let dir = dir.as_ref();
        let metadata = tokio::fs::metadata(dir)
            .await
            .map_err(|e| MigrateError::source_unavailable(dir.display().to_string(), e))?;

        if !metadata.is_dir() {
            return Err(MigrateError::source_unavailable(
                dir.display().to_string(),
                format!("{} is not a directory", dir.display()),
            ));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl LegacySource for JsonDirSource {
    fn describe(&self) -> String {
        format!("json:{}", self.dir.display())
    }

    async fn read_table(&self, table: LegacyTable) -> Result<Vec<LegacyRecord>, ReadError> {
        let path = self.dir.join(table.file_name());

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ReadError::MissingFile { path });
            }
            Err(cause) => return Err(ReadError::Io { path, cause }),
        };

        let rows: Vec<Value> = serde_json::from_slice(&content).map_err(|cause| {
            ReadError::Malformed {
                path: path.clone(),
                cause,
            }
        })?;

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| match row {
                Value::Object(fields) => Ok(LegacyRecord::new(fields)),
                _ => Err(ReadError::NotAnObject {
                    path: path.clone(),
                    index,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} rows from {}", records.len(), path.display());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture(files: &[(&str, &str)]) -> (tempfile::TempDir, JsonDirSource) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let source = JsonDirSource::open(dir.path()).await.unwrap();
        (dir, source)
    }

    #[tokio::test]
    async fn test_reads_rows_in_order() {
        let (_dir, source) = fixture(&[(
            "users.json",
            r#"[{"id": 2, "email": "b@example.com"}, {"id": 1, "email": "a@example.com"}]"#,
        )])
        .await;

        let rows = source.read_table(LegacyTable::Users).await.unwrap();
        let ids: Vec<_> = rows.iter().filter_map(LegacyRecord::legacy_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_files() {
        let (_dir, source) = fixture(&[
            ("orders.json", "[{\"id\": 1,"),
            ("reviews.json", "[{\"id\": 1}, 3]"),
        ])
        .await;

        let missing = source.read_table(LegacyTable::Users).await.unwrap_err();
        assert!(matches!(missing, ReadError::MissingFile { .. }));

        let malformed = source.read_table(LegacyTable::Orders).await.unwrap_err();
        assert!(matches!(malformed, ReadError::Malformed { .. }));

        let not_object = source.read_table(LegacyTable::Reviews).await.unwrap_err();
        assert!(matches!(not_object, ReadError::NotAnObject { index: 1, .. }));
    }

    #[tokio::test]
    async fn test_open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonDirSource::open(dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, MigrateError::SourceUnavailable { .. }));

        let file = dir.path().join("users.json");
        std::fs::write(&file, "[]").unwrap();
        let err = JsonDirSource::open(&file).await.unwrap_err();
        assert!(matches!(err, MigrateError::SourceUnavailable { .. }));
    }
}
