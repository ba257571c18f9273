//! Migration configuration.
//!
//! Settings come from the environment (after `.env` is loaded). If
//! `MIGRATE_CONFIG` names a TOML file, it provides the base values and the
//! environment overrides them key by key.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use storefront_db::SurrealConfig;

use crate::error::ConfigError;

/// Fully resolved migration settings.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source: SourceConfig,

    /// Document store. Not needed for dry runs.
    pub target: Option<SurrealConfig>,

    /// Write into an in-process store instead of the target
    pub dry_run: bool,

    /// Where to write the JSON run report
    pub report_path: Option<PathBuf>,

    /// Directory for the rolling log file
    pub log_dir: Option<PathBuf>,
}

/// Where legacy records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    /// Relational database
    MySql(MySqlSourceConfig),
    /// Directory with one `<table>.json` array per legacy table
    JsonDir(PathBuf),
}

#[derive(Clone, PartialEq, Eq)]
pub struct MySqlSourceConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl std::fmt::Debug for MySqlSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlSourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// Shape of the optional TOML config file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source: FileSourceConfig,
    pub target: FileTargetConfig,
    pub dry_run: Option<bool>,
    pub report_path: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSourceConfig {
    pub json_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileTargetConfig {
    pub url: Option<String>,
    pub namespace: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

const DEFAULT_MYSQL_HOST: &str = "localhost";
const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_MYSQL_USER: &str = "root";

impl MigrationConfig {
    /// Load from the process environment, honouring `MIGRATE_CONFIG`.
    pub async fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var("MIGRATE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Some(load_file(Path::new(&path)).await?),
            _ => None,
        };
        Self::resolve(file.unwrap_or_default(), |key| std::env::var(key).ok())
    }

    /// Merge file values with a key lookup (the environment in production).
    pub fn resolve(
        file: FileConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let dry_run = match get("MIGRATE_DRY_RUN") {
            Some(value) => parse_bool("MIGRATE_DRY_RUN", &value)?,
            None => file.dry_run.unwrap_or(false),
        };

        let json_dir = get("LEGACY_JSON_DIR")
            .map(PathBuf::from)
            .or(file.source.json_dir);

        let source = match json_dir {
            Some(dir) => SourceConfig::JsonDir(dir),
            None => {
                let port = match get("LEGACY_DB_PORT") {
                    Some(value) => value.trim().parse::<u16>().map_err(|e| {
                        ConfigError::Invalid {
                            key: "LEGACY_DB_PORT",
                            value,
                            reason: e.to_string(),
                        }
                    })?,
                    None => file.source.port.unwrap_or(DEFAULT_MYSQL_PORT),
                };

                SourceConfig::MySql(MySqlSourceConfig {
                    host: get("LEGACY_DB_HOST")
                        .or(file.source.host)
                        .unwrap_or_else(|| DEFAULT_MYSQL_HOST.to_string()),
                    port,
                    user: get("LEGACY_DB_USER")
                        .or(file.source.user)
                        .unwrap_or_else(|| DEFAULT_MYSQL_USER.to_string()),
                    password: lookup("LEGACY_DB_PASSWORD")
                        .or(file.source.password)
                        .unwrap_or_default(),
                    database: get("LEGACY_DB_NAME")
                        .or(file.source.database)
                        .ok_or(ConfigError::Missing {
                            key: "LEGACY_DB_NAME",
                        })?,
                })
            }
        };

        let target = match get("TARGET_DB_URL").or(file.target.url) {
            Some(url) => {
                let mut target = SurrealConfig::new(url);
                if let Some(namespace) = get("TARGET_DB_NAMESPACE").or(file.target.namespace) {
                    target.namespace = namespace;
                }
                if let Some(database) = get("TARGET_DB_DATABASE").or(file.target.database) {
                    target.database = database;
                }
                target.username = get("TARGET_DB_USER").or(file.target.username);
                target.password = lookup("TARGET_DB_PASSWORD").or(file.target.password);
                Some(target)
            }
            None if dry_run => None,
            None => {
                return Err(ConfigError::Missing {
                    key: "TARGET_DB_URL",
                });
            }
        };

        Ok(Self {
            source,
            target,
            dry_run,
            report_path: get("MIGRATE_REPORT_PATH")
                .map(PathBuf::from)
                .or(file.report_path),
            log_dir: get("MIGRATE_LOG_DIR").map(PathBuf::from).or(file.log_dir),
        })
    }
}

/// Load the TOML config file.
pub async fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|cause| ConfigError::File {
            path: path.to_path_buf(),
            cause,
        })?;

    toml::from_str(&content).map_err(|cause| ConfigError::Parse {
        path: path.to_path_buf(),
        cause,
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_mysql_source_with_defaults() {
        let config = MigrationConfig::resolve(
            FileConfig::default(),
            env(&[
                ("LEGACY_DB_NAME", "shop"),
                ("TARGET_DB_URL", "ws://localhost:8000"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.source,
            SourceConfig::MySql(MySqlSourceConfig {
                host: "localhost".to_string(),
                port: 3306,
                user: "root".to_string(),
                password: String::new(),
                database: "shop".to_string(),
            })
        );
        let target = config.target.unwrap();
        assert_eq!(target.url, "ws://localhost:8000");
        assert_eq!(target.namespace, "storefront");
        assert!(target.username.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_json_dir_takes_precedence() {
        let config = MigrationConfig::resolve(
            FileConfig::default(),
            env(&[
                ("LEGACY_JSON_DIR", "/data/export"),
                ("LEGACY_DB_NAME", "shop"),
                ("TARGET_DB_URL", "ws://localhost:8000"),
            ]),
        )
        .unwrap();
        assert_eq!(
            config.source,
            SourceConfig::JsonDir(PathBuf::from("/data/export"))
        );
    }

    #[test]
    fn test_missing_database_name() {
        let err = MigrationConfig::resolve(
            FileConfig::default(),
            env(&[("TARGET_DB_URL", "ws://localhost:8000")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "LEGACY_DB_NAME"
            }
        ));
    }

    #[test]
    fn test_target_required_unless_dry_run() {
        let err = MigrationConfig::resolve(
            FileConfig::default(),
            env(&[("LEGACY_JSON_DIR", "/data")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "TARGET_DB_URL"
            }
        ));

        let config = MigrationConfig::resolve(
            FileConfig::default(),
            env(&[("LEGACY_JSON_DIR", "/data"), ("MIGRATE_DRY_RUN", "yes")]),
        )
        .unwrap();
        assert!(config.dry_run);
        assert!(config.target.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let err = MigrationConfig::resolve(
            FileConfig::default(),
            env(&[
                ("LEGACY_DB_NAME", "shop"),
                ("LEGACY_DB_PORT", "three"),
                ("TARGET_DB_URL", "ws://localhost:8000"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "LEGACY_DB_PORT",
                ..
            }
        ));

        let err = MigrationConfig::resolve(
            FileConfig::default(),
            env(&[("LEGACY_JSON_DIR", "/data"), ("MIGRATE_DRY_RUN", "sometimes")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "MIGRATE_DRY_RUN",
                ..
            }
        ));
    }

    #[test]
    fn test_environment_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            report_path = "report.json"

            [source]
            host = "db.internal"
            port = 3307
            database = "legacy_shop"

            [target]
            url = "ws://file:8000"
            namespace = "shop"
            "#,
        )
        .unwrap();

        let config = MigrationConfig::resolve(
            file,
            env(&[
                ("LEGACY_DB_HOST", "db.override"),
                ("TARGET_DB_DATABASE", "prod"),
            ]),
        )
        .unwrap();

        let SourceConfig::MySql(mysql) = &config.source else {
            panic!("expected MySQL source");
        };
        assert_eq!(mysql.host, "db.override");
        assert_eq!(mysql.port, 3307);
        assert_eq!(mysql.database, "legacy_shop");

        let target = config.target.unwrap();
        assert_eq!(target.url, "ws://file:8000");
        assert_eq!(target.namespace, "shop");
        assert_eq!(target.database, "prod");
        assert_eq!(config.report_path, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn test_file_rejects_unknown_keys() {
        let parsed: Result<FileConfig, _> = toml::from_str("sources = 1");
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_load_file_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_file(&dir.path().join("absent.toml")).await.unwrap_err();
        assert!(matches!(missing, ConfigError::File { .. }));

        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "dry_run = [").unwrap();
        let bad = load_file(&path).await.unwrap_err();
        assert!(matches!(bad, ConfigError::Parse { .. }));
    }
}
