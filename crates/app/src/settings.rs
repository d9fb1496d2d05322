//! Handles settings for the application. Configuration is read from
//! `settings.toml` (or the file passed with `--config`) and can be
//! overridden with `EXPENSE__<SECTION>__<KEY>` environment variables.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Default, Deserialize)]
pub struct Uploads {
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Ledger {
    pub max_conflict_retries: u32,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub uploads: Uploads,
    pub ledger: Ledger,
}

const DEFAULTS: &str = r#"
[app]
level = "info"

[server]
port = 3000
database = "memory"

[ledger]
max_conflict_retries = 3
"#;

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("EXPENSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_file() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.database, Database::Memory);
        assert_eq!(settings.uploads.dir, None);
        assert_eq!(settings.ledger.max_conflict_retries, 3);
    }

    #[test]
    fn file_overrides_defaults() {
        let settings = Settings::from_toml(
            r#"
            [app]
            level = "debug"

            [server]
            bind = "0.0.0.0"
            port = 8080
            database = { sqlite = "ledger.db" }

            [uploads]
            dir = "uploads"
            "#,
        )
        .unwrap();

        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(settings.server.port, 8080);
        assert_eq!(
            settings.server.database,
            Database::Sqlite("ledger.db".to_string())
        );
        assert_eq!(settings.uploads.dir.as_deref(), Some("uploads"));
    }
}
