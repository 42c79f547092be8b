//! Service configuration: YAML file plus `APP__*` environment overrides.

use crate::error::ConfigError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Tracing filter directive, e.g. `info` or `starter_kit=debug`.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
    /// `stdout` or `stderr`.
    pub output: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
            output: "stdout".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub master: PoolConfig,
    pub replica: PoolConfig,
    /// Pin reads to one instance instead of default routing.
    #[serde(default)]
    pub fixed_read_instance: ReadInstance,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub host: String,
    #[serde(default = "default_pg_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_pg_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_idle_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadInstance {
    Master,
    #[serde(alias = "slave")]
    Replica,
    #[default]
    #[serde(other)]
    Default,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: 3600,
        }
    }
}

impl Config {
    /// Load from `configs/config.yaml` or `config.yaml` (either optional),
    /// then apply `APP__*` environment overrides (e.g.
    /// `APP__POSTGRES__MASTER__HOST`). A `.env` file is read first if present.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let settings = config::Config::builder()
            .add_source(config::File::with_name("configs/config").required(false))
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        settings
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let cfg = from_yaml(
            r#"
postgres:
  master:
    host: localhost
    user: app
    password: secret
    database: app
  replica:
    host: replica.internal
    user: app
    password: secret
    database: app
"#,
        );
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.postgres.master.port, 5432);
        assert_eq!(cfg.postgres.master.max_connections, 10);
        assert_eq!(cfg.postgres.fixed_read_instance, ReadInstance::Default);
    }

    #[test]
    fn fixed_read_instance_parses_aliases() {
        let yaml = |v: &str| {
            format!(
                r#"
postgres:
  fixed_read_instance: {v}
  master: {{ host: h, user: u, password: p, database: d }}
  replica: {{ host: h, user: u, password: p, database: d }}
"#
            )
        };
        assert_eq!(
            from_yaml(&yaml("master")).postgres.fixed_read_instance,
            ReadInstance::Master
        );
        assert_eq!(
            from_yaml(&yaml("slave")).postgres.fixed_read_instance,
            ReadInstance::Replica
        );
        assert_eq!(
            from_yaml(&yaml("anything-else")).postgres.fixed_read_instance,
            ReadInstance::Default
        );
    }
}
