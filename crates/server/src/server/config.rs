use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Directory holding uploaded project archives and their staged copies.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// Named docker volume mounted into benchmark containers at the uploads
    /// path, so a container sees the same staged files the server does.
    #[serde(default = "default_uploads_volume")]
    pub uploads_volume: String,

    /// Ingestion endpoint handed to benchmark containers as METRICS_API_URL.
    #[serde(default = "default_metrics_api_url")]
    pub metrics_api_url: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Hard bound on one benchmark run, in seconds. 0 disables the bound and
    /// restores the unbounded behavior (a hung benchmark then holds the
    /// single-flight permit until the server restarts).
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// When a benchmarked process does not self-report, write a minimal
    /// derived result after a successful run.
    #[serde(default)]
    pub synthesize_fallback_result: bool,

    /// Logical runtime -> container image overrides, merged over the
    /// built-in registry defaults. File-only; not settable via environment.
    #[serde(default)]
    pub runtimes: HashMap<String, String>,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    listen_address: Option<String>,
    database_url: Option<String>,
    uploads_dir: Option<String>,
    uploads_volume: Option<String>,
    metrics_api_url: Option<String>,
    log_dir: Option<String>,
    run_timeout_secs: Option<u64>,
    synthesize_fallback_result: Option<bool>,
    runtimes: Option<HashMap<String, String>>,
}

fn default_listen_address() -> String {
    "0.0.0.0:5002".to_string()
}

fn default_database_url() -> String {
    "sqlite://benchforge.db?mode=rwc".to_string()
}

fn default_uploads_dir() -> String {
    "/app/dist/uploads".to_string()
}

fn default_uploads_volume() -> String {
    "benchforge_uploads_volume".to_string()
}

fn default_metrics_api_url() -> String {
    "http://localhost:5003/api/benchmarks".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_run_timeout_secs() -> u64 {
    600
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file, file overrides defaults
        Ok(ServerConfig {
            listen_address: env_config
                .listen_address
                .or(file_config.listen_address)
                .unwrap_or_else(default_listen_address),
            database_url: env_config
                .database_url
                .or(file_config.database_url)
                .unwrap_or_else(default_database_url),
            uploads_dir: env_config
                .uploads_dir
                .or(file_config.uploads_dir)
                .unwrap_or_else(default_uploads_dir),
            uploads_volume: env_config
                .uploads_volume
                .or(file_config.uploads_volume)
                .unwrap_or_else(default_uploads_volume),
            metrics_api_url: env_config
                .metrics_api_url
                .or(file_config.metrics_api_url)
                .unwrap_or_else(default_metrics_api_url),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            run_timeout_secs: env_config
                .run_timeout_secs
                .or(file_config.run_timeout_secs)
                .unwrap_or_else(default_run_timeout_secs),
            synthesize_fallback_result: env_config
                .synthesize_fallback_result
                .or(file_config.synthesize_fallback_result)
                .unwrap_or(false),
            runtimes: file_config.runtimes.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let config = ServerConfig::load(None).unwrap();
        assert_eq!(config.listen_address, "0.0.0.0:5002");
        assert_eq!(config.run_timeout_secs, 600);
        assert!(!config.synthesize_fallback_result);
        assert!(config.runtimes.is_empty());
    }

    #[test]
    fn file_values_and_runtime_overrides_are_read() {
        let dir = std::env::temp_dir().join("benchforge-config-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(
            &path,
            r#"
listen_address = "127.0.0.1:9000"
run_timeout_secs = 30

[runtimes]
node20 = "custom-node20-image"
"#,
        )
        .unwrap();

        let config = ServerConfig::load(path.to_str()).unwrap();
        assert_eq!(config.listen_address, "127.0.0.1:9000");
        assert_eq!(config.run_timeout_secs, 30);
        assert_eq!(config.runtimes["node20"], "custom-node20-image");
    }
}
