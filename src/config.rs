use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "agora", about = "Debug console for the Agora social platform")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Notification WebSocket URL
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tail the live notification stream (default)
    Tail,
    /// Print the currently logged-in user
    Whoami,
    /// Log in and persist the access token
    Login {
        username: String,
        password: String,
    },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub stream: StreamSection,
    pub auth: AuthSection,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StreamSection {
    pub url: String,
    pub ping_interval_secs: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AuthSection {
    pub token_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
        }
    }
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws/notifications/".to_string(),
            ping_interval_secs: 30,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref base_url) = cli.base_url {
            config.api.base_url = base_url.clone();
        }
        if let Some(ref ws_url) = cli.ws_url {
            config.stream.url = ws_url.clone();
        }

        // Resolve paths relative to data dir
        if config.auth.token_path.is_none() {
            config.auth.token_path = Some(data_dir.join("token"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .expect("Could not determine home directory")
                .join(".agora")
        })
    }

    pub fn token_path(&self) -> &PathBuf {
        self.auth
            .token_path
            .as_ref()
            .expect("token path resolved during load")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config,
            base_url: None,
            ws_url: None,
            data_dir,
            command: None,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.stream.url, "ws://localhost:8000/ws/notifications/");
        assert_eq!(config.stream.ping_interval_secs, 30);
        assert!(config.auth.token_path.is_none());
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli(None, Some(PathBuf::from("/tmp/test-agora")));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-agora"));
    }

    #[test]
    fn data_dir_defaults_to_home_dot_agora() {
        let cli = cli(None, None);
        let dir = Config::data_dir(&cli);
        assert!(dir.ends_with(".agora"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = cli(None, Some(tmp.path().to_path_buf()));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000/api");
        assert_eq!(config.token_path(), &tmp.path().join("token"));
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[api]
base_url = "https://agora.example/api"

[stream]
url = "wss://agora.example/ws/notifications/"
ping_interval_secs = 15
"#,
        )
        .unwrap();

        let cli = cli(Some(config_path), Some(tmp.path().to_path_buf()));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.api.base_url, "https://agora.example/api");
        assert_eq!(config.stream.url, "wss://agora.example/ws/notifications/");
        assert_eq!(config.stream.ping_interval_secs, 15);
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[api]
base_url = "https://agora.example/api"
"#,
        )
        .unwrap();

        let mut cli = cli(Some(config_path), Some(tmp.path().to_path_buf()));
        cli.base_url = Some("http://127.0.0.1:9000/api".to_string());
        cli.ws_url = Some("ws://127.0.0.1:9000/ws/".to_string());
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.stream.url, "ws://127.0.0.1:9000/ws/");
    }
}
