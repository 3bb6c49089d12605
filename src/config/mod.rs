use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config};

mod error;
pub use error::{ConfigError, ConfigResult};

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_uploads_dir")]
    uploads_dir: PathBuf,
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

impl Config {
    /// Parses a config from raw TOML bytes.
    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(toml::from_str(text)?)
    }

    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    Self::from_slice(&bytes)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        if !matches!(e, error::ConfigError::ConfigNotFound) {
                            crate::error::log_error(&e);
                        }
                        tracing::error!("Config not found.");
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    /// Whether Swagger UI is mounted.
    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
    }

    #[test]
    fn optional_app_keys_fall_back() {
        let config = Config::from_slice(
            br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/lms"
            "#,
        )
        .unwrap();

        assert!(!config.app().docs());
        assert_eq!(config.app().uploads_dir(), Path::new("uploads"));
        assert_eq!(config.app().jwt(), "secret");
    }

    #[test]
    fn missing_section_is_rejected() {
        let result = Config::from_slice(b"[host]\nbindto = \"127.0.0.1:1\"\n");
        assert!(matches!(result, Err(ConfigError::TomlDeError(_))));
    }
}
