use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{find_config_file, read_config, read_config_from};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    admin: Option<AdminSeed>,
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
}

/// Credentials of the admin account created on startup when it is missing.
#[derive(Debug, Deserialize)]
pub struct AdminSeed {
    username: String,
    password: String,
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    let config: Self = toml::from_slice(&bytes)?;
                    Ok(config)
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

    #[inline]
    pub fn admin(&self) -> Option<&AdminSeed> {
        self.admin.as_ref()
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

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }
}

impl AdminSeed {
    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
        assert!(config.app().docs());
    }

    #[test]
    fn parse_without_admin_and_docs() {
        let raw = r#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/courses"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.host().bindto(), "0.0.0.0:8080");
        assert_eq!(config.app().jwt(), "secret");
        assert!(!config.app().docs());
        assert!(config.admin().is_none());
    }

    #[test]
    fn parse_admin_seed() {
        let raw = r#"
            [host]
            bindto = "127.0.0.1:5000"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/courses"
            docs = true

            [admin]
            username = "root"
            password = "toor"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        let admin = config.admin().unwrap();
        assert_eq!(admin.username(), "root");
        assert_eq!(admin.password(), "toor");
    }
}
