use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const CONFIG_DIR_PREFIX: &str = "sheets-importer";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    pub google: GoogleConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Where Google sends the user back after consent. Must match the URI
    /// registered for the OAuth client, or every exchange fails.
    pub redirect_uri: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Browser origin allowed to call the API with credentials.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found at {:?}. Please create one.",
                config_path
            )));
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))?;

        if config.google.client_id.is_empty() || config.google.client_secret.is_empty() {
            return Err(AppError::Config(
                "Google client_id and client_secret must be set in config file".to_string(),
            ));
        }

        if config.google.redirect_uri.is_empty() {
            return Err(AppError::Config(
                "Google redirect_uri must be set in config file".to_string(),
            ));
        }

        Ok(config)
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = Config {
            google: GoogleConfig {
                client_id: "test_client_id".to_string(),
                client_secret: "test_client_secret".to_string(),
                redirect_uri: "http://localhost:5173/auth/callback".to_string(),
            },
            server: ServerConfig::default(),
        };

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.google.client_id, deserialized.google.client_id);
        assert_eq!(config.google.redirect_uri, deserialized.google.redirect_uri);
        assert_eq!(config.server.port, deserialized.server.port);
    }

    #[test]
    fn test_server_section_is_optional() {
        let contents = r#"
            [google]
            client_id = "id"
            client_secret = "secret"
            redirect_uri = "http://localhost:5173/auth/callback"
        "#;

        let config: Config = toml::from_str(contents).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.cors_origin, "http://localhost:5173");
    }

    #[test]
    fn test_partial_server_section() {
        let contents = r#"
            [google]
            client_id = "id"
            client_secret = "secret"
            redirect_uri = "http://localhost:5173/auth/callback"

            [server]
            port = 8080
        "#;

        let config: Config = toml::from_str(contents).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origin, "http://localhost:5173");
    }
}
