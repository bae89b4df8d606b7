use std::{fs, net::SocketAddr, path::{Path, PathBuf}};
use serde::{Serialize, Deserialize};
use toml;
use anyhow::{self, Context};

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the storage area
    pub path: PathBuf
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: SocketAddr,
    /// Directory of static front-end assets, served for unmatched paths
    #[serde(default)]
    pub static_dir: Option<PathBuf>
}

impl ServerConfig {
    fn default_bind() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 3000))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { bind: ServerConfig::default_bind(), static_dir: None }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig
}

impl AppConfig {
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(content)
            .with_context(|| "failed to parse config file")?;
        return Ok(config);
    }

    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_content = fs::read_to_string(filepath)
            .with_context(|| "failed to read config file")?;
        return AppConfig::parse(&file_content);
    }
}
