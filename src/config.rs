use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use toml;

use crate::error::{Error, Result};
use crate::osu::data::RankStatus;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const PLACEHOLDER_PREFIX: &str = "your_";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub osu: OsuConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub http: HttpConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct OsuConfig {
    pub client_id: String,
    pub client_secret: String,
    pub api_base: String,
    pub download_base: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub mode: u8,
    pub keys: u8,
    pub statuses: Vec<RankStatus>,
    pub page_delay_secs: u64,
    pub max_pages: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: 3,
            keys: 4,
            statuses: vec![RankStatus::Loved],
            page_delay_secs: 5,
            max_pages: None,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub list_path: String,
    pub download: bool,
    pub download_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            list_path: "beatmapsets.txt".to_string(),
            download: false,
            download_dir: "songs".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("mapset-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl OsuConfig {
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        let overrides: [(&str, &mut String); 4] = [
            ("USER_ID", &mut self.client_id),
            ("API_SECRET", &mut self.client_secret),
            ("API_BASE", &mut self.api_base),
            ("DOWNLOAD_BASE", &mut self.download_base),
        ];
        for (key, field) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value.trim().to_string();
            }
        }
    }

    fn validate(&self, needs_download: bool) -> Result<()> {
        require("USER_ID (osu.client_id)", &self.client_id)?;
        require("API_SECRET (osu.client_secret)", &self.client_secret)?;
        require("API_BASE (osu.api_base)", &self.api_base)?;
        if needs_download {
            require("DOWNLOAD_BASE (osu.download_base)", &self.download_base)?;
        }
        Ok(())
    }
}

impl Config {
    fn validate(&self) -> Result<()> {
        self.osu.validate(self.output.download)?;
        if self.search.statuses.is_empty() {
            return Err(Error::Config("search.statuses must name at least one status".into()));
        }
        if self.search.max_pages == Some(0) {
            return Err(Error::Config("search.max_pages must be at least 1".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be greater than 0".into()));
        }
        Ok(())
    }
}

fn require(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config(format!("missing value for {}", key)));
    }
    if value.starts_with(PLACEHOLDER_PREFIX) {
        return Err(Error::Config(format!("{} still holds the template placeholder", key)));
    }
    Ok(())
}

fn template() -> Config {
    Config {
        osu: OsuConfig {
            client_id: "your_osu_client_id".to_string(),
            client_secret: "your_osu_client_secret".to_string(),
            api_base: "https://osu.ppy.sh".to_string(),
            download_base: "your_download_mirror".to_string(),
        },
        ..Config::default()
    }
}

pub fn load_config() -> Result<Config> {
    dotenv::dotenv().ok();
    let config_path =
        env::var("MAPSET_SYNC_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(Path::new(&config_path), |key| env::var(key).ok())
}

/// Reads `path` (if present) and layers the environment on top of it.
pub fn load_config_from(
    config_path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let file_exists = config_path.exists();

    let mut config = if file_exists {
        let config_str = fs::read_to_string(config_path)?;
        toml::from_str(&config_str)?
    } else {
        Config::default()
    };
    config.osu.apply_env(&lookup);

    if !file_exists && config.validate().is_err() {
        let toml_string = toml::to_string_pretty(&template())?;
        fs::write(config_path, toml_string)?;

        return Err(Error::Config(format!(
            "Configuration file not found. A default '{}' has been created. Please update it with your credentials.",
            config_path.display()
        )));
    }

    config.osu.api_base = config.osu.api_base.trim_end_matches('/').to_string();
    config.validate()?;
    Ok(config)
}
