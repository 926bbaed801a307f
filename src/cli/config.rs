use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::harvest::{ExtractionFlags, DEFAULT_MAX_SITES};
use crate::net::fetch::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::net::localities::DEFAULT_LOCALITIES_ENDPOINT;
use crate::net::search::DEFAULT_SEARCH_ENDPOINT;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HarvesterConfig {
    pub http: HttpSettings,
    pub search: SearchSettings,
    pub localities: LocalitySettings,

    /// Categories extracted when none is given on the command line
    pub extraction: ExtractionFlags,
}

/// Settings shared by every outgoing request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub timeout_secs: u64,
}

/// Search collaborator settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: String,

    /// Candidate sites taken from each search
    pub max_sites: usize,
}

/// Municipality directory settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LocalitySettings {
    /// Base of the IBGE localities API, `/{UF}/municipios` is appended
    pub endpoint: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            max_sites: DEFAULT_MAX_SITES,
        }
    }
}

impl Default for LocalitySettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOCALITIES_ENDPOINT.to_string(),
        }
    }
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            http: HttpSettings::default(),
            search: SearchSettings::default(),
            localities: LocalitySettings::default(),
            extraction: ExtractionFlags {
                email: true,
                phone: true,
                ..Default::default()
            },
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl HarvesterConfig {
    /// Get the path to the config directory
    fn config_dir() -> PathBuf {
        let path = if let Some(proj_dirs) =
            directories::ProjectDirs::from("com", "contact-harvester", "contact-harvester")
        {
            proj_dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("./config")
        };

        let profiles = path.join("profiles");
        if !profiles.exists() {
            if let Err(e) = fs::create_dir_all(&profiles) {
                error!("Failed to create config directory: {}", e);
            }
        }

        path
    }

    fn profile_path(profile: &str) -> PathBuf {
        Self::config_dir()
            .join("profiles")
            .join(format!("{}.yaml", profile))
    }

    /// Load the default configuration
    pub fn load_default() -> Result<Self> {
        let config_path = Self::config_dir().join("default.yaml");

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            info!("Default configuration not found. Creating...");
            let config = Self::default();
            config.save_as_default()?;
            Ok(config)
        }
    }

    /// Load a configuration profile
    pub fn load_profile(profile: &str) -> Result<Self> {
        let profile_path = Self::profile_path(profile);

        if profile_path.exists() {
            Self::load_from_file(&profile_path)
        } else {
            anyhow::bail!("Profile '{}' not found", profile)
        }
    }

    /// Profile when one is named, the default otherwise
    pub fn load(profile: Option<&str>) -> Result<Self> {
        match profile {
            Some(profile) => Self::load_profile(profile),
            None => Self::load_default(),
        }
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());

        let contents = fs::read_to_string(path)
            .context(format!("Failed to read configuration file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .context(format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save the configuration as the default
    pub fn save_as_default(&self) -> Result<()> {
        self.save_to_file(&Self::config_dir().join("default.yaml"))
    }

    /// Save the configuration as a profile
    pub fn save_as_profile(&self, profile: &str) -> Result<()> {
        self.save_to_file(&Self::profile_path(profile))
    }

    /// Save the configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        debug!("Saving configuration to: {}", path.display());

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .context(format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let contents = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        fs::write(path, contents)
            .context(format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// List all available profiles
    pub fn list_profiles() -> Result<Vec<String>> {
        list_yaml_stems(&Self::config_dir().join("profiles"))
    }
}

fn list_yaml_stems(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut profiles = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "yaml") {
            if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
                profiles.push(name.to_string());
            }
        }
    }
    profiles.sort();

    Ok(profiles)
}
