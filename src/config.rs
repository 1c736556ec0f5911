use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

pub const AUTH_FILENAME: &str = ".powerwall.auth";
pub const SITE_FILENAME: &str = ".powerwall.site";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub tesla: TeslaConfig,
    pub chords: ChordsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeslaConfig {
    pub owner_email: String,
    /// IANA zone name, e.g. "America/Denver".
    pub timezone: String,
    /// Directory holding the auth and site credential files.
    pub credentials_path: PathBuf,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
    #[serde(default = "default_avg_count")]
    pub avg_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChordsConfig {
    pub instrument_id: u32,
    pub api_email: String,
    pub api_key: String,
    pub chords_host: String,
    #[serde(default = "default_max_queue_length")]
    pub max_queue_length: usize,
}

fn default_poll_secs() -> u64 {
    60
}

fn default_avg_count() -> u32 {
    5
}

// A month of one-minute records.
fn default_max_queue_length() -> usize {
    31 * 24 * 60
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;
    Ok(config)
}

/// Cloud credentials for one owner account, resolved from the two files
/// under `credentials_path`. Both files are JSON maps keyed by owner email.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_token: String,
    pub site_host: String,
}

#[derive(Debug, Deserialize)]
struct AuthEntry {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct SiteEntry {
    site_host: String,
}

/// Load the account's access token and site host. Either file missing or
/// unreadable is a fatal startup error surfaced to the caller.
pub fn load_credentials(credentials_path: &Path, owner_email: &str) -> Result<Credentials> {
    let auth_path = credentials_path.join(AUTH_FILENAME);
    let site_path = credentials_path.join(SITE_FILENAME);

    let auth_content = fs::read_to_string(&auth_path)
        .with_context(|| format!("Failed to read {}", auth_path.display()))?;
    let site_content = fs::read_to_string(&site_path)
        .with_context(|| format!("Failed to read {}", site_path.display()))?;

    let mut auth: HashMap<String, AuthEntry> = serde_json::from_str(&auth_content)
        .with_context(|| format!("Failed to parse {}", auth_path.display()))?;
    let mut site: HashMap<String, SiteEntry> = serde_json::from_str(&site_content)
        .with_context(|| format!("Failed to parse {}", site_path.display()))?;

    let auth_entry = auth
        .remove(owner_email)
        .with_context(|| format!("No access token for {} in {}", owner_email, auth_path.display()))?;
    let site_entry = site
        .remove(owner_email)
        .with_context(|| format!("No site entry for {} in {}", owner_email, site_path.display()))?;

    Ok(Credentials {
        access_token: auth_entry.access_token,
        site_host: site_entry.site_host,
    })
}
