//! Veilpool Configuration
//!
//! Shared configuration crate for all Veilpool components.
//!
//! Handles loading configuration from:
//! 1. VP_CONFIG env var (explicit path)
//! 2. ./config.toml (current directory)
//! 3. ~/.veilpool/config.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::{env, fs};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<VeilpoolConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_NAME: &str = ".veilpool";

// ============================================================================
// Default Constants
// ============================================================================

/// 0.0001 of the asset at 9 decimals
const DEFAULT_MIN_WITHDRAWAL: u64 = 100_000;
/// 10 of the asset at 9 decimals
const DEFAULT_MAX_DEPOSIT: u64 = 10_000_000_000;
const DEFAULT_TREE_HEIGHT: usize = 20;
const DEFAULT_ROOT_HISTORY_SIZE: usize = 100;
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VeilpoolConfig {
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

/// Economic safety bounds and custodied asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal: u64,
    #[serde(default = "default_max_deposit")]
    pub max_deposit: u64,
    /// Hex-encoded 32-byte asset identifier
    #[serde(default = "default_asset")]
    pub asset: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_withdrawal: DEFAULT_MIN_WITHDRAWAL,
            max_deposit: DEFAULT_MAX_DEPOSIT,
            asset: default_asset(),
        }
    }
}

fn default_min_withdrawal() -> u64 {
    DEFAULT_MIN_WITHDRAWAL
}

fn default_max_deposit() -> u64 {
    DEFAULT_MAX_DEPOSIT
}

fn default_asset() -> String {
    hex::encode([0x11u8; 32])
}

/// Accumulator dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_tree_height")]
    pub height: usize,
    #[serde(default = "default_root_history_size")]
    pub root_history_size: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            height: DEFAULT_TREE_HEIGHT,
            root_history_size: DEFAULT_ROOT_HISTORY_SIZE,
        }
    }
}

fn default_tree_height() -> usize {
    DEFAULT_TREE_HEIGHT
}

fn default_root_history_size() -> usize {
    DEFAULT_ROOT_HISTORY_SIZE
}

/// Bridge adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Hex-encoded 32-byte escrow account funding bridged deposits
    #[serde(default = "default_escrow")]
    pub escrow: String,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            escrow: default_escrow(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn default_escrow() -> String {
    hex::encode([0x22u8; 32])
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

/// Feature flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Accept any well-formed proof (dev/test only)
    #[serde(default)]
    pub mock_verifier: bool,
    /// Path to the 2-input circuit verifying key
    #[serde(default)]
    pub small_vk_path: Option<String>,
    /// Path to the 16-input circuit verifying key
    #[serde(default)]
    pub large_vk_path: Option<String>,
}

// ============================================================================
// Environment Variable Helpers
// ============================================================================

/// Set field from env var if present
fn env_string(key: &str, field: &mut String) {
    if let Ok(v) = env::var(key) {
        *field = v;
    }
}

/// Set Option<String> from env var if present
fn env_option_string(key: &str, field: &mut Option<String>) {
    if let Ok(v) = env::var(key) {
        *field = Some(v);
    }
}

/// Set field from env var if present and parseable
fn env_parse<T: std::str::FromStr>(key: &str, field: &mut T) {
    if let Ok(v) = env::var(key) {
        if let Ok(parsed) = v.parse() {
            *field = parsed;
        }
    }
}

/// Check if env var is set to a truthy value ("1" or "true")
fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl VeilpoolConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                log::info!("Loading config from: {}", path.display());
                let contents = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            None => {
                log::info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check VP_CONFIG env var
        if let Ok(path) = env::var("VP_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./config.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.veilpool/config.toml
        dirs::home_dir()
            .map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Pool
        env_parse("VP_MIN_WITHDRAWAL", &mut self.pool.min_withdrawal);
        env_parse("VP_MAX_DEPOSIT", &mut self.pool.max_deposit);
        env_string("VP_ASSET", &mut self.pool.asset);

        // Tree
        env_parse("VP_TREE_HEIGHT", &mut self.tree.height);
        env_parse("VP_ROOT_HISTORY_SIZE", &mut self.tree.root_history_size);

        // Bridge
        env_string("VP_BRIDGE_ESCROW", &mut self.bridge.escrow);
        env_parse("VP_CHANNEL_CAPACITY", &mut self.bridge.channel_capacity);

        // Features
        if let Some(v) = env_bool("VP_MOCK_VERIFIER") {
            self.features.mock_verifier = v;
        }
        env_option_string("VP_SMALL_VK", &mut self.features.small_vk_path);
        env_option_string("VP_LARGE_VK", &mut self.features.large_vk_path);
    }

    /// Decode the configured asset id
    pub fn asset_bytes(&self) -> Result<[u8; 32]> {
        decode_hex32(&self.pool.asset).context("invalid [pool].asset")
    }

    /// Decode the configured escrow account
    pub fn escrow_bytes(&self) -> Result<[u8; 32]> {
        decode_hex32(&self.bridge.escrow).context("invalid [bridge].escrow")
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        let mut sample = Self::default();
        sample.features.mock_verifier = true;
        toml::to_string_pretty(&sample).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    ///
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static VeilpoolConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                log::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Try to get the global config instance.
    ///
    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static VeilpoolConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Initialize the global config with a specific instance.
    ///
    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: VeilpoolConfig) -> Result<(), VeilpoolConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

fn decode_hex32(s: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(s).context("not valid hex")?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("expected 32 bytes"))?;
    Ok(arr)
}

/// Shorthand for `VeilpoolConfig::global()`.
#[inline]
pub fn global_config() -> &'static VeilpoolConfig {
    VeilpoolConfig::global()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VeilpoolConfig::default();
        assert_eq!(config.pool.min_withdrawal, DEFAULT_MIN_WITHDRAWAL);
        assert_eq!(config.pool.max_deposit, DEFAULT_MAX_DEPOSIT);
        assert_eq!(config.tree.height, DEFAULT_TREE_HEIGHT);
        assert_eq!(config.tree.root_history_size, DEFAULT_ROOT_HISTORY_SIZE);
        assert!(!config.features.mock_verifier);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [pool]
            min_withdrawal = 500
            max_deposit = 1000000

            [tree]
            height = 16
        "#;

        let config: VeilpoolConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pool.min_withdrawal, 500);
        assert_eq!(config.pool.max_deposit, 1_000_000);
        assert_eq!(config.tree.height, 16);
        // Unspecified sections fall back to defaults
        assert_eq!(config.tree.root_history_size, DEFAULT_ROOT_HISTORY_SIZE);
        assert_eq!(config.bridge.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_asset_roundtrip() {
        let config = VeilpoolConfig::default();
        let asset = config.asset_bytes().unwrap();
        assert_eq!(asset, [0x11u8; 32]);
    }

    #[test]
    fn test_bad_asset_hex() {
        let mut config = VeilpoolConfig::default();
        config.pool.asset = "zz".into();
        assert!(config.asset_bytes().is_err());
    }

    #[test]
    fn test_sample_parses() {
        let sample = VeilpoolConfig::generate_sample();
        let parsed: VeilpoolConfig = toml::from_str(&sample).unwrap();
        assert!(parsed.features.mock_verifier);
    }
}
