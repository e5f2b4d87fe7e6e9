//! Umbra Configuration
//!
//! Shared configuration crate for all Umbra components.
//!
//! Handles loading configuration from:
//! 1. UMBRA_CONFIG env var (explicit path)
//! 2. ./umbra.toml (current directory)
//! 3. ~/.umbra/umbra.toml (user home)
//!
//! Environment variables take precedence over TOML config.

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, fs};
use tracing::{info, warn};

/// Global config instance for convenience access
pub static GLOBAL_CONFIG: OnceLock<UmbraConfig> = OnceLock::new();

const CONFIG_FILE_NAME: &str = "umbra.toml";
const CONFIG_DIR_NAME: &str = ".umbra";
const CONFIG_PATH_ENV: &str = "UMBRA_CONFIG";

// ============================================================================
// Default Constants
// ============================================================================

const DEFAULT_THRESHOLD_K: usize = 3;
const DEFAULT_THRESHOLD_N: usize = 5;
const DEFAULT_VERIFY_COMMITMENT: bool = true;

// ============================================================================
// Config Structs
// ============================================================================

/// Root configuration structure (matches TOML layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UmbraConfig {
    #[serde(default)]
    pub cipher: CipherConfig,
    #[serde(default)]
    pub committee: CommitteeTomlConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Note encryption settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherConfig {
    #[serde(default)]
    pub suite: CipherSuiteToml,
}

/// Note cipher suite for TOML config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherSuiteToml {
    #[default]
    #[serde(rename = "chacha20poly1305")]
    ChaCha20Poly1305,
    #[serde(rename = "hash-keystream")]
    HashKeystream,
}

impl FromStr for CipherSuiteToml {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chacha20poly1305" | "chacha20-poly1305" => Ok(Self::ChaCha20Poly1305),
            "hash-keystream" | "keystream" => Ok(Self::HashKeystream),
            other => Err(format!("unknown cipher suite: {other}")),
        }
    }
}

/// Decryption committee parameters (TOML format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeTomlConfig {
    #[serde(default = "default_threshold_k")]
    pub threshold_k: usize,
    #[serde(default = "default_threshold_n")]
    pub threshold_n: usize,
    #[serde(default)]
    pub epoch: u64,
}

impl Default for CommitteeTomlConfig {
    fn default() -> Self {
        Self {
            threshold_k: DEFAULT_THRESHOLD_K,
            threshold_n: DEFAULT_THRESHOLD_N,
            epoch: 0,
        }
    }
}

fn default_threshold_k() -> usize {
    DEFAULT_THRESHOLD_K
}
fn default_threshold_n() -> usize {
    DEFAULT_THRESHOLD_N
}

/// Wallet scanning settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_verify_commitment")]
    pub verify_commitment: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            verify_commitment: DEFAULT_VERIFY_COMMITMENT,
        }
    }
}

fn default_verify_commitment() -> bool {
    DEFAULT_VERIFY_COMMITMENT
}

// ============================================================================
// Override Helpers
// ============================================================================

/// Set field from the variable if present and parseable
fn parse_into<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, field: &mut T) {
    if let Some(v) = lookup(key) {
        match v.parse() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(key, value = %v, "ignoring unparseable override"),
        }
    }
}

/// Truthy values: "1" or "true"; anything else is false
fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    lookup(key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ============================================================================
// Implementation
// ============================================================================

impl UmbraConfig {
    /// Load configuration from config file with env var overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_file() {
            Some(path) => {
                info!("Loading config from: {}", path.display());
                Self::read_file(&path)?
            }
            None => {
                info!("No config file found, using defaults and environment variables");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Find the config file path
    fn find_config_file() -> Option<PathBuf> {
        // 1. Check UMBRA_CONFIG env var
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check ./umbra.toml (current directory)
        let local_path = PathBuf::from(CONFIG_FILE_NAME);
        if local_path.exists() {
            return Some(local_path);
        }

        // 3. Check ~/.umbra/umbra.toml
        Self::default_config_path().filter(|p| p.exists())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key/value source (the process environment
    /// in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        parse_into(&lookup, "UMBRA_CIPHER_SUITE", &mut self.cipher.suite);
        parse_into(&lookup, "UMBRA_THRESHOLD_K", &mut self.committee.threshold_k);
        parse_into(&lookup, "UMBRA_THRESHOLD_N", &mut self.committee.threshold_n);
        parse_into(&lookup, "UMBRA_COMMITTEE_EPOCH", &mut self.committee.epoch);
        if let Some(v) = parse_bool(&lookup, "UMBRA_SCAN_VERIFY_COMMITMENT") {
            self.scan.verify_commitment = v;
        }
    }

    /// Reject parameter combinations no component can run with
    pub fn validate(&self) -> Result<()> {
        let CommitteeTomlConfig {
            threshold_k: k,
            threshold_n: n,
            ..
        } = self.committee;
        ensure!(k >= 1, "committee threshold_k must be at least 1");
        ensure!(k <= n, "committee threshold_k ({k}) exceeds threshold_n ({n})");
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Generate a sample config file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Get the global config instance, initializing it if necessary.
    /// Falls back to defaults if loading fails.
    pub fn global() -> &'static UmbraConfig {
        GLOBAL_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                warn!("Failed to load config: {:#}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Returns `None` if config hasn't been initialized yet.
    pub fn try_global() -> Option<&'static UmbraConfig> {
        GLOBAL_CONFIG.get()
    }

    /// Returns `Err(config)` if already initialized.
    pub fn set_global(config: UmbraConfig) -> Result<(), UmbraConfig> {
        GLOBAL_CONFIG.set(config)
    }
}

/// Shorthand for `UmbraConfig::global()`.
#[inline]
pub fn global_config() -> &'static UmbraConfig {
    UmbraConfig::global()
}

// ============================================================================
// Tests
// ============================================================================
