use beacon_time::ChainParams;
use beacon_time::Slot;
use serde::Deserialize;
use std::time::Duration;

/// Top-level config file shape (spec §6 "Configuration"). Loaded from YAML;
/// every field has a conventional default except `database_url` and the
/// node URLs, which must be supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub database_url: String,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_format: Option<String>,
    pub chain: ChainPreset,
    pub consensus: ConsensusConfig,
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub max_unprocessed_epochs: Option<u64>,
    #[serde(default)]
    pub max_attestation_delay: Option<u32>,
    #[serde(default)]
    pub db_pool_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainPreset {
    Mainnet,
    Gnosis,
}

impl ChainPreset {
    pub fn params(self) -> ChainParams {
        match self {
            ChainPreset::Mainnet => ChainParams::MAINNET,
            ChainPreset::Gnosis => ChainParams::GNOSIS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusConfig {
    pub archive_url: String,
    pub full_url: String,
    #[serde(default = "default_concurrency")]
    pub archive_concurrency: usize,
    #[serde(default = "default_concurrency")]
    pub full_concurrency: usize,
    #[serde(default = "default_retries")]
    pub archive_retries: u32,
    #[serde(default = "default_retries")]
    pub full_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// `consensus.requestsPerSecond`, the upstream rate cap named in spec
    /// §6. Recorded for observability; actual throttling is done by the
    /// per-pool concurrency semaphores (see DESIGN.md).
    #[serde(default)]
    pub requests_per_second: Option<u32>,
    pub lookback_slot: u64,
    #[serde(default = "default_delay_slots_to_head")]
    pub delay_slots_to_head: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    pub url: String,
    #[serde(default)]
    pub backup_url: Option<String>,
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

fn default_concurrency() -> usize {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_delay_slots_to_head() -> u64 {
    1
}

impl FileConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
        serde_yaml::from_str(&contents).map_err(|e| format!("parsing {}: {e}", path.display()))
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.consensus.base_delay_ms)
    }

    pub fn lookback_slot(&self) -> Slot {
        Slot::new(self.consensus.lookback_slot)
    }
}
