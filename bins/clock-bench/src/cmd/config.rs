use std::time::Duration;

use clap::{Args, ValueEnum};
use serde::Deserialize;

use storage_memory::MemoryStoreConfig;
use storage_redis::RedisConfig;

use super::error::BenchError;

// ═══════════════════════════════════════════════════════════════
//  Enums shared by config file and CLI
// ═══════════════════════════════════════════════════════════════

/// How records are laid out in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One hash key holding one JSON sub-field per record (typed cache).
    Partitioned,
    /// One hash key per record, fields written by the record codec.
    PerRecord,
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Partitioned => f.write_str("partitioned"),
            Layout::PerRecord => f.write_str("per-record"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// In-process store, one namespace per layout.
    #[default]
    Memory,
    /// Redis-compatible server.
    Redis,
}

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub total: Option<usize>,
    pub batches: Option<u32>,
    pub lookups: Option<usize>,
    pub seed: Option<i64>,
    pub ttl_secs: Option<u64>,
    pub layouts: Option<Vec<Layout>>,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub per_record: PerRecordSection,
    #[serde(default)]
    pub partitioned: PartitionedSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: Backend,
    /// Prepended to every key the benchmark writes.
    #[serde(default)]
    pub key_prefix: String,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryStoreConfig,
}

fn default_per_record_database() -> u32 {
    6
}

fn default_record_key_prefix() -> String {
    "clock:".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerRecordSection {
    #[serde(default = "default_per_record_database")]
    pub database: u32,
    #[serde(default = "default_record_key_prefix")]
    pub key_prefix: String,
}

impl Default for PerRecordSection {
    fn default() -> Self {
        Self {
            database: default_per_record_database(),
            key_prefix: default_record_key_prefix(),
        }
    }
}

fn default_partitioned_database() -> u32 {
    1
}

fn default_partition_key() -> String {
    "clocksPartition1".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionedSection {
    #[serde(default = "default_partitioned_database")]
    pub database: u32,
    #[serde(default = "default_partition_key")]
    pub key: String,
}

impl Default for PartitionedSection {
    fn default() -> Self {
        Self {
            database: default_partitioned_database(),
            key: default_partition_key(),
        }
    }
}

pub fn load_config(path: &str) -> Result<Config, BenchError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| BenchError::Config(format!("cannot read config {path}: {e}")))?;
    toml::from_str(&content).map_err(|e| BenchError::Config(format!("bad config {path}: {e}")))
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug)]
pub struct BenchArgs {
    /// Path to the TOML config
    #[arg(long, default_value = "clock-bench.toml", env = "CLOCK_BENCH_CONFIG")]
    pub config: String,

    /// Records generated and stored per batch
    #[arg(long)]
    pub total: Option<usize>,

    /// Number of batches
    #[arg(long)]
    pub batches: Option<u32>,

    /// Random single-record lookups per batch
    #[arg(long)]
    pub lookups: Option<usize>,

    /// PRNG seed (0 = current time)
    #[arg(long)]
    pub seed: Option<i64>,

    /// Expire written keys after this many seconds
    #[arg(long)]
    pub ttl_secs: Option<u64>,

    /// Layout to run; repeat for several (default: partitioned, per-record)
    #[arg(long = "layout", value_enum)]
    pub layouts: Vec<Layout>,

    /// Store backend
    #[arg(long, value_enum, env = "CLOCK_BENCH_BACKEND")]
    pub backend: Option<Backend>,

    /// Redis server host
    #[arg(long, env = "CLOCK_BENCH_HOST")]
    pub host: Option<String>,

    /// Redis server port
    #[arg(long, env = "CLOCK_BENCH_PORT")]
    pub port: Option<u16>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

/// Final configuration: defaults < config file < env/CLI.
#[derive(Debug, Clone)]
pub struct Effective {
    pub total: usize,
    pub batches: u32,
    pub lookups: usize,
    pub seed: i64,
    pub ttl: Option<Duration>,
    pub layouts: Vec<Layout>,
    pub store: StoreSection,
    pub per_record: PerRecordSection,
    pub partitioned: PartitionedSection,
}

impl Effective {
    pub fn new(args: &BenchArgs) -> Result<Self, BenchError> {
        let cfg = match load_config(&args.config) {
            Ok(c) => c,
            Err(e) => {
                if std::path::Path::new(&args.config).exists() {
                    return Err(e);
                }
                tracing::debug!(config = %args.config, "no config file, using defaults");
                Config::default()
            }
        };

        let mut store = cfg.store;
        if let Some(backend) = args.backend {
            store.backend = backend;
        }
        if let Some(ref host) = args.host {
            store.redis.host = host.clone();
        }
        if let Some(port) = args.port {
            store.redis.port = port;
        }

        let layouts = if !args.layouts.is_empty() {
            args.layouts.clone()
        } else {
            cfg.layouts.unwrap_or_else(|| vec![Layout::Partitioned, Layout::PerRecord])
        };

        let eff = Self {
            total: args.total.or(cfg.total).unwrap_or(30_000),
            batches: args.batches.or(cfg.batches).unwrap_or(5),
            lookups: args.lookups.or(cfg.lookups).unwrap_or(100),
            seed: args.seed.or(cfg.seed).unwrap_or(0),
            ttl: args.ttl_secs.or(cfg.ttl_secs).filter(|&s| s > 0).map(Duration::from_secs),
            layouts,
            store,
            per_record: cfg.per_record,
            partitioned: cfg.partitioned,
        };
        eff.validate()?;
        Ok(eff)
    }

    fn validate(&self) -> Result<(), BenchError> {
        if self.total == 0 {
            return Err(BenchError::Config("total must be greater than 0".into()));
        }
        if self.batches == 0 {
            return Err(BenchError::Config("batches must be greater than 0".into()));
        }
        if self.layouts.is_empty() {
            return Err(BenchError::Config("no layouts configured".into()));
        }
        if self.partitioned.key.is_empty() {
            return Err(BenchError::Config("partitioned.key must not be empty".into()));
        }
        Ok(())
    }
}
