//! Engine configuration

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use delve_domain::{GenerationConfig, InstanceNamePattern, WorldPosition};

/// Vertical distance between a participant's capture position and the
/// intended floor of the dungeon.
pub const DEFAULT_VERTICAL_OFFSET: i32 = -14;

/// Where the instance registry lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryBackend {
    Memory,
    JsonFile(PathBuf),
}

/// Engine configuration loaded from environment
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Seed, radius, room probability and execution mode
    pub generation: GenerationConfig,
    /// Substring identifying managed instances
    pub instance_pattern: InstanceNamePattern,
    /// Added to the resolved origin's y
    pub vertical_offset: i32,
    /// Durable registry backend
    pub registry: RegistryBackend,
    /// Optional catalog file replacing the built-in prefab set
    pub catalog_path: Option<PathBuf>,
    /// Origin used for instances nobody has joined yet
    pub fallback_origin: Option<WorldPosition>,

    /// Dry-run configuration
    pub dry_run: DryRunSettings,
}

/// Inputs for the headless dry run
#[derive(Debug, Clone, PartialEq)]
pub struct DryRunSettings {
    /// Instance names to drive through generation
    pub instances: Vec<String>,
    /// Synthetic participant position (x, y, z)
    pub spawn: [f64; 3],
}

impl EngineSettings {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(
            |key| env::var(key).ok(),
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Load configuration through `lookup`, seeding with `default_seed`
    /// when `DELVE_SEED` is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>, default_seed: i64) -> Result<Self> {
        let seed: i64 = match lookup("DELVE_SEED") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("DELVE_SEED must be a 64-bit integer")?,
            None => default_seed,
        };
        let radius: i32 = lookup("DELVE_RADIUS")
            .unwrap_or_else(|| delve_domain::DEFAULT_RADIUS.to_string())
            .trim()
            .parse()
            .context("DELVE_RADIUS must be an integer")?;
        let room_probability: f64 = lookup("DELVE_ROOM_PROBABILITY")
            .unwrap_or_else(|| delve_domain::DEFAULT_ROOM_PROBABILITY.to_string())
            .trim()
            .parse()
            .context("DELVE_ROOM_PROBABILITY must be a number")?;
        let async_generation = lookup("DELVE_ASYNC_GENERATION")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        let generation = GenerationConfig::new(seed, radius, room_probability, async_generation)
            .context("Invalid generation settings")?;

        let instance_pattern = InstanceNamePattern::new(
            lookup("DELVE_INSTANCE_PATTERN")
                .unwrap_or_else(|| InstanceNamePattern::DEFAULT.to_string()),
        )
        .context("DELVE_INSTANCE_PATTERN cannot be empty")?;

        let vertical_offset: i32 = lookup("DELVE_VERTICAL_OFFSET")
            .unwrap_or_else(|| DEFAULT_VERTICAL_OFFSET.to_string())
            .trim()
            .parse()
            .context("DELVE_VERTICAL_OFFSET must be an integer")?;

        let registry = match lookup("DELVE_REGISTRY_PATH")
            .unwrap_or_else(|| "./data/dungeons.json".to_string())
            .trim()
        {
            "memory" => RegistryBackend::Memory,
            path => RegistryBackend::JsonFile(PathBuf::from(path)),
        };

        let fallback_origin = match lookup("DELVE_FALLBACK_ORIGIN") {
            Some(raw) => {
                let [x, y, z] = parse_triple::<i32>(&raw)
                    .context("DELVE_FALLBACK_ORIGIN must be x,y,z block coordinates")?;
                Some(WorldPosition::new(x, y, z))
            }
            None => None,
        };

        let dry_run = DryRunSettings {
            instances: lookup("DELVE_INSTANCES")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            spawn: parse_triple::<f64>(
                &lookup("DELVE_SPAWN").unwrap_or_else(|| "0.5,78.0,0.5".to_string()),
            )
            .context("DELVE_SPAWN must be x,y,z coordinates")?,
        };

        Ok(Self {
            generation,
            instance_pattern,
            vertical_offset,
            registry,
            catalog_path: lookup("DELVE_CATALOG_PATH")
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            fallback_origin,
            dry_run,
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_triple<T: std::str::FromStr>(raw: &str) -> Result<[T; 3]> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        bail!("expected three comma-separated values, got {raw:?}");
    }
    let parse = |s: &str| {
        s.parse::<T>()
            .map_err(|_| anyhow::anyhow!("{s:?} is not a valid coordinate"))
    };
    Ok([parse(parts[0])?, parse(parts[1])?, parse(parts[2])?])
}
