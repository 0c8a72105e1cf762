//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Largest accepted `blending.blend_radius`, in blocks.
pub const MAX_BLEND_RADIUS: f64 = 64.0;

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Global terrain constants shared by every biome.
    pub generator: GeneratorConfig,
    /// Biome border blending.
    pub blending: BlendConfig,
    /// Biome claim settings.
    pub regions: RegionConfig,
    /// Where biome definitions are loaded from.
    pub biomes: BiomeDirConfig,
    /// Background chunk generation pool.
    pub workers: WorkerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Global terrain constants. Per-biome multipliers scale these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// World seed.
    pub seed: u64,
    /// Base noise frequency before the biome's noise-scale multiplier.
    pub noise_scale: f64,
    /// Height offset added to every shaped noise value.
    pub base_height: i32,
    /// Height range before the biome's height multiplier.
    pub height_multiplier: f64,
    /// Number of fBm octaves.
    pub octaves: u32,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Lowest Y of the world (first bedrock layer).
    pub world_min_y: i32,
    /// Number of vertical cells per chunk.
    pub world_height: u32,
}

/// Biome border blending configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlendConfig {
    /// Blend columns near claim borders instead of using a hard edge.
    pub enabled: bool,
    /// Distance in blocks over which two biomes are blended.
    pub blend_radius: f64,
    /// Y coordinate at which claims are sampled for column biome lookups.
    pub sample_y: i32,
}

/// Biome claim configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionConfig {
    /// Prefix for generated claim region ids.
    pub prefix: String,
    /// Default world identifier for claims created from the CLI.
    pub world: String,
}

/// Biome definition directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeDirConfig {
    /// Directory holding `*.toml` biome definitions, relative to the config dir
    /// unless absolute.
    pub directory: PathBuf,
}

/// Background chunk generation pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// Worker thread count. 0 picks a count from the number of CPUs.
    pub threads: usize,
    /// Maximum in-flight generation tasks.
    pub max_concurrent: usize,
    /// Capacity of the completed-chunk channel.
    pub result_capacity: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            noise_scale: 0.005,
            base_height: 64,
            height_multiplier: 64.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            world_min_y: -64,
            world_height: 384,
        }
    }
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blend_radius: 8.0,
            sample_y: 64,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            prefix: "cb_".to_string(),
            world: "world".to_string(),
        }
    }
}

impl Default for BiomeDirConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("biomes"),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_concurrent: 64,
            result_capacity: 128,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for verdant (e.g. `~/.config/verdant`).
///
/// Falls back to the current directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("verdant"))
        .unwrap_or_else(|| PathBuf::from("."))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Check settings that deserialize fine but cannot be used.
    ///
    /// `blending.blend_radius` must be finite and in `(0, MAX_BLEND_RADIUS]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let radius = self.blending.blend_radius;
        if !radius.is_finite() || radius <= 0.0 || radius > MAX_BLEND_RADIUS {
            return Err(ConfigError::InvalidValue {
                field: "blending.blend_radius",
                reason: format!("{radius} is not in (0, {MAX_BLEND_RADIUS}]"),
            });
        }
        Ok(())
    }

    /// Resolve the biome directory against `config_dir` when it is relative.
    /// Paths given on the command line are already absolute.
    pub fn biome_dir(&self, config_dir: &Path) -> PathBuf {
        if self.biomes.directory.is_absolute() {
            self.biomes.directory.clone()
        } else {
            config_dir.join(&self.biomes.directory)
        }
    }
}
