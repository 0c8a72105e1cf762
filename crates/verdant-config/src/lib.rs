//! Configuration system for the verdant terrain generator.
//!
//! Global generator constants, blending, claim and worker settings persist to
//! disk as a RON file. Supports CLI overrides via clap, hot-reload detection,
//! and forward/backward compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BiomeDirConfig, BlendConfig, Config, DebugConfig, GeneratorConfig, MAX_BLEND_RADIUS,
    RegionConfig, WorkerConfig, default_config_dir,
};
pub use error::ConfigError;
