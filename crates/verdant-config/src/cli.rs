//! Command-line overrides shared by verdant binaries.

use std::path::PathBuf;

use clap::Args;

use crate::Config;

/// Global command-line arguments.
///
/// CLI values override settings loaded from `config.ron`. Binaries flatten
/// this into their own parser.
#[derive(Args, Debug, Clone, Default)]
pub struct CliArgs {
    /// World seed.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Directory holding biome definition files.
    #[arg(long, global = true)]
    pub biomes: Option<PathBuf>,

    /// Worker thread count for background generation.
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.generator.seed = seed;
        }
        if let Some(ref dir) = args.biomes {
            // Relative to where the command was run, not to the config dir.
            self.biomes.directory = std::path::absolute(dir).unwrap_or_else(|_| dir.clone());
        }
        if let Some(threads) = args.threads {
            self.workers.threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
