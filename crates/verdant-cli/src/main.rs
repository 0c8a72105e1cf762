//! `verdant`: inspect biome definitions, generate terrain, and resolve
//! biome claims from the command line.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p verdant-cli -- generate --biome plains --radius 2`.

mod claim_arg;
mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use verdant_config::{CliArgs, Config, default_config_dir};
use verdant_region::BlockPos;
use verdant_voxel::ChunkPos;

use crate::claim_arg::ClaimArg;
use crate::commands::{Context, GenerateOptions};

#[derive(Parser, Debug)]
#[command(name = "verdant", version, about = "Procedural biome terrain generator")]
struct Cli {
    #[command(flatten)]
    global: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the loaded biomes.
    List,
    /// Show one biome definition.
    Info {
        /// Biome key or display name.
        biome: String,
    },
    /// Load every biome file and report the ones that fail.
    Validate,
    /// Generate chunks and print a summary of each.
    Generate {
        /// Biome for the whole area, or for unclaimed columns when claims are given.
        #[arg(long)]
        biome: String,
        /// Center chunk X.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        x: i32,
        /// Center chunk Z.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        z: i32,
        /// Chunks generated in each direction from the center.
        #[arg(long, default_value_t = 0)]
        radius: i32,
        /// Biome claim as `<biome>@x,y,z..x,y,z`. Repeatable.
        #[arg(long = "claim")]
        claims: Vec<ClaimArg>,
        /// Print one JSON object per chunk.
        #[arg(long)]
        json: bool,
    },
    /// Print the biome governing a block position.
    Which {
        #[arg(allow_negative_numbers = true)]
        x: i32,
        #[arg(allow_negative_numbers = true)]
        y: i32,
        #[arg(allow_negative_numbers = true)]
        z: i32,
        /// Biome claim as `<biome>@x,y,z..x,y,z`. Repeatable.
        #[arg(long = "claim")]
        claims: Vec<ClaimArg>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_dir = cli.global.config.clone().unwrap_or_else(default_config_dir);

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&cli.global);

    let log_dir = config_dir.join("logs");
    verdant_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(cli.command, config, &config_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    command: Command,
    config: Config,
    config_dir: &std::path::Path,
) -> Result<(), commands::CliError> {
    let ctx = Context::load(config, config_dir)?;
    let mut out = std::io::stdout().lock();

    match command {
        Command::List => commands::list(&ctx, &mut out),
        Command::Info { biome } => commands::info(&ctx, &biome, &mut out),
        Command::Validate => commands::validate(&ctx, &mut out),
        Command::Generate {
            biome,
            x,
            z,
            radius,
            claims,
            json,
        } => {
            let opts = GenerateOptions {
                biome,
                center: ChunkPos::new(x, z),
                radius,
                claims,
                json,
            };
            commands::generate(&ctx, &opts, &mut out)
        }
        Command::Which { x, y, z, claims } => {
            commands::which(&ctx, BlockPos::new(x, y, z), &claims, &mut out)
        }
    }
}
