//! Subcommand implementations.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use verdant_biome::{BiomeDefinition, BiomeLoadError, BiomeRegistry};
use verdant_config::{Config, GeneratorConfig};
use verdant_region::{BlockPos, ClaimBiomeSource, ClaimError, ClaimManager, InMemoryRegionIndex};
use verdant_terrain::{
    AsyncChunkGenerator, BiomeSelection, BiomeSource, GenerationResult, GenerationTask,
    HeightParams, TerrainParams, TerrainPipeline, default_thread_count,
};
use verdant_voxel::{ChunkPos, hash_chunk_data};

use crate::claim_arg::ClaimArg;

/// A failed command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to load biomes: {0}")]
    Biomes(#[from] BiomeLoadError),

    #[error("unknown biome {0:?}")]
    UnknownBiome(String),

    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("{0} biome file(s) failed validation")]
    Invalid(usize),

    #[error("failed to start generation workers: {0}")]
    Workers(#[source] std::io::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Everything a command needs: the effective config and the loaded biomes.
pub struct Context {
    pub config: Config,
    pub biome_dir: PathBuf,
    pub registry: Arc<BiomeRegistry>,
}

impl Context {
    pub fn load(config: Config, config_dir: &Path) -> Result<Self, CliError> {
        let biome_dir = config.biome_dir(config_dir);
        let (registry, _failures) = BiomeRegistry::load_from_directory(&biome_dir)?;
        Ok(Self {
            config,
            biome_dir,
            registry: Arc::new(registry),
        })
    }

    fn biome(&self, key: &str) -> Result<Arc<BiomeDefinition>, CliError> {
        self.registry
            .get(key)
            .cloned()
            .ok_or_else(|| CliError::UnknownBiome(key.to_string()))
    }

    /// A claim manager seeded with the command-line claims.
    fn claims(&self, args: &[ClaimArg]) -> Result<ClaimManager<InMemoryRegionIndex>, CliError> {
        let manager =
            ClaimManager::with_prefix(InMemoryRegionIndex::new(), &self.config.regions.prefix);
        for claim in args {
            manager.assign(
                &self.config.regions.world,
                claim.bounds,
                &claim.biome,
                "cli",
                &self.registry,
            )?;
        }
        Ok(manager)
    }
}

/// Generator settings from the config file.
pub fn terrain_params(generator: &GeneratorConfig) -> TerrainParams {
    TerrainParams {
        height: HeightParams {
            noise_scale: generator.noise_scale,
            base_height: generator.base_height,
            height_multiplier: generator.height_multiplier,
            octaves: generator.octaves,
            persistence: generator.persistence,
            lacunarity: generator.lacunarity,
        },
        world_min_y: generator.world_min_y,
        world_height: generator.world_height,
    }
}

pub fn list(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    if ctx.registry.is_empty() {
        writeln!(out, "No biomes in {}", ctx.biome_dir.display())?;
        return Ok(());
    }
    for biome in ctx.registry.iter() {
        writeln!(
            out,
            "{:<20} {:<10} {:>4}..{:<4} {}",
            biome.key,
            biome.terrain.shape.name(),
            biome.terrain.min_height,
            biome.terrain.max_height,
            biome.display_name
        )?;
    }
    Ok(())
}

pub fn info(ctx: &Context, key: &str, out: &mut impl Write) -> Result<(), CliError> {
    let biome = ctx.biome(key)?;
    let t = &biome.terrain;
    let b = &biome.blocks;
    let f = &biome.features;

    writeln!(out, "{} ({})", biome.display_name, biome.key)?;
    if !biome.description.is_empty() {
        writeln!(out, "  {}", biome.description)?;
    }
    writeln!(out, "  icon:        {}", biome.icon)?;
    writeln!(
        out,
        "  terrain:     {} heights {}..{} noise x{} height x{}",
        t.shape, t.min_height, t.max_height, t.noise_scale_multiplier, t.height_multiplier
    )?;
    writeln!(
        out,
        "  blocks:      surface {} / subsurface {} / deep {} / bedrock {}",
        b.surface, b.subsurface, b.deep, b.bedrock
    )?;
    writeln!(out, "  fluid:       {} up to y={}", b.fluid, b.sea_level)?;
    for deco in &b.surface_decorations {
        writeln!(out, "  decoration:  {} ({})", deco.block, deco.chance)?;
    }

    if f.trees.enabled {
        let types: Vec<String> = f
            .trees
            .types
            .iter()
            .map(|e| format!("{}:{}", e.tree, e.weight))
            .collect();
        writeln!(
            out,
            "  trees:       [{}] up to {} per chunk, chance {}",
            types.join(", "),
            f.trees.max_per_chunk,
            f.trees.chance
        )?;
    }
    if f.vegetation.enabled {
        for plant in &f.vegetation.plants {
            writeln!(
                out,
                "  plant:       {} up to {} per chunk, chance {}",
                plant.block, plant.max_per_chunk, plant.chance
            )?;
        }
    }
    if f.ores.enabled {
        for vein in &f.ores.veins {
            writeln!(
                out,
                "  ore:         {} y {}..{} size {} chance {}",
                vein.block, vein.min_height, vein.max_height, vein.vein_size, vein.chance
            )?;
        }
    }
    writeln!(
        out,
        "  structures:  caves {} dungeons {}",
        f.structures.caves, f.structures.dungeons
    )?;
    Ok(())
}

/// Re-reads the biome directory and reports every file that was skipped.
pub fn validate(ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let (registry, failures) = BiomeRegistry::load_from_directory(&ctx.biome_dir)?;
    for failure in &failures {
        writeln!(out, "FAIL {}: {}", failure.path.display(), failure.error)?;
    }
    writeln!(
        out,
        "{} valid, {} invalid in {}",
        registry.len(),
        failures.len(),
        ctx.biome_dir.display()
    )?;
    if failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::Invalid(failures.len()))
    }
}

/// Options of the `generate` command.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub biome: String,
    pub center: ChunkPos,
    pub radius: i32,
    pub claims: Vec<ClaimArg>,
    pub json: bool,
}

/// Squared chunk distance from the centre, computed in `u64` so that any
/// `i32` offset fits.
fn ring_priority(dx: i32, dz: i32) -> u64 {
    let (dx, dz) = (u64::from(dx.unsigned_abs()), u64::from(dz.unsigned_abs()));
    dx * dx + dz * dz
}

/// Generates a square of chunks on the worker pool and prints one summary
/// line per chunk.
pub fn generate(
    ctx: &Context,
    opts: &GenerateOptions,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let fallback = ctx.biome(&opts.biome)?;
    let selection = if opts.claims.is_empty() {
        BiomeSelection::Single(fallback)
    } else {
        let manager = Arc::new(ctx.claims(&opts.claims)?);
        let source: Arc<dyn BiomeSource + Send + Sync> = Arc::new(ClaimBiomeSource::new(
            manager,
            Arc::clone(&ctx.registry),
            ctx.config.regions.world.clone(),
            ctx.config.blending.sample_y,
        ));
        let radius = if ctx.config.blending.enabled {
            ctx.config.blending.blend_radius
        } else {
            0.0
        };
        BiomeSelection::Blended {
            source,
            fallback,
            radius,
        }
    };

    let generator_config = &ctx.config.generator;
    let pipeline = Arc::new(TerrainPipeline::new(
        generator_config.seed,
        terrain_params(generator_config),
    ));
    let workers = &ctx.config.workers;
    let threads = if workers.threads == 0 {
        default_thread_count()
    } else {
        workers.threads
    };
    let generator = AsyncChunkGenerator::new(
        pipeline,
        threads,
        workers.max_concurrent,
        workers.result_capacity,
    )
    .map_err(CliError::Workers)?;

    let r = opts.radius.max(0);
    let mut queue = Vec::new();
    for dz in -r..=r {
        for dx in -r..=r {
            queue.push(GenerationTask {
                pos: ChunkPos::new(opts.center.x + dx, opts.center.z + dz),
                selection: selection.clone(),
                priority: ring_priority(dx, dz),
            });
        }
    }
    let total = queue.len();
    info!(
        "Generating {total} chunk(s) around ({}, {}) with seed {} on {} worker(s)",
        opts.center.x,
        opts.center.z,
        generator_config.seed,
        generator.worker_count()
    );

    let mut results: Vec<GenerationResult> = Vec::with_capacity(total);
    while results.len() < total {
        queue = generator.submit_batch(queue);
        let drained = generator.drain_results();
        if drained.is_empty() {
            if queue.is_empty() && generator.in_flight_count() == 0 {
                warn!("{} chunk(s) were never delivered", total - results.len());
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        results.extend(drained);
    }
    results.sort_by_key(|r| (r.chunk.pos.z, r.chunk.pos.x));

    for result in &results {
        write_summary(result, opts.json, out)?;
    }
    Ok(())
}

fn write_summary(
    result: &GenerationResult,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let chunk = &result.chunk;
    let hash = hash_chunk_data(&chunk.data);
    if json {
        let line = serde_json::json!({
            "x": chunk.pos.x,
            "z": chunk.pos.z,
            "biome": chunk.biome,
            "hash": format!("{hash:016x}"),
            "min_height": chunk.heights.min(),
            "max_height": chunk.heights.max(),
            "carved": chunk.carved,
            "placed": chunk.placed,
            "trees": chunk.features.trees,
            "ores": chunk.features.ores,
            "blended_columns": chunk.blended_columns,
            "generation_time_us": result.generation_time_us,
        });
        writeln!(out, "{line}")?;
    } else {
        writeln!(
            out,
            "chunk ({:>4}, {:>4}) {:<16} {hash:016x} heights {}..{} carved {} placed {} blended {} ({} us)",
            chunk.pos.x,
            chunk.pos.z,
            chunk.biome,
            chunk.heights.min(),
            chunk.heights.max(),
            chunk.carved,
            chunk.placed,
            chunk.blended_columns,
            result.generation_time_us
        )?;
    }
    Ok(())
}

/// Prints the biome governing a point, given the command-line claims.
pub fn which(
    ctx: &Context,
    point: BlockPos,
    claims: &[ClaimArg],
    out: &mut impl Write,
) -> Result<(), CliError> {
    let manager = ctx.claims(claims)?;
    let world = &ctx.config.regions.world;
    for claim in manager.claims_at(world, point) {
        writeln!(
            out,
            "  covers: {} ({}) volume {}",
            claim.id,
            claim.biome_key,
            claim.volume()
        )?;
    }
    match manager.biome_at(world, point, &ctx.registry) {
        Some(biome) => writeln!(out, "{}", biome.key)?,
        None => writeln!(
            out,
            "no biome claim covers ({}, {}, {})",
            point.x, point.y, point.z
        )?,
    }
    Ok(())
}
