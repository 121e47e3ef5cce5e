use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use tile_atlas_core::{AtlasBuilder, AtlasLayout, IndexedTile, Meta, PackerConfig, Palette, TileAtlas};
use tracing::info;

mod inputs;

use inputs::{gather_paths, load_images_with_progress, quantize};

#[derive(Parser, Debug)]
#[command(
    name = "tile-atlas",
    about = "Pack indexed tiles and sprite frames into one power-of-two atlas",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack images into an atlas PNG plus metadata
    Pack(PackArgs),
    /// Layout-only export (no PNG): compute placements and write metadata
    Layout(PackArgs),
    /// Timing bench on synthetic tiles (or a folder of images)
    Bench(BenchArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Input file or directory. Files named `<sprite>@<direction>_<frame>.png` are sprite frames
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json/.h)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (present keys override the flags below)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,

    // Layout
    /// Padding added to the right and bottom of every item
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    margin: u32,
    /// Largest canvas side (power of two)
    #[arg(long, default_value_t = 4096, help_heading = "Layout")]
    max_size: u32,
    /// Only pack sprite frames of this direction (palette tiles are always packed)
    #[arg(long, help_heading = "Layout")]
    direction: Option<u8>,
    /// Validate the free-space grid after every placement (slow)
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    check_integrity: bool,

    // Export
    /// Draw red outlines (debug)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    outlines: bool,
    /// Layout-only: compute placements and export metadata (no PNG)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    layout_only: bool,
    /// Metadata format: json-array | json (alias) | json-hash | c-table | template
    #[arg(long, default_value = "json-array", help_heading = "Export")]
    metadata: String,
    /// External template file (handlebars), used when --metadata template
    #[arg(long, help_heading = "Export")]
    template: Option<PathBuf>,
    /// Identifier prefix for --metadata c-table (defaults to the atlas name)
    #[arg(long, help_heading = "Export")]
    prefix: Option<String>,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute layout and stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct BenchArgs {
    /// Input directory; synthetic tiles are generated when omitted
    input: Option<PathBuf>,
    /// Number of synthetic tiles
    #[arg(long, default_value_t = 500)]
    count: usize,
    /// Smallest synthetic tile side
    #[arg(long, default_value_t = 4)]
    min_size: u32,
    /// Largest synthetic tile side
    #[arg(long, default_value_t = 32)]
    max_size: u32,
    /// Palette size for synthetic tiles (fewer colors -> more duplicates)
    #[arg(long, default_value_t = 4)]
    colors: u16,
    /// RNG seed for synthetic tiles
    #[arg(long)]
    seed: Option<u64>,
    /// Padding added to the right and bottom of every item
    #[arg(long, default_value_t = 0)]
    margin: u32,
    /// Number of timed runs
    #[arg(long, default_value_t = 3)]
    runs: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args, cli.progress && !cli.quiet),
        Commands::Layout(args) => {
            let mut a = args.clone();
            a.layout_only = true;
            run_pack(&a, false)
        }
        Commands::Bench(b) => run_bench(b),
    }
}

/// Packer settings plus the atlas-level direction filter, as printed by `--print-config`.
#[derive(Debug, Clone, Serialize)]
struct CliConfig {
    #[serde(flatten)]
    packer: PackerConfig,
    direction: Option<u8>,
}

fn run_pack(cli: &PackArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = CliConfig {
        packer: PackerConfig::builder()
            .margin(cli.margin)
            .max_canvas_size(cli.max_size)
            .check_integrity(cli.check_integrity)
            .build(),
        direction: cli.direction,
    };
    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse {}", path.display()))?;
        y.apply(&mut cfg);
    }
    cfg.packer.validate()?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }

    let root = if cli.input.is_file() {
        cli.input.parent().unwrap_or(Path::new("")).to_path_buf()
    } else {
        cli.input.clone()
    };
    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude)?;
    let images = load_images_with_progress(&root, &paths, show_progress)?;
    info!(count = images.len(), "loaded input images");
    if images.is_empty() {
        anyhow::bail!("no images found under {}", cli.input.display());
    }

    let sources = quantize(&images)?;
    info!(
        tiles = sources.tiles.len(),
        sprites = sources.sprites.len(),
        colors = sources.palette.len(),
        "quantized inputs"
    );

    let mut builder = AtlasBuilder::new(sources.palette)
        .config(cfg.packer.clone())
        .direction(cfg.direction);
    for (key, tile) in sources.tiles {
        builder = builder.tile(key, tile);
    }
    for sprite in sources.sprites {
        builder = builder.sprite(sprite);
    }
    let atlas = builder.build()?;

    let png_name = format!("{}.png", cli.name);
    if !cli.layout_only && !cli.dry_run {
        let png_path = cli.out_dir.join(&png_name);
        let rgba = if cli.outlines {
            atlas.render_with_outlines()
        } else {
            atlas.render()
        };
        rgba.save(&png_path)
            .with_context(|| format!("write {}", png_path.display()))?;
        info!(?png_path, size = atlas.canvas_size(), "wrote atlas image");
    }

    let stats = atlas.stats();
    info!(
        size = stats.canvas_size,
        items = stats.num_items,
        sources = stats.num_sources,
        deduplicated = stats.num_deduplicated,
        occupancy = format!("{:.2}%", stats.occupancy * 100.0),
        "stats"
    );

    write_metadata(cli, &atlas, &png_name)?;

    if let Some(stats_path) = &cli.export_stats {
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&stats)?)
                .with_context(|| format!("write {}", stats_path.display()))?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn write_metadata(cli: &PackArgs, atlas: &TileAtlas, png_name: &str) -> anyhow::Result<()> {
    let layout = atlas.layout();
    let (path, contents) = match cli.metadata.as_str() {
        // Accept "json" as an alias of "json-array"
        "json-array" | "json" => (
            cli.out_dir.join(format!("{}.json", cli.name)),
            serde_json::to_string_pretty(&tile_atlas_core::to_json_array(&layout))?,
        ),
        "json-hash" => (
            cli.out_dir.join(format!("{}.json", cli.name)),
            serde_json::to_string_pretty(&tile_atlas_core::to_json_hash(&layout))?,
        ),
        "c-table" => {
            let prefix = cli.prefix.as_deref().unwrap_or(&cli.name);
            (
                cli.out_dir.join(format!("{}.h", cli.name)),
                tile_atlas_core::to_c_table(&layout, prefix)?,
            )
        }
        "template" => {
            let ctx = build_template_context(&layout, png_name);
            let tpl_from_file: Option<String> = match &cli.template {
                Some(path) => Some(
                    fs::read_to_string(path)
                        .with_context(|| format!("read {}", path.display()))?,
                ),
                None => None,
            };
            let tpl = tpl_from_file
                .as_deref()
                .unwrap_or(include_str!("templates/atlas.hbs"));

            let mut reg = Handlebars::new();
            reg.set_strict_mode(true);
            reg.register_escape_fn(handlebars::no_escape);
            reg.register_template_string("tpl", tpl)?;
            (
                cli.out_dir.join(format!("{}.template.txt", cli.name)),
                reg.render("tpl", &ctx)?,
            )
        }
        other => anyhow::bail!("unknown metadata format: {}", other),
    };

    if cli.dry_run {
        info!(?path, bytes = contents.len(), "dry run, metadata not written");
        return Ok(());
    }
    fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
    info!(?path, format = %cli.metadata, "metadata written");
    Ok(())
}

fn run_bench(b: &BenchArgs) -> anyhow::Result<()> {
    let (palette, tiles) = match &b.input {
        Some(dir) => {
            let paths = gather_paths(dir, &[], &[])?;
            let images = load_images_with_progress(dir, &paths, false)?;
            let src = quantize(&images)?;
            let mut tiles = src.tiles;
            for sprite in &src.sprites {
                for f in sprite.frames() {
                    tiles.push((f.key(&sprite.name), f.tile.clone()));
                }
            }
            (src.palette, tiles)
        }
        None => synthetic_tiles(b)?,
    };
    if tiles.is_empty() {
        anyhow::bail!("nothing to bench");
    }

    let cfg = PackerConfig::builder().margin(b.margin).build();
    let mut best: Option<Duration> = None;
    let mut last = None;
    for _ in 0..b.runs.max(1) {
        let mut builder = AtlasBuilder::new(palette.clone()).config(cfg.clone());
        for (key, tile) in &tiles {
            builder = builder.tile(key.clone(), tile.clone());
        }
        let start = Instant::now();
        let atlas = builder.build()?;
        let dur = start.elapsed();
        best = Some(best.map_or(dur, |d| d.min(dur)));
        last = Some(atlas);
    }
    if let (Some(atlas), Some(dur)) = (last, best) {
        let s = atlas.stats();
        println!(
            "size={} items={} sources={} occupancy={:.2}% attempts={} time={}",
            s.canvas_size,
            s.num_items,
            s.num_sources,
            s.occupancy * 100.0,
            atlas.attempts(),
            fmt_dur(dur)
        );
    }
    Ok(())
}

type KeyedTiles = Vec<(String, Arc<IndexedTile>)>;

fn synthetic_tiles(b: &BenchArgs) -> anyhow::Result<(Palette, KeyedTiles)> {
    use rand::{Rng, SeedableRng};
    if b.min_size == 0 || b.min_size > b.max_size {
        anyhow::bail!("invalid size range {}..={}", b.min_size, b.max_size);
    }
    if b.colors == 0 {
        anyhow::bail!("--colors must be at least 1");
    }
    let mut rng = match b.seed {
        Some(s) => rand::rngs::StdRng::seed_from_u64(s),
        None => rand::rngs::StdRng::from_entropy(),
    };
    let palette = Palette::from_colors(
        (0..b.colors).map(|i| {
            let c = i.to_le_bytes();
            image::Rgba([c[0], c[1], c[0].wrapping_mul(31), 255])
        }),
    )?;
    let mut tiles = Vec::with_capacity(b.count);
    for i in 0..b.count {
        let w = rng.gen_range(b.min_size..=b.max_size);
        let h = rng.gen_range(b.min_size..=b.max_size);
        let indices = (0..w * h).map(|_| rng.gen_range(0..b.colors)).collect();
        tiles.push((
            format!("tile_{}", i),
            Arc::new(IndexedTile::new(w, h, indices)?),
        ));
    }
    Ok((palette, tiles))
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms >= 1.0 {
        format!("{:.1}ms", ms)
    } else {
        format!("{}us", d.as_micros())
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Serialize)]
struct TemplateFrame {
    key: String,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    item: usize,
    shared: bool,
}

#[derive(Serialize)]
struct TemplateContext {
    image: String,
    size: u32,
    frames: Vec<TemplateFrame>,
    items: Vec<serde_json::Value>,
    meta: Meta,
}

fn build_template_context(layout: &AtlasLayout, image: &str) -> TemplateContext {
    let frames = layout
        .frames
        .iter()
        .map(|fr| TemplateFrame {
            key: fr.key.clone(),
            x: fr.frame.x,
            y: fr.frame.y,
            w: fr.frame.w,
            h: fr.frame.h,
            item: fr.item,
            shared: fr.shared,
        })
        .collect();
    let items = layout
        .items
        .iter()
        .map(|r| serde_json::json!({"x": r.x, "y": r.y, "w": r.w, "h": r.h}))
        .collect();
    TemplateContext {
        image: image.to_string(),
        size: layout.size,
        frames,
        items,
        meta: layout.meta.clone(),
    }
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    margin: Option<u32>,
    max_canvas_size: Option<u32>,
    check_integrity: Option<bool>,
    direction: Option<u8>,
}

impl YamlConfig {
    fn apply(self, cfg: &mut CliConfig) {
        if let Some(v) = self.margin {
            cfg.packer.margin = v;
        }
        if let Some(v) = self.max_canvas_size {
            cfg.packer.max_canvas_size = v;
        }
        if let Some(v) = self.check_integrity {
            cfg.packer.check_integrity = v;
        }
        if let Some(v) = self.direction {
            cfg.direction = Some(v);
        }
    }
}
