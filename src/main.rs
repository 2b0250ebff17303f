//! Avatar sprite / asset generation CLI
//!
//! Subcommands:
//!   github          Contributors of the configured GitHub repo -> sprite + manifest
//!   opencollective  Open Collective members -> sprite + manifest
//!   testimonials    Testimonial authors -> sprite
//!   webp            Convert PNG/JPEG assets to WebP siblings
//!   all             Every enabled job, then webp
//!   layout          Print the grid geometry for a tile count
//!   inspect         Summarise an existing sprite manifest (and image)
//!
//! Example:
//!   GH_API_KEY=... cargo run -- --config config/sprites.ron github

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use avatar_sprites::{
    config::{ConfigOverrides, SpritesConfig, WebpJob},
    layout::compute_layout,
    pipeline::{self, JobReport},
    source::HttpFetcher,
    sprite,
    webp::{self, ConversionReport},
};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

const DEFAULT_CONFIG_LAYERS: [&str; 2] = ["config/sprites.ron", "config/sprites.local.ron"];

#[derive(Parser, Debug)]
#[command(author, version, about = "Regenerate avatar sprite sheets and WebP assets", long_about = None)]
struct Cli {
    /// RON config layers, later files override earlier ones. Defaults to config/sprites.ron (+ .local.ron).
    #[arg(long = "config", global = true)]
    configs: Vec<PathBuf>,
    #[command(flatten)]
    overrides: ConfigOverrides,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the GitHub contributors sprite
    Github,
    /// Build the Open Collective members sprite
    Opencollective,
    /// Build the testimonial avatar sprite
    Testimonials {
        /// Directory the testimonials data file is resolved against
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
    },
    /// Convert PNG/JPEG images under the configured root to WebP
    Webp {
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
    },
    /// Run every enabled job
    All {
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
    },
    /// Print grid geometry for a tile count
    Layout(LayoutArgs),
    /// Inspect an existing sprite manifest
    Inspect {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        image: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct LayoutArgs {
    #[arg(long)]
    count: usize,
    #[arg(long, default_value_t = 64)]
    tile_size: u32,
    /// Defaults to the configured max_width
    #[arg(long)]
    max_width: Option<u32>,
    /// Also print every tile's placement
    #[arg(long)]
    placements: bool,
}

fn load_config(cli: &Cli) -> Result<SpritesConfig> {
    let (mut cfg, used, errors) = if cli.configs.is_empty() {
        SpritesConfig::load_layered(DEFAULT_CONFIG_LAYERS)
    } else {
        for p in &cli.configs {
            if !p.exists() {
                bail!("config file {} not found", p.display());
            }
        }
        SpritesConfig::load_layered(&cli.configs)
    };
    if !errors.is_empty() {
        bail!("config errors: {}", errors.join("; "));
    }
    if used.is_empty() {
        info!(target: "config", "no config file found; using defaults");
    } else {
        info!(target: "config", "loaded config layers: {}", used.join(", "));
    }

    cli.overrides.apply(&mut cfg);
    for w in cfg.validate() {
        warn!(target: "config", "{w}");
    }
    Ok(cfg)
}

fn print_report(r: &JobReport) {
    println!(
        "{}: {} ({}x{}, {} tiles, {} per row, {} rows, {} placeholders)",
        r.name,
        r.image_path.display(),
        r.layout.canvas_width,
        r.layout.canvas_height,
        r.layout.tile_count,
        r.layout.tiles_per_row,
        r.layout.row_count,
        r.placeholders
    );
    if let Some(m) = &r.manifest_path {
        println!("  manifest: {}", m.display());
    }
    if !r.failed.is_empty() {
        println!("  failed avatars: {}", r.failed.join(", "));
    }
}

fn print_conversion(report: &ConversionReport) {
    println!(
        "webp: {} converted, {} already present, {} failed",
        report.converted.len(),
        report.skipped.len(),
        report.failed.len()
    );
}

fn cmd_webp(job: &WebpJob) -> Result<()> {
    print_conversion(&webp::convert_all(job)?);
    Ok(())
}

fn cmd_layout(cfg: &SpritesConfig, a: &LayoutArgs) -> Result<()> {
    let layout = compute_layout(a.count, a.tile_size, a.max_width.unwrap_or(cfg.max_width))?;
    println!(
        "tiles={} tile_size={} max_width={} tiles_per_row={} columns={} rows={} canvas={}x{}",
        layout.tile_count,
        layout.tile_size,
        layout.max_width,
        layout.tiles_per_row,
        layout.columns(),
        layout.row_count,
        layout.canvas_width,
        layout.canvas_height
    );
    if a.placements {
        for p in layout.placements() {
            println!("{:>5} row={} col={} x={} y={}", p.index, p.row, p.col, p.x, p.y);
        }
    }
    Ok(())
}

fn cmd_inspect(manifest: &Path, image: Option<&Path>) -> Result<()> {
    let res = sprite::inspect(manifest, image)?;
    println!(
        "Sprite: {}x{} tile_size={} tiles={} per_row={} rows={} placeholders={}",
        res.canvas.0, res.canvas.1, res.tile_size, res.tile_count, res.tiles_per_row, res.row_count, res.placeholders
    );
    for w in &res.warnings {
        println!("warning: {w}");
    }
    Ok(())
}

async fn cmd_all(cfg: &SpritesConfig, http: &HttpFetcher, base_dir: &Path) -> Result<()> {
    let summary = pipeline::run_all(cfg, http, base_dir).await;
    summary.jobs.iter().for_each(print_report);
    if let Some(r) = &summary.webp {
        print_conversion(r);
    }
    if !summary.failures.is_empty() {
        bail!("jobs failed: {}", summary.failures.join(", "));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    let http = || HttpFetcher::new(&cfg.user_agent, cfg.request_timeout_secs);

    match &cli.command {
        Commands::Github => print_report(&pipeline::run_github(&cfg, &http()?).await?),
        Commands::Opencollective => print_report(&pipeline::run_opencollective(&cfg, &http()?).await?),
        Commands::Testimonials { base_dir } => {
            print_report(&pipeline::run_testimonials(&cfg, &http()?, base_dir).await?)
        }
        Commands::Webp { root, overwrite } => {
            let mut job = cfg.webp.clone();
            if let Some(root) = root {
                job.root = root.clone();
            }
            job.overwrite |= *overwrite;
            cmd_webp(&job)?
        }
        Commands::All { base_dir } => cmd_all(&cfg, &http()?, base_dir).await?,
        Commands::Layout(a) => cmd_layout(&cfg, a)?,
        Commands::Inspect { manifest, image } => cmd_inspect(manifest, image.as_deref())?,
    }
    Ok(())
}
