//! One sprite job end to end: entries -> tiles -> layout -> canvas -> files.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{FailurePolicy, SpriteFormat, SpritesConfig};
use crate::layout::{compute_layout, Layout};
use crate::source::{self, github, opencollective, testimonials, HttpFetcher, ImageFetcher, SourceEntry, Tile};
use crate::sprite::{self, SpriteArtifact, SpriteManifest};
use crate::webp::{self, ConversionReport};

/// Source-independent description of a sprite job.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteJob {
    pub name: String,
    pub tile_size: u32,
    pub max_width: u32,
    pub image_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub format: SpriteFormat,
    pub on_failure: FailurePolicy,
    pub concurrency: usize,
}

impl SpriteJob {
    fn from_parts(
        cfg: &SpritesConfig,
        name: &str,
        tile_size: u32,
        image: &Path,
        manifest: Option<&Path>,
        format: SpriteFormat,
        on_failure: FailurePolicy,
    ) -> Self {
        let mut image_path = cfg.output_path(image);
        if image_path.extension().and_then(|e| e.to_str()) != Some(format.extension()) {
            image_path.set_extension(format.extension());
        }
        Self {
            name: name.to_string(),
            tile_size,
            max_width: cfg.max_width,
            image_path,
            manifest_path: manifest.map(|m| cfg.output_path(m)),
            format,
            on_failure,
            concurrency: cfg.concurrency,
        }
    }

    pub fn github(cfg: &SpritesConfig) -> Self {
        let j = &cfg.github;
        Self::from_parts(cfg, "github", j.tile_size, &j.image, j.manifest.as_deref(), j.format, j.on_failure)
    }

    pub fn opencollective(cfg: &SpritesConfig) -> Self {
        let j = &cfg.opencollective;
        Self::from_parts(cfg, "opencollective", j.tile_size, &j.image, j.manifest.as_deref(), j.format, j.on_failure)
    }

    pub fn testimonials(cfg: &SpritesConfig) -> Self {
        let j = &cfg.testimonials;
        Self::from_parts(cfg, "testimonials", j.tile_size, &j.image, j.manifest.as_deref(), j.format, j.on_failure)
    }
}

#[derive(Debug, Clone)]
pub struct JobReport {
    pub name: String,
    pub layout: Layout,
    pub image_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
    pub placeholders: usize,
    /// Entries whose avatar failed (kept as placeholders or dropped, per policy).
    pub failed: Vec<String>,
}

/// Lay out, composite and encode already-resolved tiles.
pub fn build_sprite(job: &SpriteJob, tiles: &[Tile]) -> Result<(Layout, SpriteArtifact)> {
    let layout = compute_layout(tiles.len(), job.tile_size, job.max_width)?;
    let canvas = sprite::compose(&layout, tiles)?;
    let bytes = sprite::encode(&canvas, job.format)?;
    let artifact = SpriteArtifact {
        bytes,
        manifest: SpriteManifest::new(&layout, tiles),
        image_path: job.image_path.clone(),
        manifest_path: job.manifest_path.clone(),
    };
    Ok((layout, artifact))
}

/// Fetch every entry's avatar, build the sprite and write it (plus manifest) to disk.
///
/// Fails with [`crate::layout::LayoutError::EmptyInput`] before writing anything
/// when no tiles survive collection.
pub async fn run_sprite_job<F>(job: &SpriteJob, entries: Vec<SourceEntry>, fetcher: &F) -> Result<JobReport>
where
    F: ImageFetcher + ?Sized,
{
    info!(target: "pipeline", "[{}] processing {} entries", job.name, entries.len());
    let collected = source::collect_tiles(entries, fetcher, job.tile_size, job.on_failure, job.concurrency).await;
    let (layout, artifact) = build_sprite(job, &collected.tiles)?;
    sprite::write_outputs(&artifact)?;
    info!(
        target: "pipeline",
        "[{}] wrote {} ({}x{}, {} tiles, {} per row, {} rows)",
        job.name,
        artifact.image_path.display(),
        layout.canvas_width,
        layout.canvas_height,
        layout.tile_count,
        layout.tiles_per_row,
        layout.row_count
    );
    Ok(JobReport {
        name: job.name.clone(),
        layout,
        image_path: artifact.image_path,
        manifest_path: artifact.manifest_path,
        placeholders: collected.placeholder_count(),
        failed: collected.failed,
    })
}

pub async fn run_github(cfg: &SpritesConfig, http: &HttpFetcher) -> Result<JobReport> {
    let token = std::env::var(&cfg.github.token_env).ok().filter(|t| !t.is_empty());
    if token.is_none() {
        warn!(target: "github", "{} not set; using unauthenticated requests", cfg.github.token_env);
    }
    let entries = github::list_contributors(http, &cfg.github, token.as_deref()).await?;
    run_sprite_job(&SpriteJob::github(cfg), entries, http).await
}

pub async fn run_opencollective(cfg: &SpritesConfig, http: &HttpFetcher) -> Result<JobReport> {
    let entries = opencollective::list_members(http, &cfg.opencollective).await?;
    run_sprite_job(&SpriteJob::opencollective(cfg), entries, http).await
}

/// `base_dir` anchors the testimonials data file (normally the repository root).
pub async fn run_testimonials(cfg: &SpritesConfig, http: &HttpFetcher, base_dir: &Path) -> Result<JobReport> {
    let entries = testimonials::list_testimonials(&cfg.testimonials, base_dir)?;
    run_sprite_job(&SpriteJob::testimonials(cfg), entries, http).await
}

/// Outcome of [`run_all`]: finished jobs in run order plus the names of those that failed.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub jobs: Vec<JobReport>,
    pub webp: Option<ConversionReport>,
    pub failures: Vec<String>,
}

/// Run every enabled job. A failing job is logged and recorded; the rest still run.
pub async fn run_all(cfg: &SpritesConfig, http: &HttpFetcher, base_dir: &Path) -> RunSummary {
    let mut summary = RunSummary::default();
    let mut record = |name: &str, res: Result<JobReport>| match res {
        Ok(r) => summary.jobs.push(r),
        Err(e) => {
            error!(target: "pipeline", "{name}: {e:#}");
            summary.failures.push(name.to_string());
        }
    };
    if cfg.github.enabled {
        record("github", run_github(cfg, http).await);
    }
    if cfg.opencollective.enabled {
        record("opencollective", run_opencollective(cfg, http).await);
    }
    if cfg.testimonials.enabled {
        record("testimonials", run_testimonials(cfg, http, base_dir).await);
    }
    if cfg.webp.enabled {
        match webp::convert_all(&cfg.webp) {
            Ok(r) => summary.webp = Some(r),
            Err(e) => {
                error!(target: "webp", "{e:#}");
                summary.failures.push("webp".into());
            }
        }
    }
    summary
}
