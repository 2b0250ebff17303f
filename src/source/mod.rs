//! Tile sources: list the people to render, download their avatars, and turn
//! them into ordered, fixed-size tiles ready for layout.
//!
//! Entry order is preserved end to end; the sprite manifest relies on it.

pub mod fetch;
pub mod github;
pub mod opencollective;
pub mod testimonials;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use image::{imageops::FilterType, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::config::FailurePolicy;

pub use fetch::{HttpFetcher, ImageFetcher};

/// One listed item before its avatar is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Login / display name written to the manifest.
    pub id: String,
    pub avatar_url: Option<String>,
}

impl SourceEntry {
    pub fn new(id: impl Into<String>, avatar_url: Option<String>) -> Self {
        Self { id: id.into(), avatar_url: avatar_url.filter(|u| !u.trim().is_empty()) }
    }
}

/// A square avatar normalised to the job's tile size.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: String,
    pub image: RgbaImage,
    /// `false` for transparent placeholders.
    pub has_image: bool,
}

impl Tile {
    pub fn placeholder(id: impl Into<String>, size: u32) -> Self {
        Self { id: id.into(), image: RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0])), has_image: false }
    }

    pub fn from_encoded(id: impl Into<String>, bytes: &[u8], size: u32) -> Result<Self> {
        let id = id.into();
        let image = normalize_avatar(bytes, size).with_context(|| format!("decode avatar for {id}"))?;
        Ok(Self { id, image, has_image: true })
    }
}

/// Decode any supported format and crop-to-fill into a `size`×`size` RGBA square.
pub fn normalize_avatar(bytes: &[u8], size: u32) -> Result<RgbaImage> {
    let img = image::load_from_memory(bytes)?;
    if img.width() == size && img.height() == size {
        return Ok(img.to_rgba8());
    }
    Ok(img.resize_to_fill(size, size, FilterType::Lanczos3).to_rgba8())
}

/// Tiles in entry order plus the ids whose avatar could not be used.
#[derive(Debug, Default)]
pub struct CollectedTiles {
    pub tiles: Vec<Tile>,
    pub failed: Vec<String>,
}

impl CollectedTiles {
    pub fn placeholder_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.has_image).count()
    }
}

/// Download and normalise every entry's avatar, `concurrency` at a time, keeping entry order.
///
/// Entries without an avatar URL always become placeholders. Fetch or decode
/// failures follow `policy`.
pub async fn collect_tiles<F>(
    entries: Vec<SourceEntry>,
    fetcher: &F,
    tile_size: u32,
    policy: FailurePolicy,
    concurrency: usize,
) -> CollectedTiles
where
    F: ImageFetcher + ?Sized,
{
    let results: Vec<(SourceEntry, Option<Result<Tile>>)> = stream::iter(entries)
        .map(|entry| async move {
            let Some(url) = entry.avatar_url.clone() else {
                return (entry, None);
            };
            let res = match fetcher.fetch(&url).await {
                Ok(bytes) => Tile::from_encoded(entry.id.clone(), &bytes, tile_size),
                Err(e) => Err(e.context(format!("fetch {url}"))),
            };
            (entry, Some(res))
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut out = CollectedTiles::default();
    for (entry, res) in results {
        match res {
            None => {
                debug!(target: "source", "{} has no avatar; using placeholder", entry.id);
                out.tiles.push(Tile::placeholder(entry.id, tile_size));
            }
            Some(Ok(tile)) => {
                debug!(target: "source", "processed avatar for {}", tile.id);
                out.tiles.push(tile);
            }
            Some(Err(e)) => {
                warn!(target: "source", "failed to process image for {}: {e:#}", entry.id);
                if policy == FailurePolicy::Placeholder {
                    out.tiles.push(Tile::placeholder(entry.id.clone(), tile_size));
                }
                out.failed.push(entry.id);
            }
        }
    }
    out
}
