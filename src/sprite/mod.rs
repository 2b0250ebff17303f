//! Sprite compositing, encoding and output.

pub mod manifest;

use anyhow::{bail, Context, Result};
use image::{codecs::webp::WebPEncoder, ExtendedColorType, ImageEncoder, ImageFormat, Rgba, RgbaImage};
use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::config::SpriteFormat;
use crate::layout::Layout;
use crate::source::Tile;

pub use manifest::{ManifestEntry, SpriteManifest};

/// Encoded sprite plus its manifest, ready to be written.
pub struct SpriteArtifact {
    pub bytes: Vec<u8>,
    pub manifest: SpriteManifest,
    pub image_path: PathBuf,
    pub manifest_path: Option<PathBuf>,
}

pub struct Inspection {
    pub tile_size: u32,
    pub tiles_per_row: u32,
    pub row_count: u32,
    pub tile_count: usize,
    pub placeholders: usize,
    pub canvas: (u32, u32),
    pub warnings: Vec<String>,
}

/// Draw `tiles` onto a transparent canvas at the positions `layout` assigns.
pub fn compose(layout: &Layout, tiles: &[Tile]) -> Result<RgbaImage> {
    if tiles.len() != layout.tile_count {
        bail!("layout expects {} tiles, got {}", layout.tile_count, tiles.len());
    }
    let mut canvas = RgbaImage::from_pixel(layout.canvas_width, layout.canvas_height, Rgba([0, 0, 0, 0]));
    for (p, tile) in layout.placements().zip(tiles) {
        if tile.image.dimensions() != (layout.tile_size, layout.tile_size) {
            bail!(
                "tile '{}' is {}x{}, expected {}px square",
                tile.id,
                tile.image.width(),
                tile.image.height(),
                layout.tile_size
            );
        }
        // Tiles never overlap, so a straight copy is equivalent to alpha compositing on transparent.
        image::imageops::replace(&mut canvas, &tile.image, p.x as i64, p.y as i64);
    }
    Ok(canvas)
}

pub fn encode(img: &RgbaImage, format: SpriteFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        SpriteFormat::Webp => WebPEncoder::new_lossless(&mut buf)
            .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
            .context("encode webp")?,
        SpriteFormat::Png => img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).context("encode png")?,
    }
    Ok(buf)
}

pub fn write_outputs(artifact: &SpriteArtifact) -> Result<()> {
    write_file(&artifact.image_path, &artifact.bytes)?;
    if let Some(path) = &artifact.manifest_path {
        let js = serde_json::to_string_pretty(&artifact.manifest)?;
        write_file(path, js.as_bytes())?;
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

/// Summarise an existing manifest, optionally checking the sprite image's size against it.
pub fn inspect(manifest_path: &Path, image_path: Option<&Path>) -> Result<Inspection> {
    let txt = fs::read_to_string(manifest_path).with_context(|| format!("read {}", manifest_path.display()))?;
    let m: SpriteManifest = serde_json::from_str(&txt).context("parse sprite manifest")?;
    let mut warnings = m.check();
    if let Some(p) = image_path {
        let (w, h) = image::image_dimensions(p).with_context(|| format!("read {}", p.display()))?;
        if (w, h) != (m.canvas_width, m.canvas_height) {
            warn!(target: "sprite", "image size mismatch: {w}x{h} vs manifest {}x{}", m.canvas_width, m.canvas_height);
            warnings.push(format!("image is {w}x{h}, manifest says {}x{}", m.canvas_width, m.canvas_height));
        }
    }
    Ok(Inspection {
        tile_size: m.tile_size,
        tiles_per_row: m.tiles_per_row,
        row_count: m.row_count,
        tile_count: m.tile_count,
        placeholders: m.entries.iter().filter(|e| !e.image).count(),
        canvas: (m.canvas_width, m.canvas_height),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;

    fn solid(id: &str, size: u32, c: [u8; 4]) -> Tile {
        Tile { id: id.into(), image: RgbaImage::from_pixel(size, size, Rgba(c)), has_image: true }
    }

    #[test]
    fn compose_places_tiles_row_major() {
        let tiles = vec![
            solid("a", 4, [255, 0, 0, 255]),
            solid("b", 4, [0, 255, 0, 255]),
            solid("c", 4, [0, 0, 255, 255]),
        ];
        let layout = compute_layout(3, 4, 9).unwrap(); // 2 per row
        let img = compose(&layout, &tiles).unwrap();
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(7, 3).0, [0, 255, 0, 255]);
        assert_eq!(img.get_pixel(1, 5).0, [0, 0, 255, 255]);
        // unused cell stays transparent
        assert_eq!(img.get_pixel(6, 6).0, [0, 0, 0, 0]);
    }

    #[test]
    fn compose_rejects_mismatched_inputs() {
        let layout = compute_layout(2, 4, 16).unwrap();
        assert!(compose(&layout, &[solid("a", 4, [0; 4])]).is_err());
        let err = compose(&layout, &[solid("a", 4, [0; 4]), solid("b", 5, [0; 4])]).unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn webp_and_png_decode_back_to_canvas_size() {
        let layout = compute_layout(3, 4, 8).unwrap();
        let tiles: Vec<_> = (0..3).map(|i| solid(&i.to_string(), 4, [10, 20, 30, 255])).collect();
        let img = compose(&layout, &tiles).unwrap();
        for (fmt, want) in [(SpriteFormat::Webp, ImageFormat::WebP), (SpriteFormat::Png, ImageFormat::Png)] {
            let bytes = encode(&img, fmt).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), want);
            let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
            assert_eq!(back.dimensions(), (8, 8));
            assert_eq!(back.get_pixel(1, 5).0, [10, 20, 30, 255]); // lossless
            assert_eq!(back.get_pixel(5, 5).0[3], 0);
        }
    }

    #[test]
    fn write_then_inspect() {
        let dir = tempfile::tempdir().unwrap();
        let layout = compute_layout(3, 4, 8).unwrap();
        let mut tiles: Vec<_> = (0..3).map(|i| solid(&format!("u{i}"), 4, [1, 1, 1, 255])).collect();
        tiles[2] = Tile::placeholder("u2", 4);
        let img = compose(&layout, &tiles).unwrap();
        let artifact = SpriteArtifact {
            bytes: encode(&img, SpriteFormat::Webp).unwrap(),
            manifest: SpriteManifest::new(&layout, &tiles),
            image_path: dir.path().join("nested/sprite.webp"),
            manifest_path: Some(dir.path().join("nested/sprite.json")),
        };
        write_outputs(&artifact).unwrap();
        let res = inspect(artifact.manifest_path.as_deref().unwrap(), Some(artifact.image_path.as_path())).unwrap();
        assert_eq!(res.canvas, (8, 8));
        assert_eq!(res.tiles_per_row, 2);
        assert_eq!(res.row_count, 2);
        assert_eq!(res.tile_count, 3);
        assert_eq!(res.placeholders, 1);
        assert!(res.warnings.is_empty(), "{:?}", res.warnings);
    }

    #[test]
    fn inspect_survives_manifest_with_huge_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.json");
        fs::write(
            &path,
            r#"{"version":1,"tileSize":65536,"tilesPerRow":1,"rowCount":65536,"tileCount":1,"canvasWidth":65536,"canvasHeight":65536,"entries":[{"name":"a","image":true}]}"#,
        )
        .unwrap();
        let res = inspect(&path, None).unwrap();
        assert_eq!(res.tile_size, 65536);
        assert!(!res.warnings.is_empty());
    }
}
