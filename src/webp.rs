//! Convert the repository's PNG/JPEG assets to WebP siblings.

use anyhow::{Context, Result};
use image::{codecs::webp::WebPEncoder, ExtendedColorType, ImageEncoder};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::config::WebpJob;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub converted: Vec<PathBuf>,
    /// A `.webp` sibling already existed.
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

fn is_convertible(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false)
}

pub fn webp_path_for(path: &Path) -> PathBuf {
    path.with_extension("webp")
}

/// Every PNG/JPEG under `root` (case-insensitive extension), sorted. Directories
/// whose name appears in `exclude` are not descended into.
pub fn find_images(root: &Path, exclude: &[String]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).with_context(|| format!("read dir {}", dir.display()))? {
            let entry = entry?;
            let path = entry.path();
            let ty = entry.file_type()?;
            if ty.is_dir() {
                let name = entry.file_name();
                if exclude.iter().any(|x| name.to_str() == Some(x.as_str())) {
                    debug!(target: "webp", "skipping excluded dir {}", path.display());
                    continue;
                }
                stack.push(path);
            } else if ty.is_file() && is_convertible(&path) {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

pub fn convert_image(src: &Path, dst: &Path) -> Result<()> {
    let img = image::open(src).with_context(|| format!("decode {}", src.display()))?.to_rgba8();
    let mut buf = Vec::new();
    WebPEncoder::new_lossless(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .with_context(|| format!("encode {}", dst.display()))?;
    fs::write(dst, buf).with_context(|| format!("write {}", dst.display()))
}

/// Convert everything `find_images` returns. Per-file failures are logged and
/// recorded; the run continues.
pub fn convert_all(job: &WebpJob) -> Result<ConversionReport> {
    let mut report = ConversionReport::default();
    for src in find_images(&job.root, &job.exclude)? {
        let dst = webp_path_for(&src);
        if dst.exists() && !job.overwrite {
            report.skipped.push(src);
            continue;
        }
        match convert_image(&src, &dst) {
            Ok(()) => {
                info!(target: "webp", "{} -> {}", src.display(), dst.display());
                report.converted.push(src);
            }
            Err(e) => {
                warn!(target: "webp", "failed to convert {}: {e:#}", src.display());
                report.failed.push((src, format!("{e:#}")));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 255])).save_with_format(path, image::ImageFormat::Png).unwrap();
    }

    #[test]
    fn finds_png_and_jpeg_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_png(&root.join("a.png"));
        write_png(&root.join("docs/img/B.PNG"));
        fs::write(root.join("docs/photo.JPeG"), b"x").unwrap();
        fs::write(root.join("docs/readme.md"), b"x").unwrap();
        write_png(&root.join("node_modules/pkg/icon.png"));
        let found = find_images(root, &["node_modules".to_string()]).unwrap();
        let rel: Vec<_> = found.iter().map(|p| p.strip_prefix(root).unwrap().to_path_buf()).collect();
        assert_eq!(
            rel,
            [PathBuf::from("a.png"), PathBuf::from("docs/img/B.PNG"), PathBuf::from("docs/photo.JPeG")]
        );
    }

    #[test]
    fn webp_sibling_path() {
        assert_eq!(webp_path_for(Path::new("img/logo.JPG")), PathBuf::from("img/logo.webp"));
    }

    #[test]
    fn converts_missing_and_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_png(&root.join("one.png"));
        write_png(&root.join("sub/two.png"));
        fs::write(root.join("sub/two.webp"), b"existing").unwrap();
        fs::write(root.join("broken.jpg"), b"not a jpeg").unwrap();

        let job = WebpJob { root: root.to_path_buf(), ..Default::default() };
        let report = convert_all(&job).unwrap();
        assert_eq!(report.converted, [root.join("one.png")]);
        assert_eq!(report.skipped, [root.join("sub/two.png")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, root.join("broken.jpg"));

        let out = image::open(root.join("one.webp")).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.get_pixel(1, 1).0, [9, 8, 7, 255]);
        assert_eq!(fs::read(root.join("sub/two.webp")).unwrap(), b"existing");

        // second run: nothing new to convert
        let again = convert_all(&job).unwrap();
        assert!(again.converted.is_empty());
        assert_eq!(again.skipped.len(), 2);
    }

    #[test]
    fn overwrite_reencodes_existing() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("x.png"));
        fs::write(dir.path().join("x.webp"), b"stale").unwrap();
        let job = WebpJob { root: dir.path().to_path_buf(), overwrite: true, ..Default::default() };
        let report = convert_all(&job).unwrap();
        assert_eq!(report.converted.len(), 1);
        assert!(image::open(dir.path().join("x.webp")).is_ok());
    }
}
