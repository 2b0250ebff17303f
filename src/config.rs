// Sprite job configuration (pure data; loaded once at startup and passed down).
// Provides: data structures, layered RON loading, validation producing warnings (non-fatal), and tests.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::layout::WEBP_MAX_DIMENSION;

// Enums are spelled as strings in config files (`on_failure: "drop"`) so they
// survive the untyped `ron::Value` merge in `load_layered`.

/// What to do with an entry whose avatar cannot be fetched or decoded.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(try_from = "String", into = "String")]
pub enum FailurePolicy {
    /// Keep the entry with a fully transparent tile (tile count unchanged).
    #[default]
    Placeholder,
    /// Remove the entry from the sprite and the manifest.
    Drop,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(try_from = "String", into = "String")]
pub enum SpriteFormat {
    #[default]
    Webp,
    Png,
}

impl TryFrom<String> for FailurePolicy {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "placeholder" => Ok(Self::Placeholder),
            "drop" => Ok(Self::Drop),
            other => Err(format!("unknown failure policy '{other}' (expected placeholder|drop)")),
        }
    }
}
impl From<FailurePolicy> for String {
    fn from(p: FailurePolicy) -> Self {
        match p {
            FailurePolicy::Placeholder => "placeholder".into(),
            FailurePolicy::Drop => "drop".into(),
        }
    }
}

impl TryFrom<String> for SpriteFormat {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "webp" => Ok(Self::Webp),
            "png" => Ok(Self::Png),
            other => Err(format!("unknown sprite format '{other}' (expected webp|png)")),
        }
    }
}
impl From<SpriteFormat> for String {
    fn from(f: SpriteFormat) -> Self {
        match f {
            SpriteFormat::Webp => "webp".into(),
            SpriteFormat::Png => "png".into(),
        }
    }
}

impl SpriteFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SpriteFormat::Webp => "webp",
            SpriteFormat::Png => "png",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GithubJob {
    pub enabled: bool,
    /// `owner/name`
    pub repo: String,
    pub api_base: String,
    pub per_page: u32,
    /// Name of the environment variable holding the API token (read at run time).
    pub token_env: String,
    pub tile_size: u32,
    /// Relative paths resolve against `SpritesConfig::output_dir`.
    pub image: PathBuf,
    pub manifest: Option<PathBuf>,
    pub format: SpriteFormat,
    pub on_failure: FailurePolicy,
}
impl Default for GithubJob {
    fn default() -> Self {
        Self {
            enabled: true,
            repo: "saadeghi/daisyui".into(),
            api_base: "https://api.github.com".into(),
            per_page: 100,
            token_env: "GH_API_KEY".into(),
            tile_size: 64,
            image: "github/contributors.webp".into(),
            manifest: Some("github/contributors.json".into()),
            format: SpriteFormat::Webp,
            on_failure: FailurePolicy::Placeholder,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct OpenCollectiveJob {
    pub enabled: bool,
    pub members_url: String,
    pub tile_size: u32,
    pub image: PathBuf,
    pub manifest: Option<PathBuf>,
    pub format: SpriteFormat,
    pub on_failure: FailurePolicy,
}
impl Default for OpenCollectiveJob {
    fn default() -> Self {
        Self {
            enabled: true,
            members_url: "https://opencollective.com/daisyui/members/all.json".into(),
            tile_size: 64,
            image: "open-collective/contributors.webp".into(),
            manifest: Some("open-collective/contributors.json".into()),
            format: SpriteFormat::Webp,
            on_failure: FailurePolicy::Placeholder,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TestimonialsJob {
    pub enabled: bool,
    pub data_file: PathBuf,
    /// `{username}` is replaced with the testimonial author's handle.
    pub avatar_url_template: String,
    pub tile_size: u32,
    pub image: PathBuf,
    pub manifest: Option<PathBuf>,
    pub format: SpriteFormat,
    pub on_failure: FailurePolicy,
}
impl Default for TestimonialsJob {
    fn default() -> Self {
        Self {
            enabled: true,
            data_file: "data/testimonials.json".into(),
            avatar_url_template: "https://unavatar.io/x/{username}?fallback=false".into(),
            tile_size: 72,
            image: "x.webp".into(),
            manifest: None,
            format: SpriteFormat::Webp,
            on_failure: FailurePolicy::Placeholder,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WebpJob {
    pub enabled: bool,
    pub root: PathBuf,
    /// Directory names skipped during the recursive scan.
    pub exclude: Vec<String>,
    /// Re-encode even when a `.webp` sibling already exists.
    pub overwrite: bool,
}
impl Default for WebpJob {
    fn default() -> Self {
        Self {
            enabled: true,
            root: ".".into(),
            exclude: vec![".git".into(), "node_modules".into(), "target".into()],
            overwrite: false,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpritesConfig {
    pub output_dir: PathBuf,
    /// Maximum sprite width in pixels; rows wrap once the next tile would exceed it.
    pub max_width: u32,
    /// Concurrent avatar downloads per job.
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub github: GithubJob,
    pub opencollective: OpenCollectiveJob,
    pub testimonials: TestimonialsJob,
    pub webp: WebpJob,
}
impl Default for SpritesConfig {
    fn default() -> Self {
        Self {
            output_dir: "generated".into(),
            max_width: WEBP_MAX_DIMENSION,
            concurrency: 8,
            request_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.81 Safari/537.36".into(),
            github: Default::default(),
            opencollective: Default::default(),
            testimonials: Default::default(),
            webp: Default::default(),
        }
    }
}

/// Command-line values that win over every config layer.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct ConfigOverrides {
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    pub max_width: Option<u32>,
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
    /// Applies to every sprite job.
    #[arg(long, global = true, value_enum)]
    pub on_failure: Option<FailurePolicy>,
}

impl ConfigOverrides {
    pub fn apply(&self, cfg: &mut SpritesConfig) {
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(w) = self.max_width {
            cfg.max_width = w;
        }
        if let Some(c) = self.concurrency {
            cfg.concurrency = c;
        }
        if let Some(p) = self.on_failure {
            cfg.github.on_failure = p;
            cfg.opencollective.on_failure = p;
            cfg.testimonials.on_failure = p;
        }
    }
}

impl SpritesConfig {
    /// Load from a single RON file (errors contain human-readable context).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    /// Load multiple layers; later overrides earlier (deep merge).
    /// Skips missing files; returns (config, used_paths, errors).
    pub fn load_layered<P, I>(paths: I) -> (Self, Vec<String>, Vec<String>)
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = P>,
    {
        use ron::value::Value;
        let mut merged: Option<Value> = None;
        let mut used = Vec::new();
        let mut errors = Vec::new();

        fn merge_value(base: &mut Value, overlay: Value) {
            match (base, overlay) {
                (Value::Map(bm), Value::Map(om)) => {
                    for (k, v) in om.into_iter() {
                        let mut incoming = Some(v);
                        for (ek, ev) in bm.iter_mut() {
                            if *ek == k {
                                if let Some(val) = incoming.take() {
                                    merge_value(ev, val);
                                }
                                break;
                            }
                        }
                        if let Some(val) = incoming {
                            bm.insert(k, val);
                        }
                    }
                }
                (b, o) => *b = o,
            }
        }

        for p in paths {
            let path_ref = p.as_ref();
            if !path_ref.exists() {
                continue;
            }
            match fs::read_to_string(path_ref) {
                Ok(txt) => match ron::from_str::<Value>(&txt) {
                    Ok(val) => {
                        if let Some(cur) = &mut merged {
                            merge_value(cur, val);
                        } else {
                            merged = Some(val);
                        }
                        used.push(path_ref.display().to_string());
                    }
                    Err(e) => errors.push(format!("{}: parse error: {e}", path_ref.display())),
                },
                Err(e) => errors.push(format!("{}: read error: {e}", path_ref.display())),
            }
        }

        match merged {
            Some(val) => match val.into_rust::<SpritesConfig>() {
                Ok(cfg) => (cfg, used, errors),
                Err(e) => {
                    errors.push(format!("failed to deserialize merged config; using defaults: {e}"));
                    (SpritesConfig::default(), used, errors)
                }
            },
            None => (SpritesConfig::default(), used, errors),
        }
    }

    /// Resolve a job output path against `output_dir` (absolute paths pass through).
    pub fn output_path(&self, rel: &Path) -> PathBuf {
        self.output_dir.join(rel)
    }

    /// Produce validation warnings (non-fatal) for suspicious values.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.max_width == 0 {
            w.push("max_width must be > 0".into());
        }
        if self.max_width > WEBP_MAX_DIMENSION {
            w.push(format!(
                "max_width {} exceeds the WebP dimension limit {WEBP_MAX_DIMENSION}; webp encoding will fail for wide sprites",
                self.max_width
            ));
        }
        if self.concurrency == 0 {
            w.push("concurrency is 0; downloads run one at a time".into());
        }
        if self.request_timeout_secs == 0 {
            w.push("request_timeout_secs is 0; requests have no timeout".into());
        }
        let mut check_tile = |label: &str, size: u32| {
            if size == 0 {
                w.push(format!("{label}.tile_size must be > 0"));
            } else if size > self.max_width {
                w.push(format!("{label}.tile_size {size} larger than max_width {}", self.max_width));
            }
        };
        check_tile("github", self.github.tile_size);
        check_tile("opencollective", self.opencollective.tile_size);
        check_tile("testimonials", self.testimonials.tile_size);
        if !(1..=100).contains(&self.github.per_page) {
            w.push(format!("github.per_page {} outside 1..=100 (API maximum is 100)", self.github.per_page));
        }
        if self.github.repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
            w.push(format!("github.repo '{}' is not of the form owner/name", self.github.repo));
        }
        if !self.testimonials.avatar_url_template.contains("{username}") {
            w.push("testimonials.avatar_url_template has no {username} placeholder".into());
        }
        w
    }
}
