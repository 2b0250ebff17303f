//! Testimonial authors read from the repository's `testimonials.json`.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use super::SourceEntry;
use crate::config::TestimonialsJob;

#[derive(Debug, Deserialize)]
struct TestimonialsFile {
    #[serde(default)]
    tweets: Vec<Testimonial>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Testimonial {
    pub username: String,
}

pub fn avatar_url(template: &str, username: &str) -> String {
    template.replace("{username}", username)
}

pub fn parse_testimonials(json: &str) -> Result<Vec<Testimonial>> {
    let file: TestimonialsFile = serde_json::from_str(json).context("parse testimonials json")?;
    Ok(file.tweets)
}

/// Read the testimonials file and build one entry per tweet author, in file order.
pub fn list_testimonials(job: &TestimonialsJob, base_dir: &Path) -> Result<Vec<SourceEntry>> {
    let path = base_dir.join(&job.data_file);
    let txt = fs::read_to_string(&path).with_context(|| format!("read testimonials file {}", path.display()))?;
    let testimonials = parse_testimonials(&txt)?;
    if testimonials.is_empty() {
        bail!("no testimonials found in {}", path.display());
    }
    Ok(testimonials
        .into_iter()
        .map(|t| {
            let url = avatar_url(&job.avatar_url_template, &t.username);
            SourceEntry::new(t.username, Some(url))
        })
        .collect())
}
