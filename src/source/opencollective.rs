//! Open Collective members listing (`members/all.json`).

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use super::{HttpFetcher, SourceEntry};
use crate::config::OpenCollectiveJob;

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<Member> for SourceEntry {
    fn from(m: Member) -> Self {
        SourceEntry::new(m.name, m.image)
    }
}

pub async fn list_members(http: &HttpFetcher, job: &OpenCollectiveJob) -> Result<Vec<SourceEntry>> {
    let members: Vec<Member> = http.get_json(&job.members_url, None).await?;
    info!(target: "opencollective", "total members found: {}", members.len());
    Ok(members.into_iter().map(SourceEntry::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_members_with_null_and_missing_images() {
        let js = r#"[
            {"MemberId":1,"name":"Acme Inc","image":"https://images.opencollective.com/acme/logo.png","role":"BACKER"},
            {"MemberId":2,"name":"Guest","image":null},
            {"MemberId":3,"name":"Incognito"}
        ]"#;
        let members: Vec<Member> = serde_json::from_str(js).unwrap();
        let entries: Vec<SourceEntry> = members.into_iter().map(Into::into).collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].id, "Acme Inc");
        assert!(entries[0].avatar_url.is_some());
        assert!(entries[1].avatar_url.is_none());
        assert!(entries[2].avatar_url.is_none());
    }
}
