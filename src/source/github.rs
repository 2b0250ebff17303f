//! GitHub repository contributors (paginated REST listing).

use std::future::Future;

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use super::{HttpFetcher, SourceEntry};
use crate::config::GithubJob;

#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<Contributor> for SourceEntry {
    fn from(c: Contributor) -> Self {
        SourceEntry::new(c.login, c.avatar_url)
    }
}

pub fn contributors_url(job: &GithubJob, page: u32) -> String {
    format!(
        "{}/repos/{}/contributors?page={page}&per_page={}",
        job.api_base.trim_end_matches('/'),
        job.repo,
        job.per_page
    )
}

/// Request pages starting at 1 until one comes back empty or shorter than `per_page`.
pub async fn paginate<T, F, Fut>(per_page: u32, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut all = Vec::new();
    let mut page = 1;
    loop {
        let items = fetch_page(page).await?;
        let n = items.len();
        if n == 0 {
            break;
        }
        all.extend(items);
        if n < per_page as usize {
            info!(target: "github", "page {page} returned {n} items (less than {per_page}); stopping");
            break;
        }
        info!(target: "github", "page {page} returned {n} items; fetching next page");
        page += 1;
    }
    Ok(all)
}

/// List every contributor of `job.repo`, in the order GitHub returns them.
pub async fn list_contributors(http: &HttpFetcher, job: &GithubJob, token: Option<&str>) -> Result<Vec<SourceEntry>> {
    let contributors: Vec<Contributor> = paginate(job.per_page, |page| {
        let url = contributors_url(job, page);
        async move {
            info!(target: "github", "fetching page {page}");
            http.get_json::<Vec<Contributor>>(&url, token).await
        }
    })
    .await?;
    info!(target: "github", "total contributors found: {}", contributors.len());
    Ok(contributors.into_iter().map(SourceEntry::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn builds_api_url() {
        let job = GithubJob { api_base: "https://api.github.com/".into(), ..Default::default() };
        assert_eq!(
            contributors_url(&job, 3),
            "https://api.github.com/repos/saadeghi/daisyui/contributors?page=3&per_page=100"
        );
    }

    #[test]
    fn parses_contributor_payload() {
        let js = r#"[{"login":"saadeghi","id":1,"avatar_url":"https://avatars/1","type":"User"},{"login":"bot","avatar_url":null}]"#;
        let parsed: Vec<Contributor> = serde_json::from_str(js).unwrap();
        let entries: Vec<SourceEntry> = parsed.into_iter().map(Into::into).collect();
        assert_eq!(entries[0], SourceEntry::new("saadeghi", Some("https://avatars/1".into())));
        assert_eq!(entries[1].avatar_url, None);
    }

    #[tokio::test]
    async fn stops_on_short_page() {
        let pages = RefCell::new(Vec::new());
        let all = paginate(2, |page| {
            pages.borrow_mut().push(page);
            async move {
                Ok(match page {
                    1 => vec![1, 2],
                    2 => vec![3],
                    _ => panic!("requested page {page} after a short page"),
                })
            }
        })
        .await
        .unwrap();
        assert_eq!(all, [1, 2, 3]);
        assert_eq!(*pages.borrow(), [1, 2]);
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let all = paginate(2, |page| async move { Ok(if page <= 2 { vec![page, page] } else { vec![] }) })
            .await
            .unwrap();
        assert_eq!(all, [1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn propagates_page_errors() {
        let res: Result<Vec<u32>> = paginate(2, |_| async { Err(anyhow::anyhow!("401 Unauthorized")) }).await;
        assert!(res.unwrap_err().to_string().contains("401"));
    }
}
