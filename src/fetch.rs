/*!
 * Source file acquisition.
 *
 * Supports fetching code from GitHub (single file or whole directory tree
 * through the contents API) and from the local filesystem. Both fetchers
 * produce the same `SourceFile` list the generation pipeline consumes.
 */

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, info};
use serde::Deserialize;
use url::Url;
use walkdir::WalkDir;

use crate::errors::FetchError;
use crate::script::SourceFile;

const GITHUB_API_BASE: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";
const USER_AGENT: &str = concat!("codecast/", env!("CARGO_PKG_VERSION"));

/// What a GitHub URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GithubTarget {
    /// A single file (`/blob/` URL)
    File,
    /// A directory tree (`/tree/` URL)
    Directory,
}

/// A parsed `github.com` blob or tree URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubUrl {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub target: GithubTarget,
}

impl GithubUrl {
    /// Parse a browser-style GitHub URL
    ///
    /// Accepts `https://github.com/{owner}/{repo}/blob/{branch}/{path}` for
    /// single files and the `/tree/` form for directories. A bare repository
    /// URL is treated as the root tree on the default branch. Anything else
    /// is rejected up front, without any network round trip.
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let url =
            Url::parse(raw).map_err(|e| FetchError::MalformedUrl(format!("{}: {}", raw, e)))?;

        if url.host_str() != Some("github.com") {
            return Err(FetchError::MalformedUrl(format!(
                "{}: not a github.com URL",
                raw
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let (owner, repo) = match (segments.first(), segments.get(1)) {
            (Some(owner), Some(repo)) => (owner.to_string(), repo.to_string()),
            _ => {
                return Err(FetchError::MalformedUrl(format!(
                    "{}: missing owner or repository",
                    raw
                )));
            }
        };

        match segments.get(2).copied() {
            None => Ok(Self {
                owner,
                repo,
                branch: DEFAULT_BRANCH.to_string(),
                path: String::new(),
                target: GithubTarget::Directory,
            }),
            Some(kind @ ("blob" | "tree")) => {
                let branch = segments
                    .get(3)
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
                let path = segments.get(4..).unwrap_or_default().join("/");
                let target = if kind == "blob" {
                    GithubTarget::File
                } else {
                    GithubTarget::Directory
                };
                if target == GithubTarget::File && path.is_empty() {
                    return Err(FetchError::MalformedUrl(format!(
                        "{}: blob URL without a file path",
                        raw
                    )));
                }
                Ok(Self {
                    owner,
                    repo,
                    branch,
                    path,
                    target,
                })
            }
            Some(other) => Err(FetchError::MalformedUrl(format!(
                "{}: expected /blob/ or /tree/, found /{}/",
                raw, other
            ))),
        }
    }
}

/// One entry from the GitHub contents API
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(default)]
    content: Option<String>,
}

/// Contents API responses are an object for files, an array for directories
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Directory(Vec<ContentsEntry>),
    File(ContentsEntry),
}

/// Fetches source files through the GitHub contents API
#[derive(Debug)]
pub struct GithubFetcher {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GithubFetcher {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: GITHUB_API_BASE.to_string(),
            token,
        }
    }

    /// Point the fetcher at a different API base, for tests
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Fetch every source file the URL refers to
    ///
    /// `file_types` filters directory listings by extension (without the
    /// dot); an empty filter keeps everything. A blob URL always yields
    /// exactly one file regardless of the filter.
    pub async fn fetch(
        &self,
        url: &GithubUrl,
        file_types: &[String],
    ) -> Result<Vec<SourceFile>, FetchError> {
        match url.target {
            GithubTarget::File => {
                let entry = self.fetch_file_entry(url, &url.path).await?;
                Ok(vec![decode_entry(&entry)?])
            }
            GithubTarget::Directory => self.fetch_tree(url, file_types).await,
        }
    }

    /// Walk a directory tree iteratively, one contents call per directory
    async fn fetch_tree(
        &self,
        url: &GithubUrl,
        file_types: &[String],
    ) -> Result<Vec<SourceFile>, FetchError> {
        let mut files = Vec::new();
        let mut pending = vec![url.path.clone()];

        while let Some(dir_path) = pending.pop() {
            debug!("Listing {}/{}: {}", url.owner, url.repo, dir_path);
            let entries = match self.list_directory(url, &dir_path).await? {
                ContentsResponse::Directory(entries) => entries,
                // A tree URL can still resolve to a file path
                ContentsResponse::File(entry) => {
                    files.push(decode_entry(&entry)?);
                    continue;
                }
            };

            for entry in entries {
                match entry.entry_type.as_str() {
                    "dir" => pending.push(entry.path),
                    "file" => {
                        if !matches_file_types(&entry.name, file_types) {
                            continue;
                        }
                        // Directory listings omit file bodies, fetch each one
                        let full = self.fetch_file_entry(url, &entry.path).await?;
                        files.push(decode_entry(&full)?);
                    }
                    other => debug!("Ignoring {} entry {}", other, entry.path),
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        info!(
            "Fetched {} file(s) from {}/{}",
            files.len(),
            url.owner,
            url.repo
        );
        Ok(files)
    }

    async fn list_directory(
        &self,
        url: &GithubUrl,
        path: &str,
    ) -> Result<ContentsResponse, FetchError> {
        let response = self.contents_request(url, path).await?;
        response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("invalid contents response: {}", e)))
    }

    async fn fetch_file_entry(
        &self,
        url: &GithubUrl,
        path: &str,
    ) -> Result<ContentsEntry, FetchError> {
        let response = self.contents_request(url, path).await?;
        match response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| FetchError::RequestFailed(format!("invalid contents response: {}", e)))?
        {
            ContentsResponse::File(entry) => Ok(entry),
            ContentsResponse::Directory(_) => Err(FetchError::RequestFailed(format!(
                "{} resolved to a directory, expected a file",
                path
            ))),
        }
    }

    async fn contents_request(
        &self,
        url: &GithubUrl,
        path: &str,
    ) -> Result<reqwest::Response, FetchError> {
        let request_url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base, url.owner, url.repo, path, url.branch
        );

        let mut request = self
            .client
            .get(&request_url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed(e.to_string()))?;

        match response.status().as_u16() {
            404 => Err(FetchError::NotFound(format!(
                "{}/{}: {}",
                url.owner, url.repo, path
            ))),
            status if status >= 400 => Err(FetchError::RequestFailed(format!(
                "GitHub API returned {} for {}",
                status, request_url
            ))),
            _ => Ok(response),
        }
    }
}

/// Fetches source files from a local directory or single file
#[derive(Debug, Default)]
pub struct LocalFetcher;

impl LocalFetcher {
    pub fn new() -> Self {
        Self
    }

    /// Collect source files under `root`, filtered by extension
    ///
    /// Paths in the result are relative to `root` with `/` separators, so a
    /// local run and a GitHub run of the same tree produce matching paths.
    pub fn fetch(
        &self,
        root: &Path,
        file_types: &[String],
    ) -> Result<Vec<SourceFile>, FetchError> {
        if !root.exists() {
            return Err(FetchError::NotFound(root.display().to_string()));
        }

        if root.is_file() {
            let content = std::fs::read_to_string(root)
                .map_err(|e| FetchError::File(format!("{}: {}", root.display(), e)))?;
            let name = root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.display().to_string());
            return Ok(vec![SourceFile::new(name, content)]);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| FetchError::File(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !matches_file_types(&name, file_types) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let content = std::fs::read_to_string(entry.path())
                .map_err(|e| FetchError::File(format!("{}: {}", entry.path().display(), e)))?;
            files.push(SourceFile::new(relative, content));
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        info!("Collected {} file(s) under {}", files.len(), root.display());
        Ok(files)
    }
}

/// Decode a contents API file entry into a source file
fn decode_entry(entry: &ContentsEntry) -> Result<SourceFile, FetchError> {
    let encoded = entry
        .content
        .as_deref()
        .ok_or_else(|| FetchError::RequestFailed(format!("{}: missing file content", entry.path)))?;

    // GitHub base64-encodes bodies with embedded newlines
    let stripped: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(stripped.as_bytes())
        .map_err(|e| FetchError::RequestFailed(format!("{}: invalid base64: {}", entry.path, e)))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| FetchError::RequestFailed(format!("{}: not UTF-8: {}", entry.path, e)))?;

    Ok(SourceFile::new(entry.path.clone(), content))
}

/// Whether a file name passes the extension filter
fn matches_file_types(name: &str, file_types: &[String]) -> bool {
    if file_types.is_empty() {
        return true;
    }
    match name.rsplit_once('.') {
        Some((_, ext)) => file_types.iter().any(|t| t.trim_start_matches('.') == ext),
        None => false,
    }
}
