//! Local working copies of remote repositories.
//!
//! A [`Snapshot`] exclusively owns `<clone_dir>/<owner>__<repo>` for its whole
//! lifetime: a second analysis of the same repository is refused while the
//! first is in flight, and the directory is removed by [`Snapshot::cleanup`]
//! or, failing that, when the handle drops.

use async_trait::async_trait;
use std::{
    collections::HashSet,
    fs,
    io::{Cursor, Read, Write},
    path::{Component, Path, PathBuf},
    sync::{Mutex, OnceLock},
    time::Duration,
};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::AnalyzeError;

const ACCEPTED_PREFIXES: &[&str] = &["https://github.com/", "http://github.com/"];
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    /// The locator exactly as given, minus surrounding whitespace.
    pub url: String,
    pub owner: String,
    pub repo: String,
    /// Branch or tag from a `/tree/<ref>` suffix.
    pub reference: Option<String>,
}

impl RepoLocator {
    pub fn parse(input: &str) -> Result<Self, AnalyzeError> {
        let url = input.trim();
        let rest = ACCEPTED_PREFIXES
            .iter()
            .find_map(|prefix| url.strip_prefix(prefix))
            .ok_or_else(|| AnalyzeError::invalid_input("Invalid GitHub URL. Must start with https://github.com/"))?;

        let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
        if parts.len() < 2 {
            return Err(AnalyzeError::invalid_input(format!(
                "expected https://github.com/<owner>/<repo>, got {}",
                url
            )));
        }
        let owner = parts[0].to_string();
        let repo = parts[1].trim_end_matches(".git").to_string();
        if !is_valid_segment(&owner) || !is_valid_segment(&repo) {
            return Err(AnalyzeError::invalid_input(format!(
                "not a repository path: {}/{}",
                parts[0], parts[1]
            )));
        }

        let reference = match &parts[2..] {
            [] => None,
            ["tree", reference, ..] => Some(reference.to_string()),
            _ => {
                return Err(AnalyzeError::invalid_input(format!(
                    "unsupported repository URL: {}",
                    url
                )))
            }
        };

        Ok(Self {
            url: url.to_string(),
            owner,
            repo,
            reference,
        })
    }

    /// Display name of the repository: the last path segment without `.git`.
    pub fn name(&self) -> &str {
        &self.repo
    }

    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo)
    }

    fn archive_url(&self) -> String {
        format!(
            "https://codeload.github.com/{}/{}/zip/{}",
            self.owner,
            self.repo,
            self.reference.as_deref().unwrap_or("HEAD")
        )
    }

    fn snapshot_dir_name(&self) -> String {
        format!("{}__{}", self.owner, self.repo)
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn leases() -> &'static Mutex<HashSet<PathBuf>> {
    static LEASES: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();
    LEASES.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Process-wide claim on a snapshot directory.
#[derive(Debug)]
struct SnapshotLease {
    path: PathBuf,
}

impl SnapshotLease {
    fn acquire(path: &Path) -> Result<Self, AnalyzeError> {
        let mut held = leases().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !held.insert(path.to_path_buf()) {
            return Err(AnalyzeError::Conflict(format!(
                "{} is already being analyzed",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for SnapshotLease {
    fn drop(&mut self) {
        let mut held = leases().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        held.remove(&self.path);
    }
}

/// A fetched repository on local disk.
#[derive(Debug)]
pub struct Snapshot {
    root: PathBuf,
    dir: PathBuf,
    _lease: SnapshotLease,
}

impl Snapshot {
    /// Directory holding the repository's files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes the directory without blocking the runtime. Dropping the
    /// handle without calling this still removes it, synchronously.
    pub async fn cleanup(self) {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => info!(path = %self.dir.display(), "cleaned up snapshot"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.dir.display(), error = %e, "failed to remove snapshot"),
        }
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        if !self.dir.exists() {
            return;
        }
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => info!(path = %self.dir.display(), "cleaned up snapshot"),
            Err(e) => warn!(path = %self.dir.display(), error = %e, "failed to remove snapshot"),
        }
    }
}

/// Fetches a repository into `dest` and returns the directory holding its files.
#[async_trait]
pub trait Cloner: Send + Sync {
    async fn fetch(&self, locator: &RepoLocator, dest: &Path) -> Result<PathBuf, AnalyzeError>;
}

/// Claims the snapshot location, clears leftovers from an earlier run and
/// fetches into it. The directory is removed again if fetching fails.
pub async fn prepare_snapshot(
    cloner: &dyn Cloner,
    locator: &RepoLocator,
    clone_dir: &Path,
) -> Result<Snapshot, AnalyzeError> {
    let dir = clone_dir.join(locator.snapshot_dir_name());
    let lease = SnapshotLease::acquire(&dir)?;

    if dir.exists() {
        debug!(path = %dir.display(), "removing stale snapshot");
        tokio::fs::remove_dir_all(&dir).await?;
    }
    tokio::fs::create_dir_all(clone_dir).await?;

    let mut snapshot = Snapshot {
        root: dir.clone(),
        dir,
        _lease: lease,
    };
    info!(repo = %locator.url, path = %snapshot.dir.display(), "fetching repository");
    snapshot.root = cloner.fetch(locator, &snapshot.dir).await?;
    Ok(snapshot)
}

/// Downloads the GitHub zip archive of the requested ref.
#[derive(Debug, Clone)]
pub struct ArchiveCloner {
    http: reqwest::Client,
    max_bytes: u64,
}

impl ArchiveCloner {
    pub fn new(max_bytes: u64) -> Result<Self, AnalyzeError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("repovision/", env!("CARGO_PKG_VERSION")))
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { http, max_bytes })
    }

    async fn download(&self, locator: &RepoLocator) -> Result<Vec<u8>, AnalyzeError> {
        let mut resp = self.http.get(locator.archive_url()).send().await?;
        let status = resp.status().as_u16();
        match status {
            200..=299 => {}
            404 => return Err(AnalyzeError::NotFound(locator.url.clone())),
            401 | 403 => return Err(AnalyzeError::AuthRequired(locator.url.clone())),
            _ => {
                return Err(AnalyzeError::transport(format!(
                    "archive download failed: HTTP {}",
                    status
                )))
            }
        }

        if resp.content_length().map_or(false, |len| len > self.max_bytes) {
            return Err(too_large(self.max_bytes));
        }

        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = resp.chunk().await? {
            if (buf.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large(self.max_bytes));
            }
            buf.extend_from_slice(&chunk);
        }
        debug!(bytes = buf.len(), "archive downloaded");
        Ok(buf)
    }
}

#[async_trait]
impl Cloner for ArchiveCloner {
    async fn fetch(&self, locator: &RepoLocator, dest: &Path) -> Result<PathBuf, AnalyzeError> {
        let bytes = self.download(locator).await?;
        let dest = dest.to_path_buf();
        let max_bytes = self.max_bytes;
        tokio::task::spawn_blocking(move || extract_zip_to_dir(&bytes, &dest, max_bytes))
            .await
            .map_err(|e| AnalyzeError::transport(format!("extraction task failed: {}", e)))?
    }
}

fn too_large(max_bytes: u64) -> AnalyzeError {
    AnalyzeError::transport(format!(
        "repository archive exceeds {} MB",
        max_bytes / (1024 * 1024)
    ))
}

/// Unpacks `zip_bytes` into `dest`, writing at most `max_bytes` in total.
/// Archives holding a single top-level directory (as GitHub's do) yield that
/// directory.
fn extract_zip_to_dir(zip_bytes: &[u8], dest: &Path, max_bytes: u64) -> Result<PathBuf, AnalyzeError> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    fs::create_dir_all(dest)?;
    let mut written: u64 = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let out_rel = sanitize_zip_path(file.name())?;
        let out_path = dest.join(out_rel);

        if file.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let remaining = max_bytes - written;
        // declared sizes can lie, so the copy itself is bounded too
        if file.size() > remaining {
            return Err(too_large(max_bytes));
        }
        let mut out = fs::File::create(&out_path)?;
        let copied = std::io::copy(&mut (&mut file).take(remaining + 1), &mut out)?;
        if copied > remaining {
            return Err(too_large(max_bytes));
        }
        written += copied;
        out.flush()?;
    }

    let mut top_dirs: Vec<PathBuf> = fs::read_dir(dest)?
        .flatten()
        .map(|entry| entry.path())
        .collect();
    if top_dirs.len() == 1 && top_dirs[0].is_dir() {
        Ok(top_dirs.remove(0))
    } else {
        Ok(dest.to_path_buf())
    }
}

fn sanitize_zip_path(name: &str) -> Result<PathBuf, AnalyzeError> {
    let mut out = PathBuf::new();
    for comp in Path::new(name).components() {
        match comp {
            Component::Normal(s) => out.push(s),
            Component::CurDir => {}
            _ => {
                return Err(AnalyzeError::transport(format!(
                    "archive entry escapes the snapshot: {}",
                    name
                )))
            }
        }
    }
    Ok(out)
}

/// Shallow clone through the `git` executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCloner;

#[async_trait]
impl Cloner for GitCloner {
    async fn fetch(&self, locator: &RepoLocator, dest: &Path) -> Result<PathBuf, AnalyzeError> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.arg("clone").arg("--depth").arg("1");
        if let Some(reference) = &locator.reference {
            cmd.arg("--branch").arg(reference);
        }
        cmd.arg(locator.clone_url())
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0");

        let output = cmd
            .output()
            .await
            .map_err(|e| AnalyzeError::transport(format!("cannot run git: {}", e)))?;
        if output.status.success() {
            return Ok(dest.to_path_buf());
        }
        Err(classify_git_failure(
            &locator.url,
            &String::from_utf8_lossy(&output.stderr),
        ))
    }
}

fn classify_git_failure(url: &str, stderr: &str) -> AnalyzeError {
    let lowered = stderr.to_lowercase();
    if lowered.contains("not found") {
        AnalyzeError::NotFound(url.to_string())
    } else if lowered.contains("authentication") || lowered.contains("could not read username") {
        AnalyzeError::AuthRequired(url.to_string())
    } else if lowered.contains("already exists") {
        AnalyzeError::Conflict(format!("clone target for {} already exists", url))
    } else {
        AnalyzeError::transport(format!("git clone failed: {}", stderr.trim()))
    }
}
