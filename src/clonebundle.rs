//! clonebundle
//!
//! Boundary helpers for advertising pre-generated clone sources.
//!
//! A server hosting a repository may keep a `cinnabar.manifest` file in its
//! repository storage. When present, the server adds the `cinnabarclone`
//! token to its capability list and serves the file verbatim on request.
//! The advertisement itself never looks inside the file.
//!
//! # Manifest Format
//!
//! One source per line:
//!
//! ```text
//! <url>[#<branch>]
//! ```
//!
//! Without a branch, clients try names derived from the repository url
//! (see [`branch_candidates`]) and finally `metadata`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

/// Name of the manifest file inside repository storage.
pub const MANIFEST_FILE: &str = "cinnabar.manifest";

/// Capability token advertised when a manifest exists.
pub const CLONE_CAPABILITY: &str = "cinnabarclone";

/// Branch tried last when a manifest entry names none.
pub const FALLBACK_BRANCH: &str = "metadata";

/// Errors from manifest handling.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("manifest is not valid UTF-8")]
    InvalidUtf8,
}

/// One clone source listed in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Git repository or bundle url
    pub url: String,
    /// Branch to fetch, when the entry names one
    pub branch: Option<String>,
}

/// Read the manifest from `storage_dir`.
///
/// A missing manifest reads as empty; any other I/O failure is an error.
pub fn read_manifest(storage_dir: &Path) -> Result<Vec<u8>, ManifestError> {
    let path = storage_dir.join(MANIFEST_FILE);
    match fs::read(&path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(ManifestError::Read { path, source }),
    }
}

/// Append the clone capability to `caps` if a manifest exists.
pub fn add_clone_capability(storage_dir: &Path, caps: &mut Vec<String>) {
    if storage_dir.join(MANIFEST_FILE).exists() {
        caps.push(CLONE_CAPABILITY.to_string());
    }
}

/// Same as [`add_clone_capability`] for a space-separated capability string.
pub fn advertise_capabilities(storage_dir: &Path, caps: &str) -> String {
    let mut list: Vec<String> = caps.split_whitespace().map(str::to_string).collect();
    add_clone_capability(storage_dir, &mut list);
    list.join(" ")
}

/// Parse manifest contents into entries. Blank lines are skipped.
pub fn parse_manifest(contents: &[u8]) -> Result<Vec<ManifestEntry>, ManifestError> {
    let text = std::str::from_utf8(contents).map_err(|_| ManifestError::InvalidUtf8)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('#') {
            Some((url, branch)) if !branch.is_empty() => ManifestEntry {
                url: url.to_string(),
                branch: Some(branch.to_string()),
            },
            Some((url, _)) => ManifestEntry {
                url: url.to_string(),
                branch: None,
            },
            None => ManifestEntry {
                url: line.to_string(),
                branch: None,
            },
        })
        .collect())
}

/// Branch names to try for a manifest entry without an explicit branch.
///
/// For `proto://server/dir_a/dir_b/repo` this is `repo`, `dir_b/repo`,
/// `dir_a/dir_b/repo`, `server/dir_a/dir_b/repo`, then `metadata`.
/// Inputs that do not parse as urls are treated as plain paths.
pub fn branch_candidates(repo_url: &str) -> Vec<String> {
    let mut parts: Vec<String> = match Url::parse(repo_url) {
        Ok(url) => url
            .host_str()
            .map(str::to_string)
            .into_iter()
            .chain(
                url.path_segments()
                    .into_iter()
                    .flatten()
                    .map(str::to_string),
            )
            .collect(),
        Err(_) => repo_url.split('/').map(str::to_string).collect(),
    };
    parts.retain(|part| !part.is_empty());

    let mut candidates: Vec<String> = (0..parts.len())
        .rev()
        .map(|start| parts[start..].join("/"))
        .collect();
    candidates.push(FALLBACK_BRANCH.to_string());
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_manifest_reads_empty() {
        let temp = TempDir::new().unwrap();
        assert!(read_manifest(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn manifest_read_verbatim() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), b"https://example.com/repo.git\n").unwrap();
        assert_eq!(
            read_manifest(temp.path()).unwrap(),
            b"https://example.com/repo.git\n"
        );
    }

    #[test]
    fn capability_added_only_with_manifest() {
        let temp = TempDir::new().unwrap();
        let mut caps = vec!["lookup".to_string(), "branchmap".to_string()];

        add_clone_capability(temp.path(), &mut caps);
        assert_eq!(caps.len(), 2);

        fs::write(temp.path().join(MANIFEST_FILE), b"").unwrap();
        add_clone_capability(temp.path(), &mut caps);
        assert_eq!(caps.last().map(String::as_str), Some(CLONE_CAPABILITY));
    }

    #[test]
    fn advertise_joins_with_spaces() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(MANIFEST_FILE), b"x").unwrap();
        assert_eq!(
            advertise_capabilities(temp.path(), "lookup  branchmap"),
            "lookup branchmap cinnabarclone"
        );
    }

    #[test]
    fn parse_entries_with_and_without_branch() {
        let manifest: &[u8] = b"https://example.com/a.git#refs/heads/meta\n\n\
            https://example.com/b.bundle\n\
            https://c#\n";
        let entries = parse_manifest(manifest).unwrap();
        assert_eq!(
            entries,
            vec![
                ManifestEntry {
                    url: "https://example.com/a.git".into(),
                    branch: Some("refs/heads/meta".into()),
                },
                ManifestEntry {
                    url: "https://example.com/b.bundle".into(),
                    branch: None,
                },
                ManifestEntry {
                    url: "https://c".into(),
                    branch: None,
                },
            ]
        );
    }

    #[test]
    fn non_utf8_manifest_rejected() {
        assert!(matches!(
            parse_manifest(b"\xff"),
            Err(ManifestError::InvalidUtf8)
        ));
    }

    #[test]
    fn candidates_from_url() {
        assert_eq!(
            branch_candidates("https://server/dir_a/dir_b/repo"),
            vec![
                "repo",
                "dir_b/repo",
                "dir_a/dir_b/repo",
                "server/dir_a/dir_b/repo",
                "metadata",
            ]
        );
    }

    #[test]
    fn candidates_ignore_trailing_slash() {
        assert_eq!(
            branch_candidates("ssh://server/repo/"),
            vec!["repo", "server/repo", "metadata"]
        );
    }

    #[test]
    fn candidates_from_plain_path() {
        assert_eq!(
            branch_candidates("dir/repo"),
            vec!["repo", "dir/repo", "metadata"]
        );
    }
}
