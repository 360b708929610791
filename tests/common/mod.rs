//! Shared fixtures for integration tests.
//!
//! Repositories are created with the real git CLI in a temporary directory.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

use gitpipe::git::Git;

/// Test fixture that creates a real git repository.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository on `main` with an initial commit.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-q"]);
        run_git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);

        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        run_git(dir.path(), &["add", "README.md"]);
        run_git(dir.path(), &["commit", "-q", "-m", "Initial commit"]);

        Self { dir }
    }

    /// Get the path to the repository.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open a client on this repository.
    pub fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// Run git and return its trimmed stdout.
    pub fn output(&self, args: &[&str]) -> String {
        git_output(self.path(), args, None)
    }

    /// Write a file (creating parent directories) and commit it.
    pub fn commit_file(&self, path: &str, content: &[u8], message: &str) -> String {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
        run_git(self.path(), &["add", "--", path]);
        run_git(self.path(), &["commit", "-q", "-m", message]);
        self.output(&["rev-parse", "HEAD"])
    }

    /// Store `content` as a blob and return its id.
    pub fn write_blob(&self, content: &[u8]) -> String {
        git_output(self.path(), &["hash-object", "-w", "--stdin"], Some(content))
    }

    /// Create a tree from `ls-tree`-formatted lines and return its id.
    pub fn mktree(&self, entries: &[String]) -> String {
        let mut input = entries.join("\n");
        input.push('\n');
        git_output(self.path(), &["mktree"], Some(input.as_bytes()))
    }

    /// Point `notes_ref` at a commit of `tree`.
    pub fn commit_notes_tree(&self, notes_ref: &str, tree: &str) {
        let commit = git_output(
            self.path(),
            &["commit-tree", tree, "-m", "notes"],
            None,
        );
        run_git(self.path(), &["update-ref", notes_ref, &commit]);
    }
}

/// Run a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Run a git command, optionally feeding stdin, and return trimmed stdout.
pub fn git_output(dir: &Path, args: &[&str], stdin: Option<&[u8]>) -> String {
    let mut child = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn git");

    if let Some(data) = stdin {
        let mut pipe = child.stdin.take().unwrap();
        pipe.write_all(data).unwrap();
    }

    let output = child.wait_with_output().expect("git command failed");
    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Build a notes tree holding one note per `(target, blob)` pair, each
/// sharded `depth` levels deep. Returns the root tree id.
pub fn sharded_notes_tree(repo: &TestRepo, notes: &[(&str, &str)], depth: usize) -> String {
    build_level(repo, notes, depth, 0)
}

fn build_level(repo: &TestRepo, notes: &[(&str, &str)], depth: usize, level: usize) -> String {
    if level == depth {
        let entries: Vec<String> = notes
            .iter()
            .map(|(target, blob)| format!("100644 blob {}\t{}", blob, &target[level * 2..]))
            .collect();
        return repo.mktree(&entries);
    }

    let mut prefixes: Vec<&str> = notes
        .iter()
        .map(|(target, _)| &target[level * 2..level * 2 + 2])
        .collect();
    prefixes.sort_unstable();
    prefixes.dedup();

    let entries: Vec<String> = prefixes
        .into_iter()
        .map(|prefix| {
            let group: Vec<(&str, &str)> = notes
                .iter()
                .filter(|(target, _)| &target[level * 2..level * 2 + 2] == prefix)
                .copied()
                .collect();
            let subtree = build_level(repo, &group, depth, level + 1);
            format!("040000 tree {}\t{}", subtree, prefix)
        })
        .collect();
    repo.mktree(&entries)
}
