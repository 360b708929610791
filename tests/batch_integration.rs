//! Integration tests for the persistent cat-file session.

mod common;

use std::sync::Arc;
use std::thread;

use common::TestRepo;
use gitpipe::core::types::ObjectKind;
use gitpipe::git::{BatchObjectReader, GitError};

#[test]
fn fetch_returns_exact_bytes() {
    let repo = TestRepo::new();
    let git = repo.git();

    let contents = git.cat_file(ObjectKind::Blob, "HEAD:README.md").unwrap();
    assert_eq!(contents.as_deref(), Some(&b"# Test Repo\n"[..]));
}

#[test]
fn fetch_binary_content() {
    let repo = TestRepo::new();
    let payload: Vec<u8> = (0..=255u8).chain([b'\n', 0, b'\n']).collect();
    let id = repo.write_blob(&payload);
    let git = repo.git();

    let contents = git.cat_file(ObjectKind::Blob, &id).unwrap().unwrap();
    assert_eq!(contents, payload);
}

#[test]
fn fetch_empty_blob() {
    let repo = TestRepo::new();
    let id = repo.write_blob(b"");
    let git = repo.git();

    assert_eq!(git.cat_file(ObjectKind::Blob, &id).unwrap(), Some(Vec::new()));
}

#[test]
fn one_session_serves_many_requests() {
    let repo = TestRepo::new();
    repo.commit_file("a.txt", b"a\n", "add a");
    let git = repo.git();

    git.cat_file(ObjectKind::Blob, "HEAD:a.txt").unwrap();
    let pid = git.batch().pid().unwrap();

    let commit = git.cat_file(ObjectKind::Commit, "HEAD").unwrap().unwrap();
    assert!(commit.starts_with(b"tree "));
    let tree = git.cat_file(ObjectKind::Tree, "HEAD^{tree}").unwrap().unwrap();
    assert!(!tree.is_empty());
    assert_eq!(git.batch().pid(), Some(pid));
}

#[test]
fn missing_object_is_none_and_session_survives() {
    let repo = TestRepo::new();
    let git = repo.git();

    let missing = git
        .cat_file(ObjectKind::Blob, "0000000000000000000000000000000000000001")
        .unwrap();
    assert!(missing.is_none());
    let pid = git.batch().pid();
    assert!(pid.is_some());

    let missing_path = git.cat_file(ObjectKind::Blob, "HEAD:no such file").unwrap();
    assert!(missing_path.is_none());

    let readme = git.cat_file(ObjectKind::Blob, "HEAD:README.md").unwrap();
    assert!(readme.is_some());
    assert_eq!(git.batch().pid(), pid);
}

#[test]
fn type_mismatch_tears_down_session() {
    let repo = TestRepo::new();
    let git = repo.git();

    git.cat_file(ObjectKind::Blob, "HEAD:README.md").unwrap();
    let first_pid = git.batch().pid().unwrap();

    let result = git.cat_file(ObjectKind::Tree, "HEAD:README.md");
    assert!(matches!(
        result,
        Err(GitError::ProtocolDesync {
            requested: ObjectKind::Tree,
            ..
        })
    ));
    assert!(!git.batch().is_open());

    // The next request starts over on a fresh worker.
    let readme = git.cat_file(ObjectKind::Blob, "HEAD:README.md").unwrap();
    assert_eq!(readme.as_deref(), Some(&b"# Test Repo\n"[..]));
    assert_ne!(git.batch().pid(), Some(first_pid));
}

#[test]
fn newline_in_name_is_rejected() {
    let repo = TestRepo::new();
    let git = repo.git();

    let result = git.cat_file(ObjectKind::Blob, "HEAD:README.md\nHEAD");
    assert!(matches!(result, Err(GitError::InvalidObjectName { .. })));
}

#[test]
fn close_is_idempotent_and_fetch_relaunches() {
    let repo = TestRepo::new();
    let git = repo.git();

    // Closing before any fetch is a no-op.
    git.close().unwrap();

    git.cat_file(ObjectKind::Blob, "HEAD:README.md").unwrap();
    assert!(git.batch().is_open());

    git.close().unwrap();
    git.close().unwrap();
    assert!(!git.batch().is_open());

    let readme = git.cat_file(ObjectKind::Blob, "HEAD:README.md").unwrap();
    assert!(readme.is_some());
    assert!(git.batch().is_open());
}

#[test]
fn standalone_reader_in_repo_dir() {
    let repo = TestRepo::new();
    let reader = BatchObjectReader::new("git", Some(repo.path()));

    assert!(!reader.is_open());
    let commit = reader.fetch(ObjectKind::Commit, "HEAD").unwrap().unwrap();
    assert!(String::from_utf8(commit).unwrap().contains("Initial commit"));
    reader.close().unwrap();
}

#[test]
fn concurrent_fetches_are_serialized() {
    let repo = TestRepo::new();
    let mut expected = Vec::new();
    for i in 0..8 {
        let content = format!("content of file {i}\n").repeat(i * 100 + 1);
        repo.commit_file(&format!("file{i}.txt"), content.as_bytes(), "add");
        expected.push((format!("HEAD:file{i}.txt"), content.into_bytes()));
    }
    let git = Arc::new(repo.git());

    let handles: Vec<_> = expected
        .into_iter()
        .map(|(spec, content)| {
            let git = Arc::clone(&git);
            thread::spawn(move || {
                for _ in 0..10 {
                    let got = git.cat_file(ObjectKind::Blob, &spec).unwrap();
                    assert_eq!(got.as_ref(), Some(&content));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    git.close().unwrap();
}
