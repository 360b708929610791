//! notes
//!
//! Lookup of git notes stored in sharded trees.
//!
//! # Layout
//!
//! A notes ref points at a commit whose tree maps annotated object ids to
//! note blobs. The path of a note is the annotated id split into `depth`
//! two-character directories followed by the remaining hex digits:
//!
//! ```text
//! depth 0:  abc123...
//! depth 1:  ab/c123...
//! depth 2:  ab/c1/23...
//! ```
//!
//! Git picks the depth based on how many notes the tree holds, so it has to
//! be discovered. Depths `0..MAX_SHARD_DEPTH` are probed in order and the
//! first depth that yields a note is remembered for that notes ref.
//!
//! # Caching
//!
//! Once a depth is cached for a ref, only that depth is ever probed again,
//! even if the tree is later rewritten with a different fanout. A lookup
//! that finds nothing at any depth caches nothing.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::core::types::{ObjectId, ObjectKind};
use crate::git::{BatchObjectReader, GitError};

/// Number of shard depths probed on a cold lookup (`0..MAX_SHARD_DEPTH`).
pub const MAX_SHARD_DEPTH: usize = 20;

/// Something that can fetch object contents by name.
///
/// Implemented by [`BatchObjectReader`]; tests substitute a fake.
pub trait ObjectSource {
    /// Fetch `spec` expecting an object of type `kind`; `Ok(None)` if missing.
    fn fetch(&self, kind: ObjectKind, spec: &str) -> Result<Option<Vec<u8>>, GitError>;
}

impl ObjectSource for BatchObjectReader {
    fn fetch(&self, kind: ObjectKind, spec: &str) -> Result<Option<Vec<u8>>, GitError> {
        BatchObjectReader::fetch(self, kind, spec)
    }
}

/// Path of the note for `id` in a tree sharded `depth` levels deep.
///
/// Directories are taken two hex digits at a time; whatever is left is the
/// leaf name. Removing the `/` separators always gives back `id`.
///
/// # Example
///
/// ```
/// use gitpipe::core::types::ObjectId;
/// use gitpipe::notes::sharded_path;
///
/// let id = ObjectId::new("abc123def4567890abc123def4567890abc12345").unwrap();
/// assert_eq!(sharded_path(&id, 0), id.as_str());
/// assert_eq!(sharded_path(&id, 2), "ab/c1/23def4567890abc123def4567890abc12345");
/// ```
pub fn sharded_path(id: &ObjectId, depth: usize) -> String {
    let hex = id.as_str();
    let split = (depth * 2).min(hex.len());
    let (dirs, leaf) = hex.split_at(split);

    let mut path = String::with_capacity(hex.len() + depth);
    for pair in dirs.as_bytes().chunks(2) {
        // ObjectId is ASCII hex, so byte pairs are char boundaries
        path.push_str(std::str::from_utf8(pair).unwrap_or_default());
        path.push('/');
    }
    path.push_str(leaf);
    path
}

/// Notes lookup with a per-ref shard depth cache.
#[derive(Debug)]
pub struct NotesIndex {
    namespace: String,
    depths: Mutex<HashMap<String, usize>>,
}

impl NotesIndex {
    /// Create an index qualifying short ref names with `namespace`
    /// (e.g. `refs/notes`).
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.trim_end_matches('/').to_string(),
            depths: Mutex::new(HashMap::new()),
        }
    }

    /// Fully qualify a notes ref: names outside `refs/` go under the namespace.
    pub fn qualify(&self, notes_ref: &str) -> String {
        if notes_ref.starts_with("refs/") {
            notes_ref.to_string()
        } else {
            format!("{}/{}", self.namespace, notes_ref)
        }
    }

    /// The depth cached for `notes_ref`, if a note was ever found there.
    pub fn cached_depth(&self, notes_ref: &str) -> Option<usize> {
        let key = self.qualify(notes_ref);
        self.depths
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .copied()
    }

    /// Read the note attached to `target` in `notes_ref`.
    ///
    /// Probes only the cached depth if there is one, otherwise every depth
    /// in `0..MAX_SHARD_DEPTH` that leaves a non-empty leaf name.
    pub fn read_note<S: ObjectSource + ?Sized>(
        &self,
        source: &S,
        notes_ref: &str,
        target: &ObjectId,
    ) -> Result<Option<Vec<u8>>, GitError> {
        let notes_ref = self.qualify(notes_ref);
        let max_depth = MAX_SHARD_DEPTH.min(target.as_str().len().div_ceil(2));

        let depths = match self.cached_depth(&notes_ref) {
            Some(depth) => depth..depth + 1,
            None => 0..max_depth,
        };

        for depth in depths {
            let spec = format!("{}:{}", notes_ref, sharded_path(target, depth));
            if let Some(note) = source.fetch(ObjectKind::Blob, &spec)? {
                debug!(notes_ref = %notes_ref, depth, "found note for {}", target);
                self.depths
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .insert(notes_ref, depth);
                return Ok(Some(note));
            }
        }

        Ok(None)
    }
}
