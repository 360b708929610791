//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. Every read goes through a git
//! worker process spawned here; no other module starts processes.
//!
//! # Layers
//!
//! - [`process`] - one worker process, its pipes and its reaping
//! - [`lines`] - lazy line stream over a worker's stdout
//! - [`refs`] - `for-each-ref` enumeration
//! - [`tree`] - `ls-tree` listing parsed into [`TreeEntry`](crate::core::types::TreeEntry)
//! - [`batch`] - persistent `cat-file --batch` session
//!
//! # Invariants
//!
//! - At most one batch session per client, serialized by a mutex
//! - Every worker is reaped exactly once
//! - Malformed output is an error, never skipped
//!
//! # Example
//!
//! ```ignore
//! use gitpipe::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let heads = git.run(["for-each-ref", "--format", "%(refname)", "refs/heads/"])?;
//! git.close()?;
//! ```

pub mod batch;
mod interface;
pub mod lines;
pub mod process;
pub mod refs;
pub mod tree;

pub use batch::BatchObjectReader;
pub use interface::{Git, GitError};
pub use lines::LineStream;
pub use process::{InputMode, PayloadProducer, ProcessHandle};
pub use refs::{parse_ref_entry, RefEntry, DEFAULT_REF_FORMAT};
pub use tree::{parse_tree_line, TreeEntries};
