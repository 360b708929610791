//! gitpipe - Typed access to git plumbing over worker processes
//!
//! gitpipe reads an existing git repository by driving `git` worker
//! processes: one-shot listings (`for-each-ref`, `ls-tree`) become lazy
//! typed iterators, object contents come through a single persistent
//! `cat-file --batch` session, and notes are located by probing their
//! sharded tree layout.
//!
//! # Architecture
//!
//! - [`git`] - Worker processes, line streams, listings and the batch session
//! - [`notes`] - Sharded notes lookup with a per-ref depth cache
//! - [`clonebundle`] - Clone manifest reading and capability advertisement
//! - [`core`] - Domain types and configuration
//! - [`cli`] - Command-line interface layer
//! - [`ui`] - Output utilities
//!
//! # Guarantees
//!
//! 1. Every worker process is reaped exactly once
//! 2. At most one batch session per client, one request in flight at a time
//! 3. Malformed git output is an error, never silently skipped
//! 4. A missing object is `None`, distinct from an empty one

pub mod cli;
pub mod clonebundle;
pub mod core;
pub mod git;
pub mod notes;
pub mod ui;
