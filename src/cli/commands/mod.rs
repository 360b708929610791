//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens the repository (if it needs one)
//! 2. Calls into [`crate::git`], [`crate::notes`] or [`crate::clonebundle`]
//! 3. Formats and displays output
//!
//! Handlers never mutate the repository.

mod cat_file;
mod clonebundle;
mod notes;
mod refs;
mod tree;

pub use cat_file::cat_file;
pub use clonebundle::{capabilities, manifest};
pub use notes::notes;
pub use refs::for_each_ref;
pub use tree::ls_tree;

use anyhow::{Context as _, Result};

use super::args::Command;
use super::Context;
use crate::git::Git;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::ForEachRef { pattern, format } => for_each_ref(ctx, &pattern, &format),
        Command::LsTree {
            treeish,
            path,
            recursive,
        } => ls_tree(ctx, &treeish, &path, recursive),
        Command::CatFile { kind, names } => cat_file(ctx, kind.into(), &names),
        Command::Notes { notes_ref, targets } => notes(ctx, &notes_ref, &targets),
        Command::Capabilities { storage, caps } => capabilities(&storage, &caps),
        Command::Manifest { storage, url } => manifest(ctx, &storage, url.as_deref()),
    }
}

/// Open the repository the context points at.
fn open_repo(ctx: &Context) -> Result<Git> {
    Git::open(&ctx.cwd).with_context(|| format!("cannot open repository at {}", ctx.cwd.display()))
}
