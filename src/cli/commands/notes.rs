//! notes command - Print the notes attached to objects

use anyhow::{Context as _, Result};

use super::open_repo;
use crate::cli::Context;
use crate::core::types::ObjectId;
use crate::ui::output;

/// Print the note for each of `targets` found in `notes_ref`.
///
/// Objects without a note are reported as warnings, not errors.
pub fn notes(ctx: &Context, notes_ref: &str, targets: &[String]) -> Result<()> {
    let git = open_repo(ctx)?;

    for target in targets {
        let id = ObjectId::new(target.as_str())
            .with_context(|| format!("'{}' is not a full object id", target))?;
        match git.read_note(notes_ref, &id)? {
            Some(note) => output::print_bytes(&note)?,
            None => output::warn(format!("no note for {}", id), ctx.verbosity),
        }
    }

    if let Some(depth) = git.notes().cached_depth(notes_ref) {
        tracing::debug!("notes in {} are sharded {} levels deep", notes_ref, depth);
    }
    git.close()?;
    Ok(())
}
