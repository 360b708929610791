//! cat-file command - Print object contents through the batch session
//!
//! All names share one `cat-file --batch` worker. Missing objects are
//! reported and make the command fail once every name has been tried.

use anyhow::{bail, Result};

use super::open_repo;
use crate::cli::Context;
use crate::core::types::ObjectKind;
use crate::ui::output;

/// Print the contents of each of `names`, which must be of type `kind`.
pub fn cat_file(ctx: &Context, kind: ObjectKind, names: &[String]) -> Result<()> {
    let git = open_repo(ctx)?;

    let mut missing = 0;
    for name in names {
        match git.cat_file(kind, name)? {
            Some(contents) => output::print_bytes(&contents)?,
            None => {
                output::warn(format!("{} is missing", name), ctx.verbosity);
                missing += 1;
            }
        }
    }
    git.close()?;

    if missing > 0 {
        bail!("{} of {} objects missing", missing, names.len());
    }
    Ok(())
}
