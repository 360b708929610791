//! for-each-ref command - List refs matching a pattern

use anyhow::Result;

use super::open_repo;
use crate::cli::Context;

/// Print every ref matching `pattern`, rendered with `format`.
pub fn for_each_ref(ctx: &Context, pattern: &str, format: &str) -> Result<()> {
    let git = open_repo(ctx)?;
    for line in git.for_each_ref(pattern, format)? {
        println!("{}", line?);
    }
    Ok(())
}
