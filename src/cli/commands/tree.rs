//! ls-tree command - List the entries of a tree

use anyhow::Result;

use super::open_repo;
use crate::cli::Context;

/// Print the entries of `treeish` in `ls-tree`'s own layout.
pub fn ls_tree(ctx: &Context, treeish: &str, path: &str, recursive: bool) -> Result<()> {
    let git = open_repo(ctx)?;
    for entry in git.ls_tree(treeish, path, recursive)? {
        let entry = entry?;
        println!("{} {} {}\t{}", entry.mode, entry.kind, entry.id, entry.path);
    }
    Ok(())
}
