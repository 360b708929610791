//! capabilities and manifest commands - Clone manifest boundary
//!
//! Neither command needs a git repository; both only look at the storage
//! directory holding `cinnabar.manifest`.

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::clonebundle::{
    advertise_capabilities, branch_candidates, parse_manifest, read_manifest,
};
use crate::ui::output;

/// Print `caps` with the clone capability appended when a manifest exists.
pub fn capabilities(storage: &Path, caps: &[String]) -> Result<()> {
    println!("{}", advertise_capabilities(storage, &caps.join(" ")));
    Ok(())
}

/// Print each manifest entry and the branches a client would try for it.
pub fn manifest(ctx: &Context, storage: &Path, url: Option<&str>) -> Result<()> {
    let contents = read_manifest(storage)
        .with_context(|| format!("cannot read manifest in {}", storage.display()))?;
    if contents.is_empty() {
        output::warn("no clone manifest", ctx.verbosity);
        return Ok(());
    }

    for entry in parse_manifest(&contents)? {
        let branches = match (&entry.branch, url) {
            (Some(branch), _) => vec![branch.clone()],
            (None, Some(url)) => branch_candidates(url),
            (None, None) => Vec::new(),
        };
        if branches.is_empty() {
            println!("{}", entry.url);
        } else {
            println!("{}\t{}", entry.url, branches.join(" "));
        }
    }
    Ok(())
}
