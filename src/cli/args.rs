//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging (every line read from git)
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::types::ObjectKind;
use crate::git::DEFAULT_REF_FORMAT;

/// gitpipe - Typed access to git plumbing over worker processes
#[derive(Parser, Debug)]
#[command(name = "gitpipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gitpipe was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Object types accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl From<KindArg> for ObjectKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Blob => ObjectKind::Blob,
            KindArg::Tree => ObjectKind::Tree,
            KindArg::Commit => ObjectKind::Commit,
            KindArg::Tag => ObjectKind::Tag,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List refs matching a pattern
    #[command(
        name = "for-each-ref",
        after_help = "\
EXAMPLES:
    # Object ids of all branches
    gitpipe for-each-ref refs/heads/

    # Names and ids
    gitpipe for-each-ref refs/ --format '%(objectname) %(refname)'

    # git's default rendering
    gitpipe for-each-ref refs/tags/ --format ''"
    )]
    ForEachRef {
        /// Ref pattern (prefix or glob)
        #[arg(default_value = "refs/")]
        pattern: String,

        /// for-each-ref format; empty for git's default rendering
        #[arg(long, default_value = DEFAULT_REF_FORMAT)]
        format: String,
    },

    /// List the entries of a tree
    #[command(name = "ls-tree")]
    LsTree {
        /// Tree-ish to list
        treeish: String,

        /// Limit the listing to this path
        #[arg(default_value = "")]
        path: String,

        /// Recurse into subtrees
        #[arg(short, long)]
        recursive: bool,
    },

    /// Print the contents of an object
    #[command(
        name = "cat-file",
        after_help = "\
EXAMPLES:
    gitpipe cat-file blob HEAD:README.md
    gitpipe cat-file commit HEAD

Every name is fetched through one persistent cat-file session."
    )]
    CatFile {
        /// Expected object type
        #[arg(value_enum)]
        kind: KindArg,

        /// Object names (id, <rev>:<path>, ...)
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Print the note attached to objects
    #[command(name = "notes")]
    Notes {
        /// Notes ref; short names are qualified with the notes namespace
        #[arg(long = "ref", default_value = "commits")]
        notes_ref: String,

        /// Annotated object ids
        #[arg(required = true)]
        targets: Vec<String>,
    },

    /// Add the clone capability to a capability list if a manifest exists
    #[command(name = "capabilities")]
    Capabilities {
        /// Repository storage directory holding the manifest
        #[arg(long)]
        storage: PathBuf,

        /// Existing capabilities
        caps: Vec<String>,
    },

    /// Show the clone manifest and the branches each entry resolves to
    #[command(name = "manifest")]
    Manifest {
        /// Repository storage directory holding the manifest
        #[arg(long)]
        storage: PathBuf,

        /// Repository url used to derive branch names for entries without one
        #[arg(long)]
        url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_ls_tree() {
        let cli = Cli::try_parse_from(["gitpipe", "ls-tree", "-r", "HEAD", "src"]).unwrap();
        match cli.command {
            Command::LsTree {
                treeish,
                path,
                recursive,
            } => {
                assert_eq!(treeish, "HEAD");
                assert_eq!(path, "src");
                assert!(recursive);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn for_each_ref_defaults() {
        let cli = Cli::try_parse_from(["gitpipe", "for-each-ref"]).unwrap();
        match cli.command {
            Command::ForEachRef { pattern, format } => {
                assert_eq!(pattern, "refs/");
                assert_eq!(format, "%(objectname)");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cat_file_requires_a_name() {
        assert!(Cli::try_parse_from(["gitpipe", "cat-file", "blob"]).is_err());
        assert!(Cli::try_parse_from(["gitpipe", "cat-file", "blobby", "HEAD"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gitpipe", "notes", "--debug", "abc"]).unwrap();
        assert!(cli.debug);
    }
}
