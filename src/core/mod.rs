//! core
//!
//! Core domain types and configuration for gitpipe.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ObjectId, ObjectKind, TreeEntry
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing at the boundary with git's text output
//! - Schemas are strict (`deny_unknown_fields`)

pub mod config;
pub mod types;
