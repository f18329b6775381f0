//! # projmgr-rs
//!
//! Resolution engine for embedded firmware projects assembled from versioned software packs and layers.
//!
//! Given a pre-parsed [`ContextDescription`] the [`ProjMgrWorker`] produces a fully concrete [`Context`]:
//! exact device, board, toolchain, component set, compatible layers and linker/generator paths.
//!
//! # Usage
//! 1. Load the installed packs once with [`MetaDB::load_from_dir()`].
//! 1. Create a [`ProjMgrWorker`] over the metadb.
//! 1. [`ProjMgrWorker::resolve_context()`] or [`ProjMgrWorker::resolve_contexts()`] for each description.

pub mod error;
pub use error::Result;
pub use error::Error;

pub mod config;
pub use config::ProjMgrOptions;

pub mod diagnostics;
pub use diagnostics::Diagnostics;

pub mod access_sequence;
pub mod precedence;
mod paths;

pub mod metadb;
pub use metadb::MetaDB;

pub mod selector;
pub mod layer_resolver;
pub mod toolchain;
pub mod dependency;

pub mod context;
pub use context::Context;
pub use context::ContextDescription;

pub mod worker;
pub use worker::ProjMgrWorker;
