//! Replication Engine (§4.4): snapshots the embedded database to a local
//! file, mirrors it to a remote MySQL instance with best-effort type
//! coercion, applies a retention policy against the manifest, and restores
//! from a chosen snapshot on demand.
//!
//! # Scheduling
//!
//! [`engine::ReplicationEngine::run`] drives two independent loops until
//! shutdown: a fast check for whether a full autosave is due, and a slower
//! `SELECT 1` ping against the remote mirror.

pub mod engine;
pub mod error;
pub mod manifest;
pub mod retention;
pub mod snapshot;
pub mod types;

pub use engine::ReplicationEngine;
pub use error::{ReplicationError, Result};
pub use types::{Manifest, ManifestEntry, MirrorOutcome};
