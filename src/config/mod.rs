// src/config/mod.rs

//! Build manifest handling for the host front-end.
//!
//! The engine itself never reads configuration; it receives plain values at
//! construction time. This module is the thin host layer that turns a
//! `Buildfile.toml` into a list of submittable actions:
//!
//! - [`model`] is the serde mapping of the TOML manifest.
//! - [`loader`] reads, validates and plans a manifest (path resolution and
//!   command placeholder expansion).
//! - [`validate`] checks manifest-level invariants up front, including an
//!   acyclicity pre-check over the declared actions.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{PlannedAction, load_and_validate, plan_actions};
pub use model::{ActionConfig, BuildSection, Manifest};
