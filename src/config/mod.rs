// src/config/mod.rs

//! Declarative command definitions.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a definition from disk (`loader.rs`).
//! - Validate it and turn it into a typed [`CommandConfig`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{CommandConfig, RawCommandConfig, RedirectConfig};
pub use validate::parse_duration;
