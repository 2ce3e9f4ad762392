// src/config/mod.rs

//! Configuration loading and validation for keydag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate key providers, locks and graph shape (`validate.rs`).
//! - Turn a validated file into command tasks, a lock table and a seeded
//!   context (`ConfigFile`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
