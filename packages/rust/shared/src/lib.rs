//! Shared types, error model, and configuration for CheckIO.
//!
//! This crate is the foundation depended on by all other CheckIO crates.
//! It provides:
//! - [`CheckIoError`]: the unified error type
//! - Domain types ([`FeaturedCategoryConfig`], [`CategoryId`], [`ProjectedAsset`], [`Session`])
//! - Configuration ([`AppConfig`], [`DirectoryConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AccessConfig, AppConfig, DirectoryConfig, StorageConfig, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from, resolve_api_token,
};
pub use error::{CheckIoError, Result};
pub use types::{
    AssignmentMode, CategoryId, DisplayPropertySpec, FeaturedCategoryConfig, ProjectedAsset,
    PropertyValue, Session,
};
