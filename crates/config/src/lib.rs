//! Configuration loading and validation.
//!
//! Config file: `herald.toml`, searched in `./` then `~/.config/herald/`.

pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{
        AutoRemoveConfig, BotConfig, HeraldConfig, PermissionGroup, ResultCacheConfig,
        StartupConfig, ThrottleConfig, ThrottleScope,
    },
    validate::{Diagnostic, Severity, has_errors, validate},
};
