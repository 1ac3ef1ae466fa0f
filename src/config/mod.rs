//! Configuration module.
//!
//! Grid options are resolved as defaults, then the TOML config file, then
//! environment overrides.

pub mod loader;

pub use loader::{
    apply_env_overrides, default_config_path, default_log_path, load_config_file,
    load_config_with_precedence, merge_config, ConfigError, ConfigFile, DomLayout, GridOptions,
};

/// Resolve grid options from every configuration source.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn resolve(config_path: Option<std::path::PathBuf>) -> Result<GridOptions, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    Ok(apply_env_overrides(merge_config(file)))
}
