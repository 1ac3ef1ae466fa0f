//! Configuration file loading with precedence handling.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// How the grid body is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomLayout {
    /// Fixed-height body with its own vertical scroll.
    #[default]
    Normal,
    /// Body grows to fit every row; the host page scrolls.
    AutoHeight,
    /// Every row of the page is rendered, in order, for printing.
    Print,
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/gridrows/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Rows rendered above and below the visible band.
    #[serde(default)]
    pub row_buffer: Option<i64>,

    /// Default row height in pixels.
    #[serde(default)]
    pub row_height: Option<i64>,

    /// Pin the ancestors of the first visible row at the top of the body.
    #[serde(default)]
    pub group_rows_sticky: Option<bool>,

    /// Keep detail row controllers alive in a side cache when scrolled away.
    #[serde(default)]
    pub keep_detail_rows: Option<bool>,

    /// Side cache capacity.
    #[serde(default)]
    pub keep_detail_rows_count: Option<usize>,

    /// Build rows synchronously even while scrolling.
    #[serde(default)]
    pub suppress_animation_frame: Option<bool>,

    /// Render every row of the page.
    #[serde(default)]
    pub suppress_row_virtualisation: Option<bool>,

    /// Lift the 500-row cap on the rendered window.
    #[serde(default)]
    pub suppress_max_rendered_row_restriction: Option<bool>,

    /// Keep controllers ordered by display index.
    #[serde(default)]
    pub ensure_dom_order: Option<bool>,

    /// Body layout.
    #[serde(default)]
    pub dom_layout: Option<DomLayout>,

    /// Animate row moves on model updates.
    #[serde(default)]
    pub animate_rows: Option<bool>,

    /// Keep the scroll position when new data arrives.
    #[serde(default)]
    pub suppress_scroll_on_new_data: Option<bool>,

    /// Trailing debounce for row height changes, in milliseconds.
    #[serde(default)]
    pub height_debounce_ms: Option<u64>,

    /// Rows per page. Absent or zero disables pagination.
    #[serde(default)]
    pub pagination_page_size: Option<usize>,

    /// Host can move focus without scrolling.
    #[serde(default)]
    pub prevent_scroll_focus_supported: Option<bool>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved grid options after applying precedence rules.
///
/// Created by merging defaults, config file and env vars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridOptions {
    /// Buffer rows on each side of the visible band. Negative values are
    /// treated as zero by the viewport calculator.
    pub row_buffer: i64,
    /// Default row height in pixels.
    pub row_height: i64,
    /// Pin ancestor group rows to the top of the body while scrolling.
    pub group_rows_sticky: bool,
    /// Park detail rows in a side cache instead of destroying them.
    pub keep_detail_rows: bool,
    /// Side cache capacity; zero falls back to 3.
    pub keep_detail_rows_count: usize,
    /// Build rows inside the redraw instead of on the next animation frame.
    pub suppress_animation_frame: bool,
    /// Render every row of the page.
    pub suppress_row_virtualisation: bool,
    /// Lift the 500-row cap on the rendered window.
    pub suppress_max_rendered_row_restriction: bool,
    /// Accepted for compatibility. Controllers are always listed in display
    /// order because the live map is keyed by display index.
    pub ensure_dom_order: bool,
    /// Body layout.
    pub dom_layout: DomLayout,
    /// Animate removed rows out instead of destroying them at once.
    pub animate_rows: bool,
    /// Keep the scroll position when fresh row data arrives.
    pub suppress_scroll_on_new_data: bool,
    /// Quiet period before a row height change triggers a redraw.
    pub height_debounce_ms: u64,
    /// Rows per page. `None` disables pagination.
    pub pagination_page_size: Option<usize>,
    /// Host can move focus without scrolling the focused element into view.
    pub prevent_scroll_focus_supported: bool,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_buffer: 10,
            row_height: 25,
            group_rows_sticky: false,
            keep_detail_rows: false,
            keep_detail_rows_count: 10,
            suppress_animation_frame: false,
            suppress_row_virtualisation: false,
            suppress_max_rendered_row_restriction: false,
            ensure_dom_order: false,
            dom_layout: DomLayout::Normal,
            animate_rows: false,
            suppress_scroll_on_new_data: false,
            height_debounce_ms: 100,
            pagination_page_size: None,
            prevent_scroll_focus_supported: true,
            log_file_path: default_log_path(),
        }
    }
}

impl GridOptions {
    /// Whether every page row is rendered in display order.
    pub fn is_print_layout(&self) -> bool {
        self.dom_layout == DomLayout::Print
    }

    /// Effective detail side-cache capacity: the configured count, or 3
    /// when it is zero.
    pub fn detail_cache_capacity(&self) -> usize {
        if self.keep_detail_rows_count > 0 {
            self.keep_detail_rows_count
        } else {
            crate::render::FALLBACK_DETAIL_CACHE_CAPACITY
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/gridrows/gridrows.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("gridrows").join("gridrows.log")
    } else {
        PathBuf::from("gridrows.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    // Missing file is not an error - use defaults
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/gridrows/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gridrows").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument
/// 2. `GRIDROWS_CONFIG` environment variable
/// 3. Default path `~/.config/gridrows/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var("GRIDROWS_CONFIG") {
        if env_path.is_empty() {
            return Err(ConfigError::InvalidPath(
                "GRIDROWS_CONFIG is set but empty".to_string(),
            ));
        }
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Apply environment variable overrides to resolved options.
///
/// Checks for:
/// - `GRIDROWS_ROW_BUFFER`: Override row buffer (ignored with a warning if
///   not an integer)
pub fn apply_env_overrides(mut options: GridOptions) -> GridOptions {
    if let Ok(raw) = std::env::var("GRIDROWS_ROW_BUFFER") {
        match raw.trim().parse::<i64>() {
            Ok(row_buffer) => options.row_buffer = row_buffer,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid GRIDROWS_ROW_BUFFER"),
        }
    }

    options
}

/// Merge config file into defaults to create resolved options.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> GridOptions {
    let defaults = GridOptions::default();

    let Some(config) = config_file else {
        return defaults;
    };

    GridOptions {
        row_buffer: config.row_buffer.unwrap_or(defaults.row_buffer),
        row_height: config.row_height.unwrap_or(defaults.row_height),
        group_rows_sticky: config.group_rows_sticky.unwrap_or(defaults.group_rows_sticky),
        keep_detail_rows: config.keep_detail_rows.unwrap_or(defaults.keep_detail_rows),
        keep_detail_rows_count: config
            .keep_detail_rows_count
            .unwrap_or(defaults.keep_detail_rows_count),
        suppress_animation_frame: config
            .suppress_animation_frame
            .unwrap_or(defaults.suppress_animation_frame),
        suppress_row_virtualisation: config
            .suppress_row_virtualisation
            .unwrap_or(defaults.suppress_row_virtualisation),
        suppress_max_rendered_row_restriction: config
            .suppress_max_rendered_row_restriction
            .unwrap_or(defaults.suppress_max_rendered_row_restriction),
        ensure_dom_order: config.ensure_dom_order.unwrap_or(defaults.ensure_dom_order),
        dom_layout: config.dom_layout.unwrap_or(defaults.dom_layout),
        animate_rows: config.animate_rows.unwrap_or(defaults.animate_rows),
        suppress_scroll_on_new_data: config
            .suppress_scroll_on_new_data
            .unwrap_or(defaults.suppress_scroll_on_new_data),
        height_debounce_ms: config.height_debounce_ms.unwrap_or(defaults.height_debounce_ms),
        pagination_page_size: config
            .pagination_page_size
            .filter(|size| *size > 0)
            .or(defaults.pagination_page_size),
        prevent_scroll_focus_supported: config
            .prevent_scroll_focus_supported
            .unwrap_or(defaults.prevent_scroll_focus_supported),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
