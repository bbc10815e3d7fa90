/// Configuration system for churnlens.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::ChurnlensConfig::default()`]
/// 2. **User global config**: `~/.churnlens/config.toml`
/// 3. **Project local config**: `.churnlens.toml` in the current working directory
/// 4. **Environment variables**: `CHURNLENS_*` overrides (highest precedence)
///
/// # Usage
///
/// ```rust,ignore
/// use churnlens::config;
///
/// let cfg = config::load();
/// let backend = HttpBackend::from_config(&cfg.backend);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::ChurnlensConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> ChurnlensConfig {
    let mut config = load_layers([global_config_path(), project_config_path()]);

    // Layer 4: environment variable overrides
    apply_env_overrides(&mut config);

    config
}

/// Resolve the file layers in order, later files winning key by key.
///
/// Layers are merged as TOML tables before anything is deserialized, so a
/// project file that only sets `[chat]` keeps the user's `[backend]` values.
fn load_layers(paths: impl IntoIterator<Item = Option<PathBuf>>) -> ChurnlensConfig {
    let mut merged = toml::Value::Table(toml::Table::new());
    for layer in paths.into_iter().filter_map(load_toml_file) {
        merge_toml(&mut merged, layer);
    }
    merged.try_into().unwrap_or_default()
}

/// Load a TOML config file from the given path (if it exists).
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. A broken config file never stops the dashboard from
/// starting; `churnlens health` reports it instead.
fn load_toml_file(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Reject layers with wrongly typed keys here so they can't poison the merge.
    value.clone().try_into::<ChurnlensConfig>().ok()?;
    Some(value)
}

/// Deep-merge `overlay` into `base`. Tables merge per key; any other value
/// in the overlay replaces the base value.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.churnlens/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".churnlens").join("config.toml"))
}

/// Path to the project local config: `.churnlens.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".churnlens.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `CHURNLENS_BACKEND_URL`: analytics service base URL
/// - `CHURNLENS_TIMEOUT_MS`: request timeout (`0` = none)
/// - `CHURNLENS_CURRENT_REVENUE`: raw current-revenue field
/// - `CHURNLENS_TYPING_EFFECT`: reveal bot replies gradually (`1`/`true`)
/// - `CHURNLENS_LOGGING`: interaction journal on/off
/// - `CHURNLENS_CHARTS_DIR`: export decoded charts to this directory
fn apply_env_overrides(config: &mut ChurnlensConfig) {
    if let Ok(val) = std::env::var("CHURNLENS_BACKEND_URL")
        && !val.is_empty()
    {
        config.backend.base_url = val;
    }
    if let Ok(val) = std::env::var("CHURNLENS_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.backend.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("CHURNLENS_CURRENT_REVENUE") {
        config.dashboard.current_revenue = val;
    }
    if let Ok(val) = std::env::var("CHURNLENS_TYPING_EFFECT") {
        config.chat.typing_effect = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("CHURNLENS_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("CHURNLENS_CHARTS_DIR")
        && !val.is_empty()
    {
        config.charts.output_dir = Some(PathBuf::from(val));
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.churnlens/config.toml`.
///
/// Creates the `~/.churnlens/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.churnlens/ directory")?;
    }

    fs::write(&path, ChurnlensConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified key,
/// and writes the result back. Supports dotted keys like `backend.base_url`.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let toml_str = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&ChurnlensConfig::default())
            .context("failed to serialize default config")?
    };

    let mut value_table: toml::Value =
        toml::from_str(&toml_str).context("failed to parse config as TOML value")?;
    set_toml_value(&mut value_table, key, value)?;

    let output =
        toml::to_string_pretty(&value_table).context("failed to serialize updated config")?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    // Navigate to the parent table
    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current.as_table_mut().with_context(|| {
        format!(
            "expected table at '{}'",
            key.rsplit_once('.').map(|(s, _)| s).unwrap_or("")
        )
    })?;

    // Parse the new value according to the type already stored there
    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
