pub mod schema;
pub mod watcher;

pub use schema::{
    GlobalConfig, GroupConfig, IndicatorConfig, ObjectConfig, Orientation, PanelConfig, Position,
    ThemeConfig,
};
pub use watcher::ConfigWatcher;

use panel_core::{PanelError, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.  Returns `PanelConfig::default()` if
/// the file doesn't exist so the panel always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<PanelConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(PanelConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| PanelError::Config(format!("cannot read '{}': {e}", path.display())))?;

    toml::from_str(&raw).map_err(|e| PanelError::Config(format!("TOML parse error: {e}")))
}

/// Write the whole configuration back to `path`, creating parent directories.
pub fn save(path: impl AsRef<Path>, config: &PanelConfig) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let raw = toml::to_string_pretty(config)
        .map_err(|e| PanelError::Config(format!("TOML serialize error: {e}")))?;
    std::fs::write(path, raw)?;

    tracing::debug!("Saved config to '{}'", path.display());
    Ok(())
}

/// Replace only the `[[layout]]` section of the file at `path`, keeping every
/// other section as it is on disk.
pub fn save_layout(path: impl AsRef<Path>, layout: Vec<GroupConfig>) -> Result<()> {
    let path = path.as_ref();
    let mut config = load(path)?;
    if config.layout == layout {
        return Ok(());
    }
    config.layout = layout;
    save(path, &config)
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("simple-panel").join("panel.toml")
}
