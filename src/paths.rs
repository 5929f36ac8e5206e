use std::path::PathBuf;

/// Per-user config file: `~/.config/talos-inventory/inventory.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("talos-inventory").join("inventory.toml"))
}
