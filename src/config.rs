use std::path::{Path, PathBuf};
use std::time::Duration;

use facet::Facet;

use crate::error::InventoryError;
use crate::instance::{Instance, Role};
use crate::paths;

pub const DEFAULT_DOMAIN_PREFIX: &str = "edays-ansible-k8s";
pub const DEFAULT_ADDRESS_PREFIX: &str = "192.168.";
pub const DEFAULT_CONTROLLER: &str = "talos-controller";
pub const DEFAULT_WORKERS: [&str; 2] = ["talos-worker-1", "talos-worker-2"];

#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    #[facet(default)]
    pub virsh: VirshConfig,
    #[facet(default)]
    pub cluster: ClusterConfig,
    #[facet(default)]
    pub poll: PollConfig,
    #[facet(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct VirshConfig {
    #[facet(default = "virsh")]
    pub binary: String,
    /// Passed as `-c <uri>` when non-empty.
    #[facet(default)]
    pub uri: String,
    #[facet(default = 10)]
    pub timeout_s: u64,
}

impl Default for VirshConfig {
    fn default() -> Self {
        Self {
            binary: "virsh".into(),
            uri: String::new(),
            timeout_s: 10,
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct ClusterConfig {
    #[facet(default = "edays-ansible-k8s")]
    pub domain_prefix: String,
    #[facet(default = "192.168.")]
    pub address_prefix: String,
    #[facet(default = "talos-controller")]
    pub controller: String,
    /// Worker names in index order. Empty means the two default workers.
    #[facet(default)]
    pub workers: Vec<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            domain_prefix: DEFAULT_DOMAIN_PREFIX.into(),
            address_prefix: DEFAULT_ADDRESS_PREFIX.into(),
            controller: DEFAULT_CONTROLLER.into(),
            workers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Facet)]
#[facet(default)]
pub struct PollConfig {
    #[facet(default = 30)]
    pub attempts: u32,
    #[facet(default = 10)]
    pub interval_s: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval_s: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct LoggingConfig {
    /// Debug log file. Empty disables file logging.
    #[facet(default)]
    pub file: String,
}

// ── Settings ──────────────────────────────────────────────

/// Resolved runtime settings derived from [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub virsh_binary: String,
    pub libvirt_uri: Option<String>,
    pub command_timeout: Duration,
    pub address_prefix: String,
    /// Controller first, then workers in index order.
    pub instances: Vec<Instance>,
    pub attempts: u32,
    pub interval: Duration,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        let prefix = &config.cluster.domain_prefix;
        let mut instances = vec![Instance::new(
            prefix,
            &config.cluster.controller,
            Role::Controller,
        )];
        if config.cluster.workers.is_empty() {
            instances.extend(
                DEFAULT_WORKERS
                    .iter()
                    .map(|w| Instance::new(prefix, w, Role::Worker)),
            );
        } else {
            instances.extend(
                config
                    .cluster
                    .workers
                    .iter()
                    .map(|w| Instance::new(prefix, w, Role::Worker)),
            );
        }

        Self {
            virsh_binary: config.virsh.binary.clone(),
            libvirt_uri: non_empty(&config.virsh.uri),
            command_timeout: Duration::from_secs(config.virsh.timeout_s),
            address_prefix: config.cluster.address_prefix.clone(),
            instances,
            attempts: config.poll.attempts,
            interval: Duration::from_secs(config.poll.interval_s),
            log_file: non_empty(&config.logging.file).map(PathBuf::from),
        }
    }

    /// libvirt domain names of every instance, controller first.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|i| i.domain.as_str())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn validate_config(config: &Config) -> Result<(), InventoryError> {
    let required = [
        ("virsh.binary", &config.virsh.binary),
        ("cluster.domain_prefix", &config.cluster.domain_prefix),
        ("cluster.address_prefix", &config.cluster.address_prefix),
        ("cluster.controller", &config.cluster.controller),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            return Err(InventoryError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    if config.virsh.timeout_s < 1 {
        return Err(InventoryError::Validation {
            message: "virsh.timeout_s must be at least 1".into(),
        });
    }
    if config.poll.attempts < 1 {
        return Err(InventoryError::Validation {
            message: "poll.attempts must be at least 1".into(),
        });
    }

    let workers = &config.cluster.workers;
    for (i, w) in workers.iter().enumerate() {
        if w.trim().is_empty() {
            return Err(InventoryError::Validation {
                message: "worker names must not be empty".into(),
            });
        }
        if *w == config.cluster.controller {
            return Err(InventoryError::Validation {
                message: format!("worker '{w}' has the same name as the controller"),
            });
        }
        if workers[i + 1..].contains(w) {
            return Err(InventoryError::Validation {
                message: format!("duplicate worker '{w}'"),
            });
        }
    }

    Ok(())
}

pub fn parse_config(contents: &str, path: &Path) -> Result<Config, InventoryError> {
    let config: Config = facet_toml::from_str(contents).map_err(|e| InventoryError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config, InventoryError> {
    let contents = std::fs::read_to_string(path).map_err(|source| InventoryError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&contents, path)
}

/// Load settings from an explicit path, the per-user config file if it
/// exists, or built-in defaults.
pub fn resolve_settings(explicit: Option<&Path>) -> Result<Settings, InventoryError> {
    let config = match explicit {
        Some(path) => load_config(path)?,
        None => match paths::default_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "using per-user config");
                load_config(&path)?
            }
            _ => Config::default(),
        },
    };
    Ok(Settings::from_config(&config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<Config, InventoryError> {
        parse_config(toml, Path::new("inventory.toml"))
    }

    #[test]
    fn defaults_match_cluster_layout() {
        let settings = Settings::default();
        assert_eq!(settings.virsh_binary, "virsh");
        assert_eq!(settings.libvirt_uri, None);
        assert_eq!(settings.command_timeout, Duration::from_secs(10));
        assert_eq!(settings.address_prefix, "192.168.");
        assert_eq!(settings.attempts, 30);
        assert_eq!(settings.interval, Duration::from_secs(10));
        assert_eq!(settings.log_file, None);
        assert_eq!(
            settings.domains().collect::<Vec<_>>(),
            vec![
                "edays-ansible-k8s_talos-controller",
                "edays-ansible-k8s_talos-worker-1",
                "edays-ansible-k8s_talos-worker-2",
            ]
        );
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse("").unwrap();
        let settings = Settings::from_config(&config);
        assert_eq!(settings.instances.len(), 3);
        assert_eq!(settings.attempts, 30);
    }

    #[test]
    fn parse_full_config() {
        let config = parse(
            r#"
[virsh]
binary = "/usr/local/bin/virsh"
uri = "qemu:///system"
timeout_s = 5

[cluster]
domain_prefix = "lab"
address_prefix = "10.0."
controller = "cp"
workers = ["w1", "w2", "w3"]

[poll]
attempts = 3
interval_s = 0

[logging]
file = "/tmp/inventory.log"
"#,
        )
        .unwrap();
        let settings = Settings::from_config(&config);
        assert_eq!(settings.virsh_binary, "/usr/local/bin/virsh");
        assert_eq!(settings.libvirt_uri.as_deref(), Some("qemu:///system"));
        assert_eq!(settings.command_timeout, Duration::from_secs(5));
        assert_eq!(settings.address_prefix, "10.0.");
        assert_eq!(settings.attempts, 3);
        assert_eq!(settings.interval, Duration::ZERO);
        assert_eq!(settings.log_file, Some(PathBuf::from("/tmp/inventory.log")));

        let roles: Vec<_> = settings.instances.iter().map(|i| i.role).collect();
        assert_eq!(
            roles,
            vec![Role::Controller, Role::Worker, Role::Worker, Role::Worker]
        );
        assert_eq!(settings.instances[3].domain, "lab_w3");
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = parse("[poll]\nattempts = 0\n").unwrap_err();
        assert!(err.to_string().contains("poll.attempts"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = parse("[virsh]\ntimeout_s = 0\n").unwrap_err();
        assert!(err.to_string().contains("virsh.timeout_s"));
    }

    #[test]
    fn empty_address_prefix_rejected() {
        let err = parse("[cluster]\naddress_prefix = \"\"\n").unwrap_err();
        assert!(err.to_string().contains("cluster.address_prefix"));
    }

    #[test]
    fn duplicate_worker_rejected() {
        let err = parse("[cluster]\nworkers = [\"a\", \"a\"]\n").unwrap_err();
        assert!(err.to_string().contains("duplicate worker 'a'"));
    }

    #[test]
    fn worker_named_like_controller_rejected() {
        let err = parse("[cluster]\nworkers = [\"talos-controller\"]\n").unwrap_err();
        assert!(err.to_string().contains("same name as the controller"));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = parse("[poll\nattempts = ").unwrap_err();
        assert!(matches!(err, InventoryError::ConfigParse { .. }));
    }

    #[test]
    fn missing_explicit_file_is_load_error() {
        let err = resolve_settings(Some(Path::new("/nonexistent/inventory.toml"))).unwrap_err();
        assert!(matches!(err, InventoryError::ConfigLoad { .. }));
    }
}
