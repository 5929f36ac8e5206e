use std::process::Stdio;
use std::time::Duration;

use crate::config::Settings;
use crate::error::CommandError;

/// Runs the real `virsh` binary, one child process per call.
#[derive(Debug, Clone)]
pub struct VirshBackend {
    binary: String,
    uri: Option<String>,
    timeout: Duration,
}

impl VirshBackend {
    pub fn new(settings: &Settings) -> Self {
        Self {
            binary: settings.virsh_binary.clone(),
            uri: settings.libvirt_uri.clone(),
            timeout: settings.command_timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, CommandError> {
        let mut cmd = tokio::process::Command::new(&self.binary);
        if let Some(uri) = &self.uri {
            cmd.arg("-c").arg(uri);
        }
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);

        tracing::debug!(binary = %self.binary, ?args, "running virsh");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| CommandError::Spawn {
                program: self.binary.clone(),
                source,
            })?,
            Err(_) => {
                return Err(CommandError::Timeout {
                    program: self.binary.clone(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            return Err(CommandError::Failed {
                program: self.binary.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl super::Backend for VirshBackend {
    async fn domifaddr(&self, domain: &str) -> Result<String, CommandError> {
        self.run(&["domifaddr", domain]).await
    }

    async fn list_running(&self) -> Result<String, CommandError> {
        self.run(&["list", "--state-running"]).await
    }
}
