//! Ansible inventory document built from discovered addresses.

use serde::Serialize;

use crate::config::Settings;
use crate::error::InventoryError;
use crate::instance::{AddressMap, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub all: Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub hosts: Vec<String>,
    pub vars: GroupVars,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupVars {
    pub ansible_connection: String,
    pub talos_controller_ips: Vec<String>,
    pub talos_worker_ips: Vec<String>,
}

impl Inventory {
    /// Playbooks run on the control host and reach the VMs through the
    /// address lists, so the only host is `localhost`.
    ///
    /// Unresolved instances are left out rather than padded.
    pub fn from_addresses(addresses: &AddressMap, settings: &Settings) -> Self {
        let ips_for = |role: Role| -> Vec<String> {
            settings
                .instances
                .iter()
                .filter(|i| i.role == role)
                .filter_map(|i| addresses.get(&i.name))
                .filter(|addr| !addr.is_empty())
                .cloned()
                .collect()
        };

        Self {
            all: Group {
                hosts: vec!["localhost".into()],
                vars: GroupVars {
                    ansible_connection: "local".into(),
                    talos_controller_ips: ips_for(Role::Controller),
                    talos_worker_ips: ips_for(Role::Worker),
                },
            },
        }
    }

    /// Render as JSON with 2-space indentation.
    pub fn to_json(&self) -> Result<String, InventoryError> {
        serde_json::to_string_pretty(self).map_err(|e| InventoryError::Render {
            message: e.to_string(),
        })
    }
}

/// Whether discovery produced anything worth printing.
pub fn has_addresses(addresses: &AddressMap) -> bool {
    addresses.values().any(|a| !a.is_empty())
}
