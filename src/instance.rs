//! The VMs an inventory run looks for.

use std::collections::BTreeMap;

/// Instance name → discovered address. Only resolved instances are present.
pub type AddressMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Controller,
    Worker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Short name, e.g. `talos-worker-1`. Keys the address map.
    pub name: String,
    pub role: Role,
    /// libvirt domain name: `<domain_prefix>_<name>`.
    pub domain: String,
}

impl Instance {
    pub fn new(domain_prefix: &str, name: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            role,
            domain: format!("{domain_prefix}_{name}"),
        }
    }
}
