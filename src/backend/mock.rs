//! Scripted backend for exercising discovery without libvirt.
//!
//! Records every call and replays queued replies per domain, so polling
//! tests can say "no lease on the first pass, an address on the second".

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::error::CommandError;

#[derive(Debug, Clone)]
pub enum Reply {
    Output(String),
    /// Non-zero exit with the given stderr.
    Fail(String),
}

impl Reply {
    fn into_result(self) -> Result<String, CommandError> {
        match self {
            Reply::Output(s) => Ok(s),
            Reply::Fail(stderr) => Err(CommandError::Failed {
                program: "virsh".into(),
                status: "exit status: 1".into(),
                stderr,
            }),
        }
    }
}

/// Test-double backend. Unscripted `domifaddr` calls return an empty
/// table; an unscripted `list` fails.
#[derive(Default)]
pub struct MockBackend {
    running: Option<Reply>,
    addresses: RefCell<HashMap<String, VecDeque<Reply>>>,
    calls: RefCell<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply for every `list --state-running` call.
    pub fn with_running(mut self, reply: Reply) -> Self {
        self.running = Some(reply);
        self
    }

    /// Queue one reply for the next `domifaddr <domain>` call.
    pub fn with_domifaddr(self, domain: &str, reply: Reply) -> Self {
        self.addresses
            .borrow_mut()
            .entry(domain.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Commands issued so far, e.g. `"domifaddr lab_cp"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn domifaddr_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with("domifaddr "))
            .count()
    }
}

impl super::Backend for MockBackend {
    async fn domifaddr(&self, domain: &str) -> Result<String, CommandError> {
        self.calls.borrow_mut().push(format!("domifaddr {domain}"));
        let reply = self
            .addresses
            .borrow_mut()
            .get_mut(domain)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Reply::Output(String::new()));
        reply.into_result()
    }

    async fn list_running(&self) -> Result<String, CommandError> {
        self.calls.borrow_mut().push("list --state-running".into());
        self.running
            .clone()
            .unwrap_or_else(|| Reply::Fail("failed to connect to the hypervisor".into()))
            .into_result()
    }
}

/// `virsh domifaddr` table with one lease.
pub fn domifaddr_table(address: &str) -> String {
    format!(
        " Name       MAC address          Protocol     Address\n\
         -------------------------------------------------------------------------------\n \
         vnet0      52:54:00:6b:3c:58    ipv4         {address}\n"
    )
}

/// `virsh list --state-running` table naming the given domains.
pub fn running_table(domains: &[&str]) -> String {
    let mut out = String::from(" Id   Name                                   State\n");
    out.push_str("-----------------------------------------------------\n");
    for (i, d) in domains.iter().enumerate() {
        out.push_str(&format!(" {}    {d}   running\n", i + 1));
    }
    out
}
