//! Polling loop: wait for every VM to pick up a DHCP lease.

use crate::backend::Backend;
use crate::config::Settings;
use crate::instance::AddressMap;
use crate::{probe, readiness};

/// Poll until every instance has an address or attempts run out.
///
/// Returns an empty map straight away if the VMs are not all running.
/// Otherwise each pass probes only the instances still unresolved, and
/// passes are separated by `settings.interval`. Whatever was resolved when
/// the loop ends is returned, so the map may be partial.
pub async fn wait_for_addresses<B: Backend>(backend: &B, settings: &Settings) -> AddressMap {
    let mut addresses = AddressMap::new();

    if !readiness::check_running(backend, settings.domains()).await {
        tracing::info!("cluster VMs are not all running");
        return addresses;
    }

    for attempt in 1..=settings.attempts {
        for instance in &settings.instances {
            if addresses.contains_key(&instance.name) {
                continue;
            }
            if let Some(addr) =
                probe::probe_address(backend, instance, &settings.address_prefix).await
            {
                tracing::info!(vm = %instance.name, address = %addr, "resolved address");
                addresses.insert(instance.name.clone(), addr);
            }
        }

        if addresses.len() == settings.instances.len() {
            tracing::debug!(attempt, "all addresses resolved");
            break;
        }

        tracing::debug!(
            attempt,
            resolved = addresses.len(),
            total = settings.instances.len(),
            "waiting for remaining leases"
        );
        tokio::time::sleep(settings.interval).await;
    }

    addresses
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backend::mock::{MockBackend, Reply, domifaddr_table, running_table};

    const CP: &str = "edays-ansible-k8s_talos-controller";
    const W1: &str = "edays-ansible-k8s_talos-worker-1";
    const W2: &str = "edays-ansible-k8s_talos-worker-2";

    fn lease(addr: &str) -> Reply {
        Reply::Output(domifaddr_table(addr))
    }

    fn running() -> MockBackend {
        MockBackend::new().with_running(Reply::Output(running_table(&[CP, W1, W2])))
    }

    #[tokio::test(start_paused = true)]
    async fn not_running_returns_empty_without_sleeping() {
        let mock = MockBackend::new().with_running(Reply::Output(running_table(&[CP, W1])));
        let start = tokio::time::Instant::now();

        let addrs = wait_for_addresses(&mock, &Settings::default()).await;

        assert!(addrs.is_empty());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(mock.domifaddr_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn list_failure_returns_empty() {
        let mock = MockBackend::new();
        let addrs = wait_for_addresses(&mock, &Settings::default()).await;
        assert!(addrs.is_empty());
        assert_eq!(mock.calls(), vec!["list --state-running"]);
    }

    #[tokio::test(start_paused = true)]
    async fn all_resolved_on_first_pass() {
        let mock = running()
            .with_domifaddr(CP, lease("192.168.1.10/24"))
            .with_domifaddr(W1, lease("192.168.1.11/24"))
            .with_domifaddr(W2, lease("192.168.1.12/24"));
        let start = tokio::time::Instant::now();

        let addrs = wait_for_addresses(&mock, &Settings::default()).await;

        assert_eq!(addrs["talos-controller"], "192.168.1.10");
        assert_eq!(addrs["talos-worker-1"], "192.168.1.11");
        assert_eq!(addrs["talos-worker-2"], "192.168.1.12");
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(
            mock.calls(),
            vec![
                "list --state-running".to_string(),
                format!("domifaddr {CP}"),
                format!("domifaddr {W1}"),
                format!("domifaddr {W2}"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_instances_are_not_probed_again() {
        let mock = running()
            .with_domifaddr(CP, lease("192.168.1.10/24"))
            .with_domifaddr(W1, Reply::Fail("no lease".into()))
            .with_domifaddr(W1, lease("192.168.1.11/24"))
            .with_domifaddr(W2, Reply::Output(String::new()))
            .with_domifaddr(W2, lease("192.168.1.12/24"));
        let start = tokio::time::Instant::now();

        let addrs = wait_for_addresses(&mock, &Settings::default()).await;

        assert_eq!(addrs.len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        let cp_probes = mock
            .calls()
            .iter()
            .filter(|c| c.ends_with("talos-controller"))
            .count();
        assert_eq!(cp_probes, 1);
        assert_eq!(mock.domifaddr_calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_address_is_not_recorded() {
        let mock = running()
            .with_domifaddr(
                CP,
                Reply::Output(" vnet0  52:54:00:aa:bb:cc  ipv4  /192.168.1.10\n".into()),
            )
            .with_domifaddr(CP, lease("192.168.1.10/24"))
            .with_domifaddr(W1, lease("192.168.1.11/24"))
            .with_domifaddr(W2, lease("192.168.1.12/24"));
        let start = tokio::time::Instant::now();

        let addrs = wait_for_addresses(&mock, &Settings::default()).await;

        assert_eq!(
            addrs.get("talos-controller").map(String::as_str),
            Some("192.168.1.10")
        );
        assert_eq!(addrs.len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(mock.domifaddr_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_attempts_with_partial_map() {
        let mock = running().with_domifaddr(CP, lease("192.168.1.10/24"));
        let start = tokio::time::Instant::now();

        let addrs = wait_for_addresses(&mock, &Settings::default()).await;

        assert_eq!(addrs.len(), 1);
        assert_eq!(addrs["talos-controller"], "192.168.1.10");
        // 30 passes, each followed by a 10s pause
        assert_eq!(start.elapsed(), Duration::from_secs(300));
        assert_eq!(mock.domifaddr_calls(), 1 + 30 * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn honours_configured_attempts_and_interval() {
        let settings = Settings {
            attempts: 2,
            interval: Duration::from_secs(1),
            ..Settings::default()
        };
        let mock = running();
        let start = tokio::time::Instant::now();

        let addrs = wait_for_addresses(&mock, &settings).await;

        assert!(addrs.is_empty());
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(mock.domifaddr_calls(), 6);
    }
}
