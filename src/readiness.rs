use crate::backend::Backend;

/// True if every domain name appears somewhere in `virsh list` output.
///
/// Substring match, so `lab_w1` is also satisfied by a running `lab_w10`.
pub fn all_running<'a>(output: &str, mut domains: impl Iterator<Item = &'a str>) -> bool {
    domains.all(|d| output.contains(d))
}

/// Whether all the given domains are currently running. A failed
/// `virsh list` counts as "not running".
pub async fn check_running<'a, B: Backend>(
    backend: &B,
    domains: impl Iterator<Item = &'a str>,
) -> bool {
    match backend.list_running().await {
        Ok(output) => all_running(&output, domains),
        Err(e) => {
            tracing::debug!(error = %e, "virsh list failed");
            false
        }
    }
}
