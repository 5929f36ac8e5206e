//! Address lookup for a single VM via `virsh domifaddr`.

use crate::backend::Backend;
use crate::instance::Instance;

/// Extract an address from `domifaddr` output.
///
/// The first whitespace-separated token containing `prefix`, scanning line
/// by line, is returned with any `/NN` subnet suffix removed. A token that
/// is empty once the suffix is gone (e.g. `/192.168.1.10`) yields `None`.
pub fn parse_address(output: &str, prefix: &str) -> Option<String> {
    let token = output
        .lines()
        .find_map(|line| line.split_whitespace().find(|tok| tok.contains(prefix)))?;
    let addr = token.split('/').next().unwrap_or(token);
    (!addr.is_empty()).then(|| addr.to_string())
}

/// Look up the current address of `instance`. Any failure to run `virsh`
/// counts as "no address yet".
pub async fn probe_address<B: Backend>(
    backend: &B,
    instance: &Instance,
    prefix: &str,
) -> Option<String> {
    match backend.domifaddr(&instance.domain).await {
        Ok(output) => {
            let addr = parse_address(&output, prefix);
            tracing::debug!(vm = %instance.name, address = ?addr, "probed address");
            addr
        }
        Err(e) => {
            tracing::debug!(vm = %instance.name, error = %e, "domifaddr failed");
            None
        }
    }
}
