use std::time::Duration;

use serde::Serialize;

use crate::error::InvalidInput;
use crate::probe::probe;
use crate::registry::Registry;

/// Response shape of the on-demand probe boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub open: bool,
    pub host: String,
    pub port: u16,
    pub time_ms: u64,
    pub message: String,
    pub brand: String,
}

/// Run a one-off probe on behalf of an external caller.
///
/// The brand must be registered and the port inside `[1, 65535]`;
/// anything else is rejected before any I/O happens. The timeout arrives
/// in seconds and is clamped the same way scheduled probes are.
pub async fn check(
    registry: &Registry,
    brand: &str,
    host: &str,
    port: u32,
    timeout_secs: u64,
) -> Result<ProbeReport, InvalidInput> {
    if !registry.contains_brand(brand) {
        return Err(InvalidInput::UnknownBrand { brand: brand.to_string() });
    }
    if port == 0 || port > u32::from(u16::MAX) {
        return Err(InvalidInput::PortOutOfRange { port });
    }

    let result = probe(host, port as u16, Duration::from_secs(timeout_secs)).await;

    Ok(ProbeReport {
        open: result.open,
        host: host.to_string(),
        port: port as u16,
        time_ms: result.elapsed_ms,
        message: result.detail,
        brand: brand.to_string(),
    })
}
