use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::types::ProbeResult;

/// Smallest probe timeout honored; shorter requests are raised to this.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(1000);
/// Largest probe timeout honored; longer requests are lowered to this.
pub const MAX_TIMEOUT: Duration = Duration::from_millis(30000);

/// Clamp a caller-supplied probe timeout into the supported window.
/// Out-of-range values are adjusted, never rejected.
pub fn clamp_timeout(requested: Duration) -> Duration {
    requested.clamp(MIN_TIMEOUT, MAX_TIMEOUT)
}

/// Probe TCP reachability of `(host, port)`, bounded by `budget`.
///
/// The connect attempt races the timeout. A successful connection is
/// closed immediately; the probe only cares about reachability. Connect
/// failures (refused, unreachable, DNS) are data, not errors: they come
/// back as a closed result with the error text in `detail`. No retries
/// happen here; the scheduler re-probes on the next cycle.
pub async fn probe(host: &str, port: u16, budget: Duration) -> ProbeResult {
    let budget = clamp_timeout(budget);
    let start = Instant::now();

    match timeout(budget, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            ProbeResult::connected(start.elapsed().as_millis() as u64)
        }
        Ok(Err(e)) => ProbeResult::failed(start.elapsed().as_millis() as u64, e.to_string()),
        Err(_) => ProbeResult::timed_out(start.elapsed().as_millis() as u64),
    }
}
