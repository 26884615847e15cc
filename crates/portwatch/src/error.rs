use thiserror::Error;

/// Input validation failures at the check boundary.
///
/// These never touch monitoring state and map to client errors on the
/// HTTP surface. Probe timeouts and connect failures are not errors at
/// all; they come back as closed [`crate::types::ProbeResult`]s.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("unknown brand: {brand}")]
    UnknownBrand { brand: String },
    #[error("port {port} is outside the valid range 1-65535")]
    PortOutOfRange { port: u32 },
}
