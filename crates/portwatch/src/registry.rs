use serde::{Deserialize, Serialize};

use crate::types::{EndpointId, Role};

/// Roster entry for a single brand, as it appears in configuration.
///
/// An empty IP string means the role is not applicable for this brand;
/// such a role is never probed and is rendered as `unknown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSpec {
    pub name: String,
    pub port: u16,
    #[serde(default)]
    pub primary_ip: String,
    #[serde(default)]
    pub secondary_ip: String,
}

/// One monitored address belonging to a brand. Immutable after registry load.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub id: EndpointId,
    /// `None` when the role is not configured for this brand.
    pub host: Option<String>,
    pub port: u16,
}

impl Endpoint {
    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }
}

/// Static brand -> {primary, secondary} endpoint mapping.
///
/// Endpoints are kept in brand declaration order, primary before secondary,
/// which is the order the scheduler probes them in.
#[derive(Debug)]
pub struct Registry {
    endpoints: Vec<Endpoint>,
}

impl Registry {
    pub fn from_brands(brands: &[BrandSpec]) -> Self {
        let mut endpoints = Vec::with_capacity(brands.len() * 2);

        for brand in brands {
            endpoints.push(Endpoint {
                id: EndpointId::new(&brand.name, Role::Primary),
                host: non_empty(&brand.primary_ip),
                port: brand.port,
            });
            endpoints.push(Endpoint {
                id: EndpointId::new(&brand.name, Role::Secondary),
                host: non_empty(&brand.secondary_ip),
                port: brand.port,
            });
        }

        Self { endpoints }
    }

    /// All endpoints in probing order, configured or not.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn get(&self, id: &EndpointId) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.id == *id)
    }

    pub fn contains_brand(&self, name: &str) -> bool {
        self.endpoints.iter().any(|e| e.id.brand == name)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Number of registered brands (each brand contributes two endpoints).
    pub fn brand_count(&self) -> usize {
        self.endpoints.len() / 2
    }
}

fn non_empty(host: &str) -> Option<String> {
    let trimmed = host.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
