#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;

use actix_web::{App, HttpServer, web};
use serde::Deserialize;
use tracing::{info, warn};

mod error;
mod routes;

use error::AppError;
use logger::init_tracing;
use portwatch::{BrandSpec, Registry};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let registry = load_registry();
    info!(brands = registry.brand_count(), "brand roster loaded");

    let addr: SocketAddr = "0.0.0.0:8080".parse()?;
    run_server(addr, registry).await
}

/// Brand roster from `PORTWATCH_CONFIG` (or `./portwatch.toml`). A missing
/// or unreadable file yields an empty roster so the server still comes up;
/// every check then rejects with an unknown-brand error.
fn load_registry() -> Registry {
    #[derive(Debug, Deserialize)]
    struct Roster {
        #[serde(default)]
        brands: Vec<BrandSpec>,
    }

    let path = std::env::var("PORTWATCH_CONFIG").unwrap_or_else(|_| "portwatch.toml".to_string());

    let brands = match std::fs::read_to_string(&path) {
        Ok(raw) => match toml::from_str::<Roster>(&raw) {
            Ok(roster) => roster.brands,
            Err(e) => {
                warn!(path = %path, error = %e, "failed to parse brand roster, starting empty");
                Vec::new()
            }
        },
        Err(e) => {
            warn!(path = %path, error = %e, "failed to read brand roster, starting empty");
            Vec::new()
        }
    };

    Registry::from_brands(&brands)
}

async fn run_server(addr: SocketAddr, registry: Registry) -> Result<(), AppError> {
    let registry = web::Data::new(registry);

    HttpServer::new(move || {
        App::new().app_data(registry.clone()).configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
