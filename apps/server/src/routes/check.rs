use actix_web::{HttpResponse, ResponseError, get, http::StatusCode, web};
use serde::Deserialize;
use thiserror::Error;

use portwatch::{InvalidInput, Registry, check};

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub brand: String,
    pub host: String,
    pub port: u32,
    /// Timeout in seconds; the engine clamps it to its supported window.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    5
}

/// Validation failures surface as 400s; state is never touched.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct CheckError(#[from] InvalidInput);

impl ResponseError for CheckError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// On-demand probe of an arbitrary host/port for a registered brand.
#[get("/check")]
pub async fn check_route(
    registry: web::Data<Registry>,
    query: web::Query<CheckQuery>,
) -> Result<HttpResponse, CheckError> {
    let report =
        check(&registry, &query.brand, &query.host, query.port, query.timeout).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};
    use portwatch::BrandSpec;
    use tokio::net::TcpListener;

    fn registry() -> web::Data<Registry> {
        web::Data::new(Registry::from_brands(&[BrandSpec {
            name: "acme".to_string(),
            port: 443,
            primary_ip: "10.0.0.1".to_string(),
            secondary_ip: String::new(),
        }]))
    }

    #[actix_web::test]
    async fn test_check_rejects_unknown_brand() {
        let app = test::init_service(
            App::new().app_data(registry()).service(check_route),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/check?brand=initech&host=127.0.0.1&port=80")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_check_rejects_out_of_range_port() {
        let app = test::init_service(
            App::new().app_data(registry()).service(check_route),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/check?brand=acme&host=127.0.0.1&port=70000")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_check_reports_open_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let app = test::init_service(
            App::new().app_data(registry()).service(check_route),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/check?brand=acme&host=127.0.0.1&port={port}&timeout=2"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["open"], true);
        assert_eq!(body["brand"], "acme");
        assert_eq!(body["message"], "connected");
    }
}
