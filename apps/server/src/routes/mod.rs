pub mod check;
pub mod health;

use actix_web::web::ServiceConfig;

pub fn routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_route).service(check::check_route);
}
