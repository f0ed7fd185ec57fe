mod chain;
mod health;
mod mined;
pub mod models;
mod status;

use actix_web::web::ServiceConfig;

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(health::health_check)
        .service(chain::get_blockchain)
        .service(status::post_status)
        .service(status::get_pending)
        .service(mined::post_mined);
}
