use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, HealthResponse};

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let tip = state.node.tip();
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        height: state.node.chain_len(),
        tip: tip.hash,
    })
}
