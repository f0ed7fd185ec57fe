use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::models::{AppState, ConflictResponse, ReceivedResponse};
use crate::claims::ClaimRecord;

/// Accept a node's status report into the pending queue. A claim on a target
/// another node holds is refused with `409 Conflict`.
#[post("/status")]
pub async fn post_status(
    state: web::Data<AppState>,
    body: web::Json<ClaimRecord>,
) -> impl Responder {
    let report = body.into_inner();
    debug!("POST /status - node={} status={:?}", report.node, report.status);

    match state.node.accept_report(report) {
        Ok(()) => HttpResponse::Ok().json(ReceivedResponse { received: true }),
        Err(conflict) => {
            info!("POST /status - rejected: {}", conflict);
            HttpResponse::Conflict().json(ConflictResponse {
                failure_reason: conflict.to_string(),
            })
        }
    }
}

/// Claims reported but not yet embedded in a committed block.
#[get("/pending.json")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.node.pending())
}
