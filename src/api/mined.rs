use actix_web::{HttpResponse, Responder, post, web};
use log::debug;

use super::models::{AppState, ReceivedResponse};
use crate::blockchain::Block;

/// A peer announces a block it mined. Validation runs later on the scheduler;
/// the caller only learns that the block was received.
#[post("/mined")]
pub async fn post_mined(state: web::Data<AppState>, body: web::Json<Block>) -> impl Responder {
    let block = body.into_inner();
    debug!("POST /mined - block #{} ({})", block.index, block.hash);
    state.node.scheduler().submit_validation(block);
    HttpResponse::Ok().json(ReceivedResponse { received: true })
}
