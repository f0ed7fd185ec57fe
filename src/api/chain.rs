use actix_web::{HttpResponse, Responder, get, web};
use log::debug;

use super::models::{AppState, ChainQuery};

/// Committed blocks starting at index `i` (default 0). Peers sync from here.
#[get("/blockchain.json")]
pub async fn get_blockchain(
    state: web::Data<AppState>,
    query: web::Query<ChainQuery>,
) -> impl Responder {
    let blocks = state.node.blocks_from(query.i);
    debug!("GET /blockchain.json?i={} -> {} block(s)", query.i, blocks.len());
    HttpResponse::Ok().json(blocks)
}
