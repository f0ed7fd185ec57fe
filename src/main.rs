mod api;
mod blockchain;
mod claims;
mod config;
mod error;
mod mining;
mod network;
mod node;
mod storage;
#[cfg(test)]
mod test_support;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, rt, web};
use clap::Parser;
use dotenvy::dotenv;
use log::{error, info};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use api::AppState;
use blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_ROUNDS};
use config::NodeConfig;
use error::{ConfigError, ConsensusError};
use mining::run_worker;
use network::{ChainSync, PeerClient};
use node::Node;
use storage::ChainStore;

/// Proof-of-work ledger node arbitrating exclusive resource claims.
#[derive(Parser)]
#[command(name = "slotchain", version, long_about = None)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to run the node on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// Mine blocks (otherwise only validate peer blocks)
    #[arg(short, long, env = "MINE")]
    mine: bool,

    /// Required leading zero hex digits in a block hash
    #[arg(long, env = "DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Nonces tried per mining round
    #[arg(long, env = "MINING_ROUNDS", default_value_t = DEFAULT_MINING_ROUNDS)]
    rounds: u64,

    /// Peer base URLs, comma separated
    #[arg(long, env = "PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Directory holding the local chain
    #[arg(long, env = "DATA_DIR", default_value = "chaindata")]
    data_dir: PathBuf,
}

impl From<Cli> for NodeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            mine: cli.mine,
            difficulty: cli.difficulty,
            mining_rounds: cli.rounds,
            peers: cli.peers,
            data_dir: cli.data_dir,
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from(Cli::parse());
    config.validate().map_err(io::Error::other)?;

    let store = ChainStore::open(&config.data_dir).map_err(io::Error::other)?;
    let peers = PeerClient::new(config.peers.clone())
        .map_err(ConfigError::from)
        .map_err(io::Error::other)?;
    info!("syncing with {} peer(s)", peers.peers().len());
    let sync = ChainSync::new(store, peers, config.difficulty);

    // start from the best chain among the local store and the peers
    let chain = sync.sync(true).await.map_err(io::Error::other)?;
    info!(
        "chain synced: {} block(s), tip {}",
        chain.len(),
        chain.tip().hash
    );

    let node = Arc::new(Node::new(chain, sync, &config));
    node.start_mining();

    println!(
        "⛓️ Starting node at http://{}:{} (mining: {})",
        config.host, config.port, config.mine
    );

    let state = web::Data::new(AppState::new(Arc::clone(&node)));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    let worker = rt::spawn(run_worker(node));
    serve_until_halt(server, worker).await
}

/// Run `server` until it shuts down or `worker` ends. Only a fatal invariant
/// violation ends the worker; the server is then stopped and the error returned.
async fn serve_until_halt(
    server: Server,
    worker: JoinHandle<Result<(), ConsensusError>>,
) -> io::Result<()> {
    let handle = server.handle();
    let mut server = rt::spawn(server);

    let halted = tokio::select! {
        served = &mut server => return served.map_err(io::Error::other)?,
        halted = worker => halted.map_err(io::Error::other)?,
    };

    handle.stop(false).await;
    server.await.map_err(io::Error::other)??;
    halted.map_err(|e| {
        error!("node halted: {}", e);
        io::Error::other(e)
    })
}
