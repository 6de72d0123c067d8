//! Penny Wager Server
//!
//! Runs the round server, or verifies a single outcome offline:
//!
//! ```text
//! penny-wager-server                                   # serve
//! penny-wager-server verify <server_seed> <client_seed> <nonce> <game>
//! ```

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use penny_wager::{
    engine::{EngineConfig, WagerEngine},
    game::state::GameType,
    network::{AuthConfig, ServerConfig, WagerServer},
    proof::commitment::verify_commitment,
    verify_outcome, CommitmentHash, VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("verify") => verify(&args[1..]),
        Some(other) => bail!("unknown command: {} (expected `verify` or no arguments)", other),
        None => serve().await,
    }
}

fn init_tracing() {
    let default = if cfg!(feature = "debug-tracing") { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Offline recomputation of an outcome from public inputs.
fn verify(args: &[String]) -> Result<()> {
    let [server_seed, client_seed, nonce, game] = args else {
        bail!("usage: verify <server_seed> <client_seed> <nonce> <game>");
    };
    let nonce: u64 = nonce.parse().context("nonce must be an unsigned integer")?;
    let game: GameType = game.parse().context("unknown game")?;

    let outcome = verify_outcome(server_seed, client_seed, nonce, game);
    println!("commitment: {}", CommitmentHash::of_seed(server_seed));
    println!("outcome:    {}", serde_json::to_string(&outcome)?);

    if let Ok(expected) = std::env::var("PENNY_EXPECT_COMMITMENT") {
        let expected: CommitmentHash = expected.parse().context("PENNY_EXPECT_COMMITMENT")?;
        println!("matches {}: {}", expected, verify_commitment(&expected, server_seed));
    }
    Ok(())
}

async fn serve() -> Result<()> {
    let engine_config = EngineConfig::from_env().context("engine configuration")?;
    let server_config = ServerConfig::from_env().context("server configuration")?;
    let auth_config = AuthConfig::from_env();

    info!("Penny Wager Server v{}", VERSION);
    info!(
        "House edge: {} bps, open timeout: {} ms",
        engine_config.rules.outcome.house_edge_bps, engine_config.open_timeout_ms
    );
    if !auth_config.is_configured() {
        if auth_config.allow_anonymous {
            info!("Auth: anonymous addresses accepted");
        } else {
            info!("Auth: not configured, every login will be refused");
        }
    }

    let server = std::sync::Arc::new(WagerServer::new(server_config, auth_config, WagerEngine::new(engine_config)));

    let signal_server = server.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            signal_server.shutdown();
        }
    });

    server.run().await?;
    info!("Server stopped");
    Ok(())
}
