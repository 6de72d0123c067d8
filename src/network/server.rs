//! WebSocket Round Server
//!
//! Async WebSocket front for the [`WagerEngine`]. Each connection
//! authenticates once, then drives its own rounds. Round events are pushed
//! back to the owner's connections; a background sweep applies deadlines.
//!
//! ```text
//! accept ──▶ handle_connection ──▶ handle_client_message
//!                │                      │
//!                │ mpsc<ServerMessage>  ├── auth      ──▶ SessionManager
//!                ▼                      └── dispatch  ──▶ Arc<RwLock<WagerEngine>>
//!            sender task                              │
//!                                 sweep loop ─────────┴──▶ take_events ──▶ route
//! ```

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::engine::WagerEngine;
use crate::error::WagerError;
use crate::game::round::RoundError;
use crate::game::state::{PlayerId, Wager};
use crate::network::auth::{authenticate, AuthConfig};
use crate::network::protocol::{
    AuthRequest, AuthResult, ClientMessage, ErrorCode, ServerError, ServerMessage,
};
use crate::network::session::SessionManager;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Connections silent for this long are dropped.
    pub idle_timeout: Duration,
    /// How often deadlines are applied.
    pub sweep_interval: Duration,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            sweep_interval: Duration::from_millis(250),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `PENNY_BIND_ADDR`, `PENNY_MAX_CONNECTIONS`,
    /// `PENNY_IDLE_TIMEOUT_SECS` and `PENNY_SWEEP_INTERVAL_MS`.
    pub fn from_env() -> Result<Self, WagerServerError> {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var("PENNY_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| WagerServerError::Config(format!("PENNY_BIND_ADDR: {}", e)))?;
        }
        if let Some(max) = env_number("PENNY_MAX_CONNECTIONS")? {
            config.max_connections = max as usize;
        }
        if let Some(secs) = env_number("PENNY_IDLE_TIMEOUT_SECS")? {
            config.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_number("PENNY_SWEEP_INTERVAL_MS")? {
            config.sweep_interval = Duration::from_millis(ms);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject unusable values.
    pub fn validate(&self) -> Result<(), WagerServerError> {
        if self.max_connections == 0 {
            return Err(WagerServerError::Config("max_connections must be positive".into()));
        }
        if self.sweep_interval.is_zero() {
            return Err(WagerServerError::Config("sweep_interval must be positive".into()));
        }
        Ok(())
    }
}

fn env_number(name: &str) -> Result<Option<u64>, WagerServerError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| WagerServerError::Config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum WagerServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Bad configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Connected client state.
struct ConnectedClient {
    /// Player identifier (after auth).
    player_id: Option<PlayerId>,
    /// Connection time.
    connected_at: Instant,
    /// Last activity.
    last_activity: Instant,
}

type Clients = Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>;

/// State shared by every connection task.
struct Shared {
    config: ServerConfig,
    auth: AuthConfig,
    engine: Arc<RwLock<WagerEngine>>,
    sessions: Arc<SessionManager>,
    clients: Clients,
}

/// The round server.
pub struct WagerServer {
    shared: Arc<Shared>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl WagerServer {
    /// Create a new server around an engine.
    pub fn new(config: ServerConfig, auth: AuthConfig, engine: WagerEngine) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            shared: Arc::new(Shared {
                config,
                auth,
                engine: Arc::new(RwLock::new(engine)),
                sessions: Arc::new(SessionManager::new()),
                clients: Arc::new(RwLock::new(BTreeMap::new())),
            }),
            shutdown_tx,
        }
    }

    /// Shared engine handle.
    pub fn engine(&self) -> Arc<RwLock<WagerEngine>> {
        self.shared.engine.clone()
    }

    /// Run the server until [`WagerServer::shutdown`] is called.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), WagerServerError> {
        let listener = TcpListener::bind(&self.shared.config.bind_addr).await?;
        info!("Wager server listening on {}", self.shared.config.bind_addr);

        let sweep_shared = self.shared.clone();
        let sweep_handle = tokio::spawn(async move {
            Self::run_sweep_loop(sweep_shared).await;
        });

        let cleanup_shared = self.shared.clone();
        let cleanup_handle = tokio::spawn(async move {
            Self::run_cleanup_loop(cleanup_shared).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.shared.clients.read().await.len();
                            if clients_count >= self.shared.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        sweep_handle.abort();
        cleanup_handle.abort();

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let shared = self.shared.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            {
                let mut clients = shared.clients.write().await;
                clients.insert(addr, ConnectedClient {
                    player_id: None,
                    connected_at: Instant::now(),
                    last_activity: Instant::now(),
                });
            }

            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        let text = match msg {
                            Some(Ok(Message::Text(text))) => text,
                            Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                                Ok(text) => text,
                                Err(_) => {
                                    let _ = msg_tx.send(invalid_format()).await;
                                    continue;
                                }
                            },
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            // tungstenite answers pings itself
                            _ => continue,
                        };

                        let client_msg = match ClientMessage::from_json(&text) {
                            Ok(m) => m,
                            Err(e) => {
                                debug!("Invalid message from {}: {}", addr, e);
                                let _ = msg_tx.send(invalid_format()).await;
                                continue;
                            }
                        };

                        {
                            let mut clients = shared.clients.write().await;
                            if let Some(client) = clients.get_mut(&addr) {
                                client.last_activity = Instant::now();
                            }
                        }

                        Self::handle_client_message(addr, client_msg, &shared, &msg_tx).await;
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            {
                let mut clients = shared.clients.write().await;
                if let Some(client) = clients.remove(&addr) {
                    if let Some(player_id) = client.player_id {
                        shared.sessions.unregister(&player_id, addr).await;
                    }
                    debug!("Client {} was connected for {:?}", addr, client.connected_at.elapsed());
                }
            }

            // Let queued replies drain before the socket drops.
            drop(msg_tx);
            let mut sender_task = sender_task;
            if tokio::time::timeout(Duration::from_secs(1), &mut sender_task).await.is_err() {
                sender_task.abort();
            }

            info!("Client {} cleaned up", addr);
        });
    }

    /// Handle a client message.
    async fn handle_client_message(
        addr: SocketAddr,
        msg: ClientMessage,
        shared: &Shared,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let reply = match msg {
            ClientMessage::Auth(auth) => Self::handle_auth(addr, auth, shared, sender).await,
            msg => {
                let player_id = {
                    let clients = shared.clients.read().await;
                    clients.get(&addr).and_then(|c| c.player_id.clone())
                };
                match player_id {
                    Some(player_id) => {
                        let reply = dispatch(&shared.engine, &player_id, msg).await;
                        flush_events(&shared.engine, &shared.sessions).await;
                        reply
                    }
                    None => match msg {
                        ClientMessage::Ping { .. } | ClientMessage::Verify { .. } | ClientMessage::RecentCrashes => {
                            public_query(&shared.engine, msg).await
                        }
                        _ => ServerMessage::Error(ServerError::new(
                            ErrorCode::NotAuthenticated,
                            "Must authenticate first",
                        )),
                    },
                }
            }
        };

        let _ = sender.send(reply).await;
    }

    /// Handle authentication.
    async fn handle_auth(
        addr: SocketAddr,
        auth: AuthRequest,
        shared: &Shared,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> ServerMessage {
        let player_id = match authenticate(&auth.address, auth.token.as_deref(), &shared.auth) {
            Ok(player_id) => player_id,
            Err(e) => {
                warn!("Auth failed for {}: {}", addr, e);
                return ServerMessage::AuthResult(AuthResult {
                    success: false,
                    player_id: None,
                    error: Some(e.to_string()),
                    server_version: shared.config.version.clone(),
                });
            }
        };

        let previous = {
            let mut clients = shared.clients.write().await;
            clients
                .get_mut(&addr)
                .and_then(|client| client.player_id.replace(player_id.clone()))
        };
        if let Some(previous) = previous {
            shared.sessions.unregister(&previous, addr).await;
        }
        shared.sessions.register(player_id.clone(), addr, sender.clone()).await;

        debug!("Client {} authenticated as {} (client {})", addr, player_id, auth.client_version);
        ServerMessage::AuthResult(AuthResult {
            success: true,
            player_id: Some(player_id.to_string()),
            error: None,
            server_version: shared.config.version.clone(),
        })
    }

    /// Apply deadlines and push the resulting events.
    async fn run_sweep_loop(shared: Arc<Shared>) {
        let mut interval = interval(shared.config.sweep_interval);

        loop {
            interval.tick().await;

            {
                let mut engine = shared.engine.write().await;
                let now = engine.now();
                let report = engine.sweep(now);
                if !report.is_empty() {
                    info!(
                        "Sweep: {} cancelled, {} closed, {} settled",
                        report.cancelled.len(),
                        report.closed.len(),
                        report.settled.len()
                    );
                }
                engine.archive(now);
            }

            flush_events(&shared.engine, &shared.sessions).await;
        }
    }

    /// Drop idle connections and dead senders.
    async fn run_cleanup_loop(shared: Arc<Shared>) {
        let mut interval = interval(Duration::from_secs(60));

        loop {
            interval.tick().await;

            let now = Instant::now();
            let idle_timeout = shared.config.idle_timeout;

            let to_remove: Vec<_> = {
                let clients = shared.clients.read().await;
                clients
                    .iter()
                    .filter(|(_, c)| now.duration_since(c.last_activity) > idle_timeout)
                    .map(|(addr, _)| *addr)
                    .collect()
            };

            for addr in to_remove {
                let mut clients = shared.clients.write().await;
                if let Some(client) = clients.remove(&addr) {
                    if let Some(player_id) = client.player_id {
                        shared.sessions.unregister(&player_id, addr).await;
                    }
                    info!("Removed idle client {}", addr);
                }
            }

            shared.sessions.cleanup().await;
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.shared.clients.read().await.len()
    }

    /// Get authenticated player count.
    pub async fn player_count(&self) -> usize {
        self.shared.sessions.player_count().await
    }
}

fn invalid_format() -> ServerMessage {
    ServerMessage::Error(ServerError::new(ErrorCode::InvalidInput, "Invalid message format"))
}

fn error_reply(err: &WagerError) -> ServerMessage {
    ServerMessage::Error(ServerError::from(err))
}

/// Queries that need no player identity.
async fn public_query(engine: &RwLock<WagerEngine>, msg: ClientMessage) -> ServerMessage {
    let engine = engine.read().await;
    match msg {
        ClientMessage::Ping { timestamp } => ServerMessage::Pong {
            timestamp,
            server_time: engine.now(),
        },
        ClientMessage::Verify { server_seed, client_seed, nonce, game } => ServerMessage::Verified {
            outcome: engine.verify_outcome(&server_seed, &client_seed, nonce, game),
        },
        ClientMessage::RecentCrashes => ServerMessage::RecentCrashes {
            crashes: engine.recent_crashes(),
        },
        _ => ServerMessage::Error(ServerError::new(ErrorCode::NotAuthenticated, "Must authenticate first")),
    }
}

/// Run one request against the engine on behalf of an authenticated player.
pub async fn dispatch(engine: &RwLock<WagerEngine>, player_id: &PlayerId, msg: ClientMessage) -> ServerMessage {
    match msg {
        ClientMessage::Auth(_) => ServerMessage::Error(ServerError::new(
            ErrorCode::InvalidInput,
            "Already authenticated on this path",
        )),
        ClientMessage::Ping { .. } | ClientMessage::Verify { .. } | ClientMessage::RecentCrashes => {
            public_query(engine, msg).await
        }
        ClientMessage::OpenRound { game, seed_id } => {
            let mut engine = engine.write().await;
            let result = match seed_id {
                Some(seed_id) => engine.open_round_on_seed(player_id, game, seed_id),
                None => engine.open_round(player_id, game),
            };
            result.map_or_else(|e| error_reply(&e), ServerMessage::Round)
        }
        ClientMessage::CreateSeedPair { game } => {
            let mut engine = engine.write().await;
            match engine.create_seed_pair(player_id, game) {
                Ok(commitment) => ServerMessage::SeedPair {
                    seed_id: commitment.seed_id,
                    commitment_hash: commitment.commitment_hash,
                    game,
                },
                Err(e) => error_reply(&e),
            }
        }
        ClientMessage::PlaceBet { round_id, amount, choice, client_seed } => {
            let mut engine = engine.write().await;
            engine
                .place_bet(player_id, round_id, Wager { amount, choice }, &client_seed)
                .map_or_else(|e| error_reply(&e), ServerMessage::Round)
        }
        ClientMessage::CloseRound { round_id } => {
            let mut engine = engine.write().await;
            engine
                .close_round(player_id, round_id)
                .map_or_else(|e| error_reply(&e), ServerMessage::Round)
        }
        ClientMessage::CashOut { round_id } => {
            let mut engine = engine.write().await;
            match engine.cash_out(player_id, round_id) {
                Ok(cash_out) => ServerMessage::CashedOut {
                    round_id,
                    multiplier: cash_out.multiplier,
                    elapsed_ms: cash_out.elapsed_ms,
                },
                Err(e) => error_reply(&e),
            }
        }
        ClientMessage::Settle { round_id } => {
            let mut engine = engine.write().await;
            match engine.settle(player_id, round_id) {
                Ok(settlement)
                | Err(WagerError::Round(RoundError::AlreadySettled { settlement })) => {
                    ServerMessage::Settled { round_id, settlement }
                }
                Err(e) => error_reply(&e),
            }
        }
        ClientMessage::RoundStatus { round_id } => {
            let engine = engine.read().await;
            match engine.get_round_status(round_id) {
                Ok(status) if status.player_id == *player_id => ServerMessage::Round(status),
                Ok(_) => error_reply(&WagerError::NotRoundOwner(round_id)),
                Err(e) => error_reply(&e),
            }
        }
        ClientMessage::RevealSeed { seed_id } => {
            let mut engine = engine.write().await;
            match engine.reveal(player_id, seed_id) {
                Ok(server_seed) => ServerMessage::SeedRevealed { seed_id, server_seed },
                Err(e) => error_reply(&e),
            }
        }
        ClientMessage::Receipt { round_id } => {
            let engine = engine.read().await;
            match engine.receipt(round_id) {
                Ok(receipt) if receipt.player_id == *player_id => ServerMessage::Receipt(receipt),
                Ok(_) => error_reply(&WagerError::NotRoundOwner(round_id)),
                Err(e) => error_reply(&e),
            }
        }
    }
}

/// Push queued engine events to their owners.
async fn flush_events(engine: &RwLock<WagerEngine>, sessions: &SessionManager) {
    let events = engine.write().await.take_events();
    for event in events {
        sessions.route_event(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, ManualClock};
    use crate::core::fixed::Amount;
    use crate::engine::EngineConfig;
    use crate::game::outcome::CoinSide;
    use crate::game::state::{GameType, PlayerChoice, RoundId, RoundState};
    use crate::ledger::MemoryLedger;
    use crate::proof::commitment::CommitmentStore;

    const START: u64 = 1_700_000_000_000;

    fn engine() -> (RwLock<WagerEngine>, ManualClock) {
        let clock = ManualClock::new(START);
        let engine = WagerEngine::with_parts(
            EngineConfig::default(),
            Arc::new(clock.clone()),
            CommitmentStore::new(),
            Box::new(MemoryLedger::new()),
        );
        (RwLock::new(engine), clock)
    }

    fn player(address: &str) -> PlayerId {
        PlayerId::from_address(address).unwrap()
    }

    fn round_of(msg: ServerMessage) -> RoundId {
        match msg {
            ServerMessage::Round(status) => status.round_id,
            other => panic!("expected round, got {:?}", other),
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(config.validate().is_ok());

        let broken = ServerConfig {
            sweep_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(broken.validate(), Err(WagerServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let (engine, _) = engine();
        let server = WagerServer::new(config, AuthConfig::default(), engine.into_inner());

        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.player_count().await, 0);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_dispatch_coin_flip_round() {
        let (engine, clock) = engine();
        let alice = player("0xalice");

        let open = dispatch(&engine, &alice, ClientMessage::OpenRound { game: GameType::CoinFlip, seed_id: None }).await;
        let round_id = round_of(open);

        clock.advance(1_000);
        let bet = dispatch(
            &engine,
            &alice,
            ClientMessage::PlaceBet {
                round_id,
                amount: "0.1".parse().unwrap(),
                choice: PlayerChoice::CoinFlip { side: CoinSide::Heads },
                client_seed: "player1".into(),
            },
        )
        .await;
        assert_eq!(round_of(bet), round_id);

        let closed = dispatch(&engine, &alice, ClientMessage::CloseRound { round_id }).await;
        match closed {
            ServerMessage::Round(status) => assert_eq!(status.state, RoundState::Resolving),
            other => panic!("unexpected {:?}", other),
        }

        let first = dispatch(&engine, &alice, ClientMessage::Settle { round_id }).await;
        let second = dispatch(&engine, &alice, ClientMessage::Settle { round_id }).await;
        assert_eq!(first, second);
        match first {
            ServerMessage::Settled { settlement, .. } => {
                let expected = if settlement.won { Amount::from_units(200_000_000_000_000_000) } else { Amount::ZERO };
                assert_eq!(settlement.payout, expected);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_receipt_and_settle_after_archive() {
        let (engine, clock) = engine();
        let alice = player("0xalice");
        let bob = player("0xbob");

        let round_id = round_of(
            dispatch(&engine, &alice, ClientMessage::OpenRound { game: GameType::CoinFlip, seed_id: None }).await,
        );
        let bet = ClientMessage::PlaceBet {
            round_id,
            amount: "0.1".parse().unwrap(),
            choice: PlayerChoice::CoinFlip { side: CoinSide::Tails },
            client_seed: "player1".into(),
        };
        dispatch(&engine, &alice, bet).await;
        dispatch(&engine, &alice, ClientMessage::CloseRound { round_id }).await;
        let settled = dispatch(&engine, &alice, ClientMessage::Settle { round_id }).await;
        assert!(matches!(settled, ServerMessage::Settled { .. }));

        match dispatch(&engine, &alice, ClientMessage::Receipt { round_id }).await {
            ServerMessage::Receipt(receipt) => assert_eq!(receipt.player_id, alice),
            other => panic!("unexpected {:?}", other),
        }
        let foreign = dispatch(&engine, &bob, ClientMessage::Receipt { round_id }).await;
        assert!(matches!(foreign, ServerMessage::Error(ServerError { code: ErrorCode::InvalidInput, .. })));

        let archive_after = engine.read().await.config().archive_after_ms;
        clock.advance(archive_after + 1);
        assert_eq!(engine.write().await.archive(clock.now_ms()), 1);

        let again = dispatch(&engine, &alice, ClientMessage::Settle { round_id }).await;
        assert_eq!(again, settled);
        let foreign = dispatch(&engine, &bob, ClientMessage::Receipt { round_id }).await;
        assert!(matches!(foreign, ServerMessage::Error(_)));
    }

    #[tokio::test]
    async fn test_dispatch_maps_errors() {
        let (engine, _) = engine();
        let alice = player("0xalice");
        let bob = player("0xbob");

        let round_id = round_of(
            dispatch(&engine, &alice, ClientMessage::OpenRound { game: GameType::Aviator, seed_id: None }).await,
        );

        let again = dispatch(&engine, &alice, ClientMessage::OpenRound { game: GameType::Aviator, seed_id: None }).await;
        assert!(matches!(again, ServerMessage::Error(ServerError { code: ErrorCode::StateConflict, .. })));

        let foreign = dispatch(&engine, &bob, ClientMessage::CloseRound { round_id }).await;
        assert!(matches!(foreign, ServerMessage::Error(ServerError { code: ErrorCode::InvalidInput, .. })));

        let peek = dispatch(&engine, &bob, ClientMessage::RoundStatus { round_id }).await;
        assert!(matches!(peek, ServerMessage::Error(_)));
    }

    #[tokio::test]
    async fn test_public_queries() {
        let (engine, _) = engine();

        match public_query(&engine, ClientMessage::Ping { timestamp: 7 }).await {
            ServerMessage::Pong { timestamp, server_time } => {
                assert_eq!(timestamp, 7);
                assert_eq!(server_time, START);
            }
            other => panic!("unexpected {:?}", other),
        }

        let seed = "a".repeat(64);
        let verified = public_query(
            &engine,
            ClientMessage::Verify { server_seed: seed.clone(), client_seed: "c".into(), nonce: 1, game: GameType::CardPick },
        )
        .await;
        let expected = engine.read().await.verify_outcome(&seed, "c", 1, GameType::CardPick);
        assert_eq!(verified, ServerMessage::Verified { outcome: expected });

        let crashes = public_query(&engine, ClientMessage::RecentCrashes).await;
        assert_eq!(crashes, ServerMessage::RecentCrashes { crashes: Vec::new() });
    }

    #[tokio::test]
    async fn test_events_flushed_to_owner() {
        let (engine, _) = engine();
        let sessions = SessionManager::new();
        let alice = player("0xalice");
        let (tx, mut rx) = mpsc::channel(16);
        sessions.register(alice.clone(), SocketAddr::from(([127, 0, 0, 1], 9000)), tx).await;

        dispatch(&engine, &alice, ClientMessage::OpenRound { game: GameType::CoinFlip, seed_id: None }).await;
        flush_events(&engine, &sessions).await;

        match rx.recv().await {
            Some(ServerMessage::RoundEvent(event)) => assert_eq!(event.player_id, alice),
            other => panic!("unexpected {:?}", other),
        }
        assert!(engine.write().await.take_events().is_empty());
    }
}
