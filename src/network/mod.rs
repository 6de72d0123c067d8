//! Network Layer
//!
//! WebSocket server binding the engine to browser clients.
//! This layer owns no game rules; every decision runs through `engine`.

pub mod auth;
pub mod protocol;
pub mod session;
pub mod server;

pub use auth::{authenticate, validate_token, AuthConfig, AuthError, TokenClaims};
pub use protocol::{AuthRequest, AuthResult, ClientMessage, ErrorCode, ServerError, ServerMessage};
pub use session::SessionManager;
pub use server::{dispatch, ServerConfig, WagerServer, WagerServerError};
