/// Content Service Library
///
/// Feed reads, content mutations and the realtime viewer channel for the
/// Pulse social platform. Profiles and identities live in other services and
/// are reached through `clients`.
///
/// # Modules
///
/// - `handlers`: HTTP and WebSocket request handlers
/// - `models`: Content documents and enriched read models
/// - `services`: Feed aggregation, mutations, profile resolution
/// - `db`: Content store trait and its PostgreSQL / in-memory adapters
/// - `clients`: Identity and profile collaborators
/// - `realtime`: Domain events, event hub, viewer sessions
/// - `middleware`: Identity authentication
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod clients;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
