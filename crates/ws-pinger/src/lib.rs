//! # ws-pinger
//!
//! Keepalive engine for persistent duplex connections with websocket
//! ping/pong semantics.
//!
//! - [`PingPongPlayer`] is the per-connection state machine: it sends tagged
//!   pings, matches pongs against the tag, reports round-trip times and
//!   force-closes its connection once too many pongs time out.
//! - [`PingerService`] owns a concurrent registry of players and pings every
//!   one of them on a fixed interval from a single tokio task.
//! - [`HashFunction`] produces the tag that lets a player recognise its own
//!   pongs without remembering outstanding pings.
//!
//! The host connection is abstracted by the [`Connection`] trait.
//!
//! ```rust,ignore
//! let service = PingerService::new(PingerConfig::default())?;
//! service.add_connection(conn.clone(), Some(rtt_reporter(|conn, rtt| {
//!     tracing::info!(connection_id = %conn.id(), ?rtt, "rtt");
//! })))?;
//! // ...
//! for conn in service.stop().await? {
//!     let _ = conn.send_close(CloseCode::GoingAway, "shutting down");
//! }
//! ```

pub mod config;
pub mod core;
pub mod errors;
pub mod player;
pub mod service;
pub mod types;

pub use config::{FailureLimit, HashKind, PingerConfig};
pub use crate::core::conn::{Connection, PongListener};
pub use crate::core::hash::{HashFunction, Sha256Hash, Sha512Hash};
pub use crate::core::payload::PingPayload;
pub use errors::{PingerError, Result, TransportError};
pub use player::{rtt_reporter, PingOutcome, PingPongPlayer, PongVerdict, RttReporter};
pub use service::{PingerService, SchedulerStats, TickReport};
pub use types::{CloseCode, ConnectionId};
