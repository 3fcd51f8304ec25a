use bytes::Bytes;
use std::sync::Arc;

use crate::errors::TransportError;
use crate::types::{CloseCode, ConnectionId};

/// Callback the host connection invokes for every inbound pong frame.
pub type PongListener = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Capabilities the pinger needs from a host connection.
///
/// All send methods are enqueue operations: they must not wait for the
/// frame to reach the wire. The pinger calls them from its scheduler task
/// and never while holding a player's lock.
pub trait Connection: Send + Sync + 'static {
	/// Stable identity of the connection, used as the registry key.
	fn id(&self) -> ConnectionId;

	fn send_ping(&self, payload: Bytes) -> Result<(), TransportError>;

	fn send_pong(&self, payload: Bytes) -> Result<(), TransportError>;

	fn send_close(&self, code: CloseCode, reason: &str) -> Result<(), TransportError>;

	/// Install the handler for inbound pongs, replacing any previous one.
	///
	/// Called while the service's registry entry for this connection is
	/// locked. The host must not call back into the service from here. It may
	/// invoke `listener` synchronously: a freshly installed player has no ping
	/// outstanding, so nothing can match and the RTT reporter is not called.
	fn set_pong_listener(&self, listener: PongListener);

	/// Drop the pong handler. Same locking constraint as [`set_pong_listener`](Self::set_pong_listener).
	fn remove_pong_listener(&self);

	fn is_open(&self) -> bool;
}
