use thiserror::Error;

use crate::types::ConnectionId;

/// Result type alias for pinger operations
pub type Result<T> = std::result::Result<T, PingerError>;

/// Failures reported by a [`Connection`](crate::Connection) when a frame could not be enqueued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
	#[error("connection closed")]
	Closed,

	#[error("outbound buffer full")]
	Backpressure,

	#[error("io error: {0}")]
	Io(String),
}

impl From<std::io::Error> for TransportError {
	fn from(e: std::io::Error) -> Self {
		Self::Io(e.to_string())
	}
}

#[derive(Error, Debug, Clone)]
pub enum PingerError {
	/// The service was stopped; it never runs again.
	#[error("pinger service stopped")]
	Stopped,

	#[error("no tokio runtime available to drive the pinger")]
	NoRuntime,

	#[error("invalid pinger configuration: {0}")]
	InvalidConfig(String),

	#[error("failed to send keepalive frame to connection {connection_id}: {source}")]
	Transport {
		connection_id: ConnectionId,
		#[source]
		source: TransportError,
	},
}

impl PingerError {
	pub(crate) fn transport(connection_id: ConnectionId, source: TransportError) -> Self {
		Self::Transport { connection_id, source }
	}

	/// Whether the failure belongs to a single connection rather than the service.
	#[must_use]
	pub const fn is_transport(&self) -> bool {
		matches!(self, Self::Transport { .. })
	}
}
