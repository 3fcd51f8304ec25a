use std::{sync::Arc, time::Duration};

use crate::errors::TransportError;

/// Callback invoked with the round-trip time of every matched pong.
pub type RttReporter<C> = Arc<dyn Fn(&C, Duration) + Send + Sync>;

/// Wrap a closure as an [`RttReporter`].
pub fn rtt_reporter<C, F>(f: F) -> RttReporter<C>
where
	F: Fn(&C, Duration) + Send + Sync + 'static,
{
	Arc::new(f)
}

/// Result of one [`send_ping`](super::PingPongPlayer::send_ping) call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingOutcome {
	/// A ping carrying this sequence number was enqueued.
	Sent { sequence: u64 },
	/// Keep-alive-only mode: an unsolicited pong was enqueued.
	KeepAlive,
	/// The failure limit was exceeded by this call and the player is now terminal.
	///
	/// `close_error` is set when the close frame itself could not be enqueued.
	ClosedByPolicy { failure_count: u32, close_error: Option<TransportError> },
	/// The player was already closed by policy; nothing was sent.
	Terminated,
}

/// How an inbound pong was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PongVerdict {
	/// Answer to the most recent ping.
	Matched { sequence: u64, rtt: Duration },
	/// Wrong length or digest: not one of ours, e.g. an unsolicited keep-alive pong from the peer.
	Unverified,
	/// Already matched or older than the last match.
	Stale { sequence: u64 },
	/// Answer to a ping that a newer ping has replaced.
	Superseded { sequence: u64 },
	/// The player was closed by policy and ignores pongs.
	Terminated,
}

impl PongVerdict {
	#[must_use]
	pub const fn is_match(&self) -> bool {
		matches!(self, Self::Matched { .. })
	}
}
