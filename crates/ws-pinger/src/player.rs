pub mod outcome;
pub(crate) mod state;

pub use outcome::{rtt_reporter, PingOutcome, PongVerdict, RttReporter};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::config::{FailureLimit, PingerConfig};
use crate::core::{clock::monotonic_nanos, conn::Connection, hash::HashFunction, payload::PingPayload};
use crate::errors::{PingerError, Result};
use crate::types::{CloseCode, ConnectionId};
use state::{PingDecision, PlayerState};

const SALT_LEN: usize = 32;
const POLICY_CLOSE_REASON: &str = "keepalive failure limit exceeded";

/// Per-connection keepalive state machine.
///
/// `send_ping` and `on_pong` may be called concurrently from any thread; both
/// are serialized by the player's own lock, which is never held across a
/// send on the connection or a call to the RTT reporter.
pub struct PingPongPlayer<C: Connection> {
	connection: Arc<C>,
	connection_id: ConnectionId,
	// connection id followed by a random salt, the part of the tag a peer cannot guess
	identity: Box<[u8]>,
	pong_timeout: Duration,
	failure_limit: FailureLimit,
	keep_alive_only: bool,
	rtt_reporter: Option<RttReporter<C>>,
	hash: Arc<dyn HashFunction>,
	state: Mutex<PlayerState>,
}

impl<C: Connection> PingPongPlayer<C> {
	#[must_use]
	pub fn new(connection: Arc<C>, pong_timeout: Duration, failure_limit: FailureLimit, hash: Arc<dyn HashFunction>, rtt_reporter: Option<RttReporter<C>>) -> Self {
		let connection_id = connection.id();
		let salt: [u8; SALT_LEN] = rand::random();
		let mut identity = Vec::with_capacity(16 + SALT_LEN);
		identity.extend_from_slice(connection_id.as_bytes());
		identity.extend_from_slice(&salt);

		Self {
			connection,
			connection_id,
			identity: identity.into_boxed_slice(),
			pong_timeout,
			failure_limit,
			keep_alive_only: false,
			rtt_reporter,
			hash,
			state: Mutex::new(PlayerState::default()),
		}
	}

	/// Build a player with the timeout, limit and mode of a service configuration.
	#[must_use]
	pub fn from_config(connection: Arc<C>, config: &PingerConfig, hash: Arc<dyn HashFunction>, rtt_reporter: Option<RttReporter<C>>) -> Self {
		Self::new(connection, config.pong_timeout(), config.failure_limit, hash, rtt_reporter).with_keep_alive_only(config.keep_alive_only)
	}

	/// Send unsolicited pongs instead of pings; nothing is then awaited and nothing can time out.
	#[must_use]
	pub fn with_keep_alive_only(mut self, keep_alive_only: bool) -> Self {
		self.keep_alive_only = keep_alive_only;
		self
	}

	/// Route the connection's inbound pongs to this player.
	///
	/// The listener holds only a weak reference, so a player dropped from the
	/// registry silently stops matching even if the listener was never removed.
	pub fn install(self: &Arc<Self>) {
		let player: Weak<Self> = Arc::downgrade(self);
		self.connection.set_pong_listener(Arc::new(move |payload: &[u8]| {
			if let Some(player) = player.upgrade() {
				player.on_pong(payload);
			}
		}));
	}

	pub fn detach(&self) {
		self.connection.remove_pong_listener();
	}

	/// Check the previous ping for a timeout, then send the next one.
	///
	/// A transport failure is returned as an error and has no effect on the failure count.
	/// A failed policy close is still a policy close; its error rides in the outcome.
	pub fn send_ping(&self) -> Result<PingOutcome> {
		if self.keep_alive_only {
			return self.send_keep_alive();
		}

		let decision = self.lock_state().prepare_ping(monotonic_nanos(), self.pong_timeout, self.failure_limit);

		match decision {
			PingDecision::Terminated => Ok(PingOutcome::Terminated),
			PingDecision::Close { failure_count } => {
				warn!(connection_id = %self.connection_id, failure_count, "Pong failure limit exceeded, closing connection");
				let close_error = self.connection.send_close(CloseCode::ProtocolError, POLICY_CLOSE_REASON).err();
				Ok(PingOutcome::ClosedByPolicy { failure_count, close_error })
			}
			PingDecision::Send(payload) => {
				trace!(connection_id = %self.connection_id, sequence = payload.sequence, "Sending ping");
				self
					.connection
					.send_ping(payload.encode(&self.identity, self.hash.as_ref()))
					.map_err(|e| PingerError::transport(self.connection_id, e))?;
				Ok(PingOutcome::Sent { sequence: payload.sequence })
			}
		}
	}

	fn send_keep_alive(&self) -> Result<PingOutcome> {
		let sequence = self.lock_state().ping_sequence;
		let payload = PingPayload::new(sequence, monotonic_nanos());
		self
			.connection
			.send_pong(payload.encode(&self.identity, self.hash.as_ref()))
			.map_err(|e| PingerError::transport(self.connection_id, e))?;
		Ok(PingOutcome::KeepAlive)
	}

	/// Evaluate an inbound pong frame. Never fails: anything unrecognised is dropped.
	pub fn on_pong(&self, payload: &[u8]) -> PongVerdict {
		let Some(decoded) = PingPayload::verify(payload, &self.identity, self.hash.as_ref()) else {
			trace!(connection_id = %self.connection_id, len = payload.len(), "Ignoring unverified pong");
			return PongVerdict::Unverified;
		};

		let verdict = self.lock_state().accept_pong(decoded, monotonic_nanos());

		match verdict {
			PongVerdict::Matched { sequence, rtt } => {
				trace!(connection_id = %self.connection_id, sequence, ?rtt, "Pong matched");
				if let Some(report) = &self.rtt_reporter {
					report(self.connection.as_ref(), rtt);
				}
			}
			PongVerdict::Stale { sequence } | PongVerdict::Superseded { sequence } => {
				debug!(connection_id = %self.connection_id, sequence, ?verdict, "Discarding out-of-date pong");
			}
			PongVerdict::Unverified | PongVerdict::Terminated => {}
		}

		verdict
	}

	fn lock_state(&self) -> MutexGuard<'_, PlayerState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	#[must_use]
	pub const fn connection(&self) -> &Arc<C> {
		&self.connection
	}

	#[must_use]
	pub const fn connection_id(&self) -> ConnectionId {
		self.connection_id
	}

	#[must_use]
	pub fn failure_count(&self) -> u32 {
		self.lock_state().failure_count
	}

	#[must_use]
	pub fn ping_sequence(&self) -> u64 {
		self.lock_state().ping_sequence
	}

	#[must_use]
	pub fn last_pong_sequence(&self) -> u64 {
		self.lock_state().last_pong_sequence
	}

	/// Whether the most recent ping is still unmatched.
	#[must_use]
	pub fn is_awaiting_pong(&self) -> bool {
		self.lock_state().is_awaiting_pong()
	}

	#[must_use]
	pub fn is_closed_by_policy(&self) -> bool {
		self.lock_state().closed_by_policy
	}
}
