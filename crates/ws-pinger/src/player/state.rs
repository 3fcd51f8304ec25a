use std::time::Duration;

use super::outcome::PongVerdict;
use crate::config::FailureLimit;
use crate::core::payload::PingPayload;

/// What the player should put on the wire after a ping was prepared under lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PingDecision {
	Send(PingPayload),
	Close { failure_count: u32 },
	Terminated,
}

/// Lock-guarded mutable state of one player.
#[derive(Debug, Clone, Default)]
pub(crate) struct PlayerState {
	pub ping_sequence: u64,
	pub last_pong_sequence: u64,
	pub last_ping_sent_at_nanos: u64,
	pub failure_count: u32,
	pub closed_by_policy: bool,
}

impl PlayerState {
	pub const fn is_awaiting_pong(&self) -> bool {
		self.last_pong_sequence < self.ping_sequence
	}

	/// Account for a timed-out previous ping, then either allocate the next ping or close.
	pub fn prepare_ping(&mut self, now_nanos: u64, pong_timeout: Duration, limit: FailureLimit) -> PingDecision {
		if self.closed_by_policy {
			return PingDecision::Terminated;
		}

		let elapsed = Duration::from_nanos(now_nanos.saturating_sub(self.last_ping_sent_at_nanos));
		if self.is_awaiting_pong() && elapsed > pong_timeout {
			self.failure_count = self.failure_count.saturating_add(1);
			if limit.is_exceeded_by(self.failure_count) {
				self.closed_by_policy = true;
				return PingDecision::Close {
					failure_count: self.failure_count,
				};
			}
		}

		self.ping_sequence += 1;
		self.last_ping_sent_at_nanos = now_nanos;
		PingDecision::Send(PingPayload::new(self.ping_sequence, now_nanos))
	}

	/// Classify a pong whose digest was already verified.
	pub fn accept_pong(&mut self, payload: PingPayload, now_nanos: u64) -> PongVerdict {
		if self.closed_by_policy {
			return PongVerdict::Terminated;
		}

		let sequence = payload.sequence;
		if sequence <= self.last_pong_sequence {
			return PongVerdict::Stale { sequence };
		}
		if sequence != self.ping_sequence {
			return PongVerdict::Superseded { sequence };
		}

		self.last_pong_sequence = sequence;
		self.failure_count = 0;
		PongVerdict::Matched {
			sequence,
			rtt: Duration::from_nanos(now_nanos.saturating_sub(payload.timestamp_nanos)),
		}
	}
}
