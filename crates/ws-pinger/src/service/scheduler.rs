use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{interval_at, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::PlayerRegistry;
use crate::core::conn::Connection;
use crate::errors::PingerError;
use crate::player::PingOutcome;

/// State shared between the service handle and its scheduler task.
pub(crate) struct Shared<C: Connection> {
	pub registry: PlayerRegistry<C>,
	pub counters: SchedulerCounters,
}

impl<C: Connection> Shared<C> {
	pub fn new() -> Self {
		Self {
			registry: PlayerRegistry::new(),
			counters: SchedulerCounters::default(),
		}
	}
}

#[derive(Debug, Default)]
pub(crate) struct SchedulerCounters {
	ticks: AtomicU64,
	pings_sent: AtomicU64,
	keep_alives_sent: AtomicU64,
	transport_errors: AtomicU64,
	policy_closures: AtomicU64,
}

impl SchedulerCounters {
	pub fn snapshot(&self) -> SchedulerStats {
		SchedulerStats {
			ticks_completed: self.ticks.load(Ordering::Relaxed),
			pings_sent: self.pings_sent.load(Ordering::Relaxed),
			keep_alives_sent: self.keep_alives_sent.load(Ordering::Relaxed),
			transport_errors: self.transport_errors.load(Ordering::Relaxed),
			policy_closures: self.policy_closures.load(Ordering::Relaxed),
		}
	}
}

/// Cumulative counters since the service started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
	pub ticks_completed: u64,
	pub pings_sent: u64,
	pub keep_alives_sent: u64,
	pub transport_errors: u64,
	pub policy_closures: u64,
}

/// What one sweep over the registry did
#[derive(Debug, Default)]
pub struct TickReport {
	pub pings_sent: usize,
	pub keep_alives_sent: usize,
	/// Connections that reported themselves closed and were not pinged.
	pub skipped_closed: usize,
	pub closed_by_policy: usize,
	pub errors: Vec<PingerError>,
	pub duration: Duration,
}

/// Ask every registered player to ping.
///
/// Works on a snapshot: connections added during the sweep wait for the next
/// tick, connections removed during it may still get one harmless ping.
pub(crate) fn sweep<C: Connection>(shared: &Shared<C>) -> TickReport {
	let started = Instant::now();
	let mut report = TickReport::default();

	for player in shared.registry.snapshot() {
		if !player.connection().is_open() {
			report.skipped_closed += 1;
			continue;
		}

		match player.send_ping() {
			Ok(PingOutcome::Sent { .. }) => report.pings_sent += 1,
			Ok(PingOutcome::KeepAlive) => report.keep_alives_sent += 1,
			Ok(PingOutcome::ClosedByPolicy { close_error, .. }) => {
				report.closed_by_policy += 1;
				if let Some(e) = close_error {
					warn!(connection_id = %player.connection_id(), error = %e, "Failed to send policy close frame");
					report.errors.push(PingerError::transport(player.connection_id(), e));
				}
			}
			Ok(PingOutcome::Terminated) => {}
			Err(e) => {
				warn!(connection_id = %player.connection_id(), error = %e, "Failed to send keepalive frame");
				report.errors.push(e);
			}
		}
	}

	report.duration = started.elapsed();

	let counters = &shared.counters;
	counters.ticks.fetch_add(1, Ordering::Relaxed);
	counters.pings_sent.fetch_add(report.pings_sent as u64, Ordering::Relaxed);
	counters.keep_alives_sent.fetch_add(report.keep_alives_sent as u64, Ordering::Relaxed);
	counters.transport_errors.fetch_add(report.errors.len() as u64, Ordering::Relaxed);
	counters.policy_closures.fetch_add(report.closed_by_policy as u64, Ordering::Relaxed);

	report
}

/// Tick every `period` until `cancel_token` fires. The first tick happens one period after start.
pub(crate) async fn run<C: Connection>(shared: Arc<Shared<C>>, period: Duration, cancel_token: CancellationToken) {
	let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	info!("Pinger scheduler starting with {:?} interval", period);

	loop {
		tokio::select! {
			biased;
			() = cancel_token.cancelled() => {
				info!("Pinger scheduler received shutdown signal");
				break;
			}
			_ = ticker.tick() => {
				let report = sweep(&shared);
				debug!(
					pings = report.pings_sent,
					keep_alives = report.keep_alives_sent,
					skipped = report.skipped_closed,
					closed = report.closed_by_policy,
					errors = report.errors.len(),
					duration = ?report.duration,
					"Keepalive tick complete"
				);

				let ticks = shared.counters.ticks.load(Ordering::Relaxed);
				if ticks % 100 == 0 {
					info!(connections = shared.registry.len(), "Pinger completed {} ticks", ticks);
				}
			}
		}
	}

	let stats = shared.counters.snapshot();
	info!(
		ticks = stats.ticks_completed,
		pings = stats.pings_sent,
		keep_alives = stats.keep_alives_sent,
		errors = stats.transport_errors,
		policy_closures = stats.policy_closures,
		"Pinger scheduler shutting down"
	);
}
