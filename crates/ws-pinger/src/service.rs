mod registry;
mod scheduler;

pub use scheduler::{SchedulerStats, TickReport};

use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::PingerConfig;
use crate::core::{conn::Connection, hash::HashFunction};
use crate::errors::{PingerError, Result};
use crate::player::{PingPongPlayer, RttReporter};
use scheduler::Shared;

/// Pings every registered connection once per interval.
///
/// Registration and removal may happen from any thread while a tick is in
/// flight; a tick never blocks them and never waits on a slow connection.
/// The service is one-way: once [`stop`](Self::stop) returns it is terminal.
pub struct PingerService<C: Connection> {
	shared: Arc<Shared<C>>,
	config: PingerConfig,
	hash: Arc<dyn HashFunction>,
	// held for reading by add_connection and for writing by stop, never by ticks
	running: RwLock<bool>,
	cancel_token: CancellationToken,
	scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Connection> PingerService<C> {
	/// Create the service and start ticking on the current tokio runtime.
	pub fn new(config: PingerConfig) -> Result<Self> {
		let hash = config.hash.build();
		Self::with_hash_function(config, hash)
	}

	pub fn with_hash_function(config: PingerConfig, hash: Arc<dyn HashFunction>) -> Result<Self> {
		config.validate()?;
		let runtime = Handle::try_current().map_err(|_| PingerError::NoRuntime)?;

		let shared = Arc::new(Shared::new());
		let cancel_token = CancellationToken::new();
		let task = runtime.spawn(scheduler::run(shared.clone(), config.interval, cancel_token.clone()));

		info!(
			interval = ?config.interval,
			pong_timeout = ?config.pong_timeout(),
			failure_limit = ?config.failure_limit,
			keep_alive_only = config.keep_alive_only,
			"Pinger service started"
		);

		Ok(Self {
			shared,
			config,
			hash,
			running: RwLock::new(true),
			cancel_token,
			scheduler: Mutex::new(Some(task)),
		})
	}

	/// Register `connection` and take over its pong listener.
	///
	/// Returns `Ok(false)` without replacing anything if the connection is
	/// already registered, and [`PingerError::Stopped`] after [`stop`](Self::stop).
	pub fn add_connection(&self, connection: Arc<C>, rtt_reporter: Option<RttReporter<C>>) -> Result<bool> {
		let running = self.running.read().unwrap_or_else(PoisonError::into_inner);
		if !*running {
			return Err(PingerError::Stopped);
		}

		let id = connection.id();
		let added = self
			.shared
			.registry
			.insert_with(id, || Arc::new(PingPongPlayer::from_config(connection, &self.config, self.hash.clone(), rtt_reporter)));

		if added {
			debug!(connection_id = %id, "Connection registered for keepalive");
		}
		Ok(added)
	}

	/// Unregister `connection` and detach its pong listener. Returns whether it was registered.
	pub fn remove_connection(&self, connection: &C) -> bool {
		let id = connection.id();
		if self.shared.registry.remove(&id).is_none() {
			return false;
		}
		debug!(connection_id = %id, "Connection unregistered from keepalive");
		true
	}

	#[must_use]
	pub fn contains_connection(&self, connection: &C) -> bool {
		self.shared.registry.contains(&connection.id())
	}

	#[must_use]
	pub fn number_of_connections(&self) -> usize {
		self.shared.registry.len()
	}

	/// The player driving `connection`, if registered.
	#[must_use]
	pub fn player(&self, connection: &C) -> Option<Arc<PingPongPlayer<C>>> {
		self.shared.registry.get(&connection.id())
	}

	/// Run one sweep immediately, outside the regular schedule.
	pub fn tick(&self) -> Result<TickReport> {
		if !self.is_running() {
			return Err(PingerError::Stopped);
		}
		Ok(scheduler::sweep(&self.shared))
	}

	#[must_use]
	pub fn stats(&self) -> SchedulerStats {
		self.shared.counters.snapshot()
	}

	#[must_use]
	pub const fn config(&self) -> &PingerConfig {
		&self.config
	}

	#[must_use]
	pub fn is_running(&self) -> bool {
		*self.running.read().unwrap_or_else(PoisonError::into_inner)
	}

	/// Stop ticking and hand back every connection still registered.
	///
	/// Waits for a tick already in progress to finish; no tick starts after
	/// this returns. Listeners are detached but the connections are left open,
	/// closing them is up to the caller.
	pub async fn stop(&self) -> Result<Vec<Arc<C>>> {
		{
			let mut running = self.running.write().unwrap_or_else(PoisonError::into_inner);
			if !*running {
				return Err(PingerError::Stopped);
			}
			*running = false;
		}

		self.cancel_token.cancel();
		if let Some(handle) = self.scheduler.lock().await.take() {
			if let Err(e) = handle.await {
				error!("Pinger scheduler task failed: {}", e);
			}
		}

		let connections: Vec<Arc<C>> = self
			.shared
			.registry
			.drain()
			.into_iter()
			.map(|player| player.connection().clone())
			.collect();

		info!(remaining = connections.len(), "Pinger service stopped");
		Ok(connections)
	}
}

impl<C: Connection> Drop for PingerService<C> {
	fn drop(&mut self) {
		self.cancel_token.cancel();
	}
}
