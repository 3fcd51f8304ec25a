//! Runs a pinger against a handful of in-process connections whose peers
//! answer pings after a random delay, one of them never answering.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p ws-pinger --example loopback -- --interval 1 --failure-limit 2
//! ```

use bytes::Bytes;
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};
use ws_pinger::{rtt_reporter, CloseCode, Connection, ConnectionId, PingerConfig, PingerService, PongListener, TransportError};

struct SimulatedConnection {
	id: ConnectionId,
	outbound: mpsc::UnboundedSender<Bytes>,
	listener: Arc<Mutex<Option<PongListener>>>,
	closed: AtomicBool,
}

impl SimulatedConnection {
	fn spawn(max_delay: Duration, silent: bool) -> Arc<Self> {
		let (outbound, mut inbound) = mpsc::unbounded_channel::<Bytes>();
		let listener: Arc<Mutex<Option<PongListener>>> = Arc::new(Mutex::new(None));

		let peer_listener = listener.clone();
		tokio::spawn(async move {
			while let Some(ping) = inbound.recv().await {
				if silent {
					continue;
				}
				let delay = max_delay.mul_f64(rand::random::<f64>());
				let listener = peer_listener.clone();
				tokio::spawn(async move {
					tokio::time::sleep(delay).await;
					let listener = listener.lock().ok().and_then(|guard| guard.clone());
					if let Some(listener) = listener {
						listener(&ping);
					}
				});
			}
		});

		Arc::new(Self {
			id: ConnectionId::new(),
			outbound,
			listener,
			closed: AtomicBool::new(false),
		})
	}
}

impl Connection for SimulatedConnection {
	fn id(&self) -> ConnectionId {
		self.id
	}

	fn send_ping(&self, payload: Bytes) -> Result<(), TransportError> {
		if self.closed.load(Ordering::SeqCst) {
			return Err(TransportError::Closed);
		}
		self.outbound.send(payload).map_err(|_| TransportError::Closed)
	}

	fn send_pong(&self, _payload: Bytes) -> Result<(), TransportError> {
		Ok(())
	}

	fn send_close(&self, code: CloseCode, reason: &str) -> Result<(), TransportError> {
		warn!(connection_id = %self.id, %code, reason, "Connection closed");
		self.closed.store(true, Ordering::SeqCst);
		Ok(())
	}

	fn set_pong_listener(&self, listener: PongListener) {
		if let Ok(mut guard) = self.listener.lock() {
			*guard = Some(listener);
		}
	}

	fn remove_pong_listener(&self) {
		if let Ok(mut guard) = self.listener.lock() {
			*guard = None;
		}
	}

	fn is_open(&self) -> bool {
		!self.closed.load(Ordering::SeqCst)
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.with_target(false)
		.init();

	let config = PingerConfig::parse();
	let interval = config.interval;
	let service = PingerService::new(config)?;

	for i in 0..4 {
		let conn = SimulatedConnection::spawn(Duration::from_millis(200), i == 3);
		service.add_connection(
			conn,
			Some(rtt_reporter(|conn: &SimulatedConnection, rtt| {
				info!(connection_id = %conn.id(), ?rtt, "Pong received");
			})),
		)?;
	}

	tokio::time::sleep(interval * 6).await;

	let stats = service.stats();
	info!(?stats, "Stopping pinger");
	for conn in service.stop().await? {
		if conn.is_open() {
			conn.send_close(CloseCode::GoingAway, "demo finished")?;
		}
	}

	Ok(())
}
