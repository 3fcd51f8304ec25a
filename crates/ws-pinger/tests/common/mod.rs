#![allow(dead_code)]

use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc, Mutex};
use tokio::sync::mpsc;
use ws_pinger::{CloseCode, Connection, ConnectionId, PongListener, TransportError};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).with_test_writer().try_init();
}

/// Connection that records outbound frames; pongs are delivered by the test.
#[derive(Default)]
pub struct MockConnection {
	id: ConnectionId,
	pub pings: Mutex<Vec<Bytes>>,
	pub pongs: Mutex<Vec<Bytes>>,
	pub closes: Mutex<Vec<(CloseCode, String)>>,
	listener: Mutex<Option<PongListener>>,
	pub fail_sends: AtomicBool,
	pub fail_closes: AtomicBool,
	/// Delivered to the listener from inside `set_pong_listener`, once.
	pub replay_on_install: Mutex<Option<Bytes>>,
	removal_gate: Mutex<Option<(std_mpsc::Sender<()>, std_mpsc::Receiver<()>)>>,
}

impl MockConnection {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn ping_count(&self) -> usize {
		self.pings.lock().unwrap().len()
	}

	pub fn last_ping(&self) -> Option<Bytes> {
		self.pings.lock().unwrap().last().cloned()
	}

	pub fn close_codes(&self) -> Vec<CloseCode> {
		self.closes.lock().unwrap().iter().map(|(code, _)| *code).collect()
	}

	pub fn has_listener(&self) -> bool {
		self.listener.lock().unwrap().is_some()
	}

	/// Hand a pong to whatever listener is installed, as the host's read loop would.
	pub fn deliver_pong(&self, payload: &[u8]) -> bool {
		let listener = self.listener.lock().unwrap().clone();
		listener.map(|listener| listener(payload)).is_some()
	}

	/// Echo the most recent ping back as a pong.
	pub fn echo_last_ping(&self) -> bool {
		self.last_ping().is_some_and(|ping| self.deliver_pong(&ping))
	}

	/// Make the next `remove_pong_listener` signal the first returned channel,
	/// then block until the second one is sent to.
	pub fn gate_next_listener_removal(&self) -> (std_mpsc::Receiver<()>, std_mpsc::Sender<()>) {
		let (entered_tx, entered_rx) = std_mpsc::channel();
		let (release_tx, release_rx) = std_mpsc::channel();
		*self.removal_gate.lock().unwrap() = Some((entered_tx, release_rx));
		(entered_rx, release_tx)
	}
}

impl Connection for MockConnection {
	fn id(&self) -> ConnectionId {
		self.id
	}

	fn send_ping(&self, payload: Bytes) -> Result<(), TransportError> {
		if self.fail_sends.load(Ordering::SeqCst) {
			return Err(TransportError::Backpressure);
		}
		self.pings.lock().unwrap().push(payload);
		Ok(())
	}

	fn send_pong(&self, payload: Bytes) -> Result<(), TransportError> {
		self.pongs.lock().unwrap().push(payload);
		Ok(())
	}

	fn send_close(&self, code: CloseCode, reason: &str) -> Result<(), TransportError> {
		if self.fail_closes.load(Ordering::SeqCst) {
			return Err(TransportError::Closed);
		}
		self.closes.lock().unwrap().push((code, reason.to_string()));
		Ok(())
	}

	fn set_pong_listener(&self, listener: PongListener) {
		*self.listener.lock().unwrap() = Some(listener.clone());
		let replay = self.replay_on_install.lock().unwrap().take();
		if let Some(payload) = replay {
			listener(&payload);
		}
	}

	fn remove_pong_listener(&self) {
		let gate = self.removal_gate.lock().unwrap().take();
		if let Some((entered, release)) = gate {
			let _ = entered.send(());
			let _ = release.recv();
		}
		*self.listener.lock().unwrap() = None;
	}

	fn is_open(&self) -> bool {
		self.closes.lock().unwrap().is_empty()
	}
}

/// Connection whose remote peer runs on its own task and answers every ping with a pong.
pub struct LoopbackConnection {
	id: ConnectionId,
	outbound: mpsc::UnboundedSender<Bytes>,
	listener: Arc<Mutex<Option<PongListener>>>,
	echo: Arc<AtomicBool>,
	closed: AtomicBool,
}

impl LoopbackConnection {
	/// Must be called inside a tokio runtime.
	pub fn spawn() -> Arc<Self> {
		let (outbound, mut inbound) = mpsc::unbounded_channel::<Bytes>();
		let listener: Arc<Mutex<Option<PongListener>>> = Arc::new(Mutex::new(None));
		let echo = Arc::new(AtomicBool::new(true));

		let peer_listener = listener.clone();
		let peer_echo = echo.clone();
		tokio::spawn(async move {
			while let Some(ping) = inbound.recv().await {
				if !peer_echo.load(Ordering::SeqCst) {
					continue;
				}
				let listener = peer_listener.lock().unwrap().clone();
				if let Some(listener) = listener {
					listener(&ping);
				}
			}
		});

		Arc::new(Self {
			id: ConnectionId::new(),
			outbound,
			listener,
			echo,
			closed: AtomicBool::new(false),
		})
	}

	pub fn set_echo(&self, echo: bool) {
		self.echo.store(echo, Ordering::SeqCst);
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}
}

impl Connection for LoopbackConnection {
	fn id(&self) -> ConnectionId {
		self.id
	}

	fn send_ping(&self, payload: Bytes) -> Result<(), TransportError> {
		if self.is_closed() {
			return Err(TransportError::Closed);
		}
		self.outbound.send(payload).map_err(|_| TransportError::Closed)
	}

	fn send_pong(&self, _payload: Bytes) -> Result<(), TransportError> {
		if self.is_closed() {
			return Err(TransportError::Closed);
		}
		Ok(())
	}

	fn send_close(&self, _code: CloseCode, _reason: &str) -> Result<(), TransportError> {
		self.closed.store(true, Ordering::SeqCst);
		Ok(())
	}

	fn set_pong_listener(&self, listener: PongListener) {
		*self.listener.lock().unwrap() = Some(listener);
	}

	fn remove_pong_listener(&self) {
		*self.listener.lock().unwrap() = None;
	}

	fn is_open(&self) -> bool {
		!self.is_closed()
	}
}
