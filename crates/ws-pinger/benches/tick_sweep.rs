use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use ws_pinger::{CloseCode, Connection, ConnectionId, PingerConfig, PingerService, PongListener, TransportError};

/// Connection that accepts and discards every frame
struct NullConnection {
	id: ConnectionId,
}

impl Connection for NullConnection {
	fn id(&self) -> ConnectionId {
		self.id
	}

	fn send_ping(&self, payload: Bytes) -> Result<(), TransportError> {
		black_box(payload);
		Ok(())
	}

	fn send_pong(&self, payload: Bytes) -> Result<(), TransportError> {
		black_box(payload);
		Ok(())
	}

	fn send_close(&self, _code: CloseCode, _reason: &str) -> Result<(), TransportError> {
		Ok(())
	}

	fn set_pong_listener(&self, _listener: PongListener) {}

	fn remove_pong_listener(&self) {}

	fn is_open(&self) -> bool {
		true
	}
}

fn null_connection() -> Arc<NullConnection> {
	Arc::new(NullConnection { id: ConnectionId::new() })
}

// One sweep over a registry of growing size
fn bench_tick(c: &mut Criterion) {
	let mut group = c.benchmark_group("tick_sweep");

	for connections in [10, 100, 1_000, 10_000].iter() {
		group.throughput(Throughput::Elements(*connections as u64));
		group.bench_with_input(BenchmarkId::from_parameter(connections), connections, |b, &num_conns| {
			let rt = Runtime::new().unwrap();
			let _guard = rt.enter();
			let service = PingerService::new(PingerConfig::new(Duration::from_secs(3600)).with_pong_timeout(Duration::from_secs(3600))).unwrap();
			for _ in 0..num_conns {
				service.add_connection(null_connection(), None).unwrap();
			}

			b.iter(|| black_box(service.tick().unwrap()));
		});
	}
	group.finish();
}

// Registration churn while the scheduler ticks every millisecond
fn bench_churn_during_ticks(c: &mut Criterion) {
	let mut group = c.benchmark_group("churn_during_ticks");

	for preloaded in [100, 1_000, 10_000].iter() {
		group.bench_with_input(BenchmarkId::from_parameter(preloaded), preloaded, |b, &num_preloaded| {
			let rt = Runtime::new().unwrap();
			let _guard = rt.enter();
			let service = PingerService::new(PingerConfig::new(Duration::from_millis(1))).unwrap();
			for _ in 0..num_preloaded {
				service.add_connection(null_connection(), None).unwrap();
			}

			b.iter(|| {
				let conn = null_connection();
				service.add_connection(conn.clone(), None).unwrap();
				black_box(service.remove_connection(&conn));
			});
		});
	}
	group.finish();
}

criterion_group!(benches, bench_tick, bench_churn_during_ticks);
criterion_main!(benches);
