use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic nanoseconds since the first call in this process.
///
/// Timestamps only ever round-trip through our own pongs, so they need to be
/// comparable within the process and nothing more.
pub fn monotonic_nanos() -> u64 {
	let epoch = EPOCH.get_or_init(Instant::now);
	u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[test]
	fn test_monotonic_nanos_advances() {
		let before = monotonic_nanos();
		std::thread::sleep(Duration::from_millis(2));
		let after = monotonic_nanos();
		assert!(after >= before + 2_000_000);
	}
}
