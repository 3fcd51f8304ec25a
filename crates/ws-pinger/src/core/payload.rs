//! Keepalive frame payload.
//!
//! ```text
//! [0..8)       sequence, u64 big-endian
//! [8..16)      send timestamp in nanoseconds, u64 big-endian
//! [16..16+D)   digest over (identity, sequence, timestamp)
//! ```
//!
//! Only the player that issued a ping ever verifies it, so the layout is not
//! a cross-process protocol; `D` is whatever the player's hash function emits.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::hash::HashFunction;

pub const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPayload {
	pub sequence: u64,
	pub timestamp_nanos: u64,
}

impl PingPayload {
	#[must_use]
	pub const fn new(sequence: u64, timestamp_nanos: u64) -> Self {
		Self { sequence, timestamp_nanos }
	}

	/// Total payload length for a given hash function.
	#[must_use]
	pub fn encoded_len(hash: &dyn HashFunction) -> usize {
		HEADER_LEN + hash.digest_len()
	}

	#[must_use]
	pub fn encode(&self, identity: &[u8], hash: &dyn HashFunction) -> Bytes {
		let digest = hash.digest(identity, self.sequence, self.timestamp_nanos);
		let mut buf = BytesMut::with_capacity(HEADER_LEN + digest.len());
		buf.put_u64(self.sequence);
		buf.put_u64(self.timestamp_nanos);
		buf.put_slice(&digest);
		buf.freeze()
	}

	/// Decode `payload` and check its digest, `None` if it was not produced by `identity`.
	#[must_use]
	pub fn verify(payload: &[u8], identity: &[u8], hash: &dyn HashFunction) -> Option<Self> {
		if payload.len() != Self::encoded_len(hash) {
			return None;
		}

		let (mut header, embedded) = payload.split_at(HEADER_LEN);
		let decoded = Self::new(header.get_u64(), header.get_u64());
		let expected = hash.digest(identity, decoded.sequence, decoded.timestamp_nanos);

		constant_time_eq(&expected, embedded).then_some(decoded)
	}
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
	a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
