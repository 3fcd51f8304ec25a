use sha2::{Digest, Sha256, Sha512};
use std::fmt::Debug;

/// Stateless digest over a player's identity and the metadata of one ping.
///
/// Implementations must be deterministic and return exactly
/// [`digest_len`](HashFunction::digest_len) bytes.
pub trait HashFunction: Send + Sync + Debug {
	fn digest_len(&self) -> usize;

	fn digest(&self, identity: &[u8], sequence: u64, timestamp_nanos: u64) -> Vec<u8>;
}

/// SHA-256 tag, 32 bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hash;

impl HashFunction for Sha256Hash {
	fn digest_len(&self) -> usize {
		32
	}

	fn digest(&self, identity: &[u8], sequence: u64, timestamp_nanos: u64) -> Vec<u8> {
		let mut hasher = Sha256::new();
		hasher.update(identity);
		hasher.update(sequence.to_be_bytes());
		hasher.update(timestamp_nanos.to_be_bytes());
		hasher.finalize().to_vec()
	}
}

/// SHA-512 tag, 64 bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha512Hash;

impl HashFunction for Sha512Hash {
	fn digest_len(&self) -> usize {
		64
	}

	fn digest(&self, identity: &[u8], sequence: u64, timestamp_nanos: u64) -> Vec<u8> {
		let mut hasher = Sha512::new();
		hasher.update(identity);
		hasher.update(sequence.to_be_bytes());
		hasher.update(timestamp_nanos.to_be_bytes());
		hasher.finalize().to_vec()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_digest_len_matches_output() {
		assert_eq!(Sha256Hash.digest(b"id", 1, 2).len(), Sha256Hash.digest_len());
		assert_eq!(Sha512Hash.digest(b"id", 1, 2).len(), Sha512Hash.digest_len());
	}

	#[test]
	fn test_digest_is_deterministic() {
		assert_eq!(Sha256Hash.digest(b"player", 7, 99), Sha256Hash.digest(b"player", 7, 99));
	}

	#[test]
	fn test_digest_depends_on_every_input() {
		let base = Sha256Hash.digest(b"player", 7, 99);
		assert_ne!(base, Sha256Hash.digest(b"other", 7, 99));
		assert_ne!(base, Sha256Hash.digest(b"player", 8, 99));
		assert_ne!(base, Sha256Hash.digest(b"player", 7, 100));
	}
}
