use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

use crate::core::hash::{HashFunction, Sha256Hash, Sha512Hash};
use crate::errors::{PingerError, Result};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(55);
pub const DEFAULT_FAILURE_LIMIT: u32 = 4;

/// How many consecutive timed-out pongs a player tolerates before closing its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum FailureLimit {
	/// Never close the connection, however many pongs time out.
	Unlimited,
	/// Close once the failure count exceeds this value.
	Limited(u32),
}

impl FailureLimit {
	/// `-1` means unlimited, any other negative value is rejected.
	pub fn from_i64(limit: i64) -> Result<Self> {
		match limit {
			-1 => Ok(Self::Unlimited),
			n => u32::try_from(n).map(Self::Limited).map_err(|_| PingerError::InvalidConfig(format!("failure limit must be -1 or between 0 and {}, got {n}", u32::MAX))),
		}
	}

	/// Whether `failure_count` is past what this limit tolerates.
	#[must_use]
	pub const fn is_exceeded_by(self, failure_count: u32) -> bool {
		match self {
			Self::Unlimited => false,
			Self::Limited(limit) => failure_count > limit,
		}
	}
}

impl Default for FailureLimit {
	fn default() -> Self {
		Self::Limited(DEFAULT_FAILURE_LIMIT)
	}
}

impl TryFrom<i64> for FailureLimit {
	type Error = PingerError;

	fn try_from(limit: i64) -> Result<Self> {
		Self::from_i64(limit)
	}
}

impl From<FailureLimit> for i64 {
	fn from(limit: FailureLimit) -> Self {
		match limit {
			FailureLimit::Unlimited => -1,
			FailureLimit::Limited(n) => Self::from(n),
		}
	}
}

/// Digest used to tag pings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashKind {
	#[default]
	Sha256,
	Sha512,
}

impl HashKind {
	#[must_use]
	pub fn build(self) -> Arc<dyn HashFunction> {
		match self {
			Self::Sha256 => Arc::new(Sha256Hash),
			Self::Sha512 => Arc::new(Sha512Hash),
		}
	}
}

#[derive(Parser, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[command(author, version, about = "Websocket keepalive pinger", long_about = None)]
pub struct PingerConfig {
	#[arg(
        long,
        env = "PINGER_INTERVAL_SECS",
        default_value = "55",
        value_parser = parse_secs,
        help = "Interval between keepalive ticks in seconds"
    )]
	pub interval: Duration,

	#[arg(
        long,
        env = "PINGER_PONG_TIMEOUT_MS",
        value_parser = parse_millis,
        help = "How long a ping may stay unanswered before it counts as a failure, in milliseconds (defaults to the interval)"
    )]
	pub pong_timeout: Option<Duration>,

	#[arg(
        long,
        env = "PINGER_FAILURE_LIMIT",
        default_value = "4",
        allow_negative_numbers = true,
        value_parser = parse_failure_limit,
        help = "Consecutive timed-out pongs tolerated before closing the connection, -1 for unlimited"
    )]
	pub failure_limit: FailureLimit,

	#[arg(long, env = "PINGER_KEEP_ALIVE_ONLY", default_value_t = false, help = "Send unsolicited pongs instead of pings and never close connections")]
	pub keep_alive_only: bool,

	#[arg(long, env = "PINGER_HASH", value_enum, default_value_t = HashKind::Sha256, help = "Digest used to tag pings")]
	pub hash: HashKind,
}

impl PingerConfig {
	/// Parse from command line arguments and environment.
	#[must_use]
	pub fn from_args() -> Self {
		Self::parse()
	}

	#[must_use]
	pub fn new(interval: Duration) -> Self {
		Self { interval, ..Self::default() }
	}

	#[must_use]
	pub fn with_pong_timeout(mut self, timeout: Duration) -> Self {
		self.pong_timeout = Some(timeout);
		self
	}

	#[must_use]
	pub fn with_failure_limit(mut self, limit: FailureLimit) -> Self {
		self.failure_limit = limit;
		self
	}

	#[must_use]
	pub fn with_keep_alive_only(mut self, keep_alive_only: bool) -> Self {
		self.keep_alive_only = keep_alive_only;
		self
	}

	#[must_use]
	pub fn with_hash(mut self, hash: HashKind) -> Self {
		self.hash = hash;
		self
	}

	/// Effective pong timeout: an unanswered ping fails by the next tick unless configured otherwise.
	#[must_use]
	pub fn pong_timeout(&self) -> Duration {
		self.pong_timeout.unwrap_or(self.interval)
	}

	pub fn validate(&self) -> Result<()> {
		if self.interval.is_zero() {
			return Err(PingerError::InvalidConfig("interval must be greater than zero".to_string()));
		}
		Ok(())
	}
}

impl Default for PingerConfig {
	fn default() -> Self {
		Self {
			interval: DEFAULT_INTERVAL,
			pong_timeout: None,
			failure_limit: FailureLimit::default(),
			keep_alive_only: false,
			hash: HashKind::default(),
		}
	}
}

fn parse_secs(s: &str) -> std::result::Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_secs)
}

fn parse_millis(s: &str) -> std::result::Result<Duration, std::num::ParseIntError> {
	s.parse::<u64>().map(Duration::from_millis)
}

fn parse_failure_limit(s: &str) -> std::result::Result<FailureLimit, String> {
	let limit = s.parse::<i64>().map_err(|e| e.to_string())?;
	FailureLimit::from_i64(limit).map_err(|e| e.to_string())
}
