use std::fmt;
use uuid::Uuid;

/// Connection ID type for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
	#[must_use]
	pub fn new() -> Self {
		Self(Uuid::new_v4())
	}

	#[must_use]
	pub const fn from_uuid(uuid: Uuid) -> Self {
		Self(uuid)
	}

	#[must_use]
	pub const fn as_uuid(&self) -> &Uuid {
		&self.0
	}

	#[must_use]
	pub const fn as_bytes(&self) -> &[u8; 16] {
		self.0.as_bytes()
	}
}

impl Default for ConnectionId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for ConnectionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Websocket close codes the pinger may emit or that callers commonly pass along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseCode {
	Normal,
	GoingAway,
	ProtocolError,
}

impl CloseCode {
	#[must_use]
	pub const fn as_u16(self) -> u16 {
		match self {
			Self::Normal => 1000,
			Self::GoingAway => 1001,
			Self::ProtocolError => 1002,
		}
	}
}

impl fmt::Display for CloseCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Normal => write!(f, "Normal({})", self.as_u16()),
			Self::GoingAway => write!(f, "GoingAway({})", self.as_u16()),
			Self::ProtocolError => write!(f, "ProtocolError({})", self.as_u16()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_connection_ids_are_unique() {
		assert_ne!(ConnectionId::new(), ConnectionId::new());
	}

	#[test]
	fn test_close_code_values() {
		assert_eq!(CloseCode::Normal.as_u16(), 1000);
		assert_eq!(CloseCode::GoingAway.as_u16(), 1001);
		assert_eq!(CloseCode::ProtocolError.as_u16(), 1002);
		assert_eq!(CloseCode::ProtocolError.to_string(), "ProtocolError(1002)");
	}
}
