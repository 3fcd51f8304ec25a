use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;

use crate::core::conn::Connection;
use crate::player::PingPongPlayer;
use crate::types::ConnectionId;

/// Sharded map of connection id to player.
///
/// Iteration only ever happens through [`snapshot`](Self::snapshot), which
/// copies the `Arc`s out, so a tick never holds a shard lock while sending.
pub(crate) struct PlayerRegistry<C: Connection> {
	players: DashMap<ConnectionId, Arc<PingPongPlayer<C>>>,
}

impl<C: Connection> PlayerRegistry<C> {
	pub fn new() -> Self {
		Self { players: DashMap::new() }
	}

	/// Insert the player built by `make` unless the id is taken; the existing player is kept.
	///
	/// The pong listener is installed while the entry is held, so it cannot
	/// interleave with a concurrent [`remove`](Self::remove) of the same id.
	pub fn insert_with<F>(&self, id: ConnectionId, make: F) -> bool
	where
		F: FnOnce() -> Arc<PingPongPlayer<C>>,
	{
		match self.players.entry(id) {
			Entry::Occupied(_) => false,
			Entry::Vacant(slot) => {
				let player = make();
				player.install();
				slot.insert(player);
				true
			}
		}
	}

	pub fn get(&self, id: &ConnectionId) -> Option<Arc<PingPongPlayer<C>>> {
		self.players.get(id).map(|entry| entry.value().clone())
	}

	/// Remove the player and detach its listener before the entry is released.
	pub fn remove(&self, id: &ConnectionId) -> Option<Arc<PingPongPlayer<C>>> {
		match self.players.entry(*id) {
			Entry::Occupied(entry) => {
				entry.get().detach();
				Some(entry.remove())
			}
			Entry::Vacant(_) => None,
		}
	}

	pub fn contains(&self, id: &ConnectionId) -> bool {
		self.players.contains_key(id)
	}

	pub fn len(&self) -> usize {
		self.players.len()
	}

	pub fn snapshot(&self) -> Vec<Arc<PingPongPlayer<C>>> {
		self.players.iter().map(|entry| entry.value().clone()).collect()
	}

	/// Remove and detach every player, returning them.
	pub fn drain(&self) -> Vec<Arc<PingPongPlayer<C>>> {
		let ids: Vec<ConnectionId> = self.players.iter().map(|entry| *entry.key()).collect();
		ids.iter().filter_map(|id| self.remove(id)).collect()
	}
}
