//! Latest published snapshot, shared with the scrape surface.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::ChainSnapshot;

/// Holder of the last published [`ChainSnapshot`].
///
/// Publishing swaps the inner `Arc`, so a reader either sees the previous snapshot or
/// the new one, never a mix.
#[derive(Clone, Debug, Default)]
pub struct SnapshotStore {
	current: Arc<RwLock<Arc<ChainSnapshot>>>,
}

impl SnapshotStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the stored snapshot and returns the shared handle to it.
	pub async fn replace(&self, snapshot: ChainSnapshot) -> Arc<ChainSnapshot> {
		let snapshot = Arc::new(snapshot);
		*self.current.write().await = snapshot.clone();
		snapshot
	}

	pub async fn latest(&self) -> Arc<ChainSnapshot> {
		self.current.read().await.clone()
	}
}
