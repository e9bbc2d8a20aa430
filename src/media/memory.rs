use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{Error, MediaStore, Object, ObjectKey};

/// Keeps objects in memory. Everything is lost when the process exits.
#[derive(Default)]
pub struct MemoryMediaStore {
	objects: RwLock<HashMap<ObjectKey, Object>>,
}

impl MemoryMediaStore {
	pub fn new() -> Self {
		Self::default()
	}

	#[cfg(test)]
	pub async fn len(&self) -> usize {
		self.objects.read().await.len()
	}
}

#[async_trait::async_trait]
impl MediaStore for MemoryMediaStore {
	async fn put(&self, key: &ObjectKey, object: Object) -> Result<(), Error> {
		self.objects.write().await.insert(*key, object);
		Ok(())
	}

	async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, Error> {
		Ok(self.objects.read().await.get(key).cloned())
	}
}
