use std::{io::ErrorKind, path::PathBuf};

use serde::{Deserialize, Serialize};

use super::{Error, MediaStore, Object, ObjectKey};

/// Sidecar written next to each object.
#[derive(Serialize, Deserialize)]
struct Metadata {
	content_type: String,
}

/// Stores objects as files under `root/{namespace}/{id}`, with their
/// content type in `root/{namespace}/{id}.json`.
pub struct FsMediaStore {
	root: PathBuf,
}

impl FsMediaStore {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	fn paths(&self, key: &ObjectKey) -> (PathBuf, PathBuf) {
		let dir = self.root.join(key.namespace.as_str());
		let id = key.id.to_string();

		(dir.join(&id), dir.join(format!("{id}.json")))
	}
}

#[async_trait::async_trait]
impl MediaStore for FsMediaStore {
	#[tracing::instrument(skip(self, object), fields(size = object.bytes.len()))]
	async fn put(&self, key: &ObjectKey, object: Object) -> Result<(), Error> {
		let (data, meta) = self.paths(key);

		if let Some(dir) = data.parent() {
			tokio::fs::create_dir_all(dir).await?;
		}

		tokio::fs::write(&data, &object.bytes).await?;
		tokio::fs::write(
			&meta,
			serde_json::to_vec(&Metadata {
				content_type: object.content_type,
			})?,
		)
		.await?;

		Ok(())
	}

	async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, Error> {
		let (data, meta) = self.paths(key);

		let bytes = match tokio::fs::read(&data).await {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		let metadata: Metadata = serde_json::from_slice(&tokio::fs::read(&meta).await?)?;

		Ok(Some(Object {
			content_type: metadata.content_type,
			bytes: bytes.into(),
		}))
	}
}

#[cfg(test)]
mod test {
	use axum::body::Bytes;

	use super::FsMediaStore;
	use crate::media::{MediaStore, Namespace, Object, ObjectKey};

	#[tokio::test]
	async fn test_put_then_get() {
		let root = std::env::temp_dir().join(format!("photo-feed-{}", uuid::Uuid::new_v4()));
		let store = FsMediaStore::new(&root);
		let key = ObjectKey::generate(Namespace::AvatarImage);

		assert!(store.get(&key).await.unwrap().is_none());

		store
			.put(
				&key,
				Object {
					content_type: "image/png".into(),
					bytes: Bytes::from_static(b"\x89PNG"),
				},
			)
			.await
			.unwrap();

		let object = store.get(&key).await.unwrap().unwrap();

		assert_eq!(object.content_type, "image/png");
		assert_eq!(&object.bytes[..], b"\x89PNG");
		assert!(root.join("avatarImage").join(key.id.to_string()).exists());

		tokio::fs::remove_dir_all(&root).await.unwrap();
	}
}
