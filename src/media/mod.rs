//! Object storage for uploaded photos.
//!
//! Objects are addressed by a namespace and a random id; every upload gets a
//! fresh key, so identical bytes uploaded twice are stored twice.

mod fs;
mod memory;

pub use fs::FsMediaStore;
pub use memory::MemoryMediaStore;

use std::fmt;

use axum::body::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("metadata error: {0}")]
	Metadata(#[from] serde_json::Error),
}

/// The top-level folder an object is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum Namespace {
	#[serde(rename = "postImage")]
	PostImage,
	#[serde(rename = "avatarImage")]
	AvatarImage,
}

impl Namespace {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::PostImage => "postImage",
			Self::AvatarImage => "avatarImage",
		}
	}
}

impl fmt::Display for Namespace {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The location of an object, displayed as `{namespace}/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectKey {
	pub namespace: Namespace,
	pub id: Uuid,
}

impl ObjectKey {
	pub fn new(namespace: Namespace, id: Uuid) -> Self {
		Self { namespace, id }
	}

	/// A key that has never been handed out before.
	pub fn generate(namespace: Namespace) -> Self {
		Self::new(namespace, Uuid::new_v4())
	}
}

impl fmt::Display for ObjectKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.namespace, self.id)
	}
}

#[derive(Debug, Clone)]
pub struct Object {
	pub content_type: String,
	pub bytes: Bytes,
}

#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
	/// Stores an object, replacing anything previously stored under `key`.
	async fn put(&self, key: &ObjectKey, object: Object) -> Result<(), Error>;

	async fn get(&self, key: &ObjectKey) -> Result<Option<Object>, Error>;
}
