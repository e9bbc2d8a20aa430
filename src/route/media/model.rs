use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::media::Namespace;

/// The durable location of an uploaded object.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Uploaded {
	/// The URL the object is served from. It never changes.
	pub url: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct ObjectPath {
	pub namespace: Namespace,
	pub key: Uuid,
}
