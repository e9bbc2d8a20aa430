pub use crate::route::model::{IdInput, Paginate, Window};

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::route::model::non_blank;

/// A comment under a post.
///
/// The author's login and avatar are copied when the comment is written,
/// so later avatar changes do not show up on old comments.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The post the comment was written under.
	#[serde(skip_deserializing)]
	pub post_id: Uuid,
	#[serde(skip_deserializing)]
	pub user_id: Uuid,
	/// The author's login.
	#[serde(skip_deserializing)]
	pub login: String,
	/// The author's avatar URL.
	#[serde(skip_deserializing)]
	pub avatar: Option<String>,
	/// The text of the comment.
	#[validate(length(min = 1, max = 2000), custom(function = "non_blank"))]
	pub comment: String,
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}
