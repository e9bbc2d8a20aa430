pub use crate::route::model::{IdInput, Paginate, Window};

use macros::model;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::route::model::non_blank;

/// Geographic coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Location {
	pub latitude: f64,
	pub longitude: f64,
}

fn validate_location(location: &Location) -> Result<(), ValidationError> {
	if !(-90.0..=90.0).contains(&location.latitude) {
		return Err(ValidationError::new("latitude out of range"));
	}

	if !(-180.0..=180.0).contains(&location.longitude) {
		return Err(ValidationError::new("longitude out of range"));
	}

	Ok(())
}

/// A single photo post, created by a user.
#[model]
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that created the post.
	#[serde(skip_deserializing)]
	pub user_id: Uuid,
	/// The login of the user that created the post, at the time of posting.
	#[serde(skip_deserializing)]
	pub login: String,
	/// The title of the post.
	#[validate(length(min = 1, max = 128), custom(function = "non_blank"))]
	pub title: String,
	/// A URL returned by the post image upload route.
	#[validate(url)]
	pub photo: String,
	/// Where the photo was taken.
	#[validate(custom(function = "validate_location"))]
	pub location: Location,
	/// A human-readable name for the location.
	#[validate(length(max = 256))]
	#[serde(default)]
	pub region_name: String,
	/// The number of users that like the post.
	#[serde(skip_deserializing)]
	pub likes_quantity: i64,
	/// Whether the requesting user likes the post.
	#[serde(skip_deserializing)]
	pub like_status: bool,
	/// The number of comments under the post.
	#[serde(skip_deserializing)]
	pub comments_quantity: i64,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: chrono::DateTime<chrono::Utc>,
}
