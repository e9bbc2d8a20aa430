use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_login(login: &str) -> Result<(), ValidationError> {
	if login
		.chars()
		.any(|c| !(c.is_alphanumeric() || c == '_' || c == '.'))
	{
		return Err(ValidationError::new("login must be alphanumeric"));
	}

	Ok(())
}

/// A single user.
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The user's email address, used for logging in.
	pub email: String,
	/// The hashed password.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The login that is displayed to the public.
	pub login: String,
	/// A durable URL to the user's avatar.
	pub avatar: Option<String>,
	/// The creation time of the user.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	/// The session token. Send it back as a cookie or a bearer token.
	#[serde(rename = "token")]
	pub id: Uuid,
	/// The user that owns the session.
	pub user_id: Uuid,
	/// The creation time of the session.
	pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct LoginInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 1, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct RegisterInput {
	#[validate(email)]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The login that is displayed to the public.
	#[validate(length(min = 1, max = 32), custom(function = "validate_login"))]
	pub login: String,
	/// A URL returned by the avatar upload route.
	#[validate(url)]
	pub avatar: Option<String>,
}

#[derive(Deserialize, Validate, JsonSchema)]
pub struct UpdateUserInput {
	/// The new avatar URL, or `null` to remove it.
	#[validate(url)]
	pub avatar: Option<String>,
}
