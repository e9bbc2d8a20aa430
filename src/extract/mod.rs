//! Request extractors.
//!
//! [`Json`], [`Query`] and [`Path`] wrap the axum extractors of the same name
//! and run [`validator::Validate`] on the result, so a handler only ever sees
//! input that passed its `#[validate]` rules. Every rejection is an
//! [`AppError`] with a 400 status and one message per failed field.
//!
//! [`Session`] resolves the signed-in user and [`Upload`] reads a raw image
//! body.

mod session;
mod upload;

pub use session::Session;
pub use upload::Upload;

use aide::OperationIo;
use axum::{
	body::Body,
	extract::{FromRequest, FromRequestParts, Request},
	http::{request, Response},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

fn validated<T: Validate>(value: T) -> Result<T, AppError> {
	value.validate()?;

	Ok(value)
}

/// A validated JSON body, checked against its schema before deserializing.
///
/// ```rust
/// async fn create_post(Json(post): Json<model::CreatePost>) {
///   // `post.title` is already known to be non-blank
/// }
/// ```
///
/// As a response, it serializes `T` as plain JSON.
#[derive(OperationIo)]
#[aide(
	input_with = "axum_jsonschema::Json<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Json<T>(pub T);

impl<T> IntoResponse for Json<T>
where
	T: serde::Serialize,
{
	fn into_response(self) -> Response<Body> {
		axum::extract::Json(self.0).into_response()
	}
}

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
	T: DeserializeOwned + Validate + JsonSchema + 'static,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let axum_jsonschema::Json(value) = axum_jsonschema::Json::from_request(req, state).await?;

		validated(value).map(Self)
	}
}

/// A validated query string, such as the `limit` and `offset` of a page.
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Query<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: DeserializeOwned + Validate,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let axum::extract::Query(value) =
			axum::extract::Query::from_request_parts(parts, state).await?;

		validated(value).map(Self)
	}
}

/// Validated path parameters. A malformed id is a 400, not a 404.
#[derive(OperationIo)]
#[aide(
	input_with = "axum::extract::Path<T>",
	output_with = "axum_jsonschema::Json<T>",
	json_schema
)]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: DeserializeOwned + Validate + Send,
	S: Send + Sync,
{
	type Rejection = AppError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let axum::extract::Path(value) =
			axum::extract::Path::from_request_parts(parts, state).await?;

		validated(value).map(Self)
	}
}
