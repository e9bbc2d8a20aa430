use std::borrow::Cow;

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
	Json,
};
use axum_jsonschema::JsonSchemaRejection;
use schemars::JsonSchema;
use serde::Serialize;
use tower_governor::GovernorError;

use crate::{media, store};

pub type Map = serde_json::Map<String, serde_json::Value>;

/// A single error message presented to the client.
#[derive(Debug, Serialize, JsonSchema)]
pub struct Message {
	/// A machine-readable description of the error.
	pub content: Cow<'static, str>,
	/// The input field that caused the error, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub field: Option<Cow<'static, str>>,
	/// Additional structured information about the error.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Map>,
}

impl Message {
	pub fn new(content: impl Into<Cow<'static, str>>) -> Self {
		Self {
			content: content.into(),
			field: None,
			details: None,
		}
	}

	#[must_use]
	pub fn field(mut self, field: impl Into<Cow<'static, str>>) -> Self {
		self.field = Some(field.into());
		self
	}

	#[must_use]
	pub fn detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
		self.details
			.get_or_insert_with(Map::new)
			.insert(key.into(), value.into());
		self
	}

	pub fn into_vec(self) -> Vec<Self> {
		vec![self]
	}
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	pub success: bool,
	pub errors: Vec<Message>,
}

/// Describes how an error is presented to the client.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;
	fn errors(&self) -> Vec<Message>;
}

/// Errors shared by every route.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("invalid json body")]
	Json(JsonSchemaRejection),
	#[error("query error: {0}")]
	Query(#[from] rejection::QueryRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("media error: {0}")]
	Media(#[from] media::Error),
	#[error("rate limited")]
	RateLimit(GovernorError),
}

impl From<JsonSchemaRejection> for AppError {
	fn from(rejection: JsonSchemaRejection) -> Self {
		Self::Json(rejection)
	}
}

impl From<GovernorError> for AppError {
	fn from(error: GovernorError) -> Self {
		Self::RateLimit(error)
	}
}

impl ErrorShape for AppError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Query(..) | Self::Path(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::Store(..) | Self::Media(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RateLimit(GovernorError::TooManyRequests { .. }) => StatusCode::TOO_MANY_REQUESTS,
			Self::RateLimit(GovernorError::Other { code, .. }) => *code,
			Self::RateLimit(..) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn errors(&self) -> Vec<Message> {
		match self {
			Self::Validation(errors) => errors
				.field_errors()
				.into_iter()
				.flat_map(|(field, errors)| {
					errors.iter().map(move |error| {
						Message::new(error.code.clone()).field(field.to_string())
					})
				})
				.collect(),
			Self::Json(..) => Message::new("invalid_body").into_vec(),
			Self::Query(error) => Message::new("invalid_query")
				.detail("reason", error.body_text())
				.into_vec(),
			Self::Path(error) => Message::new("invalid_path")
				.detail("reason", error.body_text())
				.into_vec(),
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				Message::new("too_many_requests")
					.detail("wait_time", *wait_time)
					.into_vec()
			}
			Self::Store(..) | Self::Media(..) | Self::RateLimit(..) => Vec::new(),
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		RouteError::<AppError>::App(self).into_response()
	}
}

impl OperationOutput for AppError {
	type Inner = ErrorResponse;
}

/// An error returned from a route: either one shared by every route,
/// or one specific to the route module `E`.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E> {
	#[error(transparent)]
	App(#[from] AppError),
	#[error(transparent)]
	Route(E),
}

impl<E> From<store::Error> for RouteError<E> {
	fn from(error: store::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<media::Error> for RouteError<E> {
	fn from(error: media::Error) -> Self {
		Self::App(error.into())
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::App(error.into())
	}
}

impl<E> IntoResponse for RouteError<E>
where
	E: ErrorShape,
{
	fn into_response(self) -> Response<Body> {
		let (status, errors) = match &self {
			Self::App(error) => (error.status(), error.errors()),
			Self::Route(error) => (error.status(), error.errors()),
		};

		if status.is_server_error() {
			tracing::error!(error = %self, "request failed");
		}

		(
			status,
			Json(ErrorResponse {
				success: false,
				errors,
			}),
		)
			.into_response()
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorResponse;
}

#[cfg(test)]
mod test {
	use axum::http::StatusCode;
	use validator::Validate;

	use super::{AppError, ErrorShape, Message};

	#[derive(Validate)]
	struct Input {
		#[validate(length(min = 3))]
		title: String,
	}

	#[test]
	fn test_validation_errors_name_their_field() {
		let errors = Input { title: "a".into() }.validate().unwrap_err();
		let error = AppError::from(errors);

		assert_eq!(error.status(), StatusCode::BAD_REQUEST);

		let messages = error.errors();

		assert_eq!(messages.len(), 1);
		assert_eq!(messages[0].field.as_deref(), Some("title"));
		assert_eq!(messages[0].content, "length");
	}

	#[test]
	fn test_message_details() {
		let message = Message::new("unknown_post").detail("post", "abc");

		assert_eq!(
			serde_json::to_value(&message).unwrap(),
			serde_json::json!({ "content": "unknown_post", "details": { "post": "abc" } })
		);
	}
}
