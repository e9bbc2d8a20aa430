use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unsupported content type {0:?}")]
	UnsupportedContentType(String),
	#[error("failed to read upload body")]
	UnreadableBody,
	#[error("upload too large")]
	TooLarge,
	#[error("empty upload")]
	EmptyUpload,
	#[error("unknown object {0}")]
	UnknownObject(String),
}

pub type RouteError = error::RouteError<Error>;

impl From<Error> for RouteError {
	fn from(error: Error) -> Self {
		Self::Route(error)
	}
}

pub fn routes() -> ApiRouter<AppState> {
	use route::*;

	ApiRouter::new()
		.api_route(
			"/avatarImage",
			post_with(upload_avatar, upload_avatar_docs),
		)
		.api_route(
			"/postImage",
			post_with(upload_post_image, upload_post_image_docs),
		)
		.api_route("/:namespace/:key", get_with(download, download_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnsupportedContentType(..) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
			Self::UnreadableBody | Self::EmptyUpload => StatusCode::BAD_REQUEST,
			Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
			Self::UnknownObject(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		match self {
			Self::UnsupportedContentType(content_type) => {
				error::Message::new("unsupported_content_type")
					.detail("contentType", content_type.as_str())
					.into_vec()
			}
			Self::UnreadableBody => error::Message::new("unreadable_body").into_vec(),
			Self::TooLarge => error::Message::new("too_large").into_vec(),
			Self::EmptyUpload => error::Message::new("empty_upload").into_vec(),
			Self::UnknownObject(key) => error::Message::new("unknown_object")
				.detail("key", key.as_str())
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_avatar_upload_round_trip() {
		let app = app();

		let response = app
			.server
			.post("/media/avatarImage")
			.content_type("image/png")
			.bytes(Bytes::from_static(b"\x89PNG fake image"))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let url = response.json::<Value>()["url"]
			.as_str()
			.unwrap()
			.to_owned();

		assert!(url.starts_with("http://127.0.0.1:3000/media/avatarImage/"));

		let path = url.trim_start_matches("http://127.0.0.1:3000");
		let response = app.server.get(path).await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(response.header(header::CONTENT_TYPE), "image/png");
		assert_eq!(response.header(header::X_CONTENT_TYPE_OPTIONS), "nosniff");
		assert_eq!(response.as_bytes().as_ref(), b"\x89PNG fake image");
	}

	#[tokio::test]
	async fn test_every_upload_gets_a_new_key() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;

		let mut urls = Vec::new();

		for _ in 0..2 {
			let response = app
				.server
				.post("/media/postImage")
				.add_header(header::AUTHORIZATION, bearer(&token))
				.content_type("image/jpeg")
				.bytes(Bytes::from_static(b"same bytes"))
				.await;

			assert_eq!(response.status_code(), StatusCode::OK);

			urls.push(response.json::<Value>()["url"].clone());
		}

		assert_ne!(urls[0], urls[1]);
		assert_eq!(app.media.len().await, 2);
	}

	#[tokio::test]
	async fn test_rejected_uploads_store_nothing() {
		let app = app();

		let response = app
			.server
			.post("/media/avatarImage")
			.content_type("text/plain")
			.bytes(Bytes::from_static(b"not an image"))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

		let response = app
			.server
			.post("/media/avatarImage")
			.content_type("image/png")
			.bytes(Bytes::new())
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

		let response = app
			.server
			.post("/media/postImage")
			.content_type("image/png")
			.bytes(Bytes::from_static(b"no session"))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
		assert_eq!(app.media.len().await, 0);
	}

	#[tokio::test]
	async fn test_svg_uploads_are_refused() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;

		let response = app
			.server
			.post("/media/postImage")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.content_type("image/svg+xml")
			.bytes(Bytes::from_static(
				b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>",
			))
			.await;

		assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"unsupported_content_type"
		);
		assert_eq!(app.media.len().await, 0);

		let response = app
			.server
			.post("/media/postImage")
			.add_header(header::AUTHORIZATION, bearer(&token))
			.content_type("Image/JPEG; charset=binary")
			.bytes(Bytes::from_static(b"\xff\xd8 fake jpeg"))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);
		assert_eq!(app.media.len().await, 1);
	}

	#[tokio::test]
	async fn test_unknown_object() {
		let app = app();

		let response = app
			.server
			.get(&format!("/media/postImage/{}", uuid::Uuid::new_v4()))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(
			response.json::<Value>()["errors"][0]["content"],
			"unknown_object"
		);
	}
}
