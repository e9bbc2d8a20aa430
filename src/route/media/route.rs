use aide::OperationOutput;
use axum::{
	body::Body,
	extract::State,
	http::{header, Response},
	response::IntoResponse,
};
use macros::route;

use crate::{
	extract::{Json, Path, Session, Upload},
	media::{Namespace, Object, ObjectKey},
	openapi::tag,
	AppState, Media,
};

use super::{model, Error, RouteError};

/// The raw bytes of a stored object, sent with its content type.
pub struct Blob(Object);

impl IntoResponse for Blob {
	fn into_response(self) -> Response<Body> {
		(
			[
				(header::CONTENT_TYPE, self.0.content_type),
				// keys are never reused, so the bytes behind a URL never change
				(
					header::CACHE_CONTROL,
					"public, max-age=31536000, immutable".to_owned(),
				),
				(header::X_CONTENT_TYPE_OPTIONS, "nosniff".to_owned()),
			],
			self.0.bytes,
		)
			.into_response()
	}
}

impl OperationOutput for Blob {
	type Inner = Self;
}

async fn store(
	state: &AppState,
	namespace: Namespace,
	upload: Upload,
) -> Result<Json<model::Uploaded>, RouteError> {
	let key = ObjectKey::generate(namespace);
	let size = upload.bytes.len();

	state
		.media
		.put(
			&key,
			Object {
				content_type: upload.content_type,
				bytes: upload.bytes,
			},
		)
		.await?;

	tracing::info!(
		monotonic_counter.uploads = 1,
		%key,
		size,
		"stored upload"
	);

	Ok(Json(model::Uploaded {
		url: state.config.media_url(&key),
	}))
}

/// Upload avatar
/// Stores an avatar image and returns its durable URL. No session is needed, so the avatar can be uploaded before registering.
#[route(tag = tag::MEDIA)]
pub async fn upload_avatar(
	State(state): State<AppState>,
	upload: Upload,
) -> Result<Json<model::Uploaded>, RouteError> {
	store(&state, Namespace::AvatarImage, upload).await
}

/// Upload post image
/// Stores a photo for a post and returns its durable URL. Pass the URL as `photo` when creating the post.
#[route(tag = tag::MEDIA)]
pub async fn upload_post_image(
	State(state): State<AppState>,
	_session: Session,
	upload: Upload,
) -> Result<Json<model::Uploaded>, RouteError> {
	store(&state, Namespace::PostImage, upload).await
}

/// Download object
/// Returns the stored bytes of an uploaded object with their original content type.
#[route(tag = tag::MEDIA)]
pub async fn download(
	State(media): State<Media>,
	Path(path): Path<model::ObjectPath>,
) -> Result<Blob, RouteError> {
	let key = ObjectKey::new(path.namespace, path.key);
	let object = media
		.get(&key)
		.await?
		.ok_or_else(|| Error::UnknownObject(key.to_string()))?;

	Ok(Blob(object))
}
