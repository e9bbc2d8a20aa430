use aide::OperationInput;
use axum::{
	body::Bytes,
	extract::{FromRequest, Request},
	http::{header, StatusCode},
};

use crate::{error::RouteError, route::media};

/// Raster image types accepted for upload. SVG is not one of them: it can
/// carry scripts.
const ALLOWED_CONTENT_TYPES: [&str; 5] = [
	"image/png",
	"image/jpeg",
	"image/gif",
	"image/webp",
	"image/heic",
];

/// Extractor for a raw image upload.
///
/// The body must be non-empty and the `Content-Type` must be one of the
/// allowed raster image types. Parameters such as `charset` are dropped.
#[derive(Debug)]
pub struct Upload {
	pub content_type: String,
	pub bytes: Bytes,
}

#[axum::async_trait]
impl<S> FromRequest<S> for Upload
where
	S: Send + Sync,
{
	type Rejection = RouteError<media::Error>;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let content_type = req
			.headers()
			.get(header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.split(';').next())
			.map(|value| value.trim().to_ascii_lowercase())
			.unwrap_or_default();

		if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
			return Err(media::Error::UnsupportedContentType(content_type).into());
		}

		let bytes = Bytes::from_request(req, state)
			.await
			.map_err(|rejection| {
				if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
					media::Error::TooLarge
				} else {
					media::Error::UnreadableBody
				}
			})?;

		if bytes.is_empty() {
			return Err(media::Error::EmptyUpload.into());
		}

		Ok(Self {
			content_type,
			bytes,
		})
	}
}

impl OperationInput for Upload {}

