use aide::{
	openapi::{ApiKeyLocation, SecurityScheme, Tag},
	transform::TransformOpenApi,
};

use crate::{error, extract::Json, session};

pub const SECURITY_SCHEME_SESSION: &str = "Session";
pub const SECURITY_SCHEME_BEARER: &str = "Bearer";

pub mod tag {
	pub const AUTH: &str = "Auth";
	pub const POST: &str = "Post";
	pub const COMMENT: &str = "Comment";
	pub const MEDIA: &str = "Media";
}

pub fn docs(api: TransformOpenApi) -> TransformOpenApi {
	api.title("Photo Feed")
		.summary("Photo posts, comments, likes and live feeds")
		.description(include_str!("../README.md"))
		.tag(Tag {
			name: tag::AUTH.into(),
			description: Some("Sign-up, sign-in and session state".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::POST.into(),
			description: Some("Photo posts and likes".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::COMMENT.into(),
			description: Some("Comments under posts".into()),
			..Default::default()
		})
		.tag(Tag {
			name: tag::MEDIA.into(),
			description: Some("Photo and avatar uploads".into()),
			..Default::default()
		})
		.security_scheme(
			SECURITY_SCHEME_SESSION,
			SecurityScheme::ApiKey {
				location: ApiKeyLocation::Cookie,
				name: session::COOKIE_NAME.into(),
				description: Some("A user session cookie".into()),
				extensions: Default::default(),
			},
		)
		.security_scheme(
			SECURITY_SCHEME_BEARER,
			SecurityScheme::Http {
				scheme: "bearer".into(),
				bearer_format: Some("session token".into()),
				description: Some("The session token returned on login".into()),
				extensions: Default::default(),
			},
		)
		.default_response_with::<Json<error::ErrorResponse>, _>(|res| {
			res.example(error::ErrorResponse {
				success: false,
				errors: error::Message::new("error message")
					.field("optional field")
					.detail("key", "value")
					.into_vec(),
			})
		})
}
