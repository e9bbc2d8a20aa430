use std::sync::Arc;

use aide::{
	axum::{
		routing::{get, get_with},
		ApiRouter, IntoApiResponse,
	},
	openapi::OpenApi,
	scalar::Scalar,
};
use axum::{response::IntoResponse, Extension};

use crate::{extract::Json, openapi::SECURITY_SCHEME_BEARER, AppState};

pub fn routes() -> ApiRouter<AppState> {
	ApiRouter::new()
		.api_route_with(
			"/",
			get_with(
				Scalar::new("/docs/private/api.json")
					.with_title("Photo Feed")
					.axum_handler(),
				|op| op.description("This documentation page."),
			),
			|p| p.security_requirement(SECURITY_SCHEME_BEARER),
		)
		.route("/private/api.json", get(serve_docs))
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
	Json(api).into_response()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_api_document_lists_routes() {
		let app = app();

		let response = app.server.get("/docs/private/api.json").await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let api = response.json::<Value>();

		assert_eq!(api["info"]["title"], "Photo Feed");
		assert!(api["paths"]["/posts"]["post"].is_object());
		assert!(api["paths"]["/auth/register"]["post"].is_object());
		assert!(api["paths"]["/media/postImage"]["post"].is_object());

		for path in [
			"/auth/state",
			"/posts/live",
			"/posts/me/live",
			"/users/{id}/posts/live",
			"/posts/{id}/comments/live",
		] {
			assert!(
				api["paths"][path]["get"]["responses"]["200"]["content"]["text/event-stream"]
					.is_object(),
				"{path} is undocumented"
			);
		}
	}
}
