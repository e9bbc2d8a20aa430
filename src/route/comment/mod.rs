use aide::axum::{routing::get_with, ApiRouter};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
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
			"/posts/:id/comments",
			get_with(get_comments, get_comments_docs)
				.post_with(create_comment, create_comment_docs),
		)
		.api_route(
			"/posts/:id/comments/live",
			get_with(watch_comments, watch_comments_docs),
		)
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		match self {
			Self::UnknownPost(post) => error::Message::new("unknown_post")
				.detail("post", post.to_string())
				.into_vec(),
		}
	}
}

#[cfg(test)]
mod test {
	use std::{sync::Arc, time::Duration};

	use crate::{live, store::Store, test::*};

	async fn create_post(app: &TestApp, token: &str) -> Value {
		app.server
			.post("/posts")
			.add_header(header::AUTHORIZATION, bearer(token))
			.json(&json!({
				"title": "Sunset",
				"photo": "http://127.0.0.1:3000/media/postImage/4c1d",
				"location": { "latitude": 49.84, "longitude": 24.03 },
			}))
			.await
			.json::<Value>()
	}

	#[tokio::test]
	async fn test_created_comment_reaches_subscribers() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;
		let post = create_post(&app, &token).await;
		let post_id = post["id"].as_str().unwrap().parse().unwrap();

		let store: Arc<dyn Store> = app.store.clone();
		let mut subscription = app.state.feed.subscribe(
			store,
			live::Comments { post_id, limit: 20 },
		);

		assert!(subscription.next().await.unwrap().unwrap().is_empty());

		let response = app
			.server
			.post(&format!("/posts/{post_id}/comments"))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.json(&json!({ "comment": "Beautiful light" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let comments = tokio::time::timeout(Duration::from_secs(1), subscription.next())
			.await
			.unwrap()
			.unwrap()
			.unwrap();

		assert_eq!(comments.len(), 1);
		assert_eq!(comments[0].comment, "Beautiful light");
		assert_eq!(comments[0].login, "john");

		let post = app
			.server
			.get(&format!("/posts/{post_id}"))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await
			.json::<Value>();

		assert_eq!(post["commentsQuantity"], 1);
	}

	#[tokio::test]
	async fn test_comments_are_oldest_first() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;
		let post = create_post(&app, &token).await;
		let path = format!("/posts/{}/comments", post["id"].as_str().unwrap());

		for comment in ["first", "second", "third"] {
			app.server
				.post(&path)
				.add_header(header::AUTHORIZATION, bearer(&token))
				.json(&json!({ "comment": comment }))
				.await;
		}

		let comments = app
			.server
			.get(&path)
			.add_header(header::AUTHORIZATION, bearer(&token))
			.add_query_param("size", 2)
			.await
			.json::<Value>();

		assert_eq!(comments.as_array().unwrap().len(), 2);
		assert_eq!(comments[0]["comment"], "first");
		assert_eq!(comments[1]["comment"], "second");
	}

	#[tokio::test]
	async fn test_invalid_comments() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;
		let post = create_post(&app, &token).await;

		let response = app
			.server
			.post(&format!("/posts/{}/comments", post["id"].as_str().unwrap()))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.json(&json!({ "comment": "  " }))
			.await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

		let response = app
			.server
			.post(&format!("/posts/{}/comments", uuid::Uuid::new_v4()))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.json(&json!({ "comment": "Hello?" }))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

		let (_, _, _, comments) = app.store.counts().await;

		assert_eq!(comments, 0);
	}

	#[tokio::test]
	async fn test_watching_an_unknown_post() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;
		let id = uuid::Uuid::new_v4();

		let response = app
			.server
			.get(&format!("/posts/{id}/comments/live"))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(
			response.json::<Value>()["errors"][0]["details"]["post"],
			id.to_string()
		);
		assert_eq!(app.state.feed.listeners(), 0);
	}
}
