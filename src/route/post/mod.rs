use aide::axum::{
	routing::{get_with, put_with},
	ApiRouter,
};
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
			"/posts",
			get_with(get_posts, get_posts_docs).post_with(create_post, create_post_docs),
		)
		.api_route("/posts/me", get_with(get_own_posts, get_own_posts_docs))
		.api_route("/posts/:id", get_with(get_post, get_post_docs))
		.api_route(
			"/posts/:id/like",
			put_with(like_post, like_post_docs).delete_with(unlike_post, unlike_post_docs),
		)
		.api_route(
			"/users/:id/posts",
			get_with(get_user_posts, get_user_posts_docs),
		)
		.api_route("/posts/live", get_with(watch_posts, watch_posts_docs))
		.api_route(
			"/posts/me/live",
			get_with(watch_own_posts, watch_own_posts_docs),
		)
		.api_route(
			"/users/:id/posts/live",
			get_with(watch_user_posts, watch_user_posts_docs),
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
	use std::sync::Arc;

	use axum::{body::Body, http::Request};
	use tower::Service;
	use uuid::Uuid;

	use crate::{
		live,
		store::{PostFilter, Store},
		test::*,
	};

	fn sunset() -> Value {
		json!({
			"title": "Sunset",
			"photo": "http://127.0.0.1:3000/media/postImage/4c1d",
			"location": { "latitude": 49.84, "longitude": 24.03 },
			"regionName": "Lviv",
		})
	}

	async fn create(app: &TestApp, token: &str, body: &Value) -> TestResponse {
		app.server
			.post("/posts")
			.add_header(header::AUTHORIZATION, bearer(token))
			.json(body)
			.await
	}

	#[tokio::test]
	async fn test_created_post_reaches_subscribers() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;

		let response = create(&app, &token, &sunset()).await;

		assert_eq!(response.status_code(), StatusCode::OK);

		let created = response.json::<Value>();

		assert_eq!(created["login"], "john");
		assert_eq!(created["likesQuantity"], 0);
		assert_eq!(created["commentsQuantity"], 0);

		let store: Arc<dyn Store> = app.store.clone();
		let mut subscription = app.state.feed.subscribe(
			store,
			live::Posts {
				filter: PostFilter {
					owner: None,
					viewer: Uuid::new_v4(),
					limit: 20,
					offset: 0,
				},
			},
		);

		let posts = subscription.next().await.unwrap().unwrap();

		assert_eq!(posts.len(), 1);
		assert_eq!(posts[0].title, "Sunset");
		assert_eq!(posts[0].location.latitude, 49.84);
		assert_eq!(posts[0].location.longitude, 24.03);
		assert_eq!(
			posts[0].photo,
			"http://127.0.0.1:3000/media/postImage/4c1d"
		);
	}

	#[tokio::test]
	async fn test_like_then_unlike() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;
		let post = create(&app, &token, &sunset()).await.json::<Value>();
		let path = format!("/posts/{}/like", post["id"].as_str().unwrap());

		let liked = app
			.server
			.put(&path)
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await
			.json::<Value>();

		assert_eq!(liked["likesQuantity"], 1);
		assert_eq!(liked["likeStatus"], true);

		let liked_again = app
			.server
			.put(&path)
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await
			.json::<Value>();

		assert_eq!(liked_again["likesQuantity"], 1);

		let unliked = app
			.server
			.delete(&path)
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await
			.json::<Value>();

		assert_eq!(unliked["likesQuantity"], 0);
		assert_eq!(unliked["likeStatus"], false);
	}

	#[tokio::test]
	async fn test_concurrent_likes_all_count() {
		let app = app();
		let author = app.register("john@smith.com", "john").await;
		let first = app.register("jane@smith.com", "jane").await;
		let second = app.register("joe@smith.com", "joe").await;
		let post = create(&app, &author, &sunset()).await.json::<Value>();
		let path = format!("/posts/{}/like", post["id"].as_str().unwrap());

		let (a, b) = tokio::join!(
			async {
				app.server
					.put(&path)
					.add_header(header::AUTHORIZATION, bearer(&first))
					.await
			},
			async {
				app.server
					.put(&path)
					.add_header(header::AUTHORIZATION, bearer(&second))
					.await
			},
		);

		assert_eq!(a.status_code(), StatusCode::OK);
		assert_eq!(b.status_code(), StatusCode::OK);

		let post = app
			.server
			.get(&format!("/posts/{}", post["id"].as_str().unwrap()))
			.add_header(header::AUTHORIZATION, bearer(&author))
			.await
			.json::<Value>();

		assert_eq!(post["likesQuantity"], 2);
		assert_eq!(post["likeStatus"], false);
	}

	#[tokio::test]
	async fn test_invalid_posts_are_never_stored() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;

		let mut blank = sunset();
		blank["title"] = json!("   ");

		let response = create(&app, &token, &blank).await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
		assert_eq!(response.json::<Value>()["errors"][0]["field"], "title");

		let mut unlocated = sunset();
		unlocated.as_object_mut().unwrap().remove("location");

		let response = create(&app, &token, &unlocated).await;

		assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

		let (_, _, posts, _) = app.store.counts().await;

		assert_eq!(posts, 0);
	}

	#[tokio::test]
	async fn test_user_posts() {
		let app = app();
		let john = app.register("john@smith.com", "john").await;
		let jane = app.register("jane@smith.com", "jane").await;

		create(&app, &john, &sunset()).await;

		let mut sunrise = sunset();
		sunrise["title"] = json!("Sunrise");

		let jane_post = create(&app, &jane, &sunrise).await.json::<Value>();

		let own = app
			.server
			.get("/posts/me")
			.add_header(header::AUTHORIZATION, bearer(&jane))
			.await
			.json::<Value>();

		assert_eq!(own.as_array().unwrap().len(), 1);
		assert_eq!(own[0]["title"], "Sunrise");

		let theirs = app
			.server
			.get(&format!(
				"/users/{}/posts",
				jane_post["userId"].as_str().unwrap()
			))
			.add_header(header::AUTHORIZATION, bearer(&john))
			.await
			.json::<Value>();

		assert_eq!(theirs, own);

		let all = app
			.server
			.get("/posts")
			.add_header(header::AUTHORIZATION, bearer(&john))
			.await
			.json::<Value>();

		assert_eq!(all[0]["title"], "Sunrise");
		assert_eq!(all[1]["title"], "Sunset");
	}

	#[tokio::test]
	async fn test_unknown_post() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;
		let id = Uuid::new_v4();

		let response = app
			.server
			.put(&format!("/posts/{id}/like"))
			.add_header(header::AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
		assert_eq!(
			response.json::<Value>()["errors"][0]["details"]["post"],
			id.to_string()
		);
	}

	#[tokio::test]
	async fn test_live_posts_open_with_a_snapshot() {
		let app = app();
		let token = app.register("john@smith.com", "john").await;

		create(&app, &token, &sunset()).await;

		let mut router = crate::app(app.state.clone());
		let request = Request::builder()
			.uri("/posts/live?limit=5")
			.header(header::AUTHORIZATION, bearer(&token))
			.body(Body::empty())
			.unwrap();

		let response = router.call(request).await.unwrap();

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			response.headers()[header::CONTENT_TYPE],
			"text/event-stream"
		);

		let mut events = response.into_body().into_data_stream();
		let (event, data) = next_event(&mut events).await.unwrap();
		let posts = serde_json::from_str::<Value>(&data).unwrap();

		assert_eq!(event, "snapshot");
		assert_eq!(posts.as_array().unwrap().len(), 1);
		assert_eq!(posts[0]["title"], "Sunset");
		assert_eq!(posts[0]["likeStatus"], false);
	}
}
