use axum::extract::State;
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Path, Query, Session},
	live::{self, Change, EventStream},
	openapi::tag,
	store::{NewPost, PostFilter},
	AppState, Database,
};

use super::{model, Error, RouteError};

fn page(owner: Option<Uuid>, viewer: Uuid, paginate: &model::Paginate) -> PostFilter {
	PostFilter {
		owner,
		viewer,
		limit: paginate.limit(),
		offset: paginate.offset(),
	}
}

fn window(owner: Option<Uuid>, viewer: Uuid, bounds: &model::Window) -> live::Posts {
	live::Posts {
		filter: PostFilter {
			owner,
			viewer,
			limit: bounds.limit,
			offset: 0,
		},
	}
}

/// Get all posts
/// Returns a paginated response of all posts, newest first.
#[route(tag = tag::POST)]
pub async fn get_posts(
	State(database): State<Database>,
	session: Session,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let posts = database
		.list_posts(page(None, session.user.id, &paginate))
		.await?;

	Ok(Json(posts))
}

/// Get own posts
/// Returns a paginated response of your posts, newest first.
#[route(tag = tag::POST)]
pub async fn get_own_posts(
	State(database): State<Database>,
	session: Session,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let posts = database
		.list_posts(page(Some(session.user.id), session.user.id, &paginate))
		.await?;

	Ok(Json(posts))
}

/// Get user posts
/// Returns a paginated response of the posts of a single user, newest first.
#[route(tag = tag::POST)]
pub async fn get_user_posts(
	State(database): State<Database>,
	session: Session,
	Path(user): Path<model::IdInput>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<model::Post>>, RouteError> {
	let posts = database
		.list_posts(page(Some(user.id), session.user.id, &paginate))
		.await?;

	Ok(Json(posts))
}

/// Get single post
/// Returns a single post by its unique id.
#[route(tag = tag::POST)]
pub async fn get_post(
	State(database): State<Database>,
	session: Session,
	Path(post): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	let found = database.get_post(post.id, session.user.id).await?;

	Ok(Json(found.ok_or(Error::UnknownPost(post.id))?))
}

/// Create post
/// Creates a new photo post. The photo must already be uploaded.
#[route(tag = tag::POST)]
pub async fn create_post(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::CreatePost>,
) -> Result<Json<model::Post>, RouteError> {
	let post = state
		.database
		.insert_post(NewPost {
			user_id: session.user.id,
			login: session.user.login,
			title: input.title.trim().to_owned(),
			photo: input.photo,
			location: input.location,
			region_name: input.region_name,
		})
		.await?;

	state.feed.publish(Change::Posts);

	tracing::info!(monotonic_counter.posts_created = 1, post = %post.id, "created post");

	Ok(Json(post))
}

/// Like post
/// Adds your like to a post. Liking a post twice counts once.
#[route(tag = tag::POST)]
pub async fn like_post(
	State(state): State<AppState>,
	session: Session,
	Path(post): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	set_like(&state, &session, post.id, true).await
}

/// Unlike post
/// Removes your like from a post.
#[route(tag = tag::POST)]
pub async fn unlike_post(
	State(state): State<AppState>,
	session: Session,
	Path(post): Path<model::IdInput>,
) -> Result<Json<model::Post>, RouteError> {
	set_like(&state, &session, post.id, false).await
}

async fn set_like(
	state: &AppState,
	session: &Session,
	post_id: Uuid,
	liked: bool,
) -> Result<Json<model::Post>, RouteError> {
	let post = state
		.database
		.set_like(post_id, session.user.id, liked)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	state.feed.publish(Change::Posts);

	Ok(Json(post))
}

/// Watch all posts
/// A server-sent event stream of the newest posts, sent right away and again
/// after every change to any post.
#[route(tag = tag::POST)]
pub async fn watch_posts(
	State(state): State<AppState>,
	session: Session,
	Query(bounds): Query<model::Window>,
) -> EventStream {
	live::sse(
		state.feed.subscribe(
			state.database.clone(),
			window(None, session.user.id, &bounds),
		),
		false,
	)
}

/// Watch own posts
/// A server-sent event stream of the newest posts written by the signed-in
/// user.
#[route(tag = tag::POST)]
pub async fn watch_own_posts(
	State(state): State<AppState>,
	session: Session,
	Query(bounds): Query<model::Window>,
) -> EventStream {
	live::sse(
		state.feed.subscribe(
			state.database.clone(),
			window(Some(session.user.id), session.user.id, &bounds),
		),
		false,
	)
}

/// Watch user posts
/// A server-sent event stream of the newest posts written by the user. An
/// unknown user streams an empty list.
#[route(tag = tag::POST)]
pub async fn watch_user_posts(
	State(state): State<AppState>,
	session: Session,
	Path(user): Path<model::IdInput>,
	Query(bounds): Query<model::Window>,
) -> EventStream {
	live::sse(
		state.feed.subscribe(
			state.database.clone(),
			window(Some(user.id), session.user.id, &bounds),
		),
		false,
	)
}
