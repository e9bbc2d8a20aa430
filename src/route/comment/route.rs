use axum::extract::State;
use macros::route;

use crate::{
	extract::{Json, Path, Query, Session},
	live::{self, Change, EventStream},
	openapi::tag,
	store::NewComment,
	AppState,
};

use super::{model, Error, RouteError};

/// Get comments
/// Returns a paginated response of the comments under a post, oldest first.
#[route(tag = tag::COMMENT)]
pub async fn get_comments(
	State(state): State<AppState>,
	session: Session,
	Path(post): Path<model::IdInput>,
	Query(paginate): Query<model::Paginate>,
) -> Result<Json<Vec<model::Comment>>, RouteError> {
	if state
		.database
		.get_post(post.id, session.user.id)
		.await?
		.is_none()
	{
		return Err(Error::UnknownPost(post.id).into());
	}

	let comments = state
		.database
		.list_comments(post.id, paginate.limit(), paginate.offset())
		.await?;

	Ok(Json(comments))
}

/// Create comment
/// Writes a comment under a post as the authenticated user.
#[route(tag = tag::COMMENT)]
pub async fn create_comment(
	State(state): State<AppState>,
	session: Session,
	Path(post): Path<model::IdInput>,
	Json(input): Json<model::CreateComment>,
) -> Result<Json<model::Comment>, RouteError> {
	let comment = state
		.database
		.insert_comment(NewComment {
			post_id: post.id,
			user_id: session.user.id,
			login: session.user.login,
			avatar: session.user.avatar,
			comment: input.comment.trim().to_owned(),
		})
		.await?
		.ok_or(Error::UnknownPost(post.id))?;

	state.feed.publish(Change::Comments(post.id));
	// the comment counter of the post changed too
	state.feed.publish(Change::Posts);

	tracing::info!(monotonic_counter.comments_created = 1, post = %post.id, "created comment");

	Ok(Json(comment))
}

/// Watch comments
/// A server-sent event stream of the newest comments under a post, oldest
/// first, sent right away and again after every new comment.
#[route(tag = tag::COMMENT)]
pub async fn watch_comments(
	State(state): State<AppState>,
	session: Session,
	Path(post): Path<model::IdInput>,
	Query(bounds): Query<model::Window>,
) -> Result<EventStream, RouteError> {
	if state
		.database
		.get_post(post.id, session.user.id)
		.await?
		.is_none()
	{
		return Err(Error::UnknownPost(post.id).into());
	}

	Ok(live::sse(
		state.feed.subscribe(
			state.database.clone(),
			live::Comments {
				post_id: post.id,
				limit: bounds.limit,
			},
		),
		false,
	))
}
