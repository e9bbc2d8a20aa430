//! The document store behind every route.
//!
//! [`MemoryStore`] keeps everything in process and is used for development
//! and tests; [`PgStore`] is backed by Postgres. Compound writes (a user with
//! their first session, a like with its counter, a comment with its counter)
//! are atomic in both.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use uuid::Uuid;

use crate::route::{
	auth::model::{Session, User},
	comment::model::Comment,
	post::model::{Location, Post},
};

/// A unique field that a write collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
	Email,
	Login,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unique constraint violated: {0:?}")]
	Conflict(Constraint),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub login: String,
	pub password: Vec<u8>,
	pub avatar: Option<String>,
}

#[derive(Debug)]
pub struct NewPost {
	pub user_id: Uuid,
	pub login: String,
	pub title: String,
	pub photo: String,
	pub location: Location,
	pub region_name: String,
}

#[derive(Debug)]
pub struct NewComment {
	pub post_id: Uuid,
	pub user_id: Uuid,
	pub login: String,
	pub avatar: Option<String>,
	pub comment: String,
}

/// Which posts to read, and for whom.
///
/// Posts are returned newest first.
#[derive(Debug, Clone, Copy)]
pub struct PostFilter {
	/// Only posts created by this user.
	pub owner: Option<Uuid>,
	/// The user that `like_status` is computed for.
	pub viewer: Uuid,
	pub limit: i64,
	pub offset: i64,
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
	/// Creates a user together with their first session.
	///
	/// Returns [`Error::Conflict`] without writing anything if the email or
	/// login is taken.
	async fn create_user(&self, user: NewUser) -> Result<(User, Session), Error>;

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;

	/// Replaces the user's avatar, returning the updated user.
	async fn update_avatar(&self, user_id: Uuid, avatar: Option<String>)
		-> Result<Option<User>, Error>;

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error>;

	/// Returns the user that owns the session, if the session still exists.
	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>, Error>;

	/// Returns `false` if there was no such session.
	async fn delete_session(&self, session_id: Uuid) -> Result<bool, Error>;

	async fn insert_post(&self, post: NewPost) -> Result<Post, Error>;

	async fn get_post(&self, post_id: Uuid, viewer: Uuid) -> Result<Option<Post>, Error>;

	async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, Error>;

	/// Adds or removes the user's like and adjusts the post's like counter
	/// in the same step. Liking twice (or unliking a post that is not liked)
	/// changes nothing.
	///
	/// Returns `None` if the post does not exist.
	async fn set_like(&self, post_id: Uuid, user_id: Uuid, liked: bool)
		-> Result<Option<Post>, Error>;

	/// Inserts a comment and increments the post's comment counter in the
	/// same step.
	///
	/// Returns `None` if the post does not exist.
	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error>;

	/// Returns the comments under a post, oldest first.
	async fn list_comments(
		&self,
		post_id: Uuid,
		limit: i64,
		offset: i64,
	) -> Result<Vec<Comment>, Error>;

	/// Returns the newest `limit` comments under a post, oldest first.
	async fn latest_comments(&self, post_id: Uuid, limit: i64) -> Result<Vec<Comment>, Error>;
}
