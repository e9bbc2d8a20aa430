use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Constraint, Error, NewComment, NewPost, NewUser, PostFilter, Store};
use crate::route::{
	auth::model::{Session, User},
	comment::model::Comment,
	post::model::Post,
};

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	/// In insertion order, so newest is last.
	posts: Vec<Post>,
	/// `(post_id, user_id)`
	likes: HashSet<(Uuid, Uuid)>,
	/// In insertion order, so oldest is first.
	comments: Vec<Comment>,
}

impl Tables {
	fn post_for(&self, post: &Post, viewer: Uuid) -> Post {
		Post {
			like_status: self.likes.contains(&(post.id, viewer)),
			..post.clone()
		}
	}
}

fn window(limit: i64, offset: i64) -> (usize, usize) {
	(
		usize::try_from(limit).unwrap_or(0),
		usize::try_from(offset).unwrap_or(0),
	)
}

/// A store that keeps every table behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Overwrites a post's like counter with a value computed by the caller,
	/// the way a client holding a stale snapshot would.
	#[cfg(test)]
	pub async fn overwrite_likes_quantity(&self, post_id: Uuid, likes_quantity: i64) {
		let mut tables = self.tables.write().await;

		if let Some(post) = tables.posts.iter_mut().find(|post| post.id == post_id) {
			post.likes_quantity = likes_quantity;
		}
	}

	#[cfg(test)]
	pub async fn counts(&self) -> (usize, usize, usize, usize) {
		let tables = self.tables.read().await;

		(
			tables.users.len(),
			tables.sessions.len(),
			tables.posts.len(),
			tables.comments.len(),
		)
	}
}

#[async_trait::async_trait]
impl Store for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<(User, Session), Error> {
		let mut tables = self.tables.write().await;

		if tables.users.values().any(|u| u.email == user.email) {
			return Err(Error::Conflict(Constraint::Email));
		}

		if tables.users.values().any(|u| u.login == user.login) {
			return Err(Error::Conflict(Constraint::Login));
		}

		let now = Utc::now();
		let user = User {
			id: user.id,
			email: user.email,
			password: user.password,
			login: user.login,
			avatar: user.avatar,
			created_at: now,
		};
		let session = Session {
			id: Uuid::new_v4(),
			user_id: user.id,
			created_at: now,
		};

		tables.users.insert(user.id, user.clone());
		tables.sessions.insert(session.id, session.clone());

		Ok((user, session))
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		let tables = self.tables.read().await;

		Ok(tables.users.values().find(|u| u.email == email).cloned())
	}

	async fn update_avatar(
		&self,
		user_id: Uuid,
		avatar: Option<String>,
	) -> Result<Option<User>, Error> {
		let mut tables = self.tables.write().await;

		Ok(tables.users.get_mut(&user_id).map(|user| {
			user.avatar = avatar;
			user.clone()
		}))
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: Utc::now(),
		};

		self.tables
			.write()
			.await
			.sessions
			.insert(session.id, session.clone());

		Ok(session)
	}

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.sessions
			.get(&session_id)
			.and_then(|session| tables.users.get(&session.user_id))
			.cloned())
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<bool, Error> {
		Ok(self
			.tables
			.write()
			.await
			.sessions
			.remove(&session_id)
			.is_some())
	}

	async fn insert_post(&self, post: NewPost) -> Result<Post, Error> {
		let post = Post {
			id: Uuid::new_v4(),
			user_id: post.user_id,
			login: post.login,
			title: post.title,
			photo: post.photo,
			location: post.location,
			region_name: post.region_name,
			likes_quantity: 0,
			like_status: false,
			comments_quantity: 0,
			created_at: Utc::now(),
		};

		self.tables.write().await.posts.push(post.clone());

		Ok(post)
	}

	async fn get_post(&self, post_id: Uuid, viewer: Uuid) -> Result<Option<Post>, Error> {
		let tables = self.tables.read().await;

		Ok(tables
			.posts
			.iter()
			.find(|post| post.id == post_id)
			.map(|post| tables.post_for(post, viewer)))
	}

	async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, Error> {
		let tables = self.tables.read().await;
		let (limit, offset) = window(filter.limit, filter.offset);

		Ok(tables
			.posts
			.iter()
			.rev()
			.filter(|post| filter.owner.map_or(true, |owner| post.user_id == owner))
			.skip(offset)
			.take(limit)
			.map(|post| tables.post_for(post, filter.viewer))
			.collect())
	}

	async fn set_like(
		&self,
		post_id: Uuid,
		user_id: Uuid,
		liked: bool,
	) -> Result<Option<Post>, Error> {
		let mut tables = self.tables.write().await;

		let Some(index) = tables.posts.iter().position(|post| post.id == post_id) else {
			return Ok(None);
		};

		let changed = if liked {
			tables.likes.insert((post_id, user_id))
		} else {
			tables.likes.remove(&(post_id, user_id))
		};

		if changed {
			tables.posts[index].likes_quantity += if liked { 1 } else { -1 };
		}

		Ok(Some(tables.post_for(&tables.posts[index], user_id)))
	}

	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let mut tables = self.tables.write().await;

		let Some(post) = tables
			.posts
			.iter_mut()
			.find(|post| post.id == comment.post_id)
		else {
			return Ok(None);
		};

		post.comments_quantity += 1;

		let comment = Comment {
			id: Uuid::new_v4(),
			post_id: comment.post_id,
			user_id: comment.user_id,
			login: comment.login,
			avatar: comment.avatar,
			comment: comment.comment,
			created_at: Utc::now(),
		};

		tables.comments.push(comment.clone());

		Ok(Some(comment))
	}

	async fn list_comments(
		&self,
		post_id: Uuid,
		limit: i64,
		offset: i64,
	) -> Result<Vec<Comment>, Error> {
		let tables = self.tables.read().await;
		let (limit, offset) = window(limit, offset);

		Ok(tables
			.comments
			.iter()
			.filter(|comment| comment.post_id == post_id)
			.skip(offset)
			.take(limit)
			.cloned()
			.collect())
	}

	async fn latest_comments(&self, post_id: Uuid, limit: i64) -> Result<Vec<Comment>, Error> {
		let tables = self.tables.read().await;
		let (limit, _) = window(limit, 0);

		let mut comments = tables
			.comments
			.iter()
			.rev()
			.filter(|comment| comment.post_id == post_id)
			.take(limit)
			.cloned()
			.collect::<Vec<_>>();

		comments.reverse();

		Ok(comments)
	}
}
