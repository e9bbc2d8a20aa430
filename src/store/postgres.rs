use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::{Constraint, Error, NewComment, NewPost, NewUser, PostFilter, Store};
use crate::route::{
	auth::model::{Session, User},
	comment::model::Comment,
	post::model::{Location, Post},
};

/// Selects posts with `like_status` computed for the user bound to `$1`.
const SELECT_POST: &str = r#"
	SELECT
		p.id, p.user_id, p.login, p.title, p.photo, p.latitude, p.longitude,
		p.region_name, p.likes_quantity, p.comments_quantity, p.created_at,
		EXISTS (
			SELECT 1 FROM post_like l WHERE l.post_id = p.id AND l.user_id = $1
		) AS like_status
	FROM post p
"#;

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
	Ok(Post {
		id: row.try_get("id")?,
		user_id: row.try_get("user_id")?,
		login: row.try_get("login")?,
		title: row.try_get("title")?,
		photo: row.try_get("photo")?,
		location: Location {
			latitude: row.try_get("latitude")?,
			longitude: row.try_get("longitude")?,
		},
		region_name: row.try_get("region_name")?,
		likes_quantity: row.try_get("likes_quantity")?,
		like_status: row.try_get("like_status")?,
		comments_quantity: row.try_get("comments_quantity")?,
		created_at: row.try_get("created_at")?,
	})
}

fn comment_from_row(row: &PgRow) -> Result<Comment, sqlx::Error> {
	Ok(Comment {
		id: row.try_get("id")?,
		post_id: row.try_get("post_id")?,
		user_id: row.try_get("user_id")?,
		login: row.try_get("login")?,
		avatar: row.try_get("avatar")?,
		comment: row.try_get("comment")?,
		created_at: row.try_get("created_at")?,
	})
}

/// A store backed by Postgres. Migrations are applied on connect.
#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	pub async fn connect(url: &str) -> Result<Self, Error> {
		let pool = PgPool::connect(url).await?;

		Self::migrate(pool).await
	}

	pub async fn migrate(pool: PgPool) -> Result<Self, Error> {
		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}
}

#[async_trait::async_trait]
impl Store for PgStore {
	#[tracing::instrument(skip_all, fields(user = %user.id))]
	async fn create_user(&self, user: NewUser) -> Result<(User, Session), Error> {
		let mut tx = self.pool.begin().await?;

		let user = sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, email, login, password, avatar)
				VALUES ($1, $2, $3, $4, $5)
				RETURNING *
			"#,
		)
		.bind(user.id)
		.bind(&user.email)
		.bind(&user.login)
		.bind(&user.password)
		.bind(&user.avatar)
		.fetch_one(&mut *tx)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) => match d.constraint() {
				Some("user_email_key") => Error::Conflict(Constraint::Email),
				Some("user_login_key") => Error::Conflict(Constraint::Login),
				_ => Error::Database(e),
			},
			e => Error::Database(e),
		})?;

		let session = sqlx::query_as::<_, Session>(
			"INSERT INTO session (id, user_id) VALUES ($1, $2) RETURNING *",
		)
		.bind(Uuid::new_v4())
		.bind(user.id)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok((user, session))
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn update_avatar(
		&self,
		user_id: Uuid,
		avatar: Option<String>,
	) -> Result<Option<User>, Error> {
		Ok(sqlx::query_as::<_, User>(
			r#"UPDATE "user" SET avatar = $1 WHERE id = $2 RETURNING *"#,
		)
		.bind(avatar)
		.bind(user_id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session, Error> {
		Ok(sqlx::query_as::<_, Session>(
			"INSERT INTO session (id, user_id) VALUES ($1, $2) RETURNING *",
		)
		.bind(Uuid::new_v4())
		.bind(user_id)
		.fetch_one(&self.pool)
		.await?)
	}

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>, Error> {
		Ok(sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<bool, Error> {
		let result = sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip_all, fields(user = %post.user_id))]
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

		sqlx::query(
			r#"
				INSERT INTO post (
					id, user_id, login, title, photo, latitude, longitude, region_name, created_at
				)
				VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
			"#,
		)
		.bind(post.id)
		.bind(post.user_id)
		.bind(&post.login)
		.bind(&post.title)
		.bind(&post.photo)
		.bind(post.location.latitude)
		.bind(post.location.longitude)
		.bind(&post.region_name)
		.bind(post.created_at)
		.execute(&self.pool)
		.await?;

		Ok(post)
	}

	async fn get_post(&self, post_id: Uuid, viewer: Uuid) -> Result<Option<Post>, Error> {
		let row = sqlx::query(&format!("{SELECT_POST} WHERE p.id = $2"))
			.bind(viewer)
			.bind(post_id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(row.as_ref().map(post_from_row).transpose()?)
	}

	async fn list_posts(&self, filter: PostFilter) -> Result<Vec<Post>, Error> {
		let rows = sqlx::query(&format!(
			r#"
				{SELECT_POST}
				WHERE $2::uuid IS NULL OR p.user_id = $2
				ORDER BY p.created_at DESC, p.id DESC
				LIMIT $3 OFFSET $4
			"#
		))
		.bind(filter.viewer)
		.bind(filter.owner)
		.bind(filter.limit)
		.bind(filter.offset)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.iter()
			.map(post_from_row)
			.collect::<Result<Vec<_>, _>>()?)
	}

	#[tracing::instrument(skip(self))]
	async fn set_like(
		&self,
		post_id: Uuid,
		user_id: Uuid,
		liked: bool,
	) -> Result<Option<Post>, Error> {
		let mut tx = self.pool.begin().await?;

		// locks the post row until commit
		let exists = sqlx::query("SELECT id FROM post WHERE id = $1 FOR UPDATE")
			.bind(post_id)
			.fetch_optional(&mut *tx)
			.await?
			.is_some();

		if !exists {
			return Ok(None);
		}

		let query = if liked {
			"INSERT INTO post_like (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
		} else {
			"DELETE FROM post_like WHERE post_id = $1 AND user_id = $2"
		};

		let changed = sqlx::query(query)
			.bind(post_id)
			.bind(user_id)
			.execute(&mut *tx)
			.await?
			.rows_affected();

		if changed > 0 {
			sqlx::query("UPDATE post SET likes_quantity = likes_quantity + $2 WHERE id = $1")
				.bind(post_id)
				.bind(if liked { 1_i64 } else { -1_i64 })
				.execute(&mut *tx)
				.await?;
		}

		let row = sqlx::query(&format!("{SELECT_POST} WHERE p.id = $2"))
			.bind(user_id)
			.bind(post_id)
			.fetch_one(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(Some(post_from_row(&row)?))
	}

	#[tracing::instrument(skip_all, fields(post = %comment.post_id))]
	async fn insert_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let mut tx = self.pool.begin().await?;

		let updated = sqlx::query(
			"UPDATE post SET comments_quantity = comments_quantity + 1 WHERE id = $1",
		)
		.bind(comment.post_id)
		.execute(&mut *tx)
		.await?
		.rows_affected();

		if updated == 0 {
			return Ok(None);
		}

		let row = sqlx::query(
			r#"
				INSERT INTO comment (id, post_id, user_id, login, avatar, comment)
				VALUES ($1, $2, $3, $4, $5, $6)
				RETURNING *
			"#,
		)
		.bind(Uuid::new_v4())
		.bind(comment.post_id)
		.bind(comment.user_id)
		.bind(&comment.login)
		.bind(&comment.avatar)
		.bind(&comment.comment)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(Some(comment_from_row(&row)?))
	}

	async fn list_comments(
		&self,
		post_id: Uuid,
		limit: i64,
		offset: i64,
	) -> Result<Vec<Comment>, Error> {
		let rows = sqlx::query(
			r#"
				SELECT * FROM comment
				WHERE post_id = $1
				ORDER BY created_at ASC, id ASC
				LIMIT $2 OFFSET $3
			"#,
		)
		.bind(post_id)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.iter()
			.map(comment_from_row)
			.collect::<Result<Vec<_>, _>>()?)
	}

	async fn latest_comments(&self, post_id: Uuid, limit: i64) -> Result<Vec<Comment>, Error> {
		let rows = sqlx::query(
			r#"
				SELECT * FROM (
					SELECT * FROM comment
					WHERE post_id = $1
					ORDER BY created_at DESC, id DESC
					LIMIT $2
				) latest
				ORDER BY created_at ASC, id ASC
			"#,
		)
		.bind(post_id)
		.bind(limit)
		.fetch_all(&self.pool)
		.await?;

		Ok(rows
			.iter()
			.map(comment_from_row)
			.collect::<Result<Vec<_>, _>>()?)
	}
}

#[cfg(test)]
mod test {
	use sqlx::PgPool;
	use uuid::Uuid;

	use super::PgStore;
	use crate::{
		route::post::model::Location,
		store::{Constraint, Error, NewComment, NewPost, NewUser, Store},
	};

	fn new_user(email: &str, login: &str) -> NewUser {
		NewUser {
			id: Uuid::new_v4(),
			email: email.into(),
			login: login.into(),
			password: vec![0; 32],
			avatar: None,
		}
	}

	#[sqlx::test(migrations = false)]
	#[ignore = "requires DATABASE_URL"]
	async fn test_signup_conflict_and_counters(pool: PgPool) {
		let store = PgStore::migrate(pool).await.unwrap();
		let (user, session) = store
			.create_user(new_user("john@smith.com", "john"))
			.await
			.unwrap();

		assert_eq!(session.user_id, user.id);
		assert_eq!(
			store.session_user(session.id).await.unwrap().unwrap().id,
			user.id
		);

		let result = store
			.create_user(new_user("john@smith.com", "johnny"))
			.await;

		assert!(matches!(result, Err(Error::Conflict(Constraint::Email))));

		let post = store
			.insert_post(NewPost {
				user_id: user.id,
				login: user.login.clone(),
				title: "Sunset".into(),
				photo: "http://127.0.0.1:3000/media/postImage/x".into(),
				location: Location {
					latitude: 50.45,
					longitude: 30.52,
				},
				region_name: "Kyiv".into(),
			})
			.await
			.unwrap();

		let liked = store.set_like(post.id, user.id, true).await.unwrap().unwrap();

		assert_eq!(liked.likes_quantity, 1);
		assert!(liked.like_status);

		let unliked = store.set_like(post.id, user.id, false).await.unwrap().unwrap();

		assert_eq!(unliked.likes_quantity, 0);

		store
			.insert_comment(NewComment {
				post_id: post.id,
				user_id: user.id,
				login: user.login.clone(),
				avatar: None,
				comment: "Beautiful".into(),
			})
			.await
			.unwrap()
			.unwrap();

		let post = store.get_post(post.id, user.id).await.unwrap().unwrap();

		assert_eq!(post.comments_quantity, 1);
		assert_eq!(store.list_comments(post.id, 10, 0).await.unwrap().len(), 1);

		for comment in ["Stunning", "Where is this?"] {
			store
				.insert_comment(NewComment {
					post_id: post.id,
					user_id: user.id,
					login: user.login.clone(),
					avatar: None,
					comment: comment.into(),
				})
				.await
				.unwrap()
				.unwrap();
		}

		let latest = store.latest_comments(post.id, 2).await.unwrap();

		assert_eq!(latest[0].comment, "Stunning");
		assert_eq!(latest[1].comment, "Where is this?");
	}
}
