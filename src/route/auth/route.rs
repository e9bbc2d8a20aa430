use aide::axum::IntoApiResponse;
use argon2::Argon2;
use axum::{
	extract::State,
	http::{header, StatusCode},
};
use macros::route;
use uuid::Uuid;

use crate::{
	extract::{Json, Session},
	live::{self, Change, EventStream},
	openapi::tag,
	session,
	store::{self, Constraint, NewUser},
	AppState,
};

use super::{model, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Emails are compared case-insensitively.
fn normalize_email(email: &str) -> String {
	email.trim().to_lowercase()
}

/// Log in
/// Logs in to an account, returning an associated session cookie and token.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in successfully.", shape = "Json<model::Session>"))]
pub async fn login(
	State(state): State<AppState>,
	Json(auth): Json<model::LoginInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user = state
		.database
		.find_user_by_email(&normalize_email(&auth.email))
		.await?;

	let Some(user) = user else {
		return Err(Error::InvalidEmailOrPassword.into());
	};

	let hashed = hash_password(&state.hasher, &auth.password, &user.id).map_err(Error::Argon)?;

	if user.password != hashed {
		return Err(Error::InvalidEmailOrPassword.into());
	}

	let session = state.database.create_session(user.id).await?;
	let cookie = session::create_cookie(session.id);

	tracing::info!(user = %user.id, "logged in");

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Log out
/// Logs out of the authenticated account and ends every live auth state stream of the session.
#[route(tag = tag::AUTH, response(status = 204, description = "Logged out successfully."))]
pub async fn logout(
	State(state): State<AppState>,
	session: Session,
) -> Result<impl IntoApiResponse, RouteError> {
	state.database.delete_session(session.id).await?;
	state.feed.publish(Change::Session(session.id));

	// Clear the session cookie
	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		StatusCode::NO_CONTENT,
	))
}

/// Register account
/// Registers a new account, returning an associated session cookie and token. Nothing is written if the email or login is taken.
#[route(tag = tag::AUTH, response(status = 200, description = "Registered successfully.", shape = "Json<model::Session>"))]
pub async fn register(
	State(state): State<AppState>,
	Json(auth): Json<model::RegisterInput>,
) -> Result<impl IntoApiResponse, RouteError> {
	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &auth.password, &user_id).map_err(Error::Argon)?;

	let (user, session) = state
		.database
		.create_user(NewUser {
			id: user_id,
			email: normalize_email(&auth.email),
			login: auth.login,
			password: hashed.to_vec(),
			avatar: auth.avatar,
		})
		.await
		.map_err(|e| match e {
			store::Error::Conflict(Constraint::Email) => Error::EmailTaken.into(),
			store::Error::Conflict(Constraint::Login) => Error::LoginTaken.into(),
			e => RouteError::from(e),
		})?;

	tracing::info!(monotonic_counter.users_registered = 1, user = %user.id, "registered");

	let cookie = session::create_cookie(session.id);

	Ok(([(header::SET_COOKIE, cookie.to_string())], Json(session)))
}

/// Get user
/// Returns the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

/// Update user
/// Replaces the avatar of the authenticated user.
#[route(tag = tag::AUTH)]
pub async fn update_me(
	State(state): State<AppState>,
	session: Session,
	Json(input): Json<model::UpdateUserInput>,
) -> Result<Json<model::User>, RouteError> {
	let user = state
		.database
		.update_avatar(session.user.id, input.avatar)
		.await?
		.ok_or(Error::InvalidSession)?;

	state.feed.publish(Change::User(user.id));

	Ok(Json(user))
}

/// Watch auth state
/// A server-sent event stream of the signed-in user. The current user is sent
/// right away and again after every profile change. Once the session is signed
/// out, `null` is sent and the stream ends.
#[route(tag = tag::AUTH)]
pub async fn auth_state(State(state): State<AppState>, session: Session) -> EventStream {
	live::sse(
		state.feed.subscribe(
			state.database.clone(),
			live::AuthState {
				session_id: session.id,
				user_id: session.user.id,
			},
		),
		true,
	)
}
