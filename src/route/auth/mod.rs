use aide::axum::{
	routing::{get_with, post_with},
	ApiRouter,
};
use axum::http::StatusCode;

use crate::{error, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
	#[error("no session cookie or bearer token")]
	NoSession,
	#[error("invalid session")]
	InvalidSession,
	#[error("email already taken")]
	EmailTaken,
	#[error("login already taken")]
	LoginTaken,
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
		.api_route("/login", post_with(login, login_docs))
		.api_route("/logout", get_with(logout, logout_docs))
		.api_route("/register", post_with(register, register_docs))
		.api_route(
			"/me",
			get_with(get_me, get_me_docs).put_with(update_me, update_me_docs),
		)
		.api_route("/state", get_with(auth_state, auth_state_docs))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword | Self::NoSession | Self::InvalidSession => {
				StatusCode::UNAUTHORIZED
			}
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::EmailTaken | Self::LoginTaken => StatusCode::CONFLICT,
		}
	}

	fn errors(&self) -> Vec<error::Message> {
		match self {
			// never describe hashing failures to the client
			Self::Argon(..) => Vec::new(),
			_ => error::Message::new(self.to_string()).into_vec(),
		}
	}
}
