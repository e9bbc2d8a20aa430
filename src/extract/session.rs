use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	error::RouteError,
	openapi::{SECURITY_SCHEME_BEARER, SECURITY_SCHEME_SESSION},
	route::auth,
	session, Database,
};

pub const AUTHORIZATION_PREFIX: &str = "Bearer ";

/// Extracts the session and related user from the request.
///
/// The session token is read from the `Authorization: Bearer` header if
/// present, otherwise from the session cookie.
///
/// If neither exists, a [`auth::Error::NoSession`] is returned.
/// If the session is invalid or signed out, a [`auth::Error::InvalidSession`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: auth::model::User,
}

fn token(parts: &request::Parts) -> Result<Uuid, auth::Error> {
	if let Some(value) = parts.headers.get(header::AUTHORIZATION) {
		let token = value
			.to_str()
			.ok()
			.and_then(|value| value.strip_prefix(AUTHORIZATION_PREFIX))
			.ok_or(auth::Error::InvalidSession)?;

		return Uuid::parse_str(token.trim()).map_err(|_| auth::Error::InvalidSession);
	}

	let cookie = parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.ok_or(auth::Error::NoSession)?;

	Uuid::parse_str(cookie.value()).map_err(|_| auth::Error::InvalidSession)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let id = token(parts)?;
		let database = Database::from_ref(state);

		let user = database
			.session_user(id)
			.await?
			.ok_or(auth::Error::InvalidSession)?;

		Ok(Session { id, user })
	}
}

impl OperationInput for Session {
	/// Operation input for the session extractor.
	///
	/// This adds a session requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.extend([
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			[(SECURITY_SCHEME_BEARER.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		]);
	}
}

#[cfg(test)]
mod test {
	use axum::http::{header, Request};
	use uuid::Uuid;

	use super::token;
	use crate::route::auth;

	fn parts(name: header::HeaderName, value: &str) -> axum::http::request::Parts {
		Request::builder()
			.header(name, value)
			.body(())
			.unwrap()
			.into_parts()
			.0
	}

	#[test]
	fn test_bearer_token() {
		let id = Uuid::new_v4();
		let parts = parts(header::AUTHORIZATION, &format!("Bearer {id}"));

		assert_eq!(token(&parts).unwrap(), id);
	}

	#[test]
	fn test_cookie_token() {
		let id = Uuid::new_v4();
		let parts = parts(header::COOKIE, &format!("theme=dark; session={id}"));

		assert_eq!(token(&parts).unwrap(), id);
	}

	#[test]
	fn test_missing_and_malformed_tokens() {
		let parts_without = Request::builder().body(()).unwrap().into_parts().0;

		assert!(matches!(token(&parts_without), Err(auth::Error::NoSession)));
		assert!(matches!(
			token(&parts(header::AUTHORIZATION, "Basic abc")),
			Err(auth::Error::InvalidSession)
		));
		assert!(matches!(
			token(&parts(header::COOKIE, "session=not-a-uuid")),
			Err(auth::Error::InvalidSession)
		));
	}
}
