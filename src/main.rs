#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod live;
mod media;
mod openapi;
mod ratelimit;
mod route;
mod session;
mod store;
mod trace;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use aide::{axum::ApiRouter, openapi::OpenApi};
use argon2::Argon2;
use axum::{
	body::Body,
	extract::{DefaultBodyLimit, FromRef},
	http::{Request, Response},
	Extension, Router, ServiceExt,
};
use tower::Layer;
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::config::Config;

pub type Database = Arc<dyn store::Store>;
pub type Media = Arc<dyn media::MediaStore>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store, the change feed, or a hash configuration (since it's
/// expensive to create).
#[derive(Clone, FromRef)]
pub struct State {
	pub database: Database,
	pub media: Media,
	pub feed: live::Feed,
	pub hasher: Argon2<'static>,
	pub config: Arc<Config>,
}

impl State {
	/// Connects to the configured backends, falling back to memory for any
	/// that are not configured.
	pub async fn from_config(config: Config) -> Result<Self, store::Error> {
		let database: Database = if let Some(url) = &config.database_url {
			Arc::new(store::PgStore::connect(url).await?)
		} else {
			tracing::warn!("DATABASE_URL is not set, users and posts are kept in memory");
			Arc::new(store::MemoryStore::new())
		};

		let media: Media = if let Some(root) = &config.media_root {
			Arc::new(media::FsMediaStore::new(root))
		} else {
			tracing::warn!("MEDIA_ROOT is not set, uploads are kept in memory");
			Arc::new(media::MemoryMediaStore::new())
		};

		Ok(Self {
			database,
			media,
			feed: live::Feed::new(config.feed_capacity),
			hasher: Argon2::default(),
			config: Arc::new(config),
		})
	}
}

/// Builds the router with every route, the API documentation and the
/// middleware stack.
pub fn app(state: State) -> Router {
	let mut api = OpenApi::default();

	let limits = if state.config.rate_limit {
		let limits = ratelimit::default().zip(ratelimit::secure());

		if let Some((default, secure)) = &limits {
			ratelimit::cleanup_old_limits(&[default, secure]);
		} else {
			tracing::warn!("invalid rate limit quota, rate limiting is disabled");
		}

		limits
	} else {
		None
	};

	let mut auth = route::auth::routes();

	if let Some((_, secure)) = &limits {
		auth = auth.layer(GovernorLayer {
			config: secure.clone(),
		});
	}

	let router = ApiRouter::new()
		.nest("/auth", auth)
		.nest(
			"/media",
			route::media::routes().layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
		)
		.merge(route::post::routes())
		.merge(route::comment::routes())
		.nest("/docs", route::docs::routes())
		.finish_api_with(&mut api, openapi::docs)
		.layer(Extension(Arc::new(api)));

	let router = if let Some((default, _)) = limits {
		router.layer(GovernorLayer { config: default })
	} else {
		router
	};

	router
		.layer(CompressionLayer::new())
		.layer(CorsLayer::permissive())
		.layer(
			TraceLayer::new_for_http().on_response(
				|response: &Response<_>, latency: Duration, _span: &tracing::Span| {
					tracing::info!(
						histogram.latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
						status = response.status().as_u16(),
						"finished request"
					);
				},
			),
		)
		.layer(PropagateRequestIdLayer::x_request_id())
		.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
		.with_state(state)
}

#[derive(Debug, thiserror::Error)]
enum Error {
	#[error("invalid configuration: {0}")]
	Config(#[from] envy::Error),
	#[error("failed to initialize tracing: {0}")]
	Trace(#[from] trace::Error),
	#[error("failed to open store: {0}")]
	Store(#[from] store::Error),
	#[error("server error: {0}")]
	Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
	let config = Config::from_env()?;
	let _guard = trace::init(&config)?;

	let address = SocketAddr::from((config.host, config.port));
	let state = State::from_config(config).await?;

	let app = NormalizePathLayer::trim_trailing_slash().layer(app(state));
	let listener = tokio::net::TcpListener::bind(address).await?;

	tracing::info!("listening on {}", address);

	axum::serve(
		listener,
		ServiceExt::<Request<Body>>::into_make_service_with_connect_info::<SocketAddr>(app),
	)
	.await?;

	Ok(())
}
