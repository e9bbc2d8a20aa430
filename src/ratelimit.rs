use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

use crate::error::AppError;

pub type Config = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// The limit for every route.
///
/// Returns `None` if the quota is invalid.
pub fn default() -> Option<Config> {
	GovernorConfigBuilder::default()
		.per_second(10)
		.burst_size(50)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

/// The limit for routes that hash passwords.
pub fn secure() -> Option<Config> {
	GovernorConfigBuilder::default()
		.per_second(1)
		.burst_size(5)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	AppError::from(error).into_response()
}

/// Periodically forgets clients that have not been limited recently,
/// so the limiter storage does not grow forever.
pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}

#[cfg(test)]
mod test {
	#[test]
	fn test_quotas_are_valid() {
		assert!(super::default().is_some());
		assert!(super::secure().is_some());
	}
}
