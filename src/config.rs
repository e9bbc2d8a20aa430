use std::{net::IpAddr, path::PathBuf};

use serde::Deserialize;

fn default_host() -> IpAddr {
	IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
	3000
}

fn default_public_url() -> String {
	"http://127.0.0.1:3000".into()
}

fn default_feed_capacity() -> usize {
	256
}

fn default_max_upload_bytes() -> usize {
	10 * 1024 * 1024
}

fn default_log() -> String {
	"info".into()
}

fn yes() -> bool {
	true
}

/// Runtime configuration, read from the environment (and `.env`, if present).
///
/// Every variable is optional. Without `DATABASE_URL` posts and users live in
/// memory, and without `MEDIA_ROOT` so do uploaded photos.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default = "default_host")]
	pub host: IpAddr,
	#[serde(default = "default_port")]
	pub port: u16,
	/// Postgres connection string.
	pub database_url: Option<String>,
	/// Directory that uploaded objects are written to.
	pub media_root: Option<PathBuf>,
	/// The externally reachable base URL, used to build durable media URLs.
	#[serde(default = "default_public_url")]
	pub public_url: String,
	/// How many change notifications a slow listener may fall behind by
	/// before it skips ahead to a fresh snapshot.
	#[serde(default = "default_feed_capacity")]
	pub feed_capacity: usize,
	#[serde(default = "default_max_upload_bytes")]
	pub max_upload_bytes: usize,
	#[serde(default = "yes")]
	pub rate_limit: bool,
	/// A `tracing_subscriber::EnvFilter` directive.
	#[serde(default = "default_log")]
	pub log: String,
	/// Export traces and metrics over OTLP.
	#[serde(default)]
	pub otel: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, envy::Error> {
		dotenvy::dotenv().ok();
		envy::from_env()
	}

	/// The durable URL an object is served from.
	pub fn media_url(&self, key: &crate::media::ObjectKey) -> String {
		format!("{}/media/{key}", self.public_url.trim_end_matches('/'))
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			database_url: None,
			media_root: None,
			public_url: default_public_url(),
			feed_capacity: default_feed_capacity(),
			max_upload_bytes: default_max_upload_bytes(),
			rate_limit: true,
			log: default_log(),
			otel: false,
		}
	}
}

#[cfg(test)]
mod test {
	use uuid::Uuid;

	use crate::media::{Namespace, ObjectKey};

	#[test]
	fn test_media_url() {
		let config = super::Config {
			public_url: "https://photos.example.com/".into(),
			..Default::default()
		};
		let id = Uuid::nil();

		assert_eq!(
			config.media_url(&ObjectKey::new(Namespace::PostImage, id)),
			format!("https://photos.example.com/media/postImage/{id}")
		);
	}
}
