//! Live subscriptions.
//!
//! Every write publishes a [`Change`] on the [`Feed`]. A [`Subscription`]
//! listens to the feed and, whenever a change touches what it watches,
//! reads a complete, fresh snapshot from the store. Snapshots are always
//! whole: a listener never has to merge partial updates.
//!
//! A subscription holds one broadcast receiver and releases it when dropped,
//! so a client that disconnects stops costing anything.

use std::{convert::Infallible, sync::Arc};

use aide::{
	gen::GenContext,
	openapi::{MediaType, Operation},
	OperationOutput,
};
use axum::response::{
	sse::{Event, KeepAlive, Sse},
	IntoResponse, Response,
};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::{
	route::{auth::model::User, comment::model::Comment, post::model::Post},
	store::{self, PostFilter, Store},
};

/// What changed in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
	/// A post was created, or its counters changed.
	Posts,
	/// A comment was written under the post.
	Comments(Uuid),
	/// The user's profile changed.
	User(Uuid),
	/// The session was signed out.
	Session(Uuid),
}

/// The broadcast side of every subscription.
#[derive(Clone)]
pub struct Feed {
	sender: broadcast::Sender<Change>,
}

impl Feed {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));

		Self { sender }
	}

	pub fn publish(&self, change: Change) {
		// an error only means nobody is listening
		let listeners = self.sender.send(change).unwrap_or(0);

		tracing::debug!(?change, listeners, "published change");
	}

	pub fn subscribe<S: Snapshot>(&self, store: Arc<dyn Store>, snapshot: S) -> Subscription<S> {
		let receiver = self.sender.subscribe();

		tracing::debug!(listeners = self.listeners(), "subscribed");

		Subscription {
			receiver,
			store,
			snapshot,
			primed: false,
		}
	}

	/// The number of live subscriptions.
	pub fn listeners(&self) -> usize {
		self.sender.receiver_count()
	}
}

/// Something a subscription can watch.
#[async_trait::async_trait]
pub trait Snapshot: Send + Sync + 'static {
	type Output: Serialize + Send;

	/// Whether the change can make the last snapshot stale.
	fn affected_by(&self, change: &Change) -> bool;

	async fn load(&self, store: &dyn Store) -> Result<Self::Output, store::Error>;
}

/// The newest posts, optionally limited to one owner.
pub struct Posts {
	pub filter: PostFilter,
}

#[async_trait::async_trait]
impl Snapshot for Posts {
	type Output = Vec<Post>;

	fn affected_by(&self, change: &Change) -> bool {
		matches!(change, Change::Posts)
	}

	async fn load(&self, store: &dyn Store) -> Result<Self::Output, store::Error> {
		store.list_posts(self.filter).await
	}
}

/// The newest comments under a post, oldest first.
pub struct Comments {
	pub post_id: Uuid,
	pub limit: i64,
}

#[async_trait::async_trait]
impl Snapshot for Comments {
	type Output = Vec<Comment>;

	fn affected_by(&self, change: &Change) -> bool {
		*change == Change::Comments(self.post_id)
	}

	async fn load(&self, store: &dyn Store) -> Result<Self::Output, store::Error> {
		store.latest_comments(self.post_id, self.limit).await
	}
}

/// The user signed in with a session, or `None` once it is signed out.
pub struct AuthState {
	pub session_id: Uuid,
	pub user_id: Uuid,
}

#[async_trait::async_trait]
impl Snapshot for AuthState {
	type Output = Option<User>;

	fn affected_by(&self, change: &Change) -> bool {
		*change == Change::Session(self.session_id) || *change == Change::User(self.user_id)
	}

	async fn load(&self, store: &dyn Store) -> Result<Self::Output, store::Error> {
		store.session_user(self.session_id).await
	}
}

pub struct Subscription<S> {
	receiver: broadcast::Receiver<Change>,
	store: Arc<dyn Store>,
	snapshot: S,
	primed: bool,
}

impl<S: Snapshot> Subscription<S> {
	/// Waits for the next snapshot.
	///
	/// The first call returns immediately with the current state. Later calls
	/// wait for a relevant change. A subscription that fell behind the feed
	/// skips what it missed and gets one fresh snapshot. Returns `None` once
	/// the feed is gone.
	pub async fn next(&mut self) -> Option<Result<S::Output, store::Error>> {
		if self.primed {
			loop {
				match self.receiver.recv().await {
					Ok(change) if self.snapshot.affected_by(&change) => break,
					Ok(_) => continue,
					Err(RecvError::Lagged(skipped)) => {
						tracing::debug!(skipped, "subscription lagged, resending snapshot");
						break;
					}
					Err(RecvError::Closed) => return None,
				}
			}
		}

		self.primed = true;

		Some(self.snapshot.load(self.store.as_ref()).await)
	}
}

/// A server-sent event stream of snapshots.
pub struct EventStream(Response);

impl IntoResponse for EventStream {
	fn into_response(self) -> Response {
		self.0
	}
}

impl OperationOutput for EventStream {
	type Inner = Self;

	fn operation_response(
		_ctx: &mut GenContext,
		_operation: &mut Operation,
	) -> Option<aide::openapi::Response> {
		let mut response = aide::openapi::Response {
			description: "A stream of `snapshot` events, each holding the complete current \
				value as JSON. A failed read is sent as an `error` event."
				.into(),
			..Default::default()
		};

		response
			.content
			.insert("text/event-stream".into(), MediaType::default());

		Some(response)
	}

	fn inferred_responses(
		ctx: &mut GenContext,
		operation: &mut Operation,
	) -> Vec<(Option<u16>, aide::openapi::Response)> {
		Self::operation_response(ctx, operation)
			.map(|response| vec![(Some(200), response)])
			.unwrap_or_default()
	}
}

/// Streams snapshots as server-sent events named `snapshot`.
///
/// A failed read is logged and sent as an `error` event; the stream keeps
/// going. With `until_none`, the stream ends after the first snapshot that
/// serializes to `null`.
pub fn sse<S>(mut subscription: Subscription<S>, until_none: bool) -> EventStream
where
	S: Snapshot,
{
	let stream = async_stream::stream! {
		while let Some(result) = subscription.next().await {
			match result {
				Ok(snapshot) => {
					let value = match serde_json::to_value(&snapshot) {
						Ok(value) => value,
						Err(e) => {
							tracing::warn!(error = %e, "failed to serialize snapshot");
							yield Ok::<_, Infallible>(
								Event::default().event("error").data("snapshot_failed"),
							);
							continue;
						}
					};
					let done = until_none && value.is_null();

					yield Ok(Event::default().event("snapshot").data(value.to_string()));

					if done {
						break;
					}
				}
				Err(e) => {
					tracing::warn!(error = %e, "failed to load snapshot");
					yield Ok(Event::default().event("error").data("snapshot_failed"));
				}
			}
		}
	};

	EventStream(Sse::new(stream).keep_alive(KeepAlive::default()).into_response())
}
