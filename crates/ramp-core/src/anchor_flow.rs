//! Anchor session upkeep for redemption rails.
//!
//! Two long-lived concerns live here. The URL refresher re-opens the
//! interactive session on an interval so the link the user eventually
//! clicks has not gone stale, publishing the freshest session on a watch
//! channel. The confirmation stream polls the anchor until it reports the
//! settlement the user committed to; the caller feeds that confirmation
//! into the precondition gate. Both stop on drop, on `stop()`, and with
//! the attempt they belong to.

use ramp_services::{AnchorApi, AnchorError};
use ramp_types::{AnchorConfirmation, AnchorSession};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::Stream;

/// Periodically refreshed interactive anchor session.
pub struct AnchorUrlRefresher {
	handle: JoinHandle<()>,
	latest: watch::Receiver<Option<AnchorSession>>,
}

impl AnchorUrlRefresher {
	/// Opens a session immediately and keeps refreshing it on the given
	/// interval.
	pub fn start(
		api: Arc<dyn AnchorApi>,
		asset_code: String,
		amount: Decimal,
		interval: Duration,
	) -> Self {
		let (sender, latest) = watch::channel(None);

		let handle = tokio::spawn(async move {
			loop {
				match api.create_session(&asset_code, amount).await {
					Ok(session) => {
						if sender.send(Some(session)).is_err() {
							break;
						}
					}
					Err(error) => {
						tracing::warn!(error = %error, "Anchor session refresh failed");
					}
				}
				tokio::time::sleep(interval).await;
			}
		});

		Self { handle, latest }
	}

	/// The most recently opened session, if any yet.
	pub fn latest(&self) -> Option<AnchorSession> {
		self.latest.borrow().clone()
	}

	/// Waits until a session is available.
	pub async fn wait_for_session(&mut self) -> Option<AnchorSession> {
		loop {
			if let Some(session) = self.latest.borrow().clone() {
				return Some(session);
			}
			if self.latest.changed().await.is_err() {
				return None;
			}
		}
	}

	/// Stops refreshing.
	pub fn stop(&self) {
		self.handle.abort();
	}
}

impl Drop for AnchorUrlRefresher {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

/// Polls the anchor until it confirms the settlement, yielding poll
/// errors along the way and ending after the confirmation.
pub fn confirmation_stream(
	api: Arc<dyn AnchorApi>,
	session: AnchorSession,
	interval: Duration,
) -> impl Stream<Item = Result<AnchorConfirmation, AnchorError>> {
	async_stream::stream! {
		loop {
			match api.fetch_confirmation(&session).await {
				Ok(Some(confirmation)) => {
					yield Ok(confirmation);
					break;
				}
				Ok(None) => {}
				Err(error) => yield Err(error),
			}
			tokio::time::sleep(interval).await;
		}
	}
}
