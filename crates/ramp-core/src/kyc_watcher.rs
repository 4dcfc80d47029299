//! Cancellable KYC status subscription.
//!
//! The identity provider only exposes a polling endpoint, so the monitor
//! turns it into a stream of status snapshots: a spawned loop polls on an
//! interval and forwards every successful response. Transient fetch
//! failures are logged and the poll continues; the loop stops when the
//! monitor is stopped or dropped, so a stale execution input can never be
//! acted upon.

use ramp_services::KycApi;
use ramp_types::KycReport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// A running KYC status poll.
pub struct KycMonitor {
	handle: JoinHandle<()>,
	receiver: Option<mpsc::UnboundedReceiver<KycReport>>,
}

impl KycMonitor {
	/// Starts polling the given tax identifier on the given interval.
	pub fn start(api: Arc<dyn KycApi>, tax_id: String, interval: Duration) -> Self {
		let (sender, receiver) = mpsc::unbounded_channel();

		let handle = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(interval);
			ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				match api.fetch_status(&tax_id).await {
					Ok(report) => {
						if sender.send(report).is_err() {
							// Receiver gone; stop polling.
							break;
						}
					}
					Err(error) => {
						// Transient: keep the poll alive.
						tracing::warn!(error = %error, "KYC status poll failed");
					}
				}
			}
		});

		Self {
			handle,
			receiver: Some(receiver),
		}
	}

	/// Takes the snapshot stream. Yields every successful poll result;
	/// can be taken once.
	pub fn reports(&mut self) -> Option<UnboundedReceiverStream<KycReport>> {
		self.receiver.take().map(UnboundedReceiverStream::new)
	}

	/// Stops the poll loop.
	pub fn stop(&self) {
		self.handle.abort();
	}
}

impl Drop for KycMonitor {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use ramp_services::{KycError, RemainingLimits};
	use ramp_types::{KycLevel, KycStatus};
	use std::sync::atomic::{AtomicU32, Ordering};
	use tokio_stream::StreamExt;

	struct FlakyKyc {
		calls: AtomicU32,
	}

	#[async_trait]
	impl KycApi for FlakyKyc {
		async fn fetch_status(&self, _tax_id: &str) -> Result<KycReport, KycError> {
			let call = self.calls.fetch_add(1, Ordering::SeqCst);
			// First poll fails; the loop must survive it.
			if call == 0 {
				return Err(KycError::Network("connection reset".into()));
			}
			Ok(KycReport {
				status: if call < 2 {
					KycStatus::Pending
				} else {
					KycStatus::Approved
				},
				level: KycLevel::Level1,
			})
		}

		async fn fetch_remaining_limits(
			&self,
			_tax_id: &str,
		) -> Result<RemainingLimits, KycError> {
			Err(KycError::Network("unused".into()))
		}
	}

	#[tokio::test]
	async fn test_poll_survives_transient_errors_and_streams_reports() {
		let api = Arc::new(FlakyKyc {
			calls: AtomicU32::new(0),
		});
		let mut monitor = KycMonitor::start(api, "123".into(), Duration::from_millis(10));
		let mut reports = monitor.reports().unwrap();

		let first = reports.next().await.unwrap();
		assert_eq!(first.status, KycStatus::Pending);
		let second = reports.next().await.unwrap();
		assert_eq!(second.status, KycStatus::Approved);

		monitor.stop();
	}

	#[tokio::test]
	async fn test_stop_ends_the_stream() {
		let api = Arc::new(FlakyKyc {
			calls: AtomicU32::new(1),
		});
		let mut monitor = KycMonitor::start(api, "123".into(), Duration::from_millis(5));
		let mut reports = monitor.reports().unwrap();
		let _ = reports.next().await;

		monitor.stop();
		// After abort the sender is dropped and the stream terminates.
		while reports.next().await.is_some() {}
	}
}
