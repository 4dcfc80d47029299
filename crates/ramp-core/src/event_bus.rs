//! Event bus projecting pipeline state to the UI layer.
//!
//! A thin wrapper over a broadcast channel. Publishing never fails the
//! pipeline: with no subscriber connected the event is simply dropped.

use ramp_types::RampEvent;
use tokio::sync::broadcast;

/// Broadcast bus for `RampEvent`s.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<RampEvent>,
}

impl EventBus {
	/// Creates a bus with the given buffered capacity per subscriber.
	pub fn new(capacity: usize) -> Self {
		let (sender, _receiver) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	pub fn publish(&self, event: RampEvent) {
		// A send error only means nobody is listening right now.
		let _ = self.sender.send(event);
	}

	/// Subscribes to events published from now on.
	pub fn subscribe(&self) -> broadcast::Receiver<RampEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(256)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_subscribers_receive_published_events() {
		let bus = EventBus::new(8);
		let mut receiver = bus.subscribe();

		bus.publish(RampEvent::Started {
			ramp_id: "ramp-1".into(),
		});
		let event = receiver.recv().await.unwrap();
		assert_eq!(
			event,
			RampEvent::Started {
				ramp_id: "ramp-1".into()
			}
		);
	}

	#[tokio::test]
	async fn test_publish_without_subscribers_is_a_noop() {
		let bus = EventBus::new(8);
		bus.publish(RampEvent::Failed {
			reason: "nobody listening".into(),
		});
	}
}
