//! Progress events for the publishing workflow
//!
//! Built on `tokio::sync::broadcast`: any number of subscribers, and emitting
//! never blocks or fails when nobody is listening. Slow subscribers miss the
//! oldest events rather than holding up the workflow.
//!
//! ```
//! use libthreadcast::service::events::{Event, EventBus};
//!
//! let bus = EventBus::new(16);
//! let mut receiver = bus.subscribe();
//! bus.emit(Event::CreationFailed {
//!     error: "Error during upload: Network error: reset".to_string(),
//! });
//! assert!(receiver.try_recv().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{ContainerStatus, MediaType};

pub type EventReceiver = broadcast::Receiver<Event>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is the number of events buffered per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        // Err only means there are no receivers
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A container (and any carousel children) was created
    ContainerCreated {
        container_id: String,
        media_type: MediaType,
        children: usize,
    },

    CreationFailed {
        error: String,
    },

    /// One status query answered
    StatusPolled {
        container_id: String,
        attempt: u32,
        status: ContainerStatus,
        error_message: Option<String>,
    },

    /// A status query failed and will be retried
    StatusUnavailable {
        container_id: String,
        attempt: u32,
        error: String,
    },

    Published {
        container_id: String,
        post_id: String,
    },

    PublishFailed {
        container_id: String,
        error: String,
    },

    Reposted {
        post_id: String,
        repost_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        bus.emit(Event::ContainerCreated {
            container_id: "1789".to_string(),
            media_type: MediaType::Carousel,
            children: 3,
        });

        match receiver.recv().await.unwrap() {
            Event::ContainerCreated {
                container_id,
                media_type,
                children,
            } => {
                assert_eq!(container_id, "1789");
                assert_eq!(media_type, MediaType::Carousel);
                assert_eq!(children, 3);
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = Event::Published {
            container_id: "1".to_string(),
            post_id: "2".to_string(),
        };
        bus.emit(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_no_subscribers() {
        let bus = EventBus::new(10);
        bus.emit(Event::CreationFailed {
            error: "nobody listening".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::StatusPolled {
            container_id: "1789".to_string(),
            attempt: 2,
            status: ContainerStatus::Unknown("EXPIRED".to_string()),
            error_message: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"status_polled""#));
        assert!(json.contains(r#""status":"EXPIRED""#));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
