//! Waiting for a container to finish processing, then publishing it
//!
//! Containers are processed asynchronously by the remote side. The
//! orchestrator polls the status on a fixed interval until it sees a
//! terminal status, reporting every answer to a [`StatusSink`]. Failed
//! status queries are retried with exponential backoff; once the retries run
//! out the loop ends with [`PollOutcome::ConnectionLost`] instead of leaving
//! a stale status on screen.
//!
//! There is no cancellation handle: dropping the future returned by
//! [`PublishOrchestrator::wait_until_ready`] abandons the loop.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::auth::AccessToken;
use crate::config::PollingConfig;
use crate::error::{RemoteError, RemoteResult, Result, ThreadcastError};
use crate::graph::GraphApi;
use crate::service::events::{Event, EventBus};
use crate::types::{ContainerId, ContainerStatus, PostId, StatusReport};

/// Shown when a failed container comes without an error message
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between status queries while the container is in progress
    pub interval: Duration,
    /// Upper bound on status queries; `None` polls until a terminal status
    pub max_attempts: Option<u32>,
    /// Retries of a failed status query before giving up on the connection
    pub transport_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: None,
            transport_retries: 3,
        }
    }
}

impl From<&PollingConfig> for PollPolicy {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: config.interval(),
            max_attempts: config.max_attempts,
            transport_retries: config.transport_retries,
        }
    }
}

impl PollPolicy {
    /// Wait after the `failures`-th consecutive failed query: interval * 2^(failures-1)
    pub fn backoff(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(16);
        self.interval.saturating_mul(1u32 << exponent)
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// How a polling loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The container finished processing and can be published
    Ready { attempts: u32 },
    /// The remote side reported `ERROR` or a status this client does not know
    Failed {
        status: ContainerStatus,
        message: String,
    },
    /// Status queries kept failing
    ConnectionLost { error: RemoteError, attempts: u32 },
    /// Still in progress when the attempt budget ran out
    GaveUp { attempts: u32 },
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }

    pub fn into_result(self) -> Result<()> {
        match self {
            PollOutcome::Ready { .. } => Ok(()),
            PollOutcome::Failed { status, message } => Err(ThreadcastError::Processing {
                status: status.to_string(),
                message,
            }),
            PollOutcome::ConnectionLost { error, .. } => Err(ThreadcastError::ConnectionLost(error)),
            PollOutcome::GaveUp { attempts } => Err(ThreadcastError::PollingExhausted(attempts)),
        }
    }
}

/// Where poll progress is displayed
pub trait StatusSink: Send {
    /// A status query is about to be sent
    fn querying(&mut self) {}

    /// A status query was answered
    fn status(&mut self, report: &StatusReport);

    /// A status query failed
    fn transport_failed(&mut self, error: &RemoteError);
}

/// Discards progress
impl StatusSink for () {
    fn status(&mut self, _report: &StatusReport) {}

    fn transport_failed(&mut self, _error: &RemoteError) {}
}

#[derive(Clone)]
pub struct PublishOrchestrator {
    api: Arc<dyn GraphApi>,
    policy: PollPolicy,
    events: EventBus,
}

impl PublishOrchestrator {
    pub fn new(api: Arc<dyn GraphApi>, policy: PollPolicy, events: EventBus) -> Self {
        Self {
            api,
            policy,
            events,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Query the status once and report the answer to `sink`
    pub async fn poll_once(
        &self,
        id: &ContainerId,
        token: &AccessToken,
        sink: &mut dyn StatusSink,
    ) -> RemoteResult<StatusReport> {
        sink.querying();
        match self.api.container_status(id, token).await {
            Ok(report) => {
                sink.status(&report);
                Ok(report)
            }
            Err(e) => {
                sink.transport_failed(&e);
                Err(e)
            }
        }
    }

    /// Poll until the container reaches a terminal status, the connection is
    /// lost, or the attempt budget runs out
    ///
    /// At least one status query is always made. Queries never overlap.
    pub async fn wait_until_ready(
        &self,
        id: &ContainerId,
        token: &AccessToken,
        sink: &mut dyn StatusSink,
    ) -> PollOutcome {
        let mut attempts = 0u32;
        let mut failures = 0u32;

        loop {
            attempts += 1;

            let delay = match self.poll_once(id, token, sink).await {
                Ok(report) => {
                    failures = 0;
                    self.events.emit(Event::StatusPolled {
                        container_id: id.to_string(),
                        attempt: attempts,
                        status: report.status.clone(),
                        error_message: report.error_message.clone(),
                    });

                    match report.status {
                        ContainerStatus::Finished => {
                            info!(container_id = %id, attempts, "Container ready to publish");
                            return PollOutcome::Ready { attempts };
                        }
                        ContainerStatus::InProgress => {
                            debug!(container_id = %id, attempt = attempts, "Container in progress");
                            self.policy.interval
                        }
                        status => {
                            let message = report
                                .error_message
                                .filter(|m| !m.trim().is_empty())
                                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                            warn!(container_id = %id, status = %status, "Container processing failed: {}", message);
                            return PollOutcome::Failed { status, message };
                        }
                    }
                }
                Err(error) => {
                    failures += 1;
                    self.events.emit(Event::StatusUnavailable {
                        container_id: id.to_string(),
                        attempt: attempts,
                        error: error.to_string(),
                    });

                    if failures > self.policy.transport_retries {
                        warn!(container_id = %id, attempts, "Giving up on status queries: {}", error);
                        return PollOutcome::ConnectionLost { error, attempts };
                    }

                    let delay = self.policy.backoff(failures);
                    warn!(
                        container_id = %id,
                        attempt = attempts,
                        "Status query failed, retrying in {}s: {}",
                        delay.as_secs(),
                        error
                    );
                    delay
                }
            };

            if self.policy.exhausted(attempts) {
                warn!(container_id = %id, attempts, "Container still not ready, giving up");
                return PollOutcome::GaveUp { attempts };
            }

            sleep(delay).await;
        }
    }

    /// Publish a container that finished processing
    pub async fn publish(&self, id: &ContainerId, token: &AccessToken) -> Result<PostId> {
        match self.api.publish_container(id, token).await {
            Ok(post_id) => {
                info!(container_id = %id, post_id = %post_id, "Published");
                self.events.emit(Event::Published {
                    container_id: id.to_string(),
                    post_id: post_id.to_string(),
                });
                Ok(post_id)
            }
            Err(e) => {
                let error = ThreadcastError::Publish(e);
                warn!(container_id = %id, "{}", error);
                self.events.emit(Event::PublishFailed {
                    container_id: id.to_string(),
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MockGraphApi;
    use tokio::time::Instant;

    #[derive(Debug, Default)]
    struct RecordingSink {
        queries: u32,
        statuses: Vec<StatusReport>,
        failures: Vec<RemoteError>,
    }

    impl StatusSink for RecordingSink {
        fn querying(&mut self) {
            self.queries += 1;
        }

        fn status(&mut self, report: &StatusReport) {
            self.statuses.push(report.clone());
        }

        fn transport_failed(&mut self, error: &RemoteError) {
            self.failures.push(error.clone());
        }
    }

    fn orchestrator(mock: &MockGraphApi, policy: PollPolicy) -> PublishOrchestrator {
        PublishOrchestrator::new(Arc::new(mock.clone()), policy, EventBus::new(64))
    }

    fn in_progress() -> StatusReport {
        StatusReport::new(ContainerStatus::InProgress)
    }

    fn network() -> RemoteError {
        RemoteError::Network("connection reset".to_string())
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = PollPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(5));
        assert_eq!(policy.backoff(2), Duration::from_secs(10));
        assert_eq!(policy.backoff(3), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_finished_on_fixed_interval() {
        let mock = MockGraphApi::new().with_statuses([
            in_progress(),
            in_progress(),
            StatusReport::new(ContainerStatus::Finished),
        ]);
        let orchestrator = orchestrator(&mock, PollPolicy::default());
        let mut sink = RecordingSink::default();
        let id = ContainerId::new("1789");
        let start = Instant::now();

        let outcome = orchestrator
            .wait_until_ready(&id, &AccessToken::new("t"), &mut sink)
            .await;

        assert_eq!(outcome, PollOutcome::Ready { attempts: 3 });
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(mock.status_queries(), vec![id.clone(), id.clone(), id]);
        assert_eq!(sink.queries, 3);
        assert_eq!(sink.statuses.len(), 3);
        assert_eq!(sink.statuses[2].status, ContainerStatus::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_surfaces_message_and_stops() {
        let mock = MockGraphApi::new().with_statuses([
            StatusReport::error("quota exceeded"),
            StatusReport::new(ContainerStatus::Finished),
        ]);
        let mut sink = RecordingSink::default();

        let outcome = orchestrator(&mock, PollPolicy::default())
            .wait_until_ready(&ContainerId::new("1"), &AccessToken::new("t"), &mut sink)
            .await;

        assert_eq!(
            outcome,
            PollOutcome::Failed {
                status: ContainerStatus::Error,
                message: "quota exceeded".to_string()
            }
        );
        assert_eq!(mock.status_queries().len(), 1);
        assert_eq!(
            outcome.into_result().unwrap_err().to_string(),
            "Container processing failed (ERROR): quota exceeded"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_is_terminal_with_default_message() {
        let mock = MockGraphApi::new().with_statuses([StatusReport::new(ContainerStatus::parse(
            "UNKNOWN_FUTURE_VALUE",
        ))]);
        let mut sink = RecordingSink::default();

        let outcome = orchestrator(&mock, PollPolicy::default())
            .wait_until_ready(&ContainerId::new("1"), &AccessToken::new("t"), &mut sink)
            .await;

        match outcome {
            PollOutcome::Failed { status, message } => {
                assert_eq!(status.to_string(), "UNKNOWN_FUTURE_VALUE");
                assert_eq!(message, UNKNOWN_ERROR);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(mock.status_queries().len(), 1);
        assert_eq!(sink.statuses[0].status.as_str(), "UNKNOWN_FUTURE_VALUE");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_error_message_reads_unknown_error() {
        let mock = MockGraphApi::new().with_statuses([StatusReport::error("  ")]);

        let outcome = orchestrator(&mock, PollPolicy::default())
            .wait_until_ready(&ContainerId::new("1"), &AccessToken::new("t"), &mut ())
            .await;

        assert_eq!(
            outcome,
            PollOutcome::Failed {
                status: ContainerStatus::Error,
                message: UNKNOWN_ERROR.to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_back_off_then_recover() {
        let mock = MockGraphApi::new().with_status_results([
            Err(network()),
            Err(network()),
            Ok(StatusReport::new(ContainerStatus::Finished)),
        ]);
        let mut sink = RecordingSink::default();
        let start = Instant::now();

        let outcome = orchestrator(&mock, PollPolicy::default())
            .wait_until_ready(&ContainerId::new("1"), &AccessToken::new("t"), &mut sink)
            .await;

        assert_eq!(outcome, PollOutcome::Ready { attempts: 3 });
        assert_eq!(start.elapsed(), Duration::from_secs(5 + 10));
        assert_eq!(sink.failures.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_end_in_connection_lost() {
        let mock = MockGraphApi::new().with_status_results((0..4).map(|_| Err(network())));
        let mut sink = RecordingSink::default();
        let start = Instant::now();

        let outcome = orchestrator(&mock, PollPolicy::default())
            .wait_until_ready(&ContainerId::new("1"), &AccessToken::new("t"), &mut sink)
            .await;

        assert_eq!(
            outcome,
            PollOutcome::ConnectionLost {
                error: network(),
                attempts: 4
            }
        );
        assert_eq!(start.elapsed(), Duration::from_secs(5 + 10 + 20));
        assert!(matches!(
            outcome.into_result(),
            Err(ThreadcastError::ConnectionLost(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_streak_resets_after_success() {
        let policy = PollPolicy {
            transport_retries: 1,
            ..Default::default()
        };
        let mock = MockGraphApi::new().with_status_results([
            Err(network()),
            Ok(in_progress()),
            Err(network()),
            Ok(StatusReport::new(ContainerStatus::Finished)),
        ]);

        let outcome = orchestrator(&mock, policy)
            .wait_until_ready(&ContainerId::new("1"), &AccessToken::new("t"), &mut ())
            .await;

        assert_eq!(outcome, PollOutcome::Ready { attempts: 4 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_gives_up_without_extra_wait() {
        let policy = PollPolicy {
            max_attempts: Some(2),
            ..Default::default()
        };
        let mock = MockGraphApi::new().with_statuses([in_progress(), in_progress(), in_progress()]);
        let start = Instant::now();

        let outcome = orchestrator(&mock, policy)
            .wait_until_ready(&ContainerId::new("1"), &AccessToken::new("t"), &mut ())
            .await;

        assert_eq!(outcome, PollOutcome::GaveUp { attempts: 2 });
        assert_eq!(mock.status_queries().len(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_events_are_emitted() {
        let mock = MockGraphApi::new().with_statuses([in_progress()]);
        let events = EventBus::new(16);
        let mut receiver = events.subscribe();
        let orchestrator =
            PublishOrchestrator::new(Arc::new(mock.clone()), PollPolicy::default(), events);

        orchestrator
            .wait_until_ready(&ContainerId::new("9"), &AccessToken::new("t"), &mut ())
            .await;

        let first = receiver.recv().await.unwrap();
        assert_eq!(
            first,
            Event::StatusPolled {
                container_id: "9".to_string(),
                attempt: 1,
                status: ContainerStatus::InProgress,
                error_message: None,
            }
        );
    }

    #[tokio::test]
    async fn test_publish_returns_post_id() {
        let mock = MockGraphApi::new();
        let id = ContainerId::new("1789");

        let post_id = orchestrator(&mock, PollPolicy::default())
            .publish(&id, &AccessToken::new("t"))
            .await
            .unwrap();

        assert_eq!(mock.published(), vec![id]);
        assert!(!post_id.as_str().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_message() {
        let mock = MockGraphApi::new().fail_publish(RemoteError::Http {
            status: 400,
            message: "Media not ready".to_string(),
        });

        let err = orchestrator(&mock, PollPolicy::default())
            .publish(&ContainerId::new("1"), &AccessToken::new("t"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Error during publishing: HTTP 400: Media not ready"
        );
    }
}
