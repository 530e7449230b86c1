//! Publish page state
//!
//! Tracks what the publish page shows while a container is polled and
//! published. It doubles as a [`StatusSink`], so the orchestrator can drive
//! it directly.

use crate::error::RemoteError;
use crate::service::publish::{StatusSink, UNKNOWN_ERROR};
use crate::types::{ContainerStatus, PostId, StatusReport};

/// Status text while a query is outstanding
pub const QUERYING_STATUS_TEXT: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishViewState {
    pub status_text: String,
    /// Last status the remote side reported, if any
    pub last_status: Option<ContainerStatus>,
    /// Id of the explanation fragment for the current status
    pub explanation: Option<String>,
    pub error_message: Option<String>,
    /// Set while status queries are failing
    pub connection_error: Option<String>,
    pub publish_enabled: bool,
    pub post_id: Option<PostId>,
}

impl Default for PublishViewState {
    fn default() -> Self {
        Self {
            status_text: QUERYING_STATUS_TEXT.to_string(),
            last_status: None,
            explanation: None,
            error_message: None,
            connection_error: None,
            publish_enabled: false,
            post_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishViewAction {
    PollStarted,
    StatusReceived(StatusReport),
    TransportFailed(String),
    PublishSucceeded(PostId),
    PublishFailed(String),
}

pub fn explanation_key(status: &ContainerStatus) -> String {
    format!("template-status-{}", status)
}

pub fn reduce(state: PublishViewState, action: PublishViewAction) -> PublishViewState {
    match action {
        PublishViewAction::PollStarted => PublishViewState {
            status_text: QUERYING_STATUS_TEXT.to_string(),
            ..state
        },

        PublishViewAction::StatusReceived(report) => {
            let failed = report.status.is_terminal() && report.status != ContainerStatus::Finished;
            let error_message = failed.then(|| {
                report
                    .error_message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
            });

            PublishViewState {
                status_text: report.status.to_string(),
                explanation: Some(explanation_key(&report.status)),
                publish_enabled: report.status == ContainerStatus::Finished,
                last_status: Some(report.status),
                error_message,
                connection_error: None,
                ..state
            }
        }

        // Keep showing the last known status rather than the querying marker
        PublishViewAction::TransportFailed(message) => PublishViewState {
            status_text: state
                .last_status
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| QUERYING_STATUS_TEXT.to_string()),
            connection_error: Some(message),
            ..state
        },

        PublishViewAction::PublishSucceeded(post_id) => PublishViewState {
            post_id: Some(post_id),
            publish_enabled: false,
            error_message: None,
            ..state
        },

        // The container is still publishable; leave the action enabled for a retry
        PublishViewAction::PublishFailed(message) => PublishViewState {
            error_message: Some(message),
            ..state
        },
    }
}

impl PublishViewState {
    pub fn apply(&mut self, action: PublishViewAction) {
        *self = reduce(std::mem::take(self), action);
    }
}

impl StatusSink for PublishViewState {
    fn querying(&mut self) {
        self.apply(PublishViewAction::PollStarted);
    }

    fn status(&mut self, report: &StatusReport) {
        self.apply(PublishViewAction::StatusReceived(report.clone()));
    }

    fn transport_failed(&mut self, error: &RemoteError) {
        self.apply(PublishViewAction::TransportFailed(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received(state: PublishViewState, report: StatusReport) -> PublishViewState {
        reduce(state, PublishViewAction::StatusReceived(report))
    }

    #[test]
    fn test_querying_then_in_progress() {
        let state = reduce(PublishViewState::default(), PublishViewAction::PollStarted);
        assert_eq!(state.status_text, "...");

        let state = received(state, StatusReport::new(ContainerStatus::InProgress));
        assert_eq!(state.status_text, "IN_PROGRESS");
        assert_eq!(
            state.explanation.as_deref(),
            Some("template-status-IN_PROGRESS")
        );
        assert!(!state.publish_enabled);
        assert_eq!(state.error_message, None);
    }

    #[test]
    fn test_finished_enables_publish() {
        let state = received(
            PublishViewState::default(),
            StatusReport::new(ContainerStatus::Finished),
        );
        assert!(state.publish_enabled);
        assert_eq!(state.explanation.as_deref(), Some("template-status-FINISHED"));
    }

    #[test]
    fn test_error_shows_message_or_default() {
        let state = received(
            PublishViewState::default(),
            StatusReport::error("quota exceeded"),
        );
        assert_eq!(state.error_message.as_deref(), Some("quota exceeded"));

        let state = received(
            PublishViewState::default(),
            StatusReport::new(ContainerStatus::parse("UNKNOWN_FUTURE_VALUE")),
        );
        assert_eq!(state.status_text, "UNKNOWN_FUTURE_VALUE");
        assert_eq!(state.error_message.as_deref(), Some("Unknown error"));
        assert!(!state.publish_enabled);
    }

    #[test]
    fn test_transport_failure_restores_last_status() {
        let state = received(
            PublishViewState::default(),
            StatusReport::new(ContainerStatus::InProgress),
        );
        let state = reduce(state, PublishViewAction::PollStarted);
        let state = reduce(
            state,
            PublishViewAction::TransportFailed("Network error: reset".to_string()),
        );

        assert_eq!(state.status_text, "IN_PROGRESS");
        assert_eq!(
            state.connection_error.as_deref(),
            Some("Network error: reset")
        );

        let state = received(state, StatusReport::new(ContainerStatus::Finished));
        assert_eq!(state.connection_error, None);
    }

    #[test]
    fn test_publish_outcomes() {
        let ready = received(
            PublishViewState::default(),
            StatusReport::new(ContainerStatus::Finished),
        );

        let failed = reduce(
            ready.clone(),
            PublishViewAction::PublishFailed("Error during publishing: boom".to_string()),
        );
        assert!(failed.publish_enabled);
        assert!(failed.error_message.is_some());

        let done = reduce(failed, PublishViewAction::PublishSucceeded(PostId::new("42")));
        assert_eq!(done.post_id, Some(PostId::new("42")));
        assert!(!done.publish_enabled);
        assert_eq!(done.error_message, None);
    }

    #[test]
    fn test_status_sink_drives_reducer() {
        let mut state = PublishViewState::default();
        let sink: &mut dyn StatusSink = &mut state;
        sink.querying();
        sink.status(&StatusReport::new(ContainerStatus::Finished));
        assert!(state.publish_enabled);
    }
}
