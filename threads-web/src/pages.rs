//! Server-rendered pages

use askama::Template;
use axum::http::StatusCode;
use axum::response::Html;
use tracing::error;

use libthreadcast::service::PollPolicy;
use libthreadcast::view::publish::explanation_key;
use libthreadcast::view::{ComposeAction, ComposeState, QUERYING_STATUS_TEXT};
use libthreadcast::{AttachmentKind, ContainerId, ContainerStatus};

use crate::error::ApiError;

pub fn render<T: Template>(template: T) -> Result<Html<String>, ApiError> {
    template.render().map(Html).map_err(|err| {
        error!(error = %err, "Template rendering failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Template rendering failed")
    })
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage;

/// Media type labels, one per attachment layout
pub struct MediaTypeLabels {
    pub text: &'static str,
    pub image: &'static str,
    pub video: &'static str,
    pub carousel: &'static str,
}

impl MediaTypeLabels {
    pub fn new() -> Self {
        let with =
            |actions: Vec<ComposeAction>| ComposeState::from_actions(actions).media_type_label();
        Self {
            text: with(vec![]),
            image: with(vec![ComposeAction::AddAttachment]),
            video: with(vec![
                ComposeAction::AddAttachment,
                ComposeAction::SetAttachmentKind(0, AttachmentKind::Video),
            ]),
            carousel: with(vec![ComposeAction::AddAttachment, ComposeAction::AddAttachment]),
        }
    }
}

impl Default for MediaTypeLabels {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadPage {
    pub labels: MediaTypeLabels,
}

impl UploadPage {
    pub fn new() -> Self {
        Self {
            labels: MediaTypeLabels::new(),
        }
    }
}

impl Default for UploadPage {
    fn default() -> Self {
        Self::new()
    }
}

/// Fragment swapped into the page after a status query
pub struct StatusExplanation {
    pub id: String,
    pub text: &'static str,
}

fn explanations() -> Vec<StatusExplanation> {
    [
        (
            ContainerStatus::InProgress,
            "Threads is still processing the media. This page checks again shortly.",
        ),
        (
            ContainerStatus::Finished,
            "The container is ready. Publish it to make the post visible.",
        ),
        (
            ContainerStatus::Error,
            "Threads could not process the container. Upload the post again.",
        ),
    ]
    .into_iter()
    .map(|(status, text)| StatusExplanation {
        id: explanation_key(&status),
        text,
    })
    .collect()
}

/// Publish page for a container
///
/// Polling in the page follows the same policy as the server side wait.
#[derive(Template)]
#[template(path = "publish.html")]
pub struct PublishPage {
    pub container_id: String,
    pub querying: &'static str,
    pub interval_ms: u128,
    /// Zero means no cap
    pub max_attempts: u32,
    pub transport_retries: u32,
    pub explanations: Vec<StatusExplanation>,
}

impl PublishPage {
    pub fn new(container_id: &ContainerId, policy: PollPolicy) -> Self {
        Self {
            container_id: container_id.as_str().to_string(),
            querying: QUERYING_STATUS_TEXT,
            interval_ms: policy.interval.as_millis(),
            max_attempts: policy.max_attempts.unwrap_or(0),
            transport_retries: policy.transport_retries,
            explanations: explanations(),
        }
    }
}
