//! Core types for Threadcast

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ThreadcastError;

/// Media type of a container, as understood by the Graph API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    #[default]
    Text,
    Image,
    Video,
    Carousel,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Text => "TEXT",
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::Carousel => "CAROUSEL",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a single media attachment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    #[default]
    Image,
    Video,
}

impl AttachmentKind {
    pub fn media_type(&self) -> MediaType {
        match self {
            AttachmentKind::Image => MediaType::Image,
            AttachmentKind::Video => MediaType::Video,
        }
    }
}

impl FromStr for AttachmentKind {
    type Err = ThreadcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "image" => Ok(AttachmentKind::Image),
            "video" => Ok(AttachmentKind::Video),
            other => Err(ThreadcastError::InvalidInput(format!(
                "Unknown attachment type: '{}'. Valid options: Image, Video",
                other
            ))),
        }
    }
}

/// A media attachment referenced by URL
///
/// Attachments are never uploaded by this client; the remote API fetches
/// them from `url` while it processes the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub url: String,
    pub alt_text: Option<String>,
}

impl Attachment {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            url: url.into(),
            alt_text: None,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Video,
            url: url.into(),
            alt_text: None,
        }
    }

    pub fn with_alt_text(mut self, alt_text: impl Into<String>) -> Self {
        self.alt_text = Some(alt_text.into());
        self
    }
}

/// Who may reply to a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyControl {
    Everyone,
    AccountsYouFollow,
    MentionedOnly,
    ParentPostAuthorOnly,
    FollowersOnly,
}

impl ReplyControl {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyControl::Everyone => "everyone",
            ReplyControl::AccountsYouFollow => "accounts_you_follow",
            ReplyControl::MentionedOnly => "mentioned_only",
            ReplyControl::ParentPostAuthorOnly => "parent_post_author_only",
            ReplyControl::FollowersOnly => "followers_only",
        }
    }
}

impl FromStr for ReplyControl {
    type Err = ThreadcastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "everyone" => Ok(ReplyControl::Everyone),
            "accounts_you_follow" => Ok(ReplyControl::AccountsYouFollow),
            "mentioned_only" => Ok(ReplyControl::MentionedOnly),
            "parent_post_author_only" => Ok(ReplyControl::ParentPostAuthorOnly),
            "followers_only" => Ok(ReplyControl::FollowersOnly),
            other => Err(ThreadcastError::InvalidInput(format!(
                "Unknown reply control: '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReplyControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Poll options as entered by the user
///
/// Options are kept optional so that incomplete polls can reach validation
/// and be reported rather than silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAttachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_a: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_c: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_d: Option<String>,
}

impl PollAttachment {
    /// Build a poll from up to four options, in order
    pub fn from_options<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots = options.into_iter().map(Into::into).map(non_empty);
        Self {
            option_a: slots.next().flatten(),
            option_b: slots.next().flatten(),
            option_c: slots.next().flatten(),
            option_d: slots.next().flatten(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.option_a.is_none()
            && self.option_b.is_none()
            && self.option_c.is_none()
            && self.option_d.is_none()
    }

    /// JSON string carried in the `poll_attachment` request field
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Everything the user authored for one post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSpec {
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
    pub reply_control: Option<ReplyControl>,
    pub reply_to_id: Option<String>,
    pub quote_post_id: Option<String>,
    pub link_attachment: Option<String>,
    pub poll: Option<PollAttachment>,
    pub location_id: Option<String>,
    pub auto_publish_text: bool,
}

impl PostSpec {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Whether a poll with at least one option was entered
    pub fn has_poll(&self) -> bool {
        self.poll.as_ref().is_some_and(|poll| !poll.is_empty())
    }

    /// Media type of the container this post will create
    pub fn media_type(&self) -> MediaType {
        match self.attachments.as_slice() {
            [] => MediaType::Text,
            [single] => single.kind.media_type(),
            _ => MediaType::Carousel,
        }
    }
}

/// Processing status of a container, as reported by the remote API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    InProgress,
    Finished,
    Error,
    /// Any value this client does not know; the raw string is kept for display
    Unknown(String),
}

impl ContainerStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "IN_PROGRESS" => ContainerStatus::InProgress,
            "FINISHED" => ContainerStatus::Finished,
            "ERROR" => ContainerStatus::Error,
            other => ContainerStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContainerStatus::InProgress => "IN_PROGRESS",
            ContainerStatus::Finished => "FINISHED",
            ContainerStatus::Error => "ERROR",
            ContainerStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ContainerStatus::InProgress)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ContainerStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ContainerStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ContainerStatus::parse(&raw))
    }
}

/// One answer to a status query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: ContainerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StatusReport {
    pub fn new(status: ContainerStatus) -> Self {
        Self {
            status,
            error_message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ContainerStatus::Error,
            error_message: Some(message.into()),
        }
    }
}

/// Blank form values mean "not provided"
pub fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Ids travel through URL paths and page attributes, so only a conservative
/// character set is accepted from outside.
fn is_valid_remote_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= 64
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an id returned by the remote API
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Parse an id supplied by a user or a client page
            pub fn parse(raw: &str) -> crate::Result<Self> {
                let trimmed = raw.trim();
                if is_valid_remote_id(trimmed) {
                    Ok(Self(trimmed.to_string()))
                } else {
                    Err(ThreadcastError::InvalidInput(format!(
                        "Invalid {}: '{}'",
                        $label, raw
                    )))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

remote_id!(
    /// Remote id of a not-yet-published container
    ContainerId,
    "container id"
);

remote_id!(
    /// Remote id of a published post
    PostId,
    "post id"
);

/// Outcome of finalizing a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishResult {
    pub container_id: ContainerId,
    pub post_id: PostId,
}
