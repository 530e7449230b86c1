//! The remote publishing API
//!
//! Everything that talks to Threads goes through [`GraphApi`]. The HTTP
//! implementation lives in [`client`]; [`mock`] is a scriptable in-memory
//! stand-in used by tests and by the binaries' integration tests.

use async_trait::async_trait;

use crate::auth::AccessToken;
use crate::error::RemoteResult;
use crate::types::{
    Attachment, AttachmentKind, ContainerId, MediaType, PollAttachment, PostId, ReplyControl,
    StatusReport,
};

pub mod client;

// Available outside tests so the binaries' integration tests can use it
pub mod mock;

pub use client::GraphClient;
pub use mock::{GraphCall, MockGraphApi};

/// Calls the publishing workflow makes against the remote API
///
/// Each call takes the access token of the user it acts for, since the web
/// surface serves whoever is signed in.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Create a media container and return its id
    async fn create_container(
        &self,
        request: &ContainerRequest,
        token: &AccessToken,
    ) -> RemoteResult<ContainerId>;

    /// Query a container's processing status
    async fn container_status(
        &self,
        id: &ContainerId,
        token: &AccessToken,
    ) -> RemoteResult<StatusReport>;

    /// Publish a finished container and return the new post's id
    async fn publish_container(&self, id: &ContainerId, token: &AccessToken)
        -> RemoteResult<PostId>;

    /// Repost an existing post and return the repost's id
    async fn repost(&self, id: &PostId, token: &AccessToken) -> RemoteResult<PostId>;
}

/// Fields of one `me/threads` creation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRequest {
    pub media_type: MediaType,
    pub text: Option<String>,
    /// JSON array of text entities, already encoded
    pub text_entities: Option<String>,
    pub media: Option<Attachment>,
    pub is_carousel_item: bool,
    pub children: Vec<ContainerId>,
    pub reply_control: Option<ReplyControl>,
    pub reply_to_id: Option<String>,
    pub quote_post_id: Option<String>,
    pub link_attachment: Option<String>,
    pub poll: Option<PollAttachment>,
    pub location_id: Option<String>,
    pub auto_publish_text: bool,
}

impl ContainerRequest {
    /// A carousel item for one attachment
    pub fn carousel_item(attachment: &Attachment) -> Self {
        Self {
            media_type: attachment.kind.media_type(),
            media: Some(attachment.clone()),
            is_carousel_item: true,
            ..Default::default()
        }
    }

    /// URL of the attached media, if any
    pub fn media_url(&self) -> Option<&str> {
        self.media.as_ref().map(|m| m.url.as_str())
    }

    /// Query parameters in the form the API expects; unset fields are left out
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("media_type", self.media_type.as_str().to_string())];

        let mut push = |key: &'static str, value: Option<&str>| {
            if let Some(value) = value {
                pairs.push((key, value.to_string()));
            }
        };

        push("text", self.text.as_deref());
        push("text_entities", self.text_entities.as_deref());

        if let Some(media) = &self.media {
            let key = match media.kind {
                AttachmentKind::Image => "image_url",
                AttachmentKind::Video => "video_url",
            };
            push(key, Some(media.url.as_str()));
            push("alt_text", media.alt_text.as_deref());
        }

        push("reply_control", self.reply_control.map(|r| r.as_str()));
        push("reply_to_id", self.reply_to_id.as_deref());
        push("quote_post_id", self.quote_post_id.as_deref());
        push("link_attachment", self.link_attachment.as_deref());
        push("location_id", self.location_id.as_deref());

        if self.is_carousel_item {
            pairs.push(("is_carousel_item", "true".to_string()));
        }
        if !self.children.is_empty() {
            let children: Vec<&str> = self.children.iter().map(ContainerId::as_str).collect();
            pairs.push(("children", children.join(",")));
        }
        if let Some(poll) = &self.poll {
            pairs.push(("poll_attachment", poll.to_json()));
        }
        if self.auto_publish_text {
            pairs.push(("auto_publish_text", "true".to_string()));
        }

        pairs
    }
}
