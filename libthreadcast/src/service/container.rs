//! Container creation
//!
//! A post becomes one remote container. Posts with two or more attachments
//! become a carousel: one child container per attachment, created
//! concurrently, then a parent container listing the children in order.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::AccessToken;
use crate::error::{Result, ThreadcastError};
use crate::graph::{ContainerRequest, GraphApi};
use crate::service::events::{Event, EventBus};
use crate::text_entities::extract_spoilers;
use crate::types::{non_empty, ContainerId, MediaType, PostSpec};

/// The creation calls a post needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerPlan {
    /// One call for a text post or a single attachment
    Single(ContainerRequest),
    /// One call per child, then the parent once every child id is known
    Carousel {
        children: Vec<ContainerRequest>,
        parent: ContainerRequest,
    },
}

impl ContainerPlan {
    /// Creation calls the plan will make
    pub fn call_count(&self) -> usize {
        match self {
            ContainerPlan::Single(_) => 1,
            ContainerPlan::Carousel { children, .. } => children.len() + 1,
        }
    }
}

#[derive(Clone)]
pub struct ContainerBuilder {
    api: Arc<dyn GraphApi>,
    events: EventBus,
}

impl ContainerBuilder {
    pub fn new(api: Arc<dyn GraphApi>, events: EventBus) -> Self {
        Self { api, events }
    }

    /// Work out the creation calls for a post without making any of them
    ///
    /// Poll and link attachment never go on a carousel parent.
    pub fn plan(spec: &PostSpec) -> ContainerPlan {
        let marked = spec
            .text
            .clone()
            .and_then(non_empty)
            .map(|text| extract_spoilers(&text));

        let shared = ContainerRequest {
            text: marked.as_ref().map(|m| m.text.clone()),
            text_entities: marked.as_ref().and_then(|m| m.entities_json()),
            reply_control: spec.reply_control,
            reply_to_id: spec.reply_to_id.clone().and_then(non_empty),
            quote_post_id: spec.quote_post_id.clone().and_then(non_empty),
            location_id: spec.location_id.clone().and_then(non_empty),
            auto_publish_text: spec.auto_publish_text,
            ..Default::default()
        };

        match spec.attachments.as_slice() {
            [] | [_] => ContainerPlan::Single(ContainerRequest {
                media_type: spec.media_type(),
                media: spec.attachments.first().cloned(),
                link_attachment: spec.link_attachment.clone().and_then(non_empty),
                poll: spec.poll.clone().filter(|_| spec.has_poll()),
                ..shared
            }),
            attachments => ContainerPlan::Carousel {
                children: attachments
                    .iter()
                    .map(ContainerRequest::carousel_item)
                    .collect(),
                parent: ContainerRequest {
                    media_type: MediaType::Carousel,
                    ..shared
                },
            },
        }
    }

    /// Create the container(s) for a post and return the id to poll and publish
    ///
    /// The post must already have passed validation.
    pub async fn create(&self, spec: &PostSpec, token: &AccessToken) -> Result<ContainerId> {
        let plan = Self::plan(spec);
        debug!(
            calls = plan.call_count(),
            media_type = %spec.media_type(),
            "Creating containers"
        );
        let result = match plan {
            ContainerPlan::Single(request) => self.create_parent(&request, token).await,
            ContainerPlan::Carousel {
                children,
                mut parent,
            } => match self.create_children(&children, token).await {
                Ok(ids) => {
                    parent.children = ids;
                    self.create_parent(&parent, token).await
                }
                Err(e) => Err(e),
            },
        };

        match &result {
            Ok(id) => {
                info!(container_id = %id, media_type = %spec.media_type(), "Container created");
                self.events.emit(Event::ContainerCreated {
                    container_id: id.to_string(),
                    media_type: spec.media_type(),
                    children: if spec.attachments.len() > 1 {
                        spec.attachments.len()
                    } else {
                        0
                    },
                });
            }
            Err(e) => {
                warn!("{}", e);
                self.events.emit(Event::CreationFailed {
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn create_parent(
        &self,
        request: &ContainerRequest,
        token: &AccessToken,
    ) -> Result<ContainerId> {
        self.api
            .create_container(request, token)
            .await
            .map_err(ThreadcastError::Creation)
    }

    /// Create every child concurrently; all must succeed
    ///
    /// Children created before a sibling failed are left behind on the
    /// remote side, where unpublished containers expire on their own.
    async fn create_children(
        &self,
        children: &[ContainerRequest],
        token: &AccessToken,
    ) -> Result<Vec<ContainerId>> {
        let calls = children
            .iter()
            .map(|child| self.api.create_container(child, token));
        let results = join_all(calls).await;

        let mut ids = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(id) => ids.push(id),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => Ok(ids),
            Some(error) => {
                if !ids.is_empty() {
                    let orphaned: Vec<&str> = ids.iter().map(ContainerId::as_str).collect();
                    warn!(
                        orphaned = %orphaned.join(","),
                        "Carousel aborted; created children left unpublished"
                    );
                }
                Err(ThreadcastError::ChildCreation(error))
            }
        }
    }
}
