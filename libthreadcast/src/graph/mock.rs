//! Scriptable in-memory Graph API
//!
//! Records every call in order and answers from a script: status queries
//! return the queued reports one by one (then `FINISHED`), and individual
//! operations can be made to fail. Clones share the same state, so a test
//! can keep a handle while the service owns another.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::auth::AccessToken;
use crate::error::{RemoteError, RemoteResult};
use crate::graph::{ContainerRequest, GraphApi};
use crate::types::{ContainerId, ContainerStatus, PostId, StatusReport};

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphCall {
    CreateContainer(ContainerRequest),
    ContainerStatus(ContainerId),
    PublishContainer(ContainerId),
    Repost(PostId),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<GraphCall>,
    next_id: u64,
    statuses: VecDeque<RemoteResult<StatusReport>>,
    failing_media: HashMap<String, RemoteError>,
    parent_failure: Option<RemoteError>,
    publish_failure: Option<RemoteError>,
    repost_failure: Option<RemoteError>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockGraphApi {
    state: Arc<Mutex<MockState>>,
    delay: Duration,
}

impl MockGraphApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A panicking test thread must not poison the script for the others
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Status reports returned by successive status queries
    pub fn with_statuses<I>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = StatusReport>,
    {
        self.with_status_results(statuses.into_iter().map(Ok))
    }

    /// Like `with_statuses`, but individual queries may fail
    pub fn with_status_results<I>(self, results: I) -> Self
    where
        I: IntoIterator<Item = RemoteResult<StatusReport>>,
    {
        self.state().statuses.extend(results);
        self
    }

    /// Fail creation of any container whose media URL is `url`
    pub fn fail_media(self, url: &str, error: RemoteError) -> Self {
        self.state()
            .failing_media
            .insert(url.to_string(), error);
        self
    }

    /// Fail creation of containers that are not carousel items
    pub fn fail_parent_creation(self, error: RemoteError) -> Self {
        self.state().parent_failure = Some(error);
        self
    }

    pub fn fail_publish(self, error: RemoteError) -> Self {
        self.state().publish_failure = Some(error);
        self
    }

    pub fn fail_repost(self, error: RemoteError) -> Self {
        self.state().repost_failure = Some(error);
        self
    }

    /// Simulated latency of container creation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<GraphCall> {
        self.state().calls.clone()
    }

    pub fn creation_requests(&self) -> Vec<ContainerRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GraphCall::CreateContainer(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn status_queries(&self) -> Vec<ContainerId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GraphCall::ContainerStatus(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn published(&self) -> Vec<ContainerId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GraphCall::PublishContainer(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Highest number of container creations that were running at once
    pub fn max_in_flight(&self) -> usize {
        self.state().max_in_flight
    }

    fn record(&self, call: GraphCall) {
        self.state().calls.push(call);
    }

    fn next_id(&self) -> String {
        let mut state = self.state();
        state.next_id += 1;
        (17_890_000_000_000_000 + state.next_id).to_string()
    }
}

#[async_trait]
impl GraphApi for MockGraphApi {
    async fn create_container(
        &self,
        request: &ContainerRequest,
        _token: &AccessToken,
    ) -> RemoteResult<ContainerId> {
        self.record(GraphCall::CreateContainer(request.clone()));
        let id = self.next_id();
        {
            let mut state = self.state();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let failure = {
            let mut state = self.state();
            state.in_flight -= 1;
            let by_media = request
                .media_url()
                .and_then(|url| state.failing_media.get(url).cloned());
            let by_parent = if request.is_carousel_item {
                None
            } else {
                state.parent_failure.clone()
            };
            by_media.or(by_parent)
        };

        match failure {
            Some(error) => Err(error),
            None => Ok(ContainerId::new(id)),
        }
    }

    async fn container_status(
        &self,
        id: &ContainerId,
        _token: &AccessToken,
    ) -> RemoteResult<StatusReport> {
        self.record(GraphCall::ContainerStatus(id.clone()));
        self.state()
            .statuses
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::new(ContainerStatus::Finished)))
    }

    async fn publish_container(
        &self,
        id: &ContainerId,
        _token: &AccessToken,
    ) -> RemoteResult<PostId> {
        self.record(GraphCall::PublishContainer(id.clone()));
        if let Some(error) = self.state().publish_failure.clone() {
            return Err(error);
        }
        Ok(PostId::new(self.next_id()))
    }

    async fn repost(&self, id: &PostId, _token: &AccessToken) -> RemoteResult<PostId> {
        self.record(GraphCall::Repost(id.clone()));
        if let Some(error) = self.state().repost_failure.clone() {
            return Err(error);
        }
        Ok(PostId::new(self.next_id()))
    }
}
