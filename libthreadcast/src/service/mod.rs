//! Service layer for Threadcast
//!
//! `ThreadcastService` is the entry point shared by the web app and the CLI.
//! It wires the sub-services to one Graph API handle and one event bus:
//!
//! - [`ContainerBuilder`]: turns a composed post into remote containers
//! - [`PublishOrchestrator`]: polls container status and publishes
//! - [`validation`]: checks a post before anything is sent
//! - [`EventBus`]: progress events for anyone who wants to watch
//!
//! ```no_run
//! use libthreadcast::service::ThreadcastService;
//! use libthreadcast::{AccessToken, Config, PostSpec};
//!
//! # async fn example() -> libthreadcast::Result<()> {
//! let config = Config::load()?;
//! let service = ThreadcastService::from_config(&config)?;
//! let token = AccessToken::new("THAA...");
//!
//! let container_id = service.submit(&PostSpec::text("Hello Threads"), &token).await?;
//! service
//!     .orchestrator()
//!     .wait_until_ready(&container_id, &token, &mut ())
//!     .await
//!     .into_result()?;
//! let post_id = service.orchestrator().publish(&container_id, &token).await?;
//! println!("Published {}", post_id);
//! # Ok(())
//! # }
//! ```

pub mod container;
pub mod events;
pub mod publish;
pub mod validation;

pub use container::{ContainerBuilder, ContainerPlan};
pub use events::{Event, EventBus, EventReceiver};
pub use publish::{PollOutcome, PollPolicy, PublishOrchestrator, StatusSink};
pub use validation::validate_post;

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::AccessToken;
use crate::config::Config;
use crate::error::{Result, ThreadcastError};
use crate::graph::{GraphApi, GraphClient};
use crate::types::{ContainerId, PostId, PostSpec, StatusReport};

#[derive(Clone)]
pub struct ThreadcastService {
    api: Arc<dyn GraphApi>,
    builder: ContainerBuilder,
    orchestrator: PublishOrchestrator,
    event_bus: EventBus,
}

impl ThreadcastService {
    /// Service talking to the Graph API described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GraphClient::new(&config.graph)?;
        Ok(Self::with_api(
            Arc::new(client),
            PollPolicy::from(&config.polling),
        ))
    }

    /// Service on top of any Graph API implementation
    pub fn with_api(api: Arc<dyn GraphApi>, policy: PollPolicy) -> Self {
        let event_bus = EventBus::new(100);
        let builder = ContainerBuilder::new(Arc::clone(&api), event_bus.clone());
        let orchestrator = PublishOrchestrator::new(Arc::clone(&api), policy, event_bus.clone());

        Self {
            api,
            builder,
            orchestrator,
            event_bus,
        }
    }

    pub fn builder(&self) -> &ContainerBuilder {
        &self.builder
    }

    pub fn orchestrator(&self) -> &PublishOrchestrator {
        &self.orchestrator
    }

    /// Receive progress events from every operation started after this call
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    /// Validate a post and create its container
    ///
    /// Nothing is sent if validation fails.
    pub async fn submit(&self, spec: &PostSpec, token: &AccessToken) -> Result<ContainerId> {
        validate_post(spec)?;
        self.builder.create(spec, token).await
    }

    /// One status query, without display
    pub async fn container_status(
        &self,
        id: &ContainerId,
        token: &AccessToken,
    ) -> Result<StatusReport> {
        Ok(self.orchestrator.poll_once(id, token, &mut ()).await?)
    }

    pub async fn repost(&self, id: &PostId, token: &AccessToken) -> Result<PostId> {
        match self.api.repost(id, token).await {
            Ok(repost_id) => {
                info!(post_id = %id, repost_id = %repost_id, "Reposted");
                self.event_bus.emit(Event::Reposted {
                    post_id: id.to_string(),
                    repost_id: repost_id.to_string(),
                });
                Ok(repost_id)
            }
            Err(e) => {
                let error = ThreadcastError::Repost(e);
                warn!(post_id = %id, "{}", error);
                Err(error)
            }
        }
    }
}
