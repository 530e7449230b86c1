//! Threadcast - publishing to Threads through the container workflow
//!
//! A post is first created as a remote container (carousels need one child
//! container per attachment), the container is polled until the remote side
//! has processed it, and only then is it published.

pub mod auth;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod service;
pub mod text_entities;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use auth::{AccessToken, AuthContext, BootstrapCredential, Session};
pub use config::Config;
pub use error::{RemoteError, Result, ThreadcastError};
pub use graph::{GraphApi, GraphClient};
pub use service::ThreadcastService;
pub use types::{
    Attachment, AttachmentKind, ContainerId, ContainerStatus, MediaType, PollAttachment, PostId,
    PostSpec, PublishResult, ReplyControl, StatusReport,
};
