//! View state for the compose and publish pages
//!
//! Both pages are modelled as state plus actions with a pure `reduce`
//! function, independent of how the state is rendered.

pub mod compose;
pub mod publish;

pub use compose::{AttachmentDraft, ComposeAction, ComposeState, PollSlot};
pub use publish::{PublishViewAction, PublishViewState, QUERYING_STATUS_TEXT};
