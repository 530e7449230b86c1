//! Compose form state
//!
//! The compose form is driven by discrete user events. Each event is an
//! action; `reduce` computes the next state from the current one. The media
//! type label and the post to submit are derived from state, never stored.

use crate::types::{
    non_empty, Attachment, AttachmentKind, MediaType, PollAttachment, PostSpec, ReplyControl,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentDraft {
    pub kind: AttachmentKind,
    pub url: String,
    pub alt_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSlot {
    A,
    B,
    C,
    D,
}

impl PollSlot {
    fn index(self) -> usize {
        match self {
            PollSlot::A => 0,
            PollSlot::B => 1,
            PollSlot::C => 2,
            PollSlot::D => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeState {
    pub text: String,
    pub attachments: Vec<AttachmentDraft>,
    pub poll_options: [String; 4],
    pub link_attachment: String,
    pub auto_publish_text: bool,
    pub reply_control: Option<ReplyControl>,
    pub reply_to_id: String,
    pub quote_post_id: String,
    pub location_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeAction {
    SetText(String),
    /// Append an empty image attachment row
    AddAttachment,
    RemoveAttachment(usize),
    SetAttachmentKind(usize, AttachmentKind),
    SetAttachmentUrl(usize, String),
    SetAttachmentAltText(usize, String),
    SetPollOption(PollSlot, String),
    SetLinkAttachment(String),
    SetAutoPublishText(bool),
    SetReplyControl(Option<ReplyControl>),
    SetReplyToId(String),
    SetQuotePostId(String),
    SetLocationId(String),
    Reset,
}

/// Pure state transition; indices past the end leave the state unchanged
pub fn reduce(state: ComposeState, action: ComposeAction) -> ComposeState {
    match action {
        ComposeAction::SetText(text) => ComposeState { text, ..state },

        ComposeAction::AddAttachment => {
            let mut attachments = state.attachments;
            attachments.push(AttachmentDraft::default());
            ComposeState {
                attachments,
                ..state
            }
        }

        ComposeAction::RemoveAttachment(index) => {
            let mut attachments = state.attachments;
            if index < attachments.len() {
                attachments.remove(index);
            }
            ComposeState {
                attachments,
                ..state
            }
        }

        ComposeAction::SetAttachmentKind(index, kind) => {
            update_attachment(state, index, |a| a.kind = kind)
        }
        ComposeAction::SetAttachmentUrl(index, url) => {
            update_attachment(state, index, |a| a.url = url)
        }
        ComposeAction::SetAttachmentAltText(index, alt_text) => {
            update_attachment(state, index, |a| a.alt_text = alt_text)
        }

        ComposeAction::SetPollOption(slot, value) => {
            let mut poll_options = state.poll_options;
            poll_options[slot.index()] = value;
            ComposeState {
                poll_options,
                ..state
            }
        }

        ComposeAction::SetLinkAttachment(link_attachment) => ComposeState {
            link_attachment,
            ..state
        },
        ComposeAction::SetAutoPublishText(auto_publish_text) => ComposeState {
            auto_publish_text,
            ..state
        },
        ComposeAction::SetReplyControl(reply_control) => ComposeState {
            reply_control,
            ..state
        },
        ComposeAction::SetReplyToId(reply_to_id) => ComposeState {
            reply_to_id,
            ..state
        },
        ComposeAction::SetQuotePostId(quote_post_id) => ComposeState {
            quote_post_id,
            ..state
        },
        ComposeAction::SetLocationId(location_id) => ComposeState {
            location_id,
            ..state
        },

        ComposeAction::Reset => ComposeState::default(),
    }
}

fn update_attachment<F>(state: ComposeState, index: usize, update: F) -> ComposeState
where
    F: FnOnce(&mut AttachmentDraft),
{
    let mut attachments = state.attachments;
    if let Some(attachment) = attachments.get_mut(index) {
        update(attachment);
    }
    ComposeState {
        attachments,
        ..state
    }
}

impl ComposeState {
    /// Apply a sequence of actions to the empty form
    pub fn from_actions<I>(actions: I) -> Self
    where
        I: IntoIterator<Item = ComposeAction>,
    {
        actions.into_iter().fold(Self::default(), reduce)
    }

    pub fn media_type(&self) -> MediaType {
        match self.attachments.as_slice() {
            [] => MediaType::Text,
            [single] => single.kind.media_type(),
            _ => MediaType::Carousel,
        }
    }

    /// Label shown next to the form
    pub fn media_type_label(&self) -> &'static str {
        match self.media_type() {
            MediaType::Text => "Text 📝",
            MediaType::Image => "Image 🖼️",
            MediaType::Video => "Video 🎬",
            MediaType::Carousel => "Carousel 🎠",
        }
    }

    /// The post this form describes; blank fields become absent
    pub fn to_post_spec(&self) -> PostSpec {
        let poll = PollAttachment::from_options(self.poll_options.iter().cloned());

        PostSpec {
            text: non_empty(self.text.clone()),
            attachments: self
                .attachments
                .iter()
                .map(|draft| Attachment {
                    kind: draft.kind,
                    url: draft.url.trim().to_string(),
                    alt_text: non_empty(draft.alt_text.clone()),
                })
                .collect(),
            reply_control: self.reply_control,
            reply_to_id: non_empty(self.reply_to_id.trim().to_string()),
            quote_post_id: non_empty(self.quote_post_id.trim().to_string()),
            link_attachment: non_empty(self.link_attachment.trim().to_string()),
            poll: (!poll.is_empty()).then_some(poll),
            location_id: non_empty(self.location_id.trim().to_string()),
            auto_publish_text: self.auto_publish_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_follows_attachments() {
        let state = ComposeState::default();
        assert_eq!(state.media_type_label(), "Text 📝");

        let state = reduce(state, ComposeAction::AddAttachment);
        assert_eq!(state.media_type_label(), "Image 🖼️");

        let state = reduce(
            state,
            ComposeAction::SetAttachmentKind(0, AttachmentKind::Video),
        );
        assert_eq!(state.media_type_label(), "Video 🎬");

        let state = reduce(state, ComposeAction::AddAttachment);
        assert_eq!(state.media_type_label(), "Carousel 🎠");

        let state = reduce(state, ComposeAction::RemoveAttachment(0));
        assert_eq!(state.media_type_label(), "Image 🖼️");
    }

    #[test]
    fn test_out_of_range_index_is_ignored() {
        let state = ComposeState::from_actions([ComposeAction::AddAttachment]);
        let next = reduce(state.clone(), ComposeAction::RemoveAttachment(5));
        assert_eq!(next, state);

        let next = reduce(
            state.clone(),
            ComposeAction::SetAttachmentUrl(3, "https://x".to_string()),
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_to_post_spec_drops_blank_fields() {
        let state = ComposeState::from_actions([
            ComposeAction::SetText("  ".to_string()),
            ComposeAction::SetQuotePostId("".to_string()),
            ComposeAction::SetLinkAttachment(" https://example.com ".to_string()),
        ]);

        let spec = state.to_post_spec();
        assert_eq!(spec.text, None);
        assert_eq!(spec.quote_post_id, None);
        assert_eq!(spec.link_attachment.as_deref(), Some("https://example.com"));
        assert_eq!(spec.poll, None);
    }

    #[test]
    fn test_to_post_spec_keeps_attachment_order_and_poll() {
        let state = ComposeState::from_actions([
            ComposeAction::SetText("vote".to_string()),
            ComposeAction::AddAttachment,
            ComposeAction::SetAttachmentKind(0, AttachmentKind::Video),
            ComposeAction::SetAttachmentUrl(0, "https://cdn.example/1.mp4".to_string()),
            ComposeAction::AddAttachment,
            ComposeAction::SetAttachmentUrl(1, "https://cdn.example/2.jpg".to_string()),
            ComposeAction::SetAttachmentAltText(1, "second".to_string()),
            ComposeAction::SetPollOption(PollSlot::A, "yes".to_string()),
            ComposeAction::SetPollOption(PollSlot::B, "no".to_string()),
        ]);

        let spec = state.to_post_spec();
        assert_eq!(spec.attachments[0].kind, AttachmentKind::Video);
        assert_eq!(spec.attachments[1].url, "https://cdn.example/2.jpg");
        assert_eq!(spec.attachments[1].alt_text.as_deref(), Some("second"));
        assert_eq!(spec.attachments[0].alt_text, None);
        let poll = spec.poll.unwrap();
        assert_eq!(poll.option_a.as_deref(), Some("yes"));
        assert_eq!(poll.option_c, None);
    }

    #[test]
    fn test_reset_clears_everything() {
        let state = ComposeState::from_actions([
            ComposeAction::SetText("draft".to_string()),
            ComposeAction::AddAttachment,
            ComposeAction::SetAutoPublishText(true),
            ComposeAction::Reset,
        ]);
        assert_eq!(state, ComposeState::default());
    }
}
