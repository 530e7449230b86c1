//! Request bodies accepted by the web app

use serde::Deserialize;

use libthreadcast::types::non_empty;
use libthreadcast::view::{ComposeAction, ComposeState, PollSlot};
use libthreadcast::{AttachmentKind, ReplyControl, Result};

/// Compose form, as posted by the upload page
///
/// Attachment fields repeat once per attachment row and are matched up by
/// position.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadForm {
    pub text: Option<String>,
    pub attachment_type: Vec<String>,
    pub attachment_url: Vec<String>,
    pub attachment_alt_text: Vec<String>,
    pub reply_control: Option<String>,
    pub reply_to_id: Option<String>,
    pub link_attachment: Option<String>,
    pub poll_option_a: Option<String>,
    pub poll_option_b: Option<String>,
    pub poll_option_c: Option<String>,
    pub poll_option_d: Option<String>,
    pub quote_post_id: Option<String>,
    pub location_id: Option<String>,
    pub auto_publish_text: Option<String>,
}

impl UploadForm {
    /// Replay the submitted fields as compose actions
    pub fn into_compose_state(self) -> Result<ComposeState> {
        let mut actions = Vec::new();

        if let Some(text) = self.text {
            actions.push(ComposeAction::SetText(text));
        }

        for (i, kind) in self.attachment_type.iter().enumerate() {
            let kind: AttachmentKind = kind.parse()?;
            let url = self.attachment_url.get(i).cloned().unwrap_or_default();
            let alt_text = self.attachment_alt_text.get(i).cloned().unwrap_or_default();
            actions.push(ComposeAction::AddAttachment);
            actions.push(ComposeAction::SetAttachmentKind(i, kind));
            actions.push(ComposeAction::SetAttachmentUrl(i, url));
            actions.push(ComposeAction::SetAttachmentAltText(i, alt_text));
        }

        let reply_control = self
            .reply_control
            .and_then(non_empty)
            .map(|value| value.parse::<ReplyControl>())
            .transpose()?;
        actions.push(ComposeAction::SetReplyControl(reply_control));

        let polls = [
            (PollSlot::A, self.poll_option_a),
            (PollSlot::B, self.poll_option_b),
            (PollSlot::C, self.poll_option_c),
            (PollSlot::D, self.poll_option_d),
        ];
        for (slot, value) in polls {
            if let Some(value) = value {
                actions.push(ComposeAction::SetPollOption(slot, value));
            }
        }

        if let Some(link) = self.link_attachment {
            actions.push(ComposeAction::SetLinkAttachment(link));
        }
        if let Some(id) = self.reply_to_id {
            actions.push(ComposeAction::SetReplyToId(id));
        }
        if let Some(id) = self.quote_post_id {
            actions.push(ComposeAction::SetQuotePostId(id));
        }
        if let Some(id) = self.location_id {
            actions.push(ComposeAction::SetLocationId(id));
        }
        actions.push(ComposeAction::SetAutoPublishText(is_checked(
            self.auto_publish_text.as_deref(),
        )));

        Ok(ComposeState::from_actions(actions))
    }
}

/// Checkbox semantics: present and not an explicit "off" value
fn is_checked(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !matches!(v.trim(), "" | "false" | "off" | "0"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub container_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepostRequest {
    pub repost_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub return_url: Option<String>,
}

impl IndexQuery {
    /// Where to send a signed-in visitor; only local paths are followed
    pub fn destination(&self) -> &str {
        match self.return_url.as_deref() {
            Some(url) if url.starts_with('/') && !url.starts_with("//") => url,
            _ => "/upload",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libthreadcast::MediaType;

    #[test]
    fn test_attachment_rows_are_matched_by_position() {
        let form = UploadForm {
            text: Some("two things".to_string()),
            attachment_type: vec!["Image".to_string(), "Video".to_string()],
            attachment_url: vec![
                "https://cdn.example/a.jpg".to_string(),
                "https://cdn.example/b.mp4".to_string(),
            ],
            attachment_alt_text: vec!["first".to_string()],
            ..Default::default()
        };

        let state = form.into_compose_state().unwrap();
        assert_eq!(state.media_type(), MediaType::Carousel);

        let spec = state.to_post_spec();
        assert_eq!(spec.attachments[1].kind, AttachmentKind::Video);
        assert_eq!(spec.attachments[0].alt_text.as_deref(), Some("first"));
        assert_eq!(spec.attachments[1].alt_text, None);
    }

    #[test]
    fn test_unknown_attachment_type_is_rejected() {
        let form = UploadForm {
            attachment_type: vec!["Gif".to_string()],
            ..Default::default()
        };
        assert!(form.into_compose_state().is_err());
    }

    #[test]
    fn test_blank_reply_control_means_default() {
        let form = UploadForm {
            reply_control: Some(String::new()),
            ..Default::default()
        };
        let spec = form.into_compose_state().unwrap().to_post_spec();
        assert_eq!(spec.reply_control, None);

        let form = UploadForm {
            reply_control: Some("accounts_you_follow".to_string()),
            ..Default::default()
        };
        let spec = form.into_compose_state().unwrap().to_post_spec();
        assert_eq!(spec.reply_control, Some(ReplyControl::AccountsYouFollow));
    }

    #[test]
    fn test_checkbox_values() {
        assert!(is_checked(Some("on")));
        assert!(is_checked(Some("true")));
        assert!(!is_checked(Some("false")));
        assert!(!is_checked(None));
    }

    #[test]
    fn test_return_url_must_be_local() {
        let query = IndexQuery {
            return_url: Some("/publish/123".to_string()),
        };
        assert_eq!(query.destination(), "/publish/123");

        let query = IndexQuery {
            return_url: Some("//evil.example".to_string()),
        };
        assert_eq!(query.destination(), "/upload");
        assert_eq!(IndexQuery::default().destination(), "/upload");
    }
}
