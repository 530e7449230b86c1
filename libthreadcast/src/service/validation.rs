//! Pre-submission checks for composed posts
//!
//! Runs before any network call. Every broken rule is reported, so a form
//! can show all problems at once instead of one per round trip.

use crate::error::{ValidationErrors, ValidationIssue};
use crate::types::PostSpec;

/// Most items a carousel may hold
pub const MAX_CAROUSEL_ITEMS: usize = 20;

pub fn validate_post(spec: &PostSpec) -> Result<(), ValidationErrors> {
    let mut issues = Vec::new();

    let has_link = spec
        .link_attachment
        .as_deref()
        .is_some_and(|link| !link.trim().is_empty());

    if let Some(poll) = spec.poll.as_ref().filter(|_| spec.has_poll()) {
        if poll.option_a.is_none() || poll.option_b.is_none() {
            issues.push(ValidationIssue::IncompletePoll);
        }
        if poll.option_d.is_some() && poll.option_c.is_none() {
            issues.push(ValidationIssue::PollOptionDWithoutC);
        }
        if has_link {
            issues.push(ValidationIssue::PollWithLinkAttachment);
        }
    }

    if !spec.attachments.is_empty() {
        if spec.auto_publish_text {
            issues.push(ValidationIssue::MediaWithAutoPublishText);
        }
        if spec.has_poll() {
            issues.push(ValidationIssue::MediaWithPoll);
        }
        if has_link {
            issues.push(ValidationIssue::MediaWithLinkAttachment);
        }
    }

    for (i, attachment) in spec.attachments.iter().enumerate() {
        if attachment.url.trim().is_empty() {
            issues.push(ValidationIssue::MissingAttachmentUrl { index: i + 1 });
        }
    }

    if spec.attachments.len() > MAX_CAROUSEL_ITEMS {
        issues.push(ValidationIssue::TooManyAttachments {
            count: spec.attachments.len(),
            max: MAX_CAROUSEL_ITEMS,
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        tracing::debug!(issues = issues.len(), "Post rejected by validation");
        Err(ValidationErrors(issues))
    }
}
