//! Error types for Threadcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThreadcastError>;

/// Result of a single call to the remote publishing API
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

#[derive(Error, Debug)]
pub enum ThreadcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote API error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Error creating child elements: {0}")]
    ChildCreation(RemoteError),

    #[error("Error during upload: {0}")]
    Creation(RemoteError),

    #[error("Error during publishing: {0}")]
    Publish(RemoteError),

    #[error("Error during repost: {0}")]
    Repost(RemoteError),

    #[error("Container processing failed ({status}): {message}")]
    Processing { status: String, message: String },

    #[error("Lost connection while querying container status: {0}")]
    ConnectionLost(RemoteError),

    #[error("Container still in progress after {0} status checks")]
    PollingExhausted(u32),

    #[error("Not signed in: {0}")]
    NotAuthenticated(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ThreadcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ThreadcastError::InvalidInput(_) | ThreadcastError::Validation(_) => 3,
            ThreadcastError::Config(_) | ThreadcastError::NotAuthenticated(_) => 2,
            ThreadcastError::Remote(e)
            | ThreadcastError::ChildCreation(e)
            | ThreadcastError::Creation(e)
            | ThreadcastError::Publish(e)
            | ThreadcastError::Repost(e)
            | ThreadcastError::ConnectionLost(e) => e.exit_code(),
            ThreadcastError::Processing { .. } | ThreadcastError::PollingExhausted(_) => 1,
        }
    }

    /// Whether this error is a container-creation failure (parent or child)
    pub fn is_creation_failure(&self) -> bool {
        matches!(
            self,
            ThreadcastError::ChildCreation(_) | ThreadcastError::Creation(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Failure of a call to the remote publishing API
///
/// Cloneable so that a single failure can be reported to the status display,
/// logged, and returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Transient errors are worth retrying; the rest will fail the same way again
    pub fn is_transient(&self) -> bool {
        match self {
            RemoteError::Network(_) | RemoteError::RateLimit(_) => true,
            RemoteError::Http { status, .. } => (500..=599).contains(status),
            RemoteError::Authentication(_) | RemoteError::Decode(_) => false,
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            RemoteError::Authentication(_) => 2,
            _ => 1,
        }
    }
}

/// A single rule broken by a post submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("poll options A and B are both required")]
    IncompletePoll,

    #[error("poll option D requires option C")]
    PollOptionDWithoutC,

    #[error("a poll cannot be combined with a link attachment")]
    PollWithLinkAttachment,

    #[error("media attachments cannot be combined with auto-publish text")]
    MediaWithAutoPublishText,

    #[error("media attachments cannot be combined with a poll")]
    MediaWithPoll,

    #[error("media attachments cannot be combined with a link attachment")]
    MediaWithLinkAttachment,

    #[error("attachment {index} is missing a URL")]
    MissingAttachmentUrl { index: usize },

    #[error("{count} attachments exceed the carousel limit of {max}")]
    TooManyAttachments { count: usize, max: usize },
}

/// Every rule a submission broke, in the order they were checked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", summarize(.0))]
pub struct ValidationErrors(pub Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.0.contains(issue)
    }
}

fn summarize(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = ThreadcastError::InvalidInput("Empty container id".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_validation_error() {
        let error = ThreadcastError::Validation(ValidationErrors(vec![
            ValidationIssue::PollWithLinkAttachment,
        ]));
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error = ThreadcastError::Creation(RemoteError::Authentication(
            "Invalid OAuth access token".to_string(),
        ));
        assert_eq!(error.exit_code(), 2);

        let error = ThreadcastError::NotAuthenticated("no access token".to_string());
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_remote_failures() {
        let network = ThreadcastError::Publish(RemoteError::Network("reset".to_string()));
        assert_eq!(network.exit_code(), 1);

        let processing = ThreadcastError::Processing {
            status: "ERROR".to_string(),
            message: "quota exceeded".to_string(),
        };
        assert_eq!(processing.exit_code(), 1);
        assert_eq!(ThreadcastError::PollingExhausted(10).exit_code(), 1);
    }

    #[test]
    fn test_creation_messages_match_stage() {
        let child = ThreadcastError::ChildCreation(RemoteError::Http {
            status: 400,
            message: "Invalid image URL".to_string(),
        });
        assert_eq!(
            child.to_string(),
            "Error creating child elements: HTTP 400: Invalid image URL"
        );

        let parent = ThreadcastError::Creation(RemoteError::Network("timed out".to_string()));
        assert_eq!(parent.to_string(), "Error during upload: Network error: timed out");
        assert!(parent.is_creation_failure());

        let publish = ThreadcastError::Publish(RemoteError::Network("timed out".to_string()));
        assert!(!publish.is_creation_failure());
    }

    #[test]
    fn test_validation_errors_join_all_issues() {
        let errors = ValidationErrors(vec![
            ValidationIssue::IncompletePoll,
            ValidationIssue::MediaWithPoll,
        ]);
        assert_eq!(
            errors.to_string(),
            "poll options A and B are both required; media attachments cannot be combined with a poll"
        );
        assert!(errors.contains(&ValidationIssue::MediaWithPoll));
        assert!(!errors.contains(&ValidationIssue::PollOptionDWithoutC));
    }

    #[test]
    fn test_transient_classification() {
        assert!(RemoteError::Network("reset".to_string()).is_transient());
        assert!(RemoteError::RateLimit("slow down".to_string()).is_transient());
        assert!(RemoteError::Http {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());
        assert!(!RemoteError::Http {
            status: 400,
            message: "bad".to_string()
        }
        .is_transient());
        assert!(!RemoteError::Authentication("expired".to_string()).is_transient());
        assert!(!RemoteError::Decode("not json".to_string()).is_transient());
    }

    #[test]
    fn test_error_conversion_from_config_error() {
        let config_error = ConfigError::MissingField("graph.base_url".to_string());
        let error: ThreadcastError = config_error.into();

        match error {
            ThreadcastError::Config(_) => {}
            _ => panic!("Expected ThreadcastError::Config"),
        }
    }

    #[test]
    fn test_config_error_formatting() {
        let error = ConfigError::InvalidValue {
            field: "PORT".to_string(),
            value: "eighty".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid value for PORT: eighty");
    }
}
