//! threads-post - Publish to Threads from the command line

use clap::{Parser, Subcommand};
use std::io::Read;
use std::sync::Arc;

use libthreadcast::graph::GraphClient;
use libthreadcast::logging::LoggingConfig;
use libthreadcast::service::{PollPolicy, StatusSink, ThreadcastService};
use libthreadcast::view::PublishViewState;
use libthreadcast::{
    AccessToken, Attachment, AttachmentKind, Config, ContainerId, PollAttachment, PostSpec,
    PublishResult, RemoteError, ReplyControl, Result, StatusReport, ThreadcastError,
};

/// Exit code when the user interrupts polling
const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "threads-post")]
#[command(version, about = "Publish posts to Threads")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "\
threads-post - Publish posts to Threads

DESCRIPTION:
    Creates a media container for the post, waits until Threads has
    finished processing it, then publishes it. Several --media entries
    make a carousel, in the order given.

USAGE:
    # Text post
    threads-post \"Hello Threads\"

    # Text from stdin
    echo \"Hello Threads\" | threads-post

    # Image with alt text
    threads-post \"Sunset\" --media image=https://cdn.example/sunset.jpg::Orange\\ sky

    # Carousel of an image and a video
    threads-post -m image=https://cdn.example/a.jpg -m video=https://cdn.example/b.mp4

    # Poll
    threads-post \"Tabs or spaces?\" --poll Tabs,Spaces

    # Check or publish an existing container
    threads-post status 17890000000000000
    threads-post publish 17890000000000000

CONFIGURATION:
    Configuration file: ~/.config/threadcast/config.toml
    Access token: THREADCAST_ACCESS_TOKEN (or [auth] initial_access_token)

EXIT CODES:
    0 - Success
    1 - Remote or processing failure
    2 - Authentication or configuration error
    3 - Invalid input
")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Post text (reads from stdin if not provided)
    text: Option<String>,

    /// Media attachment as KIND=URL[::ALT], KIND is image or video (repeatable)
    #[arg(short, long = "media", value_name = "KIND=URL[::ALT]")]
    media: Vec<String>,

    /// Who may reply
    #[arg(long, value_name = "CONTROL")]
    #[arg(value_parser = [
        "everyone",
        "accounts_you_follow",
        "mentioned_only",
        "parent_post_author_only",
        "followers_only",
    ])]
    reply_control: Option<String>,

    /// Post id to reply to
    #[arg(long, value_name = "ID")]
    reply_to: Option<String>,

    /// Post id to quote
    #[arg(long, value_name = "ID")]
    quote: Option<String>,

    /// Link attachment URL
    #[arg(long, value_name = "URL")]
    link: Option<String>,

    /// Poll options, comma-separated (two to four)
    #[arg(long, value_name = "A,B[,C[,D]]")]
    poll: Option<String>,

    /// Location id
    #[arg(long, value_name = "ID")]
    location: Option<String>,

    /// Wait until the container is ready but do not publish it
    #[arg(long)]
    no_publish: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the processing status of a container
    Status {
        /// Container id
        container_id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        #[arg(value_parser = ["text", "json"])]
        format: String,
    },

    /// Wait for a container to finish processing, then publish it
    Publish {
        /// Container id
        container_id: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        #[arg(value_parser = ["text", "json"])]
        format: String,
    },
}

/// How a run ended, when it did not fail
enum Finished {
    Done,
    Interrupted,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    logging.verbose = cli.verbose;
    if std::env::var_os("THREADCAST_LOG_LEVEL").is_none() {
        logging.level = "error".to_string();
    }
    logging.init();

    match run(cli).await {
        Ok(Finished::Done) => {}
        Ok(Finished::Interrupted) => std::process::exit(EXIT_INTERRUPTED),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<Finished> {
    match cli.command {
        Some(Command::Status {
            ref container_id,
            ref format,
        }) => {
            let id = ContainerId::parse(container_id)?;
            let (service, token) = connect()?;
            let report = service.container_status(&id, &token).await?;
            output_status(&id, &report, format);
            Ok(Finished::Done)
        }
        Some(Command::Publish {
            ref container_id,
            ref format,
        }) => {
            let id = ContainerId::parse(container_id)?;
            let (service, token) = connect()?;
            wait_and_publish(&service, &token, id, false, format).await
        }
        None => {
            let spec = build_post(&cli)?;
            let (service, token) = connect()?;
            let id = service.submit(&spec, &token).await?;
            if cli.format == "text" {
                eprintln!("Created container {}", id);
            }
            wait_and_publish(&service, &token, id, cli.no_publish, &cli.format).await
        }
    }
}

/// Service and token from configuration
fn connect() -> Result<(ThreadcastService, AccessToken)> {
    let config = Config::load()?;
    tracing::debug!(base_url = %config.graph.base_url, "Loaded configuration");

    let token = config
        .auth
        .initial_access_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(AccessToken::new)
        .ok_or_else(|| {
            ThreadcastError::NotAuthenticated(
                "no access token configured; set THREADCAST_ACCESS_TOKEN".to_string(),
            )
        })?;

    let api = GraphClient::new(&config.graph)?;
    let service = ThreadcastService::with_api(Arc::new(api), PollPolicy::from(&config.polling));
    Ok((service, token))
}

async fn wait_and_publish(
    service: &ThreadcastService,
    token: &AccessToken,
    id: ContainerId,
    no_publish: bool,
    format: &str,
) -> Result<Finished> {
    let mut sink = TerminalSink::new(format == "text");

    let outcome = tokio::select! {
        outcome = service.orchestrator().wait_until_ready(&id, token, &mut sink) => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted; container {} was not published", id);
            return Ok(Finished::Interrupted);
        }
    };
    outcome.into_result()?;

    if no_publish {
        if format == "json" {
            let json = serde_json::json!({
                "container_id": id.as_str(),
                "status": "FINISHED",
                "published": false,
            });
            println!("{}", json);
        } else {
            println!("{}", id);
        }
        return Ok(Finished::Done);
    }

    let post_id = service.orchestrator().publish(&id, token).await?;

    if format == "json" {
        let result = PublishResult {
            container_id: id,
            post_id,
        };
        let json = serde_json::to_string(&result).map_err(|e| {
            ThreadcastError::InvalidInput(format!("Failed to encode result: {}", e))
        })?;
        println!("{}", json);
    } else {
        println!("{}", post_id);
    }
    Ok(Finished::Done)
}

fn output_status(id: &ContainerId, report: &StatusReport, format: &str) {
    if format == "json" {
        let json = serde_json::json!({
            "container_id": id.as_str(),
            "status": report.status.as_str(),
            "error_message": report.error_message,
        });
        println!("{}", json);
        return;
    }

    match &report.error_message {
        Some(message) => println!("{}: {}", report.status, message),
        None => println!("{}", report.status),
    }
}

/// Assemble the post from arguments and stdin
fn build_post(cli: &Cli) -> Result<PostSpec> {
    let text = match &cli.text {
        Some(text) => Some(text.clone()),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).map_err(|e| {
                ThreadcastError::InvalidInput(format!("Failed to read from stdin: {}", e))
            })?;
            Some(buffer.trim_end().to_string())
        }
        None => None,
    };

    let attachments = cli
        .media
        .iter()
        .map(|raw| parse_media(raw))
        .collect::<Result<Vec<_>>>()?;

    let poll = cli.poll.as_deref().map(parse_poll).transpose()?;

    let reply_control = cli
        .reply_control
        .as_deref()
        .map(str::parse::<ReplyControl>)
        .transpose()?;

    let spec = PostSpec {
        text: text.filter(|t| !t.trim().is_empty()),
        attachments,
        reply_control,
        reply_to_id: cli.reply_to.clone(),
        quote_post_id: cli.quote.clone(),
        link_attachment: cli.link.clone(),
        poll,
        location_id: cli.location.clone(),
        auto_publish_text: false,
    };

    if spec.text.is_none() && spec.attachments.is_empty() && !spec.has_poll() {
        return Err(ThreadcastError::InvalidInput(
            "Nothing to post: provide text, --media or --poll".to_string(),
        ));
    }

    Ok(spec)
}

/// Parse `KIND=URL[::ALT]`
fn parse_media(raw: &str) -> Result<Attachment> {
    let (kind, rest) = raw.split_once('=').ok_or_else(|| {
        ThreadcastError::InvalidInput(format!(
            "Invalid media '{}'. Expected KIND=URL[::ALT]",
            raw
        ))
    })?;
    let kind: AttachmentKind = kind.parse()?;

    let (url, alt_text) = match rest.split_once("::") {
        Some((url, alt)) => (url, Some(alt.to_string()).filter(|a| !a.trim().is_empty())),
        None => (rest, None),
    };

    Ok(Attachment {
        kind,
        url: url.trim().to_string(),
        alt_text,
    })
}

fn parse_poll(raw: &str) -> Result<PollAttachment> {
    let options: Vec<&str> = raw.split(',').map(str::trim).collect();
    if options.len() > 4 {
        return Err(ThreadcastError::InvalidInput(format!(
            "A poll has at most 4 options, got {}",
            options.len()
        )));
    }
    Ok(PollAttachment::from_options(options))
}

/// Prints poll progress to stderr
struct TerminalSink {
    view: PublishViewState,
    echo: bool,
}

impl TerminalSink {
    fn new(echo: bool) -> Self {
        Self {
            view: PublishViewState::default(),
            echo,
        }
    }
}

impl StatusSink for TerminalSink {
    fn querying(&mut self) {
        self.view.querying();
    }

    fn status(&mut self, report: &StatusReport) {
        let previous = self.view.last_status.clone();
        self.view.status(report);
        if self.echo && previous.as_ref() != Some(&report.status) {
            eprintln!("Status: {}", self.view.status_text);
        }
        if self.echo {
            if let Some(message) = &self.view.error_message {
                eprintln!("  {}", message);
            }
        }
    }

    fn transport_failed(&mut self, error: &RemoteError) {
        self.view.transport_failed(error);
        if self.echo {
            eprintln!("Status query failed, retrying: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_media_with_alt_text() {
        let attachment = parse_media("image=https://cdn.example/a.jpg::A cat").unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Image);
        assert_eq!(attachment.url, "https://cdn.example/a.jpg");
        assert_eq!(attachment.alt_text.as_deref(), Some("A cat"));
    }

    #[test]
    fn test_parse_media_keeps_query_string() {
        let attachment = parse_media("video=https://cdn.example/b.mp4?sig=a=b").unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Video);
        assert_eq!(attachment.url, "https://cdn.example/b.mp4?sig=a=b");
        assert_eq!(attachment.alt_text, None);
    }

    #[test]
    fn test_parse_media_rejects_unknown_kind() {
        let err = parse_media("gif=https://cdn.example/c.gif").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(parse_media("https://cdn.example/c.jpg").is_err());
    }

    #[test]
    fn test_parse_poll() {
        let poll = parse_poll("Tabs, Spaces").unwrap();
        assert_eq!(poll.option_a.as_deref(), Some("Tabs"));
        assert_eq!(poll.option_b.as_deref(), Some("Spaces"));
        assert_eq!(poll.option_c, None);

        assert!(parse_poll("a,b,c,d,e").is_err());
    }

    #[test]
    fn test_cli_keeps_media_order() {
        let cli = Cli::try_parse_from([
            "threads-post",
            "-m",
            "video=https://cdn.example/1.mp4",
            "--media",
            "image=https://cdn.example/2.jpg",
        ])
        .unwrap();
        assert_eq!(
            cli.media,
            vec!["video=https://cdn.example/1.mp4", "image=https://cdn.example/2.jpg"]
        );
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::try_parse_from(["threads-post", "status", "123"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Status { ref container_id, .. }) if container_id == "123"
        ));
    }

    #[test]
    fn test_terminal_sink_tracks_view() {
        let mut sink = TerminalSink::new(false);
        sink.status(&StatusReport::new(libthreadcast::ContainerStatus::Finished));
        assert!(sink.view.publish_enabled);
    }
}
