//! Command-line caller for the presence session manager.
//!
//! Loads a presence record (or builds one from flags), prints its summary,
//! then connects to the local chat client, publishes, and holds the session
//! until ctrl-c.

use std::sync::Arc;

use beacon_presence::{
    config, payload, ConfigError, PresenceRequest, SessionEvent, SessionManager, SocketConnector,
};

type Manager = SessionManager<SocketConnector>;

#[derive(Default)]
struct Args {
    config_path: Option<String>,
    save_path: Option<String>,
    summary_only: bool,
    client_id: Option<String>,
    details: Option<String>,
    state: Option<String>,
    prefix: Option<String>,
    large_image: Option<String>,
    small_image: Option<String>,
    large_text: Option<String>,
    small_text: Option<String>,
    timestamp: bool,
}

fn parse_args() -> Args {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => parsed.config_path = args.next(),
            "--save" => parsed.save_path = args.next(),
            "--summary-only" => parsed.summary_only = true,
            "--client-id" => parsed.client_id = args.next(),
            "--details" => parsed.details = args.next(),
            "--state" => parsed.state = args.next(),
            "--prefix" => parsed.prefix = args.next(),
            "--large-image" => parsed.large_image = args.next(),
            "--small-image" => parsed.small_image = args.next(),
            "--large-text" => parsed.large_text = args.next(),
            "--small-text" => parsed.small_text = args.next(),
            "--timestamp" => parsed.timestamp = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            _ => {}
        }
    }

    parsed
}

fn print_usage() {
    println!(
        "beacon — publish a presence to the locally running chat client\n\n\
         USAGE:\n    beacon [--config <path>] [--save <path>] [--summary-only] [OVERRIDES]\n\n\
         OVERRIDES:\n\
         \x20   --client-id <id>      application id (required to connect)\n\
         \x20   --details <text>      primary status line\n\
         \x20   --state <text>        secondary status line\n\
         \x20   --prefix <text>       text prepended to details\n\
         \x20   --large-image <key>   large image key\n\
         \x20   --small-image <key>   small image key\n\
         \x20   --large-text <text>   large image hover text\n\
         \x20   --small-text <text>   small image hover text\n\
         \x20   --timestamp           attach a started-now timestamp"
    );
}

/// Load the record (if any) and layer the flag overrides on top.
fn build_request(args: &Args) -> Result<PresenceRequest, ConfigError> {
    let mut req = match &args.config_path {
        Some(path) => config::decode(&std::fs::read_to_string(path)?)?,
        None => PresenceRequest::default(),
    };

    if let Some(v) = &args.client_id {
        req.application_id = v.clone();
    }
    if let Some(v) = &args.details {
        req.details = Some(v.clone());
    }
    if let Some(v) = &args.state {
        req.state = Some(v.clone());
    }
    if let Some(v) = &args.prefix {
        req.activity_prefix = v.clone();
    }
    if let Some(v) = &args.large_image {
        req.large_image_key = Some(v.clone());
    }
    if let Some(v) = &args.small_image {
        req.small_image_key = Some(v.clone());
    }
    if let Some(v) = &args.large_text {
        req.large_image_text = Some(v.clone());
    }
    if let Some(v) = &args.small_text {
        req.small_image_text = Some(v.clone());
    }
    if args.timestamp {
        req.show_start_timestamp = true;
    }

    Ok(req)
}

fn save_record(path: &str, req: &PresenceRequest) -> Result<(), ConfigError> {
    let text = config::encode(req)?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Session operations block on the IPC channel; keep them off the runtime.
async fn run_op<F>(manager: &Arc<Manager>, op: F) -> SessionEvent
where
    F: FnOnce(&Manager) -> SessionEvent + Send + 'static,
{
    let manager = Arc::clone(manager);
    tokio::task::spawn_blocking(move || op(&manager))
        .await
        .expect("session operation panicked")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args = parse_args();

    let req = match build_request(&args) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(error = %e, "failed to load presence record");
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.save_path {
        if let Err(e) = save_record(path, &req) {
            tracing::error!(error = %e, path = %path, "failed to save presence record");
            std::process::exit(1);
        }
        tracing::info!(path = %path, "presence record saved");
    }

    println!("{}", payload::summary(&req, None));
    if args.summary_only {
        return;
    }

    let manager = Arc::new(SessionManager::new(SocketConnector::from_env()));

    let mut events = manager.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::debug!(?event, "session event");
        }
    });

    let connect_req = req.clone();
    match run_op(&manager, move |m| m.connect(&connect_req)).await {
        SessionEvent::Connected => tracing::info!("connected to chat client"),
        SessionEvent::ValidationError { field } => {
            tracing::error!(%field, "request is missing a required field");
            std::process::exit(1);
        }
        SessionEvent::ConnectError { cause } => {
            tracing::error!(%cause, "could not reach the chat client");
            std::process::exit(1);
        }
        other => {
            tracing::error!(event = ?other, "unexpected connect outcome");
            std::process::exit(1);
        }
    }

    let publish_req = req.clone();
    match run_op(&manager, move |m| m.publish(&publish_req)).await {
        SessionEvent::Published { payload } => {
            tracing::info!(details = ?payload.details, "presence published, ctrl-c to stop");
        }
        SessionEvent::PublishError { cause } => {
            // Still connected; leave the session up so the user can decide.
            tracing::warn!(%cause, "publish failed, ctrl-c to stop");
        }
        other => {
            tracing::error!(event = ?other, "unexpected publish outcome");
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to wait for ctrl-c");
    }

    run_op(&manager, Manager::disconnect).await;
    tracing::info!("disconnected and cleared presence");
}
