//! # ridegate CLI Entry Point
//!
//! Main binary for the ridegate API gateway. Provides the `serve` command
//! to run the gateway and the `call` command for scriptable requests.
//!
//! ## Usage
//!
//! ```bash
//! # Run the gateway with two user-location replicas and one ride-payment
//! # replica (flag order defines failover priority per service)
//! ridegate serve -b 0.0.0.0:5000 \
//!   --replica user-location=http://10.0.0.7:50051 \
//!   --replica user-location=http://10.0.0.8:50051 \
//!   --replica ride-payment=http://10.0.0.9:5002
//!
//! # Call an endpoint (outputs raw JSON, pipe-friendly)
//! ridegate call http://127.0.0.1:5000 /api/user/make_order \
//!   -a '{"userId":"u-1","startLongitude":28.86,"startLatitude":47.02,"endLongitude":28.83,"endLatitude":47.01}'
//! ```
//!
//! ## URL Format
//!
//! Replica and gateway URLs must include the `http://` or `https://`
//! prefix.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;
use ridegate_dispatch::{DispatchConfig, ReplicaRegistry};
use ridegate_gateway::{GatewayState, HttpServer};

/// Validates that a URL string starts with http:// or https://
fn validate_http_url(url: &str, description: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid {}: '{}' must start with http:// or https://",
            description,
            url
        ))
    }
}

/// Parses repeated `service=url` flags into per-service address lists,
/// preserving flag order within each service.
fn parse_replica_flags(flags: &[String]) -> Result<HashMap<String, Vec<String>>> {
    let mut services: HashMap<String, Vec<String>> = HashMap::new();

    for flag in flags {
        let (service, url) = flag.split_once('=').ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid replica flag '{}': expected <service>=<url>",
                flag
            )
        })?;
        if service.is_empty() {
            return Err(anyhow::anyhow!(
                "Invalid replica flag '{}': empty service name",
                flag
            ));
        }
        validate_http_url(url, "replica address")?;
        services
            .entry(service.to_string())
            .or_default()
            .push(url.to_string());
    }

    Ok(services)
}

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// ridegate - replica-aware API gateway for ride-hailing backends
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
}

/// Arguments for running the gateway.
///
/// The gateway forwards each REST operation to one replica of the owning
/// backend service, retrying a bounded number of times per replica and
/// blacklisting replicas that exhaust their budget.
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// run the ridegate gateway
struct ServeArgs {
    /// address to bind the gateway's HTTP server to
    ///
    /// Defaults to "0.0.0.0:5000" for accessibility from other machines.
    #[argh(option, short = 'b', default = "\"0.0.0.0:5000\".into()")]
    bind: String,

    /// replica mapping as <service>=<url>
    ///
    /// Can be specified multiple times. The order of flags for one service
    /// defines its failover priority. URLs must include the http:// or
    /// https:// prefix. At least one replica is required.
    #[argh(option, short = 'r', long = "replica")]
    replicas: Vec<String>,

    /// attempts per replica before it is blacklisted
    ///
    /// Each replica gets this many sequential tries within one request
    /// before the gateway gives up on it and moves to the next one.
    /// Defaults to 3.
    #[argh(option, long = "retries-per-replica", default = "3")]
    retries_per_replica: u32,

    /// seconds an exhausted replica stays blacklisted
    ///
    /// While blacklisted a replica receives no traffic; after the cooldown
    /// it is eligible again without any external health check. Defaults
    /// to 60.
    #[argh(option, long = "blacklist-duration-secs", default = "60")]
    blacklist_duration_secs: u64,

    /// seconds allowed for a single replica call
    ///
    /// A call still pending after this long counts as a failure toward the
    /// replica's retry budget. Defaults to 10.
    #[argh(option, long = "per-call-timeout-secs", default = "10")]
    per_call_timeout_secs: u64,

    /// seconds allowed for a whole request across all replicas and retries
    ///
    /// Once elapsed the request fails with 408 instead of burning the
    /// remaining retry budget. Defaults to 30.
    #[argh(option, long = "request-timeout-secs", default = "30")]
    request_timeout_secs: u64,
}

/// Arguments for making a single gateway call.
///
/// Outputs the raw JSON response to stdout (no pretty-printing), making it
/// suitable for scripting and piping into `jq` and friends. Errors are
/// reported to stderr with a non-zero exit code.
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call a gateway endpoint
struct CallArgs {
    /// gateway base URL
    ///
    /// Must include the http:// or https:// prefix
    /// (e.g. http://127.0.0.1:5000).
    #[argh(positional)]
    gateway_url: String,

    /// endpoint path (e.g. /api/user/make_order)
    #[argh(positional)]
    path: String,

    /// JSON string containing the request body
    ///
    /// Must be valid JSON. Defaults to `{}`.
    #[argh(option, short = 'a', long = "args", default = "\"{}\".into()")]
    args: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // No tracing for `call`: keep stdout clean for unix tool usage.
    if matches!(cli.command, Commands::Serve(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Call(args) => run_call(args).await,
    }
}

/// Executes the `serve` subcommand.
async fn run_serve(args: ServeArgs) -> Result<()> {
    let services = parse_replica_flags(&args.replicas)?;
    if services.is_empty() {
        anyhow::bail!("no replicas configured, use --replica <service>=<url>");
    }

    let config = DispatchConfig {
        retries_per_replica: args.retries_per_replica,
        blacklist_duration: Duration::from_secs(args.blacklist_duration_secs),
        per_call_timeout: Duration::from_secs(args.per_call_timeout_secs),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
    };

    tracing::info!(
        retries = config.retries_per_replica,
        blacklist_secs = config.blacklist_duration.as_secs(),
        "starting ridegate gateway"
    );

    let registry = Arc::new(ReplicaRegistry::new(services));
    let state = GatewayState::new(registry, config)?;
    let server = HttpServer::new(state);

    let addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", args.bind, e))?;
    server.run(addr).await?;

    Ok(())
}

/// Executes the `call` subcommand.
async fn run_call(args: CallArgs) -> Result<()> {
    validate_http_url(&args.gateway_url, "gateway URL")?;

    let body: serde_json::Value = serde_json::from_str(&args.args)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in args: {}", e))?;

    let url = format!(
        "{}/{}",
        args.gateway_url.trim_end_matches('/'),
        args.path.trim_start_matches('/')
    );

    let client = reqwest::Client::new();
    let response = client.post(url).json(&body).send().await?;
    let status = response.status();
    let text = response.text().await?;

    println!("{}", text);

    if !status.is_success() {
        anyhow::bail!("gateway returned {}", status);
    }
    Ok(())
}
