//! cono - command-line client for token-authenticated object storage

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use cono_client::{Config, Credentials, Headers, Params, Response, StorageClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cono")]
#[command(about = "Client for token-authenticated object storage")]
#[command(version)]
struct Args {
    /// Identity service URL (tokens are requested from `<auth-url>/tokens`)
    #[arg(long, env = "CONO_AUTH_URL")]
    auth_url: String,

    /// Tenant ID
    #[arg(long, env = "CONO_TENANT_ID")]
    tenant_id: String,

    /// API user name
    #[arg(long, env = "CONO_USERNAME")]
    username: String,

    /// API user password
    #[arg(long, env = "CONO_PASSWORD", hide_env_values = true)]
    password: String,

    /// Object storage endpoint URL
    #[arg(long, env = "CONO_ENDPOINT")]
    endpoint: String,

    /// Make created containers and objects world-readable
    #[arg(long, env = "CONO_WEB_MODE")]
    web_mode: bool,

    /// Directory for cached tokens
    #[arg(long, env = "CONO_TOKEN_CACHE_DIR")]
    token_cache_dir: Option<PathBuf>,

    /// Print response headers
    #[arg(short = 'i', long)]
    include: bool,

    /// Enable debug logging
    #[arg(short, long, env = "CONO_DEBUG")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct Target {
    /// Resource path relative to the endpoint, e.g. /container/object
    path: String,

    /// Extra request header as NAME=VALUE (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_key_val)]
    headers: Vec<(String, String)>,

    /// Query parameter as NAME=VALUE (repeatable), e.g. format=json
    #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
    params: Vec<(String, String)>,
}

impl Target {
    fn headers(&self) -> Headers {
        self.headers.iter().cloned().collect()
    }

    fn params(&self) -> Params {
        self.params.iter().cloned().collect()
    }
}

#[derive(ClapArgs, Debug)]
struct Payload {
    /// Inline request body
    #[arg(short = 'd', long, conflicts_with = "file")]
    data: Option<String>,

    /// Read the request body from a file
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a container listing or an object
    Get(Target),
    /// Fetch metadata only
    Head(Target),
    /// Create a container or object
    Put {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        payload: Payload,
    },
    /// Delete a container or object
    Delete(Target),
    /// Update container or object metadata
    Post {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        payload: Payload,
    },
    /// Stream a file to an object, detecting its content type
    Upload {
        #[command(flatten)]
        target: Target,
        /// File to upload
        file: PathBuf,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty name in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

async fn read_payload(payload: Payload) -> anyhow::Result<Vec<u8>> {
    match (payload.data, payload.file) {
        (Some(data), _) => Ok(data.into_bytes()),
        (None, Some(path)) => tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        (None, None) => Ok(Vec::new()),
    }
}

async fn print_response(response: Response, include: bool) -> anyhow::Result<()> {
    let status = response.status();
    if include {
        println!("{}", status);
        for (name, value) in response.headers() {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        println!();
    }

    let body = response.bytes().await?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&body)?;
    stdout.flush()?;

    if !status.is_success() {
        anyhow::bail!("request failed with status {}", status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cono_client={},cono_cli={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let credentials = Credentials::new(args.auth_url, args.tenant_id, args.username, args.password);
    let mut config = Config::new(credentials, args.endpoint).with_web_mode(args.web_mode);
    if let Some(dir) = args.token_cache_dir {
        config = config.with_token_cache_dir(dir);
    }
    if config.web_mode {
        tracing::info!("Web mode enabled: created resources will be world-readable");
    }

    let mut client = StorageClient::new(config).context("Failed to create storage client")?;

    let response = match args.command {
        Command::Get(target) => {
            client
                .get(&target.path, Some(&target.params()), &target.headers())
                .await?
        }
        Command::Head(target) => {
            client
                .head(&target.path, Some(&target.params()), &target.headers())
                .await?
        }
        Command::Delete(target) => {
            client
                .delete(&target.path, Some(&target.params()), &target.headers())
                .await?
        }
        Command::Put { target, payload } => {
            let body = read_payload(payload).await?;
            client
                .put(&target.path, body, Some(&target.params()), &target.headers())
                .await?
        }
        Command::Post { target, payload } => {
            let body = read_payload(payload).await?;
            client
                .post(&target.path, body, Some(&target.params()), &target.headers())
                .await?
        }
        Command::Upload { target, file } => {
            client
                .upload(&target.path, file, Some(&target.params()), &target.headers())
                .await?
        }
    };

    print_response(response, args.include).await
}
