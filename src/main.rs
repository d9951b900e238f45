//! merkle-stamp - Merkle commitments over files, timestamped in Bitcoin

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use merkle_stamp::api::{create_router, AppState};
use merkle_stamp::client::{HttpProxyClient, PollConfig, PollingMachine, SessionStatus};
use merkle_stamp::commitment::{self, FileInput};
use merkle_stamp::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "merkle-stamp")]
#[command(version, about = "Deterministic Merkle commitments anchored with OpenTimestamps")]
struct Args {
    /// Log level
    #[arg(long, env = "MBT_LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the timestamp proxy HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, env = "MBT_SERVER_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, env = "MBT_SERVER_PORT", default_value = "8787")]
        port: u16,
    },

    /// Build a commitment artifact over the given files
    Commit {
        /// Files to commit to, already enumerated
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the artifact here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Folder policy recorded verbatim in the artifact (JSON)
        #[arg(long)]
        policy: Option<String>,
    },

    /// Re-derive an artifact's tree and optionally check file inclusion
    Verify {
        /// Artifact JSON file
        artifact: PathBuf,

        /// Files whose content must be committed to
        files: Vec<PathBuf>,
    },

    /// Stamp a Merkle root through a proxy and poll until confirmed
    Track {
        /// Merkle root as 64 hex characters
        root: String,

        /// Proxy base URL
        #[arg(long, env = "MBT_PROXY_URL", default_value = "http://127.0.0.1:8787")]
        proxy: String,

        /// Timeout per proxy request in seconds
        #[arg(long, env = "MBT_PROXY_TIMEOUT_SECS", default_value = "45")]
        request_timeout_secs: u64,

        /// When polling pauses on errors, re-check after this many seconds
        /// instead of exiting
        #[arg(long, env = "MBT_RECHECK_AFTER_SECS")]
        recheck_after_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Serve { host, port } => serve(host, port).await,
        Command::Commit {
            files,
            output,
            policy,
        } => commit(&files, output.as_deref(), policy.as_deref()),
        Command::Verify { artifact, files } => verify(&artifact, &files),
        Command::Track {
            root,
            proxy,
            request_timeout_secs,
            recheck_after_secs,
        } => {
            track(
                &root,
                &proxy,
                Duration::from_secs(request_timeout_secs),
                recheck_after_secs.map(Duration::from_secs),
            )
            .await
        }
    }
}

async fn serve(host: String, port: u16) -> anyhow::Result<()> {
    let config = ServerConfig {
        host,
        port,
        ..ServerConfig::from_env()
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        pools = config.ots.pool_urls.len(),
        calendars = config.ots.calendar_urls.len(),
        quorum = config.ots.quorum,
        "Starting merkle-stamp proxy"
    );

    let state = AppState::from_config(&config).context("failed to build application state")?;
    let router = create_router(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn commit(files: &[PathBuf], output: Option<&Path>, policy: Option<&str>) -> anyhow::Result<()> {
    let inputs = files
        .iter()
        .map(|path| {
            let bytes =
                std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            Ok(FileInput::new(path.display().to_string(), bytes))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let folder_policy = match policy {
        Some(json) => serde_json::from_str(json).context("--policy is not valid JSON")?,
        None => serde_json::Value::Null,
    };

    let artifact = commitment::generate(&inputs, folder_policy)?;
    let json = commitment::encode(&artifact)?;

    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(root = %artifact.root.to_hex(), path = %path.display(), "Artifact written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn verify(artifact_path: &Path, files: &[PathBuf]) -> anyhow::Result<()> {
    let bytes = std::fs::read(artifact_path)
        .with_context(|| format!("failed to read {}", artifact_path.display()))?;
    let artifact = commitment::decode(&bytes)?;
    commitment::verify(&artifact)?;
    println!("artifact ok: root {}", artifact.root.to_hex());

    let mut missing = 0usize;
    for path in files {
        let content =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        match commitment::verify_file(&artifact, &content)? {
            Some(inclusion) => println!(
                "included: {} (leaf {}, recorded as {})",
                path.display(),
                inclusion.leaf_index,
                inclusion.recorded_paths.join(", ")
            ),
            None => {
                missing += 1;
                println!("NOT included: {}", path.display());
            }
        }
    }

    if missing > 0 {
        bail!("{missing} file(s) not committed to by the artifact");
    }
    Ok(())
}

async fn track(
    root: &str,
    proxy: &str,
    request_timeout: Duration,
    recheck_after: Option<Duration>,
) -> anyhow::Result<()> {
    let api = HttpProxyClient::new(proxy, request_timeout)?;
    let machine = PollingMachine::new(Arc::new(api), PollConfig::from_env());
    let environment = machine.config().environment;

    let mut statuses = machine.subscribe();
    if let Err(e) = machine.stamp(root).await {
        if !e.is_retryable() {
            bail!("stamp rejected: {}", e.user_message(environment));
        }
    }
    let mut last = machine.status();
    println!("{last}: {}", machine.status_message());

    let report = |last: &mut SessionStatus, status: SessionStatus| {
        if status != *last {
            println!("{status}: {}", machine.status_message());
            *last = status;
        }
    };

    let handle = machine.start();
    let outcome = loop {
        tokio::select! {
            changed = statuses.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                report(&mut last, *statuses.borrow_and_update());
            }
            status = machine.settled() => {
                report(&mut last, status);
                if status == SessionStatus::Confirmed {
                    break Ok(());
                }

                let Some(wait) = recheck_after else {
                    break Err(anyhow!("polling paused: {}", machine.status_message()));
                };
                eprintln!("Polling paused, checking again in {}s", wait.as_secs());
                tokio::select! {
                    () = tokio::time::sleep(wait) => {}
                    _ = tokio::signal::ctrl_c() => break Err(anyhow!("interrupted")),
                }
                match machine.check_now().await {
                    Ok(status) => report(&mut last, status),
                    Err(e) => eprintln!("Check failed: {}", e.user_message(environment)),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping poll loop");
                break Err(anyhow!("interrupted"));
            }
        }
    };

    handle.cancel();
    handle.join().await;

    outcome.with_context(|| format!("tracking stopped before confirmation ({})", machine.status()))
}
