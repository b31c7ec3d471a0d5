use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use playstate_bridge_auth::{Authenticator, CallbackListener};
use playstate_bridge_core::{AppConfig, ClientCredentials};
use playstate_bridge_engine::{PlayStateUpdate, Poller, PollerConfig, PollerHandle};
use playstate_bridge_providers::{PlayerStateSource, SpotifyClient};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

mod consumer;

use consumer::UpdateConsumer;

#[derive(Parser, Debug)]
#[command(
    name = "playstate-bridge",
    about = "Spotify OAuth -> playback poller -> now-playing updates"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run,
    AuthUrl,
    Status {
        #[arg(long)]
        json: bool,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cmd = cli.command.unwrap_or(Commands::Run);
    let cfg_path = cli.config.unwrap_or_else(default_config_path);

    match cmd {
        Commands::Config {
            action: ConfigAction::Init,
        } => {
            init_config(&cfg_path)?;
            println!("Initialized config at {}", cfg_path.display());
            Ok(())
        }
        Commands::AuthUrl => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            let auth = Authenticator::from_app_config(&cfg, cfg.credentials()?);
            println!("{}", auth.new_session()?.authorization_url);
            Ok(())
        }
        Commands::Status { json } => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            status(&cfg, json).await
        }
        Commands::Run => {
            let cfg = load_or_default(&cfg_path)?;
            init_logging(&cfg.log_level);
            run(cfg).await
        }
    }
}

async fn run(cfg: AppConfig) -> Result<()> {
    let credentials = cfg
        .credentials()
        .context("cannot start spotify authorization")?;
    let poller_cfg = PollerConfig::from_app_config(&cfg)?;

    let (capability_tx, capability_rx) = oneshot::channel();
    let PollerHandle {
        stop,
        updates,
        task,
    } = Poller::<SpotifyClient>::spawn(poller_cfg, capability_rx);
    let mut consumer = UpdateConsumer::new(updates, stop);

    let client = match authorize(&cfg, credentials).await {
        Ok(client) => client,
        Err(err) => {
            consumer.stop_polling();
            let _ = task.await;
            return Err(err);
        }
    };
    if capability_tx.send(client).is_err() {
        bail!("poller exited before the spotify client was ready");
    }

    info!("playstate-bridge started");

    let mut frames = tokio::time::interval(Duration::from_millis(cfg.frame_ms.max(1)));
    loop {
        tokio::select! {
            _ = frames.tick() => {
                if consumer.process_frame() {
                    let now = consumer.now_playing();
                    if !now.running {
                        warn!("poller stopped unexpectedly");
                        break;
                    }
                    log_update(&now.current);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received ctrl-c; shutting down");
                consumer.stop_polling();
                break;
            }
        }
    }

    if let Err(err) = task.await {
        warn!(error = %err, "poller task ended abnormally");
    }
    Ok(())
}

/// Runs one authorization attempt and returns the authenticated client once
/// the callback has been handled. The listener is shut down either way.
async fn authorize(cfg: &AppConfig, credentials: ClientCredentials) -> Result<SpotifyClient> {
    let auth = Authenticator::from_app_config(cfg, credentials);
    let session = auth.new_session()?;
    let api_base = cfg.endpoints.api_base_url.clone();

    let (mut listener, client_rx) = CallbackListener::bind(
        &cfg.callback.listen_addr,
        auth,
        session.clone(),
        move |token| SpotifyClient::new(token).with_api_base(api_base.clone()),
    )
    .await?;

    println!("Open this URL to authorize playstate-bridge:");
    println!("{}", session.authorization_url);

    let outcome = tokio::select! {
        client = client_rx => client.context("callback listener closed before authorization"),
        _ = tokio::signal::ctrl_c() => Err(anyhow!("interrupted while waiting for authorization")),
    };

    listener.shutdown().await;
    outcome
}

async fn status(cfg: &AppConfig, json: bool) -> Result<()> {
    let credentials = cfg
        .credentials()
        .context("cannot start spotify authorization")?;
    let mut client = authorize(cfg, credentials).await?;
    let snapshot = client.player_state().await?;
    let update = PlayStateUpdate::from(&snapshot);

    if json {
        println!("{}", serde_json::to_string_pretty(&update)?);
        return Ok(());
    }

    println!("playing: {}", update.is_playing);
    if update.track_name.is_empty() {
        println!("track: <none>");
    } else {
        println!("track: {} - {}", update.artists_name, update.track_name);
        println!("album: {}", update.album_name);
        println!(
            "progress: {} / {} ms",
            update.progress_ms, update.track_length_ms
        );
        if !update.cover_url.is_empty() {
            println!("cover: {}", update.cover_url);
        }
    }
    Ok(())
}

fn log_update(update: &PlayStateUpdate) {
    info!(
        playing = update.is_playing,
        track = %update.track_name,
        artists = %update.artists_name,
        album = %update.album_name,
        progress_ms = update.progress_ms,
        "now playing"
    );
}

fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("playstate-bridge").join("config.toml")
}

fn init_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let cfg = AppConfig::default();
    let toml = toml::to_string_pretty(&cfg)?;
    std::fs::write(path, toml)
        .with_context(|| format!("failed to write config file {}", path.display()))?;
    Ok(())
}

fn load_or_default(path: &Path) -> Result<AppConfig> {
    let mut cfg = if !path.exists() {
        AppConfig::default()
    } else {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?
    };
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

fn init_logging(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}

fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("PLAYSTATE_BRIDGE_CLIENT_ID") {
        if !v.trim().is_empty() {
            cfg.client_id = v;
        }
    }
    if let Ok(v) = std::env::var("PLAYSTATE_BRIDGE_CLIENT_SECRET") {
        if !v.trim().is_empty() {
            cfg.client_secret = v;
        }
    }
    if let Ok(v) = std::env::var("PLAYSTATE_BRIDGE_POLL_INTERVAL_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            cfg.poll_interval_secs = parsed;
        }
    }
    if let Ok(v) = std::env::var("PLAYSTATE_BRIDGE_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.log_level = v;
        }
    }
}
