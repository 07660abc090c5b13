// # vidlinkd - Video Registry Daemon
//
// This daemon is a THIN integration layer:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and tracing
// 3. Wiring the stores, credentials and blob adapter into the engine
// 4. Waiting for a shutdown signal
//
// All registry and upload logic lives in vidlink-core; the Drive specifics
// live in vidlink-blob-gdrive. Do not add business logic here.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Public links
// - `VIDLINK_BASE_URL`: Base URL embedded in viewer links (required)
//
// ### Blob store
// - `VIDLINK_CONTAINER_ID`: Drive folder id uploads land in (required)
// - `VIDLINK_OAUTH_CLIENT_ID`: OAuth client id (required)
// - `VIDLINK_OAUTH_CLIENT_SECRET`: OAuth client secret (required)
// - `VIDLINK_OAUTH_REFRESH_TOKEN`: stored refresh token (required)
//
// ### Registry
// - `VIDLINK_PRIMARY_PATH`: Path to the JSON flat file (default: videos.json)
// - `VIDLINK_SECONDARY_TYPE`: Secondary store type (none, memory; default: none)
// - `VIDLINK_CONNECT_RETRY_SECS`: Secondary connect retry delay (default: 5)
//
// ### Engine
// - `VIDLINK_BROADCAST_CAPACITY`: Per-subscriber channel capacity (default: 16)
// - `VIDLINK_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export VIDLINK_BASE_URL=https://vid.example.com
// export VIDLINK_CONTAINER_ID=1AbCfolderid
// export VIDLINK_OAUTH_CLIENT_ID=....apps.googleusercontent.com
// export VIDLINK_OAUTH_CLIENT_SECRET=...
// export VIDLINK_OAUTH_REFRESH_TOKEN=...
// export VIDLINK_PRIMARY_PATH=/var/lib/vidlink/videos.json
//
// vidlinkd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use vidlink_core::config::{EngineConfig, PrimaryStoreConfig, SecondaryStoreConfig, VidlinkConfig};
use vidlink_core::store::{FileStore, MemoryConnector, SecondaryHandle};
use vidlink_core::{ChangeBroadcaster, VideoEngine, VideoRegistry};
use vidlink_blob_gdrive::{DriveBlobStore, DriveCredentials};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum VidlinkExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<VidlinkExitCode> for ExitCode {
    fn from(code: VidlinkExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration: the core `VidlinkConfig` plus the
/// daemon-only settings (OAuth secrets, log level)
struct Config {
    vidlink: VidlinkConfig,
    oauth_client_id: String,
    oauth_client_secret: String,
    oauth_refresh_token: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let secondary = match env::var("VIDLINK_SECONDARY_TYPE")
            .unwrap_or_else(|_| "none".to_string())
            .as_str()
        {
            "none" => SecondaryStoreConfig::None,
            "memory" => SecondaryStoreConfig::Memory,
            other => anyhow::bail!(
                "VIDLINK_SECONDARY_TYPE '{}' is not supported. \
                Supported types: none, memory",
                other
            ),
        };

        let vidlink = VidlinkConfig {
            base_url: env::var("VIDLINK_BASE_URL")?,
            container_id: env::var("VIDLINK_CONTAINER_ID")?,
            primary: PrimaryStoreConfig {
                path: env::var("VIDLINK_PRIMARY_PATH")
                    .unwrap_or_else(|_| "videos.json".to_string()),
            },
            secondary,
            engine: EngineConfig {
                connect_retry_secs: env::var("VIDLINK_CONNECT_RETRY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| EngineConfig::default().connect_retry_secs),
                broadcast_capacity: env::var("VIDLINK_BROADCAST_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| EngineConfig::default().broadcast_capacity),
            },
        };

        Ok(Self {
            vidlink,
            oauth_client_id: env::var("VIDLINK_OAUTH_CLIENT_ID")?,
            oauth_client_secret: env::var("VIDLINK_OAUTH_CLIENT_SECRET")?,
            oauth_refresh_token: env::var("VIDLINK_OAUTH_REFRESH_TOKEN")?,
            log_level: env::var("VIDLINK_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Core settings validate through `VidlinkConfig::validate`; only the
    /// daemon-specific settings are checked here.
    fn validate(&self) -> Result<()> {
        self.vidlink.validate()?;

        if self.vidlink.base_url.starts_with("http://") {
            eprintln!(
                "WARNING: VIDLINK_BASE_URL uses HTTP (not HTTPS). \
                 Viewer links will not be secure."
            );
        }

        // Check for obvious placeholder secrets (common mistake)
        for (name, value) in [
            ("VIDLINK_OAUTH_CLIENT_SECRET", &self.oauth_client_secret),
            ("VIDLINK_OAUTH_REFRESH_TOKEN", &self.oauth_refresh_token),
        ] {
            let lower = value.to_lowercase();
            if lower.contains("your_") || lower.contains("replace_me") || lower.contains("example")
            {
                anyhow::bail!(
                    "{} appears to be a placeholder. \
                    Use the actual value from your OAuth consent flow.",
                    name
                );
            }
        }

        if !(1..=300).contains(&self.vidlink.engine.connect_retry_secs) {
            anyhow::bail!(
                "VIDLINK_CONNECT_RETRY_SECS must be between 1 and 300 seconds. Got: {}",
                self.vidlink.engine.connect_retry_secs
            );
        }

        if self.vidlink.engine.broadcast_capacity == 0 {
            anyhow::bail!("VIDLINK_BROADCAST_CAPACITY must be at least 1");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "VIDLINK_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return VidlinkExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return VidlinkExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return VidlinkExitCode::ConfigError.into();
    }

    info!("Starting vidlinkd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return VidlinkExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            VidlinkExitCode::RuntimeError
        } else {
            VidlinkExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let vidlink = &config.vidlink;

    // Primary tier: flat-file store, created empty on first run
    let primary = FileStore::open(&vidlink.primary.path).await?;
    info!(
        path = %vidlink.primary.path,
        records = primary.len().await,
        "primary store opened"
    );

    // Secondary tier: starts empty; the connect loop installs the store
    // whenever it comes up, and the registry degrades until then
    let secondary = SecondaryHandle::empty();
    match vidlink.secondary {
        SecondaryStoreConfig::Memory => {
            info!("secondary store: memory");
            let connector = Arc::new(MemoryConnector);
            tokio::spawn(secondary.clone().connect_loop(
                connector,
                Duration::from_secs(vidlink.engine.connect_retry_secs),
            ));
        }
        SecondaryStoreConfig::None => info!("secondary store: none (primary-only mode)"),
    }

    let registry = Arc::new(VideoRegistry::new(primary, secondary));
    let broadcaster = Arc::new(ChangeBroadcaster::with_capacity(
        vidlink.engine.broadcast_capacity,
    ));

    // Blob store: Google Drive behind refresh-token credentials
    let credentials = Arc::new(DriveCredentials::new(
        config.oauth_client_id.clone(),
        config.oauth_client_secret.clone(),
        config.oauth_refresh_token.clone(),
    )?);
    let blob_store = Arc::new(DriveBlobStore::new(credentials.clone())?);

    let engine = VideoEngine::new(
        blob_store,
        credentials,
        registry,
        broadcaster,
        &vidlink.base_url,
        &vidlink.container_id,
    );

    // Startup probe: exercise the credentials once so a dead grant is
    // visible in the logs immediately instead of on the first upload
    match engine.check_connection().await {
        Ok(()) => info!("blob store reachable, credentials valid"),
        Err(e) if e.requires_reconnect() => {
            warn!("blob store credentials need a reconnect: {}", e)
        }
        Err(e) => warn!("blob store probe failed: {}", e),
    }

    info!("Daemon initialized successfully");

    let signal_name = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal_name);
    info!("Shutting down daemon");

    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
