mod card;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fairlo_analysis::{normalize_response, RawScanResponse, ScanSubmissionClient};
use fairlo_camera::{DeviceCameraManager, SyntheticCamera};
use fairlo_core::{AppConfig, CameraStatus, FlowState, LocationStatus};
use fairlo_flow::{
    CosmeticGlobe, LocationProvider, LocationSource, ScanSession, StaticLocationSource,
    UnsupportedLocationSource,
};

use crate::card::render_card;

#[derive(Debug, Parser)]
#[command(name = "fairlo")]
#[command(about = "Point, scan, know the real price")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one full scan session against the configured analysis endpoint.
    Scan {
        /// Capture as soon as the camera is ready instead of waiting for the
        /// auto-capture timer.
        #[arg(long)]
        capture_now: bool,
    },
    /// Normalize a raw analysis payload and print the result card.
    Card {
        /// Path to the raw JSON payload, or "-" for stdin.
        #[arg(default_value = "-")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scan { capture_now } => {
            let config = fairlo_core::load_app_config_from_env()?;
            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
            tracing::debug!(?config, "configuration loaded");
            run_scan(&config, capture_now).await
        }
        Commands::Card { input } => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::try_new("warn")?)
                .init();
            run_card(&input)
        }
    }
}

/// Drives a whole session: landing, zoom, camera, capture, submission, card.
async fn run_scan(config: &AppConfig, capture_now: bool) -> anyhow::Result<()> {
    let camera = Arc::new(DeviceCameraManager::new(
        Arc::new(SyntheticCamera::new(1280, 720)),
        Duration::from_millis(config.camera_ready_fallback_ms),
    ));
    let client = Arc::new(ScanSubmissionClient::new(
        &config.api_url,
        config.request_timeout_secs,
        &config.user_agent,
    )?);
    let source: Arc<dyn LocationSource> = match config.device_coordinate {
        Some(coordinate) => Arc::new(StaticLocationSource::new(coordinate)),
        None => Arc::new(UnsupportedLocationSource),
    };
    let provider = LocationProvider::new(
        source,
        Duration::from_millis(config.geo_timeout_ms),
        Duration::from_secs(config.geo_max_age_secs),
    );

    let (session, mut handle) = ScanSession::new(
        Arc::clone(&camera),
        client,
        Arc::new(CosmeticGlobe::new(Duration::from_millis(
            config.zoom_duration_ms,
        ))),
        provider,
        Duration::from_millis(config.auto_capture_delay_ms),
    );
    let session_task = tokio::spawn(session.run());

    println!("🌍 Fairlo — point, scan, know the real price.");
    handle.start_scan();

    let mut last_state = FlowState::Landing;
    let terminal = loop {
        let snapshot = handle.wait_until(|s| s.flow_state != last_state).await;
        match snapshot.flow_state {
            FlowState::Zooming => println!("   Zooming in on your location…"),
            FlowState::CameraActive => {
                println!("📷 Camera starting…");
                if capture_now {
                    let ready = handle
                        .wait_until(|s| {
                            s.camera_status == CameraStatus::Ready
                                || s.flow_state != FlowState::CameraActive
                        })
                        .await;
                    if ready.camera_status == CameraStatus::Ready {
                        handle.capture_now();
                    }
                }
            }
            FlowState::Capturing => println!("📸 Capturing frame…"),
            FlowState::Submitting => println!("📡 Analyzing…"),
            FlowState::Result | FlowState::CameraDenied => break snapshot,
            FlowState::Landing => {}
        }
        last_state = snapshot.flow_state;
    };

    if terminal.location.status == LocationStatus::Denied {
        println!("📍 Location unavailable — using the default region.");
    }
    println!();

    match terminal.flow_state {
        FlowState::CameraDenied => {
            let reason = terminal
                .camera_error
                .map_or_else(|| "camera access was refused".to_owned(), |e| e.to_string());
            println!("🚫 Camera unavailable: {reason}");
            println!("   Re-run to try the camera again.");
        }
        _ => {
            let result = terminal
                .result
                .ok_or_else(|| anyhow::anyhow!("flow reached result with no stored card"))?;
            println!("{}", render_card(&result));
        }
    }

    handle.shutdown();
    session_task.await?;
    Ok(())
}

/// Renders the card for a raw payload from a file or stdin — a debugging
/// aid for inspecting how the service's loosely-shaped responses normalize.
fn run_card(input: &str) -> anyhow::Result<()> {
    let payload = if input == "-" {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(input)
            .map_err(|e| anyhow::anyhow!("could not read {input}: {e}"))?
    };
    let raw: RawScanResponse = serde_json::from_str(&payload)
        .map_err(|e| anyhow::anyhow!("payload is not valid JSON: {e}"))?;
    println!("{}", render_card(&normalize_response(&raw)));
    Ok(())
}
