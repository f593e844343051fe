//! Scan Station entry point.
//!
//! Watches the terminal keyboard (and optionally a serial scanner) for
//! barcode scans and prints each one to stdout as a JSON line:
//!
//! ```text
//! {"sequence":0,"source":"keyboard","barcode":"LOT-2024-0001"}
//! ```
//!
//! Logs go to stderr, so stdout can be piped straight into another program.
//!
//! # Usage
//!
//! ```text
//! scan-station [OPTIONS]
//!
//! Options:
//!   --config <PATH>         Config file [default: platform config dir]
//!   --threshold-ms <MS>     Largest gap between keys of one scan
//!   --min-length <N>        Shortest scan reported
//!   --serial-port <PATH>    Also read a serial scanner on this port
//!   --baud-rate <BAUD>      Serial baud rate
//!   --no-keyboard           Do not watch the terminal keyboard
//!   --save                  Write the effective configuration back to disk
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable            | Flag              |
//! |---------------------|-------------------|
//! | `SCAN_THRESHOLD_MS` | `--threshold-ms`  |
//! | `SCAN_MIN_LENGTH`   | `--min-length`    |
//! | `SCAN_SERIAL_PORT`  | `--serial-port`   |
//!
//! `RUST_LOG` overrides the configured log level.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config  (file → CLI/env overrides → validate)
//!  └─ assemble_station()      -- detector + optional serial framer
//!  └─ start sources
//!       ├─ TerminalKeySource  (poll thread) ─▶ forward_keys task
//!       └─ serial reader      (thread)
//!  └─ run_station()           -- until Ctrl+C or the keyboard closes
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use scan_station::application::detect_scans::{run_station, station_channel};
use scan_station::application::publish_scans::ScanBroadcaster;
use scan_station::infrastructure::bootstrap::assemble_station;
use scan_station::infrastructure::input_capture::terminal::TerminalKeySource;
use scan_station::infrastructure::input_capture::{forward_keys, KeyInputSource};
use scan_station::infrastructure::serial::{open_serial_port, spawn_serial_reader};
use scan_station::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, StationConfig,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Command-line arguments.  Every option overrides the matching config value.
#[derive(Debug, Parser)]
#[command(
    name = "scan-station",
    about = "Detects barcode scanner input on the keyboard and serial ports",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Largest gap in milliseconds between keys of one scan.
    #[arg(long, env = "SCAN_THRESHOLD_MS")]
    threshold_ms: Option<u64>,

    /// Shortest scan (after trimming) that is reported.
    #[arg(long, env = "SCAN_MIN_LENGTH")]
    min_length: Option<usize>,

    /// Serial port of a COM-mode scanner; enables the serial reader.
    #[arg(long, env = "SCAN_SERIAL_PORT")]
    serial_port: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Do not watch the terminal keyboard.
    #[arg(long)]
    no_keyboard: bool,

    /// Save the effective configuration to the config file.
    #[arg(long)]
    save: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    fn apply_to(&self, config: &mut StationConfig) {
        if let Some(threshold) = self.threshold_ms {
            config.scanner.inter_key_threshold_ms = threshold;
        }
        if let Some(length) = self.min_length {
            config.scanner.minimum_scan_length = length;
        }
        if let Some(port) = &self.serial_port {
            config.serial.enabled = true;
            config.serial.port = Some(port.clone());
        }
        if let Some(baud) = self.baud_rate {
            config.serial.baud_rate = baud;
        }
        if self.no_keyboard {
            config.scanner.enabled = false;
        }
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("no --config given and no platform config directory"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config_path()?;
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    cli.apply_to(&mut config);

    // Initialise structured logging on stderr.  `RUST_LOG` overrides the
    // configured level.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.station.log_level)),
        )
        .init();

    config.validate().context("invalid configuration")?;
    if cli.save {
        save_config_to(&config, &config_path)
            .with_context(|| format!("failed to save config to {}", config_path.display()))?;
        info!(path = %config_path.display(), "configuration saved");
    }

    let serial_port = config.serial_port().map(str::to_string);
    if !config.scanner.enabled && serial_port.is_none() {
        bail!("keyboard and serial scanners are both disabled; nothing to listen to");
    }

    info!("Scan Station starting");

    let (handle, events) = station_channel();
    let broadcaster = ScanBroadcaster::default();
    let station = assemble_station(&config, &handle, &broadcaster).context("failed to assemble scan station")?;

    // ── Scan printer ──────────────────────────────────────────────────────────
    let mut scans = broadcaster.subscribe();
    tokio::spawn(async move {
        loop {
            match scans.recv().await {
                Ok(scan) => match serde_json::to_string(&scan) {
                    Ok(line) => {
                        // Raw mode disables the CR in "\n", so write both.
                        let mut stdout = std::io::stdout().lock();
                        let _ = write!(stdout, "{line}\r\n");
                        let _ = stdout.flush();
                    }
                    Err(e) => error!("failed to encode scan: {e}"),
                },
                Err(RecvError::Lagged(missed)) => warn!(missed, "scan printer fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // ── Serial scanner ────────────────────────────────────────────────────────
    if let Some(port_path) = &serial_port {
        let port = open_serial_port(port_path, config.serial.baud_rate)
            .with_context(|| format!("failed to open serial scanner on {port_path}"))?;
        spawn_serial_reader(port, handle.clone()).context("failed to start serial reader thread")?;
    }

    // ── Keyboard ──────────────────────────────────────────────────────────────
    let source: Option<Arc<dyn KeyInputSource>> = if config.scanner.enabled {
        let terminal = Arc::new(TerminalKeySource::new());
        let keys = terminal.start().context("failed to capture the terminal keyboard")?;
        tokio::spawn(forward_keys(keys, handle.clone()));
        info!("scanning keyboard input; press Ctrl+C to exit");
        Some(terminal as Arc<dyn KeyInputSource>)
    } else {
        None
    };

    // ── Ctrl-C / SIGINT handler ───────────────────────────────────────────────
    let signal_handle = handle.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                let _ = signal_handle.shutdown();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run_station(station, events, source.clone()).await;

    if let Some(source) = source {
        source.stop();
    }
    if let Some(last) = broadcaster.last_scanned() {
        info!(scans = last.sequence + 1, "last scan: {}", last.barcode);
    }
    info!("Scan Station stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
