//! # FMC Diagnostic
//!
//! Offline tool for controller records captured from, or destined for, an
//! FMC controller:
//!
//! - `status <dump>`: decode a 660-byte status record, show derived axis
//!   states and contradictory status bits
//! - `params <dump>`: decode a 92-byte parameter record to TOML
//! - `version <dump>`: decode a 12-byte version record
//! - `pack-params <toml> <out>`: validate and encode a parameter record
//! - `check-config <toml>`: load and validate a control configuration
//!
//! A global `--config <toml>` applies that file's `[shared] log_level`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use fmc_common::codec::{decode_params, decode_status, decode_version, encode_params};
use fmc_common::config::{ConfigLoader, LogLevel};
use fmc_common::params::DeviceParams;
use fmc_common::status::{Axis, AxisState, MachineStatus, StatusAnomaly};
use fmc_control::config::ControlConfig;
use fmc_control::state::AxisStateMachine;
use serde::Serialize;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// FMC Diagnostic: decode and pack controller records
#[derive(Parser, Debug)]
#[command(name = "fmc_diagnostic")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Decode and pack FMC controller status/parameter records")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long, global = true)]
    json_logs: bool,

    /// Control configuration; its `[shared] log_level` sets the log level.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a machine-status record.
    Status {
        /// Raw 660-byte record.
        dump: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Decode a device-parameter record to TOML.
    Params {
        /// Raw 92-byte record.
        dump: PathBuf,
    },
    /// Decode a version record.
    Version {
        /// Raw 12-byte record.
        dump: PathBuf,
    },
    /// Validate a TOML parameter file and write the packed record.
    PackParams {
        /// Parameter file (TOML).
        input: PathBuf,
        /// Destination for the 92-byte record.
        output: PathBuf,
    },
    /// Load and validate a control configuration file.
    CheckConfig {
        /// Configuration file (TOML).
        file: PathBuf,
    },
}

/// Decoded status plus everything derived from it.
#[derive(Debug, Serialize)]
struct StatusReport {
    status: MachineStatus,
    axes: Vec<AxisReport>,
    anomalies: Vec<StatusAnomaly>,
}

#[derive(Debug, Serialize)]
struct AxisReport {
    axis: Axis,
    state: AxisState,
    stopped: bool,
    homed: bool,
    position: f32,
    speed: f32,
}

impl StatusReport {
    fn new(status: MachineStatus) -> Self {
        let sm = AxisStateMachine::new(&status);
        let axes = Axis::ALL
            .iter()
            .map(|&axis| AxisReport {
                axis,
                state: sm.state(axis),
                stopped: sm.is_axis_stopped(axis),
                homed: status.is_homed(axis),
                position: status.real_pos[axis.index()],
                speed: status.real_speed[axis.index()],
            })
            .collect();
        let anomalies = status.anomalies();
        Self {
            status,
            axes,
            anomalies,
        }
    }

    fn print(&self) {
        let s = &self.status;
        println!("run mode: {:?}", s.run_mode);
        for a in &self.axes {
            println!(
                "axis {}: {:?}{} pos={:.3} speed={:.3}{}",
                a.axis,
                a.state,
                if a.homed { " (homed)" } else { "" },
                a.position,
                a.speed,
                if a.stopped { "" } else { " [moving]" },
            );
        }
        println!(
            "inputs={:04b} outputs={:04b} limit_n={:03b} limit_p={:03b}",
            s.input_status, s.output_status, s.limit_n_status, s.limit_p_status
        );
        println!("files ({}):", s.files.len());
        for name in s.files.iter() {
            println!("  {name}");
        }
        for anomaly in &self.anomalies {
            println!("anomaly: axis {} {:?}", anomaly.axis, anomaly.conflict);
        }
    }
}

fn main() {
    let args = Args::parse();
    let config = args.config.as_deref().map(ControlConfig::load).transpose();
    let log_level = config
        .as_ref()
        .ok()
        .and_then(|c| c.as_ref())
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    debug!("FMC Diagnostic v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config {
        error!("cannot load config: {e}");
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        Command::Status { dump, json } => {
            let report = StatusReport::new(decode_status(&read_dump(dump)?)?);
            for anomaly in &report.anomalies {
                warn!(axis = %anomaly.axis, conflict = ?anomaly.conflict, "contradictory status bits");
            }
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
        Command::Params { dump } => {
            let params = decode_params(&read_dump(dump)?)?;
            if let Err(e) = params.validate() {
                warn!("record decodes but is not valid: {e}");
            }
            print!("{}", toml::to_string_pretty(&params)?);
        }
        Command::Version { dump } => {
            let v = decode_version(&read_dump(dump)?)?;
            println!(
                "firmware={:#06x} lib={:#06x} serial={}",
                v.firmware, v.lib, v.serial_number
            );
        }
        Command::PackParams { input, output } => {
            let record = pack_params(input)?;
            fs::write(output, &record)?;
            info!("wrote {} bytes to {}", record.len(), output.display());
        }
        Command::CheckConfig { file } => {
            let loaded = ControlConfig::load(file)?;
            loaded.validate()?;
            info!(
                "config OK: service={}, arc_tolerance={}, multi_axis_jog={}, coils={:?}",
                loaded.shared.service_name,
                loaded.command.arc_radius_tolerance,
                loaded.command.allow_multi_axis_jog,
                loaded.bus.coil_convention,
            );
        }
    }
    Ok(())
}

fn read_dump(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

fn pack_params(input: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let params = DeviceParams::load(input)?;
    Ok(encode_params(&params)?)
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let filter = EnvFilter::from_default_env().add_directive(log_filter(args, configured).into());

    if args.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

/// `--verbose` wins over the configured level.
fn log_filter(args: &Args, configured: LogLevel) -> LevelFilter {
    if args.verbose {
        return LevelFilter::DEBUG;
    }
    configured.as_directive().parse().unwrap_or(LevelFilter::INFO)
}
