//! UT61E+ Multimeter Viewer
//!
//! A command-line tool that decodes UT61E+ measurement frames, either given
//! as hex, streamed on stdin, or produced by a virtual meter.

mod cli;
mod session;
mod settings;

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dmm_protocol::{DeviceCommand, FunctionMode};
use dmm_sim::{run_virtual_meter_task, VirtualMeter, VirtualMeterCommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use session::{OutputFormat, Session};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "dmmview=info,dmm_protocol=info,dmm_calibration=info,dmm_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(variant) = &cli.variant {
        settings.variant = variant.clone();
    }
    if let Some(dir) = &cli.calibration_dir {
        settings.calibration_dir = Some(dir.clone());
    }

    let format = if cli.json {
        OutputFormat::Json
    } else if cli.annotate {
        OutputFormat::Annotated
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Decode { frames } => decode_frames(&settings, format, &frames),
        Command::Watch => watch_stdin(&settings, format).await,
        Command::Simulate {
            count,
            interval_ms,
            function,
            reading,
            presses,
        } => {
            let mut config = settings.virtual_meter.clone();
            if let Some(name) = function {
                config.function = parse_function(&name)?;
            }
            if let Some(text) = reading {
                config.reading = text;
            }
            let presses = presses
                .iter()
                .map(|name| DeviceCommand::from_name(name))
                .collect::<Result<Vec<_>, _>>()?;
            let interval =
                Duration::from_millis(interval_ms.unwrap_or(settings.simulate_interval_ms));
            let meter = VirtualMeter::from_config(config);

            simulate(&settings, format, meter, presses, interval, count).await
        }
        Command::Command { name } => print_command(name.as_deref(), cli.json),
        Command::Config { save } => show_config(&settings, save),
    }
}

/// Decode each hex argument; fails if none of them decoded
fn decode_frames(settings: &Settings, format: OutputFormat, frames: &[String]) -> Result<()> {
    let mut session = Session::new(settings, format);
    let mut decoded = 0;

    for frame in frames {
        match session.feed_hex(frame) {
            Ok(Some(out)) => {
                println!("{}", out);
                decoded += 1;
            }
            Ok(None) => {}
            Err(e) => eprintln!("{:#}", e),
        }
    }

    if decoded == 0 {
        bail!("no frame decoded");
    }
    Ok(())
}

/// Decode hex lines from stdin until EOF
async fn watch_stdin(settings: &Settings, format: OutputFormat) -> Result<()> {
    let mut session = Session::new(settings, format);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match session.feed_hex(&line) {
            Ok(Some(out)) => println!("{}", out),
            Ok(None) => {}
            Err(e) => tracing::debug!("{:#}", e),
        }
    }
    Ok(())
}

/// Stream frames from a virtual meter through the decoder
async fn simulate(
    settings: &Settings,
    format: OutputFormat,
    meter: VirtualMeter,
    presses: Vec<DeviceCommand>,
    interval: Duration,
    count: Option<usize>,
) -> Result<()> {
    let mut session = Session::new(settings, format);
    tracing::info!("Simulating {}", meter.state_summary());

    let interrupted = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Interrupted");
    };
    let meter = stream_frames(
        &mut session,
        meter,
        presses,
        interval,
        count,
        interrupted,
        |out| println!("{}", out),
    )
    .await?;

    tracing::info!("Final state: {}", meter.state_summary());
    Ok(())
}

/// Run the meter task, pressing buttons while decoding the frames it sends
///
/// Stops after `count` measurements, when the task ends, or when `stop`
/// resolves, and returns the meter's final state.
async fn stream_frames(
    session: &mut Session,
    meter: VirtualMeter,
    presses: Vec<DeviceCommand>,
    interval: Duration,
    count: Option<usize>,
    stop: impl Future<Output = ()>,
    mut emit: impl FnMut(String),
) -> Result<VirtualMeter> {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (frame_tx, mut frame_rx) = mpsc::channel(32);
    let task = tokio::spawn(run_virtual_meter_task(meter, cmd_rx, frame_tx, interval));

    let mut presses = VecDeque::from(presses);
    tokio::pin!(stop);

    let mut measurements = 0;
    loop {
        tokio::select! {
            permit = cmd_tx.reserve(), if !presses.is_empty() => {
                let permit = permit.context("virtual meter stopped")?;
                if let Some(cmd) = presses.pop_front() {
                    permit.send(VirtualMeterCommand::Device(cmd));
                }
            }
            frame = frame_rx.recv() => {
                let Some(bytes) = frame else { break };
                // Acknowledgements are not measurements
                match session.feed(&bytes) {
                    Ok(out) => {
                        emit(out);
                        measurements += 1;
                    }
                    Err(e) => tracing::debug!("Skipping {}: {}", hex::encode_upper(&bytes), e),
                }
                if count.is_some_and(|n| measurements >= n) {
                    break;
                }
            }
            _ = &mut stop => break,
        }
    }

    // Unblocks a task waiting on a full frame channel
    drop(frame_rx);
    let _ = cmd_tx.try_send(VirtualMeterCommand::Shutdown);
    drop(cmd_tx);
    task.await.context("virtual meter task failed")
}

/// Print one command's wire encoding, or all of them
fn print_command(name: Option<&str>, json: bool) -> Result<()> {
    let commands = match name {
        Some(name) => vec![DeviceCommand::from_name(name)?],
        None => DeviceCommand::ALL.to_vec(),
    };

    for cmd in commands {
        let frame = cmd.encode();
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "name": cmd.name(),
                    "code": cmd.code(),
                    "frame": hex::encode_upper(&frame),
                })
            );
        } else {
            let bytes: Vec<String> = frame.iter().map(|b| format!("{:02X}", b)).collect();
            println!("{:<12} {}", cmd.name(), bytes.join(" "));
        }
    }
    Ok(())
}

/// Print the effective settings, optionally saving them
fn show_config(settings: &Settings, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(settings)?);
    if save {
        let path = settings.save().map_err(anyhow::Error::msg)?;
        eprintln!("Saved settings to {}", path.display());
    } else if let Some(path) = Settings::settings_path() {
        eprintln!("Settings file: {}", path.display());
    }
    Ok(())
}

/// Look up a function by its table name (e.g. "DCV", "OHM")
fn parse_function(name: &str) -> Result<FunctionMode> {
    FunctionMode::ALL
        .into_iter()
        .find(|f| !f.name().is_empty() && f.name().eq_ignore_ascii_case(name))
        .with_context(|| format!("unknown function {:?}", name))
}
