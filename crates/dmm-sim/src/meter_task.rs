//! Virtual meter actor task
//!
//! This module provides an async task that owns a VirtualMeter and streams its
//! frames over a channel. The task uses a select! loop to:
//! - Emit a measurement frame on every tick, like a meter being polled
//! - Apply state changes and button presses from the command channel
//! - Forward any responses the meter queued

use std::time::Duration;

use dmm_protocol::{DeviceCommand, FunctionMode};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::VirtualMeter;

/// Commands that can be sent to a virtual meter actor
#[derive(Debug, Clone)]
pub enum VirtualMeterCommand {
    /// Change the LCD text
    SetReading(String),
    /// Change the measurement function
    SetFunction(FunctionMode),
    /// Change the bar graph fill
    SetBarProgress(i16),
    /// Press a button or send a request as the host would
    Device(DeviceCommand),
    /// Shutdown the virtual meter actor
    Shutdown,
}

/// Run the virtual meter actor task
///
/// Frames are sent on `frame_tx` every `period`. The task ends on
/// [`VirtualMeterCommand::Shutdown`], when the command channel closes, or when
/// the frame receiver is dropped, and hands the meter back.
pub async fn run_virtual_meter_task(
    mut meter: VirtualMeter,
    mut cmd_rx: mpsc::Receiver<VirtualMeterCommand>,
    frame_tx: mpsc::Sender<Vec<u8>>,
    period: Duration,
) -> VirtualMeter {
    info!("Starting virtual meter task for {}", meter.name());

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if frame_tx.send(meter.encode_frame()).await.is_err() {
                    debug!("Frame receiver closed for virtual meter {}", meter.name());
                    break;
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(VirtualMeterCommand::SetReading(text)) => meter.set_reading(&text),
                    Some(VirtualMeterCommand::SetFunction(function)) => meter.set_function(function),
                    Some(VirtualMeterCommand::SetBarProgress(progress)) => meter.set_bar_progress(progress),
                    Some(VirtualMeterCommand::Device(cmd)) => {
                        debug!("Virtual meter {} applying {}", meter.name(), cmd.name());
                        meter.apply_command(cmd);
                    }
                    Some(VirtualMeterCommand::Shutdown) => {
                        info!("Shutdown requested for virtual meter {}", meter.name());
                        break;
                    }
                    None => {
                        debug!("Command channel closed for virtual meter {}", meter.name());
                        break;
                    }
                }

                let mut closed = false;
                while let Some(out) = meter.take_output() {
                    if frame_tx.send(out).await.is_err() {
                        closed = true;
                        break;
                    }
                }
                if closed {
                    break;
                }
            }
        }
    }

    info!("Virtual meter task ended for {}", meter.name());
    meter
}
