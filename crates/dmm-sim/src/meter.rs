//! Virtual meter simulation
//!
//! Provides a simulated meter that answers host command frames the way a
//! UT61E+ does and produces measurement frames from its current state.

use std::collections::VecDeque;

use dmm_protocol::{
    command::parse_command_frame,
    frame::{append_checksum, MAGIC},
    CommandError, DeviceCommand, Frame, FunctionMode, Reading, StatusFlags,
};
use serde::{Deserialize, Serialize};

/// A simulated meter that queues protocol-accurate responses
#[derive(Debug)]
pub struct VirtualMeter {
    /// Name reported for `RequestName`
    name: String,
    /// Current measurement function
    function: FunctionMode,
    /// Current range index
    range_index: i32,
    /// Number of manual ranges `Range` steps through
    range_count: i32,
    /// LCD reading
    reading: Reading,
    /// Bar graph fill
    bar_progress: i16,
    /// Status bits reported in each frame
    flags: StatusFlags,
    /// Backlight state (not reported in frames)
    lamp: bool,
    /// Pending output frames
    pending_output: VecDeque<Vec<u8>>,
}

/// Configuration for creating a virtual meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMeterConfig {
    /// Name reported to the host
    pub name: String,
    /// Initial measurement function
    pub function: FunctionMode,
    /// Initial range index
    pub range_index: i32,
    /// Number of manual ranges
    pub range_count: i32,
    /// Initial LCD text
    pub reading: String,
    /// Initial bar graph fill
    pub bar_progress: i16,
}

impl Default for VirtualMeterConfig {
    fn default() -> Self {
        Self {
            name: "UT61E+".to_string(),
            function: FunctionMode::DcV,
            range_index: 0,
            range_count: 4,
            reading: "0.0000".to_string(),
            bar_progress: 0,
        }
    }
}

impl VirtualMeter {
    /// Create a new virtual meter with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(VirtualMeterConfig {
            name: name.into(),
            ..VirtualMeterConfig::default()
        })
    }

    /// Create a virtual meter from configuration
    pub fn from_config(config: VirtualMeterConfig) -> Self {
        Self {
            name: config.name,
            function: config.function,
            range_index: config.range_index,
            range_count: config.range_count.max(1),
            reading: Reading::from_text(&config.reading),
            bar_progress: config.bar_progress,
            flags: StatusFlags {
                auto: true,
                dc: true,
                ..StatusFlags::default()
            },
            lamp: false,
            pending_output: VecDeque::new(),
        }
    }

    /// Get the meter's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current function
    pub fn function(&self) -> FunctionMode {
        self.function
    }

    /// Switch function, returning to auto range and clearing recording modes
    pub fn set_function(&mut self, function: FunctionMode) {
        if self.function != function {
            self.function = function;
            self.range_index = 0;
            self.flags = StatusFlags {
                auto: true,
                dc: !is_ac(function),
                battery: self.flags.battery,
                ..StatusFlags::default()
            };
        }
    }

    /// Get the current range index
    pub fn range_index(&self) -> i32 {
        self.range_index
    }

    /// Get the LCD reading
    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    /// Set the LCD text; ignored while HOLD is on
    pub fn set_reading(&mut self, text: &str) {
        if !self.flags.hold {
            self.reading = Reading::from_text(text);
        }
    }

    /// Set the bar graph fill, negative values setting the polarity bit
    pub fn set_bar_progress(&mut self, progress: i16) {
        self.bar_progress = progress;
        self.flags.bar_polarity_negative = progress < 0;
    }

    /// Get the status bits
    pub fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Set the low battery indicator
    pub fn set_battery_warning(&mut self, on: bool) {
        self.flags.battery = on;
    }

    /// Get the backlight state
    pub fn lamp(&self) -> bool {
        self.lamp
    }

    /// Current state as a measurement frame
    pub fn frame(&self) -> Frame {
        Frame {
            function: self.function,
            range_index: self.range_index,
            reading: self.reading.clone(),
            bar_progress: self.bar_progress,
            flags: self.flags,
        }
    }

    /// Encode the current state as a full measurement frame
    pub fn encode_frame(&self) -> Vec<u8> {
        self.frame().encode()
    }

    /// Apply a button press or request
    ///
    /// Requests queue their response; button presses queue an acknowledgement.
    pub fn apply_command(&mut self, cmd: DeviceCommand) {
        match cmd {
            DeviceCommand::RequestMeasurement => {
                let frame = self.encode_frame();
                self.pending_output.push_back(frame);
                return;
            }
            DeviceCommand::RequestName => {
                self.acknowledge(cmd);
                let name = response_frame(self.name.as_bytes());
                self.pending_output.push_back(name);
                return;
            }
            DeviceCommand::Hold => self.flags.hold = !self.flags.hold,
            DeviceCommand::Rel => self.flags.rel = !self.flags.rel,
            DeviceCommand::MinMax => {
                // MAX -> MIN -> MAX ...
                let (max, min) = (
                    !self.flags.max || self.flags.min,
                    self.flags.max && !self.flags.min,
                );
                self.flags.max = max;
                self.flags.min = min;
                self.flags.auto = false;
            }
            DeviceCommand::ExitMinMax => {
                self.flags.max = false;
                self.flags.min = false;
            }
            DeviceCommand::PeakMinMax => {
                let (max, min) = (
                    !self.flags.peak_max || self.flags.peak_min,
                    self.flags.peak_max && !self.flags.peak_min,
                );
                self.flags.peak_max = max;
                self.flags.peak_min = min;
            }
            DeviceCommand::ExitPeak => {
                self.flags.peak_max = false;
                self.flags.peak_min = false;
            }
            DeviceCommand::Range => {
                if self.flags.auto {
                    self.flags.auto = false;
                } else {
                    self.range_index = (self.range_index + 1) % self.range_count;
                }
            }
            DeviceCommand::Auto => self.flags.auto = true,
            DeviceCommand::Lamp => self.lamp = !self.lamp,
            DeviceCommand::Select1 => {
                if has_coupling_select(self.function) {
                    self.flags.dc = !self.flags.dc;
                }
            }
            DeviceCommand::Select2 => match self.function {
                FunctionMode::Frequency => self.set_function(FunctionMode::DutyCycle),
                FunctionMode::DutyCycle => self.set_function(FunctionMode::Frequency),
                _ => tracing::debug!("{}: SELECT2 has no effect in {}", self.name, self.function),
            },
        }
        self.acknowledge(cmd);
    }

    /// Handle one host command frame
    ///
    /// Frames that fail to parse are dropped with nothing queued.
    pub fn process_request(&mut self, bytes: &[u8]) -> Result<DeviceCommand, CommandError> {
        match parse_command_frame(bytes) {
            Ok(cmd) => {
                tracing::debug!("{} received {}", self.name, cmd.name());
                self.apply_command(cmd);
                Ok(cmd)
            }
            Err(e) => {
                tracing::debug!("{} dropped request {:02X?}: {}", self.name, bytes, e);
                Err(e)
            }
        }
    }

    /// Take the next pending output frame
    pub fn take_output(&mut self) -> Option<Vec<u8>> {
        self.pending_output.pop_front()
    }

    /// Check if there is pending output
    pub fn has_output(&self) -> bool {
        !self.pending_output.is_empty()
    }

    /// Clear all pending output
    pub fn clear_output(&mut self) {
        self.pending_output.clear();
    }

    /// Get the number of pending output frames
    pub fn output_count(&self) -> usize {
        self.pending_output.len()
    }

    /// Get a summary of current state
    pub fn state_summary(&self) -> String {
        format!(
            "{} - {} {} range {}{}",
            self.name,
            self.function,
            self.reading,
            self.range_index,
            if self.flags.hold { " [HOLD]" } else { "" }
        )
    }

    fn acknowledge(&mut self, cmd: DeviceCommand) {
        self.pending_output.push_back(response_frame(&[cmd.code()]));
    }
}

/// Wrap a payload as a meter response: `AB CD [len] payload [sum_hi sum_lo]`
///
/// `len` counts the payload and the checksum.
pub fn response_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 5);
    out.extend_from_slice(&MAGIC);
    out.push((payload.len() + 2) as u8);
    out.extend_from_slice(payload);
    append_checksum(&mut out);
    out
}

fn is_ac(function: FunctionMode) -> bool {
    matches!(
        function,
        FunctionMode::AcV
            | FunctionMode::AcMv
            | FunctionMode::AcUa
            | FunctionMode::AcMa
            | FunctionMode::AcA
            | FunctionMode::AcA2
            | FunctionMode::LozV
            | FunctionMode::Lpf
            | FunctionMode::Lpf2
            | FunctionMode::Lpf3
    )
}

fn has_coupling_select(function: FunctionMode) -> bool {
    matches!(
        function,
        FunctionMode::AcV
            | FunctionMode::DcV
            | FunctionMode::AcMv
            | FunctionMode::DcMv
            | FunctionMode::AcUa
            | FunctionMode::DcUa
            | FunctionMode::AcMa
            | FunctionMode::DcMa
            | FunctionMode::AcA
            | FunctionMode::DcA
    )
}
