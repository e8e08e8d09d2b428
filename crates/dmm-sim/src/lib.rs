//! Multimeter Simulation Library
//!
//! This crate provides a simulated UT61E+ for exercising the decoder and the
//! command-line tools without a physical meter. It includes:
//!
//! - **VirtualMeter**: Holds meter state and answers host command frames
//! - **run_virtual_meter_task**: Async actor streaming frames on an interval
//!
//! # Example
//!
//! ```rust
//! use dmm_sim::VirtualMeter;
//! use dmm_protocol::{DeviceCommand, FunctionMode};
//!
//! let mut meter = VirtualMeter::new("UT61E+");
//! meter.set_function(FunctionMode::AcV);
//! meter.set_reading("230.1");
//!
//! // A host asking for a measurement gets one frame back
//! meter.process_request(&DeviceCommand::RequestMeasurement.encode()).unwrap();
//! while let Some(bytes) = meter.take_output() {
//!     println!("Meter output: {:02X?}", bytes);
//! }
//! ```

pub mod meter;
pub mod meter_task;

pub use meter::{response_frame, VirtualMeter, VirtualMeterConfig};
pub use meter_task::{run_virtual_meter_task, VirtualMeterCommand};
