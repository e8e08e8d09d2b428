//! Multimeter Telemetry Protocol Library
//!
//! This crate decodes the measurement frames streamed by UT61E+ family
//! multimeters into a [`Snapshot`] the UI can render:
//!
//! - **Frames**: fixed-layout binary frames (`AB CD` magic, length, function,
//!   range digit, seven LCD characters, bar graph, three status bytes)
//! - **Range tables**: per-variant calibration data resolving the range digit
//!   to a label, unit, and bounds
//! - **Commands**: six byte host-to-meter frames for button presses and requests
//!
//! # Architecture
//!
//! Decoding is a pure function of the frame bytes and a [`RangeTable`].
//! Malformed frames come back as a [`FrameError`] and leave the snapshot
//! untouched; the caller simply waits for the next frame. Loading range
//! tables from calibration documents lives in the `dmm-calibration` crate.
//!
//! # Example
//!
//! ```rust
//! use dmm_protocol::{decode, FunctionMode, RangeTable};
//!
//! let frame = [
//!     0xAB, 0xCD, 14, 3, b'0', b' ', b' ', b'1', b'.', b'2', b'3', b'4', 0, 5, 0x00, 0x00, 0x00,
//! ];
//! let snapshot = decode(&frame, &RangeTable::new()).unwrap();
//!
//! assert_eq!(snapshot.function, Some(FunctionMode::DcMv));
//! assert_eq!(snapshot.raw_value(), Some("1.234"));
//! assert!(snapshot.is_auto());
//! ```

pub mod command;
pub mod display;
pub mod error;
pub mod frame;
pub mod function;
pub mod range;
pub mod reading;
pub mod snapshot;
pub mod units;

pub use command::DeviceCommand;
pub use error::{CommandError, FrameError};
pub use frame::{Frame, StatusFlags};
pub use function::FunctionMode;
pub use range::{FunctionRanges, RangeEntry, RangeSlot, RangeTable};
pub use reading::Reading;
pub use snapshot::{decode, MaxMinIcon, Snapshot};
pub use units::ScaledReading;
