//! BACnet Load Control: commandable outputs with 16-level priority arrays,
//! the demand-response shed state machine, and read/write-property dispatch
//! over both, plus a scenario simulator to drive them.

/// Application-tag encoding of property values.
pub mod codec;
pub mod config;
/// BACnet date and time values.
pub mod datetime;
pub mod device;
/// Read-property and write-property routing.
pub mod dispatch;
pub mod error;
pub mod io;
pub mod load_control;
/// Object types, directories and commandable outputs.
pub mod object;
/// Simulation engine, clocks, schedules, and events.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
