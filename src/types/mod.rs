//! Core protocol types.
//!
//! This module contains the typed vocabulary of the control protocol:
//!
//! - `Zone` - Zone identifier with its wire code
//! - `Channel` / `Value` - Per-zone state channels and decoded values
//! - `Property` - Device-wide informational properties
//! - `Update` - Decoded update variants (state or property)
//! - `ConnectionStatus` - Connectivity status reported to the host

mod channel;
mod property;
mod status;
mod update;
mod zone;

pub use channel::*;
pub use property::*;
pub use status::*;
pub use update::*;
pub use zone::*;

/// Terminator byte closing every frame in both directions.
pub const TERMINATOR: char = ';';

/// Minimum length of a meaningful inbound frame, terminator included.
pub const MIN_FRAME_LENGTH: usize = 4;
