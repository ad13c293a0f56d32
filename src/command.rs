//! Outbound command construction.
//!
//! A [`Command`] holds the fully formatted ASCII payload written to the
//! socket, terminator included. Commands are built exclusively through the
//! named factories below, so a malformed payload cannot be constructed.
//! Numeric fields are zero-padded to two digits; query variants carry a
//! literal `?` instead of a value.

use crate::types::{Zone, TERMINATOR};

/// An immutable, fully formatted outbound command.
///
/// Created on demand when the host issues an intent or when the connection
/// manager needs to query or poll; consumed exactly once by the writer loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    payload: String,
}

impl Command {
    fn zone_cmd(zone: Zone, body: impl std::fmt::Display) -> Self {
        Self {
            payload: format!("Z{}{}{}", zone.wire_code(), body, TERMINATOR),
        }
    }

    fn device_cmd(body: impl std::fmt::Display) -> Self {
        Self {
            payload: format!("{}{}", body, TERMINATOR),
        }
    }

    /// The full ASCII payload, terminator included.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Turn a zone's power on.
    pub fn power_on(zone: Zone) -> Self {
        Self::zone_cmd(zone, "POW1")
    }

    /// Turn a zone's power off.
    pub fn power_off(zone: Zone) -> Self {
        Self::zone_cmd(zone, "POW0")
    }

    /// Query a zone's power state.
    pub fn power_query(zone: Zone) -> Self {
        Self::zone_cmd(zone, "POW?")
    }

    /// Set a zone's volume in dB. Negative levels are attenuation.
    pub fn volume_set(zone: Zone, db: i32) -> Self {
        Self::zone_cmd(zone, format_args!("VOL{db:02}"))
    }

    /// Raise a zone's volume by `step` dB.
    pub fn volume_up(zone: Zone, step: u32) -> Self {
        Self::zone_cmd(zone, format_args!("VUP{step:02}"))
    }

    /// Lower a zone's volume by `step` dB.
    pub fn volume_down(zone: Zone, step: u32) -> Self {
        Self::zone_cmd(zone, format_args!("VDN{step:02}"))
    }

    /// Query a zone's volume.
    pub fn volume_query(zone: Zone) -> Self {
        Self::zone_cmd(zone, "VOL?")
    }

    /// Mute a zone.
    pub fn mute_on(zone: Zone) -> Self {
        Self::zone_cmd(zone, "MUT1")
    }

    /// Unmute a zone.
    pub fn mute_off(zone: Zone) -> Self {
        Self::zone_cmd(zone, "MUT0")
    }

    /// Query a zone's mute state.
    pub fn mute_query(zone: Zone) -> Self {
        Self::zone_cmd(zone, "MUT?")
    }

    /// Select a zone's active input (1-based).
    pub fn input_select(zone: Zone, input: u32) -> Self {
        Self::zone_cmd(zone, format_args!("INP{input:02}"))
    }

    /// Query a zone's active input.
    pub fn input_query(zone: Zone) -> Self {
        Self::zone_cmd(zone, "INP?")
    }

    /// Query the number of available inputs.
    pub fn input_count_query() -> Self {
        Self::device_cmd("ICN?")
    }

    /// Query the short display name of an input.
    pub fn input_short_name_query(input: u32) -> Self {
        Self::device_cmd(format_args!("ISN{input:02}?"))
    }

    /// Query the long display name of an input.
    pub fn input_long_name_query(input: u32) -> Self {
        Self::device_cmd(format_args!("ILN{input:02}?"))
    }

    /// Query the device model.
    pub fn model_query() -> Self {
        Self::device_cmd("IDM?")
    }

    /// Query the sales region.
    pub fn region_query() -> Self {
        Self::device_cmd("IDR?")
    }

    /// Query the software version.
    pub fn software_version_query() -> Self {
        Self::device_cmd("IDS?")
    }

    /// Query the software build date.
    pub fn software_build_date_query() -> Self {
        Self::device_cmd("IDB?")
    }

    /// Query the hardware version.
    pub fn hardware_version_query() -> Self {
        Self::device_cmd("IDH?")
    }

    /// Query the MAC address.
    pub fn mac_address_query() -> Self {
        Self::device_cmd("IDN?")
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Trim the terminator for log readability
        f.write_str(self.payload.trim_end_matches(TERMINATOR))
    }
}
