//! Inbound frame parser.
//!
//! Stateless, pattern-driven decoding of one inbound ASCII frame into a
//! [`Decoded`] classification. Malformed frames never surface as errors:
//! they are trace-logged and dropped, and one bad frame only ever costs
//! that one frame.

use tracing::trace;

use crate::types::{Property, Zone, MIN_FRAME_LENGTH, TERMINATOR};

/// Classification of one well-formed inbound frame.
///
/// Explicit no-match is `None` from [`parse_frame`]; there is no panic or
/// error path out of the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A zone-prefixed state report
    ZoneState {
        /// Zone the frame addressed
        zone: Zone,
        /// Decoded state payload
        state: ZoneState,
    },
    /// A device-wide informational report (`ID` frames)
    Info {
        /// Which property was reported
        property: Property,
        /// Raw string value as received
        value: String,
    },
    /// Number of available inputs (`ICN`)
    InputCount {
        /// Parsed count
        count: u32,
        /// Raw value string as received (published verbatim)
        value: String,
    },
    /// Short display name of one input (`ISN`)
    InputShortName {
        /// Input index as received, e.g. `"01"`
        index: String,
        /// Display name
        name: String,
    },
    /// Long display name of one input (`ILN`)
    InputLongName {
        /// Input index as received, e.g. `"01"`
        index: String,
        /// Display name
        name: String,
    },
    /// A device-reported error (`!` frames)
    DeviceError(String),
}

/// A decoded per-zone state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    /// Power on/off
    Power(bool),
    /// Volume in dB; negative is attenuation
    Volume(i32),
    /// Mute on/off
    Mute(bool),
    /// Active input number, always positive
    ActiveInput(u32),
}

/// Parse one raw inbound frame (a complete line up to and including the
/// terminator) into its classification.
///
/// Returns `None` for empty, blank, short, unterminated, or otherwise
/// unrecognized frames; those are dropped silently apart from a trace log.
pub fn parse_frame(raw: &str) -> Option<Decoded> {
    if raw.trim().is_empty() || raw.len() < MIN_FRAME_LENGTH {
        trace!(frame = raw, "dropping empty or short frame");
        return None;
    }
    let msg = raw.trim();
    let Some(msg) = msg.strip_suffix(TERMINATOR) else {
        trace!(frame = raw, "dropping unterminated frame");
        return None;
    };
    let msg = msg.trim();

    if msg.starts_with('Z') {
        parse_zone_frame(msg)
    } else if msg.starts_with("ID") {
        parse_info_frame(msg)
    } else if let Some(rest) = msg.strip_prefix("ICN") {
        parse_input_count(rest)
    } else if let Some(rest) = msg.strip_prefix("ISN") {
        parse_input_name(rest, true)
    } else if let Some(rest) = msg.strip_prefix("ILN") {
        parse_input_name(rest, false)
    } else if let Some(text) = msg.strip_prefix('!') {
        Some(Decoded::DeviceError(text.to_string()))
    } else {
        trace!(frame = msg, "dropping unrecognized frame");
        None
    }
}

/// Decode `Z<digit><POW|VOL|MUT|INP><payload>`.
fn parse_zone_frame(msg: &str) -> Option<Decoded> {
    let zone_code = msg.chars().nth(1)?;
    let Some(zone) = Zone::from_wire(zone_code) else {
        trace!(frame = msg, code = %zone_code, "dropping frame for unknown zone");
        return None;
    };
    // Slices via `get` so a stray multi-byte character cannot panic; a
    // frame whose token region is not plain ASCII matches no arm below.
    let Some(token) = msg.get(2..5) else {
        trace!(frame = msg, "dropping truncated zone frame");
        return None;
    };
    let payload = msg.get(5..).unwrap_or("");

    let state = match token {
        "POW" => ZoneState::Power(parse_switch(payload)?),
        "VOL" => ZoneState::Volume(payload.parse().ok()?),
        "MUT" => ZoneState::Mute(parse_switch(payload)?),
        "INP" => {
            let input: u32 = payload.parse().ok()?;
            if input == 0 {
                trace!(frame = msg, "dropping zero input number");
                return None;
            }
            ZoneState::ActiveInput(input)
        }
        _ => {
            trace!(frame = msg, "dropping zone frame with unknown token");
            return None;
        }
    };
    Some(Decoded::ZoneState { zone, state })
}

/// Decode a two-state `1`/`0` payload. Query echoes (`?`) don't match.
fn parse_switch(payload: &str) -> Option<bool> {
    match payload {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

/// Decode `ID<selector><value>`; the third character picks the property.
fn parse_info_frame(msg: &str) -> Option<Decoded> {
    let selector = msg.chars().nth(2)?;
    let Some(property) = Property::from_id_selector(selector) else {
        trace!(frame = msg, selector = %selector, "unknown informational selector");
        return None;
    };
    Some(Decoded::Info {
        property,
        value: msg[3..].to_string(),
    })
}

/// Decode the remainder of an `ICN` frame into an input count.
fn parse_input_count(rest: &str) -> Option<Decoded> {
    let count: u32 = rest.parse().ok().or_else(|| {
        trace!(value = rest, "unparseable input count");
        None
    })?;
    Some(Decoded::InputCount {
        count,
        value: rest.to_string(),
    })
}

/// Decode the remainder of an `ISN`/`ILN` frame: leading digits are the
/// input index key, the rest is the display name.
fn parse_input_name(rest: &str, short: bool) -> Option<Decoded> {
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        trace!(value = rest, "input name frame without index");
        return None;
    }
    let index = rest[..digits_end].to_string();
    let name = rest[digits_end..].to_string();
    Some(if short {
        Decoded::InputShortName { index, name }
    } else {
        Decoded::InputLongName { index, name }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_frame() {
        assert_eq!(
            parse_frame("Z1POW1;"),
            Some(Decoded::ZoneState {
                zone: Zone::Main,
                state: ZoneState::Power(true),
            })
        );
        assert_eq!(
            parse_frame("Z2POW0;"),
            Some(Decoded::ZoneState {
                zone: Zone::Zone2,
                state: ZoneState::Power(false),
            })
        );
    }

    #[test]
    fn test_negative_volume_frame() {
        assert_eq!(
            parse_frame("Z2VOL-12;"),
            Some(Decoded::ZoneState {
                zone: Zone::Zone2,
                state: ZoneState::Volume(-12),
            })
        );
    }

    #[test]
    fn test_mute_and_input_frames() {
        assert_eq!(
            parse_frame("Z1MUT1;"),
            Some(Decoded::ZoneState {
                zone: Zone::Main,
                state: ZoneState::Mute(true),
            })
        );
        assert_eq!(
            parse_frame("Z1INP03;"),
            Some(Decoded::ZoneState {
                zone: Zone::Main,
                state: ZoneState::ActiveInput(3),
            })
        );
    }

    #[test]
    fn test_info_frames() {
        assert_eq!(
            parse_frame("IDM1234;"),
            Some(Decoded::Info {
                property: Property::Model,
                value: "1234".to_string(),
            })
        );
        assert_eq!(
            parse_frame("IDSv2.15;"),
            Some(Decoded::Info {
                property: Property::SoftwareVersion,
                value: "v2.15".to_string(),
            })
        );
        assert_eq!(
            parse_frame("IDN00-1A-2B-3C-4D-5E;"),
            Some(Decoded::Info {
                property: Property::MacAddress,
                value: "00-1A-2B-3C-4D-5E".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_info_selector_dropped() {
        assert_eq!(parse_frame("IDX123;"), None);
    }

    #[test]
    fn test_input_count_frame() {
        assert_eq!(
            parse_frame("ICN08;"),
            Some(Decoded::InputCount {
                count: 8,
                value: "08".to_string(),
            })
        );
        assert_eq!(parse_frame("ICNxx;"), None);
    }

    #[test]
    fn test_input_name_frames() {
        assert_eq!(
            parse_frame("ISN01Blu-ray;"),
            Some(Decoded::InputShortName {
                index: "01".to_string(),
                name: "Blu-ray".to_string(),
            })
        );
        assert_eq!(
            parse_frame("ILN02Living Room TV;"),
            Some(Decoded::InputLongName {
                index: "02".to_string(),
                name: "Living Room TV".to_string(),
            })
        );
        // Index but no name is still a valid reply
        assert_eq!(
            parse_frame("ISN03;"),
            Some(Decoded::InputShortName {
                index: "03".to_string(),
                name: String::new(),
            })
        );
        // No index at all is not
        assert_eq!(parse_frame("ISNBlu-ray;"), None);
    }

    #[test]
    fn test_device_error_frame() {
        assert_eq!(
            parse_frame("!E Out of range;"),
            Some(Decoded::DeviceError("E Out of range".to_string()))
        );
    }

    #[test]
    fn test_malformed_frames_drop_silently() {
        for frame in ["", "   ", "ab;", "Z1POW1", "Z1;", "xyz123;", "Z1POW1\n"] {
            assert_eq!(parse_frame(frame), None, "frame {frame:?} should drop");
        }
    }

    #[test]
    fn test_unknown_zone_dropped() {
        assert_eq!(parse_frame("Z9POW1;"), None);
        assert_eq!(parse_frame("Z0VOL10;"), None);
    }

    #[test]
    fn test_query_echo_dropped() {
        assert_eq!(parse_frame("Z1POW?;"), None);
        assert_eq!(parse_frame("Z1VOL?;"), None);
    }

    #[test]
    fn test_numeric_garbage_dropped() {
        assert_eq!(parse_frame("Z1VOLabc;"), None);
        assert_eq!(parse_frame("Z1INP00;"), None);
        assert_eq!(parse_frame("Z1INP-2;"), None);
        assert_eq!(parse_frame("Z1POW2;"), None);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let first = parse_frame("IDM1234;");
        let second = parse_frame("IDM1234;");
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        use crate::command::Command;

        for zone in Zone::ALL {
            for level in [-90, -12, 0, 5, 10] {
                let cmd = Command::volume_set(zone, level);
                let decoded = parse_frame(cmd.payload()).unwrap();
                assert_eq!(
                    decoded,
                    Decoded::ZoneState {
                        zone,
                        state: ZoneState::Volume(level),
                    }
                );
            }
        }
    }

    #[test]
    fn test_stray_multibyte_zone_frame_dropped() {
        assert_eq!(parse_frame("Z1\u{e9}POW1;"), None);
        assert_eq!(parse_frame("Z1P\u{e9}W1;"), None);
    }

    #[test]
    fn test_latin1_name_parses() {
        assert_eq!(
            parse_frame("ISN01Cin\u{e9}ma;"),
            Some(Decoded::InputShortName {
                index: "01".to_string(),
                name: "Cin\u{e9}ma".to_string(),
            })
        );
    }
}
