//! Per-zone state channels and decoded values.

/// A per-zone state channel.
///
/// Every decoded zone frame maps onto exactly one channel; the host
/// publishes the accompanying [`Value`] under the (zone, channel) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Zone power state
    Power,
    /// Volume in dB (negative values are attenuation)
    VolumeDb,
    /// Mute state
    Mute,
    /// Active input number (1-based)
    ActiveInput,
    /// Short display name of the active input
    ActiveInputShortName,
    /// Long display name of the active input
    ActiveInputLongName,
}

impl Channel {
    /// Stable channel identifier string.
    pub fn id(self) -> &'static str {
        match self {
            Channel::Power => "power",
            Channel::VolumeDb => "volume-db",
            Channel::Mute => "mute",
            Channel::ActiveInput => "active-input",
            Channel::ActiveInputShortName => "active-input-short-name",
            Channel::ActiveInputLongName => "active-input-long-name",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// A decoded channel value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Two-state on/off value (power, mute)
    Switch(bool),
    /// Signed dB level
    Decibel(i32),
    /// Positive numeric value (input number)
    Number(u32),
    /// Free-form text (input names)
    Text(String),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Switch(true) => write!(f, "on"),
            Value::Switch(false) => write!(f, "off"),
            Value::Decibel(db) => write!(f, "{db} dB"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}
