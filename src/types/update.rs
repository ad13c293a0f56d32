//! Decoded update variants.

use super::{Channel, Property, Value, Zone};

/// A decoded update produced from one inbound frame.
///
/// Updates are ephemeral: the parser builds one from a frame and the
/// dispatch layer consumes it immediately. The two variants mirror the two
/// host publication hooks (per-zone channel state vs. device property).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// A per-zone channel state update
    State {
        /// Zone the frame addressed
        zone: Zone,
        /// Channel the value belongs to
        channel: Channel,
        /// Decoded value
        value: Value,
    },
    /// A device-wide property update
    Property {
        /// Which property was reported
        property: Property,
        /// Raw string value as received
        value: String,
    },
}

impl Update {
    /// Build a state update.
    pub fn state(zone: Zone, channel: Channel, value: Value) -> Self {
        Update::State {
            zone,
            channel,
            value,
        }
    }

    /// Build a property update.
    pub fn property(property: Property, value: impl Into<String>) -> Self {
        Update::Property {
            property,
            value: value.into(),
        }
    }
}
