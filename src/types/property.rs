//! Device-wide informational properties.

/// A device-wide property reported by informational frames.
///
/// The first six are selected by the third character of an `ID` frame;
/// the input count arrives in its own `ICN` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Model identifier (`IDM`)
    Model,
    /// Sales region (`IDR`)
    Region,
    /// Software/firmware version (`IDS`)
    SoftwareVersion,
    /// Software build date (`IDB`)
    SoftwareBuildDate,
    /// Hardware version (`IDH`)
    HardwareVersion,
    /// MAC address (`IDN`)
    MacAddress,
    /// Number of available inputs (`ICN`)
    NumAvailableInputs,
}

impl Property {
    /// Stable key string under which the property is published.
    pub fn name(self) -> &'static str {
        match self {
            Property::Model => "model",
            Property::Region => "region",
            Property::SoftwareVersion => "softwareVersion",
            Property::SoftwareBuildDate => "softwareBuildDate",
            Property::HardwareVersion => "hardwareVersion",
            Property::MacAddress => "macAddress",
            Property::NumAvailableInputs => "numAvailableInputs",
        }
    }

    /// Look up the property selected by the third character of an `ID`
    /// frame. Returns `None` for unrecognized selectors.
    pub fn from_id_selector(selector: char) -> Option<Self> {
        match selector {
            'M' => Some(Property::Model),
            'R' => Some(Property::Region),
            'S' => Some(Property::SoftwareVersion),
            'B' => Some(Property::SoftwareBuildDate),
            'H' => Some(Property::HardwareVersion),
            'N' => Some(Property::MacAddress),
            _ => None,
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
