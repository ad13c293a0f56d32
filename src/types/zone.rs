//! Zone identifiers.

/// A controllable zone of the processor.
///
/// Each zone carries a stable single-character wire code used both in
/// outbound commands (`Z1POW1`) and inbound frames. The set of zones is
/// fixed; frames naming any other code are dropped by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Main listening zone (wire code `1`)
    Main,
    /// Second zone (wire code `2`)
    Zone2,
}

impl Zone {
    /// All zones known to the client, in polling order.
    pub const ALL: [Zone; 2] = [Zone::Main, Zone::Zone2];

    /// The single-character wire code of this zone.
    pub fn wire_code(self) -> char {
        match self {
            Zone::Main => '1',
            Zone::Zone2 => '2',
        }
    }

    /// Look up a zone from its wire code.
    ///
    /// Returns `None` for codes outside the fixed enumeration.
    pub fn from_wire(code: char) -> Option<Self> {
        match code {
            '1' => Some(Zone::Main),
            '2' => Some(Zone::Zone2),
            _ => None,
        }
    }

    /// Dense index of this zone, usable for per-zone bookkeeping arrays.
    pub fn index(self) -> usize {
        match self {
            Zone::Main => 0,
            Zone::Zone2 => 1,
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Main => write!(f, "main"),
            Zone::Zone2 => write!(f, "zone2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_code_roundtrip() {
        for zone in Zone::ALL {
            assert_eq!(Zone::from_wire(zone.wire_code()), Some(zone));
        }
    }

    #[test]
    fn test_invalid_wire_code() {
        assert_eq!(Zone::from_wire('3'), None);
        assert_eq!(Zone::from_wire('0'), None);
        assert_eq!(Zone::from_wire('x'), None);
    }

    #[test]
    fn test_index_is_dense() {
        assert_eq!(Zone::Main.index(), 0);
        assert_eq!(Zone::Zone2.index(), 1);
    }
}
