#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tape {
    W6,
    W9,
    W12,
    W18,
    W24,
}

impl Tape {
    /// Identification code sent back to the printer in the tape check.
    /// The upper byte doubles as the width sensor id.
    pub fn code(self) -> u16 {
        match self {
            Self::W6 => 0x8100,
            Self::W9 => 0x8500,
            Self::W12 => 0x8303,
            Self::W18 => 0x8703,
            Self::W24 => 0x8603,
        }
    }

    pub fn width_mm(self) -> u8 {
        match self {
            Self::W6 => 6,
            Self::W9 => 9,
            Self::W12 => 12,
            Self::W18 => 18,
            Self::W24 => 24,
        }
    }

    /// Decode the width sensor byte of a get-tape response.
    pub fn from_sensor(byte: u8) -> Option<Self> {
        match byte {
            0x81 => Some(Self::W6),
            0x85 => Some(Self::W9),
            0x83 => Some(Self::W12),
            0x87 => Some(Self::W18),
            0x86 => Some(Self::W24),
            _ => None,
        }
    }

    pub fn from_mm(mm: u8) -> Option<Self> {
        match mm {
            6 => Some(Self::W6),
            9 => Some(Self::W9),
            12 => Some(Self::W12),
            18 => Some(Self::W18),
            24 => Some(Self::W24),
            _ => None,
        }
    }
}
