//! Job parameters: tape margin, print density, cut behaviour.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Margin {
    None,
    Small,
    Medium,
    Large,
}

impl Margin {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0x01,
            Self::Small => 0x40,
            Self::Medium => 0x80,
            Self::Large => 0x02,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::None),
            1 => Some(Self::Small),
            2 => Some(Self::Medium),
            3 => Some(Self::Large),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
}

impl Density {
    /// Signed offset around the device's nominal density, as raw bytes.
    pub fn code(self) -> u8 {
        match self {
            Self::Level1 => 0xFE,
            Self::Level2 => 0xFF,
            Self::Level3 => 0x00,
            Self::Level4 => 0x01,
            Self::Level5 => 0x02,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Level1),
            2 => Some(Self::Level2),
            3 => Some(Self::Level3),
            4 => Some(Self::Level4),
            5 => Some(Self::Level5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutMode {
    None,
    Half,
    Full,
}

impl CutMode {
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0xFF,
            Self::Half => 0x01,
            Self::Full => 0x00,
        }
    }

    pub fn from_mode(mode: u8) -> Option<Self> {
        match mode {
            0 => Some(Self::None),
            1 => Some(Self::Half),
            2 => Some(Self::Full),
            _ => None,
        }
    }
}
