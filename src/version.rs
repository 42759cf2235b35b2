//! Protocol version.

/// SPDY protocol version carried in every control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Version {
    /// SPDY/2.
    V2,
    /// SPDY/3.
    #[default]
    V3,
}

impl Version {
    /// The oldest version this crate speaks.
    ///
    /// Used when a frame must be answered without any stream context that
    /// would tell which version was negotiated.
    pub fn lowest() -> Self {
        Self::V2
    }

    /// Wire value of the version field.
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    /// Parse the wire value, `None` for versions we do not speak.
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            2 => Some(Self::V2),
            3 => Some(Self::V3),
            _ => None,
        }
    }

    /// Get human-readable version string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V2 => "SPDY/2",
            Self::V3 => "SPDY/3",
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
