//! Bridge result states.
//!
//! The default engine operations never fail: they degrade to empty output.
//! The `try_*` variants report why through [`BridgeError`].

/// Why an operation produced less than expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    /// B01: Channel handle not configured
    NoChannel,
    /// B02: Settle window closed before any response arrived
    WindowExpired,
    /// B03: Bounded buffer overflowed, output cut short
    Truncated,
}

impl BridgeError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoChannel => "B01",
            Self::WindowExpired => "B02",
            Self::Truncated => "B03",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoChannel => "no channel configured",
            Self::WindowExpired => "no response within window",
            Self::Truncated => "output truncated",
        }
    }
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
