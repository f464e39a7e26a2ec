use std::fmt;
use std::str::FromStr;

/// Identifier for a single bridged call, backed by ULID.
///
/// Every invocation of [`DispatchBridge`](crate::bridge::DispatchBridge) gets a
/// fresh id. It is written into the emulated request's attribute store and
/// attached to every log line the call emits.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct CallId(ulid::Ulid);

impl CallId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a caller-supplied id when it is a valid ULID, else mint one
    #[must_use]
    pub fn from_metadata_or_new(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for CallId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(CallId)
    }
}
