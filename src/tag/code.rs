//! Tag code formatting.

use chrono::{Local, NaiveDateTime};
use std::fmt;

const TAG_PREFIX: &str = "IMG_";
const TAG_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Human-readable timestamp tag, e.g. `IMG_20240315_093005`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagCode(String);

impl TagCode {
    /// Builds the tag for a given local wall-clock time.
    pub fn from_datetime(at: &NaiveDateTime) -> Self {
        Self(format!("{}{}", TAG_PREFIX, at.format(TAG_FORMAT)))
    }

    /// Builds the tag for the current local time.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now().naive_local())
    }

    /// The code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TagCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
