//! Handler priority tiers.
//!
//! # Design Decisions
//! - Variants are declared most-urgent first; `Ord` follows declaration
//!   order, so an ascending sort puts `Highest` at the front
//! - Serialized as lowercase names so config files read naturally

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordering tier used to decide which of several same-index handlers is
/// authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Highest,
    High,
    #[default]
    Default,
    Low,
    Lowest,
}

impl Priority {
    /// Every tier, in dispatch order.
    pub const ALL: [Priority; 5] = [
        Priority::Highest,
        Priority::High,
        Priority::Default,
        Priority::Low,
        Priority::Lowest,
    ];

    /// Position in dispatch order (0 runs first).
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Highest => "highest",
            Priority::High => "high",
            Priority::Default => "default",
            Priority::Low => "low",
            Priority::Lowest => "lowest",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown priority name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority '{0}' (expected one of highest, high, default, low, lowest)")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePriorityError(s.to_string()))
    }
}
