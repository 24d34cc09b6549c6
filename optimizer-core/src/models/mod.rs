//! Data models
//!
//! Records owned by the persistence layer. The optimizer only reads them,
//! except for implementation records which the plan generator creates.

pub mod architecture;
pub mod threat;
pub mod measure;
pub mod implementation;

pub use architecture::*;
pub use threat::*;
pub use measure::*;
pub use implementation::*;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// SHARED LEVEL SCALE
// ============================================================================

/// Four-step scale used for asset criticality, attribute priority and threat severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
            Level::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Level::Low),
            "medium" => Ok(Level::Medium),
            "high" => Ok(Level::High),
            "critical" => Ok(Level::Critical),
            _ => Err(UnknownVariant::new("level", s)),
        }
    }
}

/// Returned when a stored enum column holds an unexpected value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} value {:?}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse() {
        assert_eq!("HIGH".parse::<Level>().unwrap(), Level::High);
        assert_eq!(" critical ".parse::<Level>().unwrap(), Level::Critical);
        assert!("extreme".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(Level::Critical > Level::High);
        assert!(Level::Low < Level::Medium);
    }
}
