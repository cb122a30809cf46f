use std::fmt;

use serde::{Deserialize, Serialize};

/// Upstream sync progress for a timeline, reported by the sync layer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    #[default]
    NotLoaded,
    Preloaded,
    PartiallyLoaded,
    FullyLoaded,
}

impl ProviderState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotLoaded => "not_loaded",
            Self::Preloaded => "preloaded",
            Self::PartiallyLoaded => "partially_loaded",
            Self::FullyLoaded => "fully_loaded",
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderState {
    type Error = &'static str;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "not_loaded" => Ok(Self::NotLoaded),
            "preloaded" => Ok(Self::Preloaded),
            "partially_loaded" => Ok(Self::PartiallyLoaded),
            "fully_loaded" => Ok(Self::FullyLoaded),
            _ => Err("invalid provider state"),
        }
    }
}
