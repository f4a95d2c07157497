//! Quality profiles
//!
//! A quality profile is a named speed multiplier applied to every chunk of
//! a request. The set is fixed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

/// Named synthesis speed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityProfile {
    Fast,
    #[default]
    Balanced,
    High,
    Premium,
}

impl QualityProfile {
    /// Every profile, fastest first
    pub const ALL: [QualityProfile; 4] = [
        QualityProfile::Fast,
        QualityProfile::Balanced,
        QualityProfile::High,
        QualityProfile::Premium,
    ];

    /// Speed multiplier passed to the model
    pub fn speed(&self) -> f32 {
        match self {
            QualityProfile::Fast => 1.2,
            QualityProfile::Balanced => 1.0,
            QualityProfile::High => 0.8,
            QualityProfile::Premium => 0.7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityProfile::Fast => "fast",
            QualityProfile::Balanced => "balanced",
            QualityProfile::High => "high",
            QualityProfile::Premium => "premium",
        }
    }

    /// Serializable `{name: {speed}}` table of all profiles
    pub fn table() -> QualityTable {
        QualityTable
    }
}

impl fmt::Display for QualityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityProfile {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityProfile::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownQuality(s.to_string()))
    }
}

/// Serializes as `{"fast": {"speed": 1.2}, ...}` in profile order
#[derive(Debug, Clone, Copy)]
pub struct QualityTable;

#[derive(Serialize)]
struct QualitySpeed {
    speed: f32,
}

impl Serialize for QualityTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            QualityProfile::ALL
                .iter()
                .map(|q| (q.as_str(), QualitySpeed { speed: q.speed() })),
        )
    }
}
