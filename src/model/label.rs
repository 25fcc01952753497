//! Soil type labels shared by the classifier, the aggregator and datasets

use crate::io::error::SoilError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Soil type category, ordered as in the training label set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoilLabel {
    /// Fine, cohesive soil
    Clay,
    /// Coarse rock fragments
    Gravel,
    /// Dark organic soil
    Humus,
    /// Loose granular soil
    Sand,
    /// Fine granular soil between sand and clay
    Silt,
}

impl SoilLabel {
    /// Every label, in training order
    pub const ALL: [Self; 5] = [Self::Clay, Self::Gravel, Self::Humus, Self::Sand, Self::Silt];

    /// Capitalized name, as used for dataset directories and reports
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clay => "Clay",
            Self::Gravel => "Gravel",
            Self::Humus => "Humus",
            Self::Sand => "Sand",
            Self::Silt => "Silt",
        }
    }
}

impl fmt::Display for SoilLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SoilLabel {
    type Err = SoilError;

    /// Parse a label name, ignoring ASCII case and surrounding whitespace
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| SoilError::UnknownLabel {
                text: s.to_string(),
            })
    }
}
