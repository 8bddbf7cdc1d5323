// THEORY:
// The output contract of the classifier. Every path through the pipeline ends in
// a `ClassificationResult`, whether analysis succeeded (`clear` / `blocked`) or
// not (`obscured`). Serialized field names and enum values are lowercase
// snake_case so results can be logged or shipped as JSON unchanged.

use crate::error::ExtractionFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a bus stop is reachable, as judged from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnowStatus {
    /// Analysis succeeded and found no snow obstructing access.
    Clear,
    /// Snow likely blocks access to the bus.
    Blocked,
    /// The snapshot could not be analysed.
    Obscured,
}

impl fmt::Display for SnowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnowStatus::Clear => write!(f, "clear"),
            SnowStatus::Blocked => write!(f, "blocked"),
            SnowStatus::Obscured => write!(f, "obscured"),
        }
    }
}

/// Where the obstructing snow sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockageLocation {
    Curb,
    Sidewalk,
    #[serde(rename = "none")]
    Unobstructed,
    Unknown,
}

/// Which analysis produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    #[default]
    PixelAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub status: SnowStatus,
    /// Always within [0, 1].
    pub confidence: f64,
    pub reason: String,
    pub snow_visible: bool,
    pub snow_percentage: f64,
    pub curb_snow_percentage: f64,
    pub method: AnalysisMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockage_location: Option<BlockageLocation>,
}

impl ClassificationResult {
    /// The result for a snapshot that could not be turned into features.
    pub fn obscured(failure: &ExtractionFailure) -> Self {
        Self {
            status: SnowStatus::Obscured,
            confidence: 0.0,
            reason: format!("Analysis error: {failure}"),
            snow_visible: false,
            snow_percentage: 0.0,
            curb_snow_percentage: 0.0,
            method: AnalysisMethod::PixelAnalysis,
            blockage_location: Some(BlockageLocation::Unknown),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.status == SnowStatus::Blocked
    }
}
