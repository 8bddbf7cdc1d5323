// THEORY:
// The `StatusClassifier` maps a `Features` value onto a status through an
// ordered ladder of threshold rules. The first rule whose condition holds wins;
// there is no scoring or ranking between rules.
//
// Ladder (default thresholds):
// 1.  curb > 40%                -> blocked, confidence min(0.85, 0.5 + curb/200)
// 2.  ground > 50%              -> blocked, confidence min(0.75, 0.4 + ground/200)
// 3.  ground > 20%              -> clear (snow visible), 0.65
// 4.  night and ground < 10%    -> clear, 0.75
// 5.  otherwise                 -> clear, 0.85, snow visible when ground > 5%
//
// Only strong curb evidence or near-total ground coverage yields `blocked`.
// Moderate ground snow without curb coverage is reported as visible but
// passable.

use crate::config::StatusRules;
use crate::core_modules::classification::{AnalysisMethod, BlockageLocation, ClassificationResult, SnowStatus};
use crate::core_modules::feature_extractor::Features;
use log::debug;

/// The rung of the ladder that decided a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    CurbBlocked,
    GroundBlocked,
    SnowVisible,
    NightClear,
    Clear,
}

#[derive(Debug, Clone, Default)]
pub struct StatusClassifier {
    rules: StatusRules,
}

impl StatusClassifier {
    pub fn new(rules: StatusRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &StatusRules {
        &self.rules
    }

    /// Picks the first rule whose condition holds.
    pub fn select_rule(&self, features: &Features) -> Rule {
        let features = &sanitized(features);
        let rules = &self.rules;
        if features.curb_snow_percentage > rules.curb_blocked_percentage {
            Rule::CurbBlocked
        } else if features.snow_percentage > rules.ground_blocked_percentage {
            Rule::GroundBlocked
        } else if features.snow_percentage > rules.snow_visible_percentage {
            Rule::SnowVisible
        } else if features.is_night && features.snow_percentage < rules.night_clear_percentage {
            Rule::NightClear
        } else {
            Rule::Clear
        }
    }

    pub fn classify(&self, features: &Features) -> ClassificationResult {
        let rules = &self.rules;
        let features = &sanitized(features);
        let snow = features.snow_percentage;
        let curb = features.curb_snow_percentage;
        let rule = self.select_rule(features);

        let (status, confidence, reason, snow_visible, location) = match rule {
            Rule::CurbBlocked => (
                SnowStatus::Blocked,
                rules.curb_confidence_cap.min(rules.curb_confidence_base + curb / rules.confidence_divisor),
                format!("Significant snow ({}%) detected at curb - may block bus access", percent(curb)),
                true,
                BlockageLocation::Curb,
            ),
            Rule::GroundBlocked => (
                SnowStatus::Blocked,
                rules.ground_confidence_cap.min(rules.ground_confidence_base + snow / rules.confidence_divisor),
                format!("Heavy snow coverage ({}%) across ground area - may block sidewalk access", percent(snow)),
                true,
                BlockageLocation::Sidewalk,
            ),
            Rule::SnowVisible => (
                SnowStatus::Clear,
                rules.snow_visible_confidence,
                format!("Some snow visible ({}%) but curb appears passable ({}% at curb)", percent(snow), percent(curb)),
                true,
                BlockageLocation::Unobstructed,
            ),
            Rule::NightClear => (
                SnowStatus::Clear,
                rules.night_clear_confidence,
                format!("Night image with little visible snow ({}%) - likely clear", percent(snow)),
                false,
                BlockageLocation::Unobstructed,
            ),
            Rule::Clear => {
                let snow_visible = snow > rules.trace_snow_percentage;
                let reason = if snow_visible {
                    format!("Light snow ({}%) with clear curb access", percent(snow))
                } else {
                    format!("No significant snow detected ({}%)", percent(snow))
                };
                (
                    SnowStatus::Clear,
                    rules.clear_confidence,
                    reason,
                    snow_visible,
                    BlockageLocation::Unobstructed,
                )
            }
        };

        debug!("rule {rule:?} -> {status} ({confidence:.2})");

        ClassificationResult {
            status,
            confidence: finite_or_zero(confidence).clamp(0.0, 1.0),
            reason,
            snow_visible,
            snow_percentage: snow.clamp(0.0, 100.0),
            curb_snow_percentage: curb.clamp(0.0, 100.0),
            method: AnalysisMethod::PixelAnalysis,
            blockage_location: Some(location),
        }
    }
}

/// Features with non-finite percentages replaced by 0.
fn sanitized(features: &Features) -> Features {
    Features {
        snow_percentage: finite_or_zero(features.snow_percentage),
        curb_snow_percentage: finite_or_zero(features.curb_snow_percentage),
        ..*features
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Whole percentages print without decimals, others with up to two, so a
/// value such as 40.3 is not shown as the 40% cutoff it just cleared.
fn percent(value: f64) -> String {
    for decimals in 0..2 {
        let text = format!("{value:.decimals$}");
        if text.parse::<f64>().is_ok_and(|shown| shown == value) {
            return text;
        }
    }
    format!("{value:.2}")
}
