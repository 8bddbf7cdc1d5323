// THEORY:
// Every threshold the extractor and the rule ladder rely on lives here so a
// deployment can override any of them from a TOML file. Fields left out of the
// file keep their defaults, and a config is validated before any pipeline is
// built from it. Example override file:
//
//     [extractor]
//     night_brightness_threshold = 70.0
//
//     [rules]
//     curb_blocked_percentage = 35.0

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds for turning pixels into features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Mean image brightness (0-255) below which the snapshot is treated as night.
    pub night_brightness_threshold: f64,
    /// Brightness a pixel must exceed to count as snow by day.
    pub day_snow_brightness: f64,
    /// Brightness a pixel must exceed to count as snow at night.
    pub night_snow_brightness: f64,
    /// Saturation (max - min channel) a snow pixel must stay below.
    pub max_saturation: f64,
    /// Brightness at or above which a pixel is glare, not snow.
    pub glare_ceiling: f64,
    /// Fraction of rows, counted from the bottom, that make up the ground region.
    pub ground_fraction: f64,
    /// Fraction of columns on each side of the ground region that make up a curb column.
    pub curb_fraction: f64,
    /// Multiplier applied to both percentages at night.
    pub night_dampening: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            night_brightness_threshold: 80.0,
            day_snow_brightness: 200.0,
            night_snow_brightness: 170.0,
            max_saturation: 25.0,
            glare_ceiling: 250.0,
            ground_fraction: 0.4,
            curb_fraction: 0.25,
            night_dampening: 0.5,
        }
    }
}

/// Cutoffs and confidence constants for the status rule ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusRules {
    /// Curb snow percentage above which the stop is blocked.
    pub curb_blocked_percentage: f64,
    /// Ground snow percentage above which the stop is blocked.
    pub ground_blocked_percentage: f64,
    /// Ground snow percentage above which snow is reported visible but passable.
    pub snow_visible_percentage: f64,
    /// At night, ground snow percentage below which the scene is confidently clear.
    pub night_clear_percentage: f64,
    /// Ground snow percentage above which a clear scene still reports snow visible.
    pub trace_snow_percentage: f64,
    pub curb_confidence_base: f64,
    pub curb_confidence_cap: f64,
    pub ground_confidence_base: f64,
    pub ground_confidence_cap: f64,
    /// Percentages are divided by this before being added to a confidence base.
    pub confidence_divisor: f64,
    pub snow_visible_confidence: f64,
    pub night_clear_confidence: f64,
    pub clear_confidence: f64,
}

impl Default for StatusRules {
    fn default() -> Self {
        Self {
            curb_blocked_percentage: 40.0,
            ground_blocked_percentage: 50.0,
            snow_visible_percentage: 20.0,
            night_clear_percentage: 10.0,
            trace_snow_percentage: 5.0,
            curb_confidence_base: 0.5,
            curb_confidence_cap: 0.85,
            ground_confidence_base: 0.4,
            ground_confidence_cap: 0.75,
            confidence_divisor: 200.0,
            snow_visible_confidence: 0.65,
            night_clear_confidence: 0.75,
            clear_confidence: 0.85,
        }
    }
}

/// Full classifier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub rules: StatusRules,
}

impl ClassifierConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClassifierConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let extractor = &self.extractor;
        let rules = &self.rules;

        check_fraction("extractor.ground_fraction", extractor.ground_fraction)?;
        check_fraction("extractor.curb_fraction", extractor.curb_fraction)?;
        check_unit("extractor.night_dampening", extractor.night_dampening)?;

        for (name, value) in [
            ("extractor.night_brightness_threshold", extractor.night_brightness_threshold),
            ("extractor.day_snow_brightness", extractor.day_snow_brightness),
            ("extractor.night_snow_brightness", extractor.night_snow_brightness),
        ] {
            check_range(name, value, 0.0, MAX_BRIGHTNESS)?;
        }

        // 256 lets a deployment switch the glare test off entirely.
        check_range("extractor.glare_ceiling", extractor.glare_ceiling, 0.0, MAX_BRIGHTNESS + 1.0)?;
        if extractor.glare_ceiling <= extractor.day_snow_brightness
            || extractor.glare_ceiling <= extractor.night_snow_brightness
        {
            return Err(ConfigError::Invalid(format!(
                "extractor.glare_ceiling ({}) must be above both snow brightness floors",
                extractor.glare_ceiling
            )));
        }

        check_range("extractor.max_saturation", extractor.max_saturation, 0.0, MAX_BRIGHTNESS + 1.0)?;
        if extractor.max_saturation == 0.0 {
            return Err(ConfigError::Invalid(
                "extractor.max_saturation must be positive".to_string(),
            ));
        }

        for (name, value) in [
            ("rules.curb_blocked_percentage", rules.curb_blocked_percentage),
            ("rules.ground_blocked_percentage", rules.ground_blocked_percentage),
            ("rules.snow_visible_percentage", rules.snow_visible_percentage),
            ("rules.night_clear_percentage", rules.night_clear_percentage),
            ("rules.trace_snow_percentage", rules.trace_snow_percentage),
        ] {
            check_range(name, value, 0.0, 100.0)?;
        }

        if !rules.confidence_divisor.is_finite() || rules.confidence_divisor <= 0.0 {
            return Err(ConfigError::Invalid(
                "rules.confidence_divisor must be positive".to_string(),
            ));
        }

        for (name, value) in [
            ("rules.curb_confidence_base", rules.curb_confidence_base),
            ("rules.curb_confidence_cap", rules.curb_confidence_cap),
            ("rules.ground_confidence_base", rules.ground_confidence_base),
            ("rules.ground_confidence_cap", rules.ground_confidence_cap),
            ("rules.snow_visible_confidence", rules.snow_visible_confidence),
            ("rules.night_clear_confidence", rules.night_clear_confidence),
            ("rules.clear_confidence", rules.clear_confidence),
        ] {
            check_unit(name, value)?;
        }

        Ok(())
    }
}

const MAX_BRIGHTNESS: f64 = 255.0;

// NaN fails every comparison below, so it is rejected along with out-of-range values.
fn check_fraction(name: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be in (0, 1], got {value}")))
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    check_range(name, value, 0.0, 1.0)
}

fn check_range(name: &str, value: f64, low: f64, high: f64) -> Result<(), ConfigError> {
    if (low..=high).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be in [{low}, {high}], got {value}")))
    }
}
