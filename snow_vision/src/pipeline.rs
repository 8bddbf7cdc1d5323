// THEORY:
// The `pipeline` module is the top-level API of the classifier. It strings the
// two stages together, decode-and-extract then rule evaluation, behind a single
// call that always produces a `ClassificationResult`.
//
// The contract is total: whatever bytes arrive, the caller gets a result back.
// Extraction failures are converted into an `obscured` result at this layer and
// nowhere else; the stages below return `Result`.

use crate::config::ClassifierConfig;
use crate::core_modules::feature_extractor::FeatureExtractor;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::status_classifier::StatusClassifier;
use crate::error::{ConfigError, ExtractionFailure};
use log::warn;

// Re-export key data structures for the public API.
pub use crate::core_modules::classification::{AnalysisMethod, BlockageLocation, ClassificationResult, SnowStatus};
pub use crate::core_modules::feature_extractor::Features;

/// Decode, extract and classify with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct SnowPipeline {
    config: ClassifierConfig,
    extractor: FeatureExtractor,
    classifier: StatusClassifier,
}

impl SnowPipeline {
    pub fn new(config: ClassifierConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            extractor: FeatureExtractor::new(config.extractor.clone()),
            classifier: StatusClassifier::new(config.rules.clone()),
            config,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn extract_features(&self, image_bytes: &[u8]) -> Result<Features, ExtractionFailure> {
        self.extractor.extract_bytes(image_bytes)
    }

    /// Classifies an encoded snapshot. Never fails: undecodable input is `obscured`.
    pub fn classify(&self, image_bytes: &[u8]) -> ClassificationResult {
        match self.extract_features(image_bytes) {
            Ok(features) => self.classifier.classify(&features),
            Err(failure) => {
                warn!("snow analysis failed: {failure}");
                ClassificationResult::obscured(&failure)
            }
        }
    }

    /// Classifies an already decoded grid.
    pub fn classify_grid(&self, grid: &PixelGrid) -> ClassificationResult {
        self.classifier.classify(&self.extractor.extract(grid))
    }

    pub fn classify_features(&self, features: &Features) -> ClassificationResult {
        self.classifier.classify(features)
    }
}

/// Classifies `image_bytes` with the default thresholds.
pub fn classify(image_bytes: &[u8]) -> ClassificationResult {
    SnowPipeline::default().classify(image_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::core_modules::utils::image_helper::image_helper::encode_png;
    use approx::assert_relative_eq;

    const WIDTH: u32 = 40;
    const HEIGHT: u32 = 30;
    // floor(30 * 0.6)
    const GROUND_START: u32 = 18;

    fn snapshot(paint: impl Fn(u32, u32) -> Pixel) -> Vec<u8> {
        let grid = PixelGrid::from_fn(WIDTH, HEIGHT, paint).unwrap();
        encode_png(&grid.to_rgb_image()).unwrap()
    }

    #[test]
    fn all_white_frame_is_clear() {
        let result = classify(&snapshot(|_, _| Pixel::gray(255)));
        assert_eq!(result.status, SnowStatus::Clear);
        assert_eq!(result.confidence, 0.85);
        assert!(!result.snow_visible);
        assert_eq!(result.snow_percentage, 0.0);
        assert_eq!(result.curb_snow_percentage, 0.0);
        assert_eq!(result.method, AnalysisMethod::PixelAnalysis);
    }

    #[test]
    fn gray_ground_by_day_is_blocked_at_curb() {
        let result = classify(&snapshot(|_, y| if y < GROUND_START { Pixel::new(90, 120, 160) } else { Pixel::gray(220) }));
        assert_eq!(result.status, SnowStatus::Blocked);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.snow_percentage, 100.0);
        assert_eq!(result.curb_snow_percentage, 100.0);
        assert_eq!(result.blockage_location, Some(BlockageLocation::Curb));
    }

    #[test]
    fn snowy_curbs_block_even_with_colourful_centre() {
        // curbs: x < 10 and x >= 30
        let result = classify(&snapshot(|x, y| {
            if y < GROUND_START {
                Pixel::gray(140)
            } else if x < 10 || x >= 30 {
                Pixel::gray(220)
            } else {
                Pixel::new(255, 0, 0)
            }
        }));
        assert_eq!(result.status, SnowStatus::Blocked);
        assert_eq!(result.curb_snow_percentage, 100.0);
        assert!(result.snow_percentage < result.curb_snow_percentage);
        assert_relative_eq!(result.snow_percentage, 50.0);
    }

    #[test]
    fn non_image_bytes_are_obscured() {
        let inputs: [&[u8]; 3] = [b"<html>404</html>", &[], &[0xFF, 0xD8, 0xFF, 0xE0, 0x00]];
        for bytes in inputs {
            let result = classify(bytes);
            assert_eq!(result.status, SnowStatus::Obscured);
            assert_eq!(result.confidence, 0.0);
            assert!(!result.snow_visible);
            assert!(result.reason.starts_with("Analysis error:"));
            assert_eq!(result.blockage_location, Some(BlockageLocation::Unknown));
        }
    }

    #[test]
    fn grid_and_bytes_agree() {
        let paint = |x: u32, y: u32| if y >= GROUND_START && x % 3 == 0 { Pixel::gray(215) } else { Pixel::gray(120) };
        let pipeline = SnowPipeline::default();
        let grid = PixelGrid::from_fn(WIDTH, HEIGHT, paint).unwrap();
        assert_eq!(pipeline.classify_grid(&grid), pipeline.classify(&snapshot(paint)));
    }

    #[test]
    fn custom_config_changes_the_outcome() {
        let bytes = snapshot(|_, y| if y < GROUND_START { Pixel::gray(120) } else { Pixel::gray(190) });
        assert_eq!(classify(&bytes).status, SnowStatus::Clear);

        let config = ClassifierConfig::from_toml_str("[extractor]\nday_snow_brightness = 180.0\n").unwrap();
        let pipeline = SnowPipeline::new(config).unwrap();
        assert_eq!(pipeline.classify(&bytes).status, SnowStatus::Blocked);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = ClassifierConfig::default();
        config.extractor.curb_fraction = 1.5;
        assert!(SnowPipeline::new(config).is_err());
    }

    #[test]
    fn nan_glare_ceiling_cannot_disable_detection() {
        let mut config = ClassifierConfig::default();
        config.extractor.glare_ceiling = f64::NAN;
        assert!(matches!(SnowPipeline::new(config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn classify_features_matches_ladder() {
        let features = Features {
            overall_brightness: 150.0,
            is_night: false,
            snow_percentage: 25.0,
            curb_snow_percentage: 10.0,
        };
        let result = SnowPipeline::default().classify_features(&features);
        assert_eq!(result.status, SnowStatus::Clear);
        assert_eq!(result.confidence, 0.65);
        assert!(result.snow_visible);
    }
}
