// THEORY:
// The `FeatureExtractor` turns a decoded snapshot into the four numbers the
// status classifier reasons about. It is stateless: every call is a pure
// function of the grid and the configuration it was built with.
//
// The pipeline inside one call:
// 1.  **Lighting**: Mean brightness over the whole frame decides day or night.
//     Night changes two things downstream, the brightness floor for snow and a
//     final dampening of both percentages.
// 2.  **Ground region**: Only the bottom band of the frame is inspected. In a
//     forward-facing traffic camera that band holds the curb and sidewalk; the
//     top is sky and building facades, which are bright and gray for reasons
//     that have nothing to do with snow.
// 3.  **Coverage**: The share of snow-like pixels over the whole ground band,
//     and separately over its left and right edge columns where curbs sit. The
//     curb figure is the larger of the two sides, since one blocked side is
//     enough to block boarding.
// 4.  **Night dampening**: Wet asphalt under street lights reads as bright and
//     gray. Halving both percentages at night biases against those false
//     positives.

use crate::config::ExtractorConfig;
use crate::core_modules::pixel::pixel::{Brightness, Pixel, SnowCriteria};
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::region::{Edge, RegionView};
use crate::error::ExtractionFailure;
use log::debug;

/// Scalar summary of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    /// Mean per-pixel brightness over the whole frame (0-255).
    pub overall_brightness: Brightness,
    pub is_night: bool,
    /// Percentage (0-100) of snow-like pixels in the ground region.
    pub snow_percentage: f64,
    /// Larger of the left and right curb-column percentages (0-100).
    pub curb_snow_percentage: f64,
}

/// Undampened snow coverage of the ground region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundCoverage {
    pub snow_percentage: f64,
    pub left_curb_percentage: f64,
    pub right_curb_percentage: f64,
}

impl GroundCoverage {
    pub fn curb_percentage(&self) -> f64 {
        self.left_curb_percentage.max(self.right_curb_percentage)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Decodes `bytes` and extracts features from the result.
    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<Features, ExtractionFailure> {
        let grid = PixelGrid::decode(bytes)?;
        Ok(self.extract(&grid))
    }

    pub fn extract(&self, grid: &PixelGrid) -> Features {
        let overall_brightness = grid.full_view().mean_brightness();
        let is_night = self.is_night(overall_brightness);
        self.extract_with_lighting(grid, overall_brightness, is_night)
    }

    /// Extracts features with the day/night decision forced to `is_night`.
    pub fn extract_as(&self, grid: &PixelGrid, is_night: bool) -> Features {
        let overall_brightness = grid.full_view().mean_brightness();
        self.extract_with_lighting(grid, overall_brightness, is_night)
    }

    pub fn is_night(&self, overall_brightness: Brightness) -> bool {
        overall_brightness < self.config.night_brightness_threshold
    }

    pub fn snow_criteria(&self, is_night: bool) -> SnowCriteria {
        SnowCriteria {
            brightness_floor: if is_night {
                self.config.night_snow_brightness
            } else {
                self.config.day_snow_brightness
            },
            max_saturation: self.config.max_saturation,
            glare_ceiling: self.config.glare_ceiling,
        }
    }

    pub fn ground_region<'a>(&self, grid: &'a PixelGrid) -> RegionView<'a> {
        grid.full_view().edge_fraction(Edge::Bottom, self.config.ground_fraction)
    }

    /// Left and right curb columns of a ground region.
    pub fn curb_regions<'a>(&self, ground: &RegionView<'a>) -> (RegionView<'a>, RegionView<'a>) {
        (
            ground.edge_fraction(Edge::Left, self.config.curb_fraction),
            ground.edge_fraction(Edge::Right, self.config.curb_fraction),
        )
    }

    pub fn ground_coverage(&self, grid: &PixelGrid, is_night: bool) -> GroundCoverage {
        let criteria = self.snow_criteria(is_night);
        let is_snow = |pixel: &Pixel| pixel.is_snow_like(&criteria);

        let ground = self.ground_region(grid);
        let (left, right) = self.curb_regions(&ground);

        GroundCoverage {
            snow_percentage: ground.coverage(is_snow),
            left_curb_percentage: left.coverage(is_snow),
            right_curb_percentage: right.coverage(is_snow),
        }
    }

    fn extract_with_lighting(&self, grid: &PixelGrid, overall_brightness: Brightness, is_night: bool) -> Features {
        let coverage = self.ground_coverage(grid, is_night);
        let dampening = if is_night { self.config.night_dampening } else { 1.0 };

        let features = Features {
            overall_brightness,
            is_night,
            snow_percentage: (coverage.snow_percentage * dampening).clamp(0.0, 100.0),
            curb_snow_percentage: (coverage.curb_percentage() * dampening).clamp(0.0, 100.0),
        };

        debug!(
            "features: brightness={:.1} night={} snow={:.1}% curb={:.1}% (left {:.1}%, right {:.1}%)",
            features.overall_brightness,
            features.is_night,
            features.snow_percentage,
            features.curb_snow_percentage,
            coverage.left_curb_percentage,
            coverage.right_curb_percentage,
        );

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// A frame whose top 60% is `sky` and bottom 40% is painted by `ground`.
    fn scene(width: u32, height: u32, sky: Pixel, ground: impl Fn(u32) -> Pixel) -> PixelGrid {
        let ground_start = (height as f64 * 0.6).floor() as u32;
        PixelGrid::from_fn(width, height, |x, y| if y < ground_start { sky } else { ground(x) }).unwrap()
    }

    #[test]
    fn all_white_frame_has_no_snow() {
        let grid = PixelGrid::from_fn(20, 10, |_, _| Pixel::gray(255)).unwrap();
        let features = FeatureExtractor::default().extract(&grid);
        assert!(!features.is_night);
        assert_eq!(features.overall_brightness, 255.0);
        assert_eq!(features.snow_percentage, 0.0);
        assert_eq!(features.curb_snow_percentage, 0.0);
    }

    #[test]
    fn gray_ground_by_day_is_full_coverage() {
        let grid = scene(20, 10, Pixel::gray(180), |_| Pixel::gray(220));
        let features = FeatureExtractor::default().extract(&grid);
        assert!(!features.is_night);
        assert_eq!(features.snow_percentage, 100.0);
        assert_eq!(features.curb_snow_percentage, 100.0);
    }

    #[test]
    fn sky_is_ignored() {
        let grid = scene(20, 10, Pixel::gray(220), |_| Pixel::new(40, 40, 45));
        let features = FeatureExtractor::default().extract(&grid);
        assert_eq!(features.snow_percentage, 0.0);
        assert_eq!(features.curb_snow_percentage, 0.0);
    }

    #[test]
    fn curb_columns_alone_drive_curb_percentage() {
        // 20 wide: left curb is x < 5, right curb is x >= 15
        let grid = scene(20, 10, Pixel::gray(150), |x| {
            if x < 5 || x >= 15 { Pixel::gray(220) } else { Pixel::new(255, 0, 0) }
        });
        let features = FeatureExtractor::default().extract(&grid);
        assert_eq!(features.curb_snow_percentage, 100.0);
        assert_eq!(features.snow_percentage, 50.0);
    }

    #[test]
    fn curb_percentage_takes_the_snowier_side() {
        let grid = scene(20, 10, Pixel::gray(150), |x| if x < 5 { Pixel::gray(220) } else { Pixel::gray(90) });
        let extractor = FeatureExtractor::default();
        let coverage = extractor.ground_coverage(&grid, false);
        assert_eq!(coverage.left_curb_percentage, 100.0);
        assert_eq!(coverage.right_curb_percentage, 0.0);
        assert_eq!(coverage.curb_percentage(), 100.0);
        assert_eq!(coverage.snow_percentage, 25.0);
    }

    #[test]
    fn night_halves_both_percentages() {
        let grid = scene(20, 10, Pixel::gray(150), |x| if x < 5 { Pixel::gray(220) } else { Pixel::gray(100) });
        let extractor = FeatureExtractor::default();

        let night = extractor.extract_as(&grid, true);
        let raw = extractor.ground_coverage(&grid, true);
        assert!(night.is_night);
        assert_relative_eq!(night.snow_percentage, raw.snow_percentage * 0.5);
        assert_relative_eq!(night.curb_snow_percentage, raw.curb_percentage() * 0.5);

        let day = extractor.extract_as(&grid, false);
        assert_relative_eq!(night.snow_percentage, day.snow_percentage / 2.0);
        assert_relative_eq!(night.curb_snow_percentage, day.curb_snow_percentage / 2.0);
    }

    #[test]
    fn dark_frames_are_night_and_use_lower_floor() {
        // mostly black sky drags the mean under 80
        let grid = scene(20, 10, Pixel::gray(0), |_| Pixel::gray(180));
        let features = FeatureExtractor::default().extract(&grid);
        assert!(features.is_night);
        // 180 passes the night floor of 170 and is then halved
        assert_eq!(features.snow_percentage, 50.0);
        assert_eq!(features.curb_snow_percentage, 50.0);
    }

    #[test]
    fn night_threshold_is_exclusive() {
        let extractor = FeatureExtractor::default();
        assert!(extractor.is_night(79.9));
        assert!(!extractor.is_night(80.0));
    }

    #[test]
    fn tiny_frames_do_not_panic() {
        let grid = PixelGrid::from_fn(1, 1, |_, _| Pixel::gray(220)).unwrap();
        let features = FeatureExtractor::default().extract(&grid);
        assert_eq!(features.snow_percentage, 100.0);
        // a one-pixel-wide ground has an empty left column and a full right one
        assert_eq!(features.curb_snow_percentage, 100.0);
    }

    #[test]
    fn custom_fractions_move_the_regions() {
        let config = ExtractorConfig { ground_fraction: 1.0, ..ExtractorConfig::default() };
        let grid = scene(20, 10, Pixel::gray(220), |_| Pixel::gray(60));
        let features = FeatureExtractor::new(config).extract(&grid);
        assert_eq!(features.snow_percentage, 60.0);
    }

    #[test]
    fn extract_bytes_reports_decode_failure() {
        let err = FeatureExtractor::default().extract_bytes(&[0xFF, 0xD8, 0x00]).unwrap_err();
        assert!(matches!(err, ExtractionFailure::DecodeFailure(_)));
    }
}
