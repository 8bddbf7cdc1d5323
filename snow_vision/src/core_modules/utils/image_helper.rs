// Encoding helpers and the snow-mask debug view.
//
// The mask answers "what did the classifier actually count?" for a snapshot:
// sky rows are blacked out, ground pixels that passed the snow test are painted
// white, the remaining ground is dimmed, and the inner edges of both curb
// columns are drawn as blue guide lines.

pub mod image_helper {
    use crate::core_modules::feature_extractor::FeatureExtractor;
    use crate::core_modules::pixel_grid::PixelGrid;
    use crate::error::ExtractionFailure;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, ImageError, Rgb, RgbImage};
    use std::path::Path;

    const SNOW: Rgb<u8> = Rgb([255, 255, 255]);
    const SKY: Rgb<u8> = Rgb([0, 0, 0]);
    const CURB_GUIDE: Rgb<u8> = Rgb([0, 96, 255]);
    const DIM_FACTOR: f64 = 0.4;

    /// Encodes an RGB image as PNG bytes.
    pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ImageError> {
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new(&mut buffer);
        encoder.write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)?;
        Ok(buffer)
    }

    pub fn save_png(path: impl AsRef<Path>, image: &RgbImage) -> Result<(), ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = PngEncoder::new(output);
        encoder.write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)?;
        Ok(())
    }

    /// Renders which pixels the extractor counts as snow.
    pub fn render_snow_mask(grid: &PixelGrid, extractor: &FeatureExtractor) -> RgbImage {
        let is_night = extractor.is_night(grid.full_view().mean_brightness());
        let criteria = extractor.snow_criteria(is_night);
        let ground = extractor.ground_region(grid);
        let (left, right) = extractor.curb_regions(&ground);

        let left_guide = left.cols().end.checked_sub(1).filter(|_| !left.is_empty());
        let right_guide = Some(right.cols().start).filter(|_| !right.is_empty());

        RgbImage::from_fn(grid.width(), grid.height(), |x, y| {
            if !ground.contains(x, y) {
                return SKY;
            }
            if Some(x) == left_guide || Some(x) == right_guide {
                return CURB_GUIDE;
            }
            let pixel = grid.pixel(x, y).copied().unwrap_or_default();
            if pixel.is_snow_like(&criteria) {
                SNOW
            } else {
                Rgb::from(pixel.dimmed(DIM_FACTOR))
            }
        })
    }

    /// Decodes `bytes` and renders its snow mask.
    pub fn snow_mask_from_bytes(bytes: &[u8], extractor: &FeatureExtractor) -> Result<RgbImage, ExtractionFailure> {
        let grid = PixelGrid::decode(bytes)?;
        Ok(render_snow_mask(&grid, extractor))
    }
}
