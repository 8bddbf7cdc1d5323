// THEORY:
// The `PixelGrid` is the bridge between an encoded camera snapshot and the pixel
// heuristics. It performs the one expensive step of every call, decoding, and
// then holds the result as a dense, row-major vector of `Pixel`s that is never
// mutated again.
//
// Key architectural principles:
// 1.  **Decode once**: Whatever the source format (JPEG from the traffic cameras,
//     PNG in tests), the bytes are decoded and flattened to 8-bit RGB exactly
//     once. Alpha and higher bit depths are discarded by the conversion.
// 2.  **Row-major layout**: Pixel (x, y) lives at index `y * width + x`. A row is
//     therefore a contiguous slice, which is what lets `RegionView` walk a
//     rectangle without copying.
// 3.  **Views, not copies**: The grid hands out `RegionView`s that borrow it.
//     Ground and curb regions are ranges over the same buffer.

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
use crate::core_modules::region::RegionView;
use crate::error::ExtractionFailure;
use image::RgbImage;

/// A decoded snapshot as a dense, row-major grid of RGB pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Decodes an encoded image (any format the `image` crate was built with).
    pub fn decode(bytes: &[u8]) -> Result<Self, ExtractionFailure> {
        let decoded = image::load_from_memory(bytes)?;
        Self::from_rgb_image(decoded.to_rgb8())
    }

    pub fn from_rgb_image(image: RgbImage) -> Result<Self, ExtractionFailure> {
        let (width, height) = image.dimensions();
        Self::from_raw_rgb(width, height, image.as_raw())
    }

    /// Builds a grid from tightly packed RGB bytes.
    pub fn from_raw_rgb(width: u32, height: u32, buffer: &[u8]) -> Result<Self, ExtractionFailure> {
        if width == 0 || height == 0 {
            return Err(ExtractionFailure::decode_failure(format!(
                "image has no pixels ({width}x{height})"
            )));
        }

        let expected = width as usize * height as usize * CHANNELS;
        if buffer.len() != expected {
            return Err(ExtractionFailure::decode_failure(format!(
                "expected {expected} bytes for {width}x{height} RGB, got {}",
                buffer.len()
            )));
        }

        let pixels = buffer
            .chunks_exact(CHANNELS)
            .map(|rgb| Pixel::new(rgb[0], rgb[1], rgb[2]))
            .collect();

        Ok(Self { width, height, pixels })
    }

    /// Builds a grid by evaluating `paint` at every (x, y).
    pub fn from_fn(width: u32, height: u32, mut paint: impl FnMut(u32, u32) -> Pixel) -> Result<Self, ExtractionFailure> {
        if width == 0 || height == 0 {
            return Err(ExtractionFailure::decode_failure(format!(
                "image has no pixels ({width}x{height})"
            )));
        }

        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(paint(x, y));
            }
        }
        Ok(Self { width, height, pixels })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<&Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.index(x, y))
    }

    /// The contiguous slice of pixels for row `y`.
    pub fn row(&self, y: u32) -> &[Pixel] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    pub fn full_view(&self) -> RegionView<'_> {
        RegionView::new(self, 0..self.height, 0..self.width)
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let raw = self
            .pixels
            .iter()
            .flat_map(|pixel| [pixel.red, pixel.green, pixel.blue])
            .collect();
        // The buffer length always matches the stored dimensions.
        RgbImage::from_raw(self.width, self.height, raw).unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}
