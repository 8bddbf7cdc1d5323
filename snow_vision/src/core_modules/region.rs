// THEORY:
// A `RegionView` is a rectangular window onto a `PixelGrid`: a row range and a
// column range, nothing more. It is the unit of regional analysis for the
// classifier, the same way a chunk of pixels is the unit of pooling in a motion
// grid.
//
// Key architectural principles:
// 1.  **Borrowed, never owned**: A view holds a reference to the grid plus two
//     ranges. Slicing a view produces another view; no pixel data
//     is ever duplicated.
// 2.  **Fractional slicing**: Regions are described the way a camera operator
//     would, "bottom 40%", "left 25%". Split points are `floor(extent * f)`
//     measured from the near edge, so the bottom region of an odd-height image
//     takes the extra row.
// 3.  **Pooled summaries**: The only questions asked of a region are summary
//     ones (mean brightness, share of pixels passing a test). An empty region
//     answers 0 to both.

use crate::core_modules::pixel::pixel::{Brightness, CHANNELS, Pixel};
use crate::core_modules::pixel_grid::PixelGrid;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

/// A read-only rectangle of a `PixelGrid`.
#[derive(Debug, Clone)]
pub struct RegionView<'a> {
    grid: &'a PixelGrid,
    rows: Range<u32>,
    cols: Range<u32>,
}

impl<'a> RegionView<'a> {
    pub(crate) fn new(grid: &'a PixelGrid, rows: Range<u32>, cols: Range<u32>) -> Self {
        let rows = rows.start.min(grid.height())..rows.end.min(grid.height());
        let cols = cols.start.min(grid.width())..cols.end.min(grid.width());
        Self { grid, rows, cols }
    }

    pub fn rows(&self) -> Range<u32> {
        self.rows.clone()
    }

    pub fn cols(&self) -> Range<u32> {
        self.cols.clone()
    }

    pub fn width(&self) -> u32 {
        self.cols.end.saturating_sub(self.cols.start)
    }

    pub fn height(&self) -> u32 {
        self.rows.end.saturating_sub(self.rows.start)
    }

    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.cols.contains(&x) && self.rows.contains(&y)
    }

    /// The strip covering `fraction` of this region along `edge`.
    pub fn edge_fraction(&self, edge: Edge, fraction: f64) -> RegionView<'a> {
        let fraction = fraction.clamp(0.0, 1.0);
        let (rows, cols) = match edge {
            Edge::Top => {
                let end = self.rows.start + split(self.height(), fraction);
                (self.rows.start..end, self.cols.clone())
            }
            Edge::Bottom => {
                let start = self.rows.start + split(self.height(), 1.0 - fraction);
                (start..self.rows.end, self.cols.clone())
            }
            Edge::Left => {
                let end = self.cols.start + split(self.width(), fraction);
                (self.rows.clone(), self.cols.start..end)
            }
            Edge::Right => {
                let start = self.cols.start + split(self.width(), 1.0 - fraction);
                (self.rows.clone(), start..self.cols.end)
            }
        };
        RegionView::new(self.grid, rows, cols)
    }

    /// Iterates the region row by row, left to right.
    pub fn pixels(&self) -> impl Iterator<Item = &'a Pixel> + use<'a> {
        let grid = self.grid;
        let cols = self.cols.start as usize..self.cols.end as usize;
        self.rows.clone().flat_map(move |y| grid.row(y)[cols.clone()].iter())
    }

    /// Mean of per-pixel brightness over the region; 0 when empty.
    pub fn mean_brightness(&self) -> Brightness {
        let num_pixels = self.len();
        if num_pixels == 0 {
            return 0.0;
        }

        // Accumulate in fixed-size runs for better vectorization.
        const RUN: usize = 64;
        let mut total = 0u64;
        let cols = self.cols.start as usize..self.cols.end as usize;
        for y in self.rows.clone() {
            for run in self.grid.row(y)[cols.clone()].chunks(RUN) {
                total += run.iter().map(|pixel| pixel.sum() as u64).sum::<u64>();
            }
        }

        total as Brightness / (num_pixels * CHANNELS) as Brightness
    }

    /// Percentage (0-100) of pixels for which `test` holds; 0 when empty.
    pub fn coverage(&self, test: impl Fn(&Pixel) -> bool) -> f64 {
        let num_pixels = self.len();
        if num_pixels == 0 {
            return 0.0;
        }
        let hits = self.pixels().filter(|pixel| test(*pixel)).count();
        hits as f64 / num_pixels as f64 * 100.0
    }
}

fn split(extent: u32, fraction: f64) -> u32 {
    ((extent as f64 * fraction).floor() as u32).min(extent)
}
