pub mod classification;
pub mod feature_extractor;
pub mod pixel;
pub mod pixel_grid;
pub mod region;
pub mod status_classifier;
pub mod utils;
