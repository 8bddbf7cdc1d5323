// THEORY:
// Three error families. `ExtractionFailure` is the only one the classifier
// itself produces and it never reaches callers of `SnowPipeline::classify`; it
// is folded into an `obscured` result. `ConfigError` covers loading and
// validating thresholds, `PoolError` the batch worker pool.

use image::ImageError;
use image::error::{ImageFormatHint, UnsupportedErrorKind};
use thiserror::Error;

/// Why a snapshot could not be turned into features.
///
/// Never escapes `SnowPipeline::classify`; it is folded into an `obscured`
/// result whose reason carries the display text below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// The bytes could not be interpreted as a raster image.
    #[error("image could not be decoded: {0}")]
    DecodeFailure(String),

    /// The format was recognised but its decoder is not built into this binary.
    #[error("image decoder unavailable: {0}")]
    DependencyUnavailable(String),
}

impl ExtractionFailure {
    pub fn decode_failure(details: impl Into<String>) -> Self {
        Self::DecodeFailure(details.into())
    }

    pub fn dependency_unavailable(details: impl Into<String>) -> Self {
        Self::DependencyUnavailable(details.into())
    }
}

impl From<ImageError> for ExtractionFailure {
    fn from(err: ImageError) -> Self {
        match &err {
            ImageError::Unsupported(unsupported) => match unsupported.kind() {
                UnsupportedErrorKind::Format(ImageFormatHint::Exact(format)) => {
                    Self::dependency_unavailable(format!("no decoder for {format:?}"))
                }
                _ => Self::decode_failure(err.to_string()),
            },
            _ => Self::decode_failure(err.to_string()),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the batch worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed,

    #[error("worker dropped the task before answering")]
    WorkerDropped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use image::error::{DecodingError, UnsupportedError};

    #[test]
    fn test_error_display() {
        let err = ExtractionFailure::decode_failure("truncated stream");
        assert!(format!("{err}").contains("truncated stream"));

        let err = ExtractionFailure::dependency_unavailable("no decoder for Avif");
        assert!(format!("{err}").contains("unavailable"));

        let err = ConfigError::Invalid("ground_fraction must be in (0, 1]".to_string());
        assert!(format!("{err}").contains("ground_fraction"));
    }

    #[test]
    fn recognised_format_without_decoder_is_dependency_unavailable() {
        let hint = ImageFormatHint::Exact(ImageFormat::Avif);
        let err = ImageError::Unsupported(UnsupportedError::from_format_and_kind(
            hint.clone(),
            UnsupportedErrorKind::Format(hint),
        ));
        assert!(matches!(
            ExtractionFailure::from(err),
            ExtractionFailure::DependencyUnavailable(_)
        ));
    }

    #[test]
    fn unknown_format_is_decode_failure() {
        let err = ImageError::Unsupported(UnsupportedError::from_format_and_kind(
            ImageFormatHint::Unknown,
            UnsupportedErrorKind::Format(ImageFormatHint::Unknown),
        ));
        assert!(matches!(
            ExtractionFailure::from(err),
            ExtractionFailure::DecodeFailure(_)
        ));
    }

    #[test]
    fn corrupt_stream_is_decode_failure() {
        let err = ImageError::Decoding(DecodingError::new(
            ImageFormatHint::Exact(ImageFormat::Png),
            "bad checksum",
        ));
        let failure = ExtractionFailure::from(err);
        assert!(matches!(failure, ExtractionFailure::DecodeFailure(_)));
    }
}
