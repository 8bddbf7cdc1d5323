// THEORY (single-pixel snow heuristics):
// The `Pixel` module is the most fundamental unit of the classifier. It is a
// "dumb" data container for one RGB sample plus the handful of heuristics that
// can be computed from that sample alone, with no knowledge of neighbours or of
// the region it sits in. Anything that needs more than one pixel (coverage
// ratios, region means) belongs in `region`.
//
// Heuristic families:
// - Brightness: plain mean of R, G and B on the 0..255 scale. Snow is judged
//   against this, not against a perceptual luma, so that gray and white are
//   treated the same regardless of which channel dominates.
// - Saturation: chroma, i.e. max(R,G,B) - min(R,G,B). Zero for perfect gray.
//   Snow is achromatic, so bright but colourful surfaces (signage, tail lights)
//   fail this test.
//
// `SnowCriteria` bundles the three thresholds a pixel must satisfy to count as
// snow-like. It is built by the feature extractor from the configuration and
// the day/night decision, and handed down here so this module stays free of
// any lighting logic.

pub mod pixel {
    use image::Rgb;

    pub type Channel = u8;
    pub type Brightness = f64;
    pub type Saturation = u8;
    pub type Sum = u16;

    pub const CHANNELS: usize = 3;

    /// A single RGB sample decoded from a camera snapshot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    /// Thresholds a pixel must satisfy to be counted as snow-like.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct SnowCriteria {
        /// Brightness must be strictly above this floor.
        pub brightness_floor: Brightness,
        /// Saturation must be strictly below this cutoff.
        pub max_saturation: f64,
        /// Brightness must be strictly below this ceiling; blown-out glare is not snow.
        pub glare_ceiling: Brightness,
    }

    impl Pixel {
        pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Shorthand for an achromatic pixel with all channels equal.
        pub const fn gray(level: Channel) -> Self {
            Pixel::new(level, level, level)
        }

        /// Raw RGB channel sum (0..765).
        pub fn sum(&self) -> Sum {
            self.red as Sum + self.green as Sum + self.blue as Sum
        }

        /// Mean of the three channels on the 0..255 scale.
        pub fn brightness(&self) -> Brightness {
            self.sum() as Brightness / CHANNELS as Brightness
        }

        /// Chroma: the spread between the strongest and weakest channel.
        pub fn saturation(&self) -> Saturation {
            let maximum_channel = self.red.max(self.green.max(self.blue));
            let minimum_channel = self.red.min(self.green.min(self.blue));
            maximum_channel - minimum_channel
        }

        pub fn is_snow_like(&self, criteria: &SnowCriteria) -> bool {
            let brightness = self.brightness();
            brightness > criteria.brightness_floor
                && (self.saturation() as f64) < criteria.max_saturation
                && brightness < criteria.glare_ceiling
        }

        /// Scales every channel by `factor`, saturating at the channel bounds.
        pub fn dimmed(&self, factor: f64) -> Self {
            let scale = |channel: Channel| (channel as f64 * factor).round().clamp(0.0, 255.0) as Channel;
            Pixel::new(scale(self.red), scale(self.green), scale(self.blue))
        }
    }

    impl From<[Channel; CHANNELS]> for Pixel {
        fn from(bytes: [Channel; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2])
        }
    }

    impl From<Rgb<Channel>> for Pixel {
        fn from(rgb: Rgb<Channel>) -> Self {
            Pixel::from(rgb.0)
        }
    }

    impl From<Pixel> for Rgb<Channel> {
        fn from(pixel: Pixel) -> Self {
            Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }
}
