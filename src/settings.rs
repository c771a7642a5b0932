//! Run parameters for a conversion.
//!
//! These structs describe *what* a run should do, not *how* to do it. A
//! [`ConversionSettings`] value is built once (by the CLI or an embedding
//! application), handed to a [`Converter`](crate::convert::Converter), and
//! never mutated for the lifetime of that run. The only cross-thread value
//! during a run is the cancel flag, which lives on the converter itself.

/// Target orientation for uniform-size cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Landscape-or-square output (height never exceeds width).
    #[default]
    Horizontal,
    /// Portrait output (falls back to a 2:3 box when the folder skews wide).
    Vertical,
}

/// Tone and color adjustment parameters.
///
/// All fields default to neutral. When `auto_tone` is set the manual fields
/// are ignored entirely and the automatic pipeline runs instead.
///
/// Ranges: `exposure` −2.0..2.0, `vibrance` 0..100, everything else −100..100.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToneSettings {
    pub auto_tone: bool,
    pub exposure: f32,
    pub contrast: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub whites: f32,
    pub blacks: f32,
    pub temperature: f32,
    pub tint: f32,
    pub vibrance: f32,
    pub saturation: f32,
}

impl ToneSettings {
    /// True when applying these settings would change no pixel.
    pub fn is_neutral(&self) -> bool {
        !self.auto_tone
            && self.exposure == 0.0
            && self.contrast == 0.0
            && self.highlights == 0.0
            && self.shadows == 0.0
            && self.whites == 0.0
            && self.blacks == 0.0
            && self.temperature == 0.0
            && self.tint == 0.0
            && self.vibrance == 0.0
            && self.saturation == 0.0
    }
}

/// Immutable per-run conversion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSettings {
    /// WebP quality for lossy encoding (0-100).
    pub quality: u8,
    /// Lossless WebP encoding (quality still steers encoder effort).
    pub lossless: bool,
    /// WebP encoder method (0-6, higher = smaller files, slower encode).
    pub method: u8,
    /// Proportional resize target width; `None` keeps original dimensions.
    pub target_width: Option<u32>,
    /// Keep transparency through encoding instead of flattening onto white.
    pub preserve_alpha: bool,
    /// Emit a `_bw` luminance companion next to every color output.
    pub grayscale: bool,
    /// Tone adjustments; `None` skips the adjustment stage entirely.
    pub tone: Option<ToneSettings>,
    /// Center-crop portrait images to a square against the target width.
    /// Requires `target_width`.
    pub make_horizontal: bool,
    /// Crop every image in the batch to one analyzed box. Requires
    /// `target_width`.
    pub uniform_size: bool,
    /// Orientation of the uniform box.
    pub orientation: Orientation,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            quality: 85,
            lossless: false,
            method: 6,
            target_width: None,
            preserve_alpha: true,
            grayscale: false,
            tone: None,
            make_horizontal: false,
            uniform_size: false,
            orientation: Orientation::Horizontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        let s = ConversionSettings::default();
        assert_eq!(s.quality, 85);
        assert!(!s.lossless);
        assert_eq!(s.method, 6);
        assert_eq!(s.target_width, None);
        assert!(s.preserve_alpha);
        assert!(!s.grayscale);
        assert!(s.tone.is_none());
        assert_eq!(s.orientation, Orientation::Horizontal);
    }

    #[test]
    fn tone_defaults_are_neutral() {
        assert!(ToneSettings::default().is_neutral());
    }

    #[test]
    fn auto_tone_is_not_neutral() {
        let tone = ToneSettings {
            auto_tone: true,
            ..Default::default()
        };
        assert!(!tone.is_neutral());
    }

    #[test]
    fn any_nonzero_field_is_not_neutral() {
        let tone = ToneSettings {
            shadows: 25.0,
            ..Default::default()
        };
        assert!(!tone.is_neutral());
    }
}
