//! Quality tiers and the yt-dlp format expressions they resolve to.

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Prefix of the inline keyboard callback payload, `quality_<tier>`.
pub const CALLBACK_PREFIX: &str = "quality_";

/// Symbolic quality level a user picks with `/quality`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum QualityTier {
    Low,
    #[default]
    Medium,
    High,
    Ultra,
}

impl QualityTier {
    /// Uppercase name used in user-facing text (`MEDIUM`).
    pub fn display_name(self) -> String {
        self.as_ref().to_uppercase()
    }

    /// Payload carried by the keyboard button for this tier.
    pub fn callback_payload(self) -> String {
        format!("{}{}", CALLBACK_PREFIX, self)
    }

    /// Parses a `quality_<tier>` payload. Anything else yields `None`.
    pub fn from_callback_payload(payload: &str) -> Option<Self> {
        payload.strip_prefix(CALLBACK_PREFIX)?.parse().ok()
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Upper bound on video height, in pixels.
    fn max_height(self) -> u32 {
        match self {
            QualityTier::Low => 480,
            QualityTier::Medium => 720,
            QualityTier::High => 1080,
            QualityTier::Ultra => 2160,
        }
    }
}

/// Concrete selection passed to the extraction engine for a tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    /// yt-dlp `-f` expression
    pub expression: String,
    /// Resolution label shown to users (`720p`, `4K`)
    pub label: &'static str,
    /// Audio bitrate hint (`192k`)
    pub audio_bitrate: &'static str,
}

/// Resolves a tier into its format expression and display labels.
///
/// The expression always ends with the generic `/best` fallback, so a
/// height filter that matches nothing still selects something.
///
/// # Example
///
/// ```
/// use grabbot::download::quality::{resolve, QualityTier};
///
/// let spec = resolve(QualityTier::Medium);
/// assert_eq!(spec.label, "720p");
/// assert!(spec.expression.ends_with("/best"));
/// ```
pub fn resolve(tier: QualityTier) -> FormatSpec {
    let (label, audio_bitrate) = match tier {
        QualityTier::Low => ("480p", "128k"),
        QualityTier::Medium => ("720p", "192k"),
        QualityTier::High => ("1080p", "320k"),
        QualityTier::Ultra => ("4K", "320k"),
    };
    let h = tier.max_height();

    FormatSpec {
        expression: format!("bestvideo[height<={h}]+bestaudio/best[height<={h}]/best"),
        label,
        audio_bitrate,
    }
}
