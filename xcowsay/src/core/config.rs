use std::path::PathBuf;

use super::placement::PlacementOptions;
use super::settings::{keys, Settings, SettingsError};
use super::timing::{DisplayTime, TimingConfig};

/// How the bubble text is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleOptions {
    /// Wrap lines longer than this many characters. `None` disables wrapping.
    pub wrap_width: Option<usize>,
    pub font_scale: u32,
}

impl Default for BubbleOptions {
    fn default() -> Self {
        Self {
            wrap_width: Some(40),
            font_scale: 2,
        }
    }
}

/// Where the cow picture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CowImageSource {
    pub alt_image: Option<PathBuf>,
    pub base: String,
    pub size: String,
}

impl CowImageSource {
    pub fn file_name(&self) -> String {
        format!("{}_{}.png", self.base, self.size)
    }
}

impl Default for CowImageSource {
    fn default() -> Self {
        Self {
            alt_image: None,
            base: "cow".to_string(),
            size: "med".to_string(),
        }
    }
}

/// Typed snapshot of the settings that a display cycle reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CowConfig {
    pub timing: TimingConfig,
    pub placement: PlacementOptions,
    pub bubble: BubbleOptions,
    pub image: CowImageSource,
}

impl CowConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        let timing = TimingConfig {
            lead_in_ms: millis(settings.int(keys::LEAD_IN_TIME)?),
            lead_out_ms: millis(settings.int(keys::LEAD_OUT_TIME)?),
            display: DisplayTime::from_millis(settings.int(keys::DISPLAY_TIME)?),
            min_display_ms: millis(settings.int(keys::MIN_DISPLAY_TIME)?),
            max_display_ms: millis(settings.int(keys::MAX_DISPLAY_TIME)?),
            reading_speed_ms: millis(settings.int(keys::READING_SPEED)?),
            dream_ms: millis(settings.int(keys::DREAM_TIME)?),
            dream_until_dismissed: settings.bool(keys::DREAM_UNTIL_DISMISSED)?,
        };

        let cow_x = settings.int(keys::COW_X)?;
        let cow_y = settings.int(keys::COW_Y)?;
        let placement = PlacementOptions {
            monitor: usize::try_from(settings.int(keys::MONITOR)?).ok(),
            cow_at: if cow_x >= 0 && cow_y >= 0 {
                Some((saturate(cow_x), saturate(cow_y)))
            } else {
                None
            },
            bubble_offset: (
                saturate(settings.int(keys::BUBBLE_X)?),
                saturate(settings.int(keys::BUBBLE_Y)?),
            ),
            gap: u32::try_from(settings.int(keys::BUBBLE_GAP)?.max(0)).unwrap_or(u32::MAX),
            left: settings.bool(keys::LEFT)?,
        };

        let wrap_width = settings.int(keys::WRAP_WIDTH)?;
        let bubble = BubbleOptions {
            wrap_width: if settings.bool(keys::WRAP)? && wrap_width > 0 {
                usize::try_from(wrap_width).ok()
            } else {
                None
            },
            font_scale: u32::try_from(settings.int(keys::FONT_SCALE)?.clamp(1, 16)).unwrap_or(1),
        };

        // Glyphs come from a built-in bitmap font; only the size is honoured
        tracing::debug!("Font face {:?} not used", settings.string(keys::FONT)?);

        let alt_image = settings.string(keys::ALT_IMAGE)?;
        let image = CowImageSource {
            alt_image: (!alt_image.is_empty()).then(|| PathBuf::from(alt_image)),
            base: settings.string(keys::IMAGE_BASE)?.to_string(),
            size: settings.string(keys::COW_SIZE)?.to_string(),
        };

        Ok(Self {
            timing,
            placement,
            bubble,
            image,
        })
    }
}

/// Bitmap glyph scale for a Pango-style font description such as
/// `"Sans Bold 14"`. The 8x8 glyphs are scaled so that a 14 point font
/// comes out at scale 2. `None` when the description has no size.
pub fn font_scale_for(font: &str) -> Option<u32> {
    let points: u32 = font.split_whitespace().last()?.parse().ok()?;
    if points == 0 {
        return None;
    }
    Some(((points + 3) / 7).clamp(1, 16))
}

fn millis(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
