use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Option names understood by the settings store.
pub mod keys {
    pub const LEAD_IN_TIME: &str = "lead_in_time";
    pub const LEAD_OUT_TIME: &str = "lead_out_time";
    pub const DISPLAY_TIME: &str = "display_time";
    pub const MIN_DISPLAY_TIME: &str = "min_display_time";
    pub const MAX_DISPLAY_TIME: &str = "max_display_time";
    pub const READING_SPEED: &str = "reading_speed";
    pub const DREAM_TIME: &str = "dream_time";
    pub const DREAM_UNTIL_DISMISSED: &str = "dream_until_dismissed";
    pub const COW_SIZE: &str = "cow_size";
    pub const IMAGE_BASE: &str = "image_base";
    pub const ALT_IMAGE: &str = "alt_image";
    pub const MONITOR: &str = "monitor";
    pub const COW_X: &str = "cow_x";
    pub const COW_Y: &str = "cow_y";
    pub const BUBBLE_X: &str = "bubble_x";
    pub const BUBBLE_Y: &str = "bubble_y";
    pub const BUBBLE_GAP: &str = "bubble_gap";
    pub const LEFT: &str = "left";
    pub const WRAP: &str = "wrap";
    pub const WRAP_WIDTH: &str = "wrap_width";
    pub const FONT_SCALE: &str = "font_scale";
    pub const FONT: &str = "font";
}

/// Sentinel for `display_time`: derive the duration from the word count.
pub const AUTO_DISPLAY_TIME: i64 = -1;

const DEF_LEAD_IN_TIME: i64 = 250;
const DEF_MIN_TIME: i64 = 2000;
const DEF_MAX_TIME: i64 = 30000;
// Human average is apparently 200-250 WPM
const DEF_READING_SPEED: i64 = 250;
const DEF_DREAM_TIME: i64 = 10000;
const DEF_BUBBLE_GAP: i64 = 5;
const DEF_WRAP_WIDTH: i64 = 40;
const DEF_FONT_SCALE: i64 = 2;
const DEF_FONT: &str = "Bitstream Vera Sans 14";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Int,
    Bool,
    Str,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Int => write!(f, "integer"),
            OptionKind::Bool => write!(f, "Boolean"),
            OptionKind::Str => write!(f, "string"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Int(_) => OptionKind::Int,
            OptionValue::Bool(_) => OptionKind::Bool,
            OptionValue::Str(_) => OptionKind::Str,
        }
    }

    /// Type a raw textual value: integer if it is all digits (with an optional
    /// leading minus), Boolean for `true`/`false` in any case, string otherwise.
    pub fn infer(raw: &str) -> Self {
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse::<i64>() {
                return OptionValue::Int(n);
            }
        }
        if raw.eq_ignore_ascii_case("true") {
            OptionValue::Bool(true)
        } else if raw.eq_ignore_ascii_case("false") {
            OptionValue::Bool(false)
        } else {
            OptionValue::Str(raw.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("invalid option '{0}'")]
    UnknownOption(String),
    #[error("option '{name}' is not of type {expected}")]
    TypeMismatch { name: String, expected: OptionKind },
}

/// Typed key-value store of user options.
///
/// Every option must be defined (with its default) before it can be set or
/// read; setting an option never changes its type.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    options: BTreeMap<String, OptionValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with every built-in option at its default value.
    pub fn with_defaults() -> Self {
        use keys::*;

        let mut settings = Self::new();
        settings.define(LEAD_IN_TIME, OptionValue::Int(DEF_LEAD_IN_TIME));
        settings.define(LEAD_OUT_TIME, OptionValue::Int(DEF_LEAD_IN_TIME));
        settings.define(DISPLAY_TIME, OptionValue::Int(AUTO_DISPLAY_TIME));
        settings.define(MIN_DISPLAY_TIME, OptionValue::Int(DEF_MIN_TIME));
        settings.define(MAX_DISPLAY_TIME, OptionValue::Int(DEF_MAX_TIME));
        settings.define(READING_SPEED, OptionValue::Int(DEF_READING_SPEED));
        settings.define(DREAM_TIME, OptionValue::Int(DEF_DREAM_TIME));
        settings.define(DREAM_UNTIL_DISMISSED, OptionValue::Bool(false));
        settings.define(COW_SIZE, OptionValue::Str("med".to_string()));
        settings.define(IMAGE_BASE, OptionValue::Str("cow".to_string()));
        settings.define(ALT_IMAGE, OptionValue::Str(String::new()));
        settings.define(MONITOR, OptionValue::Int(-1));
        settings.define(COW_X, OptionValue::Int(-1));
        settings.define(COW_Y, OptionValue::Int(-1));
        settings.define(BUBBLE_X, OptionValue::Int(0));
        settings.define(BUBBLE_Y, OptionValue::Int(0));
        settings.define(BUBBLE_GAP, OptionValue::Int(DEF_BUBBLE_GAP));
        settings.define(LEFT, OptionValue::Bool(false));
        settings.define(WRAP, OptionValue::Bool(true));
        settings.define(WRAP_WIDTH, OptionValue::Int(DEF_WRAP_WIDTH));
        settings.define(FONT_SCALE, OptionValue::Int(DEF_FONT_SCALE));
        settings.define(FONT, OptionValue::Str(DEF_FONT.to_string()));
        settings
    }

    /// Define an option and its default. Redefining replaces the old entry.
    pub fn define(&mut self, name: &str, default: OptionValue) {
        self.options.insert(name.to_string(), default);
    }

    pub fn get(&self, name: &str) -> Result<&OptionValue, SettingsError> {
        self.options
            .get(name)
            .ok_or_else(|| SettingsError::UnknownOption(name.to_string()))
    }

    pub fn set(&mut self, name: &str, value: OptionValue) -> Result<(), SettingsError> {
        let slot = self
            .options
            .get_mut(name)
            .ok_or_else(|| SettingsError::UnknownOption(name.to_string()))?;
        if slot.kind() != value.kind() {
            return Err(SettingsError::TypeMismatch {
                name: name.to_string(),
                expected: slot.kind(),
            });
        }
        tracing::debug!("Setting option {} = {:?}", name, value);
        *slot = value;
        Ok(())
    }

    pub fn set_int(&mut self, name: &str, value: i64) -> Result<(), SettingsError> {
        self.set(name, OptionValue::Int(value))
    }

    pub fn set_bool(&mut self, name: &str, value: bool) -> Result<(), SettingsError> {
        self.set(name, OptionValue::Bool(value))
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) -> Result<(), SettingsError> {
        self.set(name, OptionValue::Str(value.into()))
    }

    pub fn int(&self, name: &str) -> Result<i64, SettingsError> {
        match self.get(name)? {
            OptionValue::Int(n) => Ok(*n),
            _ => Err(mismatch(name, OptionKind::Int)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, SettingsError> {
        match self.get(name)? {
            OptionValue::Bool(b) => Ok(*b),
            _ => Err(mismatch(name, OptionKind::Bool)),
        }
    }

    pub fn string(&self, name: &str) -> Result<&str, SettingsError> {
        match self.get(name)? {
            OptionValue::Str(s) => Ok(s),
            _ => Err(mismatch(name, OptionKind::Str)),
        }
    }
}

fn mismatch(name: &str, expected: OptionKind) -> SettingsError {
    SettingsError::TypeMismatch {
        name: name.to_string(),
        expected,
    }
}
