use xcowsay_ipc::CowMode;

/// How long the bubble should stay up, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTime {
    /// Derived from the number of words in the message.
    Auto,
    /// Stay until the cow is clicked.
    UntilDismissed,
    Fixed(u64),
}

impl DisplayTime {
    /// Decode the `display_time` option: negative is auto, zero is until
    /// dismissed, anything else is milliseconds.
    pub fn from_millis(ms: i64) -> Self {
        match ms {
            n if n < 0 => DisplayTime::Auto,
            0 => DisplayTime::UntilDismissed,
            n => DisplayTime::Fixed(n as u64),
        }
    }
}

/// Resolved display duration for a single popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayDuration {
    Timed(u64),
    UntilDismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    pub lead_in_ms: u64,
    pub lead_out_ms: u64,
    pub display: DisplayTime,
    pub min_display_ms: u64,
    pub max_display_ms: u64,
    pub reading_speed_ms: u64,
    pub dream_ms: u64,
    pub dream_until_dismissed: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            lead_in_ms: 250,
            lead_out_ms: 250,
            display: DisplayTime::Auto,
            min_display_ms: 2000,
            max_display_ms: 30000,
            reading_speed_ms: 250,
            dream_ms: 10000,
            dream_until_dismissed: false,
        }
    }
}

impl TimingConfig {
    fn clamp(&self, ms: u64) -> u64 {
        if ms < self.min_display_ms {
            tracing::debug!("Display time too short: clamped to {}", self.min_display_ms);
            self.min_display_ms
        } else if ms > self.max_display_ms {
            tracing::debug!("Display time too long: clamped to {}", self.max_display_ms);
            self.max_display_ms
        } else {
            ms
        }
    }
}

/// Drop exactly one trailing newline, if present.
pub fn trim_message(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Work out how long the bubble stays visible for `content` shown in `mode`.
pub fn display_duration(content: &str, mode: CowMode, timing: &TimingConfig) -> DisplayDuration {
    match (mode, timing.display) {
        (CowMode::Dream, DisplayTime::UntilDismissed) if timing.dream_until_dismissed => {
            DisplayDuration::UntilDismissed
        }
        (CowMode::Dream, DisplayTime::Auto | DisplayTime::UntilDismissed) => {
            DisplayDuration::Timed(timing.dream_ms)
        }
        (_, DisplayTime::UntilDismissed) => DisplayDuration::UntilDismissed,
        (_, DisplayTime::Fixed(ms)) => DisplayDuration::Timed(timing.clamp(ms)),
        (_, DisplayTime::Auto) => {
            let words = count_words(trim_message(content)) as u64;
            let ms = words.saturating_mul(timing.reading_speed_ms);
            tracing::debug!("Calculated display time as {}ms from {} words", ms, words);
            DisplayDuration::Timed(timing.clamp(ms))
        }
    }
}
