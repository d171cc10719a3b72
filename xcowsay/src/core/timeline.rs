use super::timing::DisplayDuration;

/// Period of the popup tick.
pub const TICK_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CowState {
    LeadIn,
    Display,
    LeadOut,
    Cleanup,
}

impl CowState {
    pub fn next(self) -> Self {
        match self {
            CowState::LeadIn => CowState::Display,
            CowState::Display => CowState::LeadOut,
            CowState::LeadOut | CowState::Cleanup => CowState::Cleanup,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == CowState::Cleanup
    }
}

/// Countdown through the popup states. Each call to [`tick`](Self::tick)
/// accounts for one tick interval and advances at most one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    state: CowState,
    remaining_ms: i64,
    display: DisplayDuration,
    lead_out_ms: u64,
}

impl Timeline {
    pub fn new(lead_in_ms: u64, display: DisplayDuration, lead_out_ms: u64) -> Self {
        Self {
            state: CowState::LeadIn,
            remaining_ms: to_signed(lead_in_ms),
            display,
            lead_out_ms,
        }
    }

    pub fn state(&self) -> CowState {
        self.state
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    fn waiting_for_dismiss(&self) -> bool {
        self.state == CowState::Display && self.display == DisplayDuration::UntilDismissed
    }

    /// Count down one tick. Returns the new state if this tick crossed the
    /// current state's deadline.
    pub fn tick(&mut self) -> Option<CowState> {
        if self.state.is_terminal() || self.waiting_for_dismiss() {
            return None;
        }

        self.remaining_ms -= TICK_INTERVAL_MS as i64;
        if self.remaining_ms <= 0 {
            self.remaining_ms = 0;
            Some(self.advance())
        } else {
            None
        }
    }

    /// Cut the display state short. Has no effect in any other state.
    pub fn dismiss(&mut self) -> Option<CowState> {
        if self.state != CowState::Display {
            return None;
        }
        self.remaining_ms = 0;
        Some(self.advance())
    }

    fn advance(&mut self) -> CowState {
        let from = self.state;
        self.state = from.next();
        self.remaining_ms = match self.state {
            CowState::LeadIn => self.remaining_ms,
            CowState::Display => match self.display {
                DisplayDuration::Timed(ms) => to_signed(ms),
                DisplayDuration::UntilDismissed => 0,
            },
            CowState::LeadOut => to_signed(self.lead_out_ms),
            CowState::Cleanup => 0,
        };
        tracing::debug!(
            "Cow state {:?} -> {:?} ({}ms)",
            from,
            self.state,
            self.remaining_ms
        );
        self.state
    }
}

fn to_signed(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
