//! Spell cast sub-state

use serde::{Deserialize, Serialize};

/// Cast sub-state, numbered like the animation system expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CastState {
    #[default]
    NoCast = 0,
    Finalize = 1,
    Invest0 = 16,
    Invest1 = 17,
    Invest2 = 19,
    Invest3 = 20,
    Invest4 = 21,
    Invest5 = 22,
    Invest6 = 23,
    Cast0 = 32,
    Cast1 = 33,
    Cast2 = 34,
    Cast3 = 35,
}

const INVEST: [CastState; 7] = [
    CastState::Invest0,
    CastState::Invest1,
    CastState::Invest2,
    CastState::Invest3,
    CastState::Invest4,
    CastState::Invest5,
    CastState::Invest6,
];

const CAST: [CastState; 4] = [CastState::Cast0, CastState::Cast1, CastState::Cast2, CastState::Cast3];

impl CastState {
    /// Investing mana
    pub fn is_investing(&self) -> bool {
        INVEST.contains(self)
    }

    /// Releasing the spell
    pub fn is_releasing(&self) -> bool {
        CAST.contains(self)
    }
}

/// Cast progress of one actor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellCast {
    state: CastState,
    /// Invest levels of the current spell (1..=7)
    invest_levels: u8,
    next_step: u64,
}

impl SpellCast {
    /// Current sub-state
    pub fn state(&self) -> CastState {
        self.state
    }

    /// Any sub-state other than `NoCast`
    pub fn is_casting(&self) -> bool {
        self.state != CastState::NoCast
    }

    /// Start investing; false if a cast is already running
    pub fn begin(&mut self, invest_levels: u8, now: u64, step_ms: u64) -> bool {
        if self.is_casting() {
            log::debug!("Cast requested while in {:?}", self.state);
            return false;
        }
        self.invest_levels = invest_levels.clamp(1, INVEST.len() as u8);
        self.state = CastState::Invest0;
        self.next_step = now + step_ms;
        true
    }

    /// Abort without finalizing
    pub fn abort(&mut self) {
        self.state = CastState::NoCast;
    }

    /// Advance by one step when due, returning the new sub-state
    pub fn tick(&mut self, now: u64, step_ms: u64) -> Option<CastState> {
        if !self.is_casting() || now < self.next_step {
            return None;
        }
        self.next_step = now + step_ms;
        self.state = self.successor();
        Some(self.state)
    }

    fn successor(&self) -> CastState {
        if let Some(i) = INVEST.iter().position(|s| *s == self.state) {
            return if i + 1 < self.invest_levels as usize {
                INVEST[i + 1]
            } else {
                CastState::Cast0
            };
        }
        if let Some(i) = CAST.iter().position(|s| *s == self.state) {
            return CAST.get(i + 1).copied().unwrap_or(CastState::Finalize);
        }
        CastState::NoCast
    }
}
