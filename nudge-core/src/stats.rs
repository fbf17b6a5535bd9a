//! Gamification counter: xp, level, streak.

use serde::{Deserialize, Serialize};

pub const XP_PER_COMPLETION: u32 = 25;
pub const XP_PER_LEVEL: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Always below `XP_PER_LEVEL`.
    pub xp: u32,
    /// Starts at 1, never decreases.
    pub level: u32,
    pub streak: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
        }
    }
}

/// What a completion earned, for the celebration banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reward {
    pub xp_gained: u32,
    pub leveled_up: bool,
    pub level: u32,
    pub streak: u32,
}

impl Stats {
    pub fn record_success(&mut self) -> Reward {
        self.xp = self.xp.saturating_add(XP_PER_COMPLETION);
        let leveled_up = self.xp >= XP_PER_LEVEL;
        if leveled_up {
            self.xp -= XP_PER_LEVEL;
            self.level = self.level.saturating_add(1);
        }
        self.streak = self.streak.saturating_add(1);
        Reward {
            xp_gained: XP_PER_COMPLETION,
            leveled_up,
            level: self.level,
            streak: self.streak,
        }
    }

    pub fn record_decline(&mut self) {
        self.streak = 0;
    }

    /// Repair a snapshot that violates the invariants.
    pub fn normalized(mut self) -> Self {
        self.level = self.level.max(1).saturating_add(self.xp / XP_PER_LEVEL);
        self.xp %= XP_PER_LEVEL;
        self
    }
}
