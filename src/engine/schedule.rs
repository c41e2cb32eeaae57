use super::GameEngine;
use crate::types::{Phase, PowerWindow, RuntimeEvent, ScheduleState};

/// Global scatter/chase alternation. Owned by the engine and advanced once
/// per tick; starts in Scatter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeScheduler {
    phase: Phase,
    remaining_ticks: u32,
    flips: u32,
    scatter_ticks: u32,
    chase_ticks: u32,
}

impl ModeScheduler {
    pub fn new(scatter_ticks: u32, chase_ticks: u32) -> Self {
        Self {
            phase: Phase::Scatter,
            remaining_ticks: scatter_ticks,
            flips: 0,
            scatter_ticks,
            chase_ticks,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> ScheduleState {
        ScheduleState {
            phase: self.phase,
            remaining_ticks: self.remaining_ticks,
            flips: self.flips,
        }
    }

    /// Counts one tick down and returns the new phase when it flips.
    pub fn advance(&mut self) -> Option<Phase> {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        if self.remaining_ticks > 0 {
            return None;
        }
        self.phase = match self.phase {
            Phase::Scatter => Phase::Chase,
            Phase::Chase => Phase::Scatter,
        };
        self.remaining_ticks = self.duration_of(self.phase);
        self.flips += 1;
        Some(self.phase)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.scatter_ticks, self.chase_ticks);
    }

    fn duration_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Scatter => self.scatter_ticks,
            Phase::Chase => self.chase_ticks,
        }
    }
}

impl GameEngine {
    /// Restarts the vulnerability window; a new window always resets the combo.
    pub(super) fn activate_power_window(&mut self) {
        self.power = PowerWindow {
            active: true,
            remaining_ticks: self.config.power_duration_ticks,
            combo: 0,
        };
        self.frighten_ghosts();
    }

    pub(super) fn update_power_window(&mut self) {
        if !self.power.active {
            return;
        }
        self.power.remaining_ticks = self.power.remaining_ticks.saturating_sub(1);
        if self.power.remaining_ticks > 0 {
            return;
        }
        self.power = PowerWindow::default();
        self.calm_frightened_ghosts(self.scheduler.phase());
        self.events.push(RuntimeEvent::PowerWindowEnded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternates_with_fixed_durations() {
        let mut scheduler = ModeScheduler::new(3, 5);
        assert_eq!(scheduler.phase(), Phase::Scatter);
        assert_eq!(scheduler.advance(), None);
        assert_eq!(scheduler.advance(), None);
        assert_eq!(scheduler.advance(), Some(Phase::Chase));
        for _ in 0..4 {
            assert_eq!(scheduler.advance(), None);
        }
        assert_eq!(scheduler.advance(), Some(Phase::Scatter));
        assert_eq!(scheduler.state().flips, 2);
        assert_eq!(scheduler.state().remaining_ticks, 3);
    }

    #[test]
    fn reset_returns_to_initial_scatter() {
        let mut scheduler = ModeScheduler::new(2, 4);
        scheduler.advance();
        scheduler.advance();
        assert_eq!(scheduler.phase(), Phase::Chase);
        scheduler.reset();
        assert_eq!(scheduler, ModeScheduler::new(2, 4));
    }
}
