use crate::config::GameConfig;

/// ELI5:
/// ┌──────────────── Round Phase Transitions ────────────────┐
/// │  From      →  Event         →  To                        │
/// ├──────────────────────────────────────────────────────────┤
/// │  Idle      →  start         →  Running                   │
/// │  Ended     →  start         →  Running                   │
/// │  Running   →  toggle_pause  →  Paused                    │
/// │  Paused    →  toggle_pause  →  Running                   │
/// │  Running   →  last tick     →  Ended                     │
/// │  any       →  reset         →  Idle                      │
/// └──────────────────────────────────────────────────────────┘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    #[default]
    Idle,
    Running,
    Paused,
    Ended,
}

impl RoundPhase {
    /// Inside a round, paused or not.
    pub fn is_active(self) -> bool {
        matches!(self, RoundPhase::Running | RoundPhase::Paused)
    }
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Ignored,
    Counted(u32),
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    score: u32,
    coins: u32,
    time_left: u32,
    phase: RoundPhase,
    started_at: Option<f64>,
    ended_at: Option<f64>,
}

impl Session {
    pub fn new(config: &GameConfig) -> Self {
        Session {
            score: 0,
            coins: 0,
            time_left: config.round_seconds,
            phase: RoundPhase::Idle,
            started_at: None,
            ended_at: None,
        }
    }

    /// Fresh session for a round beginning at `now`.
    pub fn started(config: &GameConfig, now: f64) -> Self {
        Session {
            phase: RoundPhase::Running,
            started_at: Some(now),
            ..Session::new(config)
        }
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RoundPhase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.phase == RoundPhase::Paused
    }

    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<f64> {
        self.ended_at
    }

    pub fn award(&mut self, points: u32, coins: u32) {
        self.score = self.score.saturating_add(points);
        self.coins = self.coins.saturating_add(coins);
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.phase = match (self.phase, paused) {
            (RoundPhase::Running, true) => RoundPhase::Paused,
            (RoundPhase::Paused, false) => RoundPhase::Running,
            (phase, _) => phase,
        };
    }

    /// One second off the clock. Only counts while running, and reports
    /// `Finished` exactly once when the clock reaches zero.
    pub fn tick(&mut self) -> Tick {
        if self.phase != RoundPhase::Running {
            return Tick::Ignored;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            Tick::Finished
        } else {
            Tick::Counted(self.time_left)
        }
    }

    /// Close the round. `false` if it was not in progress.
    pub fn finish(&mut self, now: f64) -> bool {
        if !self.phase.is_active() {
            return false;
        }
        self.phase = RoundPhase::Ended;
        self.ended_at = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle_with_full_clock() {
        let session = Session::new(&GameConfig::default());
        assert_eq!(session.phase(), RoundPhase::Idle);
        assert_eq!(session.time_left(), 60);
        assert_eq!((session.score(), session.coins()), (0, 0));
        assert_eq!(session.started_at(), None);
    }

    #[test]
    fn idle_session_does_not_tick() {
        let mut session = Session::new(&GameConfig::default());
        assert_eq!(session.tick(), Tick::Ignored);
        assert_eq!(session.time_left(), 60);
    }

    #[test]
    fn paused_session_does_not_tick() {
        let mut session = Session::started(&GameConfig::default(), 0.0);
        session.set_paused(true);
        assert_eq!(session.tick(), Tick::Ignored);
        assert_eq!(session.time_left(), 60);
    }

    #[test]
    fn clock_finishes_once_at_zero() {
        let config = GameConfig {
            round_seconds: 3,
            ..GameConfig::default()
        };
        let mut session = Session::started(&config, 0.0);
        assert_eq!(session.tick(), Tick::Counted(2));
        assert_eq!(session.tick(), Tick::Counted(1));
        assert_eq!(session.tick(), Tick::Finished);
        assert!(session.finish(3000.0));
        assert!(!session.finish(3001.0));
        assert_eq!(session.tick(), Tick::Ignored);
        assert_eq!(session.time_left(), 0);
        assert_eq!(session.ended_at(), Some(3000.0));
    }

    #[test]
    fn pause_toggles_only_inside_a_round() {
        let mut session = Session::new(&GameConfig::default());
        session.set_paused(true);
        assert_eq!(session.phase(), RoundPhase::Idle);

        let mut session = Session::started(&GameConfig::default(), 0.0);
        session.set_paused(true);
        assert!(session.is_paused());
        session.set_paused(false);
        assert!(session.is_running());
    }
}
