//! Game phase, terminal outcomes and transient notices
//!
//! `GameOver` is terminal: only an explicit reset (from the terminal policy
//! or a `Reset` command) returns a game to `Running`.

use serde::{Deserialize, Serialize};

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
}

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Ticks advance the simulation
    Running,
    /// Frozen by the player; ticks are ignored
    Paused,
    /// Frozen for good until reset
    GameOver(Outcome),
}

/// What happens once the terminal delay elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AfterGameOver {
    /// Reinitialize every component from configuration defaults
    Reset,
    /// Ask the host to navigate away
    Exit,
    /// Stay on the terminal screen
    Hold,
}

/// Verdict for variants that lose by running out of lives
///
/// Loss wins over a simultaneous win.
pub fn lives_verdict(lives: i32, won: bool) -> Option<Outcome> {
    if lives <= 0 {
        Some(Outcome::Lose)
    } else if won {
        Some(Outcome::Win)
    } else {
        None
    }
}

/// Verdict for ownership-based games
///
/// Win when the rival holds nothing and the player holds something; lose in
/// the mirrored case. Both empty at once counts as a loss.
pub fn ownership_verdict(player_owned: usize, rival_owned: usize) -> Option<Outcome> {
    match (player_owned, rival_owned) {
        (0, _) => Some(Outcome::Lose),
        (_, 0) => Some(Outcome::Win),
        _ => None,
    }
}

/// Message shown to the player, optionally expiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub text: String,
    /// Seconds left; `None` means it stays until replaced or cleared
    pub remaining: Option<f32>,
}

impl Notice {
    pub fn transient(text: impl Into<String>, seconds: f32) -> Self {
        Self {
            text: text.into(),
            remaining: Some(seconds),
        }
    }

    pub fn sticky(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            remaining: None,
        }
    }

    /// Count down; returns false once expired
    pub fn tick(&mut self, dt: f32) -> bool {
        match self.remaining.as_mut() {
            Some(left) => {
                *left -= dt;
                *left > 0.0
            }
            None => true,
        }
    }
}

/// Tracks phase transitions and the terminal countdown
#[derive(Debug, Clone)]
pub struct OutcomeTracker {
    phase: GamePhase,
    policy: AfterGameOver,
    delay: f32,
    /// Seconds until the policy fires; `None` once fired or while not terminal
    countdown: Option<f32>,
}

impl OutcomeTracker {
    pub fn new(policy: AfterGameOver, delay: f32) -> Self {
        Self {
            phase: GamePhase::Running,
            policy,
            delay,
            countdown: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            GamePhase::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Apply a verdict from the end of a tick
    ///
    /// Returns the outcome if this call moved the game into `GameOver`.
    pub fn settle(&mut self, verdict: Option<Outcome>) -> Option<Outcome> {
        if !self.is_running() {
            return None;
        }
        let outcome = verdict?;
        self.phase = GamePhase::GameOver(outcome);
        self.countdown = Some(self.delay);
        log::info!("Game over: {:?}", outcome);
        Some(outcome)
    }

    /// Toggle between `Running` and `Paused`; terminal phases are untouched
    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            GamePhase::Running => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Running,
            terminal => terminal,
        };
    }

    /// Advance the terminal countdown
    ///
    /// Yields the policy exactly once, when the delay has fully elapsed.
    pub fn countdown(&mut self, dt: f32) -> Option<AfterGameOver> {
        let left = self.countdown.as_mut()?;
        *left -= dt;
        if *left > 0.0 {
            return None;
        }
        self.countdown = None;
        Some(self.policy)
    }

    /// Back to `Running`
    pub fn reset(&mut self) {
        self.phase = GamePhase::Running;
        self.countdown = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lives_verdict_prefers_loss() {
        assert_eq!(lives_verdict(3, false), None);
        assert_eq!(lives_verdict(0, false), Some(Outcome::Lose));
        assert_eq!(lives_verdict(2, true), Some(Outcome::Win));
        assert_eq!(lives_verdict(0, true), Some(Outcome::Lose));
    }

    #[test]
    fn test_ownership_verdict() {
        assert_eq!(ownership_verdict(2, 1), None);
        assert_eq!(ownership_verdict(1, 0), Some(Outcome::Win));
        assert_eq!(ownership_verdict(0, 3), Some(Outcome::Lose));
        // Simultaneous elimination counts as a loss
        assert_eq!(ownership_verdict(0, 0), Some(Outcome::Lose));
    }

    #[test]
    fn test_settle_is_terminal() {
        let mut tracker = OutcomeTracker::new(AfterGameOver::Reset, 1.2);
        assert_eq!(tracker.settle(None), None);
        assert_eq!(tracker.settle(Some(Outcome::Lose)), Some(Outcome::Lose));
        assert_eq!(tracker.phase(), GamePhase::GameOver(Outcome::Lose));

        // Later verdicts cannot overwrite the outcome
        assert_eq!(tracker.settle(Some(Outcome::Win)), None);
        assert_eq!(tracker.outcome(), Some(Outcome::Lose));

        // Pause does not leave a terminal phase
        tracker.toggle_pause();
        assert_eq!(tracker.phase(), GamePhase::GameOver(Outcome::Lose));
    }

    #[test]
    fn test_countdown_fires_once() {
        let mut tracker = OutcomeTracker::new(AfterGameOver::Exit, 1.0);
        assert_eq!(tracker.countdown(5.0), None, "not terminal yet");

        tracker.settle(Some(Outcome::Win));
        assert_eq!(tracker.countdown(0.6), None);
        assert_eq!(tracker.countdown(0.6), Some(AfterGameOver::Exit));
        assert_eq!(tracker.countdown(0.6), None);

        tracker.reset();
        assert!(tracker.is_running());
    }

    #[test]
    fn test_pause_toggle() {
        let mut tracker = OutcomeTracker::new(AfterGameOver::Hold, 1.0);
        tracker.toggle_pause();
        assert_eq!(tracker.phase(), GamePhase::Paused);
        assert_eq!(tracker.settle(Some(Outcome::Lose)), None, "paused games do not settle");
        tracker.toggle_pause();
        assert!(tracker.is_running());
    }

    #[test]
    fn test_notice_expiry() {
        let mut notice = Notice::transient("Too close to the path!", 0.8);
        assert!(notice.tick(0.5));
        assert!(!notice.tick(0.5));

        let mut sticky = Notice::sticky("Victory!");
        assert!(sticky.tick(100.0));
    }
}
