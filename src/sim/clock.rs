//! Logical clocks
//!
//! The host reports elapsed wall time; the scheduler turns it into an ordered
//! list of clock firings. Nothing here reads a real clock, so runs replay
//! exactly given the same elapsed sequence.

use crate::consts::MAX_CATCH_UP;

/// Seconds a firing may come early
const TOLERANCE: f64 = 1e-6;

/// Handle to a registered clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(usize);

#[derive(Debug, Clone)]
struct Clock {
    period: f64,
    accumulator: f64,
    cancelled: bool,
}

/// One clock firing within an `advance` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firing {
    pub handle: TimerHandle,
    /// Offset from the start of the advanced interval (seconds)
    pub at: f64,
    /// Time this firing accounts for; a whole period unless catch-up was capped
    pub dt: f32,
}

/// Fixed-period clocks driven by reported elapsed time
#[derive(Debug, Clone)]
pub struct Scheduler {
    clocks: Vec<Clock>,
    max_catch_up: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::with_catch_up(MAX_CATCH_UP)
    }

    /// Scheduler firing each clock at most `max_catch_up` times per advance
    pub fn with_catch_up(max_catch_up: u32) -> Self {
        Self {
            clocks: Vec::new(),
            max_catch_up: max_catch_up.max(1),
        }
    }

    /// Register a clock firing every `period` seconds
    pub fn add(&mut self, period: f32) -> TimerHandle {
        let period = f64::from(period.max(f32::EPSILON));
        self.clocks.push(Clock {
            period,
            accumulator: 0.0,
            cancelled: false,
        });
        TimerHandle(self.clocks.len() - 1)
    }

    /// Stop a clock for good; pending time is discarded
    pub fn cancel(&mut self, handle: TimerHandle) {
        if let Some(clock) = self.clocks.get_mut(handle.0) {
            clock.cancelled = true;
            clock.accumulator = 0.0;
        }
    }

    pub fn cancel_all(&mut self) {
        for clock in &mut self.clocks {
            clock.cancelled = true;
            clock.accumulator = 0.0;
        }
    }

    /// Unknown handles count as cancelled
    pub fn is_cancelled(&self, handle: TimerHandle) -> bool {
        self.clocks.get(handle.0).is_none_or(|c| c.cancelled)
    }

    /// Account for `elapsed` seconds and return the due firings
    ///
    /// Firings are ordered by time, ties broken by registration order. A clock
    /// that fell more than the catch-up limit behind fires the limit and the
    /// last firing's `dt` absorbs the surplus periods.
    pub fn advance(&mut self, elapsed: f64) -> Vec<Firing> {
        let elapsed = elapsed.max(0.0);
        let mut firings = Vec::new();

        for (index, clock) in self.clocks.iter_mut().enumerate() {
            if clock.cancelled {
                continue;
            }
            clock.accumulator += elapsed;
            // Periods arrive as f32; tolerate their rounding at exact multiples
            let due = ((clock.accumulator + TOLERANCE) / clock.period).floor() as u64;
            if due == 0 {
                continue;
            }
            clock.accumulator = (clock.accumulator - due as f64 * clock.period).max(0.0);

            let fired = due.min(u64::from(self.max_catch_up));
            let surplus = due - fired;
            if surplus > 0 {
                log::debug!("Clock {} dropped {} firings", index, surplus);
            }
            // The latest due firing happened `accumulator` seconds before the end
            let last_at = elapsed - clock.accumulator;
            for k in 0..fired {
                let back = (due - 1 - k) as f64 * clock.period;
                let dt = if k + 1 == fired {
                    clock.period * (surplus + 1) as f64
                } else {
                    clock.period
                };
                firings.push(Firing {
                    handle: TimerHandle(index),
                    at: (last_at - back).max(0.0),
                    dt: dt as f32,
                });
            }
        }

        firings.sort_by(|a, b| a.at.total_cmp(&b.at).then(a.handle.0.cmp(&b.handle.0)));
        firings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(firings: &[Firing], handle: TimerHandle) -> usize {
        firings.iter().filter(|f| f.handle == handle).count()
    }

    #[test]
    fn test_two_clocks_interleave() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.add(0.04);
        let fire = scheduler.add(0.1);

        let firings = scheduler.advance(0.2);
        assert_eq!(count(&firings, tick), 5);
        assert_eq!(count(&firings, fire), 2);
        assert!(firings.windows(2).all(|w| w[0].at <= w[1].at));

        // The pulse at 0.1 lands between the tick firings around it
        let order: Vec<_> = firings.iter().map(|f| f.handle).collect();
        assert_eq!(order[0], tick);
        assert_eq!(order[1], tick);
        assert_eq!(order[2], fire);
    }

    #[test]
    fn test_fractional_time_carries_over() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.add(0.1);
        assert!(scheduler.advance(0.06).is_empty());
        let firings = scheduler.advance(0.06);
        assert_eq!(count(&firings, tick), 1);
        assert!((firings[0].at - 0.04).abs() < 1e-6);
        assert!((firings[0].dt - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_catch_up_folds_surplus() {
        let mut scheduler = Scheduler::with_catch_up(4);
        let tick = scheduler.add(0.1);
        let firings = scheduler.advance(1.0);
        assert_eq!(count(&firings, tick), 4);
        let total: f32 = firings.iter().map(|f| f.dt).sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert!((firings[3].dt - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_cancelled_clock_never_fires() {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.add(0.04);
        let fire = scheduler.add(0.3);
        scheduler.advance(0.02);
        scheduler.cancel(fire);

        let firings = scheduler.advance(1.0);
        assert_eq!(count(&firings, fire), 0);
        assert!(count(&firings, tick) > 0);

        scheduler.cancel_all();
        assert!(scheduler.is_cancelled(tick));
        assert!(scheduler.advance(5.0).is_empty());
        assert!(scheduler.is_cancelled(TimerHandle(99)));
    }
}
