//! Wave progression and spawn scheduling
//!
//! State machine: `Idle -> Spawning -> Waiting -> Idle`. The controller only
//! decides *what* to spawn; variants turn each [`SpawnOrder`] into an entity.
//!
//! Emission is either a burst (whole quota when the wave begins) or timed
//! (one entity per firing of the spawn clock, see [`WaveController::pulse`]).

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How many entities a wave contains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum QuotaRule {
    /// Same batch size every wave
    Fixed(u32),
    /// `max(minimum, floor(wave * multiplier))`
    Scaled { minimum: u32, multiplier: f32 },
}

impl QuotaRule {
    /// Entity count for `wave`, never below 1
    pub fn count(&self, wave: u32) -> u32 {
        let raw = match *self {
            QuotaRule::Fixed(n) => n,
            QuotaRule::Scaled {
                minimum,
                multiplier,
            } => minimum.max((wave as f32 * multiplier).floor().max(0.0) as u32),
        };
        raw.max(1)
    }
}

/// Geometric per-wave growth: `base * factor^(wave - 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    pub base: f32,
    pub factor: f32,
}

impl Growth {
    pub const fn new(base: f32, factor: f32) -> Self {
        Self { base, factor }
    }

    /// Constant stat (factor 1)
    pub const fn flat(base: f32) -> Self {
        Self { base, factor: 1.0 }
    }

    pub fn at(&self, wave: u32) -> f32 {
        let exponent = wave.saturating_sub(1) as i32;
        self.base * self.factor.powi(exponent)
    }
}

/// Kind weights for waves below `below_wave` (or all remaining waves if `None`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTier<K> {
    pub below_wave: Option<u32>,
    pub weights: Vec<(K, f32)>,
}

/// Tiered weighted kind table
///
/// Tiers are checked in order; the first whose `below_wave` exceeds the wave
/// number applies. Inside a tier the weights partition `[0, 1)` in list
/// order and a roll selects the first cumulative bucket containing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindTable<K> {
    pub tiers: Vec<WeightTier<K>>,
}

impl<K: Copy> KindTable<K> {
    /// Single tier used for every wave
    pub fn uniform_tier(weights: Vec<(K, f32)>) -> Self {
        Self {
            tiers: vec![WeightTier {
                below_wave: None,
                weights,
            }],
        }
    }

    fn tier_for(&self, wave: u32) -> Option<&WeightTier<K>> {
        self.tiers
            .iter()
            .find(|t| t.below_wave.is_none_or(|limit| wave < limit))
            .or_else(|| self.tiers.last())
    }

    /// Select a kind for `wave` from a roll in `[0, 1)`
    ///
    /// Rolls past the cumulative total (weights summing below 1) fall into the
    /// last bucket. `None` only when the table is empty.
    pub fn pick(&self, wave: u32, roll: f32) -> Option<K> {
        let tier = self.tier_for(wave)?;
        let mut acc = 0.0;
        for &(kind, weight) in &tier.weights {
            acc += weight;
            if roll < acc {
                return Some(kind);
            }
        }
        tier.weights.last().map(|&(kind, _)| kind)
    }
}

/// Extra guaranteed entity every `every`-th wave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusRule<K> {
    pub every: u32,
    pub kind: K,
}

impl<K> BonusRule<K> {
    pub fn applies(&self, wave: u32) -> bool {
        self.every > 0 && wave > 0 && wave % self.every == 0
    }
}

/// Emission style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emission {
    /// Whole quota at wave start
    Burst,
    /// One entity per spawn-clock firing
    Timed,
}

/// Full wave configuration for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig<K> {
    pub quota: QuotaRule,
    pub emission: Emission,
    pub health: Growth,
    pub speed: Growth,
    pub kinds: KindTable<K>,
    pub bonus: Option<BonusRule<K>>,
}

/// One entity the variant must create
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOrder<K> {
    pub kind: K,
    pub wave: u32,
    /// Wave-scaled base health before any kind multiplier
    pub health: f32,
    /// Wave-scaled base speed before any kind multiplier
    pub speed: f32,
    /// Injected by the bonus rule rather than the weighted draw
    pub bonus: bool,
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveState {
    /// Ready to begin the next wave
    Idle,
    /// Emitting entities; `remaining` still owed for this wave
    Spawning { remaining: u32 },
    /// Quota emitted, waiting for the field to empty
    Waiting,
}

/// Spawn/wave state machine
#[derive(Debug, Clone)]
pub struct WaveController<K> {
    config: WaveConfig<K>,
    state: WaveState,
    /// Current wave number (0 before the first wave)
    wave: u32,
    /// Waves whose entities were all eliminated
    cleared: u32,
}

impl<K: Copy + std::fmt::Debug> WaveController<K> {
    pub fn new(config: WaveConfig<K>) -> Self {
        Self {
            config,
            state: WaveState::Idle,
            wave: 0,
            cleared: 0,
        }
    }

    pub fn config(&self) -> &WaveConfig<K> {
        &self.config
    }

    pub fn state(&self) -> WaveState {
        self.state
    }

    pub fn wave(&self) -> u32 {
        self.wave
    }

    pub fn cleared(&self) -> u32 {
        self.cleared
    }

    pub fn is_idle(&self) -> bool {
        self.state == WaveState::Idle
    }

    /// Back to wave 0, idle
    pub fn reset(&mut self) {
        self.state = WaveState::Idle;
        self.wave = 0;
        self.cleared = 0;
    }

    /// Begin the next wave (`Idle -> Spawning`)
    ///
    /// Returns the orders due immediately: the bonus entity if this wave has
    /// one, plus the whole quota for burst emission. No-op outside `Idle`.
    pub fn begin<R: Rng>(&mut self, rng: &mut R) -> Vec<SpawnOrder<K>> {
        if self.state != WaveState::Idle {
            return Vec::new();
        }

        self.wave += 1;
        let wave = self.wave;
        let quota = self.config.quota.count(wave);
        log::info!("Wave {} begins: quota {}", wave, quota);

        let mut orders = Vec::new();
        if let Some(bonus) = self.config.bonus.filter(|b| b.applies(wave)) {
            log::info!("Wave {}: bonus {:?}", wave, bonus.kind);
            orders.push(self.order(bonus.kind, true));
        }

        self.state = WaveState::Spawning { remaining: quota };
        if self.config.emission == Emission::Burst {
            for _ in 0..quota {
                if let Some(order) = self.emit(rng) {
                    orders.push(order);
                }
            }
        }
        orders
    }

    /// Spawn-clock firing: emit one entity while `Spawning`
    pub fn pulse<R: Rng>(&mut self, rng: &mut R) -> Option<SpawnOrder<K>> {
        if self.config.emission != Emission::Timed {
            return None;
        }
        self.emit(rng)
    }

    /// Report the active opposing entity count after a tick
    ///
    /// Returns `true` exactly once per wave, when `Waiting` sees an empty
    /// field and the controller returns to `Idle`.
    pub fn observe(&mut self, active: usize) -> bool {
        if self.state == WaveState::Waiting && active == 0 {
            self.state = WaveState::Idle;
            self.cleared += 1;
            log::info!("Wave {} cleared", self.wave);
            return true;
        }
        false
    }

    fn emit<R: Rng>(&mut self, rng: &mut R) -> Option<SpawnOrder<K>> {
        let WaveState::Spawning { remaining } = self.state else {
            return None;
        };

        // Counts down even when the draw fails
        let remaining = remaining.saturating_sub(1);
        self.state = if remaining == 0 {
            WaveState::Waiting
        } else {
            WaveState::Spawning { remaining }
        };

        let roll: f32 = rng.random();
        let Some(kind) = self.config.kinds.pick(self.wave, roll) else {
            log::warn!("Wave {}: kind table has no entry, slot skipped", self.wave);
            return None;
        };
        log::debug!("Wave {}: spawn {:?} ({} left)", self.wave, kind, remaining);
        Some(self.order(kind, false))
    }

    fn order(&self, kind: K, bonus: bool) -> SpawnOrder<K> {
        SpawnOrder {
            kind,
            wave: self.wave,
            health: self.config.health.at(self.wave),
            speed: self.config.speed.at(self.wave),
            bonus,
        }
    }
}
