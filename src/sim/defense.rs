//! Tower defense
//!
//! Creeps walk a fixed waypoint path, one spawned per firing of the spawn
//! clock. Towers sit on predefined slots and fire locked-target projectiles at
//! the nearest creep in range. Kills pay gold; every creep reaching the end of
//! the path costs a life.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat::{Combatant, Projectile, Sweep, nearest, reap_dead, resolve_projectiles};
use super::events::GameEvent;
use super::input::Command;
use super::outcome::{AfterGameOver, GamePhase, Notice, Outcome, OutcomeTracker, lives_verdict};
use super::registry::{Entity, EntityId, Registry};
use super::snapshot::{EntityView, Hud, ProjectileView, SlotView, Snapshot, ratio};
use super::wave::{SpawnOrder, WaveController};
use crate::config::DefenseConfig;
use crate::geom::{direction, distance, polyline_distance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreepKind {
    Basic,
    Fast,
    Tank,
}

/// Multipliers over the wave-scaled base stats, plus the gold paid on a kill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreepStats {
    pub health: f32,
    pub speed: f32,
    pub reward: u32,
}

impl CreepKind {
    pub fn stats(self) -> CreepStats {
        match self {
            CreepKind::Basic => CreepStats {
                health: 1.0,
                speed: 1.0,
                reward: 5,
            },
            CreepKind::Fast => CreepStats {
                health: 0.7,
                speed: 1.45,
                reward: 6,
            },
            CreepKind::Tank => CreepStats {
                health: 2.2,
                speed: 0.65,
                reward: 10,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CreepKind::Basic => "basic",
            CreepKind::Fast => "fast",
            CreepKind::Tank => "tank",
        }
    }
}

/// A path follower
#[derive(Debug, Clone)]
pub struct Creep {
    pub id: EntityId,
    pub kind: CreepKind,
    pub pos: Vec2,
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub reward: u32,
    /// Index of the waypoint currently walked toward
    pub waypoint: usize,
}

impl Entity for Creep {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Combatant for Creep {
    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn health(&self) -> f32 {
        self.health
    }

    fn take_damage(&mut self, amount: f32) {
        self.health -= amount;
    }
}

#[derive(Debug, Clone)]
pub struct Tower {
    pub id: EntityId,
    pub slot: usize,
    pub pos: Vec2,
    pub range: f32,
    /// Sim time of the last shot; `None` fires immediately
    pub last_shot: Option<f32>,
}

impl Entity for Tower {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Predefined tower site; once occupied it stays occupied until reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub pos: Vec2,
    pub occupied: bool,
}

impl Slot {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            occupied: false,
        }
    }
}

/// Why a placement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoSuchSlot,
    Occupied,
    InsufficientGold,
    TooCloseToPath,
}

/// Complete tower defense state
#[derive(Debug, Clone)]
pub struct Defense {
    config: DefenseConfig,
    seed: u64,
    rng: Pcg32,
    time: f32,
    gold: u32,
    lives: i32,
    /// Total gold earned from kills
    earned: u64,
    slots: Vec<Slot>,
    towers: Registry<Tower>,
    creeps: Registry<Creep>,
    bullets: Registry<Projectile>,
    waves: WaveController<CreepKind>,
    outcome: OutcomeTracker,
    notice: Option<Notice>,
    events: Vec<GameEvent>,
}

impl Defense {
    pub fn new(config: DefenseConfig, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            seed,
            time: 0.0,
            gold: config.gold,
            lives: config.lives,
            earned: 0,
            slots: config.layout.slots.iter().copied().map(Slot::new).collect(),
            towers: Registry::new(),
            creeps: Registry::new(),
            bullets: Registry::new(),
            waves: WaveController::new(config.waves.clone()),
            outcome: OutcomeTracker::new(config.after_game_over, config.game_over_delay),
            notice: None,
            events: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &DefenseConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.outcome.phase()
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn earned(&self) -> u64 {
        self.earned
    }

    pub fn wave(&self) -> u32 {
        self.waves.wave()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn towers(&self) -> &Registry<Tower> {
        &self.towers
    }

    pub fn creeps(&self) -> &Registry<Creep> {
        &self.creeps
    }

    pub fn bullets(&self) -> &Registry<Projectile> {
        &self.bullets
    }

    /// Whether a point is within the no-build clearance of the path
    pub fn near_path(&self, pos: Vec2) -> bool {
        polyline_distance(pos, &self.config.layout.waypoints) <= self.config.path_clearance()
    }

    /// Check a placement without performing it
    pub fn check_placement(&self, slot: usize) -> Result<(), Rejection> {
        let site = self.slots.get(slot).ok_or(Rejection::NoSuchSlot)?;
        if site.occupied {
            return Err(Rejection::Occupied);
        }
        if self.gold < self.config.tower_cost {
            return Err(Rejection::InsufficientGold);
        }
        if self.near_path(site.pos) {
            return Err(Rejection::TooCloseToPath);
        }
        Ok(())
    }

    /// Build a tower on `slot`; rejected placements leave the state untouched
    pub fn place_tower(&mut self, slot: usize) -> bool {
        if !self.outcome.is_running() {
            return false;
        }
        if let Err(reason) = self.check_placement(slot) {
            log::debug!("Placement on slot {} rejected: {:?}", slot, reason);
            if reason == Rejection::TooCloseToPath {
                self.notice = Some(Notice::transient(
                    "Too close to the path!",
                    self.config.notice_duration,
                ));
            }
            self.events.push(GameEvent::PlacementRejected { slot });
            return false;
        }

        let pos = self.slots[slot].pos;
        let range = self.config.tower_range;
        self.slots[slot].occupied = true;
        self.gold -= self.config.tower_cost;
        let id = self.towers.add(|id| Tower {
            id,
            slot,
            pos,
            range,
            last_shot: None,
        });
        self.events.push(GameEvent::TowerPlaced { slot, id });
        log::info!("Tower {} placed on slot {}, gold {}", id, slot, self.gold);
        true
    }

    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.time = 0.0;
        self.gold = self.config.gold;
        self.lives = self.config.lives;
        self.earned = 0;
        for slot in &mut self.slots {
            slot.occupied = false;
        }
        self.towers.clear();
        self.creeps.clear();
        self.bullets.clear();
        self.waves.reset();
        self.outcome.reset();
        self.notice = None;
        self.events.push(GameEvent::Restarted);
        log::info!("Defense reset (seed {})", self.seed);
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::PlaceTower { slot } => {
                self.place_tower(slot);
            }
            Command::TogglePause => self.outcome.toggle_pause(),
            Command::Reset => self.reset(),
            Command::MovePlayer(_) | Command::SendFleet { .. } => {
                log::debug!("Defense ignores {:?}", command);
            }
        }
    }

    pub fn step(&mut self, commands: &[Command], dt: f32) {
        for &command in commands {
            self.apply(command);
        }

        match self.outcome.phase() {
            GamePhase::Running => {}
            GamePhase::Paused => return,
            GamePhase::GameOver(_) => {
                self.after_game_over(dt);
                return;
            }
        }

        self.time += dt;
        if self.notice.as_mut().is_some_and(|n| !n.tick(dt)) {
            self.notice = None;
        }

        // Spawn: timed emission delivers creeps through `pulse`
        if self.waves.is_idle() && self.creeps.is_empty() {
            let orders = self.waves.begin(&mut self.rng);
            self.events.push(GameEvent::WaveStarted {
                wave: self.waves.wave(),
            });
            for order in &orders {
                self.spawn(order);
            }
        }

        self.advance_creeps(dt);

        // Targeting
        let now = self.time;
        let cooldown = self.config.tower_cooldown;
        for tower in self.towers.iter_mut() {
            if tower.last_shot.is_some_and(|t| now - t < cooldown) {
                continue;
            }
            let Some((target, aim)) =
                nearest(tower.pos, self.creeps.iter(), Some(tower.range)).map(|c| (c.id, c.pos))
            else {
                continue;
            };
            let origin = tower.pos;
            let speed = self.config.bullet_speed;
            let damage = self.config.bullet_damage;
            let id = self
                .bullets
                .add(|id| Projectile::aimed(id, origin, aim, speed, damage, Some(target)));
            tower.last_shot = Some(now);
            self.events.push(GameEvent::ProjectileFired { id });
        }

        // Projectiles
        let sweep = Sweep {
            hit_radius: self.config.hit_radius,
            field: self.config.field,
            margin: self.config.bullet_margin,
        };
        resolve_projectiles(&mut self.bullets, &mut self.creeps, dt, &sweep);

        // Rewards
        for creep in reap_dead(&mut self.creeps) {
            self.gold = self.gold.saturating_add(creep.reward);
            self.earned += u64::from(creep.reward);
            self.events.push(GameEvent::EnemyDefeated {
                id: creep.id,
                reward: creep.reward,
            });
        }

        if self.waves.observe(self.creeps.len()) {
            self.events.push(GameEvent::WaveCleared {
                wave: self.waves.wave(),
            });
        }

        let won = self
            .config
            .target_waves
            .is_some_and(|target| self.waves.cleared() >= target);
        if let Some(outcome) = self.outcome.settle(lives_verdict(self.lives, won)) {
            self.events.push(GameEvent::GameOver { outcome });
            self.notice = Some(Notice::sticky(match outcome {
                Outcome::Win => "Victory!",
                Outcome::Lose => "Defeat",
            }));
        }
    }

    /// Spawn-clock firing
    pub fn pulse(&mut self) {
        if !self.outcome.is_running() {
            return;
        }
        if let Some(order) = self.waves.pulse(&mut self.rng) {
            self.spawn(&order);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let hud = Hud {
            wave: self.waves.wave(),
            score: self.earned,
            currency: self.gold,
            lives: self.lives,
        };
        let mut snapshot = Snapshot::new(self.outcome.phase(), hud);
        let creeps = self.creeps.iter().map(|c| EntityView {
            id: c.id,
            pos: c.pos,
            kind: c.kind.name(),
            health_ratio: ratio(c.health, c.max_health),
            owner: None,
            units: None,
        });
        let towers = self.towers.iter().map(|t| EntityView {
            id: t.id,
            pos: t.pos,
            kind: "tower",
            health_ratio: 1.0,
            owner: None,
            units: None,
        });
        snapshot.entities = towers.chain(creeps).collect();
        snapshot.projectiles = self
            .bullets
            .iter()
            .map(|b| ProjectileView { id: b.id, pos: b.pos })
            .collect();
        snapshot.slots = self
            .slots
            .iter()
            .map(|s| SlotView {
                pos: s.pos,
                occupied: s.occupied,
            })
            .collect();
        snapshot.message = self.notice.as_ref().map(|n| n.text.clone());
        snapshot
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Walk creeps along the path; creeps past the last waypoint cost a life
    fn advance_creeps(&mut self, dt: f32) {
        let waypoints = &self.config.layout.waypoints;
        let Some(last) = waypoints.len().checked_sub(1) else {
            return;
        };
        let threshold = self.config.waypoint_threshold;
        let mut escaped = Vec::new();

        for creep in self.creeps.iter_mut() {
            let target = waypoints[creep.waypoint.min(last)];
            let gap = distance(creep.pos, target);
            if gap < threshold {
                if creep.waypoint >= last {
                    escaped.push(creep.id);
                } else {
                    creep.waypoint += 1;
                }
                continue;
            }
            let step = (creep.speed * dt).min(gap);
            creep.pos += direction(creep.pos, target) * step;
        }

        for id in &escaped {
            self.lives = (self.lives - 1).max(0);
            self.events.push(GameEvent::EnemyEscaped { id: *id });
            self.events.push(GameEvent::PlayerDamaged { lives: self.lives });
            log::debug!("Creep {} escaped, lives {}", id, self.lives);
        }
        self.creeps.remove_all(&escaped);
    }

    fn spawn(&mut self, order: &SpawnOrder<CreepKind>) {
        let Some(&start) = self.config.layout.waypoints.first() else {
            log::warn!("No path configured, dropping {:?}", order.kind);
            return;
        };
        let stats = order.kind.stats();
        let health = order.health * stats.health;
        let speed = order.speed * stats.speed;
        let id = self.creeps.add(|id| Creep {
            id,
            kind: order.kind,
            pos: start,
            speed,
            health,
            max_health: health,
            reward: stats.reward,
            waypoint: 1,
        });
        log::debug!("Spawned {:?} {} (hp {:.1})", order.kind, id, health);
    }

    fn after_game_over(&mut self, dt: f32) {
        match self.outcome.countdown(dt) {
            Some(AfterGameOver::Reset) => self.reset(),
            Some(AfterGameOver::Exit) => self.events.push(GameEvent::ExitRequested),
            Some(AfterGameOver::Hold) | None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefenseLayout;
    use crate::sim::wave::QuotaRule;
    use proptest::prelude::*;
    use std::collections::HashMap;

    const DT: f32 = 0.016;

    fn defense() -> Defense {
        Defense::new(DefenseConfig::default(), 5)
    }

    fn place_creep(game: &mut Defense, pos: Vec2, health: f32) -> EntityId {
        game.creeps.add(|id| Creep {
            id,
            kind: CreepKind::Basic,
            pos,
            speed: 0.0,
            health,
            max_health: health,
            reward: 5,
            waypoint: 1,
        })
    }

    #[test]
    fn test_default_layout_clearance() {
        let game = defense();
        assert_eq!(game.slots().len(), 12);
        let blocked: Vec<_> = game
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, s)| game.near_path(s.pos))
            .map(|(i, _)| i)
            .collect();
        // The lower right slot hugs the G-H leg
        assert_eq!(blocked, vec![10]);
    }

    #[test]
    fn test_exact_gold_placement() {
        let mut config = DefenseConfig::default();
        config.gold = 50;
        let mut game = Defense::new(config, 1);

        assert!(game.place_tower(0));
        assert_eq!(game.gold(), 0);
        assert!(game.slots()[0].occupied);
        assert_eq!(game.towers().len(), 1);

        // Same slot again: no-op
        assert!(!game.place_tower(0));
        assert_eq!(game.check_placement(0), Err(Rejection::Occupied));
        assert_eq!(game.gold(), 0);
        assert_eq!(game.towers().len(), 1);

        // Broke
        assert_eq!(game.check_placement(1), Err(Rejection::InsufficientGold));
        assert!(!game.place_tower(1));
        assert!(!game.place_tower(99));
    }

    #[test]
    fn test_path_adjacent_slot_shows_notice() {
        let mut game = defense();
        let slot = 10;
        assert_eq!(game.check_placement(slot), Err(Rejection::TooCloseToPath));

        assert!(!game.place_tower(slot));
        assert_eq!(game.gold(), 100);
        assert!(game.towers().is_empty());
        assert!(!game.slots()[slot].occupied);
        assert_eq!(
            game.snapshot().message.as_deref(),
            Some("Too close to the path!")
        );

        for _ in 0..60 {
            game.step(&[], DT);
        }
        assert_eq!(game.snapshot().message, None);
    }

    #[test]
    fn test_creeps_follow_waypoints_and_escape() {
        let mut config = DefenseConfig::default();
        config.layout = DefenseLayout {
            waypoints: vec![Vec2::new(0.0, 100.0), Vec2::new(100.0, 100.0)],
            slots: vec![],
        };
        let mut game = Defense::new(config, 1);
        let id = place_creep(&mut game, Vec2::new(0.0, 100.0), 10.0);
        if let Some(creep) = game.creeps.get_mut(id) {
            creep.speed = 100.0;
        }

        game.step(&[], 0.5);
        assert_eq!(game.creeps().get(id).map(|c| c.pos), Some(Vec2::new(50.0, 100.0)));
        game.step(&[], 0.5);
        assert_eq!(game.creeps().get(id).map(|c| c.pos), Some(Vec2::new(100.0, 100.0)));
        assert_eq!(game.lives(), 10);

        // At the final waypoint: consumed on the next tick
        game.step(&[], DT);
        assert!(!game.creeps().contains(id));
        assert_eq!(game.lives(), 9);
        assert_eq!(game.gold(), 100, "escapes pay nothing");
    }

    #[test]
    fn test_tower_kill_pays_reward() {
        let mut game = defense();
        assert!(game.place_tower(0));
        let tower_pos = game.slots()[0].pos;
        let creep = place_creep(&mut game, tower_pos + Vec2::new(0.0, 54.0), 6.0);

        game.step(&[], DT);
        assert_eq!(game.bullets().len(), 1);
        assert_eq!(game.bullets().all()[0].target, Some(creep));

        for _ in 0..20 {
            game.step(&[], DT);
        }
        assert!(!game.creeps().contains(creep));
        assert_eq!(game.gold(), 55);
        assert_eq!(game.earned(), 5);
    }

    #[test]
    fn test_tower_ignores_out_of_range() {
        let mut game = defense();
        assert!(game.place_tower(0));
        let tower_pos = game.slots()[0].pos;
        place_creep(&mut game, tower_pos + Vec2::new(0.0, 113.0), 6.0);
        game.step(&[], DT);
        assert!(game.bullets().is_empty());
    }

    #[test]
    fn test_wave_spawns_on_pulse() {
        let mut game = defense();
        game.step(&[], DT);
        assert_eq!(game.wave(), 1);
        assert!(game.creeps().is_empty(), "timed waves start empty");

        for _ in 0..3 {
            game.pulse();
        }
        assert_eq!(game.creeps().len(), 3);
        let start = game.config().layout.waypoints[0];
        for creep in game.creeps().iter() {
            assert_eq!(creep.pos, start);
            assert_eq!(creep.waypoint, 1);
            // Wave 1 base health 18 times kind multiplier
            let expected = 18.0 * creep.kind.stats().health;
            assert!((creep.max_health - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_simultaneous_clear_and_last_life_is_loss() {
        let mut config = DefenseConfig::default();
        config.lives = 1;
        config.target_waves = Some(1);
        config.waves.quota = QuotaRule::Fixed(1);
        let mut game = Defense::new(config, 3);

        game.step(&[], DT);
        game.pulse();
        assert_eq!(game.creeps().len(), 1);

        // Last creep of the last wave reaches the goal
        let goal = *game.config().layout.waypoints.last().expect("path");
        let last = game.config().layout.waypoints.len() - 1;
        for creep in game.creeps.iter_mut() {
            creep.pos = goal;
            creep.waypoint = last;
        }
        game.step(&[], DT);

        assert_eq!(game.lives(), 0);
        assert_eq!(game.waves.cleared(), 1);
        assert_eq!(game.phase(), GamePhase::GameOver(Outcome::Lose));
    }

    #[test]
    fn test_multiple_escapes_floor_lives_at_zero() {
        let mut config = DefenseConfig::default();
        config.lives = 1;
        let mut game = Defense::new(config, 4);
        let goal = *game.config().layout.waypoints.last().expect("path");
        let last = game.config().layout.waypoints.len() - 1;
        for _ in 0..3 {
            let id = place_creep(&mut game, goal, 10.0);
            if let Some(creep) = game.creeps.get_mut(id) {
                creep.waypoint = last;
            }
        }

        game.step(&[], DT);
        assert_eq!(game.lives(), 0);
        assert!(game.creeps().is_empty());
        assert_eq!(game.snapshot().hud.lives, 0);
        let events = game.drain_events();
        assert!(
            events
                .iter()
                .all(|e| !matches!(e, GameEvent::PlayerDamaged { lives } if *lives < 0))
        );
        assert_eq!(game.phase(), GamePhase::GameOver(Outcome::Lose));
    }

    #[test]
    fn test_game_over_resets_after_delay() {
        let mut config = DefenseConfig::default();
        config.lives = 1;
        let mut game = Defense::new(config, 3);
        assert!(game.place_tower(0));

        game.step(&[], DT);
        game.pulse();
        let goal = *game.config().layout.waypoints.last().expect("path");
        let last = game.config().layout.waypoints.len() - 1;
        for creep in game.creeps.iter_mut() {
            creep.pos = goal;
            creep.waypoint = last;
        }
        game.step(&[], DT);
        assert_eq!(game.phase(), GamePhase::GameOver(Outcome::Lose));

        game.step(&[], 1.0);
        assert!(matches!(game.phase(), GamePhase::GameOver(_)));
        game.step(&[], 0.25);
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.gold(), 100);
        assert_eq!(game.lives(), 1);
        assert!(game.towers().is_empty());
        assert!(game.slots().iter().all(|s| !s.occupied));
        assert!(game.drain_events().contains(&GameEvent::Restarted));
    }

    proptest! {
        #[test]
        fn prop_creep_health_positive_and_never_rises(
            ops in proptest::collection::vec((0u8..4, 0usize..12), 1..300),
        ) {
            let mut game = defense();
            let mut seen: HashMap<EntityId, f32> = HashMap::new();
            for (op, slot) in ops {
                match op {
                    0 | 1 => {
                        game.step(&[], DT * 4.0);
                        for creep in game.creeps().iter() {
                            prop_assert!(creep.health > 0.0, "creep {} at {}", creep.id, creep.health);
                            if let Some(&before) = seen.get(&creep.id) {
                                prop_assert!(creep.health <= before);
                            }
                        }
                        seen = game.creeps().iter().map(|c| (c.id, c.health)).collect();
                    }
                    2 => game.pulse(),
                    _ => game.apply(Command::PlaceTower { slot }),
                }
            }
        }

        #[test]
        fn prop_rejected_placement_is_idempotent(taps in proptest::collection::vec(0usize..15, 1..40)) {
            let mut game = defense();
            for slot in taps {
                let gold = game.gold();
                let towers = game.towers().len();
                let slots = game.slots().to_vec();
                if game.place_tower(slot) {
                    prop_assert_eq!(game.gold(), gold - 50);
                    prop_assert_eq!(game.towers().len(), towers + 1);
                } else {
                    prop_assert_eq!(game.gold(), gold);
                    prop_assert_eq!(game.towers().len(), towers);
                    prop_assert_eq!(game.slots(), &slots[..]);
                }
            }
        }
    }
}
