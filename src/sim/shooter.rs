//! Top-down shooter
//!
//! Enemies spawn in bursts on a ring outside the playfield and home in on the
//! player. The player auto-fires at the nearest enemy on the fire clock and
//! loses a life on contact, at most once per enemy per cooldown window.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combat::{Combatant, Projectile, Sweep, nearest, reap_dead, resolve_projectiles};
use super::events::GameEvent;
use super::input::Command;
use super::outcome::{AfterGameOver, GamePhase, Notice, Outcome, OutcomeTracker, lives_verdict};
use super::registry::{Entity, EntityId, Registry};
use super::snapshot::{EntityView, Hud, PlayerView, ProjectileView, Snapshot, ratio};
use super::wave::{SpawnOrder, WaveController};
use crate::config::ShooterConfig;
use crate::geom::{direction, distance, distance_sq};

/// Enemy tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Normal,
    Miniboss,
    Boss,
    /// Only ever injected by the bonus rule
    Superboss,
}

/// Per-kind multipliers applied to the wave-scaled base stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub health: f32,
    pub speed: f32,
    pub reward: u32,
}

impl EnemyKind {
    pub fn stats(self) -> EnemyStats {
        match self {
            EnemyKind::Normal => EnemyStats {
                health: 1.0,
                speed: 1.0,
                reward: 1,
            },
            EnemyKind::Miniboss => EnemyStats {
                health: 5.0,
                speed: 1.2,
                reward: 1,
            },
            EnemyKind::Boss => EnemyStats {
                health: 12.0,
                speed: 1.35,
                reward: 1,
            },
            EnemyKind::Superboss => EnemyStats {
                health: 30.0,
                speed: 1.55,
                reward: 1,
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Normal => "normal",
            EnemyKind::Miniboss => "miniboss",
            EnemyKind::Boss => "boss",
            EnemyKind::Superboss => "superboss",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Pixels per second, resolved at spawn
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub reward: u32,
    /// Sim time of the last life this enemy took
    pub last_contact: Option<f32>,
}

impl Entity for Enemy {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Combatant for Enemy {
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

impl Enemy {
    fn from_order(id: EntityId, order: &SpawnOrder<EnemyKind>, pos: Vec2) -> Self {
        let stats = order.kind.stats();
        let health = order.health * stats.health;
        Self {
            id,
            kind: order.kind,
            pos,
            speed: order.speed * stats.speed,
            health,
            max_health: health,
            reward: stats.reward,
            last_contact: None,
        }
    }
}

/// Complete shooter state
#[derive(Debug, Clone)]
pub struct Shooter {
    config: ShooterConfig,
    seed: u64,
    rng: Pcg32,
    /// Simulated seconds since the last reset
    time: f32,
    player: Vec2,
    lives: i32,
    score: u64,
    enemies: Registry<Enemy>,
    bullets: Registry<Projectile>,
    waves: WaveController<EnemyKind>,
    outcome: OutcomeTracker,
    notice: Option<Notice>,
    events: Vec<GameEvent>,
    exit_requested: bool,
}

impl Shooter {
    pub fn new(config: ShooterConfig, seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            seed,
            time: 0.0,
            player: config.field.center(),
            lives: config.lives,
            score: 0,
            enemies: Registry::new(),
            bullets: Registry::new(),
            waves: WaveController::new(config.waves.clone()),
            outcome: OutcomeTracker::new(config.after_game_over, config.game_over_delay),
            notice: None,
            events: Vec::new(),
            exit_requested: false,
            config,
        }
    }

    pub fn config(&self) -> &ShooterConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.outcome.phase()
    }

    pub fn player(&self) -> Vec2 {
        self.player
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn wave(&self) -> u32 {
        self.waves.wave()
    }

    pub fn enemies(&self) -> &Registry<Enemy> {
        &self.enemies
    }

    pub fn bullets(&self) -> &Registry<Projectile> {
        &self.bullets
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Reinitialize everything from the configuration; ids keep counting
    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.time = 0.0;
        self.player = self.config.field.center();
        self.lives = self.config.lives;
        self.score = 0;
        self.enemies.clear();
        self.bullets.clear();
        self.waves.reset();
        self.outcome.reset();
        self.notice = None;
        self.exit_requested = false;
        self.events.push(GameEvent::Restarted);
        log::info!("Shooter reset (seed {})", self.seed);
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::MovePlayer(target) => {
                if self.outcome.is_running() {
                    self.player = self
                        .config
                        .field
                        .clamp_inside(target, self.config.player_radius);
                }
            }
            Command::TogglePause => self.outcome.toggle_pause(),
            Command::Reset => self.reset(),
            Command::SendFleet { .. } | Command::PlaceTower { .. } => {
                log::debug!("Shooter ignores {:?}", command);
            }
        }
    }

    /// One motion/collision tick
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

        // Spawn
        if self.waves.is_idle() && self.enemies.is_empty() {
            let orders = self.waves.begin(&mut self.rng);
            self.events.push(GameEvent::WaveStarted {
                wave: self.waves.wave(),
            });
            for order in &orders {
                self.spawn(order);
            }
        }

        // Enemy motion
        let player = self.player;
        for enemy in self.enemies.iter_mut() {
            let gap = distance(enemy.pos, player);
            let step = (enemy.speed * dt).min(gap);
            enemy.pos += direction(enemy.pos, player) * step;
        }

        // Bullets
        let sweep = Sweep {
            hit_radius: self.config.enemy_radius + self.config.bullet_radius,
            field: self.config.field,
            margin: self.config.bullet_margin,
        };
        resolve_projectiles(&mut self.bullets, &mut self.enemies, dt, &sweep);

        // Contact damage
        let reach = self.config.player_radius + self.config.enemy_radius;
        let cooldown = self.config.contact_cooldown;
        let now = self.time;
        for enemy in self.enemies.iter_mut() {
            if self.lives <= 0 {
                break;
            }
            if !enemy.is_alive() || distance_sq(enemy.pos, player) >= reach * reach {
                continue;
            }
            if enemy.last_contact.is_some_and(|t| now - t < cooldown) {
                continue;
            }
            enemy.last_contact = Some(now);
            self.lives -= 1;
            self.events.push(GameEvent::PlayerDamaged { lives: self.lives });
            log::debug!("Contact with enemy {}, lives {}", enemy.id, self.lives);
        }

        // Rewards
        for enemy in reap_dead(&mut self.enemies) {
            self.score += u64::from(enemy.reward);
            self.events.push(GameEvent::EnemyDefeated {
                id: enemy.id,
                reward: enemy.reward,
            });
        }

        if self.waves.observe(self.enemies.len()) {
            self.events.push(GameEvent::WaveCleared {
                wave: self.waves.wave(),
            });
        }

        // Outcome
        let won = self
            .config
            .target_waves
            .is_some_and(|target| self.waves.cleared() >= target);
        if let Some(outcome) = self.outcome.settle(lives_verdict(self.lives, won)) {
            self.events.push(GameEvent::GameOver { outcome });
            self.notice = Some(Notice::sticky(match outcome {
                Outcome::Win => "Victory!",
                Outcome::Lose => "Game Over",
            }));
        }
    }

    /// Fire-clock firing: timed spawns, then auto-fire at the nearest enemy
    pub fn pulse(&mut self) {
        if !self.outcome.is_running() {
            return;
        }

        if let Some(order) = self.waves.pulse(&mut self.rng) {
            self.spawn(&order);
        }

        let origin = self.player;
        let Some(target) = nearest(origin, self.enemies.iter(), None).map(|e| e.pos) else {
            return;
        };
        let speed = self.config.bullet_speed;
        let damage = self.config.bullet_damage;
        let id = self
            .bullets
            .add(|id| Projectile::aimed(id, origin, target, speed, damage, None));
        self.events.push(GameEvent::ProjectileFired { id });
    }

    pub fn snapshot(&self) -> Snapshot {
        let hud = Hud {
            wave: self.waves.wave(),
            score: self.score,
            currency: 0,
            lives: self.lives,
        };
        let mut snapshot = Snapshot::new(self.outcome.phase(), hud);
        snapshot.player = Some(PlayerView {
            pos: self.player,
            radius: self.config.player_radius,
        });
        snapshot.entities = self
            .enemies
            .iter()
            .map(|e| EntityView {
                id: e.id,
                pos: e.pos,
                kind: e.kind.name(),
                health_ratio: ratio(e.health, e.max_health),
                owner: None,
                units: None,
            })
            .collect();
        snapshot.projectiles = self
            .bullets
            .iter()
            .map(|b| ProjectileView { id: b.id, pos: b.pos })
            .collect();
        snapshot.message = self.notice.as_ref().map(|n| n.text.clone());
        snapshot
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn spawn(&mut self, order: &SpawnOrder<EnemyKind>) {
        let field = self.config.field;
        let margin = if order.bonus {
            self.config.bonus_spawn_margin
        } else {
            self.config.spawn_margin
        };
        let ring = field.width.max(field.height) / 2.0 + margin;
        let angle = self.rng.random::<f32>() * std::f32::consts::TAU;
        let pos = field.center() + Vec2::from_angle(angle) * ring;
        let id = self.enemies.add(|id| Enemy::from_order(id, order, pos));
        log::debug!("Spawned {:?} {} at {:?}", order.kind, id, pos);
    }

    fn after_game_over(&mut self, dt: f32) {
        match self.outcome.countdown(dt) {
            Some(AfterGameOver::Reset) => self.reset(),
            Some(AfterGameOver::Exit) => {
                self.exit_requested = true;
                self.events.push(GameEvent::ExitRequested);
            }
            Some(AfterGameOver::Hold) | None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    const DT: f32 = 0.04;

    fn shooter() -> Shooter {
        Shooter::new(ShooterConfig::default(), 42)
    }

    fn place_enemy(game: &mut Shooter, pos: Vec2, health: f32) -> EntityId {
        game.enemies.add(|id| Enemy {
            id,
            kind: EnemyKind::Normal,
            pos,
            speed: 0.0,
            health,
            max_health: health,
            reward: 1,
            last_contact: None,
        })
    }

    #[test]
    fn test_first_step_spawns_burst_off_screen() {
        let mut game = shooter();
        game.step(&[], DT);
        assert_eq!(game.wave(), 1);
        assert_eq!(game.enemies().len(), 3);
        let field = game.config().field;
        for enemy in game.enemies().iter() {
            assert!(!field.contains_expanded(enemy.pos, 0.0), "{:?}", enemy.pos);
        }
        assert!(game.drain_events().contains(&GameEvent::WaveStarted { wave: 1 }));
    }

    #[test]
    fn test_single_shot_kills_weak_enemy() {
        let mut game = shooter();
        let target = game.player() + Vec2::new(100.0, 0.0);
        let enemy = place_enemy(&mut game, target, 1.0);

        game.pulse();
        assert_eq!(game.bullets().len(), 1);

        // 100px gap minus 25px hit radius at 200px/s
        for _ in 0..10 {
            game.step(&[], DT);
        }
        assert!(!game.enemies().contains(enemy));
        assert_eq!(game.score(), 1);
        assert!(game.bullets().is_empty());
        assert!(
            game.drain_events()
                .contains(&GameEvent::EnemyDefeated { id: enemy, reward: 1 })
        );
    }

    #[test]
    fn test_contact_on_last_life_ends_game_same_tick() {
        let mut game = shooter();
        game.lives = 1;
        let player = game.player();
        place_enemy(&mut game, player + Vec2::new(10.0, 0.0), 1.0);

        game.step(&[], DT);
        assert_eq!(game.lives(), 0);
        assert_eq!(game.phase(), GamePhase::GameOver(Outcome::Lose));
        assert_eq!(game.snapshot().message.as_deref(), Some("Game Over"));

        // Frozen
        let before = game.snapshot();
        game.pulse();
        game.step(&[Command::MovePlayer(Vec2::new(10.0, 10.0))], DT);
        assert_eq!(game.snapshot().entities, before.entities);
        assert_eq!(game.player(), player);
    }

    #[test]
    fn test_contact_cooldown_per_enemy() {
        let mut game = shooter();
        let player = game.player();
        place_enemy(&mut game, player, 50.0);

        game.step(&[], DT);
        assert_eq!(game.lives(), 2);
        // Still touching inside the window
        for _ in 0..10 {
            game.step(&[], DT);
        }
        assert_eq!(game.lives(), 2);
        // Past 0.8s after the first hit
        for _ in 0..12 {
            game.step(&[], DT);
        }
        assert_eq!(game.lives(), 1);
    }

    #[test]
    fn test_enemies_home_in_without_overshoot() {
        let mut game = shooter();
        let player = game.player();
        let id = place_enemy(&mut game, player + Vec2::new(0.0, 300.0), 5.0);
        if let Some(enemy) = game.enemies.get_mut(id) {
            enemy.speed = 100.0;
        }

        game.step(&[], 0.5);
        let pos = game.enemies().get(id).map(|e| e.pos);
        assert_eq!(pos, Some(player + Vec2::new(0.0, 250.0)));

        game.step(&[], 10.0);
        let pos = game.enemies().get(id).map(|e| e.pos);
        assert_eq!(pos, Some(player));
    }

    #[test]
    fn test_move_is_clamped() {
        let mut game = shooter();
        game.step(&[Command::MovePlayer(Vec2::new(-50.0, 10_000.0))], DT);
        let field = game.config().field;
        let r = game.config().player_radius;
        assert_eq!(game.player(), Vec2::new(r, field.height - r));
    }

    #[test]
    fn test_pause_freezes_both_clocks() {
        let mut game = shooter();
        game.step(&[], DT);
        game.step(&[Command::TogglePause], DT);
        assert_eq!(game.phase(), GamePhase::Paused);

        let before = game.snapshot();
        game.pulse();
        game.step(&[], 1.0);
        assert_eq!(game.snapshot(), before);

        game.step(&[Command::TogglePause], DT);
        assert_eq!(game.phase(), GamePhase::Running);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut game = shooter();
        for _ in 0..5 {
            game.step(&[], DT);
            game.pulse();
        }
        let old_ids: Vec<_> = game.enemies().iter().map(|e| e.id).collect();
        game.apply(Command::Reset);

        assert_eq!(game.wave(), 0);
        assert_eq!(game.lives(), 3);
        assert_eq!(game.score(), 0);
        assert!(game.enemies().is_empty());
        assert!(game.bullets().is_empty());

        game.step(&[], DT);
        for enemy in game.enemies().iter() {
            assert!(!old_ids.contains(&enemy.id), "ids are never reused");
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = shooter();
        let mut b = shooter();
        for i in 0..200 {
            let cmd = [Command::MovePlayer(Vec2::new(100.0 + i as f32, 300.0))];
            a.step(&cmd, DT);
            b.step(&cmd, DT);
            if i % 7 == 0 {
                a.pulse();
                b.pulse();
            }
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_target_waves_win() {
        let mut config = ShooterConfig::default();
        config.target_waves = Some(1);
        let mut game = Shooter::new(config, 9);

        game.step(&[], DT);
        for enemy in game.enemies.iter_mut() {
            enemy.health = 0.0;
        }
        game.step(&[], DT);
        assert_eq!(game.phase(), GamePhase::GameOver(Outcome::Win));
    }

    proptest! {
        #[test]
        fn prop_enemy_health_positive_and_never_rises(
            ops in proptest::collection::vec((0u8..5, 0.0f32..400.0, 0.0f32..850.0), 1..300),
        ) {
            let mut game = shooter();
            let mut seen: HashMap<EntityId, f32> = HashMap::new();
            for (op, x, y) in ops {
                let commands = match op {
                    0 => vec![Command::MovePlayer(Vec2::new(x, y))],
                    1 => Vec::new(),
                    2 => {
                        game.pulse();
                        continue;
                    }
                    3 => {
                        game.pulse();
                        game.pulse();
                        continue;
                    }
                    _ => vec![Command::TogglePause],
                };
                game.step(&commands, DT);
                for enemy in game.enemies().iter() {
                    prop_assert!(enemy.health > 0.0, "enemy {} at {}", enemy.id, enemy.health);
                    if let Some(&before) = seen.get(&enemy.id) {
                        prop_assert!(enemy.health <= before);
                    }
                }
                seen = game.enemies().iter().map(|e| (e.id, e.health)).collect();
            }
        }
    }
}
