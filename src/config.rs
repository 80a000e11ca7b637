//! Per-game tuning
//!
//! Every table has compiled-in defaults and can be overridden from the
//! key-value store. Stored JSON only needs the fields it changes; anything
//! missing or malformed falls back to the defaults below.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geom::Playfield;
use crate::persistence::{self, KeyValueStore};
use crate::sim::defense::CreepKind;
use crate::sim::outcome::AfterGameOver;
use crate::sim::shooter::EnemyKind;
use crate::sim::territory::Owner;
use crate::sim::wave::{BonusRule, Emission, Growth, KindTable, QuotaRule, WaveConfig, WeightTier};

/// Top-down shooter tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub field: Playfield,
    /// Motion clock period (seconds)
    pub tick_period: f32,
    /// Auto-fire clock period (seconds)
    pub fire_period: f32,

    pub player_radius: f32,
    pub enemy_radius: f32,
    pub bullet_radius: f32,
    /// Pixels per second
    pub bullet_speed: f32,
    pub bullet_damage: f32,
    /// How far past the edge bullets live
    pub bullet_margin: f32,

    /// Seconds between two lives taken by the same enemy
    pub contact_cooldown: f32,
    pub lives: i32,

    /// Spawn ring distance beyond half the larger playfield side
    pub spawn_margin: f32,
    pub bonus_spawn_margin: f32,
    pub waves: WaveConfig<EnemyKind>,

    /// Win after clearing this many waves; endless when `None`
    pub target_waves: Option<u32>,
    pub after_game_over: AfterGameOver,
    pub game_over_delay: f32,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        let tick_period = 0.04;
        Self {
            field: Playfield::default(),
            tick_period,
            fire_period: 0.3,
            player_radius: 26.0,
            enemy_radius: 20.0,
            bullet_radius: 5.0,
            // 8px per 40ms frame
            bullet_speed: 8.0 / tick_period,
            bullet_damage: 1.0,
            bullet_margin: 30.0,
            contact_cooldown: 0.8,
            lives: 3,
            spawn_margin: 120.0,
            bonus_spawn_margin: 150.0,
            waves: WaveConfig {
                quota: QuotaRule::Scaled {
                    minimum: 3,
                    multiplier: 3.0,
                },
                emission: Emission::Burst,
                health: Growth::flat(1.0),
                // 1.5px per frame
                speed: Growth::flat(1.5 / tick_period),
                kinds: KindTable::uniform_tier(vec![
                    (EnemyKind::Miniboss, 0.08),
                    (EnemyKind::Boss, 0.02),
                    (EnemyKind::Normal, 0.90),
                ]),
                bonus: Some(BonusRule {
                    every: 10,
                    kind: EnemyKind::Superboss,
                }),
            },
            target_waves: None,
            after_game_over: AfterGameOver::Hold,
            game_over_delay: 1.2,
        }
    }
}

impl ShooterConfig {
    pub const STORAGE_KEY: &'static str = "arcade_sim.shooter";

    pub fn load(store: &dyn KeyValueStore) -> Self {
        persistence::load_or_default(store, Self::STORAGE_KEY)
    }
}

/// Creep path and tower slots in playfield coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseLayout {
    /// Spawn point first, goal last
    pub waypoints: Vec<Vec2>,
    pub slots: Vec<Vec2>,
}

impl DefenseLayout {
    /// Long S-curve with twelve slots, scaled to the playfield
    pub fn standard(field: Playfield) -> Self {
        const PAD: f32 = 18.0;
        let (w, h) = (field.width, field.height);
        let start = Vec2::new(PAD + 32.0, PAD + 72.0);
        let upper = Vec2::new(w * 0.78, start.y + 28.0);
        let bottom = h - PAD - 110.0;

        let waypoints = vec![
            start,
            Vec2::new(w * 0.35, start.y),
            upper,
            Vec2::new(upper.x, h * 0.38),
            Vec2::new(w * 0.58, h * 0.48),
            Vec2::new(w * 0.26, h * 0.54),
            Vec2::new(w * 0.24, h * 0.68),
            Vec2::new(w * 0.76, h * 0.72),
            Vec2::new(w * 0.76, bottom),
            Vec2::new(start.x, bottom),
        ];

        let slots = vec![
            // Early coverage
            Vec2::new(w * 0.18, start.y - 84.0),
            Vec2::new(w * 0.46, start.y - 58.0),
            Vec2::new(w * 0.88, start.y + 60.0),
            // Middle crossfire
            Vec2::new(w * 0.64, h * 0.34),
            Vec2::new(w * 0.40, h * 0.44),
            Vec2::new(w * 0.18, h * 0.46),
            // Lower half
            Vec2::new(w * 0.44, h * 0.64),
            Vec2::new(w * 0.86, h * 0.64),
            // Last line
            Vec2::new(w * 0.18, h * 0.78),
            Vec2::new(w * 0.54, h * 0.80),
            Vec2::new(w * 0.82, h * 0.78),
            Vec2::new(w * 0.14, h * 0.90),
        ];

        Self { waypoints, slots }
    }
}

impl Default for DefenseLayout {
    fn default() -> Self {
        Self::standard(Playfield::default())
    }
}

/// Tower defense tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenseConfig {
    pub field: Playfield,
    pub layout: DefenseLayout,
    pub tick_period: f32,
    /// Seconds between two creeps of a wave
    pub spawn_period: f32,
    pub waves: WaveConfig<CreepKind>,

    pub gold: u32,
    pub lives: i32,

    pub tower_cost: u32,
    pub tower_range: f32,
    /// Seconds between shots of one tower
    pub tower_cooldown: f32,
    pub bullet_speed: f32,
    pub bullet_damage: f32,
    pub hit_radius: f32,
    pub bullet_margin: f32,

    /// Distance at which a creep counts as having reached its waypoint
    pub waypoint_threshold: f32,
    pub path_width: f32,
    /// Extra clearance between a tower slot and the path edge
    pub no_build_margin: f32,
    /// Half the side of a slot's square tap target
    pub slot_half_extent: f32,
    pub notice_duration: f32,

    pub target_waves: Option<u32>,
    pub after_game_over: AfterGameOver,
    pub game_over_delay: f32,
}

impl Default for DefenseConfig {
    fn default() -> Self {
        let field = Playfield::default();
        Self {
            field,
            layout: DefenseLayout::standard(field),
            tick_period: 0.016,
            spawn_period: 1.2,
            waves: WaveConfig {
                quota: QuotaRule::Fixed(10),
                emission: Emission::Timed,
                health: Growth::new(18.0, 1.12),
                speed: Growth::new(58.0, 1.05),
                kinds: KindTable {
                    tiers: vec![
                        WeightTier {
                            below_wave: Some(4),
                            weights: vec![
                                (CreepKind::Basic, 0.75),
                                (CreepKind::Fast, 0.20),
                                (CreepKind::Tank, 0.05),
                            ],
                        },
                        WeightTier {
                            below_wave: Some(8),
                            weights: vec![
                                (CreepKind::Basic, 0.55),
                                (CreepKind::Fast, 0.30),
                                (CreepKind::Tank, 0.15),
                            ],
                        },
                        WeightTier {
                            below_wave: None,
                            weights: vec![
                                (CreepKind::Basic, 0.40),
                                (CreepKind::Fast, 0.35),
                                (CreepKind::Tank, 0.25),
                            ],
                        },
                    ],
                },
                bonus: None,
            },
            gold: 100,
            lives: 10,
            tower_cost: 50,
            tower_range: 112.0,
            tower_cooldown: 0.52,
            bullet_speed: 260.0,
            bullet_damage: 6.0,
            hit_radius: 12.0,
            bullet_margin: 40.0,
            waypoint_threshold: 2.0,
            path_width: 48.0,
            no_build_margin: 12.0,
            slot_half_extent: 20.0,
            notice_duration: 0.8,
            target_waves: None,
            after_game_over: AfterGameOver::Reset,
            game_over_delay: 1.2,
        }
    }
}

impl DefenseConfig {
    pub const STORAGE_KEY: &'static str = "arcade_sim.defense";

    pub fn load(store: &dyn KeyValueStore) -> Self {
        persistence::load_or_default(store, Self::STORAGE_KEY)
    }

    /// Minimum slot distance to the path center line
    pub fn path_clearance(&self) -> f32 {
        self.path_width / 2.0 + self.no_build_margin
    }
}

/// Starting node, position as playfield fractions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSpawn {
    pub x: f32,
    pub y: f32,
    pub owner: Owner,
    pub units: f32,
}

const fn node(x: f32, y: f32, owner: Owner, units: f32) -> NodeSpawn {
    NodeSpawn { x, y, owner, units }
}

/// One territory level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub title: String,
    /// Units per second per node
    pub player_production: f32,
    pub rival_production: f32,
    pub neutral_production: f32,
    /// Share of the source garrison the player sends
    pub send_fraction: f32,
    /// Pixels per second
    pub fleet_speed: f32,
    pub rival_attacks: bool,
    /// Seconds between rival decisions
    pub rival_period: f32,
    pub layout: Vec<NodeSpawn>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::orbit()
    }
}

impl LevelConfig {
    /// Two bases each, passive rival
    pub fn orbit() -> Self {
        Self {
            title: "Orbit".into(),
            player_production: 0.50,
            rival_production: 0.45,
            neutral_production: 0.10,
            send_fraction: 0.60,
            fleet_speed: 260.0,
            rival_attacks: false,
            rival_period: 1.6,
            layout: vec![
                node(0.30, 0.25, Owner::Player, 18.0),
                node(0.35, 0.55, Owner::Player, 16.0),
                node(0.70, 0.25, Owner::Rival, 18.0),
                node(0.75, 0.60, Owner::Rival, 16.0),
                node(0.50, 0.18, Owner::Neutral, 10.0),
                node(0.52, 0.45, Owner::Neutral, 10.0),
                node(0.48, 0.72, Owner::Neutral, 10.0),
            ],
        }
    }

    /// One base against two
    pub fn nebula() -> Self {
        Self {
            title: "Nebula".into(),
            player_production: 0.50,
            rival_production: 0.58,
            neutral_production: 0.12,
            send_fraction: 0.60,
            fleet_speed: 280.0,
            rival_attacks: true,
            rival_period: 1.5,
            layout: vec![
                node(0.22, 0.50, Owner::Player, 18.0),
                node(0.68, 0.30, Owner::Rival, 18.0),
                node(0.78, 0.60, Owner::Rival, 18.0),
                node(0.45, 0.22, Owner::Neutral, 12.0),
                node(0.50, 0.40, Owner::Neutral, 12.0),
                node(0.55, 0.58, Owner::Neutral, 12.0),
                node(0.50, 0.76, Owner::Neutral, 12.0),
            ],
        }
    }

    /// One weak base against three
    pub fn supernova() -> Self {
        Self {
            title: "Supernova".into(),
            player_production: 0.55,
            rival_production: 0.72,
            neutral_production: 0.14,
            send_fraction: 0.65,
            fleet_speed: 320.0,
            rival_attacks: true,
            rival_period: 1.2,
            layout: vec![
                node(0.18, 0.50, Owner::Player, 14.0),
                node(0.72, 0.24, Owner::Rival, 18.0),
                node(0.82, 0.50, Owner::Rival, 20.0),
                node(0.72, 0.76, Owner::Rival, 18.0),
                node(0.40, 0.22, Owner::Neutral, 10.0),
                node(0.48, 0.40, Owner::Neutral, 10.0),
                node(0.52, 0.60, Owner::Neutral, 10.0),
                node(0.60, 0.78, Owner::Neutral, 10.0),
            ],
        }
    }

    pub fn production(&self, owner: Owner) -> f32 {
        match owner {
            Owner::Player => self.player_production,
            Owner::Rival => self.rival_production,
            Owner::Neutral => self.neutral_production,
        }
    }
}

/// Territory tuning shared by every level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerritoryConfig {
    pub field: Playfield,
    pub tick_period: f32,
    /// Fleets arrive within this distance of the target center
    pub node_radius: f32,
    /// Pointer hit radius for drag start and release
    pub touch_radius: f32,
    pub unit_cap: f32,
    /// Rival bases below this garrison never attack
    pub rival_min_units: f32,
    /// Share of the garrison a rival attack sends
    pub rival_send_share: f32,
    pub levels: Vec<LevelConfig>,
    /// Used when a level has no layout
    pub fallback_layout: Vec<NodeSpawn>,
    pub after_game_over: AfterGameOver,
    pub game_over_delay: f32,
}

impl Default for TerritoryConfig {
    fn default() -> Self {
        Self {
            field: Playfield::default(),
            tick_period: 0.04,
            node_radius: 26.0,
            touch_radius: 34.0,
            unit_cap: 999.0,
            rival_min_units: 8.0,
            rival_send_share: 0.5,
            levels: vec![
                LevelConfig::orbit(),
                LevelConfig::nebula(),
                LevelConfig::supernova(),
            ],
            fallback_layout: vec![
                node(0.30, 0.50, Owner::Player, 18.0),
                node(0.70, 0.50, Owner::Rival, 18.0),
                node(0.50, 0.30, Owner::Neutral, 10.0),
                node(0.50, 0.70, Owner::Neutral, 10.0),
            ],
            after_game_over: AfterGameOver::Exit,
            game_over_delay: 1.2,
        }
    }
}

impl TerritoryConfig {
    pub const STORAGE_KEY: &'static str = "arcade_sim.territory";

    pub fn load(store: &dyn KeyValueStore) -> Self {
        persistence::load_or_default(store, Self::STORAGE_KEY)
    }

    /// Level at `index`, clamped to the available levels
    pub fn level(&self, index: usize) -> (usize, LevelConfig) {
        match self.levels.len().checked_sub(1) {
            Some(last) => {
                let index = index.min(last);
                (index, self.levels[index].clone())
            }
            None => (0, LevelConfig::default()),
        }
    }
}
