//! Territory capture
//!
//! Nodes produce units continuously according to their owner. Fleets carry
//! units between nodes and either reinforce a friendly node or fight the
//! garrison, flipping ownership when the garrison drops below zero. There are
//! no waves: the rival acts on its own decision clock.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::GameEvent;
use super::input::Command;
use super::outcome::{AfterGameOver, GamePhase, Notice, Outcome, OutcomeTracker, ownership_verdict};
use super::registry::{Entity, EntityId, Registry};
use super::snapshot::{EntityView, Hud, Snapshot, ratio};
use crate::config::{LevelConfig, TerritoryConfig};
use crate::geom::{direction, distance, distance_sq};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Player,
    Rival,
    Neutral,
}

/// A capturable base
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: EntityId,
    pub pos: Vec2,
    pub owner: Owner,
    /// Fractional garrison; production accrues continuously
    pub units: f32,
}

impl Node {
    pub fn new(id: EntityId, pos: Vec2, owner: Owner, units: f32) -> Self {
        Self {
            id,
            pos,
            owner,
            units,
        }
    }
}

impl Entity for Node {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Units in transit
#[derive(Debug, Clone, PartialEq)]
pub struct Fleet {
    pub id: EntityId,
    pub from: EntityId,
    pub to: EntityId,
    pub owner: Owner,
    pub amount: u32,
    pub pos: Vec2,
    /// Target node position at launch
    pub target: Vec2,
    pub speed: f32,
}

impl Entity for Fleet {
    fn id(&self) -> EntityId {
        self.id
    }
}

/// Complete territory state for one level
#[derive(Debug, Clone)]
pub struct Territory {
    config: TerritoryConfig,
    level_index: usize,
    level: LevelConfig,
    time: f32,
    nodes: Registry<Node>,
    fleets: Registry<Fleet>,
    outcome: OutcomeTracker,
    notice: Option<Notice>,
    events: Vec<GameEvent>,
    exit_requested: bool,
}

impl Territory {
    /// Start `level_index` (clamped to the configured levels)
    pub fn new(config: TerritoryConfig, level_index: usize) -> Self {
        let (level_index, level) = config.level(level_index);
        log::info!("Territory level {}: {}", level_index + 1, level.title);
        let mut territory = Self {
            level_index,
            level,
            time: 0.0,
            nodes: Registry::new(),
            fleets: Registry::new(),
            outcome: OutcomeTracker::new(config.after_game_over, config.game_over_delay),
            notice: None,
            events: Vec::new(),
            exit_requested: false,
            config,
        };
        territory.populate();
        territory
    }

    pub fn config(&self) -> &TerritoryConfig {
        &self.config
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn phase(&self) -> GamePhase {
        self.outcome.phase()
    }

    pub fn nodes(&self) -> &Registry<Node> {
        &self.nodes
    }

    pub fn fleets(&self) -> &Registry<Fleet> {
        &self.fleets
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Nodes held by `owner`
    pub fn owned(&self, owner: Owner) -> usize {
        self.nodes.iter().filter(|n| n.owner == owner).count()
    }

    /// Rival decision period, if the rival acts at all on this level
    pub fn rival_period(&self) -> Option<f32> {
        self.level.rival_attacks.then_some(self.level.rival_period)
    }

    fn populate(&mut self) {
        let field = self.config.field;
        let layout = if self.level.layout.is_empty() {
            log::warn!("Level `{}` has no layout, using fallback", self.level.title);
            &self.config.fallback_layout
        } else {
            &self.level.layout
        };
        for spawn in layout {
            let pos = field.at(spawn.x, spawn.y);
            self.nodes
                .add(|id| Node::new(id, pos, spawn.owner, spawn.units));
        }
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.nodes.clear();
        self.fleets.clear();
        self.populate();
        self.outcome.reset();
        self.notice = None;
        self.exit_requested = false;
        self.events.push(GameEvent::Restarted);
        log::info!("Territory level {} reset", self.level_index + 1);
    }

    /// Launch a fleet of `max(1, floor(raw))` units from `from` to `to`
    ///
    /// Refused unless the nodes differ, `owner` holds `from` and the garrison
    /// covers the amount. Units leave the source immediately.
    pub fn send_fleet(
        &mut self,
        owner: Owner,
        from: EntityId,
        to: EntityId,
        raw: f32,
    ) -> Option<EntityId> {
        if !self.outcome.is_running() || from == to {
            return None;
        }
        let target = self.nodes.get(to)?.pos;
        let source = self.nodes.get_mut(from)?;
        if source.owner != owner {
            log::debug!("{:?} cannot send from {} owned by {:?}", owner, from, source.owner);
            return None;
        }
        let amount = raw.floor().max(1.0);
        if source.units < amount {
            return None;
        }
        source.units -= amount;
        let origin = source.pos;
        let amount = amount as u32;
        let speed = self.level.fleet_speed;

        let id = self.fleets.add(|id| Fleet {
            id,
            from,
            to,
            owner,
            amount,
            pos: origin,
            target,
            speed,
        });
        self.events.push(GameEvent::FleetLaunched { id, owner, amount });
        log::debug!("{:?} fleet {} of {} units: {} -> {}", owner, id, amount, from, to);
        Some(id)
    }

    /// Player send: the level's send fraction of the source garrison
    ///
    /// No-op when the fraction rounds down below one unit.
    pub fn player_send(&mut self, from: EntityId, to: EntityId) -> Option<EntityId> {
        let units = self.nodes.get(from)?.units;
        let raw = units * self.level.send_fraction;
        if raw.floor() < 1.0 {
            return None;
        }
        self.send_fleet(Owner::Player, from, to, raw)
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SendFleet { from, to } => {
                self.player_send(from, to);
            }
            Command::TogglePause => self.outcome.toggle_pause(),
            Command::Reset => self.reset(),
            Command::MovePlayer(_) | Command::PlaceTower { .. } => {
                log::debug!("Territory ignores {:?}", command);
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

        // Production
        let cap = self.config.unit_cap;
        for node in self.nodes.iter_mut() {
            let rate = self.level.production(node.owner);
            node.units = (node.units + rate * dt).min(cap);
        }

        // Fleet motion
        let arrive_r2 = self.config.node_radius * self.config.node_radius;
        let mut arrived = Vec::new();
        for fleet in self.fleets.iter_mut() {
            let gap = distance(fleet.pos, fleet.target);
            let step = (fleet.speed * dt).min(gap);
            fleet.pos += direction(fleet.pos, fleet.target) * step;
            if distance_sq(fleet.pos, fleet.target) <= arrive_r2 {
                arrived.push(fleet.id);
            }
        }

        // Arrivals, in launch order
        for fleet in self.fleets.extract(|f| arrived.contains(&f.id)) {
            self.resolve_arrival(&fleet);
        }

        let verdict = ownership_verdict(self.owned(Owner::Player), self.owned(Owner::Rival));
        if let Some(outcome) = self.outcome.settle(verdict) {
            self.events.push(GameEvent::GameOver { outcome });
            self.notice = Some(Notice::sticky(match outcome {
                Outcome::Win => "Victory! Every node captured.",
                Outcome::Lose => "Defeat! Try again.",
            }));
        }
    }

    fn resolve_arrival(&mut self, fleet: &Fleet) {
        let cap = self.config.unit_cap;
        let Some(node) = self.nodes.get_mut(fleet.to) else {
            return;
        };
        let amount = fleet.amount as f32;
        if node.owner == fleet.owner {
            node.units = (node.units + amount).min(cap);
            return;
        }
        node.units -= amount;
        if node.units < 0.0 {
            node.owner = fleet.owner;
            node.units = node.units.abs();
            self.events.push(GameEvent::NodeCaptured {
                id: node.id,
                owner: fleet.owner,
            });
            log::info!("Node {} captured by {:?}", node.id, fleet.owner);
        }
    }

    /// Rival decision: the strongest eligible base attacks the nearest node
    /// it does not own
    pub fn pulse(&mut self) {
        if !self.outcome.is_running() || !self.level.rival_attacks {
            return;
        }

        let mut strongest: Option<&Node> = None;
        for node in self.nodes.iter() {
            if node.owner != Owner::Rival || node.units < self.config.rival_min_units {
                continue;
            }
            if strongest.is_none_or(|best| node.units > best.units) {
                strongest = Some(node);
            }
        }
        let Some(source) = strongest else {
            return;
        };

        let mut nearest: Option<(&Node, f32)> = None;
        for node in self.nodes.iter().filter(|n| n.owner != Owner::Rival) {
            let d2 = distance_sq(source.pos, node.pos);
            if nearest.is_none_or(|(_, best)| d2 < best) {
                nearest = Some((node, d2));
            }
        }
        let Some((target, _)) = nearest else {
            return;
        };

        let (from, to) = (source.id, target.id);
        let raw = source.units * self.config.rival_send_share;
        self.send_fleet(Owner::Rival, from, to, raw);
    }

    pub fn snapshot(&self) -> Snapshot {
        let garrison: f32 = self
            .nodes
            .iter()
            .filter(|n| n.owner == Owner::Player)
            .map(|n| n.units)
            .sum();
        let hud = Hud {
            wave: self.level_index as u32 + 1,
            score: garrison.floor() as u64,
            currency: 0,
            lives: self.owned(Owner::Player) as i32,
        };
        let mut snapshot = Snapshot::new(self.outcome.phase(), hud);
        let cap = self.config.unit_cap;
        let nodes = self.nodes.iter().map(|n| EntityView {
            id: n.id,
            pos: n.pos,
            kind: "node",
            health_ratio: ratio(n.units, cap),
            owner: Some(n.owner),
            units: Some(n.units.floor() as u32),
        });
        let fleets = self.fleets.iter().map(|f| EntityView {
            id: f.id,
            pos: f.pos,
            kind: "fleet",
            health_ratio: 1.0,
            owner: Some(f.owner),
            units: Some(f.amount),
        });
        snapshot.entities = nodes.chain(fleets).collect();
        snapshot.message = self.notice.as_ref().map(|n| n.text.clone());
        snapshot
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn after_game_over(&mut self, dt: f32) {
        match self.outcome.countdown(dt) {
            Some(AfterGameOver::Exit) => {
                self.exit_requested = true;
                self.events.push(GameEvent::ExitRequested);
                log::info!("Territory requests exit");
            }
            Some(AfterGameOver::Reset) => self.reset(),
            Some(AfterGameOver::Hold) | None => {}
        }
    }
}
