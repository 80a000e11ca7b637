//! Projectiles, targeting and damage shared by the shooter and tower defense

use glam::Vec2;

use super::registry::{Entity, EntityId, Registry};
use crate::geom::{Playfield, direction, distance_sq};

/// Anything projectiles can hit
pub trait Combatant: Entity {
    fn pos(&self) -> Vec2;
    fn health(&self) -> f32;
    fn take_damage(&mut self, amount: f32);

    fn is_alive(&self) -> bool {
        self.health() > 0.0
    }
}

/// A straight-flying projectile
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Locked target; hits are only tested against it while it lives
    pub target: Option<EntityId>,
}

impl Entity for Projectile {
    fn id(&self) -> EntityId {
        self.id
    }
}

impl Projectile {
    /// Aim from `origin` at `aim_at`; coincident points give a zero velocity
    pub fn aimed(
        id: EntityId,
        origin: Vec2,
        aim_at: Vec2,
        speed: f32,
        damage: f32,
        target: Option<EntityId>,
    ) -> Self {
        Self {
            id,
            pos: origin,
            vel: direction(origin, aim_at) * speed,
            damage,
            target,
        }
    }
}

/// Nearest living candidate, optionally within `range`
///
/// Ties keep the earliest candidate in iteration order.
pub fn nearest<'a, T: Combatant + 'a>(
    origin: Vec2,
    candidates: impl IntoIterator<Item = &'a T>,
    range: Option<f32>,
) -> Option<&'a T> {
    let limit = range.map_or(f32::INFINITY, |r| r * r);
    let mut best: Option<(&T, f32)> = None;
    for candidate in candidates {
        if !candidate.is_alive() {
            continue;
        }
        let d2 = distance_sq(origin, candidate.pos());
        if d2 > limit {
            continue;
        }
        if best.is_none_or(|(_, best_d2)| d2 < best_d2) {
            best = Some((candidate, d2));
        }
    }
    best.map(|(candidate, _)| candidate)
}

/// What happened to projectiles during one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Removed after hitting a target
    pub hits: usize,
    /// Removed after leaving the expanded playfield
    pub expired: usize,
}

/// Projectile sweep parameters
#[derive(Debug, Clone, Copy)]
pub struct Sweep {
    /// Center distance below which a projectile hits
    pub hit_radius: f32,
    pub field: Playfield,
    /// How far past the playfield edge projectiles may travel
    pub margin: f32,
}

/// Move projectiles, apply hits, discard strays
///
/// Each projectile hits at most one target per tick. A projectile is removed
/// either because it hit or because it left the bounds, never both. Dead
/// targets are left in place for the caller to reap.
pub fn resolve_projectiles<T: Combatant>(
    projectiles: &mut Registry<Projectile>,
    targets: &mut Registry<T>,
    dt: f32,
    sweep: &Sweep,
) -> Resolution {
    let hit_r2 = sweep.hit_radius * sweep.hit_radius;
    let mut spent = Vec::new();
    let mut resolution = Resolution::default();

    for projectile in projectiles.iter_mut() {
        projectile.pos += projectile.vel * dt;
        let pos = projectile.pos;
        let touches = |t: &T| t.is_alive() && distance_sq(pos, t.pos()) < hit_r2;

        let locked = projectile
            .target
            .and_then(|id| targets.get(id))
            .filter(|t| t.is_alive());
        let hit = match locked {
            Some(target) => touches(target).then(|| target.id()),
            None => targets.iter().find(|t| touches(*t)).map(|t| t.id()),
        };

        if let Some(target) = hit.and_then(|id| targets.get_mut(id)) {
            target.take_damage(projectile.damage);
            spent.push(projectile.id);
            resolution.hits += 1;
        } else if !sweep.field.contains_expanded(pos, sweep.margin) {
            spent.push(projectile.id);
            resolution.expired += 1;
        }
    }

    projectiles.remove_all(&spent);
    resolution
}

/// Remove every dead target, returning them for reward bookkeeping
pub fn reap_dead<T: Combatant>(targets: &mut Registry<T>) -> Vec<T> {
    targets.extract(|t| !t.is_alive())
}
