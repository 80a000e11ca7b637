//! Read-only per-tick view handed to the presentation layer

use glam::Vec2;
use serde::Serialize;

use super::input::DragMapper;
use super::outcome::GamePhase;
use super::registry::EntityId;
use super::territory::{Node, Owner};

/// Player avatar (shooter only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub radius: f32,
}

/// Any visible non-projectile entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub pos: Vec2,
    pub kind: &'static str,
    /// Health over max health, clamped to 0..=1
    pub health_ratio: f32,
    /// Territory nodes and fleets only
    pub owner: Option<Owner>,
    /// Whole units garrisoned or carried (territory only)
    pub units: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub pos: Vec2,
}

/// Tower slot (tower defense only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotView {
    pub pos: Vec2,
    pub occupied: bool,
}

/// Counters for the heads-up display
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Hud {
    pub wave: u32,
    pub score: u64,
    pub currency: u32,
    pub lives: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub player: Option<PlayerView>,
    pub entities: Vec<EntityView>,
    pub projectiles: Vec<ProjectileView>,
    pub slots: Vec<SlotView>,
    /// Visual-only drag line (territory), source to pointer
    pub drag_line: Option<(Vec2, Vec2)>,
    pub hud: Hud,
    pub message: Option<String>,
}

impl Snapshot {
    pub fn new(phase: GamePhase, hud: Hud) -> Self {
        Self {
            phase,
            player: None,
            entities: Vec::new(),
            projectiles: Vec::new(),
            slots: Vec::new(),
            drag_line: None,
            hud,
            message: None,
        }
    }

    /// Overlay the host's in-progress drag, if a source node is armed
    pub fn with_drag_line(mut self, drag: &DragMapper, nodes: &[Node]) -> Self {
        self.drag_line = drag.drag_line(nodes);
        self
    }
}

/// `current / max` clamped to 0..=1, zero when `max` is not positive
#[inline]
pub fn ratio(current: f32, max: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    (current / max).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::input::PointerEvent;
    use crate::sim::registry::Registry;

    #[test]
    fn test_ratio_clamps() {
        assert_eq!(ratio(5.0, 10.0), 0.5);
        assert_eq!(ratio(-1.0, 10.0), 0.0);
        assert_eq!(ratio(12.0, 10.0), 1.0);
        assert_eq!(ratio(3.0, 0.0), 0.0);
    }

    #[test]
    fn test_drag_line_overlay() {
        let mut nodes = Registry::new();
        nodes.add(|id| Node::new(id, Vec2::new(100.0, 100.0), Owner::Player, 20.0));
        nodes.add(|id| Node::new(id, Vec2::new(300.0, 100.0), Owner::Rival, 10.0));
        let hud = Hud::default();
        let mut drag = DragMapper::new(34.0);

        let idle = Snapshot::new(GamePhase::Running, hud).with_drag_line(&drag, nodes.all());
        assert_eq!(idle.drag_line, None);

        drag.map(PointerEvent::start(100.0, 100.0), nodes.all());
        drag.map(PointerEvent::moved(180.0, 120.0), nodes.all());
        let armed = Snapshot::new(GamePhase::Running, hud).with_drag_line(&drag, nodes.all());
        assert_eq!(
            armed.drag_line,
            Some((Vec2::new(100.0, 100.0), Vec2::new(180.0, 120.0)))
        );

        drag.map(PointerEvent::end(300.0, 100.0), nodes.all());
        let released = Snapshot::new(GamePhase::Running, hud).with_drag_line(&drag, nodes.all());
        assert_eq!(released.drag_line, None);
    }
}
