//! Pointer input to simulation commands
//!
//! Mappers are small state machines fed raw pointer events. They never touch
//! game state directly; they only produce [`Command`]s for the runner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::defense::Slot;
use super::registry::EntityId;
use super::territory::{Node, Owner};
use crate::geom::{Playfield, distance_sq};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerPhase {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub pos: Vec2,
}

impl PointerEvent {
    pub fn start(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Start,
            pos: Vec2::new(x, y),
        }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::Move,
            pos: Vec2::new(x, y),
        }
    }

    pub fn end(x: f32, y: f32) -> Self {
        Self {
            phase: PointerPhase::End,
            pos: Vec2::new(x, y),
        }
    }
}

/// Discrete intent consumed by a simulation
///
/// Variants ignore commands that do not apply to them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Put the player avatar at this (already clamped) position
    MovePlayer(Vec2),
    /// Send the configured share of `from`'s units toward `to`
    SendFleet { from: EntityId, to: EntityId },
    /// Build a tower on a predefined slot
    PlaceTower { slot: usize },
    TogglePause,
    /// Reinitialize from configuration defaults
    Reset,
}

/// Direct-follow: the avatar tracks the pointer, kept inside the playfield
#[derive(Debug, Clone, Copy)]
pub struct FollowMapper {
    pub field: Playfield,
    pub radius: f32,
}

impl FollowMapper {
    pub fn new(field: Playfield, radius: f32) -> Self {
        Self { field, radius }
    }

    pub fn map(&self, event: PointerEvent) -> Option<Command> {
        match event.phase {
            PointerPhase::Move => Some(Command::MovePlayer(
                self.field.clamp_inside(event.pos, self.radius),
            )),
            PointerPhase::Start | PointerPhase::End => None,
        }
    }
}

/// Drag-and-release fleet sending
#[derive(Debug, Clone, Default)]
pub struct DragMapper {
    touch_radius: f32,
    source: Option<EntityId>,
    /// Last pointer position, visual only until release
    cursor: Vec2,
}

impl DragMapper {
    pub fn new(touch_radius: f32) -> Self {
        Self {
            touch_radius,
            source: None,
            cursor: Vec2::ZERO,
        }
    }

    /// Node currently armed as the send source
    pub fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// First node whose touch radius contains `pos`
    pub fn node_at<'a>(&self, nodes: &'a [Node], pos: Vec2) -> Option<&'a Node> {
        let r2 = self.touch_radius * self.touch_radius;
        nodes.iter().find(|n| distance_sq(n.pos, pos) <= r2)
    }

    pub fn map(&mut self, event: PointerEvent, nodes: &[Node]) -> Option<Command> {
        match event.phase {
            PointerPhase::Start => {
                self.source = self
                    .node_at(nodes, event.pos)
                    .filter(|n| n.owner == Owner::Player)
                    .map(|n| n.id);
                self.cursor = event.pos;
                None
            }
            PointerPhase::Move => {
                self.cursor = event.pos;
                None
            }
            PointerPhase::End => {
                self.cursor = event.pos;
                let from = self.source.take()?;
                let target = self.node_at(nodes, event.pos)?;
                if target.id == from {
                    return None;
                }
                Some(Command::SendFleet {
                    from,
                    to: target.id,
                })
            }
        }
    }

    /// Line from the armed source to the pointer, for rendering only
    pub fn drag_line(&self, nodes: &[Node]) -> Option<(Vec2, Vec2)> {
        let source = self.source?;
        let node = nodes.iter().find(|n| n.id == source)?;
        Some((node.pos, self.cursor))
    }
}

/// Tap-to-place on square tower slots
#[derive(Debug, Clone, Copy)]
pub struct TapMapper {
    /// Half the side of a slot's square touch area
    pub half_extent: f32,
}

impl TapMapper {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }

    /// Taps fire on release
    pub fn map(&self, event: PointerEvent, slots: &[Slot]) -> Option<Command> {
        if event.phase != PointerPhase::End {
            return None;
        }
        slots
            .iter()
            .position(|s| {
                let d = (s.pos - event.pos).abs();
                d.x <= self.half_extent && d.y <= self.half_extent
            })
            .map(|slot| Command::PlaceTower { slot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::Registry;

    fn nodes() -> (Registry<Node>, EntityId, EntityId, EntityId) {
        let mut reg = Registry::new();
        let mine = reg.add(|id| Node::new(id, Vec2::new(100.0, 100.0), Owner::Player, 20.0));
        let theirs = reg.add(|id| Node::new(id, Vec2::new(300.0, 100.0), Owner::Rival, 10.0));
        let neutral = reg.add(|id| Node::new(id, Vec2::new(200.0, 300.0), Owner::Neutral, 10.0));
        (reg, mine, theirs, neutral)
    }

    #[test]
    fn test_follow_clamps() {
        let mapper = FollowMapper::new(Playfield::new(390.0, 844.0), 26.0);
        assert_eq!(
            mapper.map(PointerEvent::moved(5.0, 900.0)),
            Some(Command::MovePlayer(Vec2::new(26.0, 818.0)))
        );
        assert_eq!(mapper.map(PointerEvent::start(100.0, 100.0)), None);
    }

    #[test]
    fn test_drag_release_on_target() {
        let (reg, mine, theirs, _) = nodes();
        let mut drag = DragMapper::new(34.0);

        assert_eq!(drag.map(PointerEvent::start(105.0, 95.0), reg.all()), None);
        assert_eq!(drag.source(), Some(mine));
        drag.map(PointerEvent::moved(200.0, 100.0), reg.all());
        assert_eq!(
            drag.drag_line(reg.all()),
            Some((Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0)))
        );
        drag.map(PointerEvent::moved(290.0, 110.0), reg.all());

        let cmd = drag.map(PointerEvent::end(290.0, 110.0), reg.all());
        assert_eq!(cmd, Some(Command::SendFleet { from: mine, to: theirs }));
        assert_eq!(drag.source(), None);
    }

    #[test]
    fn test_drag_release_without_move() {
        let (reg, mine, _, neutral) = nodes();
        let mut drag = DragMapper::new(34.0);

        drag.map(PointerEvent::start(100.0, 100.0), reg.all());
        // Released straight over the neutral node, no move events in between
        let cmd = drag.map(PointerEvent::end(205.0, 295.0), reg.all());
        assert_eq!(cmd, Some(Command::SendFleet { from: mine, to: neutral }));
    }

    #[test]
    fn test_drag_from_foreign_node_is_ignored() {
        let (reg, _, _, neutral) = nodes();
        let mut drag = DragMapper::new(34.0);
        drag.map(PointerEvent::start(300.0, 100.0), reg.all());
        assert_eq!(drag.source(), None);
        drag.map(PointerEvent::moved(200.0, 300.0), reg.all());
        assert_eq!(drag.map(PointerEvent::end(200.0, 300.0), reg.all()), None);
        assert!(reg.contains(neutral));
    }

    #[test]
    fn test_release_on_empty_space_or_source() {
        let (reg, _, _, _) = nodes();
        let mut drag = DragMapper::new(34.0);

        drag.map(PointerEvent::start(100.0, 100.0), reg.all());
        drag.map(PointerEvent::moved(20.0, 700.0), reg.all());
        assert_eq!(drag.map(PointerEvent::end(20.0, 700.0), reg.all()), None);

        // Press and release on the source without moving
        drag.map(PointerEvent::start(100.0, 100.0), reg.all());
        assert_eq!(drag.map(PointerEvent::end(100.0, 100.0), reg.all()), None);
    }

    #[test]
    fn test_tap_hits_slot_square() {
        let slots = [
            Slot::new(Vec2::new(50.0, 50.0)),
            Slot::new(Vec2::new(150.0, 50.0)),
        ];
        let tap = TapMapper::new(20.0);
        assert_eq!(
            tap.map(PointerEvent::end(165.0, 35.0), &slots),
            Some(Command::PlaceTower { slot: 1 })
        );
        assert_eq!(tap.map(PointerEvent::start(50.0, 50.0), &slots), None);
        assert_eq!(tap.map(PointerEvent::end(100.0, 50.0), &slots), None);
    }
}
