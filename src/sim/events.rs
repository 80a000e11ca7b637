//! Gameplay events emitted by the simulation for the host (audio, haptics, UI)

use serde::Serialize;

use super::outcome::Outcome;
use super::registry::EntityId;
use super::territory::Owner;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    WaveStarted { wave: u32 },
    WaveCleared { wave: u32 },
    /// Opposing entity eliminated; `reward` is the score or currency gained
    EnemyDefeated { id: EntityId, reward: u32 },
    /// Path follower reached the goal
    EnemyEscaped { id: EntityId },
    PlayerDamaged { lives: i32 },
    ProjectileFired { id: EntityId },
    TowerPlaced { slot: usize, id: EntityId },
    /// Placement refused; state untouched
    PlacementRejected { slot: usize },
    FleetLaunched { id: EntityId, owner: Owner, amount: u32 },
    NodeCaptured { id: EntityId, owner: Owner },
    GameOver { outcome: Outcome },
    /// State reinitialized from configuration
    Restarted,
    /// Terminal policy asks the host to leave the game screen
    ExitRequested,
}
