//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `step` and `pulse`
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod clock;
pub mod combat;
pub mod defense;
pub mod events;
pub mod input;
pub mod outcome;
pub mod registry;
pub mod runner;
pub mod shooter;
pub mod snapshot;
pub mod territory;
pub mod wave;

pub use clock::{Firing, Scheduler, TimerHandle};
pub use combat::{Combatant, Projectile};
pub use defense::{Creep, CreepKind, Defense, Slot, Tower};
pub use events::GameEvent;
pub use input::{Command, DragMapper, FollowMapper, PointerEvent, PointerPhase, TapMapper};
pub use outcome::{AfterGameOver, GamePhase, Outcome};
pub use registry::{Entity, EntityId, Registry};
pub use runner::{Runner, Simulation};
pub use shooter::{Enemy, EnemyKind, Shooter};
pub use snapshot::Snapshot;
pub use territory::{Fleet, Node, Owner, Territory};
pub use wave::{Emission, WaveController, WaveState};
