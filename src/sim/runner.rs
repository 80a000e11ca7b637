//! Host-loop driver
//!
//! A [`Runner`] owns one game and two logical clocks: the tick clock drives
//! [`Simulation::step`] and the optional pulse clock drives
//! [`Simulation::pulse`] (auto-fire, timed spawns, rival decisions). Commands
//! submitted between ticks are handed to the next tick as one batch.

use super::clock::{Scheduler, TimerHandle};
use super::defense::Defense;
use super::events::GameEvent;
use super::input::Command;
use super::outcome::GamePhase;
use super::shooter::Shooter;
use super::snapshot::Snapshot;
use super::territory::Territory;

/// A game the runner can drive
pub trait Simulation {
    /// Short identifier, also used as the high score table name
    fn name(&self) -> &'static str;
    /// Tick clock period (seconds)
    fn tick_period(&self) -> f32;
    /// Pulse clock period; `None` when the game has no secondary clock
    fn pulse_period(&self) -> Option<f32>;
    /// Apply a command immediately
    fn apply(&mut self, command: Command);
    /// One tick: apply `commands` in order, then advance by `dt` seconds
    fn step(&mut self, commands: &[Command], dt: f32);
    fn pulse(&mut self);
    fn phase(&self) -> GamePhase;
    fn snapshot(&self) -> Snapshot;
    fn drain_events(&mut self) -> Vec<GameEvent>;
    fn reset(&mut self);
}

impl Simulation for Shooter {
    fn name(&self) -> &'static str {
        "shooter"
    }

    fn tick_period(&self) -> f32 {
        self.config().tick_period
    }

    fn pulse_period(&self) -> Option<f32> {
        Some(self.config().fire_period)
    }

    fn apply(&mut self, command: Command) {
        Shooter::apply(self, command);
    }

    fn step(&mut self, commands: &[Command], dt: f32) {
        Shooter::step(self, commands, dt);
    }

    fn pulse(&mut self) {
        Shooter::pulse(self);
    }

    fn phase(&self) -> GamePhase {
        Shooter::phase(self)
    }

    fn snapshot(&self) -> Snapshot {
        Shooter::snapshot(self)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        Shooter::drain_events(self)
    }

    fn reset(&mut self) {
        Shooter::reset(self);
    }
}

impl Simulation for Defense {
    fn name(&self) -> &'static str {
        "defense"
    }

    fn tick_period(&self) -> f32 {
        self.config().tick_period
    }

    fn pulse_period(&self) -> Option<f32> {
        Some(self.config().spawn_period)
    }

    fn apply(&mut self, command: Command) {
        Defense::apply(self, command);
    }

    fn step(&mut self, commands: &[Command], dt: f32) {
        Defense::step(self, commands, dt);
    }

    fn pulse(&mut self) {
        Defense::pulse(self);
    }

    fn phase(&self) -> GamePhase {
        Defense::phase(self)
    }

    fn snapshot(&self) -> Snapshot {
        Defense::snapshot(self)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        Defense::drain_events(self)
    }

    fn reset(&mut self) {
        Defense::reset(self);
    }
}

impl Simulation for Territory {
    fn name(&self) -> &'static str {
        "territory"
    }

    fn tick_period(&self) -> f32 {
        self.config().tick_period
    }

    fn pulse_period(&self) -> Option<f32> {
        self.rival_period()
    }

    fn apply(&mut self, command: Command) {
        Territory::apply(self, command);
    }

    fn step(&mut self, commands: &[Command], dt: f32) {
        Territory::step(self, commands, dt);
    }

    fn pulse(&mut self) {
        Territory::pulse(self);
    }

    fn phase(&self) -> GamePhase {
        Territory::phase(self)
    }

    fn snapshot(&self) -> Snapshot {
        Territory::snapshot(self)
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        Territory::drain_events(self)
    }

    fn reset(&mut self) {
        Territory::reset(self);
    }
}

/// Binds a [`Simulation`] to its clocks
#[derive(Debug, Clone)]
pub struct Runner<S> {
    sim: S,
    scheduler: Scheduler,
    tick: TimerHandle,
    pulse: Option<TimerHandle>,
    /// Commands waiting for the next tick
    queue: Vec<Command>,
    ticks: u64,
    pulses: u64,
}

impl<S: Simulation> Runner<S> {
    pub fn new(sim: S) -> Self {
        let mut scheduler = Scheduler::new();
        let tick = scheduler.add(sim.tick_period());
        let pulse = sim.pulse_period().map(|period| scheduler.add(period));
        log::info!(
            "Runner for {}: tick {}s, pulse {:?}",
            sim.name(),
            sim.tick_period(),
            sim.pulse_period()
        );
        Self {
            sim,
            scheduler,
            tick,
            pulse,
            queue: Vec::new(),
            ticks: 0,
            pulses: 0,
        }
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sim.snapshot()
    }

    pub fn phase(&self) -> GamePhase {
        self.sim.phase()
    }

    /// Both clocks still live
    pub fn is_running(&self) -> bool {
        !self.scheduler.is_cancelled(self.tick)
    }

    /// Queue a command for the next tick
    pub fn submit(&mut self, command: Command) {
        self.queue.push(command);
    }

    /// Apply a command right away, outside the tick
    pub fn apply_now(&mut self, command: Command) {
        self.sim.apply(command);
    }

    /// Feed elapsed wall time; returns the events raised meanwhile
    pub fn advance(&mut self, elapsed: f64) -> Vec<GameEvent> {
        for firing in self.scheduler.advance(elapsed) {
            if firing.handle == self.tick {
                let commands = std::mem::take(&mut self.queue);
                self.sim.step(&commands, firing.dt);
                self.ticks += 1;
            } else if Some(firing.handle) == self.pulse {
                self.sim.pulse();
                self.pulses += 1;
            }
        }
        self.sim.drain_events()
    }

    /// Cancel both clocks; later `advance` calls do nothing
    pub fn stop(&mut self) {
        self.scheduler.cancel_all();
        self.queue.clear();
        log::info!(
            "Runner for {} stopped after {} ticks",
            self.sim.name(),
            self.ticks
        );
    }

    pub fn into_inner(self) -> S {
        self.sim
    }
}
