//! Arcade Sim - headless demo
//!
//! Drives each game through its runner with scripted pointer input at a
//! 60 Hz host frame rate and records the final scores.

use arcade_sim::persistence::{KeyValueStore, MemoryStore};
use arcade_sim::sim::{
    DragMapper, FollowMapper, GameEvent, GamePhase, PointerEvent, Runner, Simulation, TapMapper,
};
use arcade_sim::sim::{Defense, Owner, Shooter, Territory};
use arcade_sim::{DefenseConfig, HighScores, ShooterConfig, TerritoryConfig};
use glam::Vec2;

/// Host frame length (seconds)
const FRAME: f64 = 1.0 / 60.0;

/// Demo length per game (seconds)
const DEMO_SECONDS: f64 = 90.0;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Arcade Sim (headless) starting...");

    let mut store = MemoryStore::new();
    let seed = 0x5EED;

    let shooter = run_shooter(seed);
    finish(&mut store, shooter);

    let defense = run_defense(seed);
    finish(&mut store, defense);

    let territory = run_territory(1);
    finish(&mut store, territory);

    for game in ["shooter", "defense", "territory"] {
        let table = HighScores::load(&store, game);
        log::info!("{}: top score {:?}", game, table.top_score());
    }
}

/// Final stats of one demo run
struct Summary {
    name: &'static str,
    score: u64,
    wave: u32,
    phase: GamePhase,
    seconds: f64,
}

fn finish(store: &mut dyn KeyValueStore, summary: Summary) {
    log::info!(
        "{} finished after {:.1}s: {:?}, score {}, wave {}",
        summary.name,
        summary.seconds,
        summary.phase,
        summary.score,
        summary.wave
    );
    match HighScores::record(store, summary.name, summary.score, summary.wave, summary.seconds) {
        Ok(Some(rank)) => log::info!("{} high score rank #{}", summary.name, rank),
        Ok(None) => {}
        Err(e) => log::warn!("Failed to record high score for {}: {}", summary.name, e),
    }
}

/// Advance one host frame and log what happened
fn frame<S: Simulation>(runner: &mut Runner<S>) -> bool {
    for event in runner.advance(FRAME) {
        match event {
            GameEvent::GameOver { outcome } => log::info!("Game over: {:?}", outcome),
            GameEvent::WaveStarted { wave } => log::info!("Wave {} started", wave),
            GameEvent::ExitRequested => return false,
            other => log::debug!("{:?}", other),
        }
    }
    true
}

fn summarize<S: Simulation>(runner: &Runner<S>, frames: usize) -> Summary {
    let snapshot = runner.snapshot();
    Summary {
        name: runner.sim().name(),
        score: snapshot.hud.score,
        wave: snapshot.hud.wave,
        phase: snapshot.phase,
        seconds: frames as f64 * FRAME,
    }
}

fn run_shooter(seed: u64) -> Summary {
    let config = ShooterConfig::default();
    let mapper = FollowMapper::new(config.field, config.player_radius);
    let center = config.field.center();
    let mut runner = Runner::new(Shooter::new(config, seed));

    let total = (DEMO_SECONDS / FRAME) as usize;
    let mut frames = 0;
    while frames < total {
        // Circle the center, sweeping past the edge so the clamp kicks in
        let angle = frames as f32 * 0.02;
        let pos = center + Vec2::from_angle(angle) * 240.0;
        if let Some(command) = mapper.map(PointerEvent::moved(pos.x, pos.y)) {
            runner.submit(command);
        }
        frames += 1;
        if !frame(&mut runner) || matches!(runner.phase(), GamePhase::GameOver(_)) {
            break;
        }
    }
    runner.stop();
    summarize(&runner, frames)
}

fn run_defense(seed: u64) -> Summary {
    let config = DefenseConfig::default();
    let mapper = TapMapper::new(config.slot_half_extent);
    let mut runner = Runner::new(Defense::new(config, seed));

    let total = (DEMO_SECONDS / FRAME) as usize;
    let mut next_slot = 0;
    let mut frames = 0;
    while frames < total {
        // Tap the next slot whenever the gold covers a tower
        let defense = runner.sim();
        let slots = defense.slots().to_vec();
        let mut tap = None;
        if defense.gold() >= defense.config().tower_cost {
            while let Some(slot) = slots.get(next_slot) {
                next_slot += 1;
                if defense.check_placement(next_slot - 1).is_ok() {
                    tap = Some(slot.pos);
                    break;
                }
            }
        }
        if let Some(pos) = tap {
            if let Some(command) = mapper.map(PointerEvent::end(pos.x, pos.y), &slots) {
                runner.submit(command);
            }
        }
        frames += 1;
        if !frame(&mut runner) || matches!(runner.phase(), GamePhase::GameOver(_)) {
            break;
        }
    }
    log::info!(
        "Defense: {} towers, {} gold left",
        runner.sim().towers().len(),
        runner.sim().gold()
    );
    runner.stop();
    summarize(&runner, frames)
}

fn run_territory(level: usize) -> Summary {
    let config = TerritoryConfig::default();
    let mut drag = DragMapper::new(config.touch_radius);
    let mut runner = Runner::new(Territory::new(config, level));
    log::info!("Territory level: {}", runner.sim().level().title);

    let total = (DEMO_SECONDS / FRAME) as usize;
    let mut frames = 0;
    while frames < total {
        // Every two seconds drag from the strongest player node to the nearest other node
        if frames % 120 == 0 {
            let nodes = runner.sim().nodes().all().to_vec();
            let source = nodes
                .iter()
                .filter(|n| n.owner == Owner::Player)
                .max_by(|a, b| a.units.total_cmp(&b.units));
            if let Some(source) = source {
                let target = nodes
                    .iter()
                    .filter(|n| n.owner != Owner::Player)
                    .min_by(|a, b| {
                        a.pos
                            .distance_squared(source.pos)
                            .total_cmp(&b.pos.distance_squared(source.pos))
                    });
                if let Some(target) = target {
                    drag.map(PointerEvent::start(source.pos.x, source.pos.y), &nodes);
                    let mid = source.pos.lerp(target.pos, 0.5);
                    drag.map(PointerEvent::moved(mid.x, mid.y), &nodes);
                    let view = runner.snapshot().with_drag_line(&drag, &nodes);
                    if let Some((from, to)) = view.drag_line {
                        log::debug!("Drag line {:?} -> {:?}", from, to);
                    }
                    if let Some(command) =
                        drag.map(PointerEvent::end(target.pos.x, target.pos.y), &nodes)
                    {
                        runner.submit(command);
                    }
                }
            }
        }
        frames += 1;
        if !frame(&mut runner) {
            break;
        }
    }
    log::info!(
        "Territory: player {} nodes, rival {} nodes",
        runner.sim().owned(Owner::Player),
        runner.sim().owned(Owner::Rival)
    );
    runner.stop();
    summarize(&runner, frames)
}
