//! Brick Rush headless runner
//!
//! Plays the configured levels on autopilot and logs the outcome. Rendering and real input
//! belong to the host shell; this binary exercises the simulation end to end.
//!
//! Usage: `brick-rush [seed] [max_frames] [config.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::process::ExitCode;

    use brick_rush::consts::REFERENCE_FRAME_MS;
    use brick_rush::persistence::MemoryStore;
    use brick_rush::sim::{GameEvent, GamePhase, GameState, TickInput, tick};
    use brick_rush::{GameConfig, Settings};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xB41C_u64);
    let max_frames: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60 * 60 * 10);
    let config = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| brick_rush::SimError::Config(format!("{path}: {e}")))
            .and_then(|json| GameConfig::from_json(&json))
        {
            Ok(config) => config,
            Err(e) => {
                log::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => GameConfig::default(),
    };

    let mut store = MemoryStore::new();
    let settings = Settings::load(&store);
    let mut state = match GameState::new(seed, config, settings) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Could not start: {e}");
            return ExitCode::FAILURE;
        }
    };
    state.load_progress(&store);
    log::info!("Brick Rush (headless) starting with seed {seed:#x}");

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut frames = 0;
    while frames < max_frames {
        tick(&mut state, &input, REFERENCE_FRAME_MS);
        frames += 1;

        for event in state.drain_events() {
            match event {
                GameEvent::LevelLoaded { number } => log::info!("Level {number}"),
                GameEvent::AchievementUnlocked { achievement } => {
                    log::info!("Achievement: {}", achievement.label())
                }
                GameEvent::ComboEffectActivated { combo } => log::info!("{}!", combo.label()),
                _ => {}
            }
        }
        state.flush_progress(&mut store);

        if matches!(state.phase, GamePhase::GameOver | GamePhase::Victory) {
            break;
        }
    }

    println!(
        "{:?} after {} frames: level {:?}, score {}, coins {}, max combo {}",
        state.phase,
        frames,
        state.levels.current_number(),
        state.score.total_score,
        state.score.coins,
        state.score.max_combo
    );
    ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web build is driven by the host shell through the library API
}
