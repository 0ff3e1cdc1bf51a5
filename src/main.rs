//! Curling Sim entry point
//!
//! Headless demo: plays an autoplay match at a fixed frame rate, logs the
//! match as it unfolds and prints the final snapshot as JSON.
//!
//! Usage: `curling-sim [settings.json] [seed]`

mod demo {
    use curling_sim::MatchSettings;
    use curling_sim::sim::{GameEvent, GameState, TickInput, tick};

    /// Rendered frame length the demo pretends to run at
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up after an hour of simulated play
    pub const MAX_FRAMES: u64 = 60 * 60 * 60;

    /// Demo instance holding the simulation and its input
    pub struct Demo {
        pub state: GameState,
        input: TickInput,
        pub frames: u64,
    }

    impl Demo {
        pub fn new(seed: u64, settings: MatchSettings) -> Self {
            Self {
                state: GameState::new(seed, settings),
                input: TickInput {
                    new_match: true,
                    autoplay: true,
                    ..Default::default()
                },
                frames: 0,
            }
        }

        /// Run one frame and report what happened
        pub fn update(&mut self) {
            tick(&mut self.state, &self.input, FRAME_DT);
            self.frames += 1;

            // Clear one-shot inputs after processing
            self.input.new_match = false;

            for event in self.state.drain_events() {
                match event {
                    GameEvent::ShotStarted { end, shot, side, .. } => {
                        log::info!("End {} shot {}: {} to throw", end, shot + 1, side.label());
                    }
                    GameEvent::StoneRemoved { id, reason } => {
                        log::info!("Stone {} out of play ({:?})", id, reason);
                    }
                    GameEvent::WallHit { id, wall } => log::debug!("Stone {} hit the {:?} board", id, wall),
                    _ => {}
                }
            }
        }

        pub fn finished(&self) -> bool {
            self.state.result.is_some()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use curling_sim::MatchSettings;
    use demo::{Demo, MAX_FRAMES};

    env_logger::init();
    log::info!("Curling Sim (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match MatchSettings::load(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Could not load settings from {}: {}", path, e);
                return std::process::ExitCode::FAILURE;
            }
        },
        None => MatchSettings::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    });
    log::info!("Seed: {}", seed);

    let mut demo = Demo::new(seed, settings);
    while !demo.finished() && demo.frames < MAX_FRAMES {
        demo.update();
    }

    match &demo.state.result {
        Some(result) => log::info!(
            "{} after {:.1}s simulated",
            result.summary(&demo.state.settings),
            demo.state.clock
        ),
        None => log::warn!("Match did not finish within {} frames", MAX_FRAMES),
    }

    match serde_json::to_string_pretty(&demo.state.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Snapshot serialization failed: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    }
    std::process::ExitCode::SUCCESS
}

#[cfg(target_arch = "wasm32")]
fn main() {
    use curling_sim::MatchSettings;
    use demo::{Demo, MAX_FRAMES};

    console_error_panic_hook::set_once();
    // Only fails if a logger is already installed
    let _ = console_log::init_with_level(log::Level::Info);

    let mut demo = Demo::new(rand::random(), MatchSettings::default());
    while !demo.finished() && demo.frames < MAX_FRAMES {
        demo.update();
    }
    if let Some(result) = &demo.state.result {
        log::info!("{}", result.summary(&demo.state.settings));
    }
}
