//! Perfect Fit entry point
//!
//! Native builds run a headless, seeded autoplay session and log the
//! outcome. The browser build is driven through the `wasm` module of the
//! library instead.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::Path;

    use perfect_fit::consts::FRAME_MS;
    use perfect_fit::platform::{FileStore, KeyValueStore, ManualClock, MemoryStore};
    use perfect_fit::sim::{GameEvent, RotateDir, SimulationState};
    use perfect_fit::{Engine, Tuning};

    /// Give up on sessions that somehow never end
    const MAX_FRAMES: u32 = 60 * 60 * 30;
    /// Frames between autoplay moves
    const MOVE_COOLDOWN: u32 = 6;

    /// Pick a move: rotate toward the gap centre, narrowest footprint first
    fn autoplay(state: &SimulationState) -> Option<RotateDir> {
        if state.shape.passed {
            return None;
        }
        let size = state.shape.size();
        let center = state.shape.pos.x + size.width / 2.0;
        let gap_center = state.gap.x + state.difficulty.gap_width / 2.0;
        let off = gap_center - center;
        let fits = state.shape.pos.x >= state.gap.x
            && state.shape.pos.x + size.width <= state.gap.x + state.difficulty.gap_width;

        if size.width > state.difficulty.gap_width || (!fits && off.abs() > 4.0) {
            Some(if off >= 0.0 { RotateDir::Right } else { RotateDir::Left })
        } else {
            None
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let mut args = std::env::args().skip(1);
        let seed = match args.next() {
            Some(s) => s.parse::<u64>()?,
            None => 7,
        };
        let tuning = match args.next() {
            Some(path) => Tuning::load(Path::new(&path))?,
            None => Tuning::default(),
        };
        let store: Box<dyn KeyValueStore> = match std::env::var("PERFECT_FIT_STORE") {
            Ok(path) => Box::new(FileStore::new(path)),
            Err(_) => Box::new(MemoryStore::new()),
        };

        let clock = ManualClock::new(0.0);
        let mut engine = Engine::new(seed, tuning, Box::new(clock.clone()), store);

        #[cfg(feature = "remote")]
        if let (Ok(url), Ok(token)) = (std::env::var("PERFECT_FIT_API"), std::env::var("PERFECT_FIT_TOKEN")) {
            use perfect_fit::scoring::{Dispatch, ScoreSync, http::HttpVerifier};
            log::info!("Submitting runs to {}", url);
            let verifier = std::sync::Arc::new(HttpVerifier::new(url));
            engine = engine.with_score_sync(ScoreSync::new(verifier, token, Dispatch::Background));
        }

        log::info!("Perfect Fit (headless) seed {}", seed);
        engine.start();

        let mut frames = 0u32;
        let mut last_move = 0u32;
        let mut passes = 0u32;
        let mut perfects = 0u32;
        while frames < MAX_FRAMES {
            clock.advance(FRAME_MS as f64);
            frames += 1;

            if frames - last_move >= MOVE_COOLDOWN
                && let Some(dir) = autoplay(engine.state())
            {
                engine.rotate(dir);
                last_move = frames;
            }
            let running = engine.frame();

            for event in engine.drain_events() {
                match event {
                    GameEvent::Passed { .. } => passes += 1,
                    GameEvent::Perfect { .. } => perfects += 1,
                    GameEvent::Crashed { pos } => log::info!("Crashed at ({:.1}, {:.1})", pos.x, pos.y),
                    GameEvent::AlienHit { lethal: true, .. } => log::info!("Shot down"),
                    _ => {}
                }
            }
            if !running {
                break;
            }
        }

        // Let background submissions land
        for _ in 0..200 {
            if !engine.score_sync().is_busy() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(25));
            engine.poll_sync();
        }

        let snapshot = engine.snapshot();
        log::info!(
            "Finished after {} frames: {} passes ({} perfect)",
            frames,
            passes,
            perfects
        );
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = headless::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is the library's wasm_bindgen start function
}
