//! Paddle Arena headless runner
//!
//! Plays an AI-vs-AI match to completion and prints the final snapshot.
//!
//! Usage: `paddle-arena [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use paddle_arena::Tuning;
    use paddle_arena::consts::FRAME_SECONDS;
    use paddle_arena::sim::{Controller, EventKind, GameState, Simulation, TickInput};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::error!("Invalid seed: {}", e);
            std::process::exit(2);
        }
        None => 0x5eed,
    };
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Failed to load tuning from {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => Tuning::default(),
    };

    log::info!("Paddle Arena (headless) starting, seed {}", seed);
    let mut sim = Simulation::new(GameState::new(seed, tuning, Controller::Ai, Controller::Ai));

    // An hour of play is plenty for any sane tuning
    let frame_limit = 60 * 60 * 60;
    let input = TickInput::default();
    while !sim.is_over() && sim.state.frame < frame_limit {
        sim.advance(&input, FRAME_SECONDS);

        for event in sim.state.events.drain_external() {
            match &event.kind {
                EventKind::Affected(a) => log::debug!(
                    "{} paddle is now {}",
                    event.side.map(|s| s.as_str()).unwrap_or("?"),
                    a.as_str()
                ),
                EventKind::MatchOver => log::info!("Match over after {} frames", sim.state.frame),
                _ => log::trace!("Event {}", event.kind.type_name()),
            }
        }
        // Nothing draws, so the outbox is only emptied
        let _ = sim.state.outbox.take();
    }

    let seconds = sim.state.frame as f32 * FRAME_SECONDS;
    log::info!(
        "Final score {} - {} after {:.1}s",
        sim.state.score.left,
        sim.state.score.right,
        seconds
    );

    match sim.state.snapshot(f64::from(seconds) * 1000.0).to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to encode snapshot: {}", e),
    }
    sim.shutdown();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is embedded by a host; there is no standalone entry point
}
