//! Stick Brawl headless runner
//!
//! Plays a bot-vs-bot match at a 60 Hz step and logs what happens.
//!
//! Usage: `stick-brawl [seed] [seconds] [p1-difficulty] [p2-difficulty] [tuning.json]`
//!
//! Player 1 pursues only; player 2 also flees when hurt.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use stick_brawl::Tuning;
    use stick_brawl::consts::SIM_DT;
    use stick_brawl::sim::{AiProfile, ArenaBounds, Controller, Difficulty, GameEvent, TickInput, World, tick};

    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let seed = match args.first().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::error!("Invalid seed `{}`: {}", args[0], e);
            std::process::exit(2);
        }
        None => 1,
    };
    let seconds = match args.get(1).map(|s| s.parse::<f32>()) {
        Some(Ok(seconds)) if seconds > 0.0 => seconds,
        Some(_) => {
            log::error!("Duration must be a positive number of seconds");
            std::process::exit(2);
        }
        None => 60.0,
    };
    let mut difficulties = [Difficulty::Hard, Difficulty::Normal];
    for (slot, arg) in difficulties.iter_mut().zip(args.iter().skip(2)) {
        match arg.parse::<Difficulty>() {
            Ok(difficulty) => *slot = difficulty,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(2);
            }
        }
    }
    let tuning = match args.get(4) {
        Some(path) => match Tuning::load(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Tuning::default(),
    };

    let controllers = [
        Controller::Ai(AiProfile { difficulty: difficulties[0], flees: false }),
        Controller::Ai(AiProfile { difficulty: difficulties[1], flees: true }),
    ];
    let mut world = World::with_controllers(seed, ArenaBounds::new(1830.0, 820.0), tuning, controllers);
    log::info!(
        "Stick Brawl starting (seed {}, {}s, {} vs {})",
        seed,
        seconds,
        difficulties[0].as_str(),
        difficulties[1].as_str()
    );

    let input = TickInput::default();
    let mut wins = [0u32; 2];
    let steps = (seconds / SIM_DT).ceil() as u64;
    for _ in 0..steps {
        tick(&mut world, &input, SIM_DT);
        for event in world.take_events() {
            match event {
                GameEvent::FighterDied { victim, victor } => {
                    wins[victor.index()] += 1;
                    log::info!("Player {} knocked out player {}", victor.number(), victim.number());
                }
                GameEvent::RoundReset { round } => log::info!("Round {} begins", round),
                other => log::debug!("{:?}", other),
            }
        }
    }

    let [one, two] = &world.fighters;
    println!(
        "After {:.0}s: round {}, player 1 {} KOs (level {}), player 2 {} KOs (level {})",
        world.time, world.round.number, wins[0], one.level, wins[1], two.level
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on wasm
}
