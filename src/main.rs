//! Plinko Drop demo entry point
//!
//! Native: runs headless drops and prints where each ball lands.
//!
//! ```text
//! plinko-drop [--config board.json] [PATH ...]
//! ```
//!
//! Each PATH is an `L`/`R` string with one letter per row. Without paths a
//! staged bucket round with random outcomes is simulated instead.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use plinko_drop::consts::TICK_MS;
    use plinko_drop::{BallId, EngineConfig, EngineObserver, OutcomePath, PlinkoEngine};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Prints events as they arrive
    struct Printer {
        tick: u64,
        landed: usize,
    }

    impl EngineObserver for Printer {
        fn on_landed(&mut self, id: BallId, slot: u32) {
            self.landed += 1;
            println!(
                "  ball {:>3} landed in slot {:>2} at {:>7.0} ms",
                id,
                slot,
                self.tick as f32 * TICK_MS
            );
        }

        fn on_settled(&mut self) {
            println!("  bucket settled at {:.0} ms", self.tick as f32 * TICK_MS);
        }
    }

    const MAX_TICKS: u64 = 20_000;

    fn run(engine: &mut PlinkoEngine, printer: &mut Printer, expected: usize) {
        while printer.landed < expected && printer.tick < MAX_TICKS {
            engine.tick();
            printer.tick = engine.time_ticks();
            engine.flush_events(printer);
        }
    }

    fn load_config(path: Option<&str>) -> Result<EngineConfig, String> {
        match path {
            Some(file) => {
                let json = std::fs::read_to_string(file).map_err(|e| format!("{}: {}", file, e))?;
                EngineConfig::from_json(&json).map_err(|e| e.to_string())
            }
            None => Ok(EngineConfig::default()),
        }
    }

    pub fn main() -> Result<(), String> {
        let mut args = std::env::args().skip(1);
        let mut config_path = None;
        let mut path_args = Vec::new();
        while let Some(arg) = args.next() {
            if arg == "--config" {
                config_path = Some(args.next().ok_or("--config needs a file")?);
            } else {
                path_args.push(arg);
            }
        }

        let config = load_config(config_path.as_deref())?;
        let rows = config.board.rows;
        let mut engine = PlinkoEngine::new(config).map_err(|e| e.to_string())?;
        let mut printer = Printer { tick: 0, landed: 0 };

        if !path_args.is_empty() {
            println!("Dropping {} balls", path_args.len());
            for (id, text) in path_args.iter().enumerate() {
                let path = OutcomePath::parse(text, rows).map_err(|e| e.to_string())?;
                let choices: Vec<bool> = path.iter().collect();
                engine.drop_ball(id as BallId, &choices).map_err(|e| e.to_string())?;
                println!("  ball {:>3}: {} -> slot {}", id, path, path.slot());
            }
            run(&mut engine, &mut printer, path_args.len());
        } else {
            let balls = 10u32;
            println!("Staging {} balls in the bucket", balls);
            for id in 0..balls {
                engine.drop_ball_into_bucket(id, id * 200).map_err(|e| e.to_string())?;
            }
            // Poll the settle predicate at a sixth of the frame rate
            while printer.tick < MAX_TICKS {
                engine.tick();
                printer.tick = engine.time_ticks();
                if printer.tick % 6 == 0 && engine.are_balls_settled() {
                    break;
                }
                engine.flush_events(&mut printer);
            }
            engine.flush_events(&mut printer);

            // Stand-in for the remote fairness authority
            let mut rng = Pcg32::seed_from_u64(std::process::id() as u64);
            for id in 0..balls {
                let choices: Vec<bool> = (0..rows).map(|_| rng.random_bool(0.5)).collect();
                engine.assign_path_to_ball(id, &choices).map_err(|e| e.to_string())?;
            }
            let released = engine.open_bucket().map_err(|e| e.to_string())?;
            println!("Released {} balls", released);
            run(&mut engine, &mut printer, balls as usize);
        }

        engine.destroy();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Plinko Drop (native) starting...");
    if let Err(err) = native::main() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry points live in plinko_drop::wasm, this is just to satisfy the compiler
}
