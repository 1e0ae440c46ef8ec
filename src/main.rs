//! Fruit Fusion entry point
//!
//! The browser build is driven from JS through `FruitFusion` (see
//! `platform::web`). Natively this runs a short headless autoplay of both
//! variants, which is handy for eyeballing balance changes in the log.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use fruit_fusion::app::{GameHost, HostListener};
    use fruit_fusion::sim::GameMode;
    use fruit_fusion::{Settings, Tuning};
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    const WIDTH: f32 = 400.0;
    const HEIGHT: f32 = 640.0;
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Simulated play time per variant
    const PLAY_MS: f64 = 90_000.0;

    struct LogListener;

    impl HostListener for LogListener {
        fn score_changed(&mut self, score: u64) {
            log::debug!("score {}", score);
        }

        fn game_over(&mut self, score: u64) {
            log::info!("Game over with {} points", score);
        }

        fn lives_changed(&mut self, lives: u8) {
            log::info!("{} lives left", lives);
        }
    }

    pub fn run(seed: u64) {
        let tuning = Tuning::load();
        let mut host = GameHost::new(tuning, Settings::load(), Box::new(LogListener));

        for mode in [GameMode::Drop, GameMode::Cut] {
            let mut rng = Pcg32::seed_from_u64(seed);
            let generation = host.mount(mode, WIDTH, HEIGHT, seed, 0.0);
            let mut now = 0.0;
            let mut next_input = 500.0;

            while now < PLAY_MS {
                now += FRAME_MS;
                host.frame(now, generation);

                if now >= next_input {
                    match mode {
                        GameMode::Drop => {
                            let at = Vec2::new(rng.random_range(20.0..WIDTH - 20.0), 40.0);
                            host.pointer_move(at, now);
                            host.pointer_up(at, now);
                            next_input = now + 700.0;
                        }
                        GameMode::Cut => {
                            let y = rng.random_range(HEIGHT * 0.3..HEIGHT * 0.7);
                            host.pointer_down(Vec2::new(0.0, y), now);
                            for step in 1..=10 {
                                let x = WIDTH * step as f32 / 10.0;
                                host.pointer_move(Vec2::new(x, y), now);
                            }
                            host.pointer_up(Vec2::new(WIDTH, y), now);
                            next_input = now + 400.0;
                        }
                    }
                }

                if host.session().is_some_and(|s| s.is_game_over()) {
                    break;
                }
            }

            if let Some(session) = host.session() {
                println!(
                    "{:>4}: score {:>5} after {:>5.1}s, {} bodies{}",
                    mode,
                    session.score(),
                    now / 1000.0,
                    session.bodies().len(),
                    if session.is_game_over() { " (game over)" } else { "" },
                );
            }
            host.unmount();
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Fruit Fusion (native) starting...");
    log::info!("The playable build is the wasm package; running a headless autoplay instead");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(7);
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
