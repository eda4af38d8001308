/// Entry point and game loop.

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use portalban::config::{GameConfig, LoggingConfig};
use portalban::sim::level::Catalog;
use portalban::ui::input::{InputState, KeyBindings};
use portalban::ui::renderer::Renderer;
use portalban::ui::session::Session;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let catalog = match Catalog::builtin() {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "built-in levels failed to load");
            eprintln!("Level data error: {e}");
            return;
        }
    };
    info!(levels = catalog.len(), "starting");

    let bindings = KeyBindings::from_config(&config.controls);
    let mut session = Session::new(catalog, config.general.start_level.saturating_sub(1));
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        error!(%e, "terminal init failed");
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut session, &mut renderer, &bindings, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(%e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    info!(
        total_coins = session.progress.total_coins,
        deaths = session.progress.deaths,
        "exiting"
    );
    println!();
    println!("Thanks for playing Portalban!");
    println!("Total coins: {}  Deaths: {}", session.progress.total_coins, session.progress.deaths);
}

/// Log to a file: stdout belongs to the alternate screen.
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(cfg: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file = OpenOptions::new().create(true).append(true).open(&cfg.file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| e.to_string())?;

    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
        eprintln!("{info}");
    }));
    Ok(())
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    bindings: &KeyBindings,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    let tick_rate = Duration::from_millis(config.general.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        input.drain_events();

        if input.ctrl_c_pressed() {
            break;
        }
        for &code in input.fresh_presses() {
            session.handle(bindings.actions_for(code));
            if session.should_quit() {
                break;
            }
        }
        if session.should_quit() {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            session.tick();
            last_tick = Instant::now();
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}
