/// Entry point and game loop.
///
/// One thread does everything: drain input into commands, let the scheduler
/// add any due timer commands, hand the queue to the controller, draw.

mod config;
mod domain;
mod sim;
mod ui;

use std::collections::VecDeque;
use std::fs::File;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, trace, warn};

use config::{GameConfig, GeneralConfig};
use sim::audio::{AudioPort, Silent};
use sim::controller::{Command, Controller};
use sim::schedule::Scheduler;
use sim::world::PhaseKind;
use ui::gamepad::GamepadState;
use ui::input::{Action, InputState, KeyMap};
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    let config = GameConfig::load();
    init_logging(&config.general)?;
    for w in &config.warnings {
        warn!("config: {w}");
    }

    let (keymap, unknown) = KeyMap::from_config(&config.keys);
    for name in unknown {
        warn!("config: unknown key name {name:?}");
    }

    let seed = config.general.seed.unwrap_or_else(rand::random);
    info!("seed {seed}");

    let audio = open_audio(&config.general);
    let mut controller = Controller::new(
        config.rules.clone(),
        config.timing.countdown_from,
        seed,
        audio,
    );
    let mut scheduler = Scheduler::new(&config.timing);

    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }

    let mut renderer = Renderer::new(config.keys.columns.clone());
    let honor_release = match renderer.init() {
        Ok(v) => v,
        Err(e) => {
            let _ = renderer.cleanup();
            return Err(e).context("terminal init failed");
        }
    };
    let mut kb = InputState::new(keymap);
    kb.honor_release = honor_release;

    let result = game_loop(&mut controller, &mut scheduler, &mut renderer, &mut kb, &mut gp);

    renderer.cleanup().context("terminal cleanup failed")?;
    result?;

    println!();
    println!("Thanks for playing Piano Tiles!");
    println!("Best Score: {}", controller.snapshot().best_score);
    Ok(())
}

/// `RUST_LOG` overrides the default `warn` filter. With `log_file` set the
/// output goes there, which keeps it off the game screen.
fn init_logging(general: &GeneralConfig) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    );
    builder.format_timestamp_millis();
    if let Some(path) = &general.log_file {
        let file = File::create(path)
            .with_context(|| format!("could not open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("logger already initialized")?;
    Ok(())
}

fn open_audio(general: &GeneralConfig) -> Box<dyn AudioPort> {
    if !general.sound {
        info!("sound disabled by config");
        return Box::new(Silent);
    }
    match SoundEngine::new() {
        Some(engine) => Box::new(engine),
        None => {
            warn!("no audio output device; continuing without sound");
            Box::new(Silent)
        }
    }
}

fn game_loop(
    controller: &mut Controller,
    scheduler: &mut Scheduler,
    renderer: &mut Renderer,
    kb: &mut InputState,
    gp: &mut GamepadState,
) -> Result<()> {
    let mut queue: VecDeque<Command> = VecDeque::with_capacity(16);

    loop {
        let phase = controller.phase_kind();
        scheduler.sync(phase, Instant::now());

        gp.update();
        let mut flow = Flow::Continue;
        for &action in kb.drain_events() {
            flow = flow.or(route(action, phase, |c, r| renderer.start_button_hit(c, r), &mut queue));
        }
        for action in gamepad_actions(gp) {
            flow = flow.or(route(action, phase, |_, _| false, &mut queue));
        }
        if flow == Flow::Quit {
            break;
        }

        scheduler.poll(Instant::now(), &mut queue);
        for event in controller.drain(&mut queue) {
            trace!("{event:?}");
        }

        renderer.render(&controller.snapshot())?;

        let wait = scheduler
            .next_deadline()
            .map_or(FRAME_SLEEP, |d| d.saturating_duration_since(Instant::now()).min(FRAME_SLEEP));
        std::thread::sleep(wait);
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Flow {
    Continue,
    Quit,
}

impl Flow {
    fn or(self, other: Flow) -> Flow {
        if self == Flow::Quit { Flow::Quit } else { other }
    }
}

/// Turn one input action into controller commands for the current phase.
fn route(
    action: Action,
    phase: PhaseKind,
    on_start_button: impl Fn(u16, u16) -> bool,
    queue: &mut VecDeque<Command>,
) -> Flow {
    match action {
        Action::ColumnDown(col) => queue.push_back(Command::ColumnPress(col)),
        Action::ColumnUp(col) => queue.push_back(Command::ColumnRelease(col)),
        Action::Start => match phase {
            PhaseKind::Menu => queue.push_back(Command::Start),
            PhaseKind::GameOver => queue.push_back(Command::Restart),
            _ => {}
        },
        Action::Click { column, row } => match phase {
            PhaseKind::Menu if on_start_button(column, row) => queue.push_back(Command::Start),
            PhaseKind::GameOver => queue.push_back(Command::Restart),
            _ => {}
        },
        Action::Quit => {
            if matches!(phase, PhaseKind::Menu | PhaseKind::GameOver) {
                return Flow::Quit;
            }
        }
        Action::Interrupt => return Flow::Quit,
    }
    Flow::Continue
}

fn gamepad_actions(gp: &GamepadState) -> Vec<Action> {
    let mut out: Vec<Action> = gp.columns_pressed().into_iter().map(Action::ColumnDown).collect();
    out.extend(gp.columns_released().into_iter().map(Action::ColumnUp));
    if gp.confirm_pressed() { out.push(Action::Start); }
    if gp.cancel_pressed() { out.push(Action::Quit); }
    out
}
