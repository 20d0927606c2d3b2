use crate::config::{load_settings, project_paths, save_settings_atomic, Args, Settings};
use crate::console::Console;
use crate::input::{Command, InputThread};
use crate::render::{draw_frame, Overlay, Terminal};
use crate::sim::Run;
use crate::tank::{Rgb, Tank};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Fish colors, handed out in spawn order.
const PALETTE: [Rgb; 8] = [
    Rgb::new(255, 215, 95),
    Rgb::new(255, 175, 95),
    Rgb::new(255, 135, 135),
    Rgb::new(175, 255, 135),
    Rgb::new(215, 175, 255),
    Rgb::WHITE,
    Rgb::new(255, 175, 215),
    Rgb::new(135, 255, 255),
];

const CONSOLE_CAPACITY: usize = 64;

pub(crate) fn run() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths()?;
    init_logging(&paths.log_path, args.headless)?;

    let mut settings = load_settings(&paths.settings_path);
    settings.apply_args(&args);
    settings.validate()?;
    if args.save_config {
        save_settings_atomic(&paths.settings_path, &settings)?;
        log::info!("saved settings to {}", paths.settings_path.display());
    }

    let seed = settings.seed.unwrap_or_else(clock_seed);
    log::info!("seed {seed}");
    let tank = stock_tank(&settings, seed)?;

    if args.headless {
        let mut out = io::stdout().lock();
        return run_headless(&mut out, tank, settings.steps);
    }

    let mut app = App::init(tank, settings)?;
    let res = app.run();
    app.shutdown()?;
    res
}

fn init_logging(log_path: &Path, headless: bool) -> Result<()> {
    use env_logger::{Env, Target};

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if !headless {
        // stdout belongs to the tank view
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("opening log file {}", log_path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0xA11CE)
}

/// Builds the tank and fills it. Fails before any fish exists if the tank is
/// too small for the largest fish.
pub(crate) fn stock_tank(settings: &Settings, seed: u64) -> Result<Tank> {
    let mut tank = Tank::new(settings.tank_width, settings.tank_height, seed);
    tank.ensure_fits_largest()?;
    for i in 0..settings.fish_count as usize {
        tank.spawn_fish(PALETTE[i % PALETTE.len()])?;
    }
    log::info!(
        "stocked {}x{} tank with {} fish",
        tank.width(),
        tank.height(),
        tank.len()
    );
    Ok(tank)
}

/// Prints the starting positions, then every fish after every step.
pub(crate) fn run_headless<W: Write>(out: &mut W, mut tank: Tank, steps: u32) -> Result<()> {
    writeln!(
        out,
        "aquarium {}x{} with {} fish",
        tank.width(),
        tank.height(),
        tank.len()
    )?;
    write_fish(out, &tank, "start")?;
    let mut run = Run::new(steps);
    while run.advance(&mut tank).is_some() {
        write_fish(out, &tank, &format!("step {}", run.steps_done))?;
    }
    out.flush()?;
    Ok(())
}

fn write_fish<W: Write>(out: &mut W, tank: &Tank, label: &str) -> Result<()> {
    writeln!(out, "{label}:")?;
    for f in tank.fish() {
        writeln!(out, "  {f}")?;
    }
    Ok(())
}

/// Moves the inspection cursor by `delta`, wrapping; `None` starts at
/// either end.
pub(crate) fn cycle_inspect(current: Option<usize>, delta: i32, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len_i = len as i64;
    let next = match current {
        Some(i) => (i as i64 + delta as i64).rem_euclid(len_i),
        None if delta < 0 => len_i - 1,
        None => 0,
    };
    Some(next as usize)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Waiting,
    Swimming,
    Finished,
}

struct App {
    tank: Tank,
    settings: Settings,
    run: Run,
    phase: Phase,
    console: Console,
    inspected: Option<usize>,
    rx: Receiver<Command>,
    input: InputThread,
    term: Terminal,
}

impl App {
    fn init(tank: Tank, settings: Settings) -> Result<Self> {
        let term = Terminal::begin()?;
        let (tx, rx) = mpsc::channel();
        let input = InputThread::spawn(tx)?;
        Ok(Self {
            run: Run::new(settings.steps),
            tank,
            settings,
            phase: Phase::Waiting,
            console: Console::new(CONSOLE_CAPACITY),
            inspected: None,
            rx,
            input,
            term,
        })
    }

    fn run(&mut self) -> Result<()> {
        self.console.println(format!(
            "This is an aquarium simulation: {} fish in a {}x{} tank, {} steps.",
            self.tank.len(),
            self.tank.width(),
            self.tank.height(),
            self.run.total_steps
        ));

        if !self.settings.autostart {
            self.console.println("Press Space to start the simulation.");
            if !self.wait_for_start()? {
                return Ok(());
            }
        }

        self.phase = Phase::Swimming;
        self.console.println("Swimming.");
        if !self.swim()? {
            return Ok(());
        }

        self.phase = Phase::Finished;
        self.console.println(format!(
            "Finished after {} steps. Press Q to quit.",
            self.run.steps_done
        ));
        self.wait_for_quit()
    }

    /// Blocks on the input channel until the start command. False on quit.
    fn wait_for_start(&mut self) -> Result<bool> {
        self.render()?;
        loop {
            match self.rx.recv()? {
                Command::Start => return Ok(true),
                Command::Quit => return Ok(false),
                other => self.handle_view(other),
            }
            self.render()?;
        }
    }

    /// Steps on a fixed interval, serving commands in between. False on quit.
    fn swim(&mut self) -> Result<bool> {
        let interval = Duration::from_millis(self.settings.step_ms);
        let mut next_tick = Instant::now() + interval;
        self.render()?;

        while !self.run.is_finished() {
            let now = Instant::now();
            if now >= next_tick {
                if let Some(turned) = self.run.tick(&mut self.tank) {
                    self.after_step(turned);
                }
                next_tick = now + interval;
                self.render()?;
                continue;
            }

            match self.rx.recv_timeout(next_tick - now) {
                Ok(Command::Quit) => return Ok(false),
                Ok(Command::Start) => {}
                Ok(Command::TogglePause) => {
                    self.run.toggle_pause();
                    let msg = if self.run.paused {
                        "Paused. N steps once, P resumes."
                    } else {
                        "Resumed."
                    };
                    self.console.println(msg);
                }
                Ok(Command::SingleStep) => {
                    if self.run.paused {
                        if let Some(turned) = self.run.advance(&mut self.tank) {
                            self.after_step(turned);
                        }
                    }
                }
                Ok(other) => self.handle_view(other),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    anyhow::bail!("input thread went away")
                }
            }
            self.render()?;
        }
        Ok(true)
    }

    fn wait_for_quit(&mut self) -> Result<()> {
        self.render()?;
        loop {
            match self.rx.recv()? {
                Command::Quit => return Ok(()),
                other => self.handle_view(other),
            }
            self.render()?;
        }
    }

    fn after_step(&mut self, turned: usize) {
        let step = self.run.steps_done;
        if turned > 0 {
            self.console.println(format!(
                "Step {step} of {}: {turned} fish turned around.",
                self.run.total_steps
            ));
        } else {
            log::debug!("step {step} of {}", self.run.total_steps);
        }
    }

    /// Commands that only change what is shown.
    fn handle_view(&mut self, cmd: Command) {
        match cmd {
            Command::Inspect(delta) => {
                self.inspected = cycle_inspect(self.inspected, delta, self.tank.len());
            }
            Command::Redraw => self.term.force_redraw(),
            _ => {}
        }
    }

    fn status(&self) -> &'static str {
        match self.phase {
            Phase::Waiting => "waiting for Space",
            Phase::Swimming if self.run.paused => "paused",
            Phase::Swimming => "swimming",
            Phase::Finished => "finished",
        }
    }

    fn render(&mut self) -> Result<()> {
        self.term.resize_if_needed()?;
        let status = self.status();
        let overlay = Overlay {
            status,
            steps_done: self.run.steps_done,
            total_steps: self.run.total_steps,
            inspected: self.inspected,
            console: &self.console,
            enable_color: self.settings.enable_color,
        };
        draw_frame(&mut self.term, &self.tank, &overlay);
        self.term.present()
    }

    fn shutdown(&mut self) -> Result<()> {
        self.input.shutdown();
        self.term.end()?;
        log::info!("closed after {} of {} steps", self.run.steps_done, self.run.total_steps);
        Ok(())
    }
}
