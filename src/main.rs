mod config;
mod error;
mod external;
mod generators;
mod page;
mod render;
mod scene;
mod view;

use clap::Parser;
use crossterm::{
    cursor, execute, terminal,
    event::{self, Event, KeyCode, KeyEvent, MouseEvent, MouseEventKind},
};
use error::Error;
use external::{FeedSource, ScrollUpdate};
use page::{Page, ScrollStep};
use rand::RngExt;
use render::{ColorMode, RenderMode};
use scene::population::Spawn;
use scene::scheduler::{SceneConfig, Scheduler};
use scene::scroll::{ScrollMetrics, ScrollSignal};
use scene::shading::Turbulence;
use scene::ObjectKind;
use std::cell::Cell;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use view::stage::TerminalStage;

#[derive(Parser)]
#[command(name = "event-horizon", about = "Scroll-driven black hole in the terminal")]
struct Cli {
    /// Render mode
    #[arg(short, long, value_enum)]
    render: Option<RenderMode>,

    /// Color mode
    #[arg(short, long, value_enum)]
    color: Option<ColorMode>,

    /// Target FPS (1-120) [default: 30]
    #[arg(short, long)]
    fps: Option<u32>,

    /// Scale factor for background star/particle counts (0.5-2.0)
    #[arg(short, long)]
    scale: Option<f64>,

    /// Fixed random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Spawn direction sampling
    #[arg(long, value_enum)]
    spawn: Option<Spawn>,

    /// Accretion disk turbulence
    #[arg(long, value_enum)]
    turbulence: Option<Turbulence>,

    /// Read scroll updates (JSON lines) from "stdin" or a watched file
    #[arg(long)]
    feed: Option<String>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Hide the status bar
    #[arg(long)]
    clean: bool,

    /// Show config file path and current settings
    #[arg(long)]
    show_config: bool,

    /// Create a default config file if none exists
    #[arg(long)]
    init_config: bool,
}

/// CLI merged over the config file over the defaults.
struct Settings {
    render: RenderMode,
    color: ColorMode,
    fps: u32,
    color_quant: u8,
    clean: bool,
    scene: SceneConfig,
    feed: Option<FeedSource>,
    log_file: Option<PathBuf>,
}

impl Settings {
    fn resolve(cli: Cli, cfg: config::Config) -> Self {
        let scale = cli.scale.or(cfg.scale).unwrap_or(1.0).clamp(0.5, 2.0);
        let scaled = |n: usize| (n as f64 * scale).round() as usize;
        let seed = cli
            .seed
            .or(cfg.seed)
            .unwrap_or_else(|| rand::rng().random());
        Settings {
            render: cli.render.or(cfg.render).unwrap_or(RenderMode::HalfBlock),
            color: cli.color.or(cfg.color).unwrap_or(ColorMode::TrueColor),
            fps: cli.fps.or(cfg.fps).unwrap_or(30).clamp(1, 120),
            color_quant: cfg.color_quant.unwrap_or(0),
            clean: cli.clean || cfg.clean.unwrap_or(false),
            scene: SceneConfig {
                seed,
                spawn: cli.spawn.or(cfg.spawn).unwrap_or_default(),
                turbulence: cli.turbulence.or(cfg.turbulence).unwrap_or_default(),
                star_count: scaled(generators::STAR_COUNT),
                particle_count: scaled(generators::PARTICLE_COUNT),
                distant_star_count: scaled(generators::DISTANT_STAR_COUNT),
            },
            feed: cli.feed.or(cfg.feed).as_deref().map(FeedSource::parse),
            log_file: cli.log_file.or(cfg.log_file),
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("event-horizon: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    if cli.init_config {
        match config::init_config()? {
            Some(path) => println!("Created config file: {}", path.display()),
            None => match config::config_path() {
                Some(path) => println!("Config file already exists: {}", path.display()),
                None => eprintln!("Could not determine config directory"),
            },
        }
        return Ok(());
    }

    if cli.show_config {
        match config::config_path() {
            Some(path) => {
                println!("Config path: {}", path.display());
                if path.exists() {
                    println!("Status: found\n");
                    if let Ok(contents) = std::fs::read_to_string(&path) {
                        println!("{}", contents);
                    }
                } else {
                    println!("Status: not found (using defaults)");
                    println!("\nRun with --init-config to create a default config file.");
                }
            }
            None => println!("Could not determine config directory"),
        }
        return Ok(());
    }

    // A malformed config file is reported and then ignored
    let (cfg, cfg_error) = match config::load_config() {
        Ok(cfg) => (cfg, None),
        Err(e) => (config::Config::default(), Some(e)),
    };
    let settings = Settings::resolve(cli, cfg);
    init_logging(settings.log_file.as_ref())?;
    if let Some(e) = cfg_error {
        log::warn!("{e}; using defaults");
        eprintln!("Warning: {e}; using defaults");
    }
    log::info!(
        "starting: render={:?} color={:?} fps={} seed={} spawn={:?} turbulence={:?} \
         stars={} particles={} distant={}",
        settings.render,
        settings.color,
        settings.fps,
        settings.scene.seed,
        settings.scene.spawn,
        settings.scene.turbulence,
        settings.scene.star_count,
        settings.scene.particle_count,
        settings.scene.distant_star_count,
    );

    let (cols, rows) = terminal::size()?;
    if cols < 10 || rows < 5 {
        return Err(Error::NoSurface { cols, rows });
    }

    let feed = settings.feed.clone().map(external::spawn_reader).transpose()?;

    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        event::EnableMouseCapture
    )?;

    let mut writer = BufWriter::with_capacity(256 * 1024, stdout);
    let result = run_loop(&mut writer, &settings, feed);

    // Cleanup
    execute!(
        writer,
        event::DisableMouseCapture,
        cursor::Show,
        terminal::LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()?;

    result
}

/// The alternate screen owns the terminal, so logs go to a file or nowhere.
fn init_logging(log_file: Option<&PathBuf>) -> Result<(), Error> {
    let default_level = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));
    if let Some(path) = log_file {
        let file = std::fs::File::create(path).map_err(|source| Error::LogFile {
            path: path.clone(),
            source,
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

const RENDER_MODES: [RenderMode; 3] = [
    RenderMode::HalfBlock,
    RenderMode::Braille,
    RenderMode::Ascii,
];
const COLOR_MODES: [ColorMode; 4] = [
    ColorMode::TrueColor,
    ColorMode::Ansi256,
    ColorMode::Ansi16,
    ColorMode::Mono,
];

/// Wheel notches and arrow keys move the page by this many rows.
const SCROLL_LINES: f64 = 3.0;
const ORBIT_STEP: f64 = 0.1;

fn build_stage(
    cols: u16,
    rows: u16,
    hide_status: bool,
    settings: &Settings,
    render_mode: RenderMode,
    color_mode: ColorMode,
) -> TerminalStage {
    let display_rows = if hide_status {
        rows as usize
    } else {
        (rows as usize).saturating_sub(1)
    };
    let mut stage = TerminalStage::new(cols as usize, display_rows, render_mode, color_mode);
    stage.canvas_mut().color_quant = settings.color_quant;
    stage
}

/// Pick the single progress publication for a frame. An external update
/// takes precedence over local scrolling that arrived in the same frame.
fn next_progress(
    signal: &mut ScrollSignal,
    external: Option<ScrollUpdate>,
    local: Option<ScrollMetrics>,
) -> Option<f64> {
    match external {
        Some(ScrollUpdate::Progress { progress }) => signal.observe_progress(progress),
        Some(update) => update.metrics().and_then(|m| signal.observe(m)),
        None => local.and_then(|m| signal.observe(m)),
    }
}

fn run_loop(
    stdout: &mut BufWriter<io::Stdout>,
    settings: &Settings,
    feed: Option<Receiver<ScrollUpdate>>,
) -> Result<(), Error> {
    let frame_dur = Duration::from_secs_f64(1.0 / settings.fps as f64);
    let (mut cols, mut rows) = terminal::size()?;

    let mut render_mode = settings.render;
    let mut color_mode = settings.color;
    let mut hide_status = settings.clean;
    let mut stage = build_stage(cols, rows, hide_status, settings, render_mode, color_mode);

    let mut page = Page::new(rows as usize);
    let mut signal = ScrollSignal::new();
    let mut scheduler = Scheduler::new(&settings.scene);

    let last_swallowed: Rc<Cell<Option<ObjectKind>>> = Rc::new(Cell::new(None));
    let listener = Rc::clone(&last_swallowed);
    scheduler.on_destroy(move |_, kind| listener.set(Some(kind)));

    let start = Instant::now();
    let mut frame_count: u64 = 0;
    let mut actual_fps: f64 = 0.0;
    let mut fps_update = Instant::now();

    // Track if we need to rebuild the stage
    let mut rebuild_stage = false;

    loop {
        let frame_start = Instant::now();
        let mut page_moved = false;

        // Handle input (non-blocking)
        while event::poll(Duration::ZERO)? {
            let step = match event::read()? {
                Event::Resize(w, h) => {
                    if w >= 10 && h >= 5 {
                        cols = w;
                        rows = h;
                        rebuild_stage = true;
                    }
                    None
                }
                Event::Mouse(MouseEvent { kind, .. }) => match kind {
                    MouseEventKind::ScrollDown => Some(ScrollStep::Lines(SCROLL_LINES)),
                    MouseEventKind::ScrollUp => Some(ScrollStep::Lines(-SCROLL_LINES)),
                    _ => None,
                },
                Event::Key(KeyEvent { code, .. }) => match code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => Some(ScrollStep::Lines(SCROLL_LINES)),
                    KeyCode::Up | KeyCode::Char('k') => Some(ScrollStep::Lines(-SCROLL_LINES)),
                    KeyCode::PageDown | KeyCode::Char(' ') => Some(ScrollStep::Pages(1.0)),
                    KeyCode::PageUp => Some(ScrollStep::Pages(-1.0)),
                    KeyCode::Home => Some(ScrollStep::Top),
                    KeyCode::End => Some(ScrollStep::Bottom),
                    KeyCode::Left => {
                        stage.orbit(-ORBIT_STEP, 0.0);
                        None
                    }
                    KeyCode::Right => {
                        stage.orbit(ORBIT_STEP, 0.0);
                        None
                    }
                    KeyCode::Char('w') => {
                        stage.orbit(0.0, ORBIT_STEP);
                        None
                    }
                    KeyCode::Char('s') => {
                        stage.orbit(0.0, -ORBIT_STEP);
                        None
                    }
                    // Cycle render mode
                    KeyCode::Char('r') => {
                        let idx = RENDER_MODES.iter().position(|&m| m == render_mode).unwrap_or(0);
                        render_mode = RENDER_MODES[(idx + 1) % RENDER_MODES.len()];
                        rebuild_stage = true;
                        None
                    }
                    // Cycle color mode
                    KeyCode::Char('c') => {
                        let idx = COLOR_MODES.iter().position(|&m| m == color_mode).unwrap_or(0);
                        color_mode = COLOR_MODES[(idx + 1) % COLOR_MODES.len()];
                        rebuild_stage = true;
                        None
                    }
                    // Toggle status bar
                    KeyCode::Char('h') => {
                        hide_status = !hide_status;
                        rebuild_stage = true;
                        None
                    }
                    _ => None,
                },
                _ => None,
            };
            if let Some(step) = step {
                page.scroll(step);
                page_moved = true;
            }
        }

        // Only the newest external update matters for this frame
        let external = feed.as_ref().and_then(|rx| rx.try_iter().last());

        let from_feed = external.is_some();
        let local = page_moved.then(|| page.metrics());
        let published = next_progress(&mut signal, external, local);
        if from_feed {
            // The page follows the host so the section heading matches
            page.seek(signal.progress());
        }
        if let Some(progress) = published {
            scheduler.set_progress(progress);
        }

        // Rebuild stage if mode changed or terminal resized
        if rebuild_stage && cols >= 10 && rows >= 5 {
            // Re-read size to get the settled value
            let (settled_cols, settled_rows) = terminal::size()?;
            if settled_cols >= 10 && settled_rows >= 5 {
                cols = settled_cols;
                rows = settled_rows;
            }
            let (yaw, pitch) = (stage.camera().yaw(), stage.camera().pitch());
            stage = build_stage(cols, rows, hide_status, settings, render_mode, color_mode);
            stage.orbit(yaw, pitch);
            page.resize(rows as usize);
            // Reset terminal state completely
            write!(stdout, "\x1b[2J\x1b[H")?;
            stdout.flush()?;
            rebuild_stage = false;
        }

        // Update & render
        let resolution = stage.resolution();
        let stats = scheduler.tick(start.elapsed().as_secs_f64(), resolution, &mut stage);
        let frame = stage.canvas().render();

        // Skip a frame written at a stale size
        let (check_cols, check_rows) = terminal::size()?;
        if check_cols != cols || check_rows != rows {
            cols = check_cols;
            rows = check_rows;
            rebuild_stage = true;
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }

        // Build entire frame into buffer before flushing
        stdout.write_all(b"\x1b[H")?;
        stdout.write_all(frame.as_bytes())?;

        // Status bar
        frame_count += 1;
        if fps_update.elapsed() >= Duration::from_secs(1) {
            actual_fps = frame_count as f64 / fps_update.elapsed().as_secs_f64();
            frame_count = 0;
            fps_update = Instant::now();
        }
        if !hide_status {
            let (title, subtitle) = page.section_in_view();
            let swallowed = match last_swallowed.get() {
                Some(kind) => format!("{} swallowed (last: {:?})", scheduler.swallowed(), kind),
                None => format!("{} swallowed", scheduler.swallowed()),
            };
            let status = format!(
                " {}: {} | {:>3.0}% | {} objects | {} | {:.0} fps | \
                 [↑/↓] scroll  [←/→ w/s] orbit  [r] render  [c] color  [h] hide  [q] quit ",
                title,
                subtitle,
                scheduler.progress() * 100.0,
                stats.live,
                swallowed,
                actual_fps,
            );
            let w = cols as usize;
            let truncated: String = status.chars().take(w).collect();
            let padded = format!("{:<width$}", truncated, width = w);
            write!(stdout, "\x1b[{};1H\x1b[7m{}\x1b[0m", rows, padded)?;
        }

        // Single flush per frame
        stdout.flush()?;

        // Sleep to target FPS
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["event-horizon"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn metrics(offset: f64) -> ScrollMetrics {
        ScrollMetrics {
            offset,
            scroll_height: 3000.0,
            viewport_height: 1000.0,
        }
    }

    #[test]
    fn local_scroll_publishes_alone() {
        let mut signal = ScrollSignal::new();
        assert_eq!(next_progress(&mut signal, None, Some(metrics(500.0))), Some(0.25));
        assert_eq!(next_progress(&mut signal, None, None), None);
    }

    #[test]
    fn feed_publishes_progress_and_metrics() {
        let mut signal = ScrollSignal::new();
        let update = ScrollUpdate::Progress { progress: 0.4 };
        assert_eq!(next_progress(&mut signal, Some(update), None), Some(0.4));
        let update = ScrollUpdate::Metrics {
            offset: 2000.0,
            scroll_height: 3000.0,
            viewport_height: 1000.0,
        };
        assert_eq!(next_progress(&mut signal, Some(update), None), Some(1.0));
    }

    #[test]
    fn feed_wins_over_local_scroll_in_same_frame() {
        let mut signal = ScrollSignal::new();
        let update = ScrollUpdate::Progress { progress: 0.25 };
        let published = next_progress(&mut signal, Some(update), Some(metrics(1000.0)));
        assert_eq!(published, Some(0.25));
        assert_eq!(signal.progress(), 0.25);

        // Page re-synced from the feed lands on the feed's position
        let mut page = Page::new(10);
        page.scroll(ScrollStep::Bottom);
        page.seek(signal.progress());
        assert_eq!(page.metrics().progress(), 0.25);
    }

    #[test]
    fn unchanged_value_publishes_nothing() {
        let mut signal = ScrollSignal::new();
        let update = ScrollUpdate::Progress { progress: 0.5 };
        assert_eq!(next_progress(&mut signal, Some(update.clone()), None), Some(0.5));
        assert_eq!(next_progress(&mut signal, Some(update), None), None);
        assert_eq!(next_progress(&mut signal, None, Some(metrics(1000.0))), None);
        assert_eq!(next_progress(&mut signal, None, Some(metrics(0.0))), Some(0.0));
    }

    #[test]
    fn cli_overrides_config_overrides_defaults() {
        let cfg = config::Config {
            render: Some(RenderMode::Ascii),
            color: Some(ColorMode::Ansi16),
            seed: Some(9),
            feed: Some("stdin".into()),
            clean: Some(true),
            ..config::Config::default()
        };
        let settings = Settings::resolve(cli(&["--render", "braille", "--spawn", "uniform"]), cfg);
        assert_eq!(settings.render, RenderMode::Braille);
        assert_eq!(settings.color, ColorMode::Ansi16);
        assert_eq!(settings.scene.seed, 9);
        assert_eq!(settings.scene.spawn, Spawn::Uniform);
        assert_eq!(settings.scene.turbulence, Turbulence::Hash);
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.feed, Some(FeedSource::Stdin));
        assert!(settings.clean);
        assert_eq!(settings.scene.star_count, generators::STAR_COUNT);

        let settings = Settings::resolve(cli(&["--seed", "3"]), config::Config::default());
        assert_eq!(settings.render, RenderMode::HalfBlock);
        assert_eq!(settings.color, ColorMode::TrueColor);
        assert_eq!(settings.scene.seed, 3);
        assert_eq!(settings.feed, None);
    }

    #[test]
    fn fps_and_scale_are_clamped() {
        let settings = Settings::resolve(
            cli(&["--fps", "500", "--scale", "9", "--seed", "1"]),
            config::Config::default(),
        );
        assert_eq!(settings.fps, 120);
        assert_eq!(settings.scene.star_count, generators::STAR_COUNT * 2);
        assert_eq!(settings.scene.particle_count, generators::PARTICLE_COUNT * 2);
        assert_eq!(settings.scene.distant_star_count, generators::DISTANT_STAR_COUNT * 2);

        let cfg = config::Config {
            fps: Some(0),
            scale: Some(0.1),
            ..config::Config::default()
        };
        let settings = Settings::resolve(cli(&["--seed", "1"]), cfg);
        assert_eq!(settings.fps, 1);
        assert_eq!(settings.scene.star_count, generators::STAR_COUNT / 2);
        assert_eq!(settings.scene.particle_count, generators::PARTICLE_COUNT / 2);
    }
}
