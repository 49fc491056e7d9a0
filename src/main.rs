//! GyroGravity CLI
//!
//! Velocity-dependent pointer sensitivity.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gyrogravity::{
    collector::{platform_injector, ChannelCollector, Collector, RawMotionEvent, NATIVE_CAPTURE},
    config::Preset,
    core::{Axis, EngineProfile, MotionAccumulator, MotionEngine, ProfileHandle},
    curve::{sample, sample_range, CurveFamily, SeriesKind, DEFAULT_SAMPLE_STEPS},
    diagnostics::{MotionStats, DISPLAY_INTERVAL},
    AxisSettings, VERSION,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gyrogravity")]
#[command(version = VERSION)]
#[command(about = "Velocity-dependent pointer sensitivity", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture pointer motion and re-emit it through the active curves
    Run {
        /// Preset file (defaults to the last applied settings)
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Read "dx dy" motion lines from stdin instead of the device
        #[arg(long)]
        stdin: bool,
    },

    /// Print a diagnostic curve as CSV (speed, x, y)
    Curve {
        #[arg(long)]
        preset: Option<PathBuf>,

        /// sensitivity, jolt or velocity
        #[arg(long, default_value = "sensitivity")]
        kind: String,

        #[arg(long, default_value_t = DEFAULT_SAMPLE_STEPS)]
        steps: usize,
    },

    /// Inspect or edit the last applied settings
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },

    /// Drive the accumulator with a synthetic constant-speed stream
    Simulate {
        #[arg(long)]
        preset: Option<PathBuf>,

        /// Raw counts per event
        #[arg(long, default_value_t = 1)]
        delta: i32,

        /// Microseconds between events
        #[arg(long, default_value_t = 250)]
        interval_us: u64,

        /// Number of windows to flush
        #[arg(long, default_value_t = 1000)]
        flushes: usize,

        #[arg(long, value_enum, default_value_t = AxisArg::X)]
        axis: AxisArg,
    },

    /// Show paths and the active preset
    Status,
}

#[derive(Subcommand)]
enum PresetAction {
    /// Print the last applied settings as JSON
    Show,
    /// Restore the default settings
    Reset,
    /// Validate a preset file and make it the last applied settings
    Import { file: PathBuf },
    /// Write the last applied settings to a file
    Export { file: PathBuf },
    /// Edit one axis (or both)
    Set(SetArgs),
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AxisArg {
    X,
    Y,
    Both,
}

#[derive(Args)]
struct SetArgs {
    #[arg(long, value_enum, default_value_t = AxisArg::Both)]
    axis: AxisArg,

    /// natural, linear, power or sigmoid
    #[arg(long)]
    family: Option<String>,

    /// Base sensitivity (K)
    #[arg(long)]
    base: Option<f64>,

    /// Target sensitivity (L)
    #[arg(long)]
    target: Option<f64>,

    /// Offset speed (N)
    #[arg(long)]
    offset: Option<f64>,

    /// Target speed (M)
    #[arg(long)]
    target_speed: Option<f64>,

    #[arg(long)]
    exponent: Option<f64>,

    #[arg(long)]
    limit: Option<bool>,

    #[arg(long)]
    mirror: Option<bool>,

    #[arg(long)]
    gain: Option<bool>,

    #[arg(long)]
    sync_curves: Option<bool>,

    #[arg(long)]
    sync_settings: Option<bool>,

    /// Raw counts per full turn
    #[arg(long)]
    counts: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { preset, stdin } => cmd_run(preset.as_deref(), stdin),
        Commands::Curve {
            preset,
            kind,
            steps,
        } => cmd_curve(preset.as_deref(), &kind, steps),
        Commands::Preset { action } => cmd_preset(action),
        Commands::Simulate {
            preset,
            delta,
            interval_us,
            flushes,
            axis,
        } => cmd_simulate(preset.as_deref(), delta, interval_us, flushes, axis),
        Commands::Status => cmd_status(),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_preset(path: Option<&Path>) -> anyhow::Result<Preset> {
    match path {
        Some(p) => Preset::load_from(p).with_context(|| format!("loading preset {p:?}")),
        None => Ok(Preset::load_last()),
    }
}

fn cmd_run(preset_path: Option<&Path>, use_stdin: bool) -> anyhow::Result<()> {
    println!("GyroGravity v{VERSION}");
    println!();

    let mut preset = load_preset(preset_path)?;
    let profile = EngineProfile::from_preset(&preset).context("preset is not valid")?;
    let handle = ProfileHandle::new(profile);

    let stats = Arc::new(MotionStats::new());

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let mut stdin_collector = None;
    let mut native_collector = None;
    if use_stdin || !NATIVE_CAPTURE {
        if !use_stdin {
            tracing::warn!("No native capture on this platform, reading motion from stdin");
        }
        let mut collector = ChannelCollector::new();
        let engine = MotionEngine::new(handle.clone(), platform_injector(), stats.clone());
        collector.start(engine)?;
        spawn_stdin_reader(collector.sender(), running.clone());
        stdin_collector = Some(collector);
    } else {
        let mut collector = Collector::new();
        let engine = MotionEngine::new(handle.clone(), platform_injector(), stats.clone());
        collector.start(engine)?;
        native_collector = Some(collector);
    }

    println!(
        "Curves: X {} / Y {}",
        handle.load().x.family(),
        handle.load().y.family()
    );
    println!("Press Ctrl+C to stop");
    println!();

    // Poll the settings file so `gyrogravity preset set` can edit a running engine.
    let watch_path = preset_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Preset::last_settings_path);
    let mut last_modified = modified_time(&watch_path);
    let mut last_check = Instant::now();

    let mut last_shown = None;
    while running.load(Ordering::SeqCst) {
        if last_check.elapsed() >= Duration::from_secs(1) {
            let modified = modified_time(&watch_path);
            if modified != last_modified {
                last_modified = modified;
                match Preset::load_from(&watch_path) {
                    Ok(updated) => {
                        if handle.commit(&updated).is_ok() {
                            println!("Settings reloaded from {watch_path:?}");
                            preset = updated;
                        }
                    }
                    Err(e) => tracing::warn!("Could not reload settings: {e}"),
                }
            }
            last_check = Instant::now();
        }

        let lines = stats.display_lines();
        if last_shown.as_ref() != Some(&lines) {
            println!("{}  |  {}", lines.0, lines.1);
            last_shown = Some(lines);
        }
        thread::sleep(DISPLAY_INTERVAL);
    }

    println!();
    println!("Stopping...");
    if let Some(mut c) = stdin_collector {
        c.stop();
    }
    if let Some(mut c) = native_collector {
        c.stop();
    }

    if let Err(e) = preset.save_last() {
        eprintln!("Warning: Could not save last settings: {e}");
    }

    println!();
    println!("{}", stats.summary());
    Ok(())
}

fn modified_time(path: &Path) -> Option<std::time::SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Feed `dx dy [origin]` lines from stdin to the collector.
fn spawn_stdin_reader(
    sender: crossbeam_channel::Sender<RawMotionEvent>,
    running: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_motion_line(&line) {
                Some(event) => {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => tracing::warn!(line = %line, "Ignoring malformed motion line"),
            }
        }
        running.store(false, Ordering::SeqCst);
    });
}

fn parse_motion_line(line: &str) -> Option<RawMotionEvent> {
    let mut parts = line.split_whitespace();
    let dx = parts.next()?.parse().ok()?;
    let dy = parts.next()?.parse().ok()?;
    let origin = match parts.next() {
        Some(tag) => {
            let tag = tag.trim_start_matches("0x");
            u64::from_str_radix(tag, 16).ok()?
        }
        None => 0,
    };
    Some(RawMotionEvent { dx, dy, origin })
}

fn cmd_curve(preset_path: Option<&Path>, kind: &str, steps: usize) -> anyhow::Result<()> {
    let Some(kind) = SeriesKind::parse(kind) else {
        bail!("unknown curve kind {kind:?} (expected sensitivity, jolt or velocity)");
    };
    let preset = load_preset(preset_path)?;
    let profile = EngineProfile::from_preset(&preset).context("preset is not valid")?;

    let range = sample_range(&profile.x, &profile.y);
    let x = sample(&profile.x, kind, range, steps);
    let y = sample(&profile.y, kind, range, steps);

    println!("speed,x,y");
    for (&(v, sx), &(_, sy)) in x.points.iter().zip(&y.points) {
        println!("{v:.6},{sx:.6},{sy:.6}");
    }
    Ok(())
}

fn cmd_preset(action: PresetAction) -> anyhow::Result<()> {
    match action {
        PresetAction::Show => {
            let preset = load_preset(None)?;
            println!("{}", preset.to_json()?);
        }
        PresetAction::Reset => {
            Preset::default().save_last()?;
            println!("Settings reset to defaults.");
        }
        PresetAction::Import { file } => {
            let preset = load_preset(Some(&file))?;
            EngineProfile::from_preset(&preset).context("preset is not valid")?;
            preset.save_last()?;
            println!("Imported {file:?}");
        }
        PresetAction::Export { file } => {
            let preset = load_preset(None)?;
            preset.save_to(&file)?;
            println!("Exported to {file:?}");
        }
        PresetAction::Set(args) => {
            let mut preset = load_preset(None)?;
            apply_set(&mut preset, &args)?;
            EngineProfile::from_preset(&preset).context("new settings are not valid")?;
            preset.save_last()?;
            println!("{}", preset.to_json()?);
        }
    }
    Ok(())
}

fn apply_set(preset: &mut Preset, args: &SetArgs) -> anyhow::Result<()> {
    let family = match args.family.as_deref() {
        Some(name) => match CurveFamily::parse(name) {
            Some(f) => Some(f),
            None => bail!("unknown curve family {name:?}"),
        },
        None => None,
    };

    let edit = |axis: &mut AxisSettings| {
        if let Some(f) = family {
            if f != axis.curve_type {
                axis.select_family(f);
            }
        }
        if let Some(v) = args.base {
            axis.base_sensitivity = v;
        }
        if let Some(v) = args.target {
            axis.target_sensitivity = v;
        }
        if let Some(v) = args.offset {
            axis.offset = v;
        }
        if let Some(v) = args.target_speed {
            axis.target_speed = v;
        }
        if let Some(v) = args.exponent {
            axis.exponent = v;
        }
        if let Some(v) = args.limit {
            axis.enable_limit = v;
        }
        if let Some(v) = args.mirror {
            axis.mirror_sense = v;
        }
        if let Some(v) = args.gain {
            axis.use_gain = v;
        }
    };

    if args.axis != AxisArg::Y {
        edit(&mut preset.x_settings);
    }
    if args.axis != AxisArg::X {
        edit(&mut preset.y_settings);
    }
    if let Some(v) = args.sync_curves {
        preset.sync_curves = v;
    }
    if let Some(v) = args.sync_settings {
        preset.sync_settings = v;
    }
    if let Some(v) = args.counts {
        preset.counts_per_turn = v;
    }
    Ok(())
}

fn cmd_simulate(
    preset_path: Option<&Path>,
    delta: i32,
    interval_us: u64,
    flushes: usize,
    axis: AxisArg,
) -> anyhow::Result<()> {
    if interval_us == 0 {
        bail!("--interval-us must be positive");
    }
    if delta == 0 {
        bail!("--delta must be non-zero");
    }
    let preset = load_preset(preset_path)?;
    let profile = EngineProfile::from_preset(&preset).context("preset is not valid")?;

    let (dx, dy) = match axis {
        AxisArg::X => (delta, 0),
        AxisArg::Y => (0, delta),
        AxisArg::Both => (delta, delta),
    };

    // Virtual clock: no sleeping, the accumulator only sees timestamps
    let start = Instant::now();
    let step = Duration::from_micros(interval_us);
    let mut acc = MotionAccumulator::new(start);
    let mut now = start;
    let mut done = 0;
    let mut raw = (0i64, 0i64);
    let mut emitted = (0i64, 0i64);
    let mut ideal = (0f64, 0f64);
    let mut last_multiplier = (0.0, 0.0);

    while done < flushes {
        now += step;
        if let Some(flush) = acc.push(dx, dy, now, || Arc::new(profile.clone())) {
            raw.0 += i64::from(flush.raw.0);
            raw.1 += i64::from(flush.raw.1);
            emitted.0 += i64::from(flush.adjusted.0);
            emitted.1 += i64::from(flush.adjusted.1);
            ideal.0 += f64::from(flush.raw.0) * flush.multiplier.0;
            ideal.1 += f64::from(flush.raw.1) * flush.multiplier.1;
            last_multiplier = flush.multiplier;
            done += 1;
        }
    }

    let secs = (now - start).as_secs_f64();
    println!("Simulated {:.3} s, {done} windows", secs);
    for (name, axis, r, e, i, m) in [
        ("X", Axis::X, raw.0, emitted.0, ideal.0, last_multiplier.0),
        ("Y", Axis::Y, raw.1, emitted.1, ideal.1, last_multiplier.1),
    ] {
        let rem = acc.axis(axis).remainder();
        println!(
            "  {name}: raw {r}, emitted {e}, ideal {i:.3}, drift {:.3}, multiplier {m:.4}, remainder {rem:.3}",
            e as f64 - i
        );
    }
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    println!("GyroGravity Status");
    println!("==================");
    println!();

    println!(
        "Native capture: {}",
        if NATIVE_CAPTURE {
            "available"
        } else {
            "not available (use `run --stdin`)"
        }
    );
    println!("Last settings: {:?}", Preset::last_settings_path());
    println!();

    let preset = load_preset(None)?;
    let (x, y) = preset.effective_axes();
    println!("Preset:");
    println!("  Counts per turn: {}", preset.counts_per_turn);
    println!(
        "  Sync curves: {}, sync settings: {}",
        preset.sync_curves, preset.sync_settings
    );
    for (name, s) in [("X", &x), ("Y", &y)] {
        let (lo, hi) = s.recommended_limit_range();
        println!(
            "  {name}: {} K={} L={} N={} M={} gain={}",
            s.curve_type,
            s.base_sensitivity,
            s.target_sensitivity,
            s.offset,
            s.target_speed,
            s.use_gain
        );
        if s.curve_type.uses_exponent() {
            println!("     exponent={}", s.exponent);
        }
        if s.curve_type.uses_limit() {
            println!(
                "     limit={} (recommended target range {lo}..{hi})",
                s.enable_limit
            );
        }
    }
    match EngineProfile::from_preset(&preset) {
        Ok(_) => println!("  Valid: yes"),
        Err(e) => println!("  Valid: no ({e})"),
    }
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_motion_line() {
        assert_eq!(parse_motion_line("3 -4"), Some(RawMotionEvent::new(3, -4)));
        assert_eq!(
            parse_motion_line("1 1 0xDEADBEEF"),
            Some(RawMotionEvent::synthetic(1, 1))
        );
        assert_eq!(parse_motion_line("x 1"), None);
        assert_eq!(parse_motion_line("5"), None);
    }

    #[test]
    fn test_set_family_change_resets_gain() {
        let mut preset = Preset::default();
        let args = SetArgs {
            axis: AxisArg::X,
            family: Some("power".into()),
            base: None,
            target: None,
            offset: None,
            target_speed: None,
            exponent: Some(2.0),
            limit: None,
            mirror: None,
            gain: None,
            sync_curves: None,
            sync_settings: None,
            counts: None,
        };
        apply_set(&mut preset, &args).unwrap();
        assert_eq!(preset.x_settings.curve_type, CurveFamily::Power);
        assert!(!preset.x_settings.use_gain);
        assert_eq!(preset.x_settings.exponent, 2.0);
        assert_eq!(preset.y_settings.curve_type, CurveFamily::Natural);
    }

    #[test]
    fn test_simulate_rejects_zero_delta() {
        let err = cmd_simulate(None, 0, 250, 3, AxisArg::X).unwrap_err();
        assert!(err.to_string().contains("--delta"));
    }

    #[test]
    fn test_simulate_rejects_zero_interval() {
        assert!(cmd_simulate(None, 1, 0, 3, AxisArg::X).is_err());
    }
}
