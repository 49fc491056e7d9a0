//! Demonstration of the GyroGravity motion pipeline without a device.
//!
//! This example shows how to:
//! 1. Build a profile from a preset
//! 2. Start a channel-fed collector with a recording injector
//! 3. Stream raw motion through it, including an echo of our own output
//! 4. Inspect the injected motion and session statistics
//!
//! Run with: cargo run --example simulate_stream

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use gyrogravity::{
    collector::{ChannelCollector, RawMotionEvent, RecordingInjector},
    config::Preset,
    core::{EngineProfile, MotionEngine, ProfileHandle},
    curve::CurveFamily,
    diagnostics::MotionStats,
};

fn main() -> anyhow::Result<()> {
    println!("GyroGravity - Stream Demo");
    println!("=========================");
    println!();

    let mut preset = Preset::default();
    preset.x_settings.select_family(CurveFamily::Linear);
    let handle = ProfileHandle::new(EngineProfile::from_preset(&preset)?);

    let recorder = RecordingInjector::new();
    let stats = Arc::new(MotionStats::new());
    let engine = MotionEngine::new(handle.clone(), Box::new(recorder.clone()), stats.clone());

    let mut collector = ChannelCollector::new();
    collector.start(engine)?;
    let tx = collector.sender();

    println!("Streaming a slow then a fast stroke...");
    for (delta, pause_us) in [(1, 2_000), (6, 500)] {
        for _ in 0..200 {
            tx.send(RawMotionEvent::new(delta, 0))?;
            thread::sleep(Duration::from_micros(pause_us));
        }
        let (raw, adjusted) = stats.display_lines();
        println!("  {raw}  |  {adjusted}");
    }

    // Our own output coming back through the OS must be ignored
    tx.send(RawMotionEvent::synthetic(12, 0))?;

    println!();
    println!("Switching both axes to Sigmoid...");
    preset.x_settings.select_family(CurveFamily::Sigmoid);
    handle.commit(&preset)?;
    for _ in 0..200 {
        tx.send(RawMotionEvent::new(3, 3))?;
        thread::sleep(Duration::from_micros(500));
    }

    thread::sleep(Duration::from_millis(50));
    collector.stop();

    let (x, y) = recorder.total();
    println!();
    println!("Injected {} moves, total ({x}, {y})", recorder.moves().len());
    println!();
    println!("{}", stats.summary());
    Ok(())
}
