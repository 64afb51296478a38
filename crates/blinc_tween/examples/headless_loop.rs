//! Headless Tween Loop
//!
//! Drives a scheduler from a fixed-step loop, the way a host's frame clock
//! would, and prints what the tweens report:
//! - A delayed value tween with an ease curve
//! - A yoyo tween that counts its iterations
//! - A completion chain that starts a follow-up tween
//! - A faulting callback reported through the fault sink
//!
//! Run with: RUST_LOG=blinc_tween=trace cargo run -p blinc_tween --example headless_loop

use blinc_tween::{Ease, LoopKind, SchedulerConfig, TweenFault, TweenScheduler};
use tracing_subscriber::EnvFilter;

const FRAME: f32 = 1.0 / 30.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SchedulerConfig::default().with_initial_capacity(4);
    let scheduler = TweenScheduler::with_sink(config, |fault: TweenFault| {
        eprintln!("fault: {fault}");
    });
    let handle = scheduler.handle();

    scheduler
        .value(0.0, 320.0, 0.5, |x| println!("slide x = {x:.1}"))
        .ease(Ease::OutBack)
        .delay(0.2)
        .on_start(|| println!("slide started"))
        .then(move || {
            handle
                .value(1.0, 0.0, 0.3, |a| println!("fade alpha = {a:.2}"))
                .map(|fade| fade.ease(Ease::InQuad))
                .map(|_| ())
        });

    scheduler
        .create_silent(0.25)
        .loops(4, LoopKind::Yoyo)
        .on_step_complete(|| println!("pulse bounced"))
        .on_complete(|| println!("pulse done"));

    scheduler.create(0.1, |_| -> anyhow::Result<()> {
        anyhow::bail!("target was destroyed")
    });

    let mut frames = 0;
    while scheduler.has_active_tweens() {
        scheduler.tick(FRAME);
        frames += 1;
    }

    println!(
        "all tweens finished after {frames} frames (pool capacity {})",
        scheduler.capacity()
    );
}
