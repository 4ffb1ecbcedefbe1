//! Run command - drive the pose-sync loop against the simulated world.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use arbridge::scene::SearchIndicator;
use arbridge::sync::{PoseSyncLoop, SyncConfig, TickOutcome};
use arbridge::taps::{tap_queue, TapSender};
use arbridge::telemetry::SyncSnapshot;
use arbridge::tracking::DEFAULT_DISPLAY_SIZE;

use crate::error::CliError;
use crate::runner::CliRunner;
use crate::simulation::{synthetic_tap, SimulatedWorld};

/// Arguments for the run command.
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub ticks: Option<u64>,
    pub fps: Option<u32>,
    pub tap_interval_ms: Option<u64>,
    pub max_anchors: Option<usize>,
    pub json: bool,
}

/// Resolved run parameters: CLI first, then config file.
struct RunParams {
    sync: SyncConfig,
    ticks: u64,
    frame_interval: Duration,
    tap_interval: Duration,
    json: bool,
}

/// What a finished run looked like.
struct RunReport {
    ticks: u64,
    interrupted: bool,
    taps_offered: u64,
    snapshot: SyncSnapshot,
    anchors: Vec<String>,
    first_plane_found: bool,
    tracked_object: String,
    object_position: Option<[f32; 3]>,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref())?;
    runner.log_startup("run");
    let config = runner.config();

    let fps = args.fps.unwrap_or(config.simulation.frame_rate);
    if fps == 0 {
        return Err(CliError::Config("--fps must be at least 1".to_string()));
    }
    let mut sync = config.to_sync_config();
    if let Some(max_anchors) = args.max_anchors {
        if max_anchors == 0 {
            return Err(CliError::Config(
                "--max-anchors must be at least 1".to_string(),
            ));
        }
        sync = sync.with_max_anchors(max_anchors);
    }
    let params = RunParams {
        sync,
        ticks: args.ticks.unwrap_or(config.simulation.ticks),
        frame_interval: Duration::from_secs_f64(1.0 / f64::from(fps)),
        tap_interval: Duration::from_millis(
            args.tap_interval_ms
                .unwrap_or(config.simulation.tap_interval_ms)
                .max(1),
        ),
        json: args.json,
    };

    if !params.json {
        print_banner(&params, fps, &runner);
    }

    // Set up signal handler for graceful shutdown
    let shutdown = CancellationToken::new();
    let handler_token = shutdown.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start runtime: {}", e)))?;
    let report = runtime.block_on(simulate(params, shutdown));

    if args.json {
        let output = serde_json::to_string_pretty(&report.to_json())
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", output);
    } else {
        report.print_summary();
    }
    Ok(())
}

fn print_banner(params: &RunParams, fps: u32, runner: &CliRunner) {
    println!("arbridge pose-sync simulation v{}", arbridge::VERSION);
    println!("===================================");
    println!();
    println!("Config:       {}", runner.config_path().display());
    if params.ticks == 0 {
        println!("Ticks:        until interrupted");
    } else {
        println!("Ticks:        {}", params.ticks);
    }
    println!("Frame rate:   {} fps", fps);
    println!("Tap interval: {} ms", params.tap_interval.as_millis());
    println!(
        "Anchors:      up to {} ({})",
        params.sync.max_anchors, params.sync.tracked_object
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();
}

/// Render loop plus a tap-producer task sharing the tap queue.
async fn simulate(params: RunParams, shutdown: CancellationToken) -> RunReport {
    let world = SimulatedWorld::new(&params.sync.tracked_object);
    let tracked_object = params.sync.tracked_object.clone();
    let (taps, tap_rx) = tap_queue(params.sync.tap_queue_capacity);
    let indicator = Arc::new(SearchIndicator::shown());
    let mut sync = PoseSyncLoop::new(
        world.session.clone(),
        world.scene.clone(),
        tap_rx,
        indicator.clone(),
        params.sync,
    );

    let (width, height) = DEFAULT_DISPLAY_SIZE;
    if let Err(e) = sync.on_surface_changed(width, height) {
        warn!(width, height, error = %e, "Failed to set display geometry, continuing");
    }

    let stop_taps = shutdown.child_token();
    let producer = tokio::spawn(produce_taps(taps, params.tap_interval, stop_taps.clone()));

    let progress = progress_bar(params.ticks, params.json);
    let mut interval = tokio::time::interval(params.frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        world.advance(tick);
        let outcome = sync.on_render_tick();
        if let TickOutcome::Abandoned(err) = &outcome {
            debug!(tick, stage = %err.stage(), "Tick abandoned");
        }
        tick += 1;

        progress.inc(1);
        progress.set_message(format!(
            "{} anchor(s) | {}",
            sync.anchor_count(),
            if indicator.is_shown() {
                "searching for surfaces"
            } else {
                "surface found"
            }
        ));

        if params.ticks > 0 && tick >= params.ticks {
            break;
        }
    }
    let interrupted = shutdown.is_cancelled();
    stop_taps.cancel();
    progress.finish_and_clear();

    let taps_offered = match producer.await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Tap producer task failed");
            0
        }
    };
    info!(ticks = tick, interrupted, "Simulation finished");

    RunReport {
        ticks: tick,
        interrupted,
        taps_offered,
        snapshot: sync.snapshot(),
        anchors: sync.attachments().map(ToString::to_string).collect(),
        first_plane_found: sync.first_plane_found(),
        object_position: world
            .scene
            .object_position(&tracked_object)
            .map(|p| p.to_array()),
        tracked_object: tracked_object.to_string(),
    }
}

/// Offer a synthetic tap every `every` until stopped. Returns the number offered.
async fn produce_taps(taps: TapSender, every: Duration, stop: CancellationToken) -> u64 {
    let mut interval = tokio::time::interval(every);
    // The first tick completes immediately; skip it so taps start after one interval.
    interval.tick().await;

    let mut offered = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            _ = interval.tick() => {
                if !taps.offer(synthetic_tap(offered)) {
                    debug!(pending = taps.pending(), "Tap dropped, queue full");
                }
                offered += 1;
            }
        }
    }
    offered
}

fn progress_bar(ticks: u64, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let (bar, template) = if ticks > 0 {
        (
            ProgressBar::new(ticks),
            "{spinner} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks {msg}",
        )
    } else {
        (
            ProgressBar::new_spinner(),
            "{spinner} [{elapsed_precise}] {pos} ticks {msg}",
        )
    };
    bar.set_style(
        ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.enable_steady_tick(Duration::from_millis(200));
    bar
}

impl RunReport {
    fn to_json(&self) -> serde_json::Value {
        json!({
            "ticks": self.ticks,
            "interrupted": self.interrupted,
            "taps_offered": self.taps_offered,
            "first_plane_found": self.first_plane_found,
            "anchors": self.anchors,
            "tracked_object": {
                "id": self.tracked_object,
                "position": self.object_position,
            },
            "metrics": serde_json::to_value(&self.snapshot).unwrap_or_default(),
        })
    }

    fn print_summary(&self) {
        let s = &self.snapshot;
        println!();
        if self.interrupted {
            println!("{}", style("Simulation interrupted").yellow().bold());
        } else {
            println!("{}", style("Simulation complete").green().bold());
        }
        println!("───────────────────");
        println!(
            "  Ticks:    {} ({} rendered, {} not tracking, {} abandoned)",
            self.ticks, s.ticks_rendered, s.ticks_not_tracking, s.ticks_abandoned
        );
        println!(
            "  Taps:     {} offered, {} queued, {} dropped, {} missed, {} discarded",
            self.taps_offered, s.taps_enqueued, s.taps_dropped, s.taps_missed, s.taps_discarded
        );
        println!(
            "  Anchors:  {} placed, {} evicted, {} rolled back",
            s.anchors_created, s.anchors_evicted, s.anchors_rolled_back
        );
        let surface = if self.first_plane_found {
            style("found").green()
        } else {
            style("still searching").yellow()
        };
        println!("  Surface:  {}", surface);
        match (self.anchors.last(), self.object_position) {
            (Some(anchor), Some([x, y, z])) => println!(
                "  {}:    at ({:.2}, {:.2}, {:.2}) via {}",
                style(&self.tracked_object).cyan(),
                x,
                y,
                z,
                anchor
            ),
            _ => println!("  {}:    not placed", style(&self.tracked_object).cyan()),
        }
        if s.ticks_abandoned > 0 {
            println!(
                "  {}",
                style(format!(
                    "{:.1}% of ticks abandoned, see the log for details",
                    s.abandon_rate() * 100.0
                ))
                .red()
            );
        }
        println!(
            "  Rate:     {:.1} ticks/s over {:.1}s",
            s.ticks_per_second(),
            s.uptime_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_params(ticks: u64) -> RunParams {
        RunParams {
            sync: SyncConfig::default(),
            ticks,
            frame_interval: Duration::from_millis(1),
            tap_interval: Duration::from_millis(2),
            json: true,
        }
    }

    #[tokio::test]
    async fn test_simulate_runs_requested_ticks() {
        let report = simulate(fast_params(20), CancellationToken::new()).await;

        assert_eq!(report.ticks, 20);
        assert!(!report.interrupted);
        let s = &report.snapshot;
        assert_eq!(s.ticks_rendered + s.ticks_not_tracking + s.ticks_abandoned, 20);
        assert_eq!(report.tracked_object, "earth");
        assert!(report.anchors.len() <= 1);

        let json = report.to_json();
        assert_eq!(json["ticks"], 20);
        assert_eq!(json["metrics"]["ticks_rendered"], s.ticks_rendered);
    }

    #[tokio::test]
    async fn test_simulate_stops_on_shutdown() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let report = simulate(fast_params(0), shutdown).await;

        assert!(report.interrupted);
        assert_eq!(report.ticks, 0);
    }

    #[tokio::test]
    async fn test_produce_taps_until_stopped() {
        let (taps, mut tap_rx) = tap_queue(4);
        let stop = CancellationToken::new();
        let producer = tokio::spawn(produce_taps(
            taps.clone(),
            Duration::from_millis(1),
            stop.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(30)).await;
        stop.cancel();
        let offered = producer.await.unwrap();

        assert!(offered > 0);
        let counters = taps.counters();
        assert_eq!(counters.enqueued() + counters.dropped(), offered);
        assert!(tap_rx.drain().len() <= 4);
    }
}
