use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use rust_arnav::config::NavConfig;
use rust_arnav::io::{Recording, load_anchors, load_destinations, load_waypoints};
use rust_arnav::planning::{PathPlanner, StraightLinePlanner};
use rust_arnav::session::{NavigationSession, PathRequest, SessionEvent};
use rust_arnav::viz::{LogSink, RenderSink};

fn init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rust_arnav=info".parse()?),
        )
        .init();
    Ok(())
}

#[cfg(feature = "rerun")]
fn make_sink(use_rerun: bool) -> Result<Box<dyn RenderSink>> {
    if use_rerun {
        return Ok(Box::new(rust_arnav::viz::rerun::RerunSink::spawn("rust-arnav")?));
    }
    Ok(Box::new(LogSink::new()))
}

#[cfg(not(feature = "rerun"))]
fn make_sink(use_rerun: bool) -> Result<Box<dyn RenderSink>> {
    if use_rerun {
        tracing::warn!("Built without the `rerun` feature; logging output instead");
    }
    Ok(Box::new(LogSink::new()))
}

fn main() -> Result<()> {
    init_logging()?;

    let mut args = std::env::args().skip(1);
    let root = PathBuf::from(args.next().unwrap_or_else(|| "data/demo".to_string()));
    let use_rerun = args.any(|a| a == "--rerun");

    println!("Loading recording from: {}", root.display());

    let config_path = root.join("config.yaml");
    let config = if config_path.exists() {
        NavConfig::load(&config_path)?
    } else {
        info!("No config.yaml, using defaults");
        NavConfig::default()
    };

    let anchors = load_anchors(root.join("anchors.yaml"))?;
    let destinations = load_destinations(root.join("destinations.csv"))?;

    let waypoints_path = root.join("waypoints.yaml");
    let planner: Box<dyn PathPlanner> = if waypoints_path.exists() {
        Box::new(load_waypoints(&waypoints_path)?)
    } else {
        info!("No waypoints.yaml, planning straight lines");
        Box::new(StraightLinePlanner)
    };

    let recording = Recording::load(&root).context("Failed to load recording")?;
    println!(
        "Loaded {} anchors, {} destinations, {} observer samples, {} marker samples, {} commands",
        anchors.len(),
        destinations.len(),
        recording.len(),
        recording.markers.len(),
        recording.commands.len()
    );

    let mut session = NavigationSession::new(config, anchors, destinations);
    let planner_tx = session.event_sender();
    let mut sink = make_sink(use_rerun)?;

    // Requests are answered on the following tick, like an async planner would.
    let mut in_flight: Option<PathRequest> = None;
    let mut previous_ts = None;

    for (i, sample) in recording.observer.iter().enumerate() {
        for event in recording.events_between(previous_ts, sample.timestamp_ns) {
            session.push(event);
        }
        if let Some(request) = in_flight.take() {
            let outcome = planner.plan(&request.start_local, &request.goal_local);
            planner_tx
                .send(SessionEvent::PathResult {
                    request: request.id,
                    outcome,
                })
                .context("Session event queue closed")?;
        }

        let output = session.tick(sample.timestamp_ns, &sample.position);
        sink.observer(&sample.position);
        sink.render(sample.timestamp_ns, &output);

        if output.status_changed {
            println!(
                "[{:8.2}s] {:?}: {}",
                sample.timestamp_ns as f64 * 1e-9,
                output.phase,
                output.status
            );
        }
        if let (Some(indicator), Some(remaining)) = (output.indicator, output.remaining_distance) {
            if i % 20 == 0 {
                println!(
                    "           indicator [{:.2}, {:.2}, {:.2}] | {:.1} m remaining",
                    indicator.translation.x, indicator.translation.y, indicator.translation.z, remaining
                );
            }
        }

        in_flight = output.path_request;
        previous_ts = Some(sample.timestamp_ns);
    }

    println!(
        "Done! Replayed {} ticks, final status: {}",
        recording.len(),
        session.status()
    );
    Ok(())
}
