//! Flight simulator - replay a scenario or plan a single route.
//!
//! Usage:
//!   cargo run -p flight-cli --bin flight-sim -- --scenario demos/delivery.json
//!   cargo run -p flight-cli --bin flight-sim -- --plan 100,0,20 --from 0,0,20 --json

use anyhow::{Context, Result};
use clap::Parser;
use flight_cli::{parse_point, run_scenario, Scenario};
use flight_core::{EngineConfig, PathPlanner, Point3};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Deterministic drone flight and route planning simulator")]
struct Args {
    /// Scenario file (JSON) with config, obstacles, no-fly zones and commands
    #[arg(long, conflicts_with = "plan")]
    scenario: Option<PathBuf>,

    /// Plan a route to x,y,z instead of running a scenario
    #[arg(long, value_parser = parse_point)]
    plan: Option<Point3>,

    /// Route start for --plan
    #[arg(long, value_parser = parse_point, default_value = "0,0,0")]
    from: Point3,

    /// Print machine-readable JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let json_logs = args.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_logs = (!args.log_json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(json_logs)
        .with(text_logs)
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flight_core=info".parse()?)
                .add_directive("flight_cli=info".parse()?)
                .add_directive("flight_sim=info".parse()?),
        )
        .init();

    if let Some(goal) = args.plan {
        let config = EngineConfig::from_env();
        config.validate()?;
        return plan_only(config, args.from, goal, args.json);
    }

    let scenario = match &args.scenario {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading scenario {}", path.display()))?;
            serde_json::from_str::<Scenario>(&raw)
                .with_context(|| format!("parsing scenario {}", path.display()))?
        }
        None => Scenario {
            config: EngineConfig::from_env(),
            ..Scenario::default()
        },
    };
    scenario.config.validate()?;

    tracing::info!(
        "Running scenario: {} commands, {} obstacles, {} no-fly zones",
        scenario.commands.len(),
        scenario.obstacles.len(),
        scenario.no_fly_zones.len()
    );
    let mut session = scenario.build_session();
    let records = run_scenario(&mut session, &scenario.commands);
    let telemetry = session.telemetry();

    if args.json {
        let report = serde_json::json!({
            "steps": records,
            "deliveries": session.deliveries(),
            "telemetry": telemetry,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let refused = records
        .iter()
        .filter(|record| matches!(record.outcome, flight_cli::CommandOutcome::Refused { .. }))
        .count();
    println!("Commands: {} ({} refused)", records.len(), refused);
    println!("Status: {}", if telemetry.is_flying { "FLYING" } else { "LANDED" });
    println!(
        "Position: X={:.1}m, Y={:.1}m, Z={:.1}m",
        telemetry.position.0, telemetry.position.1, telemetry.position.2
    );
    println!(
        "Battery: {:.1}% ({:.0} mAh), {:.1} min remaining",
        telemetry.battery_percentage,
        telemetry.battery_remaining_mah,
        telemetry.flight_time_remaining_min
    );
    println!("Energy consumed: {:.2} Wh", telemetry.energy_consumed_wh);
    println!(
        "Distance: {:.1} m, max altitude {:.1} m, max speed {:.2} m/s",
        telemetry.total_distance_m, telemetry.max_altitude_m, telemetry.max_speed_m_s
    );
    for delivery in session.deliveries() {
        let (x, y, z) = delivery.position;
        println!(
            "Delivered '{}' at {} ({:.1}, {:.1}, {:.1})",
            delivery.item, delivery.location, x, y, z
        );
    }
    Ok(())
}

fn plan_only(config: EngineConfig, start: Point3, goal: Point3, json: bool) -> Result<()> {
    let planner = PathPlanner::new(config.planner);
    let plan = planner.plan_route(start, goal);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!(
        "Route {:?}: {} waypoints, {:.1} m, {} nodes visited",
        plan.outcome,
        plan.waypoints.len(),
        plan.length_m,
        plan.nodes_visited
    );
    for (i, (x, y, z)) in plan.waypoints.iter().enumerate() {
        println!("  {:>3}: ({:.1}, {:.1}, {:.1})", i, x, y, z);
    }
    Ok(())
}
