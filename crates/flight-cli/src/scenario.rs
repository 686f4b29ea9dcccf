//! Scenario file format and replay.

use flight_core::{
    Delivery, EngineConfig, FlightSession, LegReport, NoFlyZone, Obstacle, Point3, RoutePlan,
    RouteReport, SessionError, StepCost, Telemetry,
};
use serde::{Deserialize, Serialize};

fn default_obstacle_radius() -> f64 {
    10.0
}

fn default_recharge_percentage() -> f64 {
    100.0
}

fn default_item() -> String {
    "package".to_string()
}

fn default_drop_location() -> String {
    "current location".to_string()
}

fn default_delivery_location() -> String {
    "delivery point".to_string()
}

/// One command, tagged by name: `{"command": "move_to", "x": 10, "y": 0, "z": 15}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScenarioCommand {
    Takeoff {
        height: f64,
    },
    MoveTo {
        x: f64,
        y: f64,
        z: f64,
    },
    MoveForward {
        distance: f64,
    },
    MoveBackward {
        distance: f64,
    },
    MoveRight {
        distance: f64,
    },
    MoveLeft {
        distance: f64,
    },
    MoveUp {
        distance: f64,
    },
    MoveDown {
        distance: f64,
    },
    ReturnToHome,
    Land,
    PlanPathTo {
        x: f64,
        y: f64,
        z: f64,
    },
    FlyRouteTo {
        x: f64,
        y: f64,
        z: f64,
    },
    AddObstacle {
        x: f64,
        y: f64,
        z: f64,
        #[serde(default = "default_obstacle_radius")]
        radius: f64,
    },
    AddNoFlyZone {
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
    },
    Recharge {
        #[serde(default = "default_recharge_percentage")]
        percentage: f64,
    },
    SetWind {
        speed: f64,
        #[serde(default)]
        direction: f64,
    },
    LoadPayload {
        #[serde(default = "default_item")]
        item: String,
    },
    DropPayload {
        #[serde(default = "default_drop_location")]
        location: String,
    },
    DeliverTo {
        x: f64,
        y: f64,
        z: f64,
        #[serde(default = "default_delivery_location")]
        location: String,
    },
    ReturnToBaseAndLand,
    Telemetry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: EngineConfig,
    pub obstacles: Vec<Obstacle>,
    pub no_fly_zones: Vec<NoFlyZone>,
    pub commands: Vec<ScenarioCommand>,
}

impl Scenario {
    /// Session built from the scenario config with every obstacle and zone registered.
    pub fn build_session(&self) -> FlightSession {
        let mut session = FlightSession::from_config(&self.config);
        for obstacle in &self.obstacles {
            let (x, y, z) = obstacle.center;
            session.add_obstacle(x, y, z, obstacle.radius_m);
        }
        for zone in &self.no_fly_zones {
            session.add_no_fly_zone(
                zone.min_x, zone.max_x, zone.min_y, zone.max_y, zone.min_z, zone.max_z,
            );
        }
        session
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    Cost(StepCost),
    Leg(LegReport),
    Plan(RoutePlan),
    Route(RouteReport),
    Delivery(Delivery),
    Telemetry(Telemetry),
    Done,
    Refused { reason: String },
}

impl From<SessionError> for CommandOutcome {
    fn from(err: SessionError) -> Self {
        CommandOutcome::Refused {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub command: ScenarioCommand,
    pub outcome: CommandOutcome,
}

fn outcome<T>(
    result: Result<T, SessionError>,
    wrap: fn(T) -> CommandOutcome,
) -> CommandOutcome {
    match result {
        Ok(value) => wrap(value),
        Err(err) => err.into(),
    }
}

/// Apply one command. Refusals are reported, never propagated.
pub fn execute(session: &mut FlightSession, command: &ScenarioCommand) -> CommandOutcome {
    use ScenarioCommand as C;

    match command {
        C::Takeoff { height } => outcome(session.takeoff(*height), CommandOutcome::Cost),
        C::MoveTo { x, y, z } => outcome(session.move_to(*x, *y, *z), CommandOutcome::Leg),
        C::MoveForward { distance } => {
            outcome(session.move_forward(*distance), CommandOutcome::Leg)
        }
        C::MoveBackward { distance } => {
            outcome(session.move_backward(*distance), CommandOutcome::Leg)
        }
        C::MoveRight { distance } => outcome(session.move_right(*distance), CommandOutcome::Leg),
        C::MoveLeft { distance } => outcome(session.move_left(*distance), CommandOutcome::Leg),
        C::MoveUp { distance } => outcome(session.move_up(*distance), CommandOutcome::Leg),
        C::MoveDown { distance } => outcome(session.move_down(*distance), CommandOutcome::Leg),
        C::ReturnToHome => outcome(session.return_to_home(), CommandOutcome::Cost),
        C::Land => CommandOutcome::Cost(session.land()),
        C::PlanPathTo { x, y, z } => CommandOutcome::Plan(session.plan_path_to(*x, *y, *z)),
        C::FlyRouteTo { x, y, z } => {
            outcome(session.fly_route_to(*x, *y, *z), CommandOutcome::Route)
        }
        C::AddObstacle { x, y, z, radius } => {
            session.add_obstacle(*x, *y, *z, *radius);
            CommandOutcome::Done
        }
        C::AddNoFlyZone {
            min_x,
            max_x,
            min_y,
            max_y,
            min_z,
            max_z,
        } => {
            session.add_no_fly_zone(*min_x, *max_x, *min_y, *max_y, *min_z, *max_z);
            CommandOutcome::Done
        }
        C::Recharge { percentage } => {
            session.recharge(*percentage);
            CommandOutcome::Done
        }
        C::SetWind { speed, direction } => {
            session.set_wind(*speed, *direction);
            CommandOutcome::Done
        }
        C::LoadPayload { item } => {
            session.load_payload(item.clone());
            CommandOutcome::Done
        }
        C::DropPayload { location } => {
            outcome(session.drop_payload(location.clone()), CommandOutcome::Delivery)
        }
        C::DeliverTo { x, y, z, location } => outcome(
            session.deliver_to(*x, *y, *z, location.clone()),
            CommandOutcome::Delivery,
        ),
        C::ReturnToBaseAndLand => {
            outcome(session.return_to_base_and_land(), CommandOutcome::Cost)
        }
        C::Telemetry => CommandOutcome::Telemetry(session.telemetry()),
    }
}

/// Replay every command in order and record what happened.
pub fn run_scenario(
    session: &mut FlightSession,
    commands: &[ScenarioCommand],
) -> Vec<StepRecord> {
    commands
        .iter()
        .map(|command| {
            let outcome = execute(session, command);
            if let CommandOutcome::Refused { reason } = &outcome {
                tracing::warn!("{:?} refused: {}", command, reason);
            } else {
                tracing::info!("{:?} ok", command);
            }
            StepRecord {
                command: command.clone(),
                outcome,
            }
        })
        .collect()
}

/// Parse `x,y,z` into a point.
pub fn parse_point(s: &str) -> Result<Point3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got {s:?}"));
    }
    let mut values = [0.0; 3];
    for (value, part) in values.iter_mut().zip(&parts) {
        *value = part
            .parse()
            .map_err(|err| format!("invalid coordinate {part:?}: {err}"))?;
    }
    Ok((values[0], values[1], values[2]))
}
