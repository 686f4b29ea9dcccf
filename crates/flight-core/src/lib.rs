pub mod config;
pub mod error;
pub mod models;
pub mod physics;
pub mod planner;
pub mod session;
pub mod spatial;

pub use config::{EngineConfig, PhysicsConfig, PlannerConfig};
pub use error::{ConfigError, SessionError};
pub use models::{
    NoFlyZone, Obstacle, PlanOutcome, RoutePlan, StepCost, Telemetry, VehicleState, Wind,
};
pub use physics::FlightPhysics;
pub use planner::{simplify_path, Cell, PathPlanner};
pub use session::{Delivery, FlightSession, LegReport, RouteReport, CRITICAL_BATTERY_PERCENT};
pub use spatial::{distance, path_length, Point3};
