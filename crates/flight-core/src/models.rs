//! Core data models shared by the physics model, planner and session.

use crate::spatial::Point3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time and energy charged for one commanded motion.
///
/// Refused commands (e.g. moving while landed) return `StepCost::ZERO`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepCost {
    pub time_s: f64,
    pub energy_wh: f64,
}

impl StepCost {
    pub const ZERO: StepCost = StepCost {
        time_s: 0.0,
        energy_wh: 0.0,
    };

    pub fn is_zero(&self) -> bool {
        self.time_s == 0.0 && self.energy_wh == 0.0
    }
}

/// Kinematic and energy state of the simulated vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Point3,
    /// Average velocity over the last move, for display only
    pub velocity: Point3,
    pub battery_capacity_mah: f64,
    pub battery_remaining_mah: f64,
    pub is_flying: bool,
    pub flight_start_time: Option<DateTime<Utc>>,
    /// Wall-clock time between the last takeoff and landing
    pub total_flight_time_s: f64,
    /// Sum of the simulated durations of every charged motion
    pub simulated_time_s: f64,
    pub energy_consumed_wh: f64,
    pub max_speed_reached: f64,
    pub max_altitude: f64,
    pub total_distance_traveled: f64,
}

impl VehicleState {
    /// Landed at the origin with a full battery.
    pub fn new(battery_capacity_mah: f64) -> Self {
        Self {
            position: (0.0, 0.0, 0.0),
            velocity: (0.0, 0.0, 0.0),
            battery_capacity_mah,
            battery_remaining_mah: battery_capacity_mah,
            is_flying: false,
            flight_start_time: None,
            total_flight_time_s: 0.0,
            simulated_time_s: 0.0,
            energy_consumed_wh: 0.0,
            max_speed_reached: 0.0,
            max_altitude: 0.0,
            total_distance_traveled: 0.0,
        }
    }

    pub fn battery_percentage(&self) -> f64 {
        self.battery_remaining_mah / self.battery_capacity_mah * 100.0
    }
}

/// Ambient wind. Recorded, but not part of any cost formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed_mps: f64,
    /// Bearing in degrees
    pub direction_deg: f64,
}

/// Read-only snapshot of the vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub position: Point3,
    pub velocity: Point3,
    pub current_speed: f64,
    pub is_flying: bool,
    pub battery_percentage: f64,
    pub battery_remaining_mah: f64,
    pub flight_time_remaining_min: f64,
    pub energy_consumed_wh: f64,
    pub total_flight_time_s: f64,
    pub simulated_time_s: f64,
    pub total_distance_m: f64,
    pub max_altitude_m: f64,
    pub max_speed_m_s: f64,
}

/// Spherical obstacle, rasterized into grid cells when added to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Point3,
    pub radius_m: f64,
}

/// Axis-aligned box where flight is disallowed. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoFlyZone {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl NoFlyZone {
    pub fn contains_point(&self, x: f64, y: f64, z: f64) -> bool {
        self.min_x <= x
            && x <= self.max_x
            && self.min_y <= y
            && y <= self.max_y
            && self.min_z <= z
            && z <= self.max_z
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanOutcome {
    /// Waypoints follow a searched, obstacle-free route.
    Found,
    /// No route exists; waypoints are the direct `[start, goal]` line and may cross obstacles.
    Unreachable,
}

/// Result of a planning query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub outcome: PlanOutcome,
    pub waypoints: Vec<Point3>,
    /// Cells expanded by the search
    pub nodes_visited: usize,
    pub length_m: f64,
}

impl RoutePlan {
    pub fn is_found(&self) -> bool {
        self.outcome == PlanOutcome::Found
    }
}
