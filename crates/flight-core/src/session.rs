//! A single simulated flight: one physics model and one planner owned together.
//!
//! This is the surface a command dispatcher drives. It adds the checks a pilot would make
//! before issuing a command (airborne? enough charge?) and replays planned routes through the
//! physics model leg by leg.

use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::models::{RoutePlan, StepCost, Telemetry};
use crate::physics::FlightPhysics;
use crate::planner::PathPlanner;
use crate::spatial::{distance, Point3};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Commands are refused below this charge level.
pub const CRITICAL_BATTERY_PERCENT: f64 = 5.0;

/// Outcome of one leg flown by the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegReport {
    pub from: Point3,
    pub to: Point3,
    pub distance_m: f64,
    pub cost: StepCost,
    pub battery_percentage: f64,
}

/// Result of flying a planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteReport {
    pub plan: RoutePlan,
    pub legs: Vec<LegReport>,
    pub total_time_s: f64,
    pub total_energy_wh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub item: String,
    pub location: String,
    pub position: Point3,
}

#[derive(Debug, Clone)]
pub struct FlightSession {
    physics: FlightPhysics,
    planner: PathPlanner,
    payload: Option<String>,
    deliveries: Vec<Delivery>,
}

impl Default for FlightSession {
    fn default() -> Self {
        Self::new(FlightPhysics::default(), PathPlanner::default())
    }
}

impl FlightSession {
    pub fn new(physics: FlightPhysics, planner: PathPlanner) -> Self {
        Self {
            physics,
            planner,
            payload: None,
            deliveries: Vec::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            FlightPhysics::new(config.physics.clone()),
            PathPlanner::new(config.planner.clone()),
        )
    }

    pub fn physics(&self) -> &FlightPhysics {
        &self.physics
    }

    pub fn planner(&self) -> &PathPlanner {
        &self.planner
    }

    pub fn position(&self) -> Point3 {
        self.physics.position()
    }

    pub fn telemetry(&self) -> Telemetry {
        self.physics.telemetry()
    }

    fn ensure_charge(&self) -> Result<(), SessionError> {
        let percentage = self.physics.battery_percentage();
        if percentage < CRITICAL_BATTERY_PERCENT {
            warn!("Command refused, battery at {:.1}%", percentage);
            return Err(SessionError::BatteryCritical { percentage });
        }
        Ok(())
    }

    fn ensure_flying(&self) -> Result<(), SessionError> {
        if !self.physics.is_flying() {
            warn!("Command refused, drone is on the ground");
            return Err(SessionError::NotFlying);
        }
        Ok(())
    }

    /// Take off to `height`. Already airborne is not an error and costs nothing.
    pub fn takeoff(&mut self, height: f64) -> Result<StepCost, SessionError> {
        self.ensure_charge()?;
        Ok(self.physics.takeoff(height))
    }

    pub fn land(&mut self) -> StepCost {
        self.physics.land()
    }

    pub fn recharge(&mut self, percentage: f64) {
        self.physics.recharge(percentage);
    }

    pub fn set_wind(&mut self, speed_mps: f64, direction_deg: f64) {
        self.physics.set_wind(speed_mps, direction_deg);
    }

    /// Fly to an absolute position in one leg.
    pub fn move_to(&mut self, x: f64, y: f64, z: f64) -> Result<LegReport, SessionError> {
        self.ensure_flying()?;
        self.ensure_charge()?;

        let from = self.physics.position();
        let cost = self.physics.move_by(x - from.0, y - from.1, z - from.2);
        let to = self.physics.position();
        Ok(LegReport {
            from,
            to,
            distance_m: distance(from, to),
            cost,
            battery_percentage: self.physics.battery_percentage(),
        })
    }

    fn move_relative(&mut self, dx: f64, dy: f64, dz: f64) -> Result<LegReport, SessionError> {
        let (x, y, z) = self.physics.position();
        self.move_to(x + dx, y + dy, z + dz)
    }

    /// +X
    pub fn move_forward(&mut self, distance_m: f64) -> Result<LegReport, SessionError> {
        self.move_relative(distance_m, 0.0, 0.0)
    }

    /// -X
    pub fn move_backward(&mut self, distance_m: f64) -> Result<LegReport, SessionError> {
        self.move_relative(-distance_m, 0.0, 0.0)
    }

    /// +Y
    pub fn move_right(&mut self, distance_m: f64) -> Result<LegReport, SessionError> {
        self.move_relative(0.0, distance_m, 0.0)
    }

    /// -Y
    pub fn move_left(&mut self, distance_m: f64) -> Result<LegReport, SessionError> {
        self.move_relative(0.0, -distance_m, 0.0)
    }

    pub fn move_up(&mut self, distance_m: f64) -> Result<LegReport, SessionError> {
        self.move_relative(0.0, 0.0, distance_m)
    }

    /// Descend, stopping at ground level.
    pub fn move_down(&mut self, distance_m: f64) -> Result<LegReport, SessionError> {
        let (x, y, z) = self.physics.position();
        self.move_to(x, y, (z - distance_m).max(0.0))
    }

    /// Fly back over the origin at the current altitude, then land.
    pub fn return_to_home(&mut self) -> Result<StepCost, SessionError> {
        let (_, _, z) = self.physics.position();
        let leg = self.move_to(0.0, 0.0, z)?;
        let landing = self.physics.land();
        Ok(StepCost {
            time_s: leg.cost.time_s + landing.time_s,
            energy_wh: leg.cost.energy_wh + landing.energy_wh,
        })
    }

    pub fn add_obstacle(&mut self, x: f64, y: f64, z: f64, radius_m: f64) {
        self.planner.add_obstacle(x, y, z, radius_m);
    }

    pub fn add_no_fly_zone(
        &mut self,
        min_x: f64,
        max_x: f64,
        min_y: f64,
        max_y: f64,
        min_z: f64,
        max_z: f64,
    ) {
        self.planner
            .add_no_fly_zone(min_x, max_x, min_y, max_y, min_z, max_z);
    }

    /// Plan from the current position without moving.
    pub fn plan_path_to(&self, x: f64, y: f64, z: f64) -> RoutePlan {
        self.planner.plan_route(self.physics.position(), (x, y, z))
    }

    /// Plan from the current position, fly the interior waypoints, then finish on the exact
    /// goal.
    ///
    /// Planned waypoints sit on cell corners, so the first one is replaced by the current
    /// position and the last by `(x, y, z)`. An unreachable goal still yields the direct
    /// fallback leg; check `plan.outcome` before relying on obstacle clearance. A refused leg
    /// aborts the remaining route.
    pub fn fly_route_to(&mut self, x: f64, y: f64, z: f64) -> Result<RouteReport, SessionError> {
        self.ensure_flying()?;
        let plan = self.plan_path_to(x, y, z);
        if !plan.is_found() {
            warn!("Flying direct fallback route to ({}, {}, {})", x, y, z);
        }

        let interior = match plan.waypoints.len() {
            0..=2 => &[][..],
            n => &plan.waypoints[1..n - 1],
        };
        let mut legs = Vec::with_capacity(interior.len() + 1);
        for &(wx, wy, wz) in interior {
            legs.push(self.move_to(wx, wy, wz)?);
        }
        legs.push(self.move_to(x, y, z)?);

        let total_time_s: f64 = legs.iter().map(|leg| leg.cost.time_s).sum();
        let total_energy_wh: f64 = legs.iter().map(|leg| leg.cost.energy_wh).sum();
        info!(
            "Route to ({}, {}, {}) flown: {} legs, {:.1}s, {:.2}Wh",
            x,
            y,
            z,
            legs.len(),
            total_time_s,
            total_energy_wh
        );
        Ok(RouteReport {
            plan,
            legs,
            total_time_s,
            total_energy_wh,
        })
    }

    /// Name of the loaded payload, if any.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Load (or replace) the payload.
    pub fn load_payload(&mut self, item: impl Into<String>) {
        let item = item.into();
        info!("Payload '{}' loaded", item);
        self.payload = Some(item);
    }

    /// Release the payload at the current position and log it under `location`.
    pub fn drop_payload(&mut self, location: impl Into<String>) -> Result<Delivery, SessionError> {
        let item = self.payload.take().ok_or(SessionError::NoPayload)?;
        let delivery = Delivery {
            item,
            location: location.into(),
            position: self.physics.position(),
        };
        info!(
            "Payload '{}' dropped at {} {:?}",
            delivery.item, delivery.location, delivery.position
        );
        self.deliveries.push(delivery.clone());
        Ok(delivery)
    }

    /// Fly straight to `(x, y, z)` and drop the payload there.
    pub fn deliver_to(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        location: impl Into<String>,
    ) -> Result<Delivery, SessionError> {
        if self.payload.is_none() {
            return Err(SessionError::NoPayload);
        }
        self.move_to(x, y, z)?;
        self.drop_payload(location)
    }

    pub fn return_to_base_and_land(&mut self) -> Result<StepCost, SessionError> {
        self.return_to_home()
    }

    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }
}
