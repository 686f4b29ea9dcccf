//! Energy and kinematics model for a multirotor.
//!
//! Motions are costed as discrete events: every command jumps the vehicle to its target and
//! charges the time and energy a constant-rate transition would take. Nothing is integrated
//! continuously, so the same command sequence always yields the same costs.

use crate::config::PhysicsConfig;
use crate::models::{StepCost, Telemetry, VehicleState, Wind};
use crate::spatial::{norm, Point3};
use chrono::Utc;
use std::f64::consts::PI;
use tracing::{debug, info};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Owns the vehicle state and charges every motion against the battery.
///
/// Commands issued in the wrong state (moving or landing while on the ground, taking off
/// while airborne) are no-ops returning [`StepCost::ZERO`]. Low battery never refuses motion
/// here; callers decide what charge level is too low.
#[derive(Debug, Clone)]
pub struct FlightPhysics {
    config: PhysicsConfig,
    state: VehicleState,
    wind: Wind,
}

impl Default for FlightPhysics {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl FlightPhysics {
    pub fn new(config: PhysicsConfig) -> Self {
        let state = VehicleState::new(config.battery_capacity_mah);
        Self {
            config,
            state,
            wind: Wind::default(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn position(&self) -> Point3 {
        self.state.position
    }

    pub fn is_flying(&self) -> bool {
        self.state.is_flying
    }

    pub fn battery_percentage(&self) -> f64 {
        self.state.battery_percentage()
    }

    pub fn wind(&self) -> Wind {
        self.wind
    }

    /// Climb straight up from the ground to `target_height`.
    ///
    /// Charged at the mean of hover and full-rate climb power.
    pub fn takeoff(&mut self, target_height: f64) -> StepCost {
        if self.state.is_flying {
            debug!("takeoff ignored, already flying");
            return StepCost::ZERO;
        }

        let target_height = target_height.max(0.0);
        self.state.is_flying = true;
        self.state.flight_start_time = Some(Utc::now());

        let time_s = target_height / self.config.max_climb_rate_mps;
        let power_w =
            (self.hover_power() + self.climb_power(self.config.max_climb_rate_mps)) / 2.0;
        let energy_wh = power_w * time_s / SECONDS_PER_HOUR;

        self.state.position.2 = target_height;
        self.state.max_altitude = self.state.max_altitude.max(target_height);
        self.charge(time_s, energy_wh);

        info!(
            "Takeoff: {:.1}s, {:.2}Wh, battery {:.1}%",
            time_s,
            energy_wh,
            self.battery_percentage()
        );
        StepCost { time_s, energy_wh }
    }

    /// Displace the vehicle by `(dx, dy, dz)`.
    ///
    /// Any vertical component makes this a pure vertical leg for costing purposes, even when
    /// `dx`/`dy` are non-zero; otherwise the leg is flown at cruise speed. A descent is
    /// shortened so the vehicle stops at ground level.
    pub fn move_by(&mut self, dx: f64, dy: f64, dz: f64) -> StepCost {
        if !self.state.is_flying {
            debug!("move ignored, not flying");
            return StepCost::ZERO;
        }

        let dz = dz.max(-self.state.position.2);
        let (time_s, power_w) = if dz != 0.0 {
            let rate = self.config.max_climb_rate_mps.copysign(dz);
            (dz.abs() / self.config.max_climb_rate_mps, self.climb_power(rate))
        } else {
            let horizontal = (dx * dx + dy * dy).sqrt();
            (
                horizontal / self.config.max_speed_mps,
                self.cruise_power(self.config.max_speed_mps),
            )
        };
        let energy_wh = power_w * time_s / SECONDS_PER_HOUR;

        let delta = (dx, dy, dz);
        let position = &mut self.state.position;
        position.0 += dx;
        position.1 += dy;
        position.2 += dz;
        self.state.total_distance_traveled += norm(delta);
        self.state.max_altitude = self.state.max_altitude.max(self.state.position.2);

        if time_s > 0.0 {
            self.state.velocity = (dx / time_s, dy / time_s, dz / time_s);
        }
        self.state.max_speed_reached = self.state.max_speed_reached.max(norm(self.state.velocity));
        self.charge(time_s, energy_wh);

        debug!(
            "Move ({:.1}, {:.1}, {:.1}): {:.1}s, {:.3}Wh",
            dx, dy, dz, time_s, energy_wh
        );
        StepCost { time_s, energy_wh }
    }

    /// Descend to the ground at climb rate, charged at hover power.
    pub fn land(&mut self) -> StepCost {
        if !self.state.is_flying {
            debug!("land ignored, not flying");
            return StepCost::ZERO;
        }

        let time_s = self.state.position.2 / self.config.max_climb_rate_mps;
        let energy_wh = self.hover_power() * time_s / SECONDS_PER_HOUR;

        self.state.position.2 = 0.0;
        self.state.velocity = (0.0, 0.0, 0.0);
        self.state.is_flying = false;
        self.state.total_flight_time_s = self
            .state
            .flight_start_time
            .map(|start| (Utc::now() - start).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);
        self.charge(time_s, energy_wh);

        info!(
            "Landed: {:.1}s, {:.2}Wh, flight time {:.1}s",
            time_s, energy_wh, self.state.total_flight_time_s
        );
        StepCost { time_s, energy_wh }
    }

    /// Set the battery to `percentage` of capacity and clear every flight statistic.
    ///
    /// Position and flying state are left untouched.
    pub fn recharge(&mut self, percentage: f64) {
        let percentage = percentage.clamp(0.0, 100.0);
        let state = &mut self.state;
        state.battery_remaining_mah = percentage / 100.0 * state.battery_capacity_mah;
        state.energy_consumed_wh = 0.0;
        state.total_flight_time_s = 0.0;
        state.simulated_time_s = 0.0;
        state.total_distance_traveled = 0.0;
        state.max_speed_reached = 0.0;
        state.max_altitude = 0.0;
        info!("Battery recharged to {:.1}%", percentage);
    }

    pub fn set_wind(&mut self, speed_mps: f64, direction_deg: f64) {
        self.wind = Wind {
            speed_mps,
            direction_deg,
        };
        info!("Wind set to {} m/s at {} deg", speed_mps, direction_deg);
    }

    pub fn telemetry(&self) -> Telemetry {
        let state = &self.state;
        Telemetry {
            position: state.position,
            velocity: state.velocity,
            current_speed: norm(state.velocity),
            is_flying: state.is_flying,
            battery_percentage: state.battery_percentage(),
            battery_remaining_mah: state.battery_remaining_mah,
            flight_time_remaining_min: self.flight_time_remaining_min(),
            energy_consumed_wh: state.energy_consumed_wh,
            total_flight_time_s: state.total_flight_time_s,
            simulated_time_s: state.simulated_time_s,
            total_distance_m: state.total_distance_traveled,
            max_altitude_m: state.max_altitude,
            max_speed_m_s: state.max_speed_reached,
        }
    }

    /// Minutes of hover left on the remaining charge.
    pub fn flight_time_remaining_min(&self) -> f64 {
        if self.state.battery_remaining_mah <= 0.0 {
            return 0.0;
        }
        let remaining_wh = self.state.battery_remaining_mah * self.config.voltage_v / 1000.0;
        remaining_wh / self.hover_power() * 60.0
    }

    fn rotor_area(&self) -> f64 {
        PI * (self.config.rotor_diameter_m / 2.0).powi(2)
    }

    fn weight(&self) -> f64 {
        self.config.mass_kg * self.config.gravity
    }

    /// Power to hold position (W), floored at idle power.
    pub fn hover_power(&self) -> f64 {
        let induced_velocity =
            (self.weight() / (4.0 * self.config.air_density * self.rotor_area())).sqrt();
        self.config
            .idle_power_w
            .max(self.weight() * induced_velocity / 1000.0)
    }

    /// Power for a vertical transition at `climb_rate` m/s; the sign is ignored.
    pub fn climb_power(&self, climb_rate: f64) -> f64 {
        let climb = self.weight() * climb_rate.abs() / 1000.0;
        self.config.max_power_w.min(self.hover_power() + climb)
    }

    /// Power for level flight at `speed` m/s.
    pub fn cruise_power(&self, speed: f64) -> f64 {
        let drag = 0.5
            * self.config.air_density
            * self.config.drag_coefficient
            * self.rotor_area()
            * speed.powi(3)
            / 1000.0;
        self.config.max_power_w.min(self.hover_power() + drag)
    }

    fn charge(&mut self, time_s: f64, energy_wh: f64) {
        self.state.simulated_time_s += time_s;
        self.state.energy_consumed_wh += energy_wh;
        let consumed_mah = energy_wh * 1000.0 / self.config.voltage_v;
        self.state.battery_remaining_mah =
            (self.state.battery_remaining_mah - consumed_mah).max(0.0);
    }
}
