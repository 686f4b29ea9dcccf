//! Engine configuration: physical constants for the vehicle and grid settings for the planner.
//!
//! Everything is fixed at construction time. Defaults describe a small consumer quadcopter
//! on a 3S LiPo pack flying inside a 400 m wide planning cube.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;

/// Vehicle and environment constants used by the power model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// m/s^2
    pub gravity: f64,
    /// kg/m^3 at sea level
    pub air_density: f64,
    /// kg
    pub mass_kg: f64,
    /// m
    pub rotor_diameter_m: f64,
    pub drag_coefficient: f64,
    /// Horizontal cruise speed used for every horizontal leg (m/s)
    pub max_speed_mps: f64,
    /// Vertical speed used for takeoff, landing and vertical legs (m/s)
    pub max_climb_rate_mps: f64,
    pub battery_capacity_mah: f64,
    pub voltage_v: f64,
    /// Floor applied to the hover power estimate (W)
    pub idle_power_w: f64,
    /// Ceiling applied to climb and cruise power (W)
    pub max_power_w: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            air_density: 1.225,
            mass_kg: 1.2,
            rotor_diameter_m: 0.25,
            drag_coefficient: 0.5,
            max_speed_mps: 20.0,
            max_climb_rate_mps: 3.0,
            battery_capacity_mah: 2250.0,
            voltage_v: 11.55,
            idle_power_w: 20.0,
            max_power_w: 100.0,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("gravity", self.gravity)?;
        require_positive("air_density", self.air_density)?;
        require_positive("mass_kg", self.mass_kg)?;
        require_positive("rotor_diameter_m", self.rotor_diameter_m)?;
        require_finite("drag_coefficient", self.drag_coefficient)?;
        require_positive("max_speed_mps", self.max_speed_mps)?;
        require_positive("max_climb_rate_mps", self.max_climb_rate_mps)?;
        require_positive("battery_capacity_mah", self.battery_capacity_mah)?;
        require_positive("voltage_v", self.voltage_v)?;
        require_finite("idle_power_w", self.idle_power_w)?;
        require_finite("max_power_w", self.max_power_w)?;
        Ok(())
    }
}

/// Grid settings for the route planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Half-width of the searchable cube around the origin (m)
    pub grid_size_m: f64,
    /// Edge length of one grid cell (m)
    pub resolution_m: f64,
    /// Cross-product magnitude at or below which a waypoint counts as collinear
    pub simplify_tolerance: f64,
    /// Reject cells inside no-fly zones during the search. Off by default: zones are
    /// otherwise only reported by `is_obstacle`.
    pub respect_no_fly_zones: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            grid_size_m: 200.0,
            resolution_m: 5.0,
            simplify_tolerance: 0.1,
            respect_no_fly_zones: false,
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("grid_size_m", self.grid_size_m)?;
        require_positive("resolution_m", self.resolution_m)?;
        require_finite("simplify_tolerance", self.simplify_tolerance)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub planner: PlannerConfig,
}

impl EngineConfig {
    /// Defaults overridden by `FLIGHT_*` environment variables.
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let physics = PhysicsConfig::default();
        let planner = PlannerConfig::default();
        Self {
            physics: PhysicsConfig {
                mass_kg: env_f64("FLIGHT_MASS_KG", physics.mass_kg),
                max_speed_mps: env_f64("FLIGHT_MAX_SPEED_MPS", physics.max_speed_mps),
                max_climb_rate_mps: env_f64(
                    "FLIGHT_MAX_CLIMB_RATE_MPS",
                    physics.max_climb_rate_mps,
                ),
                battery_capacity_mah: env_f64(
                    "FLIGHT_BATTERY_CAPACITY_MAH",
                    physics.battery_capacity_mah,
                ),
                voltage_v: env_f64("FLIGHT_VOLTAGE_V", physics.voltage_v),
                ..physics
            },
            planner: PlannerConfig {
                grid_size_m: env_f64("FLIGHT_GRID_SIZE_M", planner.grid_size_m),
                resolution_m: env_f64("FLIGHT_GRID_RESOLUTION_M", planner.resolution_m),
                simplify_tolerance: env_f64(
                    "FLIGHT_SIMPLIFY_TOLERANCE",
                    planner.simplify_tolerance,
                ),
                respect_no_fly_zones: env::var("FLIGHT_RESPECT_NO_FLY_ZONES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(planner.respect_no_fly_zones),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.planner.validate()
    }
}

fn env_f64(var: &str, default: f64) -> f64 {
    env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn require_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.planner.grid_size_m, 200.0);
        assert_eq!(config.planner.resolution_m, 5.0);
        assert_eq!(config.physics.battery_capacity_mah, 2250.0);
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let config = PlannerConfig {
            resolution_m: 0.0,
            ..PlannerConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "resolution_m",
                value: 0.0
            })
        );
    }

    // Single test touching FLIGHT_* so parallel tests never race on the environment.
    #[test]
    fn env_overrides_defaults_and_ignores_garbage() {
        env::set_var("FLIGHT_GRID_RESOLUTION_M", "2.5");
        env::set_var("FLIGHT_MAX_SPEED_MPS", "fast");
        env::set_var("FLIGHT_RESPECT_NO_FLY_ZONES", "true");
        let config = EngineConfig::from_env();
        assert_eq!(config.planner.resolution_m, 2.5);
        assert_eq!(config.physics.max_speed_mps, 20.0);
        assert!(config.planner.respect_no_fly_zones);
        assert_eq!(config.planner.grid_size_m, 200.0);

        env::remove_var("FLIGHT_GRID_RESOLUTION_M");
        env::remove_var("FLIGHT_MAX_SPEED_MPS");
        env::remove_var("FLIGHT_RESPECT_NO_FLY_ZONES");
        assert_eq!(EngineConfig::from_env(), EngineConfig::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"planner": {"resolution_m": 2.5}}"#).unwrap();
        assert_eq!(config.planner.resolution_m, 2.5);
        assert_eq!(config.planner.grid_size_m, 200.0);
        assert_eq!(config.physics, PhysicsConfig::default());
    }
}
