//! End-to-end missions: plan a route, replay it through the physics model, read telemetry.

use flight_core::{
    EngineConfig, FlightPhysics, FlightSession, PathPlanner, PlanOutcome, PlannerConfig,
    SessionError,
};

#[test]
fn planned_route_replays_through_physics() {
    let mut planner = PathPlanner::default();
    planner.add_obstacle(50.0, 0.0, 20.0, 10.0);
    let mut physics = FlightPhysics::default();

    physics.takeoff(20.0);
    let waypoints = planner.plan_path(physics.position(), (100.0, 0.0, 20.0));
    assert!(waypoints.len() > 2);

    let mut last_battery = physics.state().battery_remaining_mah;
    for window in waypoints.windows(2) {
        let (from, to) = (window[0], window[1]);
        let cost = physics.move_by(to.0 - from.0, to.1 - from.1, to.2 - from.2);
        assert!(cost.time_s > 0.0);
        let battery = physics.state().battery_remaining_mah;
        assert!(battery < last_battery);
        last_battery = battery;
    }

    let end = physics.position();
    assert!((end.0 - 100.0).abs() < 1e-9);
    assert!(end.1.abs() < 1e-9);
    assert!((end.2 - 20.0).abs() < 1e-9);
    assert!(physics.telemetry().total_distance_m > 100.0);
}

#[test]
fn session_flies_around_obstacle() {
    let mut session = FlightSession::default();
    session.add_obstacle(50.0, 0.0, 30.0, 10.0);
    session.takeoff(30.0).unwrap();

    let report = session.fly_route_to(100.0, 0.0, 30.0).unwrap();
    assert_eq!(report.plan.outcome, PlanOutcome::Found);
    assert_eq!(report.legs.len(), report.plan.waypoints.len() - 1);
    assert_eq!(session.position(), (100.0, 0.0, 30.0));

    let leg_energy: f64 = report.legs.iter().map(|leg| leg.cost.energy_wh).sum();
    assert!((report.total_energy_wh - leg_energy).abs() < 1e-12);
    for leg in &report.legs {
        let (x, y, z) = leg.to;
        assert!(!session.planner().is_obstacle(x, y, z));
    }

    let telemetry = session.telemetry();
    assert!(telemetry.is_flying);
    assert!(telemetry.battery_percentage < 100.0);
    assert!(telemetry.total_distance_m >= report.plan.length_m - 1e-9);
}

#[test]
fn route_ends_on_exact_goal_off_the_grid() {
    let mut session = FlightSession::default();
    session.takeoff(31.0).unwrap();

    let report = session.fly_route_to(102.0, 3.0, 31.0).unwrap();
    assert_eq!(report.plan.outcome, PlanOutcome::Found);
    assert_eq!(session.position(), (102.0, 3.0, 31.0));

    // Level flight: cruise legs only, no climb or descent.
    let flown: f64 = report.legs.iter().map(|leg| leg.distance_m).sum();
    let direct = (102.0f64 * 102.0 + 3.0 * 3.0).sqrt();
    assert!((flown - direct).abs() < 1e-9);
    assert!((report.total_time_s - direct / 20.0).abs() < 1e-9);

    session.load_payload("parcel");
    let delivery = session.drop_payload("porch").unwrap();
    assert_eq!(delivery.position, (102.0, 3.0, 31.0));
}

#[test]
fn unreachable_route_still_flies_direct_line() {
    let config = EngineConfig {
        planner: PlannerConfig {
            grid_size_m: 50.0,
            ..PlannerConfig::default()
        },
        ..EngineConfig::default()
    };
    let mut session = FlightSession::from_config(&config);
    session.takeoff(10.0).unwrap();

    let report = session.fly_route_to(120.0, 0.0, 10.0).unwrap();
    assert_eq!(report.plan.outcome, PlanOutcome::Unreachable);
    assert_eq!(
        report.plan.waypoints,
        vec![(0.0, 0.0, 10.0), (120.0, 0.0, 10.0)]
    );
    assert_eq!(report.legs.len(), 1);
    assert_eq!(session.position(), (120.0, 0.0, 10.0));
}

#[test]
fn route_requires_takeoff() {
    let mut session = FlightSession::default();
    assert_eq!(
        session.fly_route_to(50.0, 0.0, 0.0).unwrap_err(),
        SessionError::NotFlying
    );
}

#[test]
fn recharge_clears_history_between_missions() {
    let mut session = FlightSession::default();
    session.takeoff(25.0).unwrap();
    session.move_forward(200.0).unwrap();
    session.return_to_home().unwrap();
    assert!(session.telemetry().energy_consumed_wh > 0.0);

    session.recharge(100.0);
    let telemetry = session.telemetry();
    assert_eq!(telemetry.energy_consumed_wh, 0.0);
    assert_eq!(telemetry.total_distance_m, 0.0);
    assert_eq!(telemetry.max_altitude_m, 0.0);
    assert_eq!(telemetry.battery_percentage, 100.0);
    assert!(!telemetry.is_flying);
}
