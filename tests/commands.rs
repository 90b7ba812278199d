use ring_traffic_sim::{
    config::SimulationConfig,
    Command, RoadEntity, Scheduler, SimError, TrafficFlow, VehicleId,
};
use anyhow::Result;

fn scheduler_with(count: usize, noise: bool) -> Result<Scheduler> {
    let mut config = SimulationConfig::default();
    config.vehicles.count = count;
    config.noise.enabled = noise;
    config.random.seed = Some(2024);
    Ok(Scheduler::new(config)?)
}

#[test]
fn test_vehicle_count_rebuilds_ring() -> Result<()> {
    let mut scheduler = scheduler_with(30, true)?;
    for _ in 0..60 {
        scheduler.frame();
    }
    scheduler.toggle_obstacle()?;
    scheduler.set_desired_speed(90.0)?;
    assert!(scheduler.time() > 9.9);

    scheduler.push(Command::SetVehicleCount(12));
    let report = scheduler.frame();
    assert!(report.rejected.is_empty());

    let state = scheduler.state();
    assert_eq!(state.vehicles.len(), 12);
    assert!(state.obstacles.is_empty());
    assert!(!scheduler.noise_enabled());
    assert_eq!(scheduler.autonomous_count(), 0);
    assert_eq!(scheduler.baseline().desired_speed, 180.0);
    // The frame that applied the rebuild then advanced one frame from zero.
    assert!((scheduler.time() - 10.0 / 60.0).abs() < 1e-9);

    for (i, car) in state.vehicles.iter().enumerate() {
        assert_eq!(car.id, VehicleId(i));
        assert_eq!(car.params().desired_speed, 180.0);
    }
    Ok(())
}

#[test]
fn test_zero_vehicles_rejected_through_queue() -> Result<()> {
    let mut scheduler = scheduler_with(8, false)?;
    scheduler.push(Command::SetVehicleCount(0));
    scheduler.push(Command::SetStepMultiplier(4));

    let report = scheduler.frame();
    assert_eq!(report.rejected, vec![(Command::SetVehicleCount(0), SimError::InvalidVehicleCount)]);
    assert_eq!(report.steps, 4);
    assert_eq!(scheduler.state().vehicles.len(), 8);
    Ok(())
}

#[test]
fn test_invalid_parameters_leave_ring_untouched() -> Result<()> {
    let mut scheduler = scheduler_with(10, false)?;
    let before: Vec<_> = scheduler.state().vehicles.iter().map(|c| *c.params()).collect();

    for bad in [
        Command::SetDesiredSpeed(-5.0),
        Command::SetDesiredSpeed(0.0),
        Command::SetTimeHeadway(-0.5),
        Command::SetMaxAccel(f64::NAN),
        Command::SetMaxAccel(0.0),
        Command::SetStepMultiplier(0),
    ] {
        let err = scheduler.apply(bad).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter { .. }), "{:?} gave {:?}", bad, err);
    }

    let after: Vec<_> = scheduler.state().vehicles.iter().map(|c| *c.params()).collect();
    assert_eq!(before, after);
    assert_eq!(scheduler.step_multiplier(), 10);
    Ok(())
}

#[test]
fn test_parameter_setters_reach_every_vehicle() -> Result<()> {
    let mut scheduler = scheduler_with(10, false)?;
    scheduler.apply(Command::SetDesiredSpeed(120.0))?;
    scheduler.apply(Command::SetTimeHeadway(0.0))?;
    scheduler.apply(Command::SetMaxAccel(6.0))?;

    for car in &scheduler.state().vehicles {
        assert_eq!(car.params().desired_speed, 120.0);
        assert_eq!(car.params().time_headway, 0.0);
        assert_eq!(car.params().max_accel, 6.0);
        assert!((car.sqrt_accel_decel() - 2.0 * (6.0f64 * 10.02).sqrt()).abs() < 1e-12);
    }

    let baseline = scheduler.baseline();
    assert_eq!((baseline.desired_speed, baseline.time_headway, baseline.max_accel), (120.0, 0.0, 6.0));
    Ok(())
}

#[test]
fn test_max_accel_keeps_noise_subtracted() -> Result<()> {
    let mut scheduler = scheduler_with(10, true)?;
    scheduler.set_max_accel(8.0)?;

    for car in &scheduler.state().vehicles {
        assert_eq!(car.core_params().max_accel, 8.0);
        assert_eq!(car.params().max_accel, 8.0 - car.noise());
    }

    // Noise in [0, 1) would leave some vehicle without acceleration.
    let err = scheduler.set_max_accel(0.05);
    if let Err(err) = err {
        assert!(matches!(err, SimError::DegenerateDynamics { .. }));
        assert!(scheduler.state().vehicles.iter().all(|c| c.core_params().max_accel == 8.0));
    }
    Ok(())
}

#[test]
fn test_noise_toggle_restores_parameters() -> Result<()> {
    let mut scheduler = scheduler_with(15, false)?;
    let before: Vec<_> = scheduler.state().vehicles.iter()
        .map(|c| (*c.params(), c.sqrt_accel_decel()))
        .collect();

    scheduler.push(Command::SetNoiseEnabled(true));
    scheduler.frame();
    assert!(scheduler.noise_enabled());
    assert!(scheduler.state().vehicles.iter().any(|c| c.noise() > 0.0));
    assert!(scheduler.view().noise_enabled);

    scheduler.push(Command::SetNoiseEnabled(false));
    scheduler.frame();
    assert!(!scheduler.noise_enabled());
    for (car, (params, sqrt_ab)) in scheduler.state().vehicles.iter().zip(before) {
        assert_eq!(*car.params(), params);
        assert_eq!(car.sqrt_accel_decel().to_bits(), sqrt_ab.to_bits());
    }
    Ok(())
}

#[test]
fn test_autonomous_count_reprofiles_ring() -> Result<()> {
    let mut scheduler = scheduler_with(20, true)?;
    scheduler.apply(Command::SetAutonomousCount(5))?;

    assert_eq!(scheduler.autonomous_count(), 5);
    assert!(!scheduler.noise_enabled());

    let state = scheduler.state();
    assert_eq!(state.autonomous_ids().len(), 5);
    for car in &state.vehicles {
        assert_eq!(car.noise(), 0.0);
        if car.is_autonomous() {
            assert_eq!(car.params().max_accel, 22.8);
            assert_eq!(car.params().time_headway, 0.6);
            assert_eq!(car.params().desired_speed, 12.0);
        } else {
            assert_eq!(*car.params(), scheduler.config().vehicles.human);
        }
    }

    let view = scheduler.view();
    assert_eq!(view.autonomous_count, 5);
    assert_eq!(view.vehicles.iter().filter(|v| v.autonomous).count(), 5);

    let err = scheduler.apply(Command::SetAutonomousCount(21)).unwrap_err();
    assert_eq!(err, SimError::TooManyAutonomous { requested: 21, available: 20 });
    assert_eq!(scheduler.autonomous_count(), 5);

    scheduler.apply(Command::SetAutonomousCount(0))?;
    assert!(scheduler.state().vehicles.iter().all(|c| !c.is_autonomous()));
    Ok(())
}

#[test]
fn test_obstacle_toggle() -> Result<()> {
    let mut scheduler = scheduler_with(10, false)?;
    for _ in 0..30 {
        scheduler.frame();
    }

    let leader_arc = scheduler.state().ring_leader().map(|c| c.arc_position()).unwrap_or_default();
    assert!(scheduler.toggle_obstacle()?);

    let state = scheduler.state();
    assert_eq!(state.obstacles.len(), 1);
    assert!((state.obstacles[0].arc_position() - (leader_arc + 60.0)).abs() < 1e-9);
    assert_eq!(scheduler.view().obstacles.len(), 1);

    scheduler.push(Command::ToggleObstacle);
    scheduler.frame();
    assert!(scheduler.state().obstacles.is_empty());
    assert!(scheduler.view().obstacles.is_empty());
    Ok(())
}

#[test]
fn test_slow_down_and_restore_leader() -> Result<()> {
    let mut scheduler = scheduler_with(10, false)?;

    let err = scheduler.apply(Command::RestoreLeader).unwrap_err();
    assert_eq!(err, SimError::NoLeaderRecorded);

    for _ in 0..30 {
        scheduler.frame();
    }
    let leader = scheduler.slow_down_leader()?;
    assert_eq!(scheduler.slowed_leader(), Some(leader));

    let car = scheduler.state().vehicle(leader).expect("slowed vehicle");
    assert_eq!(car.params().desired_speed, 180.0 / 20.0);
    assert_eq!(car.core_params().desired_speed, 180.0);

    // The same vehicle is restored even after the ring has moved on.
    for _ in 0..120 {
        scheduler.frame();
    }
    assert_eq!(scheduler.restore_leader()?, leader);
    let car = scheduler.state().vehicle(leader).expect("restored vehicle");
    assert_eq!(car.params().desired_speed, 180.0);
    Ok(())
}

#[test]
fn test_reset_and_stop() -> Result<()> {
    let mut scheduler = scheduler_with(10, true)?;
    for _ in 0..400 {
        scheduler.frame();
    }
    assert!(scheduler.traffic_flow().value().is_some());
    scheduler.toggle_obstacle()?;

    scheduler.push(Command::ResetSimulation);
    scheduler.frame();
    assert!(scheduler.time() < 1.0);
    assert!(scheduler.state().obstacles.is_empty());
    assert!(!scheduler.noise_enabled());
    assert!(matches!(scheduler.traffic_flow(), TrafficFlow::WarmingUp { .. }));

    scheduler.push(Command::Stop);
    let time = scheduler.time();
    let report = scheduler.frame();
    assert_eq!(report.steps, 0);
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.time(), time);

    scheduler.frame();
    assert_eq!(scheduler.time(), time);
    Ok(())
}

#[test]
fn test_recorder_captures_frames() -> Result<()> {
    let mut scheduler = scheduler_with(4, false)?;
    scheduler.recorder_mut().set_enabled(true);
    for _ in 0..5 {
        scheduler.frame();
    }

    let rows = scheduler.recorder().speed_rows();
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|row| row.len() == 5));
    assert!((rows[4][0] - scheduler.time()).abs() < 1e-12);

    let position = scheduler.recorder().position_rows();
    let metres = scheduler.state().vehicles[0].arc_position() / 6.0;
    assert!((position[4][1] - metres).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_reset_lifts_leader_slow_down() -> Result<()> {
    let mut scheduler = scheduler_with(10, false)?;
    for _ in 0..30 {
        scheduler.frame();
    }
    let leader = scheduler.slow_down_leader()?;

    scheduler.apply(Command::ResetSimulation)?;
    assert_eq!(scheduler.slowed_leader(), None);
    let car = scheduler.state().vehicle(leader).expect("slowed vehicle");
    assert_eq!(car.params().desired_speed, car.core_params().desired_speed);

    let err = scheduler.apply(Command::RestoreLeader).unwrap_err();
    assert_eq!(err, SimError::NoLeaderRecorded);
    Ok(())
}
