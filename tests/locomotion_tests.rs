use bevy::prelude::*;
use bevy_mechforge::locomotion::{BodyState, GroundContact, MoveIntent};
use bevy_mechforge::*;

fn camera() -> Transform {
    // Looking down -Z, the default camera heading.
    Transform::from_xyz(0.0, 2.0, 5.0)
}

fn at_rest() -> BodyState {
    BodyState {
        velocity: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    }
}

fn flat_ground() -> GroundContact {
    GroundContact::from_hit(
        Some(GroundHit {
            point: Vec3::ZERO,
            normal: Vec3::Y,
            distance: 1.0,
        }),
        45.0,
    )
}

#[test]
fn test_forward_input_accelerates_towards_camera_forward() {
    let controller = RobotController::default();
    let intent = MoveIntent::new(Vec2::Y, &camera());
    let dt = 1.0 / 60.0;

    let step = controller.step(&at_rest(), &intent, &flat_ground(), dt);

    let expected = Vec3::NEG_Z * controller.config.acceleration * dt;
    assert!((step.velocity - expected).length() < 1e-4);
}

#[test]
fn test_velocity_settles_at_move_speed() {
    let controller = RobotController::default();
    let intent = MoveIntent::new(Vec2::new(1.0, 0.0), &camera());
    let mut body = at_rest();

    for _ in 0..120 {
        let step = controller.step(&body, &intent, &flat_ground(), 1.0 / 60.0);
        body.velocity = step.velocity;
        body.rotation = step.rotation;
    }

    assert!((body.velocity - Vec3::X * controller.config.move_speed).length() < 1e-3);
    // Turned to face the strafe direction.
    assert!((body.rotation * Vec3::NEG_Z - Vec3::X).length() < 0.05);
}

#[test]
fn test_no_input_brakes_and_keeps_heading() {
    let controller = RobotController::default();
    let intent = MoveIntent::new(Vec2::ZERO, &camera());
    let body = BodyState {
        velocity: Vec3::new(2.0, 0.0, 0.0),
        rotation: Quat::from_rotation_y(0.5),
    };

    let step = controller.step(&body, &intent, &flat_ground(), 0.1);

    assert_eq!(step.velocity, Vec3::ZERO);
    assert_eq!(step.rotation, body.rotation);
    assert!((step.acceleration - Vec3::NEG_Y * controller.config.ground_stick_force).length() < 1e-5);
}

#[test]
fn test_airborne_keeps_vertical_velocity_and_falls() {
    let controller = RobotController::default();
    let intent = MoveIntent::new(Vec2::Y, &camera());
    let body = BodyState {
        velocity: Vec3::new(0.0, -3.0, 0.0),
        rotation: Quat::IDENTITY,
    };
    let dt = 1.0 / 60.0;

    let step = controller.step(&body, &intent, &GroundContact::AIRBORNE, dt);

    assert!((step.velocity.y + 3.0).abs() < 1e-5);
    let air_control = controller.config.acceleration * 0.5 * dt;
    assert!((step.velocity.z + air_control).abs() < 1e-4);
    assert_eq!(step.acceleration, Vec3::NEG_Y * controller.config.gravity_force);
}

#[test]
fn test_steep_slope_is_not_ground() {
    let wall = GroundHit {
        point: Vec3::ZERO,
        normal: Vec3::new(1.0, 0.5, 0.0),
        distance: 0.5,
    };
    assert!(!GroundContact::from_hit(Some(wall), 45.0).grounded);
    assert!(GroundContact::from_hit(Some(wall), 70.0).grounded);
    assert!(!GroundContact::from_hit(None, 45.0).grounded);
}

#[test]
fn test_slope_velocity_follows_surface() {
    let controller = RobotController::default();
    let normal = Vec3::new(0.0, 1.0, 0.3).normalize();
    let contact = GroundContact::from_hit(
        Some(GroundHit {
            point: Vec3::ZERO,
            normal,
            distance: 1.0,
        }),
        45.0,
    );
    let intent = MoveIntent::new(Vec2::Y, &camera());

    let target = controller.target_velocity(&intent, &contact);
    assert!(target.dot(normal).abs() < 1e-4);
    assert!((target.length() - controller.config.move_speed).abs() < 1e-4);
}

#[test]
fn test_ground_check_distance() {
    let config = LocomotionConfig::default();
    assert!((config.ground_check_distance(2.0) - 1.1).abs() < 1e-6);
    assert_eq!(config.with_max_slope_degrees(120.0).max_slope_degrees, 90.0);
}
