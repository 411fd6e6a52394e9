//! Physics-driven walking controller.
//!
//! The controller does not touch the physics engine. Each fixed step it
//! takes the body's current velocity and rotation plus a ground probe
//! result and returns the new velocity, the new rotation and the extra
//! acceleration to integrate. The `physics` feature wires this to avian3d.

use bevy::prelude::*;

use crate::ground::GroundHit;
use crate::ik::look_rotation;

/// Tuning for [`RobotController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionConfig {
    pub move_speed: f32,
    pub rotation_speed: f32,
    pub acceleration: f32,
    /// Downward acceleration while airborne.
    pub gravity_force: f32,
    /// Steeper ground counts as a wall and leaves the body airborne.
    pub max_slope_degrees: f32,
    /// Extra ray length below the body for the ground check.
    pub ground_check_margin: f32,
    /// Acceleration into the ground while grounded, keeps the body glued to
    /// slopes.
    pub ground_stick_force: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            rotation_speed: 15.0,
            acceleration: 60.0,
            gravity_force: 20.0,
            max_slope_degrees: 45.0,
            ground_check_margin: 0.1,
            ground_stick_force: 10.0,
        }
    }
}

impl LocomotionConfig {
    /// Sets the top speed along the ground.
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed.max(0.0);
        self
    }

    /// Sets how fast the body reaches its target velocity.
    pub fn with_acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = acceleration.max(0.0);
        self
    }

    /// Sets the steepest walkable slope, clamped to [0, 90] degrees.
    pub fn with_max_slope_degrees(mut self, degrees: f32) -> Self {
        self.max_slope_degrees = degrees.clamp(0.0, 90.0);
        self
    }

    /// Ground check ray length for a body of `height`.
    pub fn ground_check_distance(&self, height: f32) -> f32 {
        height * 0.5 + self.ground_check_margin
    }
}

/// Result of the ground check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    pub grounded: bool,
    pub normal: Vec3,
}

impl GroundContact {
    /// No ground below, world up as the normal.
    pub const AIRBORNE: GroundContact = GroundContact {
        grounded: false,
        normal: Vec3::Y,
    };

    /// Grounded only on walkable slopes.
    pub fn from_hit(hit: Option<GroundHit>, max_slope_degrees: f32) -> Self {
        let Some(hit) = hit else {
            return Self::AIRBORNE;
        };
        let Some(normal) = hit.normal.try_normalize() else {
            return Self::AIRBORNE;
        };
        if normal.angle_between(Vec3::Y).to_degrees() > max_slope_degrees {
            return Self::AIRBORNE;
        }
        Self {
            grounded: true,
            normal,
        }
    }
}

/// Movement input in camera space. `axis.x` strafes right, `axis.y` moves
/// forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveIntent {
    pub axis: Vec2,
    pub camera_forward: Vec3,
    pub camera_right: Vec3,
}

impl MoveIntent {
    /// Reads the camera's basis for `axis`.
    pub fn new(axis: Vec2, camera: &Transform) -> Self {
        Self {
            axis: axis.normalize_or_zero(),
            camera_forward: *camera.forward(),
            camera_right: *camera.right(),
        }
    }

    /// Input direction on the horizontal plane (not normalised).
    pub fn planar_direction(&self) -> Vec3 {
        let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        flat(self.camera_forward) * self.axis.y + flat(self.camera_right) * self.axis.x
    }
}

/// Body velocity and rotation at the start of a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub velocity: Vec3,
    pub rotation: Quat,
}

/// What the body should become after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionStep {
    pub velocity: Vec3,
    pub rotation: Quat,
    /// Gravity or ground-stick acceleration, to be integrated by the caller.
    pub acceleration: Vec3,
}

/// Walking controller for the playable robot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RobotController {
    pub config: LocomotionConfig,
}

impl RobotController {
    /// Creates a controller with the given tuning.
    pub fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    /// Velocity the body wants to reach, along the ground plane.
    pub fn target_velocity(&self, intent: &MoveIntent, contact: &GroundContact) -> Vec3 {
        let along_ground = intent
            .planar_direction()
            .reject_from(contact.normal)
            .normalize_or_zero();
        along_ground * self.config.move_speed
    }

    /// Advances the body by `dt`. Velocity eases towards the input and the
    /// body turns to face where the input points.
    pub fn step(
        &self,
        body: &BodyState,
        intent: &MoveIntent,
        contact: &GroundContact,
        dt: f32,
    ) -> LocomotionStep {
        let target = self.target_velocity(intent, contact);

        let velocity = if contact.grounded {
            body.velocity
                .move_towards(target, self.config.acceleration * dt)
        } else {
            // Half the control in the air, and gravity owns the vertical.
            let air_target = Vec3::new(target.x, body.velocity.y, target.z);
            body.velocity
                .move_towards(air_target, self.config.acceleration * 0.5 * dt)
        };

        let mut rotation = body.rotation;
        if intent.axis.length_squared() > 0.01 {
            let look = intent.camera_forward * intent.axis.y + intent.camera_right * intent.axis.x;
            let look = Vec3::new(look.x, 0.0, look.z);
            if let Some(wanted) = look_rotation(look, Vec3::Y) {
                let t = (self.config.rotation_speed * dt).clamp(0.0, 1.0);
                rotation = body.rotation.slerp(wanted, t);
            }
        }

        let acceleration = if contact.grounded {
            -contact.normal * self.config.ground_stick_force
        } else {
            Vec3::NEG_Y * self.config.gravity_force
        };

        LocomotionStep {
            velocity,
            rotation,
            acceleration,
        }
    }
}
