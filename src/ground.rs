//! Ground probing for foot placement.
//!
//! A ray is cast straight down from just above the hip. On a hit the foot
//! goes to the hit point and lines up with the surface; on a miss the leg
//! hangs fully extended under the hip and the foot keeps the body's
//! orientation.
//!
//! The collision world is reached through [`RaycastOracle`], so the probe
//! runs the same against avian3d or a test double.

use bevy::prelude::*;

use crate::ik::{Pose, look_rotation};

/// Collision layer bitmask the probe is allowed to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroundLayers(pub u32);

impl GroundLayers {
    /// Hits every layer.
    pub const ALL: GroundLayers = GroundLayers(u32::MAX);
    /// Hits nothing.
    pub const NONE: GroundLayers = GroundLayers(0);
    /// The first layer, where colliders live unless told otherwise.
    pub const DEFAULT: GroundLayers = GroundLayers(1);
    /// Layer the playable robot's own body collider is put on, so leg and
    /// ground rays starting inside the body do not hit it.
    pub const ROBOT_BODY: GroundLayers = GroundLayers(1 << 1);

    /// Whether the two masks share at least one layer.
    pub fn intersects(&self, other: GroundLayers) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for GroundLayers {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A ray hit reported by a [`RaycastOracle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Synchronous ray query against the collision world.
pub trait RaycastOracle {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
        layers: GroundLayers,
    ) -> Option<GroundHit>;
}

/// Where a foot should go this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootTarget {
    pub pose: Pose,
    pub ray_origin: Vec3,
    pub grounded: bool,
}

/// Downward ray probe that turns a hip position into a [`FootTarget`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    /// Height above the hip the ray starts at, also added to its length.
    pub margin: f32,
    pub layers: GroundLayers,
    /// Foot orientation relative to the body in the rig's rest pose.
    pub rest_offset: Quat,
}

impl Default for GroundProbe {
    fn default() -> Self {
        Self {
            margin: 0.5,
            layers: GroundLayers::DEFAULT,
            rest_offset: Quat::IDENTITY,
        }
    }
}

impl GroundProbe {
    /// Creates a probe with a half-unit margin on the default layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ray's start height above the hip.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    /// Sets the layers the ray may hit.
    pub fn with_layers(mut self, layers: GroundLayers) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_rest_offset(mut self, rest_offset: Quat) -> Self {
        self.rest_offset = rest_offset.normalize();
        self
    }

    /// Captures the rest offset from the body and foot rotations as they
    /// are in the unposed rig.
    pub fn capture_rest_offset(mut self, body: Quat, foot: Quat) -> Self {
        self.rest_offset = (body.inverse() * foot).normalize();
        self
    }

    /// Finds the foot target for a leg of `leg_length` hanging from `hip`,
    /// on a body whose orientation is `body`.
    pub fn probe(
        &self,
        hip: Vec3,
        leg_length: f32,
        body: Quat,
        oracle: &impl RaycastOracle,
    ) -> FootTarget {
        let origin = hip + Vec3::Y * self.margin;
        let max_distance = leg_length + self.margin;

        if let Some(hit) = oracle.raycast(origin, Dir3::NEG_Y, max_distance, self.layers) {
            let forward = body * Vec3::NEG_Z;
            let along_surface = forward.reject_from(hit.normal);
            let rotation = look_rotation(along_surface, hit.normal)
                .map(|ground| ground * self.rest_offset)
                .unwrap_or(body * self.rest_offset);
            return FootTarget {
                pose: Pose::new(hit.point, rotation),
                ray_origin: origin,
                grounded: true,
            };
        }

        FootTarget {
            pose: Pose::new(origin + Vec3::NEG_Y * leg_length, body * self.rest_offset),
            ray_origin: origin,
            grounded: false,
        }
    }
}
