//! Analytic two-bone leg IK.
//!
//! Solves a thigh/shin/foot chain in closed form with the law of cosines.
//! Rotations follow Bevy's convention: a bone looks down its local -Z with
//! +Y as up, and the authored correction offsets map that onto the rig's
//! rest pose.
//!
//! Targets beyond reach are pulled back just inside the chain's length, so
//! the solver never fails at runtime.

use bevy::prelude::*;

use crate::error::{BoneRole, IkError};

/// A world-space position and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    /// Creates a pose from a position and a rotation.
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

/// Euler angles in degrees, applied yaw (Y), then pitch (X), then roll (Z).
pub fn euler_degrees(angles: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        angles.y.to_radians(),
        angles.x.to_radians(),
        angles.z.to_radians(),
    )
}

/// Rotation whose forward (-Z) points along `forward` with +Y as close to
/// `up` as possible. `None` when `forward` has no direction.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let forward = Dir3::new(forward).ok()?;
    Some(Transform::IDENTITY.looking_to(forward, up).rotation)
}

/// A leg is mirrored when it, or its parent, has a negative X world scale.
/// That is how the assembler's left-side scale flip shows up here.
pub fn is_mirrored(world_scale: Vec3, parent_world_scale: Option<Vec3>) -> bool {
    world_scale.x < 0.0 || parent_world_scale.is_some_and(|s| s.x < 0.0)
}

/// Bone lengths of one leg, fixed for the chain's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegChain {
    thigh_length: f32,
    shin_length: f32,
}

impl LegChain {
    /// Creates a chain from bone lengths. Lengths must be finite and
    /// positive.
    pub fn new(thigh_length: f32, shin_length: f32) -> Result<Self, IkError> {
        let valid = |l: f32| l.is_finite() && l > f32::EPSILON;
        if !valid(thigh_length) || !valid(shin_length) {
            return Err(IkError::DegenerateChain);
        }
        Ok(Self {
            thigh_length,
            shin_length,
        })
    }

    /// Measures the chain from the bones' world positions. Every bone must
    /// be present.
    pub fn from_bones(
        thigh: Option<Vec3>,
        shin: Option<Vec3>,
        foot: Option<Vec3>,
    ) -> Result<Self, IkError> {
        let thigh = thigh.ok_or(IkError::MissingBone(BoneRole::Thigh))?;
        let shin = shin.ok_or(IkError::MissingBone(BoneRole::Shin))?;
        let foot = foot.ok_or(IkError::MissingBone(BoneRole::Foot))?;
        Self::new(thigh.distance(shin), shin.distance(foot))
    }

    /// Hip to knee distance.
    pub fn thigh_length(&self) -> f32 {
        self.thigh_length
    }

    /// Knee to ankle distance.
    pub fn shin_length(&self) -> f32 {
        self.shin_length
    }

    /// Full extension of the leg.
    pub fn total_length(&self) -> f32 {
        self.thigh_length + self.shin_length
    }
}

/// Per-side rig corrections. Offsets are Euler degrees applied in the
/// bone's local space after aiming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegSide {
    pub thigh_offset: Vec3,
    pub shin_offset: Vec3,
    pub foot_offset: Vec3,
    /// +1 or -1: which way the knee folds relative to the pole.
    pub knee_bend: f32,
}

impl LegSide {
    /// Corrections for an unmirrored (right) leg.
    pub fn right() -> Self {
        Self {
            thigh_offset: Vec3::new(0.0, 90.0, 0.0),
            shin_offset: Vec3::new(0.0, 90.0, 0.0),
            foot_offset: Vec3::ZERO,
            knee_bend: 1.0,
        }
    }

    /// Corrections for a mirrored (left) leg. The knee folds the other way
    /// so both legs bend towards the pole.
    pub fn left() -> Self {
        Self {
            thigh_offset: Vec3::new(0.0, -90.0, 0.0),
            shin_offset: Vec3::new(0.0, -90.0, 0.0),
            foot_offset: Vec3::ZERO,
            knee_bend: -1.0,
        }
    }
}

/// Result of one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegSolution {
    pub thigh: Pose,
    pub shin: Pose,
    pub foot: Pose,
    /// Hip-to-target distance actually used, after clamping.
    pub reach: f32,
    /// The target was out of reach and pulled in.
    pub clamped: bool,
    /// Law-of-cosines value before clamping to [-1, 1].
    pub hip_cosine: f32,
    /// Angle between the hip→target line and the thigh, in radians.
    pub hip_angle: f32,
}

impl LegSolution {
    /// World position of the knee, where the shin starts.
    pub fn knee(&self) -> Vec3 {
        self.shin.position
    }
}

/// Closed-form solver for thigh, shin and foot.
///
/// Holds the per-side corrections and the reach epsilon. One solver can be
/// shared by every leg of a robot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoBoneSolver {
    pub right: LegSide,
    pub left: LegSide,
    /// How far inside full extension unreachable targets are placed.
    pub epsilon: f32,
    /// Rest-pose alignment applied to thigh and shin after aiming.
    pub bone_correction: Vec3,
    /// Rest-pose alignment applied to the foot after copying the target.
    pub foot_correction: Vec3,
}

impl Default for TwoBoneSolver {
    fn default() -> Self {
        Self {
            right: LegSide::right(),
            left: LegSide::left(),
            epsilon: 0.001,
            bone_correction: Vec3::new(90.0, 0.0, 0.0),
            foot_correction: Vec3::new(-90.0, 0.0, 180.0),
        }
    }
}

impl TwoBoneSolver {
    /// Creates a solver with the default rig corrections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how far inside full extension out-of-reach targets land.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon.max(1e-6);
        self
    }

    /// Replaces the per-side corrections.
    pub fn with_sides(mut self, right: LegSide, left: LegSide) -> Self {
        self.right = right;
        self.left = left;
        self
    }

    /// Replaces the thigh/shin and foot rest-pose corrections, in Euler
    /// degrees.
    pub fn with_corrections(mut self, bone: Vec3, foot: Vec3) -> Self {
        self.bone_correction = bone;
        self.foot_correction = foot;
        self
    }

    /// Corrections for a leg, picked by whether it is mirrored.
    pub fn side(&self, mirrored: bool) -> &LegSide {
        if mirrored { &self.left } else { &self.right }
    }

    /// Solves the leg for a hip at `hip`, a foot `target` and a `pole` point
    /// that picks the knee's bend plane.
    pub fn solve(
        &self,
        chain: &LegChain,
        hip: Vec3,
        target: Pose,
        pole: Vec3,
        mirrored: bool,
    ) -> LegSolution {
        let side = self.side(mirrored);
        let thigh_len = chain.thigh_length();
        let shin_len = chain.shin_length();
        let total = chain.total_length();

        let to_target = target.position - hip;
        let direction = to_target.try_normalize().unwrap_or(Vec3::NEG_Y);
        let mut distance = to_target.length();
        let clamped = distance >= total;
        if clamped {
            distance = total - self.epsilon;
        }
        // A target sitting on the hip has no usable triangle.
        distance = distance.max(self.epsilon);
        let target_pos = hip + direction * distance;

        let hip_cosine = (distance * distance + thigh_len * thigh_len - shin_len * shin_len)
            / (2.0 * distance * thigh_len);
        let hip_angle = hip_cosine.clamp(-1.0, 1.0).acos();

        let mut normal = direction
            .cross(pole - hip)
            .try_normalize()
            .unwrap_or_else(|| direction.any_orthonormal_vector());
        if mirrored {
            normal = -normal;
        }
        let bend = normal * side.knee_bend;
        let axis = bend.try_normalize().unwrap_or(normal);

        let thigh_dir = Quat::from_axis_angle(axis, hip_angle) * direction;
        let knee = hip + thigh_dir * thigh_len;

        let thigh_rotation = self.aim(knee - hip, bend, side.thigh_offset);
        let shin_rotation = self.aim(target_pos - knee, bend, side.shin_offset);
        let foot_rotation =
            target.rotation * euler_degrees(self.foot_correction) * euler_degrees(side.foot_offset);

        LegSolution {
            thigh: Pose::new(hip, thigh_rotation),
            shin: Pose::new(knee, shin_rotation),
            foot: Pose::new(target_pos, foot_rotation),
            reach: distance,
            clamped,
            hip_cosine,
            hip_angle,
        }
    }

    fn aim(&self, direction: Vec3, up: Vec3, offset: Vec3) -> Quat {
        let base = look_rotation(direction, up).unwrap_or(Quat::IDENTITY);
        base * euler_degrees(self.bone_correction) * euler_degrees(offset)
    }
}
