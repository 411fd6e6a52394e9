//! Body collider fitting for assembled robots.
//!
//! The playable robot gets a single upright capsule sized to the union of
//! its parts' bounds. This is far cheaper than one collider per part and is
//! all the locomotion controller needs.

#[cfg(feature = "physics")]
use avian3d::prelude::Collider;
use bevy::prelude::*;

use crate::assembly::AssemblyTree;

/// Default follow-camera distance per metre of robot height.
pub const DEFAULT_CAMERA_ZOOM: f32 = 4.0;

/// Upright capsule fitted around an assembly, in the core's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFit {
    /// Capsule centre. Always on the vertical axis through the core.
    pub center: Vec3,
    pub height: f32,
    pub radius: f32,
    pub mass: f32,
    pub min: Vec3,
    pub max: Vec3,
}

impl BodyFit {
    /// Follow-camera distance for this body.
    pub fn follow_distance(&self, zoom: f32) -> f32 {
        self.height * zoom.max(0.0)
    }

    /// Length of the capsule's cylindrical section. Zero when the body is
    /// shorter than it is wide.
    pub fn cylinder_length(&self) -> f32 {
        (self.height - 2.0 * self.radius).max(0.0)
    }

    /// Capsule collider for this body. A sphere when the body is too short
    /// for a capsule, which would otherwise poke out above and below.
    #[cfg(feature = "physics")]
    pub fn collider(&self) -> Collider {
        if self.height < 2.0 * self.radius {
            Collider::sphere(self.radius)
        } else {
            Collider::capsule(self.radius, self.cylinder_length())
        }
    }
}

/// Fits a [`BodyFit`] around every mounted part that has authored bounds.
pub struct BodyFitter {
    mass_per_height: f32,
    min_radius: f32,
}

impl Default for BodyFitter {
    fn default() -> Self {
        Self {
            mass_per_height: 25.0,
            min_radius: 0.05,
        }
    }
}

impl BodyFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mass_per_height(mut self, mass_per_height: f32) -> Self {
        self.mass_per_height = mass_per_height.max(0.0);
        self
    }

    /// Smallest capsule radius, for very thin robots.
    pub fn with_min_radius(mut self, min_radius: f32) -> Self {
        self.min_radius = min_radius.max(0.0);
        self
    }

    /// Returns `None` when no part has bounds.
    ///
    /// Only part nodes are measured; socket indicators and other decorations
    /// never widen the body.
    pub fn fit(&self, tree: &AssemblyTree) -> Option<BodyFit> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut found = false;

        for id in tree.parts() {
            let Some(bounds) = tree.part(id).and_then(|p| p.part.blueprint.bounds) else {
                continue;
            };
            let Some(to_root) = tree.transform_in_root(id) else {
                continue;
            };
            for corner in bounds.corners() {
                let p = to_root.transform_point(corner);
                min = min.min(p);
                max = max.max(p);
            }
            found = true;
        }

        if !found {
            return None;
        }

        let size = max - min;
        let center = (min + max) * 0.5;
        let height = size.y;
        let radius = ((size.x + size.z) * 0.25).max(self.min_radius);

        Some(BodyFit {
            center: Vec3::new(0.0, center.y, 0.0),
            height,
            radius,
            mass: height * self.mass_per_height,
            min,
            max,
        })
    }
}
