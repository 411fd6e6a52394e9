//! Part catalog: the authored, immutable description of every robot part.
//!
//! A [`Part`] carries its category, tier, gameplay stats and a
//! [`PartBlueprint`] listing the sockets it exposes once instantiated.
//! Parts are shared through `Arc` so the session and the catalog can hold
//! the same authored data without copying it.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;

use crate::socket::Laterality;

/// Unique part identifier, e.g. `"arm_t1_alpha"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(String);

impl PartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PartId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What kind of slot a part fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PartCategory {
    Core,
    Torso,
    Arms,
    Legs,
    Head,
    Accessory,
}

impl PartCategory {
    pub const ALL: &'static [PartCategory] = &[
        PartCategory::Core,
        PartCategory::Torso,
        PartCategory::Arms,
        PartCategory::Legs,
        PartCategory::Head,
        PartCategory::Accessory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PartCategory::Core => "Core",
            PartCategory::Torso => "Torso",
            PartCategory::Arms => "Arms",
            PartCategory::Legs => "Legs",
            PartCategory::Head => "Head",
            PartCategory::Accessory => "Accessory",
        }
    }

    /// Limb categories that come in left/right pairs and get mirrored on
    /// the left side.
    pub fn is_bilateral(&self) -> bool {
        matches!(self, PartCategory::Arms | PartCategory::Legs)
    }
}

/// Ordered part rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Tier {
    #[default]
    T1,
    T2,
    T3,
}

impl Tier {
    pub const ALL: &'static [Tier] = &[Tier::T1, Tier::T2, Tier::T3];

    /// 1-based rank, as shown to the player.
    pub fn rank(&self) -> u8 {
        match self {
            Tier::T1 => 1,
            Tier::T2 => 2,
            Tier::T3 => 3,
        }
    }
}

/// Gameplay numbers. The assembler never reads these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartStats {
    pub health_bonus: f32,
    pub energy_consumption: f32,
    pub weight: f32,
}

impl Default for PartStats {
    fn default() -> Self {
        Self {
            health_bonus: 100.0,
            energy_consumption: 5.0,
            weight: 5.0,
        }
    }
}

/// Axis-aligned box around a part's visual, in the part's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartBounds {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl PartBounds {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let c = self.center;
        let h = self.half_extents;
        [
            c + Vec3::new(-h.x, -h.y, -h.z),
            c + Vec3::new(h.x, -h.y, -h.z),
            c + Vec3::new(-h.x, h.y, -h.z),
            c + Vec3::new(h.x, h.y, -h.z),
            c + Vec3::new(-h.x, -h.y, h.z),
            c + Vec3::new(h.x, -h.y, h.z),
            c + Vec3::new(-h.x, h.y, h.z),
            c + Vec3::new(h.x, h.y, h.z),
        ]
    }
}

/// An attachment point as authored on a part blueprint.
///
/// Live [`Socket`](crate::socket::Socket)s are created from these every time
/// the owning part is instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketSpec {
    pub name: String,
    pub laterality: Laterality,
    pub category: PartCategory,
    pub max_tier: Tier,
    /// Placement relative to the owning part.
    pub transform: Transform,
}

impl SocketSpec {
    pub fn new(name: impl Into<String>, category: PartCategory) -> Self {
        Self {
            name: name.into(),
            laterality: Laterality::None,
            category,
            max_tier: Tier::T3,
            transform: Transform::IDENTITY,
        }
    }

    pub fn with_laterality(mut self, laterality: Laterality) -> Self {
        self.laterality = laterality;
        self
    }

    pub fn with_max_tier(mut self, max_tier: Tier) -> Self {
        self.max_tier = max_tier;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Everything needed to instantiate a part: its direct sockets and the
/// bounds of its visual.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartBlueprint {
    pub sockets: Vec<SocketSpec>,
    pub bounds: Option<PartBounds>,
}

/// A catalog entry: category, tier, sockets it exposes and the
/// physical data used for body fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: PartId,
    pub category: PartCategory,
    pub tier: Tier,
    /// Highest tier this part allows elsewhere on the robot. Only read for
    /// cores.
    pub max_allowed_tier: Tier,
    pub blueprint: PartBlueprint,
    pub stats: PartStats,
}

impl Part {
    pub fn new(id: impl Into<PartId>, category: PartCategory, tier: Tier) -> Self {
        Self {
            id: id.into(),
            category,
            tier,
            max_allowed_tier: tier,
            blueprint: PartBlueprint::default(),
            stats: PartStats::default(),
        }
    }

    pub fn with_max_allowed_tier(mut self, tier: Tier) -> Self {
        self.max_allowed_tier = tier;
        self
    }

    pub fn with_socket(mut self, socket: SocketSpec) -> Self {
        self.blueprint.sockets.push(socket);
        self
    }

    pub fn with_bounds(mut self, bounds: PartBounds) -> Self {
        self.blueprint.bounds = Some(bounds);
        self
    }

    pub fn with_stats(mut self, stats: PartStats) -> Self {
        self.stats = stats;
        self
    }
}

/// All parts the game knows about.
#[derive(Debug, Clone, Default)]
pub struct PartCatalog {
    parts: Vec<Arc<Part>>,
}

impl PartCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a part, replacing any earlier part with the same id.
    pub fn insert(&mut self, part: Part) -> Arc<Part> {
        let part = Arc::new(part);
        self.parts.retain(|p| p.id != part.id);
        self.parts.push(part.clone());
        part
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.insert(part);
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<Part>> {
        self.parts.iter().find(|p| p.id.as_str() == id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Part>> {
        self.parts.iter()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Parts of `category` whose tier does not exceed `max_tier`, ordered by
    /// tier then id.
    pub fn parts_by_category(&self, category: PartCategory, max_tier: Tier) -> Vec<Arc<Part>> {
        let mut parts: Vec<Arc<Part>> = self
            .parts
            .iter()
            .filter(|p| p.category == category && p.tier <= max_tier)
            .cloned()
            .collect();
        parts.sort_by(|a, b| a.tier.cmp(&b.tier).then_with(|| a.id.cmp(&b.id)));
        parts
    }
}
