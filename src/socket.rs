//! Live sockets and left/right handling.
//!
//! Laterality is a field, not a naming convention: a socket keeps its
//! authored [`Laterality`] and the side it inherited from the limb it sits
//! on. The `_L` / `_R` suffixes only appear when the lookup key is rendered,
//! so a socket literally named `"Jaw_L"` is never mistaken for a left one.

use crate::error::SelectionError;
use crate::part::{Part, PartCategory, SocketSpec, Tier};

/// Side of the robot a socket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Laterality {
    #[default]
    None,
    Left,
    Right,
}

impl Laterality {
    /// Suffix appended to socket keys.
    pub fn suffix(&self) -> &'static str {
        match self {
            Laterality::None => "",
            Laterality::Left => "_L",
            Laterality::Right => "_R",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Laterality::None => "",
            Laterality::Left => "Left",
            Laterality::Right => "Right",
        }
    }

    pub fn is_lateral(&self) -> bool {
        !matches!(self, Laterality::None)
    }
}

/// A socket instance inside an assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Socket {
    /// Authored base name, without any side suffix.
    pub name: String,
    /// Side the socket was authored with.
    pub laterality: Laterality,
    /// Side picked up from the limb this socket's part is mounted on.
    pub inherited: Laterality,
    pub category: PartCategory,
    /// Highest tier this socket accepts.
    pub max_tier: Tier,
}

impl Socket {
    pub fn from_spec(spec: &SocketSpec) -> Self {
        Self {
            name: spec.name.clone(),
            laterality: spec.laterality,
            inherited: Laterality::None,
            category: spec.category,
            max_tier: spec.max_tier,
        }
    }

    /// The side this socket passes on to whatever gets mounted on it.
    pub fn effective_laterality(&self) -> Laterality {
        if self.inherited.is_lateral() {
            self.inherited
        } else {
            self.laterality
        }
    }

    /// Selection lookup key, e.g. `"Arms_L"` or `"Weapon_L"`.
    pub fn key(&self) -> String {
        let mut key = format!("{}{}", self.name, self.laterality.suffix());
        if self.inherited.is_lateral() && self.inherited != self.laterality {
            key.push_str(self.inherited.suffix());
        }
        key
    }

    /// Tags the socket with the side of the limb it sits on. Sockets that
    /// already resolve to that side are left alone, so the suffix is never
    /// doubled.
    ///
    /// Returns `true` if the key changed.
    pub fn inherit(&mut self, side: Laterality) -> bool {
        if !side.is_lateral() || self.effective_laterality() == side {
            return false;
        }
        self.inherited = side;
        true
    }

    /// Whether a part mounted here is flipped on X.
    pub fn mirrors_mount(&self) -> bool {
        self.category.is_bilateral() && self.effective_laterality() == Laterality::Left
    }

    /// Max-tier policy: same category, tier up to the socket's ceiling.
    pub fn accepts(&self, part: &Part) -> Result<(), SelectionError> {
        if part.category != self.category {
            return Err(SelectionError::CategoryMismatch {
                socket: self.key(),
                expected: self.category,
                got: part.category,
            });
        }
        if part.tier > self.max_tier {
            return Err(SelectionError::TierNotAllowed {
                socket: self.key(),
                max: self.max_tier,
                tier: part.tier,
            });
        }
        Ok(())
    }

    /// Player-facing label: `"Socket_Arm"` on the left becomes `"Arm (Left)"`.
    pub fn display_name(&self) -> String {
        let base = self.name.strip_prefix("Socket_").unwrap_or(&self.name);
        let mut label = base.replace('_', " ");

        let sides: Vec<&str> = [self.laterality, self.inherited]
            .iter()
            .filter(|side| side.is_lateral())
            .map(|side| side.label())
            .collect();
        if !sides.is_empty() {
            label.push_str(&format!(" ({})", sides.join(", ")));
        }
        label
    }
}
