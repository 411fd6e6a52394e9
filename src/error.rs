//! Error types for assembly, selection and leg chain setup.
//!
//! Per-frame operations (IK solving, ground probing) never fail; they clamp
//! or fall back instead. These errors only surface at configuration time or
//! while the player edits the loadout.

use std::fmt;

use thiserror::Error;

use crate::part::{PartCategory, PartId, Tier};

/// Which structural bound cut an assembly branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuralLimit {
    /// The branch went deeper than the assembler's depth limit.
    Depth,
    /// The same part was about to be mounted on the same socket key as one
    /// of its ancestors, so the subtree would repeat forever.
    Cycle,
    /// The assembly already holds the maximum number of parts.
    PartBudget,
}

impl fmt::Display for StructuralLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StructuralLimit::Depth => "depth",
            StructuralLimit::Cycle => "cycle",
            StructuralLimit::PartBudget => "part budget",
        })
    }
}

/// Problems found while rebuilding an assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// A branch hit one of the assembler's structural bounds. The branch is
    /// dropped, sibling branches are still assembled.
    #[error("assembly {limit} limit exceeded at socket '{socket}' (depth {depth})")]
    StructuralLimitExceeded {
        socket: String,
        depth: usize,
        limit: StructuralLimit,
    },

    /// No core part is selected, so there is nothing to build from.
    #[error("no core part selected")]
    MissingCore,
}

/// Rejected loadout edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("part '{0}' is not a core")]
    NotACore(PartId),

    #[error("socket '{socket}' accepts {expected:?}, got {got:?}")]
    CategoryMismatch {
        socket: String,
        expected: PartCategory,
        got: PartCategory,
    },

    #[error("socket '{socket}' allows up to {max:?}, part is {tier:?}")]
    TierNotAllowed { socket: String, max: Tier, tier: Tier },

    #[error("no '{0}' left in inventory")]
    OutOfStock(PartId),

    #[error("nothing equipped on socket '{0}'")]
    NothingEquipped(String),
}

/// Which bone of a leg chain a reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoneRole {
    Thigh,
    Shin,
    Foot,
}

/// Leg chain configuration errors. A chain that fails to build stays
/// disabled for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IkError {
    #[error("leg chain is missing its {0:?} bone")]
    MissingBone(BoneRole),

    #[error("leg chain has a zero-length bone")]
    DegenerateChain,
}
