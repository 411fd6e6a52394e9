//! Socket-graph assembly.
//!
//! The robot is kept as an arena of nodes ([`AssemblyTree`]) with explicit
//! parent/child indices. Rebuilding never patches a live tree: the
//! [`SocketAssembler`] drops the previous arena and grows a new one from the
//! core outwards. [`NodeId`]s are stamped with the tree's generation, so a
//! handle kept from an earlier build resolves to nothing instead of to an
//! unrelated node.
//!
//! Growth is a bounded recursive rewrite. Each placed part exposes its own
//! sockets; every socket whose key has an entry in the [`Selection`] gets
//! that part mounted with zero offset, the mounting socket's side is pushed
//! onto the new part's sockets, and the process repeats one level deeper.
//! Depth, repeated (part, socket) pairs on the way down and a total part
//! budget each cut a branch.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::error::{AssemblyError, StructuralLimit};
use crate::part::{Part, PartId};
use crate::session::{Selection, Session};
use crate::socket::{Laterality, Socket};

/// Hard recursion limit. Only malformed or cyclic socket graphs get close.
pub const MAX_ASSEMBLY_DEPTH: usize = 50;

/// Upper bound on parts in one assembly. Real robots have a few dozen.
pub const MAX_ASSEMBLY_PARTS: usize = 1024;

/// Uniform scale of the hover indicator spawned under every socket.
pub const INDICATOR_SCALE: f32 = 0.25;

/// Handle to a node inside one [`AssemblyTree`].
///
/// Ids carry the generation of the tree that issued them. Looking up an id
/// from an older tree returns `None` instead of resolving to whatever node
/// now sits at the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Position in the issuing tree's arena.
    pub fn index(self) -> usize {
        self.index
    }

    /// Build counter of the issuing tree.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// A part placed in the assembly.
#[derive(Debug, Clone)]
pub struct MountedPart {
    pub part: Arc<Part>,
    /// 0 for the core, +1 per socket hop.
    pub depth: usize,
    /// X scale was flipped to reuse a right-handed model on the left.
    pub mirrored: bool,
}

/// What an arena node holds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Part(MountedPart),
    Socket(Socket),
    /// Editor-only helpers such as the socket hover indicator. Never treated
    /// as a mounted part.
    Decoration,
}

/// One node in an [`AssemblyTree`].
#[derive(Debug, Clone)]
pub struct AssemblyNode {
    pub kind: NodeKind,
    /// Local transform relative to the parent node.
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// One fully built robot.
#[derive(Debug, Clone, Default)]
pub struct AssemblyTree {
    generation: u32,
    nodes: Vec<AssemblyNode>,
    part_count: usize,
    diagnostics: Vec<AssemblyError>,
}

impl AssemblyTree {
    /// Build counter of this tree. Every rebuild gets a new one.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// The core part node.
    pub fn root(&self) -> NodeId {
        self.id(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` was issued by this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// The node behind `id`, or `None` for ids from another tree.
    pub fn node(&self, id: NodeId) -> Option<&AssemblyNode> {
        if id.generation != self.generation {
            return None;
        }
        self.nodes.get(id.index)
    }

    /// Nodes in creation order. A parent always comes before its children.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &AssemblyNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (self.id(i), n))
    }

    /// Parent node. `None` for the root and for ids from another tree.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Direct children. Empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn part(&self, id: NodeId) -> Option<&MountedPart> {
        match &self.node(id)?.kind {
            NodeKind::Part(mounted) => Some(mounted),
            _ => None,
        }
    }

    pub fn socket(&self, id: NodeId) -> Option<&Socket> {
        match &self.node(id)?.kind {
            NodeKind::Socket(socket) => Some(socket),
            _ => None,
        }
    }

    /// Sockets owned directly by a part node. Sockets of parts mounted
    /// further down are not included.
    pub fn sockets_of(&self, part: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(part)
            .iter()
            .copied()
            .filter(|&id| self.socket(id).is_some())
    }

    /// The part mounted on a socket, skipping decorations.
    pub fn mounted_part(&self, socket: NodeId) -> Option<NodeId> {
        self.children(socket)
            .iter()
            .copied()
            .find(|&id| self.part(id).is_some())
    }

    pub fn parts(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Part(_)))
            .map(|(id, _)| id)
    }

    pub fn sockets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Socket(_)))
            .map(|(id, _)| id)
    }

    pub fn part_count(&self) -> usize {
        self.part_count
    }

    /// First socket whose rendered key is `key`.
    pub fn find_socket(&self, key: &str) -> Option<NodeId> {
        self.sockets()
            .find(|&id| self.socket(id).is_some_and(|s| s.key() == key))
    }

    /// Number of part levels, core included. A core with a torso and an arm
    /// has depth 3.
    pub fn depth(&self) -> usize {
        self.parts()
            .filter_map(|id| self.part(id).map(|p| p.depth + 1))
            .max()
            .unwrap_or(0)
    }

    /// Problems hit while building, e.g. truncated branches.
    pub fn diagnostics(&self) -> &[AssemblyError] {
        &self.diagnostics
    }

    /// Transform of `id` relative to the core part. `None` for stale ids.
    pub fn transform_in_root(&self, id: NodeId) -> Option<Transform> {
        self.node(id)?;
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root() {
                break;
            }
            chain.push(current);
            cursor = self.parent(current);
        }
        Some(chain.iter().rev().fold(Transform::IDENTITY, |acc, &node| {
            self.node(node)
                .map_or(acc, |n| acc.mul_transform(n.transform))
        }))
    }

    /// World transform of `id`, including the anchor the core was placed at.
    pub fn global_transform(&self, id: NodeId) -> Option<Transform> {
        let root = self.node(self.root())?.transform;
        Some(root.mul_transform(self.transform_in_root(id)?))
    }

    /// Socket-key path → mounted part id, with the core at `""`. Two trees
    /// with equal layouts are structurally identical.
    pub fn layout(&self) -> BTreeMap<String, PartId> {
        let mut layout = BTreeMap::new();
        for id in self.parts() {
            let Some(mounted) = self.part(id) else {
                continue;
            };
            let mut keys = Vec::new();
            let mut cursor = self.parent(id);
            while let Some(current) = cursor {
                if let Some(socket) = self.socket(current) {
                    keys.push(socket.key());
                }
                cursor = self.parent(current);
            }
            keys.reverse();
            layout.insert(keys.join("/"), mounted.part.id.clone());
        }
        layout
    }

    fn push(&mut self, kind: NodeKind, transform: Transform, parent: Option<NodeId>) -> NodeId {
        let id = self.id(self.nodes.len());
        self.nodes.push(AssemblyNode {
            kind,
            transform,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.index)) {
            parent.children.push(id);
        }
        id
    }

    fn id(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.generation,
        }
    }

    /// Places a part and creates fresh sockets (each with its indicator)
    /// from the part's blueprint.
    fn instantiate(
        &mut self,
        part: &Arc<Part>,
        parent: Option<NodeId>,
        transform: Transform,
        depth: usize,
        mirrored: bool,
    ) -> NodeId {
        let part_id = self.push(
            NodeKind::Part(MountedPart {
                part: part.clone(),
                depth,
                mirrored,
            }),
            transform,
            parent,
        );
        self.part_count += 1;
        for spec in &part.blueprint.sockets {
            let socket_id = self.push(
                NodeKind::Socket(Socket::from_spec(spec)),
                spec.transform,
                Some(part_id),
            );
            self.push(
                NodeKind::Decoration,
                Transform::from_scale(Vec3::splat(INDICATOR_SCALE)),
                Some(socket_id),
            );
        }
        part_id
    }

    fn propagate_laterality(&mut self, part: NodeId, side: Laterality) {
        let sockets: Vec<NodeId> = self.sockets_of(part).collect();
        for id in sockets {
            if let Some(NodeKind::Socket(socket)) = self.nodes.get_mut(id.index).map(|n| &mut n.kind) {
                socket.inherit(side);
            }
        }
    }
}

/// Owns the single live [`AssemblyTree`] and rebuilds it from scratch.
#[derive(Debug)]
pub struct SocketAssembler {
    max_depth: usize,
    max_parts: usize,
    generation: u32,
    tree: Option<AssemblyTree>,
}

impl Default for SocketAssembler {
    fn default() -> Self {
        Self {
            max_depth: MAX_ASSEMBLY_DEPTH,
            max_parts: MAX_ASSEMBLY_PARTS,
            generation: 0,
            tree: None,
        }
    }
}

impl SocketAssembler {
    /// Creates an assembler with the default depth and part limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many socket hops below the core a part may sit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the most parts one assembly may hold, core included.
    pub fn with_max_parts(mut self, max_parts: usize) -> Self {
        self.max_parts = max_parts.max(1);
        self
    }

    /// The tree from the last successful build.
    pub fn tree(&self) -> Option<&AssemblyTree> {
        self.tree.as_ref()
    }

    /// Drops the current tree, returning it.
    pub fn clear(&mut self) -> Option<AssemblyTree> {
        self.tree.take()
    }

    /// Builds a new tree rooted at `root`, replacing the previous one.
    ///
    /// Selection entries that match no socket of the resulting shape are
    /// ignored. A branch is cut, and reported through
    /// [`AssemblyTree::diagnostics`], when it goes past the depth limit,
    /// when it would mount a part on the same socket key as one of its
    /// ancestors, or once the part budget is spent.
    pub fn assemble(
        &mut self,
        root: Transform,
        core: &Arc<Part>,
        selection: &Selection,
    ) -> &AssemblyTree {
        if self.tree.take().is_some() {
            debug!("discarding previous assembly");
        }
        self.generation = self.generation.wrapping_add(1);

        let mut tree = AssemblyTree {
            generation: self.generation,
            ..default()
        };
        let core_node = tree.instantiate(core, None, root, 0, false);
        let mut path = Vec::new();
        self.mount_children(&mut tree, core_node, 0, selection, &mut path);

        if let Some(first) = tree.diagnostics.first() {
            warn!(
                "assembly truncated at {} socket(s), first: {first}",
                tree.diagnostics.len()
            );
        }
        debug!(
            "assembled {} parts from core {}",
            tree.part_count(),
            core.id
        );

        self.tree.insert(tree)
    }

    /// [`assemble`](Self::assemble) from a session's core and selection.
    /// Without a core the previous tree is still dropped.
    pub fn rebuild(
        &mut self,
        root: Transform,
        session: &Session,
    ) -> Result<&AssemblyTree, AssemblyError> {
        let Some(core) = session.core() else {
            self.tree = None;
            warn!("{}", AssemblyError::MissingCore);
            return Err(AssemblyError::MissingCore);
        };
        Ok(self.assemble(root, core, session.selection()))
    }

    /// `path` holds the (part, socket key) pairs mounted on the way down
    /// from the core.
    fn mount_children(
        &self,
        tree: &mut AssemblyTree,
        part_node: NodeId,
        depth: usize,
        selection: &Selection,
        path: &mut Vec<(PartId, String)>,
    ) {
        let sockets: Vec<NodeId> = tree.sockets_of(part_node).collect();

        for socket_id in sockets {
            let Some(socket) = tree.socket(socket_id) else {
                continue;
            };
            let key = socket.key();
            let Some(part) = selection.get(&key) else {
                continue;
            };
            let side = socket.effective_laterality();
            let mirrored = socket.mirrors_mount();

            let child_depth = depth + 1;
            let repeats = path.iter().any(|(id, k)| *id == part.id && *k == key);
            let limit = if child_depth > self.max_depth {
                Some(StructuralLimit::Depth)
            } else if repeats {
                Some(StructuralLimit::Cycle)
            } else if tree.part_count() >= self.max_parts {
                Some(StructuralLimit::PartBudget)
            } else {
                None
            };
            if let Some(limit) = limit {
                tree.diagnostics.push(AssemblyError::StructuralLimitExceeded {
                    socket: key,
                    depth: child_depth,
                    limit,
                });
                continue;
            }

            // Scale flip only. Asymmetric surface detail on the model ends up
            // mirrored as well.
            let mut transform = Transform::IDENTITY;
            if mirrored {
                transform.scale.x = -transform.scale.x;
            }

            let child = tree.instantiate(part, Some(socket_id), transform, child_depth, mirrored);
            tree.propagate_laterality(child, side);

            path.push((part.id.clone(), key));
            self.mount_children(tree, child, child_depth, selection, path);
            path.pop();
        }
    }
}
