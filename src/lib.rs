//! Modular robot assembly and leg IK for Bevy.
//!
//! This crate builds robots out of parts connected through named sockets,
//! keeps the player's loadout, and animates the resulting legs with an
//! analytic two-bone IK solver that plants feet on the ground.
//!
//! # Features
//!
//! - **Parts and sockets**: Catalog of parts with tiers and socket
//!   blueprints via [`PartCatalog`], with left/right handling on [`Socket`].
//! - **Loadout**: Core choice, socket selections and inventory in
//!   [`Session`].
//! - **Assembly**: Bounded, deterministic socket-graph rebuilds into an
//!   arena via [`SocketAssembler`].
//! - **Leg IK**: Closed-form thigh/shin/foot solving via [`TwoBoneSolver`]
//!   and ground-following foot targets via [`GroundProbe`].
//! - **Locomotion**: Engine-agnostic walking controller via
//!   [`RobotController`].
//! - **Bevy plugin**: Entity spawning, leg chains and (with `physics`)
//!   ground ray casts and a playable body via [`MechForgePlugin`].
//! - **Egui UI helpers** (optional): Core picker and socket menu via [`ui`].
//!   Requires the `egui` feature.
//!
//! # Feature Flags
//!
//! - `physics`: Enables avian3d ray casts for grounding, the fitted body
//!   collider and the physics-driven robot controller systems.
//! - `egui`: Enables [`ui::socket_menu`] and [`ui::core_picker`].
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_mechforge::*;
//!
//! fn setup(app: &mut App) {
//!     let catalog = PartCatalog::new()
//!         .with_part(Part::new("core_mk1", PartCategory::Core, Tier::T1).with_socket(
//!             SocketSpec::new("Socket_Torso", PartCategory::Torso),
//!         ))
//!         .with_part(Part::new("torso_std", PartCategory::Torso, Tier::T1));
//!     let inventory = Inventory::new().with_stock("torso_std", 1);
//!
//!     app.add_plugins(MechForgePlugin)
//!        .insert_resource(Session::new(catalog).with_inventory(inventory));
//! }
//!
//! fn spawn_anchor(mut commands: Commands) {
//!     commands.spawn((Transform::default(), AssemblyAnchor));
//! }
//! ```

pub mod assembly;
pub mod collider;
pub mod error;
pub mod ground;
pub mod ik;
pub mod locomotion;
pub mod part;
pub mod plugin;
pub mod session;
pub mod socket;

#[cfg(feature = "egui")]
pub mod ui;

pub use assembly::{
    AssemblyTree, MAX_ASSEMBLY_DEPTH, MAX_ASSEMBLY_PARTS, NodeId, NodeKind, SocketAssembler,
};
pub use collider::{BodyFit, BodyFitter};
pub use error::{AssemblyError, IkError, SelectionError, StructuralLimit};
pub use ground::{GroundHit, GroundLayers, GroundProbe, RaycastOracle};
pub use ik::{LegChain, LegSolution, Pose, TwoBoneSolver};
pub use locomotion::{LocomotionConfig, RobotController};
pub use part::{Part, PartCatalog, PartCategory, PartId, SocketSpec, Tier};
pub use plugin::{AssemblyAnchor, LegIk, MechForgePlugin, PlayableRobot};
pub use session::{Inventory, Session};
pub use socket::{Laterality, Socket};
