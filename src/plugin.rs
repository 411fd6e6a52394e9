//! Bevy integration.
//!
//! [`MechForgePlugin`] keeps an entity hierarchy in step with the
//! [`Session`]: whenever the session changes, the previous robot entities
//! are despawned, the arena is rebuilt and one entity is spawned per arena
//! node. The arena stays authoritative; entities are a view of it.
//!
//! Leg IK runs on [`LegIk`] components. Their chains are measured once,
//! after transforms have propagated; a leg with a missing bone disables
//! itself for good. With the `physics` feature, legs are grounded through
//! avian3d ray casts and [`PlayableRobot`] anchors get a fitted body and
//! the walking controller.
//!
//! # Usage
//!
//! ```ignore
//! app.add_plugins(MechForgePlugin)
//!    .insert_resource(Session::new(catalog).with_inventory(inventory));
//!
//! commands.spawn((Transform::default(), AssemblyAnchor));
//! ```

#[cfg(feature = "physics")]
use avian3d::prelude::*;
use bevy::prelude::*;
use bevy::transform::TransformSystems;

use crate::assembly::{AssemblyTree, NodeId, NodeKind, SocketAssembler};
use crate::collider::{BodyFit, BodyFitter};
use crate::ground::GroundProbe;
#[cfg(feature = "physics")]
use crate::ground::{GroundHit, GroundLayers, RaycastOracle};
use crate::ik::{LegChain, TwoBoneSolver};
#[cfg(feature = "physics")]
use crate::ik::{Pose, is_mirrored};
#[cfg(feature = "physics")]
use crate::locomotion::{BodyState, GroundContact, MoveIntent, RobotController};
use crate::part::PartId;
use crate::session::Session;
use crate::socket::Socket;

/// Registers the assembly, leg IK and (with `physics`) locomotion systems.
pub struct MechForgePlugin;

impl Plugin for MechForgePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Session>()
            .init_resource::<AssemblyState>()
            .add_systems(Update, rebuild_assembly)
            .add_systems(PostUpdate, init_leg_chains.after(TransformSystems::Propagate));

        #[cfg(feature = "physics")]
        app.init_resource::<MoveInput>()
            .add_systems(FixedUpdate, (drive_robot, drive_leg_ik).chain());
    }
}

/// Where the robot gets built. Only the first anchor is used.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AssemblyAnchor;

/// On an [`AssemblyAnchor`]: build a drivable robot with a physics body
/// instead of a showroom model. Only has an effect with `physics`.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayableRobot;

/// Root entity of the spawned robot (the core).
#[derive(Component, Debug, Clone, Copy)]
pub struct AssembledRobot;

/// Arena node an entity was spawned from.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyNodeRef(pub NodeId);

#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct PartMount {
    pub part: PartId,
    pub depth: usize,
    pub mirrored: bool,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct SocketMount(pub Socket);

/// Hover indicator under a socket. Spawned hidden.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SocketIndicator;

/// The assembler, the entities spawned from its tree and the body fit of
/// the current robot.
#[derive(Resource, Debug, Default)]
pub struct AssemblyState {
    pub assembler: SocketAssembler,
    pub spawned: Option<Entity>,
    pub fit: Option<BodyFit>,
}

impl AssemblyState {
    pub fn tree(&self) -> Option<&AssemblyTree> {
        self.assembler.tree()
    }
}

/// Rebuilds the robot whenever the [`Session`] changes.
pub fn rebuild_assembly(
    mut commands: Commands,
    session: Res<Session>,
    mut state: ResMut<AssemblyState>,
    anchors: Query<(Entity, Has<PlayableRobot>), With<AssemblyAnchor>>,
) {
    if !session.is_changed() {
        return;
    }

    let AssemblyState {
        assembler,
        spawned,
        fit,
    } = &mut *state;

    if let Some(old) = spawned.take() {
        commands.entity(old).try_despawn();
    }
    *fit = None;

    // Nothing picked yet is the normal state of a fresh session.
    if session.core().is_none() {
        assembler.clear();
        return;
    }
    let Ok(tree) = assembler.rebuild(Transform::IDENTITY, &session) else {
        return;
    };

    let anchor = anchors.iter().next();
    let Some(root) = spawn_tree(&mut commands, tree, anchor.map(|(e, _)| e)) else {
        return;
    };
    *spawned = Some(root);
    *fit = BodyFitter::new().fit(tree);

    #[cfg(feature = "physics")]
    if anchor.is_some_and(|(_, playable)| playable) {
        match *fit {
            Some(body) => make_playable(&mut commands, root, &body),
            None => warn!("robot has no part bounds, cannot fit a physics body"),
        }
    }
}

fn spawn_tree(commands: &mut Commands, tree: &AssemblyTree, anchor: Option<Entity>) -> Option<Entity> {
    let mut entities: Vec<Entity> = Vec::with_capacity(tree.len());

    for (id, node) in tree.iter() {
        let mut entity = commands.spawn((node.transform, AssemblyNodeRef(id)));
        match &node.kind {
            NodeKind::Part(mounted) => {
                entity.insert((
                    Name::new(mounted.part.id.to_string()),
                    PartMount {
                        part: mounted.part.id.clone(),
                        depth: mounted.depth,
                        mirrored: mounted.mirrored,
                    },
                ));
            }
            NodeKind::Socket(socket) => {
                entity.insert((Name::new(socket.key()), SocketMount(socket.clone())));
            }
            NodeKind::Decoration => {
                entity.insert((Name::new("Hover_Indicator"), SocketIndicator, Visibility::Hidden));
            }
        }

        // Creation order: the parent entity already exists at its index.
        let parent = node.parent.map(|p| entities[p.index()]).or(anchor);
        if let Some(parent) = parent {
            entity.insert(ChildOf(parent));
        }
        entities.push(entity.id());
    }

    let root = entities.first().copied()?;
    commands.entity(root).insert(AssembledRobot);
    Some(root)
}

/// Two-bone IK driver for one leg.
#[derive(Component, Debug, Clone)]
pub struct LegIk {
    pub thigh: Option<Entity>,
    pub shin: Option<Entity>,
    pub foot: Option<Entity>,
    /// Knee bend hint. Defaults to a point in front of the shin.
    pub pole: Option<Entity>,
    /// Robot root whose orientation the feet follow. Defaults to the entity
    /// carrying this component.
    pub body: Option<Entity>,
    /// Fixed foot target, used when grounding is off.
    pub target: Option<Entity>,
    pub grounding: bool,
    pub solver: TwoBoneSolver,
    pub probe: GroundProbe,
    state: LegIkState,
}

/// Why a leg is or is not being solved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegIkState {
    /// Waiting for the first propagated transforms.
    Pending,
    Active(LegChain),
    /// A bone was missing or degenerate. Never retried.
    Disabled,
}

impl LegIk {
    pub fn new(thigh: Option<Entity>, shin: Option<Entity>, foot: Option<Entity>) -> Self {
        Self {
            thigh,
            shin,
            foot,
            pole: None,
            body: None,
            target: None,
            grounding: true,
            solver: TwoBoneSolver::default(),
            probe: GroundProbe::default(),
            state: LegIkState::Pending,
        }
    }

    pub fn with_pole(mut self, pole: Entity) -> Self {
        self.pole = Some(pole);
        self
    }

    pub fn with_body(mut self, body: Entity) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_target(mut self, target: Entity) -> Self {
        self.target = Some(target);
        self.grounding = false;
        self
    }

    pub fn with_solver(mut self, solver: TwoBoneSolver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_probe(mut self, probe: GroundProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn state(&self) -> LegIkState {
        self.state
    }

    pub fn chain(&self) -> Option<&LegChain> {
        match &self.state {
            LegIkState::Active(chain) => Some(chain),
            _ => None,
        }
    }
}

/// Measures pending leg chains once transforms are valid.
pub fn init_leg_chains(
    mut legs: Query<(Entity, &mut LegIk)>,
    globals: Query<&GlobalTransform>,
    names: Query<&Name>,
) {
    for (entity, mut leg) in &mut legs {
        if leg.state != LegIkState::Pending {
            continue;
        }
        let position = |bone: Option<Entity>| {
            bone.and_then(|e| globals.get(e).ok())
                .map(|g| g.translation())
        };
        let chain = LegChain::from_bones(position(leg.thigh), position(leg.shin), position(leg.foot));
        leg.state = match chain {
            Ok(chain) => LegIkState::Active(chain),
            Err(err) => {
                let label = names
                    .get(entity)
                    .map(|n| n.as_str().to_string())
                    .unwrap_or_else(|_| format!("{entity}"));
                warn!("{label}: {err}, leg IK disabled");
                LegIkState::Disabled
            }
        };
    }
}

/// Host-provided movement input for [`drive_robot`].
#[cfg(feature = "physics")]
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct MoveInput {
    pub axis: Vec2,
    /// Camera the input is relative to.
    pub camera: Transform,
}

/// Walking controller state on a playable robot.
#[cfg(feature = "physics")]
#[derive(Component, Debug, Clone, Copy)]
pub struct RobotMotor {
    pub controller: RobotController,
    /// Body height and centre from the fit, for the ground check.
    pub height: f32,
    pub center: Vec3,
    pub layers: GroundLayers,
}

#[cfg(feature = "physics")]
impl RobotMotor {
    pub fn from_fit(fit: &BodyFit) -> Self {
        Self {
            controller: RobotController::default(),
            height: fit.height,
            center: fit.center,
            layers: GroundLayers::DEFAULT,
        }
    }
}

#[cfg(feature = "physics")]
fn make_playable(commands: &mut Commands, root: Entity, fit: &BodyFit) {
    commands.entity(root).insert((
        RigidBody::Dynamic,
        LockedAxes::ROTATION_LOCKED,
        Mass(fit.mass),
        // The controller applies its own gravity.
        GravityScale(0.0),
        RobotMotor::from_fit(fit),
    ));
    commands.spawn((
        Name::new("Body_Collider"),
        fit.collider(),
        CollisionLayers::new(GroundLayers::ROBOT_BODY.0, LayerMask::ALL),
        Transform::from_translation(fit.center),
        ChildOf(root),
    ));
    info!(
        "playable robot ready: height {:.2}m, radius {:.2}m, mass {:.1}",
        fit.height, fit.radius, fit.mass
    );
}

/// [`RaycastOracle`] over avian3d's spatial query.
#[cfg(feature = "physics")]
pub struct AvianRaycast<'a, 'w, 's> {
    query: &'a SpatialQuery<'w, 's>,
}

#[cfg(feature = "physics")]
impl<'a, 'w, 's> AvianRaycast<'a, 'w, 's> {
    pub fn new(query: &'a SpatialQuery<'w, 's>) -> Self {
        Self { query }
    }
}

#[cfg(feature = "physics")]
impl RaycastOracle for AvianRaycast<'_, '_, '_> {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
        layers: GroundLayers,
    ) -> Option<GroundHit> {
        let filter = SpatialQueryFilter::from_mask(layers.0);
        self.query
            .cast_ray(origin, direction, max_distance, true, &filter)
            .map(|hit| GroundHit {
                point: origin + *direction * hit.distance,
                normal: hit.normal,
                distance: hit.distance,
            })
    }
}

/// Applies one controller step to every [`RobotMotor`].
#[cfg(feature = "physics")]
pub fn drive_robot(
    time: Res<Time>,
    input: Res<MoveInput>,
    spatial: SpatialQuery,
    mut robots: Query<(&RobotMotor, &GlobalTransform, &mut Transform, &mut LinearVelocity)>,
) {
    let dt = time.delta_secs();
    let oracle = AvianRaycast::new(&spatial);
    let intent = MoveIntent::new(input.axis, &input.camera);

    for (motor, global, mut transform, mut velocity) in &mut robots {
        let config = &motor.controller.config;
        let origin = global.transform_point(motor.center);
        let hit = oracle.raycast(
            origin,
            Dir3::NEG_Y,
            config.ground_check_distance(motor.height),
            motor.layers,
        );
        let contact = GroundContact::from_hit(hit, config.max_slope_degrees);

        let body = BodyState {
            velocity: velocity.0,
            rotation: transform.rotation,
        };
        let step = motor.controller.step(&body, &intent, &contact, dt);

        velocity.0 = step.velocity + step.acceleration * dt;
        transform.rotation = step.rotation;
    }
}

/// Probes the ground under every active leg and writes the solved bone
/// rotations.
#[cfg(feature = "physics")]
pub fn drive_leg_ik(
    spatial: SpatialQuery,
    legs: Query<(Entity, &LegIk)>,
    globals: Query<&GlobalTransform>,
    parents: Query<&ChildOf>,
    mut transforms: Query<&mut Transform>,
) {
    let oracle = AvianRaycast::new(&spatial);

    for (entity, leg) in &legs {
        let Some(chain) = leg.chain() else {
            continue;
        };
        let (Some(thigh), Some(shin), Some(foot)) = (leg.thigh, leg.shin, leg.foot) else {
            continue;
        };
        let (Ok(thigh_global), Ok(shin_global), Ok(foot_global)) =
            (globals.get(thigh), globals.get(shin), globals.get(foot))
        else {
            continue;
        };

        let hip = thigh_global.translation();
        let body_rotation = globals
            .get(leg.body.unwrap_or(entity))
            .map(GlobalTransform::rotation)
            .unwrap_or(Quat::IDENTITY);

        let world_scale = |e: Entity| globals.get(e).ok().map(GlobalTransform::scale);
        let parent_scale = parents.get(entity).ok().and_then(|c| world_scale(c.parent()));
        let mirrored = is_mirrored(world_scale(entity).unwrap_or(Vec3::ONE), parent_scale);

        let pole = leg
            .pole
            .and_then(|p| globals.get(p).ok())
            .map(|g| g.translation())
            .unwrap_or_else(|| shin_global.translation() + body_rotation * Vec3::NEG_Z);

        let target = if leg.grounding {
            leg.probe
                .probe(hip, chain.total_length(), body_rotation, &oracle)
                .pose
        } else {
            let fixed = leg.target.and_then(|t| globals.get(t).ok()).unwrap_or(foot_global);
            Pose::new(fixed.translation(), fixed.rotation())
        };

        let solution = leg.solver.solve(chain, hip, target, pole, mirrored);

        // Parents are written first, so children use the fresh world rotation.
        let mut written: Vec<(Entity, Quat)> = Vec::with_capacity(3);
        for (bone, rotation) in [
            (thigh, solution.thigh.rotation),
            (shin, solution.shin.rotation),
            (foot, solution.foot.rotation),
        ] {
            let parent_rotation = parents
                .get(bone)
                .ok()
                .map(|c| c.parent())
                .and_then(|p| {
                    written
                        .iter()
                        .find(|(e, _)| *e == p)
                        .map(|(_, r)| *r)
                        .or_else(|| globals.get(p).ok().map(GlobalTransform::rotation))
                })
                .unwrap_or(Quat::IDENTITY);
            if let Ok(mut transform) = transforms.get_mut(bone) {
                transform.rotation = (parent_rotation.inverse() * rotation).normalize();
            }
            written.push((bone, rotation));
        }
    }
}
