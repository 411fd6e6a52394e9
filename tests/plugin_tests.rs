use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_mechforge::plugin::{
    AssembledRobot, AssemblyState, LegIkState, PartMount, SocketIndicator, SocketMount,
};
use bevy_mechforge::*;

fn catalog() -> PartCatalog {
    PartCatalog::new()
        .with_part(
            Part::new("core", PartCategory::Core, Tier::T1)
                .with_socket(SocketSpec::new("Torso", PartCategory::Torso)),
        )
        .with_part(
            Part::new("torso", PartCategory::Torso, Tier::T1)
                .with_socket(SocketSpec::new("Arms", PartCategory::Arms).with_laterality(Laterality::Left))
                .with_socket(SocketSpec::new("Arms", PartCategory::Arms).with_laterality(Laterality::Right)),
        )
        .with_part(
            Part::new("arm", PartCategory::Arms, Tier::T1)
                .with_socket(SocketSpec::new("Weapon", PartCategory::Accessory)),
        )
}

fn session() -> Session {
    let catalog = catalog();
    let mut session = Session::new(catalog.clone());
    session.select_core(catalog.get("core").unwrap()).unwrap();
    session.select_part_for_socket("Torso", catalog.get("torso").unwrap());
    session.select_part_for_socket("Arms_L", catalog.get("arm").unwrap());
    session
}

fn app(session: Session) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, TransformPlugin, MechForgePlugin))
        // Keep fixed-step systems out of these tests.
        .insert_resource(Time::<Fixed>::from_seconds(1000.0))
        .insert_resource(session);
    app.world_mut().spawn((Transform::default(), AssemblyAnchor));
    app
}

fn count<C: Component>(app: &mut App) -> usize {
    let mut query = app.world_mut().query_filtered::<Entity, With<C>>();
    query.iter(app.world()).count()
}

#[test]
fn test_spawns_one_entity_per_node() {
    let mut app = app(session());
    app.update();

    assert_eq!(count::<AssembledRobot>(&mut app), 1);
    assert_eq!(count::<PartMount>(&mut app), 3);
    // Core 1, torso 2, arm 1.
    assert_eq!(count::<SocketMount>(&mut app), 4);
    assert_eq!(count::<SocketIndicator>(&mut app), 4);

    let mut mounts = app.world_mut().query::<&PartMount>();
    let arm = mounts
        .iter(app.world())
        .find(|m| m.part.as_str() == "arm")
        .expect("arm spawned");
    assert!(arm.mirrored);
    assert_eq!(arm.depth, 2);

    let mut sockets = app.world_mut().query::<&SocketMount>();
    assert!(sockets.iter(app.world()).any(|s| s.0.key() == "Weapon_L"));

    let state = app.world().resource::<AssemblyState>();
    assert!(state.spawned.is_some());
    assert_eq!(state.tree().map(|t| t.part_count()), Some(3));
}

#[test]
fn test_indicators_start_hidden() {
    let mut app = app(session());
    app.update();

    let mut query = app
        .world_mut()
        .query_filtered::<&Visibility, With<SocketIndicator>>();
    assert!(query.iter(app.world()).all(|v| *v == Visibility::Hidden));
}

#[test]
fn test_robot_is_parented_to_anchor() {
    let mut app = app(session());
    app.update();

    let mut anchors = app.world_mut().query_filtered::<Entity, With<AssemblyAnchor>>();
    let anchor = anchors.single(app.world()).unwrap();
    let mut robots = app.world_mut().query_filtered::<&ChildOf, With<AssembledRobot>>();
    let parent = robots.single(app.world()).unwrap().parent();
    assert_eq!(parent, anchor);
}

#[test]
fn test_session_change_rebuilds() {
    let mut app = app(session());
    app.update();
    assert_eq!(count::<PartMount>(&mut app), 3);

    app.world_mut()
        .resource_mut::<Session>()
        .unselect("Arms_L")
        .unwrap();
    app.update();

    assert_eq!(count::<PartMount>(&mut app), 2);
    assert_eq!(count::<SocketMount>(&mut app), 3);
    assert_eq!(count::<AssembledRobot>(&mut app), 1);
}

#[test]
fn test_unchanged_session_keeps_entities() {
    let mut app = app(session());
    app.update();
    let first = app.world().resource::<AssemblyState>().spawned;

    app.update();
    assert_eq!(app.world().resource::<AssemblyState>().spawned, first);
}

#[test]
fn test_no_core_spawns_nothing() {
    let mut app = app(Session::new(catalog()));
    app.update();

    assert_eq!(count::<AssembledRobot>(&mut app), 0);
    assert_eq!(count::<PartMount>(&mut app), 0);
    assert!(app.world().resource::<AssemblyState>().tree().is_none());
}

#[test]
fn test_leg_chain_is_measured_after_propagation() {
    let mut app = app(Session::new(catalog()));
    let world = app.world_mut();
    let leg = world.spawn(Transform::from_xyz(0.0, 2.0, 0.0)).id();
    let thigh = world.spawn((Transform::default(), ChildOf(leg))).id();
    let shin = world
        .spawn((Transform::from_xyz(0.0, -0.9, 0.0), ChildOf(thigh)))
        .id();
    let foot = world
        .spawn((Transform::from_xyz(0.0, -1.1, 0.0), ChildOf(shin)))
        .id();
    world
        .entity_mut(leg)
        .insert(LegIk::new(Some(thigh), Some(shin), Some(foot)));

    app.update();

    let leg_ik = app.world().get::<LegIk>(leg).unwrap();
    let chain = leg_ik.chain().expect("chain measured");
    assert!((chain.thigh_length() - 0.9).abs() < 1e-4);
    assert!((chain.shin_length() - 1.1).abs() < 1e-4);
}

#[test]
fn test_leg_with_missing_bone_disables_itself() {
    let mut app = app(Session::new(catalog()));
    let world = app.world_mut();
    let thigh = world.spawn(Transform::default()).id();
    let shin = world.spawn(Transform::from_xyz(0.0, -1.0, 0.0)).id();
    let leg = world.spawn(LegIk::new(Some(thigh), Some(shin), None)).id();

    app.update();
    assert_eq!(app.world().get::<LegIk>(leg).unwrap().state(), LegIkState::Disabled);

    // Adding the bone later does not bring the leg back.
    let foot = app.world_mut().spawn(Transform::from_xyz(0.0, -2.0, 0.0)).id();
    app.world_mut().get_mut::<LegIk>(leg).unwrap().foot = Some(foot);
    app.update();
    assert_eq!(app.world().get::<LegIk>(leg).unwrap().state(), LegIkState::Disabled);
}
