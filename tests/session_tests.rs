use std::sync::Arc;

use bevy_mechforge::part::SocketSpec;
use bevy_mechforge::session::SelectionChange;
use bevy_mechforge::*;

fn catalog() -> PartCatalog {
    PartCatalog::new()
        .with_part(
            Part::new("core_t1", PartCategory::Core, Tier::T1)
                .with_socket(SocketSpec::new("Torso", PartCategory::Torso)),
        )
        .with_part(
            Part::new("core_t2", PartCategory::Core, Tier::T2)
                .with_max_allowed_tier(Tier::T2),
        )
        .with_part(Part::new("torso_t1", PartCategory::Torso, Tier::T1))
        .with_part(Part::new("torso_t2", PartCategory::Torso, Tier::T2))
        .with_part(Part::new("torso_t3", PartCategory::Torso, Tier::T3))
        .with_part(Part::new("arm_t1", PartCategory::Arms, Tier::T1))
}

fn session() -> Session {
    let inventory = Inventory::new()
        .with_stock("torso_t1", 1)
        .with_stock("torso_t2", 2)
        .with_stock("torso_t3", 1)
        .with_stock("arm_t1", 2);
    Session::new(catalog()).with_inventory(inventory)
}

fn part(session: &Session, id: &str) -> Arc<Part> {
    session.catalog().get(id).expect("part in catalog")
}

fn torso_socket() -> Socket {
    Socket::from_spec(&SocketSpec::new("Torso", PartCategory::Torso))
}

#[test]
fn test_equip_takes_from_inventory() {
    let mut session = session();
    let torso = part(&session, "torso_t1");

    let change = session.equip(&torso_socket(), torso.clone()).unwrap();
    assert_eq!(
        change,
        SelectionChange::Equipped {
            part: torso.id.clone(),
            replaced: None
        }
    );
    assert_eq!(session.inventory().count(&torso.id), 0);
    assert_eq!(
        session.selection().get("Torso").map(|p| p.id.clone()),
        Some(torso.id.clone())
    );
}

#[test]
fn test_equip_same_part_again_unequips_and_refunds() {
    let mut session = session();
    let torso = part(&session, "torso_t1");
    let socket = torso_socket();

    session.equip(&socket, torso.clone()).unwrap();
    let change = session.equip(&socket, torso.clone()).unwrap();

    assert_eq!(change, SelectionChange::Unequipped { part: torso.id.clone() });
    assert!(!session.selection().contains("Torso"));
    assert_eq!(session.inventory().count(&torso.id), 1);
}

#[test]
fn test_swapping_refunds_replaced_part() {
    let mut session = session();
    let socket = torso_socket();
    let t1 = part(&session, "torso_t1");
    let t2 = part(&session, "torso_t2");

    session.equip(&socket, t1.clone()).unwrap();
    let change = session.equip(&socket, t2.clone()).unwrap();

    assert_eq!(
        change,
        SelectionChange::Equipped {
            part: t2.id.clone(),
            replaced: Some(t1.id.clone())
        }
    );
    assert_eq!(session.inventory().count(&t1.id), 1);
    assert_eq!(session.inventory().count(&t2.id), 1);
}

#[test]
fn test_out_of_stock_is_rejected() {
    let mut session = session();
    session.inventory_mut().set("torso_t1", 0);
    let torso = part(&session, "torso_t1");

    assert_eq!(
        session.equip(&torso_socket(), torso.clone()),
        Err(SelectionError::OutOfStock(torso.id.clone()))
    );
    assert!(session.selection().is_empty());
}

#[test]
fn test_category_mismatch_is_rejected() {
    let mut session = session();
    let arm = part(&session, "arm_t1");

    let err = session.equip(&torso_socket(), arm).unwrap_err();
    assert!(matches!(
        err,
        SelectionError::CategoryMismatch {
            expected: PartCategory::Torso,
            got: PartCategory::Arms,
            ..
        }
    ));
    assert_eq!(session.inventory().count(&PartId::from("arm_t1")), 2);
}

#[test]
fn test_socket_max_tier_is_enforced() {
    let mut session = session();
    let socket = Socket::from_spec(
        &SocketSpec::new("Torso", PartCategory::Torso).with_max_tier(Tier::T2),
    );

    assert!(session.equip(&socket, part(&session, "torso_t2")).is_ok());
    assert_eq!(
        session.equip(&socket, part(&session, "torso_t3")),
        Err(SelectionError::TierNotAllowed {
            socket: "Torso".to_string(),
            max: Tier::T2,
            tier: Tier::T3,
        })
    );
}

#[test]
fn test_only_cores_before_core_is_chosen() {
    let session = session();
    let offered: Vec<_> = session
        .available_parts(PartCategory::Torso)
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(offered, ["core_t1", "core_t2"]);
}

#[test]
fn test_core_tier_caps_available_parts() {
    let mut session = session();
    session.select_core(part(&session, "core_t1")).unwrap();
    let offered: Vec<_> = session
        .available_parts(PartCategory::Torso)
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(offered, ["torso_t1"]);

    session.select_core(part(&session, "core_t2")).unwrap();
    let offered: Vec<_> = session
        .available_parts(PartCategory::Torso)
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(offered, ["torso_t1", "torso_t2"]);
}

#[test]
fn test_select_core_rejects_other_categories() {
    let mut session = session();
    let torso = part(&session, "torso_t1");
    assert_eq!(
        session.select_core(torso),
        Err(SelectionError::NotACore(PartId::from("torso_t1")))
    );
    assert!(session.core().is_none());
}

#[test]
fn test_unselect_refunds() {
    let mut session = session();
    let arm = part(&session, "arm_t1");
    session.select_part_for_socket("Arms_L", arm.clone());

    let removed = session.unselect("Arms_L").unwrap();
    assert_eq!(removed.id, arm.id);
    assert_eq!(session.inventory().count(&arm.id), 3);
    assert_eq!(
        session.unselect("Arms_L").unwrap_err(),
        SelectionError::NothingEquipped("Arms_L".to_string())
    );
}

#[test]
fn test_complete_needs_core_and_torso() {
    let mut session = session();
    assert!(!session.is_complete());

    session.select_core(part(&session, "core_t1")).unwrap();
    assert!(!session.is_complete());

    session.equip(&torso_socket(), part(&session, "torso_t1")).unwrap();
    assert!(session.is_complete());
}

#[test]
fn test_sessions_are_independent() {
    let mut a = session();
    let b = session();
    a.equip(&torso_socket(), part(&a, "torso_t1")).unwrap();
    assert!(b.selection().is_empty());
    assert_eq!(b.inventory().count(&PartId::from("torso_t1")), 1);
}

#[test]
fn test_socket_display_name() {
    let socket = Socket::from_spec(
        &SocketSpec::new("Socket_Upper_Arm", PartCategory::Arms).with_laterality(Laterality::Left),
    );
    assert_eq!(socket.display_name(), "Upper Arm (Left)");
    assert_eq!(torso_socket().display_name(), "Torso");
}
