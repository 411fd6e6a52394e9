use bevy::prelude::*;
use bevy_mechforge::collider::DEFAULT_CAMERA_ZOOM;
use bevy_mechforge::part::PartBounds;
use bevy_mechforge::session::Selection;
use bevy_mechforge::*;

fn assemble(catalog: &PartCatalog, selection: &Selection) -> AssemblyTree {
    let core = catalog.get("core").expect("core in catalog");
    SocketAssembler::new()
        .assemble(Transform::IDENTITY, &core, selection)
        .clone()
}

fn catalog() -> PartCatalog {
    PartCatalog::new()
        .with_part(
            Part::new("core", PartCategory::Core, Tier::T1)
                .with_bounds(PartBounds::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.5, 0.5, 0.5)))
                .with_socket(
                    SocketSpec::new("Torso", PartCategory::Torso)
                        .with_transform(Transform::from_xyz(0.0, 1.5, 0.0)),
                ),
        )
        .with_part(
            Part::new("torso", PartCategory::Torso, Tier::T1)
                .with_bounds(PartBounds::new(Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.5, 0.5, 0.3))),
        )
        .with_part(Part::new("bare_core", PartCategory::Core, Tier::T1))
}

#[test]
fn test_fit_covers_all_part_bounds() {
    let catalog = catalog();
    let mut selection = Selection::new();
    selection.insert("Torso", catalog.get("torso").unwrap());
    let tree = assemble(&catalog, &selection);

    let fit = BodyFitter::new().fit(&tree).expect("parts have bounds");

    // Core spans y 0.5..1.5, torso 1.5..2.5.
    assert!((fit.min.y - 0.5).abs() < 1e-4);
    assert!((fit.max.y - 2.5).abs() < 1e-4);
    assert!((fit.height - 2.0).abs() < 1e-4);
    assert!((fit.center - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-4);
    // (1.0 + 1.0) / 4
    assert!((fit.radius - 0.5).abs() < 1e-4);
    assert!((fit.mass - 50.0).abs() < 1e-3);
    assert!((fit.cylinder_length() - 1.0).abs() < 1e-4);
    assert!((fit.follow_distance(DEFAULT_CAMERA_ZOOM) - 8.0).abs() < 1e-3);
}

#[test]
fn test_fit_ignores_socket_indicators() {
    let catalog = catalog();
    let tree = assemble(&catalog, &Selection::new());
    let fit = BodyFitter::new().fit(&tree).unwrap();

    // Only the core's own box; the indicator under the torso socket adds
    // nothing.
    assert!((fit.max.y - 1.5).abs() < 1e-4);
    assert!((fit.height - 1.0).abs() < 1e-4);
}

#[test]
fn test_fit_without_bounds_is_none() {
    let catalog = catalog();
    let core = catalog.get("bare_core").unwrap();
    let mut assembler = SocketAssembler::new();
    let tree = assembler.assemble(Transform::IDENTITY, &core, &Selection::new());
    assert!(BodyFitter::new().fit(tree).is_none());
}

#[test]
fn test_short_body_has_no_cylinder() {
    let catalog = PartCatalog::new().with_part(
        Part::new("core", PartCategory::Core, Tier::T1)
            .with_bounds(PartBounds::new(Vec3::ZERO, Vec3::new(2.0, 0.25, 2.0))),
    );
    let tree = assemble(&catalog, &Selection::new());
    let fit = BodyFitter::new().with_mass_per_height(10.0).fit(&tree).unwrap();

    assert_eq!(fit.cylinder_length(), 0.0);
    assert!((fit.mass - 5.0).abs() < 1e-4);
}

#[cfg(feature = "physics")]
#[test]
fn test_short_body_collider_is_a_sphere() {
    use avian3d::prelude::*;

    let catalog = PartCatalog::new().with_part(
        Part::new("core", PartCategory::Core, Tier::T1)
            .with_bounds(PartBounds::new(Vec3::ZERO, Vec3::new(2.0, 0.25, 2.0))),
    );
    let tree = assemble(&catalog, &Selection::new());
    let fit = BodyFitter::new().fit(&tree).unwrap();
    assert!(fit.collider().shape().as_ball().is_some());
}
