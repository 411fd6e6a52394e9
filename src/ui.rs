//! Egui UI helpers for the loadout editor.
//!
//! Provides reusable widgets for picking a core and equipping parts on the
//! sockets of the current [`AssemblyTree`], so any application with
//! `bevy_egui` can embed the forge menu.
//!
//! The widgets take `&mut Session`. When the session lives in a Bevy
//! resource, borrow it through `bypass_change_detection` and call
//! `set_changed` only when a widget returns `true`, otherwise every frame
//! the menu is open rebuilds the robot.

use bevy_egui::egui;

use crate::assembly::AssemblyTree;
use crate::part::{PartCategory, Tier};
use crate::session::Session;

/// Renders the core picker. Returns `true` if the core changed.
pub fn core_picker(ui: &mut egui::Ui, session: &mut Session) -> bool {
    let current = session.core().map(|core| core.id.clone());
    let mut picked = None;

    ui.label("Core:");
    for part in session.catalog().parts_by_category(PartCategory::Core, Tier::T3) {
        let stock = session.inventory().count(&part.id);
        let selected = current.as_ref() == Some(&part.id);
        let label = format!("{} ({:?}) x{}", part.id, part.tier, stock);
        if ui.selectable_label(selected, label).clicked() && !selected {
            picked = Some(part);
        }
    }

    let Some(part) = picked else {
        return false;
    };
    session.select_core(part).is_ok()
}

/// Renders one collapsible section per socket of `tree`, listing the parts
/// the session may put there.
///
/// Clicking the equipped part again takes it off. Returns `true` if the
/// selection was modified.
pub fn socket_menu(ui: &mut egui::Ui, session: &mut Session, tree: &AssemblyTree) -> bool {
    let mut any_changed = false;

    for socket_id in tree.sockets().collect::<Vec<_>>() {
        let Some(socket) = tree.socket(socket_id).cloned() else {
            continue;
        };
        let key = socket.key();
        let equipped = session.selection().get(&key).map(|part| part.id.clone());
        let status = if equipped.is_some() { "[READY]" } else { "[EMPTY]" };

        let mut clicked = None;
        egui::CollapsingHeader::new(format!("{} {}", socket.display_name(), status))
            .id_salt(&key)
            .show(ui, |ui| {
                let parts = session.available_parts(socket.category);
                if parts.is_empty() {
                    ui.weak("No parts available");
                }
                for part in parts {
                    if part.tier > socket.max_tier {
                        continue;
                    }
                    let stock = session.inventory().count(&part.id);
                    let selected = equipped.as_ref() == Some(&part.id);
                    let label = format!("{} ({:?}) x{}", part.id, part.tier, stock);
                    if ui.selectable_label(selected, label).clicked() {
                        clicked = Some(part);
                    }
                }
            });

        let Some(part) = clicked else {
            continue;
        };
        match session.equip(&socket, part) {
            Ok(_) => any_changed = true,
            Err(err) => bevy::log::warn!("{err}"),
        }
    }

    any_changed
}
