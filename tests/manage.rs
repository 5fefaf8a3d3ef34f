mod common;

use axwm::Config;
use axwm::{Rule, SwitchTag};
use axwm::display::{DisplayCall, FocusTarget};
use axwm::geometry::WindowGeometry;
use axwm::manage::{ConfigureRequest, PropertyUpdate, StateAction};
use common::{SCREEN, geometry, manager, map, request};

#[test]
fn tiled_windows_split_into_master_and_stack() {
    let mut wm = manager(Config::default());
    for window in 1..=3 {
        map(&mut wm, window);
    }

    let area = wm.monitors[0].work_area;
    let cells: Vec<WindowGeometry> = (1..=3).map(|window| geometry(&wm, window)).collect();
    for cell in &cells {
        assert!(cell.x >= area.x && cell.x + cell.outer_width() <= area.right());
        assert!(cell.y >= area.y && cell.y + cell.outer_height() <= area.bottom());
    }

    let left = cells.iter().map(|cell| cell.x).min().unwrap();
    let masters = cells.iter().filter(|cell| cell.x == left).count();
    assert_eq!(masters, 1);
    let stack: Vec<&WindowGeometry> = cells.iter().filter(|cell| cell.x != left).collect();
    assert_eq!(stack.len(), 2);
    assert_eq!(stack[0].x, stack[1].x);
    assert_ne!(stack[0].y, stack[1].y);
}

#[test]
fn newest_window_takes_focus_and_client_list_follows() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    map(&mut wm, 2);

    assert_eq!(wm.selected_window(), Some(2));
    assert_eq!(wm.monitors[0].stack.first(), Some(&2));
    assert_eq!(
        wm.display.last_focus(),
        Some(FocusTarget::Client {
            window: 2,
            never_focus: false
        })
    );
    let list = wm.display.calls.iter().rev().find_map(|call| match call {
        DisplayCall::ClientList(windows) => Some(windows.clone()),
        _ => None,
    });
    let mut list = list.unwrap();
    list.sort_unstable();
    assert_eq!(list, vec![1, 2]);
}

#[test]
fn unmanage_restores_the_border_and_refocuses() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    let mut bordered = request(2, "xterm");
    bordered.geometry.border_width = 3;
    wm.manage(bordered);
    assert_eq!(wm.selected_window(), Some(2));

    wm.on_unmap(2, false);
    assert!(!wm.clients.contains_key(&2));
    assert!(wm.display.calls.contains(&DisplayCall::Withdraw(2, Some(3))));
    assert_eq!(wm.selected_window(), Some(1));

    wm.on_destroy(1);
    assert!(wm.clients.is_empty());
    assert_eq!(wm.display.last_focus(), Some(FocusTarget::Root));
    assert!(!wm.display.calls.contains(&DisplayCall::Withdraw(1, Some(0))));
}

#[test]
fn synthetic_unmap_only_withdraws() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    wm.on_unmap(1, true);
    assert!(wm.clients.contains_key(&1));
    assert!(wm.display.calls.contains(&DisplayCall::Withdraw(1, None)));
}

#[test]
fn transient_windows_float_with_their_parent_tags() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    wm.view(1 << 2);
    let mut dialog = request(2, "xterm");
    dialog.transient_for = Some(1);
    wm.manage(dialog);

    let client = &wm.clients[&2];
    assert!(client.is_floating);
    assert_eq!(client.tags, 1);
}

#[test]
fn rules_route_windows_to_tags() {
    let mut config = Config::default();
    config.rules.push(Rule {
        class: Some("Gimp".into()),
        tags: 1 << 3,
        is_floating: true,
        ..Rule::default()
    });
    let mut wm = manager(config);
    wm.manage(request(1, "Gimp"));

    let client = &wm.clients[&1];
    assert_eq!(client.tags, 1 << 3);
    assert!(client.is_floating);
    assert!(!wm.is_visible(1));
}

#[test]
fn tiled_configure_requests_get_a_synthetic_notify() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    let before = geometry(&wm, 1);
    wm.display.clear();

    let handled = wm.on_configure_request(
        1,
        ConfigureRequest {
            width: Some(50),
            height: Some(50),
            ..ConfigureRequest::default()
        },
    );
    assert!(handled);
    assert_eq!(geometry(&wm, 1), before);
    assert_eq!(wm.display.calls, vec![DisplayCall::ConfigureNotify(1, before)]);
}

#[test]
fn floating_configure_requests_are_honored() {
    let mut config = Config::default();
    config.rules.push(Rule {
        class: Some("mpv".into()),
        is_floating: true,
        ..Rule::default()
    });
    let mut wm = manager(config);
    wm.manage(request(1, "mpv"));

    let handled = wm.on_configure_request(
        1,
        ConfigureRequest {
            x: Some(200),
            y: Some(150),
            width: Some(400),
            height: Some(300),
            ..ConfigureRequest::default()
        },
    );
    assert!(handled);
    let geometry = geometry(&wm, 1);
    assert_eq!((geometry.x, geometry.y), (200, 150));
    assert_eq!((geometry.width, geometry.height), (400, 300));
    assert!(wm.display.calls.contains(&DisplayCall::Configure(1, geometry)));
}

#[test]
fn unmanaged_configure_requests_are_left_to_the_caller() {
    let mut wm = manager(Config::default());
    assert!(!wm.on_configure_request(42, ConfigureRequest::default()));
}

#[test]
fn fullscreen_requests_cover_the_screen_and_restore() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    map(&mut wm, 2);
    let tiled = geometry(&wm, 2);

    wm.on_fullscreen_request(2, StateAction::Add);
    let client = &wm.clients[&2];
    assert!(client.is_fullscreen);
    assert_eq!(
        client.geometry,
        WindowGeometry::new(SCREEN.x, SCREEN.y, SCREEN.width, SCREEN.height, 0)
    );
    assert!(wm.display.calls.contains(&DisplayCall::Fullscreen(2, true)));

    wm.on_fullscreen_request(2, StateAction::Toggle);
    let client = &wm.clients[&2];
    assert!(!client.is_fullscreen);
    assert!(!client.is_floating);
    assert_eq!(client.geometry, tiled);
}

#[test]
fn activation_marks_urgent_instead_of_focusing() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    map(&mut wm, 2);

    wm.on_activate_request(1);
    assert!(wm.clients[&1].is_urgent);
    assert_eq!(wm.selected_window(), Some(2));
    assert!(wm.display.calls.contains(&DisplayCall::Urgent(1, true)));

    wm.focus(Some(1));
    assert!(!wm.clients[&1].is_urgent);
}

#[test]
fn property_updates_reach_the_client() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    map(&mut wm, 2);

    wm.on_property_change(1, PropertyUpdate::Title("renamed".into()));
    assert_eq!(wm.clients[&1].name, "renamed");

    wm.on_property_change(
        1,
        PropertyUpdate::WmHints {
            urgent: true,
            input: Some(false),
        },
    );
    assert!(wm.clients[&1].is_urgent);
    assert!(wm.clients[&1].never_focus);

    wm.on_property_change(2, PropertyUpdate::TransientFor(Some(1)));
    assert!(wm.clients[&2].is_floating);
}

fn switching_rule(mode: SwitchTag) -> Config {
    let mut config = Config::default();
    config.rules.push(Rule {
        class: Some("Viewer".into()),
        tags: 1 << 3,
        switch_tag: mode,
        ..Rule::default()
    });
    config
}

#[test]
fn switching_rules_view_the_new_client() {
    let mut wm = manager(switching_rule(SwitchTag::View));
    map(&mut wm, 1);
    wm.manage(request(2, "Viewer"));

    assert_eq!(wm.current_monitor().tags(), 1 << 3);
    assert!(wm.is_visible(2));
    assert!(!wm.is_visible(1));
    assert_eq!(wm.selected_window(), Some(2));

    wm.unmanage(2, false);
    assert_eq!(wm.current_monitor().tags(), 1 << 3);
}

#[test]
fn reverting_rules_restore_the_view_on_close() {
    let mut wm = manager(switching_rule(SwitchTag::ViewAndRevert));
    map(&mut wm, 1);
    wm.manage(request(2, "Viewer"));
    assert_eq!(wm.current_monitor().tags(), 1 << 3);
    assert_eq!(wm.clients[&2].switch_tag, Some(1));

    wm.unmanage(2, true);
    assert_eq!(wm.current_monitor().tags(), 1);
    assert_eq!(wm.selected_window(), Some(1));
}

#[test]
fn adding_rules_extend_the_view() {
    let mut wm = manager(switching_rule(SwitchTag::AddAndRevert));
    map(&mut wm, 1);
    wm.manage(request(2, "Viewer"));
    assert_eq!(wm.current_monitor().tags(), 1 | 1 << 3);
    assert!(wm.is_visible(1) && wm.is_visible(2));

    wm.unmanage(2, false);
    assert_eq!(wm.current_monitor().tags(), 1);
}

#[test]
fn retagging_drops_the_pending_revert() {
    let mut wm = manager(switching_rule(SwitchTag::ViewAndRevert));
    map(&mut wm, 1);
    wm.manage(request(2, "Viewer"));
    wm.tag(1 << 5);
    assert_eq!(wm.clients[&2].switch_tag, None);

    wm.unmanage(2, false);
    assert_eq!(wm.current_monitor().tags(), 1 << 3);
}

#[test]
fn switching_rules_leave_a_shown_tag_alone() {
    let mut wm = manager(switching_rule(SwitchTag::ViewAndRevert));
    wm.view(1 << 3);
    wm.manage(request(1, "Viewer"));
    assert_eq!(wm.clients[&1].switch_tag, None);
    assert_eq!(wm.current_monitor().tags(), 1 << 3);
}

#[test]
fn floating_rules_carry_their_own_border() {
    let mut config = Config::default();
    config.rules.push(Rule {
        class: Some("Scratchpad".into()),
        is_floating: true,
        float_border: Some(4),
        ..Rule::default()
    });
    let mut wm = manager(config);
    wm.manage(request(1, "Scratchpad"));

    assert_eq!(geometry(&wm, 1).border_width, 4);
    assert!(
        wm.display
            .calls
            .iter()
            .any(|call| matches!(call, DisplayCall::Configure(1, placed) if placed.border_width == 4))
    );

    wm.float_pos("0a 26a");
    assert_eq!(geometry(&wm, 1).border_width, 4);

    wm.toggle_floating();
    assert!(!wm.clients[&1].is_floating);
    assert_eq!(geometry(&wm, 1).border_width, Config::default().border_width);
}

#[test]
fn rule_positions_place_the_new_client() {
    let mut config = Config::default();
    config.rules.push(Rule {
        class: Some("Scratchpad".into()),
        is_floating: true,
        float_pos: Some("50% 50%".into()),
        ..Rule::default()
    });
    let mut wm = manager(config);
    wm.manage(request(1, "Scratchpad"));

    let placed = geometry(&wm, 1);
    let area = wm.monitors[0].work_area;
    assert_eq!((placed.width, placed.height), (300, 200));
    assert!((placed.x + placed.outer_width() / 2 - (area.x + area.width / 2)).abs() <= 1);
    assert!((placed.y + placed.outer_height() / 2 - (area.y + area.height / 2)).abs() <= 1);
    assert!(wm.clients[&1].ignore_size_hints);
}
