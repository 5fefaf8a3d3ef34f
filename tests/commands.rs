mod common;

use axwm::Config;
use axwm::client::FakeFullscreen;
use axwm::commands::tag_grid;
use axwm::display::{BorderScheme, DisplayCall};
use axwm::keyboard::keysyms::from_char;
use axwm::layout::{AxisConfig, LayoutKind};
use common::{Manager, geometry, manager, map};
use x11rb::protocol::xproto::KeyButMask;

/// Three tiled clients: `1` is the master, `2` and `3` form the stack and
/// `3` is selected.
fn three_tiled() -> Manager {
    let mut wm = manager(Config::default());
    for window in 1..=3 {
        map(&mut wm, window);
    }
    assert_eq!(wm.monitors[0].clients, vec![1, 2, 3]);
    assert_eq!(wm.selected_window(), Some(3));
    wm
}

#[test]
fn key_presses_dispatch_to_bindings() {
    let mut wm = three_tiled();
    let modkey = u16::from(KeyButMask::MOD4);

    assert!(wm.on_key_press(from_char('j'), modkey, 0));
    assert_eq!(wm.selected_window(), Some(1));
    assert!(wm.on_key_press(from_char('k'), modkey, 0));
    assert_eq!(wm.selected_window(), Some(3));

    let caps_lock = u16::from(KeyButMask::LOCK);
    assert!(wm.on_key_press(from_char('k'), modkey | caps_lock, 0));
    assert_eq!(wm.selected_window(), Some(2));

    assert!(!wm.on_key_press(from_char('j'), 0, 0));
    assert_eq!(wm.selected_window(), Some(2));
}

#[test]
fn zoom_swaps_with_the_master_and_back() {
    let mut wm = three_tiled();
    wm.zoom();
    assert_eq!(wm.monitors[0].clients, vec![3, 2, 1]);
    assert_eq!(wm.selected_window(), Some(3));

    wm.zoom();
    assert_eq!(wm.monitors[0].clients, vec![1, 2, 3]);
    assert_eq!(wm.selected_window(), Some(1));
}

#[test]
fn transfer_moves_a_stack_client_into_the_master_group() {
    let mut wm = three_tiled();
    wm.transfer();
    assert_eq!(wm.current_monitor().nmaster, 2);
    assert_eq!(wm.monitors[0].clients, vec![1, 3, 2]);
}

#[test]
fn inplace_rotation_keeps_focus_on_the_slot() {
    let mut wm = three_tiled();
    wm.inplace_rotate(1);
    assert_eq!(wm.monitors[0].clients, vec![1, 3, 2]);
    assert_eq!(wm.selected_window(), Some(2));
}

#[test]
fn directional_focus_and_column_switching() {
    let mut wm = three_tiled();
    wm.focus_direction(2);
    assert_eq!(wm.selected_window(), Some(2));
    wm.focus_direction(0);
    assert_eq!(wm.selected_window(), Some(1));

    wm.focus(Some(3));
    wm.switch_column();
    assert_eq!(wm.selected_window(), Some(1));
    wm.switch_column();
    assert_eq!(wm.selected_window(), Some(3));
}

#[test]
fn place_direction_swaps_slots() {
    let mut wm = three_tiled();
    let master_cell = geometry(&wm, 1);
    wm.place_direction(0);
    assert_eq!(wm.monitors[0].clients, vec![3, 2, 1]);
    assert_eq!(geometry(&wm, 3), master_cell);
    assert_eq!(wm.selected_window(), Some(3));
}

#[test]
fn master_fraction_is_bounded() {
    let mut wm = three_tiled();
    let mfact = wm.current_monitor().mfact;
    wm.set_mfact(0.5);
    assert_eq!(wm.current_monitor().mfact, mfact);
    wm.set_mfact(1.3);
    assert!((wm.current_monitor().mfact - 0.3).abs() < 1e-6);
}

#[test]
fn client_factor_adjusts_and_resets() {
    let mut wm = three_tiled();
    wm.set_cfact(0.25);
    assert_eq!(wm.clients[&3].cfact, 1.25);
    wm.set_cfact(5.0);
    assert_eq!(wm.clients[&3].cfact, 1.25);
    wm.set_cfact(0.0);
    assert_eq!(wm.clients[&3].cfact, 1.0);
}

#[test]
fn layouts_toggle_and_cycle() {
    let mut wm = three_tiled();
    wm.set_layout(None);
    assert_eq!(wm.current_monitor().layout(), LayoutKind::Floating);
    wm.set_layout(None);
    assert_eq!(wm.current_monitor().layout(), LayoutKind::Tile);

    wm.cycle_layout();
    assert_eq!(wm.current_monitor().layout(), LayoutKind::Floating);
    wm.cycle_layout();
    assert_eq!(wm.current_monitor().layout(), LayoutKind::Monocle);
    wm.cycle_layout();
    assert_eq!(wm.current_monitor().layout(), LayoutKind::Tile);
}

#[test]
fn layout_axes_rotate_and_mirror() {
    let mut wm = three_tiled();
    wm.rotate_layout_axis(1);
    assert_eq!(wm.current_monitor().axis, AxisConfig::new(1, 3, 2).unwrap());
    wm.rotate_layout_axis(1);
    assert_eq!(wm.current_monitor().axis, AxisConfig::new(1, 1, 2).unwrap());
    wm.rotate_layout_axis(2);
    assert_eq!(wm.current_monitor().axis, AxisConfig::new(1, 1, 3).unwrap());

    wm.mirror_layout();
    assert_eq!(wm.current_monitor().axis.primary, -1);
    let master = geometry(&wm, 1);
    let stack = geometry(&wm, 2);
    assert!(master.x > stack.x);
}

#[test]
fn primary_rotation_frees_the_new_primary_axis() {
    let mut wm = three_tiled();
    wm.rotate_layout_axis(0);
    assert_eq!(wm.current_monitor().axis, AxisConfig::new(2, 1, 1).unwrap());
}

#[test]
fn gaps_switch_borders_below_the_threshold() {
    let mut wm = three_tiled();
    wm.set_gaps(-2);
    assert_eq!(wm.current_monitor().gap, 2);
    assert_eq!(wm.display.border_of(2), Some(BorderScheme::Seamless));

    wm.set_gaps(0);
    assert_eq!(wm.current_monitor().gap, 0);
    wm.set_gaps(-1);
    assert_eq!(wm.current_monitor().gap, 0);

    wm.set_gaps(4);
    assert_eq!(wm.current_monitor().gap, 4);
    assert_eq!(wm.display.border_of(2), Some(BorderScheme::Unfocused));
}

#[test]
fn bar_visibility_is_remembered_per_tag() {
    let mut wm = three_tiled();
    let with_bar = wm.current_monitor().work_area;

    wm.toggle_bar();
    assert!(!wm.current_monitor().show_bar);
    assert_eq!(wm.current_monitor().work_area, wm.current_monitor().screen);

    wm.view(1 << 1);
    assert!(wm.current_monitor().show_bar);
    assert_eq!(wm.current_monitor().work_area, with_bar);

    wm.view(1);
    assert!(!wm.current_monitor().show_bar);
}

#[test]
fn floating_toggle_centers_then_remembers() {
    let mut wm = three_tiled();
    wm.toggle_floating();
    assert!(wm.clients[&3].is_floating);
    let area = wm.current_monitor().work_area;
    let floating = geometry(&wm, 3);
    let center = floating.x + floating.outer_width() / 2;
    assert!((center - (area.x + area.width / 2)).abs() <= 1);

    wm.toggle_floating();
    assert!(!wm.clients[&3].is_floating);
    assert!(wm.clients[&3].float_geometry.is_some());

    wm.toggle_floating();
    let restored = geometry(&wm, 3);
    assert_eq!((restored.x, restored.y), (floating.x, floating.y));
}

#[test]
fn fake_fullscreen_keeps_the_tile() {
    let mut wm = three_tiled();
    let cell = geometry(&wm, 3);

    wm.toggle_fake_fullscreen();
    let client = &wm.clients[&3];
    assert!(client.is_fullscreen);
    assert_eq!(client.fake_fullscreen, FakeFullscreen::Fake);
    assert_eq!(client.geometry, cell);
    assert!(wm.display.calls.contains(&DisplayCall::Fullscreen(3, true)));

    wm.toggle_fake_fullscreen();
    let client = &wm.clients[&3];
    assert!(!client.is_fullscreen);
    assert_eq!(client.fake_fullscreen, FakeFullscreen::Off);
}

#[test]
fn kill_and_quit() {
    let mut wm = three_tiled();
    wm.kill_client();
    assert_eq!(wm.display.calls.last(), Some(&DisplayCall::Close(3)));

    assert!(wm.running);
    let quit = KeyButMask::MOD4 | KeyButMask::CONTROL | KeyButMask::SHIFT;
    assert!(wm.on_key_press(from_char('q'), u16::from(quit), 0));
    assert!(!wm.running);
}

#[test]
fn float_position_moves_the_floating_selection_and_warps() {
    let mut wm = three_tiled();
    wm.toggle_floating();
    wm.display.calls.clear();

    wm.float_pos("50% 50% 400W 300H");
    let placed = geometry(&wm, 3);
    let area = wm.current_monitor().work_area;
    assert_eq!((placed.outer_width(), placed.outer_height()), (400, 300));
    assert!((placed.x + placed.outer_width() / 2 - (area.x + area.width / 2)).abs() <= 1);
    assert!((placed.y + placed.outer_height() / 2 - (area.y + area.height / 2)).abs() <= 1);
    assert!(wm.display.calls.contains(&DisplayCall::Raise(3)));
    assert!(wm.display.calls.contains(&DisplayCall::Warp(3, 199, 149)));

    wm.float_pos("0a 26a");
    let nudged = geometry(&wm, 3);
    assert_eq!((nudged.x, nudged.y), (placed.x, placed.y + 26));
}

#[test]
fn float_position_leaves_tiles_and_bad_strings_alone() {
    let mut wm = three_tiled();
    let cell = geometry(&wm, 3);
    wm.display.calls.clear();

    wm.float_pos("0a 26a");
    wm.float_pos("26q 0a");
    assert_eq!(geometry(&wm, 3), cell);
    assert!(
        !wm.display
            .calls
            .iter()
            .any(|call| matches!(call, DisplayCall::Warp(..)))
    );
}

#[test]
fn float_position_keys_work_in_the_floating_layout() {
    let mut wm = three_tiled();
    wm.set_layout(Some(LayoutKind::Floating));
    let before = geometry(&wm, 3);

    let shift = u16::from(KeyButMask::MOD4 | KeyButMask::SHIFT);
    assert!(wm.on_key_press(axwm::keyboard::keysyms::XK_RIGHT, shift, 0));
    let after = geometry(&wm, 3);
    assert_eq!((after.x, after.y), (before.x + 26, before.y));
}

#[test]
fn tag_grid_moves_view_and_carry_the_selection() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);

    wm.switch_tag(tag_grid::DOWN | tag_grid::TAG | tag_grid::VIEW);
    assert_eq!(wm.clients[&1].tags, 1 << 5);
    assert_eq!(wm.current_monitor().tags(), 1 << 5);
    assert_eq!(wm.selected_window(), Some(1));

    wm.switch_tag(tag_grid::RIGHT | tag_grid::VIEW);
    assert_eq!(wm.current_monitor().tags(), 1 << 6);
    assert_eq!(wm.clients[&1].tags, 1 << 5);

    wm.switch_tag(tag_grid::LEFT | tag_grid::VIEW);
    wm.switch_tag(tag_grid::LEFT | tag_grid::VIEW);
    assert_eq!(wm.current_monitor().tags(), 1 << 8);

    let alt = u16::from(KeyButMask::MOD4 | KeyButMask::MOD1);
    assert!(wm.on_key_press(from_char('k'), alt, 0));
    assert_eq!(wm.current_monitor().tags(), 1 << 3);
}

#[test]
fn shifting_the_view_skips_empty_tags() {
    let mut wm = manager(Config::default());
    map(&mut wm, 1);
    map(&mut wm, 2);
    wm.tag(1 << 2);
    assert_eq!(wm.clients[&2].tags, 1 << 2);

    wm.shift_view_clients(1);
    assert_eq!(wm.current_monitor().tags(), 1 << 2);
    wm.shift_view_clients(1);
    assert_eq!(wm.current_monitor().tags(), 1);
    wm.shift_view_clients(-1);
    assert_eq!(wm.current_monitor().tags(), 1 << 2);

    let mut empty = manager(Config::default());
    empty.shift_view_clients(1);
    assert_eq!(empty.current_monitor().tags(), 1 << 1);
    empty.shift_view_clients(9);
    assert_eq!(empty.current_monitor().tags(), 1 << 1);
}

#[test]
fn both_bars_cycle_together() {
    let mut wm = three_tiled();
    let bar_height = Config::default().bar_height;
    let one_bar = wm.current_monitor().work_area;
    assert_eq!(wm.current_monitor().bar_count(), 1);

    wm.toggle_bars();
    assert_eq!(wm.current_monitor().bar_count(), 0);
    assert_eq!(wm.current_monitor().work_area, wm.current_monitor().screen);

    wm.toggle_bars();
    let monitor = wm.current_monitor();
    assert!(monitor.show_bar && monitor.show_extra_bar);
    assert_eq!(monitor.work_area.y, one_bar.y + bar_height);
    assert_eq!(monitor.work_area.height, one_bar.height - bar_height);
    let master = geometry(&wm, 1);
    assert!(master.y >= monitor.work_area.y);

    wm.toggle_bars();
    assert!(!wm.current_monitor().show_extra_bar);
    assert_eq!(wm.current_monitor().work_area, one_bar);
    assert!(wm.display.calls.contains(&DisplayCall::BarChanged(0)));
}

#[test]
fn extra_bar_toggles_alone() {
    let mut wm = three_tiled();
    wm.toggle_extra_bar();
    assert!(wm.current_monitor().show_bar);
    assert!(wm.current_monitor().show_extra_bar);
    wm.toggle_bar();
    assert!(!wm.current_monitor().show_bar);
    assert!(wm.current_monitor().show_extra_bar);
    assert_eq!(wm.current_monitor().bar_count(), 1);
}
