//! The command surface bound to keys: tag algebra, layout parameters,
//! client ordering and fullscreen.

use crate::client::{FakeFullscreen, MAX_CFACT, MIN_CFACT, TagMask};
use crate::display::{BorderScheme, DisplayPort};
use crate::floatpos::{FloatPos, place_floating};
use crate::geometry::WindowGeometry;
use crate::keyboard::keysyms::Keysym;
use crate::keyboard::{Arg, KeyAction, find_key_action};
use crate::layout::{AxisConfig, LayoutKind};
use crate::pertag::Pertag;
use crate::window_manager::WindowManager;
use tracing::{debug, warn};
use x11rb::protocol::xproto::Window;

const MIN_MFACT: f32 = 0.05;
const MAX_MFACT: f32 = 0.95;
const MAX_GAP: i32 = 50;

/// Flags of a tag grid move: a direction plus what to do with the tags
/// it lands on.
pub mod tag_grid {
    pub const UP: i32 = 1;
    pub const DOWN: i32 = 1 << 1;
    pub const LEFT: i32 = 1 << 2;
    pub const RIGHT: i32 = 1 << 3;
    pub const TOGGLE_TAG: i32 = 1 << 4;
    pub const TAG: i32 = 1 << 5;
    pub const VIEW: i32 = 1 << 6;
    pub const TOGGLE_VIEW: i32 = 1 << 7;

    /// Flags named by words such as `"up view"` or `"left|tag|view"`.
    pub fn parse(words: &str) -> Option<i32> {
        words
            .split(|c: char| c == '|' || c.is_whitespace())
            .filter(|word| !word.is_empty())
            .try_fold(0, |flags, word| {
                let flag = match word.to_ascii_lowercase().as_str() {
                    "up" => UP,
                    "down" => DOWN,
                    "left" => LEFT,
                    "right" => RIGHT,
                    "toggle_tag" => TOGGLE_TAG,
                    "tag" => TAG,
                    "view" => VIEW,
                    "toggle_view" => TOGGLE_VIEW,
                    _ => return None,
                };
                Some(flags | flag)
            })
    }
}

/// Moves every tag of `tags` one cell across a grid of `rows` rows holding
/// `count` tags row by row. Moves wrap around; the last row may be short.
fn move_in_tag_grid(tags: TagMask, count: usize, rows: usize, flags: i32) -> TagMask {
    if count == 0 {
        return 0;
    }
    let rows = rows.clamp(1, count);
    let columns = count.div_ceil(rows);
    let previous = |index: usize, len: usize| if index == 0 { len - 1 } else { index - 1 };

    let mut moved = 0;
    for tag in (0..count).filter(|&tag| tags & (1 << tag) != 0) {
        let (mut row, mut column) = (tag / columns, tag % columns);
        if flags & tag_grid::UP != 0 {
            row = previous(row, rows);
            while row * columns + column >= count {
                row = previous(row, rows);
            }
        }
        if flags & tag_grid::DOWN != 0 {
            row = (row + 1) % rows;
            if row * columns + column >= count {
                row = 0;
            }
        }
        if flags & tag_grid::LEFT != 0 {
            column = previous(column, columns);
            while row * columns + column >= count {
                column = previous(column, columns);
            }
        }
        if flags & tag_grid::RIGHT != 0 {
            column = (column + 1) % columns;
            if row * columns + column >= count {
                column = 0;
            }
        }
        moved |= 1 << (row * columns + column);
    }
    moved
}

/// Tag mask named by a key argument: a tag index, `-1` for every tag.
fn tag_arg(arg: &Arg) -> TagMask {
    match arg {
        Arg::Int(-1) => !0,
        Arg::Int(tag) if (0..32).contains(tag) => 1 << *tag,
        _ => 0,
    }
}

impl<D: DisplayPort> WindowManager<D> {
    /// Dispatches a key press to its binding, returning whether one matched.
    pub fn on_key_press(&mut self, keysym: Keysym, state: u16, numlock_mask: u16) -> bool {
        let Some(binding) = find_key_action(keysym, state, numlock_mask, &self.config.keybindings)
        else {
            return false;
        };
        let (action, arg) = (binding.action, binding.arg.clone());
        self.run_action(action, &arg);
        true
    }

    pub fn run_action(&mut self, action: KeyAction, arg: &Arg) {
        debug!(?action, ?arg, "running action");
        match action {
            KeyAction::KillClient => self.kill_client(),
            KeyAction::FocusStack => self.focus_stack(arg.as_int()),
            KeyAction::FocusDirection => self.focus_direction(arg.as_int()),
            KeyAction::FocusMonitor => self.focus_monitor(arg.as_int()),
            KeyAction::TagMonitor => self.tag_monitor(arg.as_int()),
            KeyAction::SwitchColumn => self.switch_column(),
            KeyAction::PlaceDirection => self.place_direction(arg.as_int()),
            KeyAction::InplaceRotate => self.inplace_rotate(arg.as_int()),
            KeyAction::Quit => self.quit(),
            KeyAction::ViewTag => self.view(tag_arg(arg)),
            KeyAction::ToggleView => self.toggle_view(tag_arg(arg)),
            KeyAction::MoveToTag => self.tag(tag_arg(arg)),
            KeyAction::ToggleTag => self.toggle_tag(tag_arg(arg)),
            KeyAction::ToggleFloating => self.toggle_floating(),
            KeyAction::ToggleFullScreen => self.toggle_fullscreen(),
            KeyAction::ToggleFakeFullScreen => self.toggle_fake_fullscreen(),
            KeyAction::ToggleBar => self.toggle_bar(),
            KeyAction::ToggleExtraBar => self.toggle_extra_bar(),
            KeyAction::ToggleBars => self.toggle_bars(),
            KeyAction::ShiftViewClients => self.shift_view_clients(arg.as_int()),
            KeyAction::SwitchTag => match arg {
                Arg::Str(words) => match tag_grid::parse(words) {
                    Some(flags) => self.switch_tag(flags),
                    None => warn!(%words, "unknown tag grid move"),
                },
                _ => self.switch_tag(arg.as_int()),
            },
            KeyAction::FloatPos => match arg {
                Arg::Str(position) => self.float_pos(position),
                _ => warn!(?arg, "float position needs a string argument"),
            },
            KeyAction::SetLayout => match arg {
                Arg::Str(name) => match LayoutKind::from_str(name) {
                    Ok(kind) => self.set_layout(Some(kind)),
                    Err(error) => warn!("{error}"),
                },
                _ => self.set_layout(None),
            },
            KeyAction::CycleLayout => self.cycle_layout(),
            KeyAction::SetMasterFactor => self.set_mfact(arg.as_float()),
            KeyAction::SetClientFactor => self.set_cfact(arg.as_float()),
            KeyAction::IncNumMaster => self.inc_nmaster(arg.as_int()),
            KeyAction::RotateLayoutAxis => self.rotate_layout_axis(arg.as_int()),
            KeyAction::MirrorLayout => self.mirror_layout(),
            KeyAction::SetGaps => self.set_gaps(arg.as_int()),
            KeyAction::Zoom => self.zoom(),
            KeyAction::Transfer => self.transfer(),
            KeyAction::None => {}
        }
    }

    fn restore_current_layout(&mut self) {
        let bar = self.config.bar_settings();
        self.current_monitor_mut().restore_layout(&bar);
        let monitor = self.current_monitor_mut();
        monitor.layout_symbol = monitor.layout().symbol().to_string();
    }

    /// Shows the tags in `mask`; an empty mask returns to the previous view.
    pub fn view(&mut self, mask: TagMask) {
        let all = self.tag_mask();
        let mask = mask & all;
        if mask == self.current_monitor().tags() {
            return;
        }
        let monitor = self.current_monitor_mut();
        monitor.selected_tagset ^= 1;
        if mask != 0 {
            monitor.tagset[monitor.selected_tagset] = mask;
            monitor.pertag.switch_to(Pertag::slot_for_mask(mask, all));
        } else {
            monitor.pertag.swap_with_previous();
        }
        debug!(tags = monitor.tags(), slot = monitor.pertag.current(), "view");
        self.restore_current_layout();
        self.focus(None);
        self.arrange(Some(self.selected_monitor));
    }

    /// Adds or removes the tags in `mask` from the view, keeping the
    /// current masters at the head of the client order.
    pub fn toggle_view(&mut self, mask: TagMask) {
        let all = self.tag_mask();
        let index = self.selected_monitor;
        let new_tags = self.monitors[index].tags() ^ (mask & all);

        let selected = self.monitors[index].selected;
        let nmaster = self.monitors[index].nmaster;
        let masters: Vec<Window> = self
            .tiled_visible_clients(index)
            .into_iter()
            .take(nmaster)
            .collect();
        for &master in masters.iter().rev() {
            self.move_to_head(master);
            self.focus(Some(master));
        }
        if !masters.is_empty() {
            self.arrange(Some(index));
        }
        self.focus(selected);

        if new_tags == 0 {
            return;
        }
        let monitor = &mut self.monitors[index];
        monitor.tagset[monitor.selected_tagset] = new_tags;
        Self::follow_tags(&mut monitor.pertag, new_tags, all);
        self.restore_current_layout();
        self.focus(None);
        self.arrange(Some(index));
    }

    /// Moves the pertag slot to a tag of `tags` unless it already shows one.
    fn follow_tags(pertag: &mut Pertag, tags: TagMask, all: TagMask) {
        if tags == all {
            pertag.switch_to(0);
        } else if !Pertag::slot_contains(pertag.current(), tags) {
            pertag.switch_to(Pertag::slot_for_mask(tags, all));
        }
    }

    /// Retags the selection.
    pub fn tag(&mut self, mask: TagMask) {
        let mask = mask & self.tag_mask();
        let Some(selected) = self.selected_window() else {
            return;
        };
        if mask == 0 {
            return;
        }
        if let Some(client) = self.clients.get_mut(&selected) {
            client.tags = mask;
            client.switch_tag = None;
        }
        self.focus(None);
        self.arrange(Some(self.selected_monitor));
    }

    pub fn toggle_tag(&mut self, mask: TagMask) {
        let all = self.tag_mask();
        let Some(selected) = self.selected_window() else {
            return;
        };
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        let new_tags = client.tags ^ (mask & all);
        if new_tags == 0 {
            return;
        }
        client.tags = new_tags;
        Self::follow_tags(&mut self.current_monitor_mut().pertag, new_tags, all);
        self.restore_current_layout();
        self.focus(None);
        self.arrange(Some(self.selected_monitor));
    }

    /// Sends the selection to the next or previous monitor.
    pub fn tag_monitor(&mut self, direction: i32) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        if self.monitors.len() < 2 {
            return;
        }
        let target = self.direction_to_monitor(direction);
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        if !client.is_fullscreen {
            self.send_to_monitor(selected, target);
            return;
        }

        client.is_fullscreen = false;
        self.send_to_monitor(selected, target);
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        client.is_fullscreen = true;
        if client.fake_fullscreen != FakeFullscreen::Fake {
            let screen = self.monitors[client.monitor_index].screen;
            self.resize_client(
                selected,
                WindowGeometry::new(screen.x, screen.y, screen.width, screen.height, 0),
            );
            self.display.raise_window(selected);
        }
    }

    /// Moves `window` to monitor `target`, taking that monitor's view.
    pub fn send_to_monitor(&mut self, window: Window, target: usize) {
        if target >= self.monitors.len() || self.client_monitor(window) == Some(target) {
            return;
        }
        debug!(window, monitor = target, "sending client to monitor");
        self.unfocus(window, true);
        self.detach(window);
        self.detach_stack(window);
        let tags = self.monitors[target].tags();
        if let Some(client) = self.clients.get_mut(&window) {
            client.monitor_index = target;
            client.tags = tags;
            client.switch_tag = None;
        }
        self.attach(window);
        self.attach_stack(window);
        self.focus(None);
        self.arrange(None);
    }

    /// Rotates the view by `shift` tags, skipping tags none of the
    /// monitor's clients are on.
    pub fn shift_view_clients(&mut self, shift: i32) {
        let count = self.config.tags.len().min(31) as u32;
        if count == 0 {
            return;
        }
        let by = shift.rem_euclid(count as i32) as u32;
        if by == 0 {
            return;
        }
        let all = self.tag_mask();
        let monitor = self.current_monitor();
        let occupied = monitor
            .clients
            .iter()
            .filter_map(|window| self.clients.get(window))
            .fold(0, |tags, client| tags | client.tags)
            & all;

        let mut shifted = monitor.tags();
        for _ in 0..count {
            shifted = ((shifted << by) | (shifted >> (count - by))) & all;
            if occupied == 0 || shifted & occupied != 0 {
                break;
            }
        }
        self.view(shifted);
    }

    /// Moves the viewed tags one cell across the tag grid, then applies
    /// the result as `flags` asks, in the order toggle-tag, tag, view and
    /// toggle-view.
    pub fn switch_tag(&mut self, flags: i32) {
        let moved = move_in_tag_grid(
            self.current_monitor().tags(),
            self.config.tags.len(),
            self.config.tag_rows,
            flags,
        );
        if moved == 0 {
            return;
        }
        if flags & tag_grid::TOGGLE_TAG != 0 {
            self.toggle_tag(moved);
        }
        if flags & tag_grid::TAG != 0 {
            self.tag(moved);
        }
        if flags & tag_grid::VIEW != 0 {
            self.view(moved);
        }
        if flags & tag_grid::TOGGLE_VIEW != 0 {
            self.toggle_view(moved);
        }
    }

    /// Adjusts the master fraction; values of 1.0 and above set it absolutely
    /// as `value - 1.0`.
    pub fn set_mfact(&mut self, value: f32) {
        if !self.current_monitor().arranges() {
            return;
        }
        let current = self.current_monitor().mfact;
        let mfact = if value < 1.0 { value + current } else { value - 1.0 };
        if !(MIN_MFACT..=MAX_MFACT).contains(&mfact) {
            return;
        }
        let monitor = self.current_monitor_mut();
        monitor.mfact = mfact;
        monitor.commit_layout();
        self.arrange(Some(self.selected_monitor));
    }

    /// Adjusts the selection's weight within its group; zero resets it.
    pub fn set_cfact(&mut self, value: f32) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        if !self.current_monitor().arranges() {
            return;
        }
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        let cfact = if value == 0.0 {
            1.0
        } else {
            let cfact = client.cfact + value;
            if !(MIN_CFACT..=MAX_CFACT).contains(&cfact) {
                return;
            }
            cfact
        };
        client.cfact = cfact;
        self.arrange(Some(self.selected_monitor));
    }

    pub fn inc_nmaster(&mut self, delta: i32) {
        let index = self.selected_monitor;
        let tiled = self.tiled_visible_clients(index).len() as i64;
        let monitor = &mut self.monitors[index];
        let nmaster = monitor.nmaster as i64 + i64::from(delta);
        if !monitor.arranges() || nmaster < 1 || nmaster > tiled {
            return;
        }
        monitor.nmaster = nmaster as usize;
        monitor.commit_layout();
        self.arrange(Some(index));
    }

    /// `0` rotates the primary split between horizontal and vertical,
    /// `1` and `2` cycle the master and stack group axes.
    pub fn rotate_layout_axis(&mut self, which: i32) {
        let monitor = self.current_monitor_mut();
        if !monitor.arranges() {
            return;
        }
        let axis = monitor.axis;
        let rotated = match which {
            0 => {
                let primary = if axis.primary > 0 {
                    if axis.primary + 1 > 2 { 1 } else { axis.primary + 1 }
                } else if axis.primary - 1 < -2 {
                    -1
                } else {
                    axis.primary - 1
                };
                let magnitude = primary.unsigned_abs();
                let free = if magnitude + 1 > 2 { 1 } else { magnitude + 1 };
                let bump = |group: u8| if group == magnitude { free } else { group };
                AxisConfig::new(primary, bump(axis.master), bump(axis.stack))
            }
            1 => AxisConfig::new(axis.primary, axis.master % 3 + 1, axis.stack),
            2 => AxisConfig::new(axis.primary, axis.master, axis.stack % 3 + 1),
            _ => None,
        };
        let Some(rotated) = rotated else {
            return;
        };
        monitor.axis = rotated;
        monitor.commit_layout();
        self.arrange(Some(self.selected_monitor));
    }

    /// Swaps the master region to the other side of the primary split.
    pub fn mirror_layout(&mut self) {
        let monitor = self.current_monitor_mut();
        if !monitor.arranges() {
            return;
        }
        monitor.axis.primary = -monitor.axis.primary;
        monitor.commit_layout();
        self.arrange(Some(self.selected_monitor));
    }

    /// Grows or shrinks the gap; zero removes it.
    pub fn set_gaps(&mut self, delta: i32) {
        let index = self.selected_monitor;
        let gap = self.monitors[index].gap;
        if gap + delta < 0 || gap + delta >= MAX_GAP {
            return;
        }

        let tile_switch = self.config.tile_switch;
        if tile_switch >= 0 && (gap + delta - tile_switch).abs() <= delta.abs() {
            let scheme = if gap + delta <= tile_switch && delta < 0 {
                Some(BorderScheme::Seamless)
            } else if gap + delta > tile_switch && delta > 0 {
                Some(BorderScheme::Unfocused)
            } else {
                None
            };
            if let Some(scheme) = scheme {
                for window in self.tiled_visible_clients(index) {
                    self.display.set_border(window, scheme);
                }
                self.focus(None);
            }
        }

        let bar = self.config.bar_settings();
        let monitor = &mut self.monitors[index];
        monitor.gap = if delta == 0 { 0 } else { gap + delta };
        monitor.update_bar_position(&bar);
        monitor.commit_layout();
        self.display.bar_changed(index);
        self.arrange_monitor(index);
    }

    /// Switches to `kind`, or toggles the layout pair when `None`.
    pub fn set_layout(&mut self, kind: Option<LayoutKind>) {
        let index = self.selected_monitor;
        let monitor = &mut self.monitors[index];
        if kind.is_none_or(|kind| kind != monitor.layout()) {
            monitor.selected_layout ^= 1;
        }
        if let Some(kind) = kind {
            monitor.layouts[monitor.selected_layout] = kind;
        }
        monitor.layout_symbol = monitor.layout().symbol().to_string();
        monitor.commit_layout();

        if monitor.selected.is_some() {
            self.arrange(Some(index));
        } else {
            self.display.bar_changed(index);
        }
        self.arrange_monitor(index);
    }

    /// Selects the layout after the current one in the configured list.
    pub fn cycle_layout(&mut self) {
        let layouts = &self.config.layouts;
        if layouts.is_empty() {
            return;
        }
        let current = self.current_monitor().layout();
        let next = layouts
            .iter()
            .position(|&kind| kind == current)
            .map_or(layouts[0], |position| layouts[(position + 1) % layouts.len()]);
        self.set_layout(Some(next));
    }

    pub fn toggle_bar(&mut self) {
        let (main, extra) = self.bar_visibility();
        self.show_bars(!main, extra);
    }

    pub fn toggle_extra_bar(&mut self) {
        let (main, extra) = self.bar_visibility();
        self.show_bars(main, !extra);
    }

    fn bar_visibility(&self) -> (bool, bool) {
        let monitor = self.current_monitor();
        (monitor.show_bar, monitor.show_extra_bar)
    }

    /// Hides the extra bar, then the main bar, then shows both again.
    pub fn toggle_bars(&mut self) {
        match self.current_monitor().bar_count() {
            2 => self.toggle_extra_bar(),
            1 => self.toggle_bar(),
            _ => self.show_bars(true, true),
        }
    }

    fn show_bars(&mut self, show_bar: bool, show_extra_bar: bool) {
        let bar = self.config.bar_settings();
        let index = self.selected_monitor;
        let monitor = &mut self.monitors[index];
        monitor.show_bar = show_bar;
        monitor.show_extra_bar = show_extra_bar;
        monitor.commit_layout();
        monitor.update_bar_position(&bar);
        self.display.bar_changed(index);
        self.arrange_monitor(index);
    }

    pub fn toggle_floating(&mut self) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        let border = self.config.border_width;
        let borderless_tiles =
            self.config.border_switch && self.current_monitor().gap > self.config.tile_switch;
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        if client.is_fullscreen && client.fake_fullscreen != FakeFullscreen::Fake {
            return;
        }
        client.is_floating = !client.is_floating || client.is_fixed;
        let current = client.geometry;
        let shrink = 2 * (border - current.border_width);

        if client.is_floating {
            let requested = match client.float_geometry {
                Some(saved) => WindowGeometry::new(
                    saved.x,
                    saved.y,
                    saved.width - shrink,
                    saved.height - shrink,
                    border,
                ),
                None => {
                    let area = self.monitors[client.monitor_index].work_area;
                    let width = current.width - shrink;
                    let height = current.height - shrink;
                    WindowGeometry::new(
                        area.x + (area.width - width - 2 * border) / 2,
                        area.y + (area.height - height - 2 * border) / 2,
                        width,
                        height,
                        border,
                    )
                }
            };
            self.resize(selected, requested, false);
        } else {
            let extra = if borderless_tiles { 2 * border } else { 0 };
            client.float_geometry = Some(WindowGeometry {
                width: current.width + extra,
                height: current.height + extra,
                ..current
            });
        }

        let index = self.client_monitor(selected).unwrap_or(self.selected_monitor);
        self.arrange(Some(index));
        self.arrange_monitor(index);
    }

    /// Moves and resizes the floating selection by a float position string,
    /// then raises it and warps the pointer to its center.
    pub fn float_pos(&mut self, position: &str) {
        let position = match position.parse::<FloatPos>() {
            Ok(position) => position,
            Err(error) => {
                warn!("{error}");
                return;
            }
        };
        let Some(selected) = self.selected_window() else {
            return;
        };
        let pointer = if position.follows_pointer() {
            self.display.query_pointer()
        } else {
            None
        };
        let grid = self.config.float_pos_grid;
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        let Some(monitor) = self.monitors.get(client.monitor_index) else {
            return;
        };
        let Some(geometry) = place_floating(client, monitor, &position, pointer, grid) else {
            return;
        };
        debug!(window = selected, ?geometry, "float position");
        self.resize_client(selected, geometry);
        self.display.raise_window(selected);
        self.display
            .warp_pointer(selected, geometry.width / 2, geometry.height / 2);
    }

    pub fn toggle_fullscreen(&mut self) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        if client.fake_fullscreen == FakeFullscreen::Fake {
            client.fake_fullscreen = FakeFullscreen::FakeThenReal;
            self.set_fullscreen(selected, true);
        } else {
            let fullscreen = !client.is_fullscreen;
            self.set_fullscreen(selected, fullscreen);
        }
    }

    pub fn toggle_fake_fullscreen(&mut self) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        let Some(client) = self.clients.get_mut(&selected) else {
            return;
        };
        if client.fake_fullscreen != FakeFullscreen::Fake && client.is_fullscreen {
            client.fake_fullscreen = FakeFullscreen::FakeThenReal;
            self.set_fullscreen(selected, false);
        } else if client.fake_fullscreen == FakeFullscreen::Fake {
            self.set_fullscreen(selected, false);
            if let Some(client) = self.clients.get_mut(&selected) {
                client.fake_fullscreen = FakeFullscreen::Off;
            }
        } else {
            client.fake_fullscreen = FakeFullscreen::Fake;
            self.set_fullscreen(selected, true);
        }
    }

    /// Enters or leaves fullscreen, honoring the fake fullscreen state.
    ///
    /// Real fullscreen saves the floating state and covers the monitor
    /// without a border; leaving it restores both.
    pub fn set_fullscreen(&mut self, window: Window, fullscreen: bool) {
        let Some(client) = self.clients.get_mut(&window) else {
            return;
        };
        let fake = client.fake_fullscreen;
        let mut fullscreen = fullscreen;
        let save = (fake == FakeFullscreen::Off && fullscreen && !client.is_fullscreen)
            || (fake == FakeFullscreen::FakeThenReal && fullscreen);
        let restore = (fake == FakeFullscreen::Off && !fullscreen && client.is_fullscreen)
            || (matches!(
                fake,
                FakeFullscreen::FakeThenReal | FakeFullscreen::RealFromRequest
            ) && !fullscreen);
        let back_to_fake =
            fake == FakeFullscreen::FakeThenReal && !fullscreen && client.is_fullscreen;
        if back_to_fake {
            fullscreen = true;
        }

        if fullscreen != client.is_fullscreen {
            self.display.set_fullscreen_state(window, fullscreen);
        }
        client.is_fullscreen = fullscreen;
        let index = client.monitor_index;

        if save && client.saved_floating.is_none() {
            client.saved_floating = Some(client.is_floating);
            client.is_floating = true;
            let screen = self.monitors[index].screen;
            self.resize_client(
                window,
                WindowGeometry::new(screen.x, screen.y, screen.width, screen.height, 0),
            );
            self.display.raise_window(window);
        } else if restore && let Some(floating) = client.saved_floating.take() {
            client.is_floating = floating;
            if back_to_fake || fake == FakeFullscreen::RealFromRequest {
                client.fake_fullscreen = FakeFullscreen::Fake;
            }
            let old = client.old_geometry;
            client.geometry.border_width = old.border_width;
            let monitor = &self.monitors[index];
            if client.is_floating || !monitor.arranges() {
                let area = monitor.work_area;
                let border = old.border_width;
                let x = area.x.max(old.x);
                let y = area.y.max(old.y);
                let restored = WindowGeometry::new(
                    x,
                    y,
                    (area.right() - x - 2 * border).min(old.width),
                    (area.bottom() - y - 2 * border).min(old.height),
                    border,
                );
                self.resize_client(window, restored);
                self.restack(index);
            } else {
                self.arrange(Some(index));
            }
        } else {
            let current = client.geometry;
            self.resize_client(window, current);
        }

        if !self.clients.get(&window).is_some_and(|c| c.is_fullscreen) {
            self.display.discard_enter_events();
        }
    }

    pub fn kill_client(&mut self) {
        if let Some(selected) = self.selected_window() {
            self.display.close_window(selected);
        }
    }

    pub fn quit(&mut self) {
        debug!("quit requested");
        self.running = false;
    }

    fn move_to_head(&mut self, window: Window) {
        let Some(index) = self.client_monitor(window) else {
            return;
        };
        let order = &mut self.monitors[index].clients;
        if crate::attach::detach(order, window).is_some() {
            order.insert(0, window);
        }
    }

    /// The client right before `window` in its monitor's client order.
    fn client_before(&self, window: Window) -> Option<Window> {
        let index = self.client_monitor(window)?;
        let order = &self.monitors[index].clients;
        let position = order.iter().position(|&other| other == window)?;
        position.checked_sub(1).map(|before| order[before])
    }

    /// First tiled visible client after `window` in the client order.
    fn next_tiled_after(&self, window: Window) -> Option<Window> {
        let index = self.client_monitor(window)?;
        let order = &self.monitors[index].clients;
        let position = order.iter().position(|&other| other == window)?;
        order[position + 1..]
            .iter()
            .copied()
            .find(|&other| self.is_tiled_visible(other))
    }

    /// Swaps the selection with the first master. Zooming the master swaps
    /// it back with the client it last displaced.
    pub fn zoom(&mut self) {
        let index = self.selected_monitor;
        if !self.monitors[index].arranges() {
            return;
        }
        let Some(mut target) = self.monitors[index].selected else {
            return;
        };
        if self.clients.get(&target).is_none_or(|c| c.is_floating) {
            return;
        }
        let first = self.tiled_visible_clients(index).first().copied();

        let mut at = None;
        if first == Some(target) {
            let previous = self.monitors[index].pertag.prev_zoom();
            at = previous.and_then(|previous| self.client_before(previous));
            let candidate = at.and_then(|at| self.next_tiled_after(at));
            if candidate.is_none() || candidate != previous {
                self.monitors[index].pertag.set_prev_zoom(None);
                at = None;
                match self.next_tiled_after(target) {
                    Some(next) => target = next,
                    None => return,
                }
            } else if let Some(candidate) = candidate {
                target = candidate;
            }
        }

        if first != Some(target) && at.is_none() {
            at = self.client_before(target);
        }
        self.move_to_head(target);
        if first != Some(target)
            && let Some(at) = at
        {
            self.monitors[index].pertag.set_prev_zoom(first);
            if let Some(first) = first
                && at != first
            {
                self.move_in_order(first, at, true);
            }
        }

        self.focus(Some(target));
        self.arrange(Some(index));
    }

    /// Moves the selection between the master and stack groups, growing or
    /// shrinking the master count.
    pub fn transfer(&mut self) {
        let index = self.selected_monitor;
        let Some(selected) = self.monitors[index].selected else {
            return;
        };
        if self.clients.get(&selected).is_none_or(|c| c.is_floating) {
            return;
        }
        let tiled = self.tiled_visible_clients(index);
        if tiled.is_empty() {
            return;
        }
        let nmaster = self.monitors[index].nmaster;
        let to_stack = nmaster != 0
            && tiled
                .iter()
                .position(|&window| window == selected)
                .is_some_and(|position| position < nmaster);
        let master_tail = nmaster
            .min(tiled.len())
            .checked_sub(1)
            .map(|last| tiled[last])
            .or_else(|| self.monitors[index].clients.first().copied());
        let stack_tail = tiled.last().copied();

        let (nmaster, insert_after) = if to_stack {
            (nmaster.min(tiled.len()) - 1, stack_tail)
        } else {
            (nmaster + 1, master_tail)
        };
        let monitor = &mut self.monitors[index];
        monitor.nmaster = nmaster;
        monitor.commit_layout();

        if let Some(insert_after) = insert_after
            && insert_after != selected
        {
            if nmaster == 1 && !to_stack {
                self.move_to_head(selected);
            } else {
                self.move_in_order(selected, insert_after, true);
            }
        }
        self.arrange(Some(index));
    }

    /// Rotates the selection's group by one slot (`±1`) or every tiled
    /// client (`±2`), keeping focus on the same slot.
    pub fn inplace_rotate(&mut self, direction: i32) {
        let index = self.selected_monitor;
        let Some(selected) = self.monitors[index].selected else {
            return;
        };
        if self.clients.get(&selected).is_none_or(|c| c.is_floating) {
            return;
        }
        let tiled = self.tiled_visible_clients(index);
        let nmaster = self.monitors[index].nmaster;
        let Some(slot) = tiled.iter().position(|&window| window == selected) else {
            return;
        };
        let (Some(&head), Some(&tail)) = (tiled.first(), tiled.last()) else {
            return;
        };
        let master_tail = nmaster.checked_sub(1).and_then(|last| tiled.get(last).copied());
        let stack_head = tiled.get(nmaster).copied();
        let in_stack = slot >= nmaster;

        // (moved, anchor, after)
        let rotation = match direction {
            2 => Some((tail, head, false)),
            -2 => Some((head, tail, true)),
            -1 if in_stack => stack_head.map(|shead| (shead, tail, true)),
            1 if in_stack => stack_head.map(|shead| (tail, shead, false)),
            -1 => master_tail.map(|mtail| (head, mtail, true)),
            1 => master_tail.map(|mtail| (mtail, head, false)),
            _ => None,
        };
        if let Some((moved, anchor, after)) = rotation {
            self.move_in_order(moved, anchor, after);
        }

        let refocus = self.tiled_visible_clients(index).get(slot).copied();
        if let Some(window) = refocus {
            self.focus(Some(window));
        }
        self.arrange(Some(index));
        self.focus(refocus);
    }

    /// Swaps the selection with its nearest tiled neighbour in a direction.
    pub fn place_direction(&mut self, direction: i32) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        if self.clients.get(&selected).is_none_or(|c| c.is_floating) {
            return;
        }
        let Some(target) = self.nearest_in_direction(selected, direction, false) else {
            return;
        };
        let Some(index) = self.client_monitor(target) else {
            return;
        };
        let order = &mut self.monitors[index].clients;
        let from = order.iter().position(|&window| window == selected);
        let to = order.iter().position(|&window| window == target);
        if let (Some(from), Some(to)) = (from, to) {
            order.swap(from, to);
        }
        self.arrange(Some(index));
    }
}
