//! Focus, stacking order and selection movement.

use crate::client::FakeFullscreen;
use crate::display::{BorderScheme, DisplayPort, FocusTarget};
use crate::layout::LayoutKind;
use crate::window_manager::WindowManager;
use tracing::debug;
use x11rb::protocol::xproto::Window;

/// Weight of the distance along the travel direction against the offset
/// across it.
const DIRECTION_WEIGHT: u32 = 20;

impl<D: DisplayPort> WindowManager<D> {
    /// Focuses `window`, or the most recent visible client of the selected
    /// monitor when it is `None` or hidden.
    pub fn focus(&mut self, window: Option<Window>) {
        let target = match window {
            Some(window) if self.is_visible(window) => Some(window),
            _ => self.first_visible_in_stack(self.selected_monitor),
        };

        if let Some(selected) = self.selected_window()
            && Some(selected) != target
        {
            if let Some(next) = target {
                self.lose_fullscreen(next);
            }
            self.unfocus(selected, false);
        }

        match target {
            Some(window) => {
                if let Some(monitor) = self.client_monitor(window) {
                    self.selected_monitor = monitor;
                }
                if self.clients.get(&window).is_some_and(|c| c.is_urgent) {
                    self.set_urgent(window, false);
                }
                self.detach_stack(window);
                self.attach_stack(window);
                self.display.grab_buttons(window, true);
                self.display.set_border(window, BorderScheme::Focused);
                self.set_focus(window);
            }
            None => self.display.set_input_focus(FocusTarget::Root),
        }

        let monitor = self.selected_monitor;
        self.monitors[monitor].selected = target;
        if matches!(
            self.monitors[monitor].layout(),
            LayoutKind::Tile | LayoutKind::Monocle
        ) {
            self.arrange_monitor(monitor);
        }
        self.display.bar_changed(monitor);
    }

    /// Border the client shows while it does not hold focus.
    pub(crate) fn unfocused_scheme(&self, window: Window) -> BorderScheme {
        let Some(client) = self.clients.get(&window) else {
            return BorderScheme::Unfocused;
        };
        let gap = self
            .monitors
            .get(client.monitor_index)
            .map_or(0, |monitor| monitor.gap);
        if client.is_floating {
            BorderScheme::Floating
        } else if gap > self.config.tile_switch {
            BorderScheme::Unfocused
        } else {
            BorderScheme::Seamless
        }
    }

    pub fn unfocus(&mut self, window: Window, set_focus: bool) {
        if !self.clients.contains_key(&window) {
            return;
        }
        self.display.grab_buttons(window, false);
        let scheme = self.unfocused_scheme(window);
        self.display.set_border(window, scheme);
        if set_focus {
            self.display.set_input_focus(FocusTarget::Root);
        }
    }

    pub(crate) fn set_focus(&mut self, window: Window) {
        let never_focus = self.clients.get(&window).is_some_and(|c| c.never_focus);
        self.display
            .set_input_focus(FocusTarget::Client { window, never_focus });
    }

    pub(crate) fn set_urgent(&mut self, window: Window, urgent: bool) {
        if let Some(client) = self.clients.get_mut(&window) {
            client.is_urgent = urgent;
            self.display.set_urgent(window, urgent);
        }
    }

    /// Gives focus back to the selection when another window grabbed it.
    pub fn on_focus_in(&mut self, window: Window) {
        if let Some(selected) = self.selected_window()
            && selected != window
        {
            self.set_focus(selected);
        }
    }

    /// Moves the selection to the next (`direction > 0`) or previous visible
    /// client in the monitor's client order, wrapping around.
    pub fn focus_stack(&mut self, direction: i32) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        if let Some(client) = self.clients.get(&selected)
            && client.is_fullscreen
            && self.config.lock_fullscreen
            && client.fake_fullscreen != FakeFullscreen::Fake
        {
            return;
        }

        let order = self.current_monitor().clients.clone();
        let Some(position) = order.iter().position(|&window| window == selected) else {
            return;
        };
        let visible = |window: &&Window| self.is_visible(**window);
        let target = if direction > 0 {
            order[position + 1..]
                .iter()
                .find(visible)
                .or_else(|| order.iter().find(visible))
        } else {
            order[..position]
                .iter()
                .rev()
                .find(visible)
                .or_else(|| order[position..].iter().rev().find(visible))
        };

        if let Some(&target) = target {
            self.focus(Some(target));
            self.restack(self.selected_monitor);
        }
    }

    /// Focuses the nearest client left (0), right (1), up (2) or down (3)
    /// of the selection.
    pub fn focus_direction(&mut self, direction: i32) {
        if self.current_monitor().layout() == LayoutKind::Monocle {
            match direction {
                0 | 3 => self.focus_stack(-1),
                1 | 2 => self.focus_stack(1),
                _ => {}
            }
            return;
        }

        let Some(selected) = self.selected_window() else {
            return;
        };
        let Some(target) = self.nearest_in_direction(selected, direction, true) else {
            return;
        };
        self.focus(Some(target));
        if let Some(monitor) = self.client_monitor(target) {
            self.restack(monitor);
        }
    }

    /// Scores every other visible client of the selection's monitor by its
    /// distance in `direction`, wrapping across the monitor edge.
    pub(crate) fn nearest_in_direction(
        &self,
        selected: Window,
        direction: i32,
        same_floating: bool,
    ) -> Option<Window> {
        let source = self.clients.get(&selected)?;
        let monitor = self.monitors.get(source.monitor_index)?;
        let order = &monitor.clients;
        let start = order.iter().position(|&window| window == selected)?;
        let primary = i32::from(monitor.axis.primary);
        let along_primary = (primary * primary - direction - 1).abs() <= 1;
        let s = source.geometry;

        let mut best: Option<(u32, Window)> = None;
        for offset in 1..order.len() {
            let window = order[(start + offset) % order.len()];
            let Some(candidate) = self.clients.get(&window) else {
                continue;
            };
            if !self.is_visible(window)
                || (same_floating && candidate.is_floating != source.is_floating)
                || (along_primary && candidate.hidden)
            {
                continue;
            }
            let c = candidate.geometry;
            let (distance, wrap, offset) = match direction {
                0 => (s.x - c.x - c.width, monitor.work_area.width, s.y - c.y),
                1 => (c.x - s.x - s.width, monitor.work_area.width, c.y - s.y),
                2 => (s.y - c.y - c.height, monitor.work_area.height, s.x - c.x),
                _ => (c.y - s.y - s.height, monitor.work_area.height, c.x - s.x),
            };
            let score = DIRECTION_WEIGHT
                .saturating_mul(distance.unsigned_abs().min((distance + wrap).unsigned_abs()))
                .saturating_add(offset.unsigned_abs());
            let better = match best {
                None => true,
                Some((best_score, _)) if direction == 0 || direction == 2 => score <= best_score,
                Some((best_score, _)) => score < best_score,
            };
            if better {
                best = Some((score, window));
            }
        }
        best.map(|(_, window)| window)
    }

    /// Moves focus to the next or previous monitor.
    pub fn focus_monitor(&mut self, direction: i32) {
        if self.monitors.len() < 2 {
            return;
        }
        let target = self.direction_to_monitor(direction);
        if target == self.selected_monitor {
            return;
        }
        if let Some(selected) = self.selected_window() {
            self.unfocus(selected, false);
        }
        debug!(from = self.selected_monitor, to = target, "focusing monitor");
        self.selected_monitor = target;
        self.focus(None);
    }

    /// Focuses the most recent client on the other side of the master split.
    pub fn switch_column(&mut self) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        let monitor = self.selected_monitor;
        let tiled = self.tiled_visible_clients(monitor);
        let nmaster = self.monitors[monitor].nmaster;
        if tiled.len() <= nmaster {
            return;
        }
        let in_stack = |window: Window| {
            tiled
                .iter()
                .position(|&other| other == window)
                .map(|index| index + 1 > nmaster)
        };
        let column = in_stack(selected).unwrap_or(false);

        let target = self.monitors[monitor]
            .stack
            .iter()
            .copied()
            .filter(|&window| self.is_visible(window))
            .find(|&window| in_stack(window).is_some_and(|side| side != column));
        if let Some(target) = target {
            self.focus(Some(target));
            self.restack(monitor);
        }
    }

    /// Leaves real fullscreen on the selection when `next` is about to
    /// cover the same monitor as a tiled client.
    pub(crate) fn lose_fullscreen(&mut self, next: Window) {
        let Some(selected) = self.selected_window() else {
            return;
        };
        let (Some(sel), Some(next)) = (self.clients.get(&selected), self.clients.get(&next)) else {
            return;
        };
        if sel.is_fullscreen
            && sel.fake_fullscreen != FakeFullscreen::Fake
            && self.is_visible(selected)
            && sel.monitor_index == next.monitor_index
            && !next.is_floating
        {
            self.set_fullscreen(selected, false);
        }
    }
}
