//! The window manager state and the arrange cycle.
//!
//! [`WindowManager`] owns every client and monitor. Mutators live in the
//! `focus`, `commands`, `manage`, `swallow` and `drag` modules as further
//! `impl` blocks; this module holds the geometry pipeline they all end in:
//! `showhide`, the layout pass and `restack`, plus the ordering helpers.

use crate::Config;
use crate::attach::{self, AttachContext, AttachPolicy};
use crate::client::{Client, TagMask};
use crate::display::DisplayPort;
use crate::drag::DragSession;
use crate::geometry::{Rect, WindowGeometry, best_overlap};
use crate::layout::{Arrangement, LayoutClient, LayoutInput, LayoutKind};
use crate::monitor::Monitor;
use crate::size_hints::{NegotiationContext, negotiate};
use crate::swallow::ProcessTree;
use std::collections::HashMap;
use tracing::debug;
use x11rb::protocol::xproto::Window;

pub struct WindowManager<D: DisplayPort> {
    pub config: Config,
    pub clients: HashMap<Window, Client>,
    pub monitors: Vec<Monitor>,
    pub selected_monitor: usize,
    pub screen_width: i32,
    pub screen_height: i32,
    pub display: D,
    pub running: bool,
    pub(crate) processes: Box<dyn ProcessTree>,
    pub(crate) drag: Option<DragSession>,
    /// Monitor the pointer was last seen on while moving over the root.
    pub(crate) motion_monitor: Option<usize>,
}

impl<D: DisplayPort> WindowManager<D> {
    pub fn new(config: Config, display: D, processes: Box<dyn ProcessTree>, screen: Rect) -> Self {
        Self::with_monitors(config, display, processes, vec![screen])
    }

    /// Builds one monitor per screen rectangle, in the given order.
    pub fn with_monitors(
        config: Config,
        display: D,
        processes: Box<dyn ProcessTree>,
        screens: Vec<Rect>,
    ) -> Self {
        let screens = if screens.is_empty() {
            vec![Rect::default()]
        } else {
            screens
        };
        let screen_width = screens.iter().map(Rect::right).max().unwrap_or(0);
        let screen_height = screens.iter().map(Rect::bottom).max().unwrap_or(0);
        let monitors = screens
            .into_iter()
            .enumerate()
            .map(|(num, screen)| Monitor::new(num, screen, &config))
            .collect();

        Self {
            config,
            clients: HashMap::new(),
            monitors,
            selected_monitor: 0,
            screen_width,
            screen_height,
            display,
            running: true,
            processes,
            drag: None,
            motion_monitor: None,
        }
    }

    pub fn current_monitor(&self) -> &Monitor {
        &self.monitors[self.selected_monitor]
    }

    pub fn current_monitor_mut(&mut self) -> &mut Monitor {
        &mut self.monitors[self.selected_monitor]
    }

    /// The focused client of the selected monitor.
    pub fn selected_window(&self) -> Option<Window> {
        self.current_monitor().selected
    }

    pub fn selected_client(&self, monitor: usize) -> Option<Window> {
        self.monitors.get(monitor).and_then(|monitor| monitor.selected)
    }

    pub fn current_layout_symbol(&self, monitor: usize) -> &str {
        self.monitors
            .get(monitor)
            .map_or("", |monitor| monitor.layout_symbol.as_str())
    }

    /// Clients the layout positions, in insertion order.
    pub fn tiled_visible_clients(&self, monitor: usize) -> Vec<Window> {
        let Some(monitor) = self.monitors.get(monitor) else {
            return Vec::new();
        };
        let tags = monitor.tags();
        monitor
            .clients
            .iter()
            .copied()
            .filter(|window| {
                self.clients
                    .get(window)
                    .is_some_and(|client| client.is_visible_on(tags) && !client.is_floating)
            })
            .collect()
    }

    pub fn is_visible(&self, window: Window) -> bool {
        self.clients.get(&window).is_some_and(|client| {
            self.monitors
                .get(client.monitor_index)
                .is_some_and(|monitor| client.is_visible_on(monitor.tags()))
        })
    }

    pub(crate) fn is_tiled_visible(&self, window: Window) -> bool {
        self.is_visible(window) && self.clients.get(&window).is_some_and(|c| !c.is_floating)
    }

    pub(crate) fn client_monitor(&self, window: Window) -> Option<usize> {
        self.clients.get(&window).map(|client| client.monitor_index)
    }

    pub(crate) fn tag_mask(&self) -> TagMask {
        self.config.tag_mask()
    }

    /// Monitor whose window area shares the most surface with `rect`.
    pub(crate) fn monitor_for_rect(&self, rect: &Rect) -> usize {
        best_overlap(rect, self.monitors.iter().map(|monitor| &monitor.work_area))
            .unwrap_or(self.selected_monitor)
    }

    pub(crate) fn monitor_at_point(&self, x: i32, y: i32) -> usize {
        self.monitor_for_rect(&Rect::new(x, y, 1, 1))
    }

    /// Monitor under the pointer, or the selected one when it is unknown.
    pub(crate) fn monitor_under_pointer(&mut self) -> usize {
        match self.display.query_pointer() {
            Some((x, y)) => self.monitor_at_point(x, y),
            None => self.selected_monitor,
        }
    }

    /// Next (`direction > 0`) or previous monitor in the ring.
    pub(crate) fn direction_to_monitor(&self, direction: i32) -> usize {
        let count = self.monitors.len();
        if direction > 0 {
            (self.selected_monitor + 1) % count
        } else {
            (self.selected_monitor + count - 1) % count
        }
    }

    /// Whether size hints constrain `client` right now.
    pub(crate) fn respect_hints(&self, client: &Client) -> bool {
        let Some(monitor) = self.monitors.get(client.monitor_index) else {
            return false;
        };
        !client.ignore_size_hints
            && ((self.config.resize_hints && monitor.gap > self.config.tile_switch)
                || client.is_floating
                || !monitor.arranges())
    }

    pub(crate) fn negotiation_context(
        &self,
        monitor: usize,
        interactive: bool,
        respect_hints: bool,
    ) -> NegotiationContext {
        let work_area = self
            .monitors
            .get(monitor)
            .map_or_else(Rect::default, |monitor| monitor.work_area);
        NegotiationContext {
            interactive,
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            work_area,
            min_dimension: self.config.bar_height,
            respect_hints,
        }
    }

    /// Negotiates `requested` against the client's size hints and applies
    /// the result when it differs from the current geometry.
    pub fn resize(&mut self, window: Window, requested: WindowGeometry, interactive: bool) -> bool {
        let Some(client) = self.clients.get(&window) else {
            return false;
        };
        let context =
            self.negotiation_context(client.monitor_index, interactive, self.respect_hints(client));
        let geometry = negotiate(requested, &client.geometry, &client.hints, &context);
        if geometry == client.geometry {
            return false;
        }
        self.resize_client(window, geometry);
        true
    }

    /// Stores `geometry` and pushes it to the display unless the client is
    /// being placed by the mouse.
    pub fn resize_client(&mut self, window: Window, geometry: WindowGeometry) {
        let Some(client) = self.clients.get_mut(&window) else {
            return;
        };
        client.old_geometry = client.geometry;
        if client.being_moved {
            client.geometry = WindowGeometry {
                border_width: client.geometry.border_width,
                ..geometry
            };
            return;
        }
        let border_width = match client.float_border {
            Some(border) if client.is_floating && !client.is_fullscreen => border,
            _ => geometry.border_width.max(0),
        };
        client.geometry = WindowGeometry {
            border_width,
            ..geometry
        };
        self.display.configure_window(window, &client.geometry);
    }

    /// Re-arranges one monitor, or every monitor when `monitor` is `None`.
    pub fn arrange(&mut self, monitor: Option<usize>) {
        match monitor {
            Some(index) if index < self.monitors.len() => {
                self.showhide(index);
                self.arrange_monitor(index);
                self.restack(index);
            }
            Some(_) => {}
            None => {
                for index in 0..self.monitors.len() {
                    self.showhide(index);
                }
                for index in 0..self.monitors.len() {
                    self.arrange_monitor(index);
                }
            }
        }
    }

    /// Moves visible clients on screen top-down and hidden ones off screen
    /// bottom-up.
    pub(crate) fn showhide(&mut self, index: usize) {
        let Some(monitor) = self.monitors.get(index) else {
            return;
        };
        let stack = monitor.stack.clone();
        let tags = monitor.tags();
        let arranges = monitor.arranges();

        for &window in &stack {
            let Some(client) = self.clients.get_mut(&window) else {
                continue;
            };
            if !client.is_visible_on(tags) {
                continue;
            }
            client.hidden = false;
            let geometry = client.geometry;
            let floats = (!arranges || client.is_floating) && !client.is_fullscreen;
            self.display.move_window(window, geometry.x, geometry.y);
            if floats {
                self.resize(window, geometry, false);
            }
        }

        for &window in stack.iter().rev() {
            let Some(client) = self.clients.get(&window) else {
                continue;
            };
            if client.is_visible_on(tags) {
                continue;
            }
            let geometry = client.geometry;
            self.display
                .move_window(window, -2 * geometry.outer_width(), geometry.y);
        }
    }

    pub(crate) fn layout_clients(&self, index: usize) -> Vec<LayoutClient> {
        let monitor = &self.monitors[index];
        let tags = monitor.tags();
        monitor
            .clients
            .iter()
            .filter_map(|window| self.clients.get(window))
            .filter(|client| client.is_visible_on(tags))
            .map(|client| LayoutClient {
                window: client.window,
                geometry: client.geometry,
                hints: client.hints,
                respect_hints: self.respect_hints(client),
                cfact: client.cfact,
                focus_rank: monitor
                    .stack
                    .iter()
                    .position(|&window| window == client.window)
                    .unwrap_or(usize::MAX),
                is_floating: client.is_floating,
                is_fullscreen: client.is_fullscreen,
            })
            .collect()
    }

    /// Runs the monitor's layout and applies the resulting placements.
    pub fn arrange_monitor(&mut self, index: usize) {
        let Some(monitor) = self.monitors.get(index) else {
            return;
        };
        let kind = monitor.layout();
        let clients = self.layout_clients(index);
        let input = LayoutInput {
            work_area: monitor.work_area,
            gap: monitor.gap,
            nmaster: monitor.nmaster,
            mfact: monitor.mfact,
            axis: monitor.axis,
            border_width: self.config.border_width,
            border_switch: self.config.border_switch,
            tile_switch: self.config.tile_switch,
            bar_height: self.config.bar_height,
            bars_shown: monitor.bar_count() > 0,
            top_bar: monitor.top_bar,
            negotiation: self.negotiation_context(index, false, false),
            clients: &clients,
        };
        let arrangement = kind.new().arrange(&input);

        let monitor = &mut self.monitors[index];
        monitor.layout_symbol.clone_from(&arrangement.symbol);
        if kind == LayoutKind::Tile {
            monitor.nmaster = arrangement.nmaster;
        }
        self.apply_arrangement(&arrangement);
    }

    fn apply_arrangement(&mut self, arrangement: &Arrangement) {
        for placement in &arrangement.placements {
            let window = placement.window;
            let Some(client) = self.clients.get(&window) else {
                continue;
            };
            let was_hidden = client.hidden;
            let being_moved = client.being_moved;

            if placement.geometry != client.geometry {
                self.resize_client(window, placement.geometry);
            }
            let Some(client) = self.clients.get_mut(&window) else {
                continue;
            };
            client.hidden = placement.offscreen;
            if being_moved {
                continue;
            }

            let geometry = client.geometry;
            if placement.offscreen {
                self.display
                    .move_window(window, -2 * geometry.outer_width(), geometry.y);
            } else if was_hidden {
                self.display.move_window(window, geometry.x, geometry.y);
            }
        }
    }

    /// Raises the selection when it floats and stacks tiled clients in
    /// focus order below the bar.
    pub fn restack(&mut self, index: usize) {
        let Some(monitor) = self.monitors.get(index) else {
            return;
        };
        self.display.bar_changed(index);
        let Some(selected) = monitor.selected else {
            return;
        };
        let arranges = monitor.arranges();
        let selected_floats = self.clients.get(&selected).is_some_and(|c| c.is_floating);
        if selected_floats || !arranges {
            self.display.raise_window(selected);
        }
        if arranges {
            let tags = monitor.tags();
            let tiled: Vec<Window> = monitor
                .stack
                .iter()
                .copied()
                .filter(|window| {
                    self.clients
                        .get(window)
                        .is_some_and(|client| !client.is_floating && client.is_visible_on(tags))
                })
                .collect();
            self.display.restack(&tiled);
        }
        self.display.discard_enter_events();
    }

    /// Inserts `window` into its monitor's client order with the configured
    /// policy.
    pub(crate) fn attach(&mut self, window: Window) {
        self.attach_with(self.config.attach, window);
    }

    pub(crate) fn attach_with(&mut self, policy: AttachPolicy, window: Window) {
        let Some(client) = self.clients.get(&window) else {
            return;
        };
        let Some(monitor) = self.monitors.get_mut(client.monitor_index) else {
            return;
        };
        let context = AttachContext {
            tags: client.tags,
            selected: monitor.selected,
            nmaster: monitor.nmaster,
        };
        attach::attach(policy, &mut monitor.clients, window, context, &self.clients);
    }

    pub(crate) fn detach(&mut self, window: Window) {
        if let Some(index) = self.client_monitor(window) {
            attach::detach(&mut self.monitors[index].clients, window);
        }
    }

    pub(crate) fn attach_stack(&mut self, window: Window) {
        if let Some(index) = self.client_monitor(window) {
            attach::attach_stack(&mut self.monitors[index].stack, window);
        }
    }

    /// Removes `window` from the focus order; a removed selection passes to
    /// the most recent visible client.
    pub(crate) fn detach_stack(&mut self, window: Window) {
        let Some(index) = self.client_monitor(window) else {
            return;
        };
        attach::detach(&mut self.monitors[index].stack, window);
        if self.monitors[index].selected == Some(window) {
            self.monitors[index].selected = self.first_visible_in_stack(index);
        }
    }

    pub(crate) fn first_visible_in_stack(&self, index: usize) -> Option<Window> {
        let monitor = self.monitors.get(index)?;
        let tags = monitor.tags();
        monitor.stack.iter().copied().find(|window| {
            self.clients
                .get(window)
                .is_some_and(|client| client.is_visible_on(tags))
        })
    }

    /// Moves `window` to a new slot in its monitor's client order.
    pub(crate) fn move_in_order(&mut self, window: Window, target: Window, after: bool) {
        if window == target {
            return;
        }
        let Some(index) = self.client_monitor(window) else {
            return;
        };
        let order = &mut self.monitors[index].clients;
        if attach::detach(order, window).is_none() {
            return;
        }
        let position = order
            .iter()
            .position(|&other| other == target)
            .map_or(order.len(), |position| position + usize::from(after));
        order.insert(position, window);
    }

    pub fn update_client_list(&mut self) {
        let windows: Vec<Window> = self
            .monitors
            .iter()
            .flat_map(|monitor| monitor.clients.iter().copied())
            .collect();
        debug!(count = windows.len(), "client list updated");
        self.display.update_client_list(&windows);
    }
}
